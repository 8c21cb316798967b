//! # Validation Engine
//!
//! The one capability every validation mechanism implements, and the entry
//! points collaborators call.
//!
//! ## One Contract, Three Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   request handler ─┐                                                   │
//! │   CLI importer ────┼──► validate(&validator, &payload)                  │
//! │   in-process ──────┘            │                                       │
//! │                                 ▼                                       │
//! │                    ┌─────── Validator<T> ───────┐                       │
//! │                    │            │               │                       │
//! │                Schema<T>  PartialSchema<T>  EntityAdapter<E>            │
//! │                    │            │               │                       │
//! │                    ▼            ▼               ▼                       │
//! │                    Ok(T)   Ok(Patch<T>)       Ok(E)                     │
//! │                         or Err(ValidationErrors)                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - **Total**: every input yields exactly one of `Ok` / `Err`
//! - **Non-panicking**: malformed input is an `Err`, never a panic
//! - **Idempotent**: same input, same result
//! - **Synchronous**: no I/O, no suspension; safe to call from async code

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{ErrorKind, FieldError, ValidationErrors, ValidationResult};
use crate::path::FieldPath;
use crate::rules::ValueKind;

/// Turns an untyped payload into a `T` or the complete list of problems.
pub trait Validator<T> {
    fn validate(&self, input: &Value) -> ValidationResult<T>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "anonymous"
    }
}

impl<T, V: Validator<T> + ?Sized> Validator<T> for &V {
    fn validate(&self, input: &Value) -> ValidationResult<T> {
        (**self).validate(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T, V: Validator<T> + ?Sized> Validator<T> for Arc<V> {
    fn validate(&self, input: &Value) -> ValidationResult<T> {
        (**self).validate(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T, V: Validator<T> + ?Sized> Validator<T> for Box<V> {
    fn validate(&self, input: &Value) -> ValidationResult<T> {
        (**self).validate(input)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Validates one payload and logs the outcome.
pub fn validate<T, V>(validator: &V, input: &Value) -> ValidationResult<T>
where
    V: Validator<T> + ?Sized,
{
    let result = validator.validate(input);

    match &result {
        Ok(_) => debug!(validator = %validator.name(), "Payload accepted"),
        Err(errors) => debug!(
            validator = %validator.name(),
            errors = errors.len(),
            "Payload rejected"
        ),
    }

    result
}

/// Validates raw JSON text. Unparseable text is a single payload-level error.
pub fn validate_str<T, V>(validator: &V, text: &str) -> ValidationResult<T>
where
    V: Validator<T> + ?Sized,
{
    match serde_json::from_str::<Value>(text) {
        Ok(input) => validate(validator, &input),
        Err(err) => {
            debug!(validator = %validator.name(), error = %err, "Payload is not JSON");
            Err(ValidationErrors::single(FieldError::new(
                &FieldPath::root(),
                ErrorKind::WrongType {
                    expected: ValueKind::Object,
                },
                format!("payload is not valid JSON: {err}"),
            )))
        }
    }
}

/// Validates independent payloads, returning results in input order.
pub fn validate_batch<T, V>(validator: &V, inputs: &[Value]) -> Vec<ValidationResult<T>>
where
    V: Validator<T> + ?Sized,
{
    inputs
        .iter()
        .map(|input| validate(validator, input))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
