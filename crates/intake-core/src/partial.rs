//! # Partial-Schema Derivation
//!
//! Update-style payloads carry only the fields being changed. Any
//! [`Schema<T>`] derives a [`PartialSchema<T>`] over the same descriptor:
//!
//! ```text
//! ┌───────────────────────────┬──────────────────────┬──────────────────────┐
//! │ top-level field is...     │ Schema<T>            │ PartialSchema<T>     │
//! ├───────────────────────────┼──────────────────────┼──────────────────────┤
//! │ absent / null, required   │ MissingField         │ skipped              │
//! │ absent / null, default    │ default injected     │ skipped (no default) │
//! │ present                   │ field rule           │ same field rule      │
//! │ present, nested object    │ nested rules         │ nested rules, full   │
//! └───────────────────────────┴──────────────────────┴──────────────────────┘
//! ```
//!
//! Nothing is re-declared: the partial view shares the `Arc<ObjectSchema>`.
//! The result is a [`Patch<T>`] holding only the fields that were supplied.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::engine::Validator;
use crate::error::{ErrorKind, FieldError, ValidationErrors, ValidationResult};
use crate::path::FieldPath;
use crate::schema::{assemble, Mode, ObjectSchema, Schema};

// =============================================================================
// Partial Schema
// =============================================================================

/// Every top-level field optional, each keeping its rule when present.
pub struct PartialSchema<T> {
    object: Arc<ObjectSchema>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Schema<T> {
    /// Derives the update variant of this schema.
    pub fn partial(&self) -> PartialSchema<T> {
        PartialSchema {
            object: self.shared(),
            marker: PhantomData,
        }
    }
}

impl<T> PartialSchema<T> {
    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn object(&self) -> &ObjectSchema {
        &self.object
    }

    /// Validates without wrapping the result in a [`Patch`].
    pub fn check_value(&self, input: &Value) -> ValidationResult<Map<String, Value>> {
        self.object.check_root(input, Mode::Partial)
    }
}

impl<T> Clone for PartialSchema<T> {
    fn clone(&self) -> Self {
        PartialSchema {
            object: Arc::clone(&self.object),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for PartialSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialSchema")
            .field("object", &self.object.name())
            .finish()
    }
}

impl<T> Validator<Patch<T>> for PartialSchema<T> {
    fn validate(&self, input: &Value) -> ValidationResult<Patch<T>> {
        let fields = self.check_value(input)?;
        Ok(Patch {
            schema: self.object.name().to_string(),
            fields,
            marker: PhantomData,
        })
    }

    fn name(&self) -> &str {
        self.object.name()
    }
}

// =============================================================================
// Patch
// =============================================================================

/// The validated subset of fields from an update payload.
///
/// Absent fields are "not provided", never defaulted.
pub struct Patch<T> {
    schema: String,
    fields: Map<String, Value>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Patch<T> {
    /// Validated (and coerced) fields that were supplied.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Reads one supplied field as `V`.
    pub fn get<V: DeserializeOwned>(&self, field: &str) -> Option<V> {
        self.fields
            .get(field)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl<T: Serialize + DeserializeOwned> Patch<T> {
    /// Overlays the supplied fields on `current` and rebuilds the record.
    pub fn apply_to(&self, current: &T) -> ValidationResult<T> {
        let mut merged = match serde_json::to_value(current) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(ValidationErrors::single(FieldError::new(
                    &FieldPath::root(),
                    ErrorKind::Internal,
                    format!("{} record is not an object", self.schema),
                )))
            }
        };

        for (name, value) in &self.fields {
            merged.insert(name.clone(), value.clone());
        }

        assemble(&self.schema, Value::Object(merged))
    }
}

impl<T> Clone for Patch<T> {
    fn clone(&self) -> Self {
        Patch {
            schema: self.schema.clone(),
            fields: self.fields.clone(),
            marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Patch<T> {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.fields == other.fields
    }
}

impl<T> fmt::Debug for Patch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patch")
            .field("schema", &self.schema)
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
