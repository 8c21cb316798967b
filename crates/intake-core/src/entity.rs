//! # Entity Adapter
//!
//! Persisted-model validation. Each record type declares a table of field
//! constraints; the adapter walks that table and reports through the same
//! [`ValidationResult`] as schema validation, so callers cannot tell which
//! mechanism checked a record.
//!
//! ## How a Record Is Checked
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Vehicle { brand: "", model: "X", year: 1800 }                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  constraint_table(settings)   field_value(name)                        │
//! │  ├── brand  string  [length ≥ 1]    ──► Text("")  ──► "brand is required"│
//! │  ├── model  string  [length ≥ 1]    ──► Text("X") ──► ok                │
//! │  └── year   integer [range 1886..]  ──► Number(1800) ──► "must be..."  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Err([brand, year])   one FieldError per field; several failures on    │
//! │                       one field are joined with "; "                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike schema rules, every constraint on a field is evaluated so the
//! joined message lists all of them, unless the field declares its own
//! message.
//!
//! ## Untyped Payloads
//! Through [`Validator`], the raw payload is admitted field by field first:
//! absent required fields, wrong types and constraint failures are reported
//! at their own paths exactly as a schema would. The record is only
//! deserialized once that pass is clean.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::engine::Validator;
use crate::error::{ErrorKind, FieldError, SchemaError, ValidationErrors, ValidationResult};
use crate::path::FieldPath;
use crate::rules::{Constraint, Primitive, Scalar, ValueKind};
use crate::schemas::SchemaSettings;
use crate::MESSAGE_SEPARATOR;

// =============================================================================
// Constraint Table
// =============================================================================

/// Declared constraints for one field of a persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConstraints {
    field: &'static str,
    kind: ValueKind,
    required: bool,
    coerce: bool,
    constraints: Vec<Constraint>,
    message: Option<String>,
}

impl FieldConstraints {
    pub fn required(field: &'static str, kind: ValueKind) -> Self {
        FieldConstraints {
            field,
            kind,
            required: true,
            coerce: false,
            constraints: Vec::new(),
            message: None,
        }
    }

    pub fn optional(field: &'static str, kind: ValueKind) -> Self {
        FieldConstraints {
            required: false,
            ..FieldConstraints::required(field, kind)
        }
    }

    #[must_use]
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Accepts the same coercions as [`Primitive::coerce`] on raw payloads.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Replaces the joined constraint messages. Missing and wrong-type
    /// messages are kept.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    fn type_rule(&self) -> Primitive {
        let rule = Primitive::of(self.kind);
        if self.coerce {
            rule.coerce()
        } else {
            rule
        }
    }

    fn accepts(&self, value: &Scalar<'_>) -> bool {
        matches!(
            (self.kind, value),
            (ValueKind::String, Scalar::Text(_))
                | (ValueKind::Number | ValueKind::Integer, Scalar::Number(_))
                | (ValueKind::Boolean, Scalar::Flag(_))
                | (ValueKind::Date, Scalar::Date(_))
        )
    }
}

/// A record type that declares its own field constraints.
pub trait Constrained {
    /// Name used in logs and internal errors.
    fn entity_name() -> &'static str;

    /// The record's constraint table, in field declaration order.
    fn constraint_table(settings: &SchemaSettings) -> Vec<FieldConstraints>;

    /// Current value of `field`; `None` when the field is unset.
    fn field_value(&self, field: &str) -> Option<Scalar<'_>>;
}

// =============================================================================
// Adapter
// =============================================================================

/// Runs a [`Constrained`] record's table and reports in the shared contract.
pub struct EntityAdapter<E> {
    table: Vec<FieldConstraints>,
    separator: String,
    marker: PhantomData<fn() -> E>,
}

impl<E: Constrained> EntityAdapter<E> {
    /// Loads and verifies `E`'s constraint table under default settings.
    pub fn new() -> Result<Self, SchemaError> {
        Self::with_settings(&SchemaSettings::default())
    }

    /// Loads and verifies `E`'s constraint table under `settings`, the same
    /// settings the declared schemas are built from.
    pub fn with_settings(settings: &SchemaSettings) -> Result<Self, SchemaError> {
        let table = E::constraint_table(settings);
        let mut seen = HashSet::new();

        for entry in &table {
            if entry.field.is_empty() {
                return Err(SchemaError::EmptyFieldName {
                    schema: E::entity_name().to_string(),
                });
            }
            if !seen.insert(entry.field) {
                return Err(SchemaError::DuplicateField {
                    schema: E::entity_name().to_string(),
                    field: entry.field.to_string(),
                });
            }
            for constraint in &entry.constraints {
                constraint.verify(entry.field, entry.kind)?;
            }
        }

        Ok(EntityAdapter {
            table,
            separator: MESSAGE_SEPARATOR.to_string(),
            marker: PhantomData,
        })
    }

    /// Separator between joined messages on one field.
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn table(&self) -> &[FieldConstraints] {
        &self.table
    }

    /// Checks a typed candidate, handing it back unchanged on success.
    pub fn check(&self, candidate: E) -> ValidationResult<E> {
        let mut errors = Vec::new();

        for entry in &self.table {
            if let Some(error) = self.check_field(&candidate, entry) {
                errors.push(error);
            }
        }

        ValidationErrors::check(errors)?;
        Ok(candidate)
    }

    /// Async form of [`EntityAdapter::check`] for async callers. Never
    /// suspends.
    pub async fn check_async(&self, candidate: E) -> ValidationResult<E> {
        self.check(candidate)
    }

    fn check_field(&self, candidate: &E, entry: &FieldConstraints) -> Option<FieldError> {
        let path = FieldPath::root().field(entry.field);

        let Some(value) = candidate.field_value(entry.field) else {
            return entry.required.then(|| {
                FieldError::new(
                    &path,
                    ErrorKind::MissingField,
                    format!("{} is required", entry.field),
                )
            });
        };

        if !entry.accepts(&value) {
            return Some(FieldError::new(
                &path,
                ErrorKind::Internal,
                format!(
                    "{} reports {} as something other than {}",
                    E::entity_name(),
                    entry.field,
                    entry.kind
                ),
            ));
        }

        self.constrain(entry, &path, value)
    }

    /// Runs every constraint of `entry` against a type-checked value.
    fn constrain(
        &self,
        entry: &FieldConstraints,
        path: &FieldPath,
        value: Scalar<'_>,
    ) -> Option<FieldError> {
        let violations: Vec<_> = entry
            .constraints
            .iter()
            .filter_map(|constraint| constraint.check(entry.field, value).err())
            .collect();

        let first = violations.first()?.kind;
        let message = match &entry.message {
            Some(message) => message.clone(),
            None => violations
                .iter()
                .map(|violation| violation.message.as_str())
                .collect::<Vec<_>>()
                .join(&self.separator),
        };

        Some(FieldError::new(path, first, message))
    }

    /// Admits a raw payload through the table, returning the coerced object.
    ///
    /// Fields outside the table pass through untouched; `null` counts as
    /// absent.
    fn admit(&self, input: &Value) -> ValidationResult<Map<String, Value>> {
        let root = FieldPath::root();
        let Some(object) = input.as_object() else {
            return Err(ValidationErrors::single(FieldError::new(
                &root,
                ErrorKind::WrongType {
                    expected: ValueKind::Object,
                },
                format!("{} must be an object", root.label()),
            )));
        };

        let mut output = object.clone();
        let mut errors = Vec::new();

        for entry in &self.table {
            let path = root.field(entry.field);
            match object.get(entry.field) {
                None | Some(Value::Null) => {
                    output.remove(entry.field);
                    if entry.required {
                        errors.push(FieldError::new(
                            &path,
                            ErrorKind::MissingField,
                            format!("{} is required", entry.field),
                        ));
                    }
                }
                Some(value) => match entry.type_rule().admit(value, &path) {
                    Ok((scalar, coerced)) => {
                        if let Some(error) = self.constrain(entry, &path, scalar) {
                            errors.push(error);
                        }
                        output.insert(entry.field.to_string(), coerced);
                    }
                    Err(violation) => {
                        errors.push(FieldError::new(&path, violation.kind, violation.message));
                    }
                },
            }
        }

        ValidationErrors::check(errors)?;
        Ok(output)
    }
}

impl<E> fmt::Debug for EntityAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityAdapter")
            .field("table", &self.table)
            .field("separator", &self.separator)
            .finish()
    }
}

impl<E: Constrained + DeserializeOwned> Validator<E> for EntityAdapter<E> {
    /// Admits the payload through the table, then deserializes it into `E`.
    ///
    /// A payload that passes the table but still fails to deserialize has a
    /// problem in a field the table does not cover; that is reported at the
    /// payload root.
    fn validate(&self, input: &Value) -> ValidationResult<E> {
        let admitted = self.admit(input)?;

        E::deserialize(Value::Object(admitted)).map_err(|err| {
            ValidationErrors::single(FieldError::new(
                &FieldPath::root(),
                ErrorKind::WrongType {
                    expected: ValueKind::Object,
                },
                format!("{} payload is malformed: {err}", E::entity_name()),
            ))
        })
    }

    fn name(&self) -> &str {
        E::entity_name()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Part {
        code: String,
        stock: i64,
        note: Option<String>,
    }

    impl Constrained for Part {
        fn entity_name() -> &'static str {
            "part"
        }

        fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
            vec![
                FieldConstraints::required("code", ValueKind::String)
                    .with(Constraint::Length {
                        min: Some(3),
                        max: None,
                    })
                    .with(Constraint::OneOf {
                        allowed: vec!["ABCD".to_string(), "WXYZ".to_string()],
                        list_limit: 10,
                    }),
                FieldConstraints::required("stock", ValueKind::Integer)
                    .with(Constraint::NonNegative),
                FieldConstraints::required("note", ValueKind::String),
            ]
        }

        fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
            match field {
                "code" => Some(Scalar::Text(&self.code)),
                "stock" => Some(Scalar::Number(self.stock as f64)),
                "note" => self.note.as_deref().map(Scalar::Text),
                _ => None,
            }
        }
    }

    fn part(code: &str, stock: i64, note: Option<&str>) -> Part {
        Part {
            code: code.to_string(),
            stock,
            note: note.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_candidate_is_returned_unchanged() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let candidate = part("ABCD", 4, Some("shelf 2"));
        assert_eq!(adapter.check(candidate.clone()).unwrap(), candidate);
    }

    #[test]
    fn test_violations_on_one_field_are_joined() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let errors = adapter.check(part("AB", 4, Some("x"))).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.as_slice()[0].field, "code");
        assert_eq!(
            errors.as_slice()[0].message,
            "code must be at least 3 characters; code must be one of: ABCD, WXYZ"
        );
    }

    #[test]
    fn test_each_failing_field_reported_in_table_order() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let errors = adapter.check(part("ABCD", -2, None)).unwrap_err();
        assert_eq!(errors.fields(), vec!["stock", "note"]);
        assert_eq!(errors.as_slice()[0].kind, ErrorKind::Negative);
        assert_eq!(errors.as_slice()[1].kind, ErrorKind::MissingField);
    }

    #[test]
    fn test_custom_separator() {
        let adapter = EntityAdapter::<Part>::new().unwrap().with_separator(" | ");
        let errors = adapter.check(part("AB", 0, Some("x"))).unwrap_err();
        assert!(errors.as_slice()[0].message.contains(" | "));
    }

    #[test]
    fn test_validator_reports_missing_field_from_payload() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let errors = adapter
            .validate(&json!({ "code": "ABCD", "note": "x" }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["stock"]);
        assert_eq!(errors.as_slice()[0].kind, ErrorKind::MissingField);

        let errors = adapter.validate(&json!("nope")).unwrap_err();
        assert!(errors.as_slice()[0].is_root());
    }

    #[tokio::test]
    async fn test_check_async_matches_check() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let sync = adapter.check(part("AB", -1, None)).unwrap_err();
        let asynchronous = adapter.check_async(part("AB", -1, None)).await.unwrap_err();
        assert_eq!(sync, asynchronous);
    }

    #[test]
    fn test_incompatible_table_fails_construction() {
        struct Broken;

        impl Constrained for Broken {
            fn entity_name() -> &'static str {
                "broken"
            }

            fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
                vec![FieldConstraints::required("count", ValueKind::Integer).with(
                    Constraint::Length {
                        min: Some(1),
                        max: None,
                    },
                )]
            }

            fn field_value(&self, _field: &str) -> Option<Scalar<'_>> {
                None
            }
        }

        assert!(matches!(
            EntityAdapter::<Broken>::new(),
            Err(SchemaError::IncompatibleConstraint { .. })
        ));
    }

    #[test]
    fn test_payload_type_errors_reported_per_field() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let errors = adapter
            .validate(&json!({ "code": 7, "stock": "many", "note": null }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["code", "stock", "note"]);
        assert_eq!(
            errors.as_slice()[0].kind,
            ErrorKind::WrongType {
                expected: ValueKind::String
            }
        );
        assert_eq!(errors.as_slice()[1].message, "stock must be an integer");
        assert_eq!(errors.as_slice()[2].kind, ErrorKind::MissingField);
    }

    #[test]
    fn test_payload_constraints_run_alongside_type_errors() {
        let adapter = EntityAdapter::<Part>::new().unwrap();
        let errors = adapter
            .validate(&json!({ "code": "AB", "stock": 1.5, "note": "x" }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["code", "stock"]);
        assert_eq!(
            errors.as_slice()[0].message,
            "code must be at least 3 characters; code must be one of: ABCD, WXYZ"
        );
        assert_eq!(errors.as_slice()[1].kind, ErrorKind::NotInteger);
    }

    #[test]
    fn test_message_override_replaces_joined_messages() {
        let entry = FieldConstraints::required("code", ValueKind::String)
            .with(Constraint::Length {
                min: Some(3),
                max: None,
            })
            .message("code must be a catalogue code");
        let adapter = EntityAdapter::<Part> {
            table: vec![entry],
            separator: MESSAGE_SEPARATOR.to_string(),
            marker: PhantomData,
        };

        let errors = adapter.check(part("AB", 0, None)).unwrap_err();
        assert_eq!(errors.as_slice()[0].message, "code must be a catalogue code");
        assert_eq!(
            errors.as_slice()[0].kind,
            ErrorKind::InvalidLength(crate::error::LengthViolation::TooShort)
        );
    }
}
