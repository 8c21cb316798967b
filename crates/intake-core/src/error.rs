//! # Error Types
//!
//! The error model every other module reports through.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  Runtime (returned, never thrown)                                      │
//! │  ├── Violation         - a failed rule, not yet placed at a path        │
//! │  ├── FieldError        - { field, message, code } for one location      │
//! │  └── ValidationErrors  - ordered, non-empty list of FieldError          │
//! │                                                                         │
//! │  Construction time (programming errors in a descriptor)                │
//! │  └── SchemaError       - surfaces from builders, never from validate()  │
//! │                                                                         │
//! │  Flow: Rule ──► Violation ──► FieldError (+ path) ──► ValidationErrors  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl) where a message is fixed
//! 2. Every failure names the field it belongs to
//! 3. Errors are enum variants, never bare strings
//! 4. Order of `ValidationErrors` follows schema declaration order

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use ts_rs::TS;

use crate::path::FieldPath;
use crate::rules::ValueKind;

// =============================================================================
// Error Kind
// =============================================================================

/// Which side of a numeric range was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    BelowMinimum,
    AboveMaximum,
}

/// Which side of a length window was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthViolation {
    TooShort,
    TooLong,
}

/// Machine-readable classification of a [`FieldError`].
///
/// Failures inside nested objects and collections keep their own kind; the
/// nesting is carried by the prefixed [`FieldError::field`] path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required field is absent or `null`.
    MissingField,
    /// Value is present but of the wrong primitive kind.
    WrongType { expected: ValueKind },
    /// Numeric value outside the declared range.
    OutOfRange(Bound),
    /// String (or collection) length outside the declared window.
    InvalidLength(LengthViolation),
    /// Value not in the declared closed set.
    InvalidEnumValue,
    /// Numeric value with a fractional part on an integer field.
    NotInteger,
    /// Value must be `> 0`.
    NotPositive,
    /// Value must be `>= 0`.
    Negative,
    /// String could not be parsed as a date.
    MalformedDate,
    /// String does not have the declared shape (e.g. e-mail address).
    InvalidFormat,
    /// Validated fields could not be assembled into the typed record.
    Internal,
}

impl ErrorKind {
    /// Stable code rendered alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "missing_field",
            ErrorKind::WrongType { .. } => "wrong_type",
            ErrorKind::OutOfRange(_) => "out_of_range",
            ErrorKind::InvalidLength(_) => "invalid_length",
            ErrorKind::InvalidEnumValue => "invalid_enum_value",
            ErrorKind::NotInteger => "not_integer",
            ErrorKind::NotPositive => "not_positive",
            ErrorKind::Negative => "negative",
            ErrorKind::MalformedDate => "malformed_date",
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::Internal => "internal",
        }
    }

    /// Sub-reason for range and length failures.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ErrorKind::OutOfRange(Bound::BelowMinimum) => Some("below minimum"),
            ErrorKind::OutOfRange(Bound::AboveMaximum) => Some("above maximum"),
            ErrorKind::InvalidLength(LengthViolation::TooShort) => Some("too short"),
            ErrorKind::InvalidLength(LengthViolation::TooLong) => Some("too long"),
            _ => None,
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

// =============================================================================
// Violation
// =============================================================================

/// A failed rule that has not been attached to a location yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ErrorKind,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Violation {
            kind,
            message: message.into(),
        }
    }

    /// Places the violation at `path`.
    pub fn at(self, path: &FieldPath) -> FieldError {
        FieldError::new(path, self.kind, self.message)
    }
}

// =============================================================================
// Field Error
// =============================================================================

/// One problem at one location in the payload.
///
/// Serialises as `{ "field": "...", "message": "...", "code": "..." }`, which
/// HTTP-facing callers render directly.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct FieldError {
    /// Dot/bracket path, empty for payload-level errors.
    pub field: String,

    /// Human-readable message. Never empty.
    pub message: String,

    /// Classification, serialised as its code.
    #[serde(rename = "code")]
    #[ts(type = "string")]
    pub kind: ErrorKind,
}

impl FieldError {
    pub fn new(path: &FieldPath, kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.is_empty() {
            message = format!("{} is invalid", path.label());
        }
        FieldError {
            field: path.to_string(),
            message,
            kind,
        }
    }

    /// True for the reserved payload-level path.
    pub fn is_root(&self) -> bool {
        self.field.is_empty()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Every field failure from one validation call, in schema declaration order.
///
/// Always holds at least one error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Wraps a list of errors; `None` when the list is empty.
    pub fn from_vec(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(ValidationErrors { errors })
        }
    }

    pub fn single(error: FieldError) -> Self {
        ValidationErrors {
            errors: vec![error],
        }
    }

    /// `Ok(())` when `errors` is empty, otherwise the aggregate.
    pub fn check(errors: Vec<FieldError>) -> Result<(), ValidationErrors> {
        match ValidationErrors::from_vec(errors) {
            None => Ok(()),
            Some(aggregate) => Err(aggregate),
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }

    /// Errors reported at exactly `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |error| error.field == field)
    }

    /// Paths of all errors, in order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s): ", self.errors.len())?;
        for (position, error) in self.errors.iter().enumerate() {
            if position > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Result of validating an untyped payload into `T`.
pub type ValidationResult<T> = Result<T, ValidationErrors>;

// =============================================================================
// Schema Error
// =============================================================================

/// A malformed descriptor. Raised while building schemas or constraint
/// tables, never while validating input.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// The same field is declared twice in one object.
    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },

    /// A field was declared with an empty name.
    #[error("schema '{schema}' declares a field with an empty name")]
    EmptyFieldName { schema: String },

    /// A constraint cannot apply to the field's declared kind.
    #[error("field '{field}': constraint {constraint} does not apply to {kind}")]
    IncompatibleConstraint {
        field: String,
        constraint: String,
        kind: ValueKind,
    },

    /// Minimum exceeds maximum.
    #[error("field '{field}': minimum {min} exceeds maximum {max}")]
    InvertedBounds {
        field: String,
        min: String,
        max: String,
    },

    /// Enum membership declared with no allowed values.
    #[error("field '{field}': enum constraint has no allowed values")]
    EmptyChoices { field: String },

    /// The declared default value fails the field's own rule.
    #[error("field '{field}': default value is invalid: {reason}")]
    InvalidDefault { field: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
