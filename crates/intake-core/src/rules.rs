//! # Coercion & Primitive Rules
//!
//! Single-field checks: type check, optional coercion, then constraints.
//!
//! ## Rule Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Primitive Field                                │
//! │                                                                         │
//! │  raw JSON value                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Type check ── wrong kind? ──► WrongType                               │
//! │       │        "12" on a non-coercible number field is WrongType       │
//! │       │        "12" on a coercible number field becomes 12             │
//! │       ▼                                                                 │
//! │  Integer-ness ── 1.5 on an integer field? ──► NotInteger               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Constraints, in declared order (first failure wins)                   │
//! │  ├── Length   ──► InvalidLength (too short / too long)                 │
//! │  ├── Range    ──► OutOfRange (below minimum / above maximum)           │
//! │  ├── Positive ──► NotPositive         NonNegative ──► Negative         │
//! │  ├── OneOf    ──► InvalidEnumValue                                     │
//! │  └── Email    ──► InvalidFormat                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Ok(coerced value)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Absent and `null` values never reach a primitive rule; the schema decides
//! whether they are `MissingField`, skipped, or replaced by a default.
//!
//! ## Usage
//! ```rust
//! use intake_core::rules::Primitive;
//! use intake_core::path::FieldPath;
//! use serde_json::json;
//!
//! let quantity = Primitive::integer().non_negative();
//! let path = FieldPath::root().field("quantity");
//!
//! assert_eq!(quantity.apply(&json!(3), &path).unwrap(), json!(3));
//! assert!(quantity.apply(&json!(-1), &path).is_err());
//! assert!(quantity.apply(&json!("3"), &path).is_err()); // no coercion opt-in
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{Bound, ErrorKind, LengthViolation, SchemaError, Violation};
use crate::path::FieldPath;
use crate::DEFAULT_ENUM_LIST_LIMIT;

/// Deliberately loose: one `@`, no whitespace, a dot in the domain.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// =============================================================================
// Value Kind
// =============================================================================

/// The kinds of value a rule can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Object,
    Array,
}

impl ValueKind {
    /// Bare name, e.g. `integer`.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Number | ValueKind::Integer)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let article = match self {
            ValueKind::Integer | ValueKind::Object | ValueKind::Array => "an",
            _ => "a",
        };
        write!(f, "{} {}", article, self.name())
    }
}

/// A type-checked value handed to constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Text(&'a str),
    Number(f64),
    Flag(bool),
    Date(DateTime<Utc>),
}

// =============================================================================
// Constraints
// =============================================================================

/// A predicate applied after the type check.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive character-count window.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Inclusive numeric window.
    Range { min: Option<f64>, max: Option<f64> },
    /// `> 0`
    Positive,
    /// `>= 0`
    NonNegative,
    /// Closed set of string literals. Sets larger than `list_limit` get a
    /// generic message instead of an enumeration.
    OneOf {
        allowed: Vec<String>,
        list_limit: usize,
    },
    /// E-mail address shape.
    Email,
}

impl Constraint {
    /// Short name used in construction errors.
    pub fn describe(&self) -> &'static str {
        match self {
            Constraint::Length { .. } => "length",
            Constraint::Range { .. } => "range",
            Constraint::Positive => "positive",
            Constraint::NonNegative => "non_negative",
            Constraint::OneOf { .. } => "one_of",
            Constraint::Email => "email",
        }
    }

    /// Whether this constraint can be declared on a field of `kind`.
    pub fn applies_to(&self, kind: ValueKind) -> bool {
        match self {
            Constraint::Length { .. } | Constraint::OneOf { .. } | Constraint::Email => {
                kind == ValueKind::String
            }
            Constraint::Range { .. } | Constraint::Positive | Constraint::NonNegative => {
                kind.is_numeric()
            }
        }
    }

    /// Construction-time sanity check for a constraint declared on `field`.
    pub fn verify(&self, field: &str, kind: ValueKind) -> Result<(), SchemaError> {
        if !self.applies_to(kind) {
            return Err(SchemaError::IncompatibleConstraint {
                field: field.to_string(),
                constraint: self.describe().to_string(),
                kind,
            });
        }

        match self {
            Constraint::Length {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(SchemaError::InvertedBounds {
                field: field.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            }),
            Constraint::Range {
                min: Some(min),
                max: Some(max),
            } if min > max => Err(SchemaError::InvertedBounds {
                field: field.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            }),
            Constraint::OneOf { allowed, .. } if allowed.is_empty() => {
                Err(SchemaError::EmptyChoices {
                    field: field.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Checks a type-checked value. Pairs the constraint does not apply to
    /// pass; [`Constraint::verify`] rejects them at construction.
    pub fn check(&self, label: &str, value: Scalar<'_>) -> Result<(), Violation> {
        match (self, value) {
            (Constraint::Length { min, max }, Scalar::Text(text)) => {
                check_length(label, text, *min, *max)
            }
            (Constraint::Range { min, max }, Scalar::Number(number)) => {
                check_range(label, number, *min, *max)
            }
            (Constraint::Positive, Scalar::Number(number)) => {
                if number > 0.0 {
                    Ok(())
                } else {
                    Err(Violation::new(
                        ErrorKind::NotPositive,
                        format!("{label} must be positive"),
                    ))
                }
            }
            (Constraint::NonNegative, Scalar::Number(number)) => {
                if number >= 0.0 {
                    Ok(())
                } else {
                    Err(Violation::new(
                        ErrorKind::Negative,
                        format!("{label} cannot be negative"),
                    ))
                }
            }
            (
                Constraint::OneOf {
                    allowed,
                    list_limit,
                },
                Scalar::Text(text),
            ) => {
                if allowed.iter().any(|choice| choice == text) {
                    Ok(())
                } else if allowed.len() <= *list_limit {
                    Err(Violation::new(
                        ErrorKind::InvalidEnumValue,
                        format!("{label} must be one of: {}", allowed.join(", ")),
                    ))
                } else {
                    Err(Violation::new(
                        ErrorKind::InvalidEnumValue,
                        format!("{label} has an invalid value"),
                    ))
                }
            }
            (Constraint::Email, Scalar::Text(text)) => {
                if EMAIL_RE.is_match(text) {
                    Ok(())
                } else {
                    Err(Violation::new(
                        ErrorKind::InvalidFormat,
                        format!("{label} must be a valid email address"),
                    ))
                }
            }
            _ => Ok(()),
        }
    }
}

/// Length is counted in characters, not bytes. An empty value on a field with
/// a positive minimum reads as "required" but is still a length failure.
fn check_length(
    label: &str,
    text: &str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), Violation> {
    let count = text.chars().count();

    if let Some(min) = min {
        if count < min {
            let message = if count == 0 {
                format!("{label} is required")
            } else {
                format!("{label} must be at least {min} characters")
            };
            return Err(Violation::new(
                ErrorKind::InvalidLength(LengthViolation::TooShort),
                message,
            ));
        }
    }

    if let Some(max) = max {
        if count > max {
            return Err(Violation::new(
                ErrorKind::InvalidLength(LengthViolation::TooLong),
                format!("{label} must be at most {max} characters"),
            ));
        }
    }

    Ok(())
}

fn check_range(
    label: &str,
    number: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), Violation> {
    if let Some(min) = min {
        if number < min {
            return Err(Violation::new(
                ErrorKind::OutOfRange(Bound::BelowMinimum),
                format!("{label} must be at least {min}"),
            ));
        }
    }

    if let Some(max) = max {
        if number > max {
            return Err(Violation::new(
                ErrorKind::OutOfRange(Bound::AboveMaximum),
                format!("{label} must be at most {max}"),
            ));
        }
    }

    Ok(())
}

// =============================================================================
// Primitive Rule
// =============================================================================

/// Rule for one scalar field: declared kind, coercion opt-in, constraints and
/// an optional message that replaces constraint messages.
///
/// Missing and wrong-type messages are never replaced; they describe the
/// payload, not the business rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    kind: ValueKind,
    coerce: bool,
    constraints: Vec<Constraint>,
    message: Option<String>,
}

impl Primitive {
    /// Bare rule for `kind`: no constraints, no coercion.
    pub fn of(kind: ValueKind) -> Self {
        Primitive {
            kind,
            coerce: false,
            constraints: Vec::new(),
            message: None,
        }
    }

    pub fn string() -> Self {
        Primitive::of(ValueKind::String)
    }

    pub fn number() -> Self {
        Primitive::of(ValueKind::Number)
    }

    pub fn integer() -> Self {
        Primitive::of(ValueKind::Integer)
    }

    pub fn boolean() -> Self {
        Primitive::of(ValueKind::Boolean)
    }

    /// Date field. Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]` (UTC) and
    /// `YYYY-MM-DD` strings; with [`Primitive::coerce`] also epoch milliseconds.
    pub fn date() -> Self {
        Primitive::of(ValueKind::Date)
    }

    /// Opts this field into representation coercion: numeric strings for
    /// numbers, `"true"`/`"false"` for booleans, epoch millis for dates.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn min_len(self, min: usize) -> Self {
        self.constraint(Constraint::Length {
            min: Some(min),
            max: None,
        })
    }

    #[must_use]
    pub fn max_len(self, max: usize) -> Self {
        self.constraint(Constraint::Length {
            min: None,
            max: Some(max),
        })
    }

    #[must_use]
    pub fn len_between(self, min: usize, max: usize) -> Self {
        self.constraint(Constraint::Length {
            min: Some(min),
            max: Some(max),
        })
    }

    #[must_use]
    pub fn min(self, min: f64) -> Self {
        self.constraint(Constraint::Range {
            min: Some(min),
            max: None,
        })
    }

    #[must_use]
    pub fn max(self, max: f64) -> Self {
        self.constraint(Constraint::Range {
            min: None,
            max: Some(max),
        })
    }

    #[must_use]
    pub fn between(self, min: f64, max: f64) -> Self {
        self.constraint(Constraint::Range {
            min: Some(min),
            max: Some(max),
        })
    }

    #[must_use]
    pub fn positive(self) -> Self {
        self.constraint(Constraint::Positive)
    }

    #[must_use]
    pub fn non_negative(self) -> Self {
        self.constraint(Constraint::NonNegative)
    }

    #[must_use]
    pub fn one_of(self, allowed: &[&str]) -> Self {
        self.one_of_listing(allowed, DEFAULT_ENUM_LIST_LIMIT)
    }

    /// Like [`Primitive::one_of`], with an explicit cut-off above which the
    /// message stops listing the allowed values.
    #[must_use]
    pub fn one_of_listing(self, allowed: &[&str], list_limit: usize) -> Self {
        self.constraint(Constraint::OneOf {
            allowed: allowed.iter().map(|choice| choice.to_string()).collect(),
            list_limit,
        })
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.constraint(Constraint::Email)
    }

    /// Replaces the message of every constraint failure on this field.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Construction-time sanity check.
    pub fn verify(&self, field: &str) -> Result<(), SchemaError> {
        self.constraints
            .iter()
            .try_for_each(|constraint| constraint.verify(field, self.kind))
    }

    /// Type-checks, coerces and constrains a present (non-null) value.
    ///
    /// Returns the value to store: the input unchanged unless a declared
    /// coercion applied.
    pub fn apply(&self, value: &Value, path: &FieldPath) -> Result<Value, Violation> {
        let label = path.label();
        let (scalar, output) = self.type_check(value, label)?;

        for constraint in &self.constraints {
            if let Err(violation) = constraint.check(label, scalar) {
                return Err(match &self.message {
                    Some(message) => Violation::new(violation.kind, message.clone()),
                    None => violation,
                });
            }
        }

        Ok(output)
    }

    /// Type-checks and coerces a present value without running constraints.
    pub fn admit<'v>(
        &self,
        value: &'v Value,
        path: &FieldPath,
    ) -> Result<(Scalar<'v>, Value), Violation> {
        self.type_check(value, path.label())
    }

    fn wrong_type(&self, label: &str) -> Violation {
        Violation::new(
            ErrorKind::WrongType {
                expected: self.kind,
            },
            format!("{label} must be {}", self.kind),
        )
    }

    fn type_check<'v>(
        &self,
        value: &'v Value,
        label: &str,
    ) -> Result<(Scalar<'v>, Value), Violation> {
        match self.kind {
            ValueKind::String => match value {
                Value::String(text) => Ok((Scalar::Text(text), value.clone())),
                _ => Err(self.wrong_type(label)),
            },

            ValueKind::Number => {
                let number = self.numeric(value, label)?;
                let output = if value.is_number() {
                    value.clone()
                } else {
                    number_value(number).ok_or_else(|| self.wrong_type(label))?
                };
                Ok((Scalar::Number(number), output))
            }

            ValueKind::Integer => {
                if let Some(integer) = value.as_i64() {
                    return Ok((Scalar::Number(integer as f64), value.clone()));
                }
                let number = self.numeric(value, label)?;
                if number.fract() != 0.0 {
                    return Err(Violation::new(
                        ErrorKind::NotInteger,
                        format!("{label} must be an integer"),
                    ));
                }
                if number.abs() > MAX_SAFE_INTEGER {
                    let bound = if number < 0.0 {
                        Bound::BelowMinimum
                    } else {
                        Bound::AboveMaximum
                    };
                    return Err(Violation::new(
                        ErrorKind::OutOfRange(bound),
                        format!("{label} must be between -{MAX_SAFE_INTEGER} and {MAX_SAFE_INTEGER}"),
                    ));
                }
                Ok((Scalar::Number(number), Value::from(number as i64)))
            }

            ValueKind::Boolean => match value {
                Value::Bool(flag) => Ok((Scalar::Flag(*flag), value.clone())),
                Value::String(text) if self.coerce => {
                    match text.trim().to_ascii_lowercase().as_str() {
                        "true" => Ok((Scalar::Flag(true), Value::Bool(true))),
                        "false" => Ok((Scalar::Flag(false), Value::Bool(false))),
                        _ => Err(self.wrong_type(label)),
                    }
                }
                _ => Err(self.wrong_type(label)),
            },

            ValueKind::Date => {
                let parsed = match value {
                    Value::String(text) => parse_date(text).ok_or_else(|| {
                        Violation::new(
                            ErrorKind::MalformedDate,
                            format!("{label} must be a valid date"),
                        )
                    })?,
                    Value::Number(number) if self.coerce => number
                        .as_i64()
                        .and_then(DateTime::from_timestamp_millis)
                        .ok_or_else(|| {
                            Violation::new(
                                ErrorKind::MalformedDate,
                                format!("{label} must be a valid date"),
                            )
                        })?,
                    _ => return Err(self.wrong_type(label)),
                };
                let rendered = parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                Ok((Scalar::Date(parsed), Value::String(rendered)))
            }

            ValueKind::Object | ValueKind::Array => Err(self.wrong_type(label)),
        }
    }

    /// Reads a finite number, accepting numeric strings only when coercible.
    fn numeric(&self, value: &Value, label: &str) -> Result<f64, Violation> {
        match value {
            Value::Number(number) => number.as_f64().ok_or_else(|| self.wrong_type(label)),
            Value::String(text) if self.coerce => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite())
                .ok_or_else(|| self.wrong_type(label)),
            _ => Err(self.wrong_type(label)),
        }
    }
}

fn number_value(number: f64) -> Option<Value> {
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
        Some(Value::from(number as i64))
    } else {
        Number::from_f64(number).map(Value::Number)
    }
}

/// Parses the date shapes accepted on date fields.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(name: &str) -> FieldPath {
        FieldPath::root().field(name)
    }

    #[test]
    fn test_string_type_check() {
        let rule = Primitive::string().min_len(1);
        assert_eq!(rule.apply(&json!("X"), &path("model")).unwrap(), json!("X"));

        let err = rule.apply(&json!(42), &path("model")).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::WrongType {
                expected: ValueKind::String
            }
        );
        assert_eq!(err.message, "model must be a string");
    }

    #[test]
    fn test_empty_string_fails_length_not_type() {
        let rule = Primitive::string().min_len(1);
        let err = rule.apply(&json!(""), &path("brand")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLength(LengthViolation::TooShort));
        assert_eq!(err.message, "brand is required");
    }

    #[test]
    fn test_length_distinguishes_short_and_long() {
        let rule = Primitive::string().len_between(2, 5);
        let short = rule.apply(&json!("a"), &path("name")).unwrap_err();
        assert_eq!(short.kind, ErrorKind::InvalidLength(LengthViolation::TooShort));
        assert_eq!(short.message, "name must be at least 2 characters");

        let long = rule.apply(&json!("abcdef"), &path("name")).unwrap_err();
        assert_eq!(long.kind, ErrorKind::InvalidLength(LengthViolation::TooLong));
        assert_eq!(long.message, "name must be at most 5 characters");
    }

    #[test]
    fn test_length_counts_characters() {
        let rule = Primitive::string().max_len(4);
        assert!(rule.apply(&json!("Núñe"), &path("name")).is_ok());
    }

    #[test]
    fn test_range_names_failed_bound() {
        let rule = Primitive::integer().between(1886.0, 2026.0);
        let low = rule.apply(&json!(1800), &path("year")).unwrap_err();
        assert_eq!(low.kind, ErrorKind::OutOfRange(Bound::BelowMinimum));
        assert_eq!(low.message, "year must be at least 1886");

        let high = rule.apply(&json!(2100), &path("year")).unwrap_err();
        assert_eq!(high.kind, ErrorKind::OutOfRange(Bound::AboveMaximum));
        assert_eq!(high.message, "year must be at most 2026");
    }

    #[test]
    fn test_integer_rejects_fraction_distinctly() {
        let rule = Primitive::integer();
        let err = rule.apply(&json!(1.5), &path("quantity")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotInteger);

        let err = rule.apply(&json!("abc"), &path("quantity")).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::WrongType {
                expected: ValueKind::Integer
            }
        );

        assert_eq!(rule.apply(&json!(4.0), &path("quantity")).unwrap(), json!(4));
    }

    #[test]
    fn test_numeric_string_needs_opt_in() {
        let strict = Primitive::number();
        assert!(strict.apply(&json!("12.5"), &path("price")).is_err());

        let coercible = Primitive::number().coerce();
        assert_eq!(
            coercible.apply(&json!("12.5"), &path("price")).unwrap(),
            json!(12.5)
        );
        assert_eq!(coercible.apply(&json!(" 7 "), &path("price")).unwrap(), json!(7));
        assert!(coercible.apply(&json!("NaN"), &path("price")).is_err());
        assert!(coercible.apply(&json!(""), &path("price")).is_err());
    }

    #[test]
    fn test_positive_and_non_negative_are_distinct() {
        let price = Primitive::number().non_negative();
        assert!(price.apply(&json!(0), &path("price")).is_ok());
        let err = price.apply(&json!(-0.5), &path("price")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Negative);
        assert_eq!(err.message, "price cannot be negative");

        let unit_price = Primitive::number().positive();
        let err = unit_price.apply(&json!(0), &path("unit_price")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotPositive);
        assert_eq!(err.message, "unit_price must be positive");
    }

    #[test]
    fn test_enum_membership() {
        let status = Primitive::string().one_of(&["processed", "returned"]);
        assert!(status.apply(&json!("returned"), &path("status")).is_ok());
        let err = status.apply(&json!("lost"), &path("status")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidEnumValue);
        assert_eq!(err.message, "status must be one of: processed, returned");

        let wide = Primitive::string().one_of_listing(&["a", "b", "c"], 2);
        let err = wide.apply(&json!("z"), &path("grade")).unwrap_err();
        assert_eq!(err.message, "grade has an invalid value");
    }

    #[test]
    fn test_email_shape() {
        let email = Primitive::string().email();
        assert!(email.apply(&json!("ana@example.com"), &path("email")).is_ok());
        let err = email.apply(&json!("ana@"), &path("email")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_date_parsing_and_rendering() {
        let rule = Primitive::date();
        assert_eq!(
            rule.apply(&json!("2024-03-05"), &path("purchase_date")).unwrap(),
            json!("2024-03-05T00:00:00Z")
        );
        assert_eq!(
            rule.apply(&json!("2024-03-05T10:30:00+02:00"), &path("purchase_date"))
                .unwrap(),
            json!("2024-03-05T08:30:00Z")
        );

        let err = rule.apply(&json!("05/03/2024"), &path("purchase_date")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedDate);

        let err = rule.apply(&json!(1_700_000_000_000_i64), &path("purchase_date")).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::WrongType {
                expected: ValueKind::Date
            }
        );
    }

    #[test]
    fn test_coercible_date_accepts_epoch_millis() {
        let rule = Primitive::date().coerce();
        assert_eq!(
            rule.apply(&json!(0), &path("date")).unwrap(),
            json!("1970-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_boolean_coercion() {
        let strict = Primitive::boolean();
        assert!(strict.apply(&json!("true"), &path("active")).is_err());

        let coercible = Primitive::boolean().coerce();
        assert_eq!(
            coercible.apply(&json!("TRUE"), &path("active")).unwrap(),
            json!(true)
        );
    }

    #[test]
    fn test_message_override_keeps_kind() {
        let year = Primitive::integer()
            .between(1886.0, 2026.0)
            .message("year must be valid: between 1886 and 2026");
        let err = year.apply(&json!(1800), &path("year")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OutOfRange(Bound::BelowMinimum));
        assert_eq!(err.message, "year must be valid: between 1886 and 2026");

        // wrong type keeps its own message
        let err = year.apply(&json!("1999"), &path("year")).unwrap_err();
        assert_eq!(err.message, "year must be an integer");
    }

    #[test]
    fn test_admit_skips_constraints() {
        let year = Primitive::of(ValueKind::Integer).between(1886.0, 2026.0);
        let input = json!(1800);
        let (scalar, output) = year.admit(&input, &path("year")).unwrap();
        assert_eq!(scalar, Scalar::Number(1800.0));
        assert_eq!(output, json!(1800));

        let err = year.admit(&json!("x"), &path("year")).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::WrongType {
                expected: ValueKind::Integer
            }
        );
    }

    #[test]
    fn test_verify_rejects_bad_declarations() {
        assert!(matches!(
            Primitive::integer().min_len(2).verify("quantity"),
            Err(SchemaError::IncompatibleConstraint { .. })
        ));
        assert!(matches!(
            Primitive::string().len_between(5, 2).verify("name"),
            Err(SchemaError::InvertedBounds { .. })
        ));
        assert!(matches!(
            Primitive::string().one_of(&[]).verify("status"),
            Err(SchemaError::EmptyChoices { .. })
        ));
        assert!(Primitive::number().non_negative().verify("price").is_ok());
    }
}
