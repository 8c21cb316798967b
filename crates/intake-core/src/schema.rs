//! # Schema Descriptors
//!
//! Composite descriptions of a whole record, built once at start-up and shared
//! read-only by every validation call.
//!
//! ## Descriptor Tree
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Schema<PurchaseHistory>                                                │
//! │  └── ObjectSchema "purchase_history"                                   │
//! │      ├── description    Scalar(string, length 10..=500)     required   │
//! │      ├── purchase_date  Scalar(date)                        required   │
//! │      ├── arrival_date   Scalar(date)                        required   │
//! │      └── purchases      Array(max 500)                      optional   │
//! │                         └── Object "purchase_line"                     │
//! │                             ├── product_id  Scalar(integer > 0)        │
//! │                             ├── quantity    Scalar(integer > 0)        │
//! │                             └── unit_price  Scalar(number > 0)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Children are owned through `Arc`, so a descriptor can be embedded in
//! several parents without copying. Descriptors are acyclic.
//!
//! ## Aggregation
//! Every declared field is visited in declaration order and every failure is
//! recorded; validation never stops at the first bad field. Nested failures
//! carry the parent path (`address.city`), collection failures the element
//! index (`purchases[1].quantity`). Undeclared input fields are ignored.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::error;

use crate::engine::Validator;
use crate::error::{
    ErrorKind, FieldError, LengthViolation, SchemaError, ValidationErrors, ValidationResult,
};
use crate::path::FieldPath;
use crate::rules::{Primitive, ValueKind};

// =============================================================================
// Rules
// =============================================================================

/// How one field's value is checked.
#[derive(Debug, Clone)]
pub enum Rule {
    /// A single scalar value.
    Scalar(Primitive),
    /// A nested object described by its own schema.
    Object(Arc<ObjectSchema>),
    /// A collection whose elements share one rule.
    Array(ArrayRule),
}

impl From<Primitive> for Rule {
    fn from(primitive: Primitive) -> Self {
        Rule::Scalar(primitive)
    }
}

impl From<Arc<ObjectSchema>> for Rule {
    fn from(schema: Arc<ObjectSchema>) -> Self {
        Rule::Object(schema)
    }
}

impl From<ObjectSchema> for Rule {
    fn from(schema: ObjectSchema) -> Self {
        Rule::Object(Arc::new(schema))
    }
}

impl From<ArrayRule> for Rule {
    fn from(array: ArrayRule) -> Self {
        Rule::Array(array)
    }
}

impl Rule {
    /// Declared kind, for introspection.
    pub fn kind(&self) -> ValueKind {
        match self {
            Rule::Scalar(primitive) => primitive.kind(),
            Rule::Object(_) => ValueKind::Object,
            Rule::Array(_) => ValueKind::Array,
        }
    }

    fn verify(&self, field: &str) -> Result<(), SchemaError> {
        match self {
            Rule::Scalar(primitive) => primitive.verify(field),
            // nested schemas were verified by their own builder
            Rule::Object(_) => Ok(()),
            Rule::Array(array) => array.verify(field),
        }
    }

    /// Checks a present value, recording failures in `errors`.
    ///
    /// Returns the value to store when this subtree produced no errors.
    pub(crate) fn check(
        &self,
        value: &Value,
        path: &FieldPath,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        match self {
            Rule::Scalar(primitive) => match primitive.apply(value, path) {
                Ok(output) => Some(output),
                Err(violation) => {
                    errors.push(violation.at(path));
                    None
                }
            },
            Rule::Object(schema) => schema
                .check_object(value, path, Mode::Full, errors)
                .map(Value::Object),
            Rule::Array(array) => array.check(value, path, errors),
        }
    }
}

/// Collection rule: element rule plus optional inclusive size bounds.
#[derive(Debug, Clone)]
pub struct ArrayRule {
    element: Box<Rule>,
    min_items: Option<usize>,
    max_items: Option<usize>,
}

impl ArrayRule {
    pub fn of(element: impl Into<Rule>) -> Self {
        ArrayRule {
            element: Box::new(element.into()),
            min_items: None,
            max_items: None,
        }
    }

    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn element(&self) -> &Rule {
        &self.element
    }

    fn verify(&self, field: &str) -> Result<(), SchemaError> {
        if let (Some(min), Some(max)) = (self.min_items, self.max_items) {
            if min > max {
                return Err(SchemaError::InvertedBounds {
                    field: field.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }
        self.element.verify(field)
    }

    fn check(
        &self,
        value: &Value,
        path: &FieldPath,
        errors: &mut Vec<FieldError>,
    ) -> Option<Value> {
        let label = path.label();
        let Some(items) = value.as_array() else {
            errors.push(FieldError::new(
                path,
                ErrorKind::WrongType {
                    expected: ValueKind::Array,
                },
                format!("{label} must be an array"),
            ));
            return None;
        };

        let before = errors.len();

        if let Some(min) = self.min_items {
            if items.len() < min {
                errors.push(FieldError::new(
                    path,
                    ErrorKind::InvalidLength(LengthViolation::TooShort),
                    format!("{label} must contain at least {min} items"),
                ));
            }
        }
        if let Some(max) = self.max_items {
            if items.len() > max {
                errors.push(FieldError::new(
                    path,
                    ErrorKind::InvalidLength(LengthViolation::TooLong),
                    format!("{label} must contain at most {max} items"),
                ));
            }
        }

        let mut output = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if let Some(checked) = self.element.check(item, &path.index(index), errors) {
                output.push(checked);
            }
        }

        (errors.len() == before).then_some(Value::Array(output))
    }
}

// =============================================================================
// Fields
// =============================================================================

/// What happens when a field is absent or `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// Absent is a `MissingField` error.
    Required,
    /// Absent is fine and stays absent.
    Optional,
    /// Absent is replaced by this value.
    Default(Value),
}

/// One declared field of an object schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    rule: Rule,
    presence: Presence,
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }
}

/// Whether absent fields are checked against their presence policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Full,
    /// Top-level fields may be absent; no defaults are injected.
    Partial,
}

// =============================================================================
// Object Schema
// =============================================================================

/// An ordered set of named field rules.
#[derive(Debug)]
pub struct ObjectSchema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl ObjectSchema {
    pub fn builder(name: impl Into<String>) -> ObjectSchemaBuilder {
        ObjectSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Validates `input` as an object, appending every failure to `errors`.
    ///
    /// Returns the declared fields (coerced, defaults applied) when this
    /// object contributed no errors.
    pub(crate) fn check_object(
        &self,
        input: &Value,
        path: &FieldPath,
        mode: Mode,
        errors: &mut Vec<FieldError>,
    ) -> Option<Map<String, Value>> {
        let Some(object) = input.as_object() else {
            errors.push(FieldError::new(
                path,
                ErrorKind::WrongType {
                    expected: ValueKind::Object,
                },
                format!("{} must be an object", path.label()),
            ));
            return None;
        };

        let before = errors.len();
        let mut output = Map::new();

        for field in &self.fields {
            let field_path = path.field(&field.name);
            match object.get(&field.name) {
                None | Some(Value::Null) => {
                    if mode == Mode::Partial {
                        continue;
                    }
                    match &field.presence {
                        Presence::Required => errors.push(FieldError::new(
                            &field_path,
                            ErrorKind::MissingField,
                            format!("{} is required", field.name),
                        )),
                        Presence::Optional => {}
                        Presence::Default(value) => {
                            output.insert(field.name.clone(), value.clone());
                        }
                    }
                }
                Some(value) => {
                    if let Some(checked) = field.rule.check(value, &field_path, errors) {
                        output.insert(field.name.clone(), checked);
                    }
                }
            }
        }

        (errors.len() == before).then_some(output)
    }

    /// Validates a whole payload, returning the declared fields or every error.
    pub(crate) fn check_root(&self, input: &Value, mode: Mode) -> ValidationResult<Map<String, Value>> {
        let mut errors = Vec::new();
        let output = self.check_object(input, &FieldPath::root(), mode, &mut errors);
        ValidationErrors::check(errors)?;
        Ok(output.unwrap_or_default())
    }
}

/// Builder for [`ObjectSchema`]. Declaration order is validation order.
#[derive(Debug)]
pub struct ObjectSchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
}

impl ObjectSchemaBuilder {
    fn push(mut self, name: &str, rule: Rule, presence: Presence) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            rule,
            presence,
        });
        self
    }

    #[must_use]
    pub fn required(self, name: &str, rule: impl Into<Rule>) -> Self {
        self.push(name, rule.into(), Presence::Required)
    }

    #[must_use]
    pub fn optional(self, name: &str, rule: impl Into<Rule>) -> Self {
        self.push(name, rule.into(), Presence::Optional)
    }

    #[must_use]
    pub fn with_default(self, name: &str, rule: impl Into<Rule>, default: Value) -> Self {
        self.push(name, rule.into(), Presence::Default(default))
    }

    /// Verifies the declaration and freezes it.
    pub fn build(self) -> Result<ObjectSchema, SchemaError> {
        let mut seen = HashSet::new();

        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName {
                    schema: self.name.clone(),
                });
            }
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }

            field.rule.verify(&field.name)?;

            if let Presence::Default(default) = &field.presence {
                let mut errors = Vec::new();
                let path = FieldPath::root().field(&field.name);
                if default.is_null() || field.rule.check(default, &path, &mut errors).is_none() {
                    let reason = errors
                        .first()
                        .map(|error| error.message.clone())
                        .unwrap_or_else(|| "default cannot be null".to_string());
                    return Err(SchemaError::InvalidDefault {
                        field: field.name.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(ObjectSchema {
            name: self.name,
            fields: self.fields,
        })
    }
}

// =============================================================================
// Typed Schema
// =============================================================================

/// An object schema bound to the record type it produces.
pub struct Schema<T> {
    object: Arc<ObjectSchema>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Schema<T> {
    pub fn new(object: ObjectSchema) -> Self {
        Schema::from_shared(Arc::new(object))
    }

    pub fn from_shared(object: Arc<ObjectSchema>) -> Self {
        Schema {
            object,
            marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn object(&self) -> &ObjectSchema {
        &self.object
    }

    pub fn shared(&self) -> Arc<ObjectSchema> {
        Arc::clone(&self.object)
    }

    /// Validates without building the typed record.
    pub fn check_value(&self, input: &Value) -> ValidationResult<Map<String, Value>> {
        self.object.check_root(input, Mode::Full)
    }
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Schema::from_shared(self.shared())
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("object", &self.object).finish()
    }
}

impl<T: DeserializeOwned> Validator<T> for Schema<T> {
    fn validate(&self, input: &Value) -> ValidationResult<T> {
        let fields = self.check_value(input)?;
        assemble(self.name(), Value::Object(fields))
    }

    fn name(&self) -> &str {
        self.object.name()
    }
}

/// Builds the typed record from validated fields.
///
/// A failure here means the descriptor and the record type disagree; it is
/// logged and reported as a payload-level `Internal` error.
pub(crate) fn assemble<T: DeserializeOwned>(schema: &str, value: Value) -> ValidationResult<T> {
    serde_json::from_value(value).map_err(|err| {
        error!(schema = %schema, error = %err, "Validated fields do not fit the record type");
        ValidationErrors::single(FieldError::new(
            &FieldPath::root(),
            ErrorKind::Internal,
            format!("{schema} record could not be assembled: {err}"),
        ))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Line {
        quantity: i64,
        unit_price: f64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        label: String,
        active: bool,
        lines: Option<Vec<Line>>,
    }

    fn line_schema() -> ObjectSchema {
        ObjectSchema::builder("line")
            .required("quantity", Primitive::integer().positive())
            .required("unit_price", Primitive::number().positive())
            .build()
            .unwrap()
    }

    fn order_schema() -> Schema<Order> {
        Schema::new(
            ObjectSchema::builder("order")
                .required("label", Primitive::string().min_len(1))
                .with_default("active", Primitive::boolean(), json!(true))
                .optional("lines", ArrayRule::of(line_schema()).max_items(2))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_valid_payload_builds_record() {
        let order = order_schema()
            .validate(&json!({
                "label": "A-1",
                "lines": [{ "quantity": 2, "unit_price": 1.5 }],
                "ignored": "extra fields are dropped"
            }))
            .unwrap();
        assert_eq!(
            order,
            Order {
                label: "A-1".to_string(),
                active: true,
                lines: Some(vec![Line {
                    quantity: 2,
                    unit_price: 1.5
                }]),
            }
        );
    }

    #[test]
    fn test_errors_follow_declaration_order() {
        let errors = order_schema()
            .validate(&json!({
                "lines": [{ "quantity": 0, "unit_price": -1 }],
                "active": "yes"
            }))
            .unwrap_err();
        assert_eq!(
            errors.fields(),
            vec![
                "label",
                "active",
                "lines[0].quantity",
                "lines[0].unit_price"
            ]
        );
        assert_eq!(errors.as_slice()[0].kind, ErrorKind::MissingField);
    }

    #[test]
    fn test_collection_bounds_and_element_type() {
        let errors = order_schema()
            .validate(&json!({
                "label": "A-1",
                "lines": [
                    { "quantity": 1, "unit_price": 1 },
                    "not an object",
                    { "quantity": 1, "unit_price": 1 }
                ]
            }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["lines", "lines[1]"]);
        assert_eq!(
            errors.as_slice()[0].kind,
            ErrorKind::InvalidLength(LengthViolation::TooLong)
        );
        assert_eq!(errors.as_slice()[1].message, "lines must be an object");
    }

    #[test]
    fn test_root_must_be_object() {
        let errors = order_schema().validate(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.as_slice()[0].is_root());
        assert_eq!(errors.as_slice()[0].message, "payload must be an object");
    }

    #[test]
    fn test_null_counts_as_missing() {
        let errors = order_schema()
            .validate(&json!({ "label": null }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["label"]);
        assert_eq!(errors.as_slice()[0].kind, ErrorKind::MissingField);
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let err = ObjectSchema::builder("dup")
            .required("name", Primitive::string())
            .optional("name", Primitive::string())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                schema: "dup".to_string(),
                field: "name".to_string()
            }
        );
    }

    #[test]
    fn test_builder_rejects_invalid_default() {
        let err = ObjectSchema::builder("user")
            .with_default("active", Primitive::boolean(), json!("maybe"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault { .. }));
    }

    #[test]
    fn test_builder_rejects_inverted_collection_bounds() {
        let err = ObjectSchema::builder("order")
            .optional("lines", ArrayRule::of(line_schema()).min_items(3).max_items(1))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvertedBounds { .. }));
    }

    #[test]
    fn test_type_mismatch_is_internal_not_panic() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Wrong {
            label: i64,
        }

        let schema: Schema<Wrong> = Schema::from_shared(order_schema().shared());
        let errors = schema.validate(&json!({ "label": "A-1" })).unwrap_err();
        assert_eq!(errors.as_slice()[0].kind, ErrorKind::Internal);
    }
}
