//! # Declared Schemas
//!
//! One builder per record type. Each returns `Err(SchemaError)` only if the
//! declaration itself is inconsistent, which the tests below rule out.
//!
//! | record            | notable rules                                        |
//! |-------------------|------------------------------------------------------|
//! | user              | e-mail shape, `active` defaults to `true`            |
//! | vehicle           | year in `1886..=max year`, "must be valid" message   |
//! | product type      | name 2-50 chars, positive category id                |
//! | stock product     | quantity ≥ 0, optional timestamp                     |
//! | product purchase  | status ∈ {processed, returned}, quantity ≥ 1         |
//! | purchase history  | description 10-500, optional bounded line items      |
//! | work ticket       | description 10-1000, coercible date                  |

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::models::{
    current_year, ProductPurchase, ProductType, PurchaseHistory, PurchaseStatus, StockProduct,
    User, Vehicle, WorkTicket,
};
use crate::rules::Primitive;
use crate::schema::{ArrayRule, ObjectSchema, Schema};
use crate::{DEFAULT_ENUM_LIST_LIMIT, DEFAULT_MAX_LINE_ITEMS, FIRST_VEHICLE_YEAR};

// =============================================================================
// Settings
// =============================================================================

/// Tunables for the declared schemas, usually read from the `[schemas]`
/// section of the importer's config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Latest accepted vehicle year. `None` means the current calendar year.
    pub vehicle_max_year: Option<i32>,

    /// Line items accepted on one purchase history.
    pub max_line_items: usize,

    /// Enum sets larger than this get a generic message.
    pub enum_list_limit: usize,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            vehicle_max_year: None,
            max_line_items: DEFAULT_MAX_LINE_ITEMS,
            enum_list_limit: DEFAULT_ENUM_LIST_LIMIT,
        }
    }
}

impl SchemaSettings {
    pub fn vehicle_max_year(&self) -> i32 {
        self.vehicle_max_year.unwrap_or_else(current_year)
    }
}

/// Message for a vehicle year outside `FIRST_VEHICLE_YEAR..=max_year`.
pub fn vehicle_year_message(max_year: i32) -> String {
    format!("year must be valid: between {FIRST_VEHICLE_YEAR} and {max_year}")
}

// =============================================================================
// Builders
// =============================================================================

pub fn user_schema() -> Result<Schema<User>, SchemaError> {
    let object = ObjectSchema::builder("user")
        .required("username", Primitive::string().min_len(1))
        .required("email", Primitive::string().email())
        .required("password", Primitive::string().min_len(1))
        .with_default("active", Primitive::boolean(), serde_json::Value::Bool(true))
        .build()?;
    Ok(Schema::new(object))
}

pub fn vehicle_schema(settings: &SchemaSettings) -> Result<Schema<Vehicle>, SchemaError> {
    let max_year = settings.vehicle_max_year();
    let object = ObjectSchema::builder("vehicle")
        .required("brand", Primitive::string().min_len(1))
        .required("model", Primitive::string().min_len(1))
        .required(
            "year",
            Primitive::integer()
                .between(f64::from(FIRST_VEHICLE_YEAR), f64::from(max_year))
                .message(vehicle_year_message(max_year)),
        )
        .build()?;
    Ok(Schema::new(object))
}

pub fn product_type_schema() -> Result<Schema<ProductType>, SchemaError> {
    let object = ObjectSchema::builder("product_type")
        .required("name", Primitive::string().len_between(2, 50))
        .required("category_id", Primitive::integer().positive())
        .build()?;
    Ok(Schema::new(object))
}

pub fn stock_product_schema() -> Result<Schema<StockProduct>, SchemaError> {
    let object = ObjectSchema::builder("stock_product")
        .required("quantity", Primitive::integer().non_negative())
        .required("product_id", Primitive::integer().positive())
        .optional("timestamp", Primitive::date())
        .build()?;
    Ok(Schema::new(object))
}

pub fn product_purchase_schema(
    settings: &SchemaSettings,
) -> Result<Schema<ProductPurchase>, SchemaError> {
    let statuses: Vec<&str> = PurchaseStatus::ALL.iter().map(|s| s.as_str()).collect();
    let object = ObjectSchema::builder("product_purchase")
        .required("product_id", Primitive::integer().positive())
        .required("purchase_history_id", Primitive::integer().positive())
        .required("tax_id", Primitive::integer().positive())
        .required(
            "status",
            Primitive::string().one_of_listing(&statuses, settings.enum_list_limit),
        )
        .required("price", Primitive::number().non_negative())
        .required("total_price", Primitive::number().non_negative())
        .required("quantity", Primitive::integer().min(1.0))
        .build()?;
    Ok(Schema::new(object))
}

/// Element rule for `purchases[i]`.
pub fn purchase_line_object() -> Result<ObjectSchema, SchemaError> {
    ObjectSchema::builder("purchase_line")
        .optional("product_id", Primitive::integer().positive())
        .required("quantity", Primitive::integer().positive())
        .required("unit_price", Primitive::number().positive())
        .build()
}

pub fn purchase_history_schema(
    settings: &SchemaSettings,
) -> Result<Schema<PurchaseHistory>, SchemaError> {
    let lines = ArrayRule::of(purchase_line_object()?).max_items(settings.max_line_items);
    let object = ObjectSchema::builder("purchase_history")
        .required("description", Primitive::string().len_between(10, 500))
        .required("purchase_date", Primitive::date())
        .required("arrival_date", Primitive::date())
        .optional("purchases", lines)
        .build()?;
    Ok(Schema::new(object))
}

pub fn work_ticket_schema() -> Result<Schema<WorkTicket>, SchemaError> {
    let object = ObjectSchema::builder("work_ticket")
        .required("description", Primitive::string().len_between(10, 1000))
        .required("status", Primitive::string().max_len(50))
        .required("date", Primitive::date().coerce())
        .build()?;
    Ok(Schema::new(object))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{validate, Validator};
    use crate::error::{ErrorKind, LengthViolation};
    use serde_json::json;

    fn settings() -> SchemaSettings {
        SchemaSettings {
            vehicle_max_year: Some(2026),
            ..SchemaSettings::default()
        }
    }

    #[test]
    fn test_every_schema_builds() {
        assert!(user_schema().is_ok());
        assert!(vehicle_schema(&settings()).is_ok());
        assert!(product_type_schema().is_ok());
        assert!(stock_product_schema().is_ok());
        assert!(product_purchase_schema(&settings()).is_ok());
        assert!(purchase_history_schema(&settings()).is_ok());
        assert!(work_ticket_schema().is_ok());
    }

    #[test]
    fn test_user_active_defaults_to_true() {
        let user: User = validate(
            &user_schema().unwrap(),
            &json!({ "username": "ana", "email": "ana@shop.test", "password": "pw" }),
        )
        .unwrap();
        assert!(user.active);
    }

    #[test]
    fn test_user_email_shape() {
        let errors = user_schema()
            .unwrap()
            .validate(&json!({ "username": "ana", "email": "ana.shop.test", "password": "pw" }))
            .unwrap_err();
        assert_eq!(errors.as_slice()[0].kind, ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_vehicle_scenario() {
        let errors = vehicle_schema(&settings())
            .unwrap()
            .validate(&json!({ "brand": "", "model": "X", "year": 1800 }))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.as_slice()[0].field, "brand");
        assert_eq!(
            errors.as_slice()[0].kind,
            ErrorKind::InvalidLength(LengthViolation::TooShort)
        );
        assert_eq!(errors.as_slice()[1].field, "year");
        assert!(errors.as_slice()[1].message.contains("must be valid"));
    }

    #[test]
    fn test_vehicle_max_year_from_settings() {
        let schema = vehicle_schema(&settings()).unwrap();
        assert!(schema
            .validate(&json!({ "brand": "Ford", "model": "T", "year": 2026 }))
            .is_ok());
        assert!(schema
            .validate(&json!({ "brand": "Ford", "model": "T", "year": 2027 }))
            .is_err());
    }

    #[test]
    fn test_product_type_name_window() {
        let schema = product_type_schema().unwrap();
        let errors = schema
            .validate(&json!({ "name": "x", "category_id": 1 }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["name"]);
        assert!(schema
            .validate(&json!({ "name": "Brake pads", "category_id": 3 }))
            .is_ok());
    }

    #[test]
    fn test_stock_scenario() {
        let errors = stock_product_schema()
            .unwrap()
            .validate(&json!({ "quantity": -1, "product_id": 5 }))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.as_slice()[0].field, "quantity");
        assert_eq!(errors.as_slice()[0].message, "quantity cannot be negative");
    }

    #[test]
    fn test_product_purchase_status_listing() {
        let errors = product_purchase_schema(&settings())
            .unwrap()
            .validate(&json!({
                "product_id": 1,
                "purchase_history_id": 2,
                "tax_id": 3,
                "status": "lost",
                "price": 10.0,
                "total_price": 20.0,
                "quantity": 0
            }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["status", "quantity"]);
        assert_eq!(
            errors.as_slice()[0].message,
            "status must be one of: processed, returned"
        );
    }

    #[test]
    fn test_total_price_is_not_recomputed() {
        let purchase: ProductPurchase = validate(
            &product_purchase_schema(&settings()).unwrap(),
            &json!({
                "product_id": 1,
                "purchase_history_id": 2,
                "tax_id": 3,
                "status": "returned",
                "price": 10.0,
                "total_price": 99.5,
                "quantity": 2
            }),
        )
        .unwrap();
        assert_eq!(purchase.total_price, 99.5);
        assert_eq!(purchase.status, PurchaseStatus::Returned);
    }

    #[test]
    fn test_purchase_history_line_path() {
        let errors = purchase_history_schema(&settings())
            .unwrap()
            .validate(&json!({
                "description": "Spring restock of brake parts",
                "purchase_date": "2024-03-01",
                "arrival_date": "2024-03-05T10:00:00Z",
                "purchases": [
                    { "quantity": 2, "unit_price": 5.5 },
                    { "quantity": -3, "unit_price": 5.5 }
                ]
            }))
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["purchases[1].quantity"]);
    }

    #[test]
    fn test_purchase_history_line_limit() {
        let small = SchemaSettings {
            max_line_items: 1,
            ..settings()
        };
        let errors = purchase_history_schema(&small)
            .unwrap()
            .validate(&json!({
                "description": "Spring restock of brake parts",
                "purchase_date": "2024-03-01",
                "arrival_date": "2024-03-05",
                "purchases": [
                    { "quantity": 1, "unit_price": 1.0 },
                    { "quantity": 1, "unit_price": 1.0 }
                ]
            }))
            .unwrap_err();
        assert_eq!(
            errors.as_slice()[0].kind,
            ErrorKind::InvalidLength(LengthViolation::TooLong)
        );
    }

    #[test]
    fn test_work_ticket_date_coercion() {
        let ticket: WorkTicket = validate(
            &work_ticket_schema().unwrap(),
            &json!({
                "description": "Replace the timing belt",
                "status": "open",
                "date": 1_700_000_000_000_i64
            }),
        )
        .unwrap();
        assert_eq!(ticket.date.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: SchemaSettings = serde_json::from_value(json!({ "max_line_items": 20 })).unwrap();
        assert_eq!(settings.max_line_items, 20);
        assert_eq!(settings.enum_list_limit, DEFAULT_ENUM_LIST_LIMIT);
        assert_eq!(settings.vehicle_max_year(), current_year());
    }
}
