//! End-to-end validation scenarios against the declared schemas.
//!
//! Each test drives the public API the way a request handler or the importer
//! would: build the registry once, feed it raw JSON, inspect the result.

use std::fmt::Debug;
use std::sync::Arc;

use intake_core::{
    normalize, schemas, validate, validate_str, EntityAdapter, EntityKind, ErrorKind,
    ProductPurchase, PurchaseHistory, SchemaRegistry, SchemaSettings, StockProduct, User,
    Validator, Vehicle, WorkTicket,
};
use serde_json::{json, Value};

fn settings() -> SchemaSettings {
    SchemaSettings {
        vehicle_max_year: Some(2026),
        ..SchemaSettings::default()
    }
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::new(&settings()).unwrap()
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_negative_stock_quantity() {
    let schema = schemas::stock_product_schema().unwrap();
    let errors = validate::<StockProduct, _>(&schema, &json!({ "quantity": -1, "product_id": 5 }))
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].field, "quantity");
    assert!(errors.as_slice()[0].message.contains("cannot be negative"));
    assert_eq!(errors.for_field("product_id").count(), 0);
}

#[test]
fn test_vehicle_with_empty_brand_and_ancient_year() {
    let schema = schemas::vehicle_schema(&settings()).unwrap();
    let errors = validate::<Vehicle, _>(
        &schema,
        &json!({ "brand": "", "model": "X", "year": 1800 }),
    )
    .unwrap_err();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors.as_slice()[0].field, "brand");
    assert!(errors.as_slice()[0].message.contains("required"));
    assert_eq!(errors.as_slice()[1].field, "year");
    assert!(errors.as_slice()[1].message.contains("must be valid"));
}

#[test]
fn test_normalizer_reference_example() {
    assert_eq!(normalize("Café Núñez!!  2024"), "cafe nunez 2024");
}

#[test]
fn test_purchase_line_error_path() {
    let schema = schemas::purchase_history_schema(&settings()).unwrap();
    let errors = validate::<PurchaseHistory, _>(
        &schema,
        &json!({
            "description": "Quarterly filter order",
            "purchase_date": "2024-01-10T08:30:00Z",
            "arrival_date": "2024-01-12",
            "purchases": [
                { "product_id": 4, "quantity": 1, "unit_price": 12.0 },
                { "product_id": 5, "quantity": -3, "unit_price": 3.5 },
                { "quantity": 2, "unit_price": 1.25 }
            ]
        }),
    )
    .unwrap_err();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].field, "purchases[1].quantity");
    assert_eq!(errors.as_slice()[0].kind, ErrorKind::NotPositive);
}

// ---------------------------------------------------------------------------
// Contract details
// ---------------------------------------------------------------------------

#[test]
fn test_valid_payload_is_returned_unchanged() {
    let input = json!({
        "product_id": 7,
        "purchase_history_id": 3,
        "tax_id": 1,
        "status": "processed",
        "price": 19.99,
        "total_price": 39.98,
        "quantity": 2
    });
    let validated = registry()
        .validate_record(EntityKind::ProductPurchase, &input)
        .unwrap();
    assert_eq!(validated.record, input);
}

#[test]
fn test_dates_come_back_in_utc() {
    let ticket: WorkTicket = validate(
        &schemas::work_ticket_schema().unwrap(),
        &json!({
            "description": "Rotate and balance tyres",
            "status": "scheduled",
            "date": "2024-05-01T09:00:00+02:00"
        }),
    )
    .unwrap();
    assert_eq!(ticket.date.to_rfc3339(), "2024-05-01T07:00:00+00:00");
}

#[test]
fn test_non_coercible_number_string_is_wrong_type() {
    let errors = registry()
        .validate_record(
            EntityKind::StockProduct,
            &json!({ "quantity": "3", "product_id": 5 }),
        )
        .unwrap_err();
    assert_eq!(errors.fields(), vec!["quantity"]);
    assert!(matches!(
        errors.as_slice()[0].kind,
        ErrorKind::WrongType { .. }
    ));
}

#[test]
fn test_malformed_date() {
    let errors = registry()
        .validate_record(
            EntityKind::WorkTicket,
            &json!({ "description": "Check brake fluid", "status": "open", "date": "next week" }),
        )
        .unwrap_err();
    assert_eq!(errors.as_slice()[0].kind, ErrorKind::MalformedDate);
}

#[test]
fn test_root_errors_have_empty_path() {
    let errors = registry()
        .validate_record(EntityKind::Vehicle, &json!([1, 2, 3]))
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].field, "");
    assert!(!errors.as_slice()[0].message.is_empty());

    let errors = validate_str::<Vehicle, _>(registry().vehicle(), "{\"brand\":").unwrap_err();
    assert!(errors.as_slice()[0].is_root());
}

#[test]
fn test_errors_serialize_for_transport() {
    let errors = registry()
        .validate_record(EntityKind::ProductType, &json!({ "name": "x" }))
        .unwrap_err();
    let rendered = serde_json::to_value(&errors).unwrap();
    assert_eq!(
        rendered,
        json!({
            "errors": [
                { "field": "name", "message": "name must be at least 2 characters", "code": "invalid_length" },
                { "field": "category_id", "message": "category_id is required", "code": "missing_field" }
            ]
        })
    );
}

fn assert_same_outcome<T: PartialEq + Debug>(
    schema: &dyn Validator<T>,
    adapter: &dyn Validator<T>,
    inputs: &[Value],
) {
    for input in inputs {
        assert_eq!(
            schema.validate(input),
            adapter.validate(input),
            "validators disagree on {input}"
        );
    }
}

#[test]
fn test_schema_and_adapter_agree_on_vehicle() {
    let adapter = EntityAdapter::<Vehicle>::with_settings(&settings()).unwrap();
    assert_same_outcome(
        registry().vehicle(),
        &adapter,
        &[
            json!({ "brand": "", "model": "X", "year": 1800 }),
            json!({ "brand": 5, "model": 6, "year": "x" }),
            json!({ "model": "T", "year": 1999.5 }),
            json!({ "brand": "Ford", "model": "T", "year": 2026, "colour": "black" }),
            json!(["not", "an", "object"]),
        ],
    );
}

#[test]
fn test_adapter_reports_each_wrongly_typed_field() {
    let input = json!({ "brand": 5, "model": 6, "year": "x" });
    let schema_errors = registry()
        .vehicle()
        .validate(&input)
        .map(|_: Vehicle| ())
        .unwrap_err();
    let adapter_errors = EntityAdapter::<Vehicle>::with_settings(&settings())
        .unwrap()
        .validate(&input)
        .unwrap_err();

    assert_eq!(adapter_errors.fields(), vec!["brand", "model", "year"]);
    assert_eq!(schema_errors.fields(), adapter_errors.fields());
}

#[test]
fn test_adapter_follows_configured_vehicle_year() {
    let settings = SchemaSettings {
        vehicle_max_year: Some(2030),
        ..SchemaSettings::default()
    };
    let schema = schemas::vehicle_schema(&settings).unwrap();
    let adapter = EntityAdapter::<Vehicle>::with_settings(&settings).unwrap();

    assert_same_outcome(
        &schema,
        &adapter,
        &[
            json!({ "brand": "Ford", "model": "T", "year": 2029 }),
            json!({ "brand": "Ford", "model": "T", "year": 1800 }),
        ],
    );
    let errors = adapter
        .validate(&json!({ "brand": "Ford", "model": "T", "year": 1800 }))
        .unwrap_err();
    assert_eq!(
        errors.as_slice()[0].message,
        "year must be valid: between 1886 and 2030"
    );
}

#[test]
fn test_schema_and_adapter_agree_on_user() {
    let adapter = EntityAdapter::<User>::new().unwrap();
    assert_same_outcome(
        registry().user(),
        &adapter,
        &[
            json!({ "username": "ana", "email": "ana@shop.test", "password": "pw" }),
            json!({ "username": "ana", "email": "ana@shop.test", "password": "pw", "active": null }),
            json!({ "username": 1, "email": "bad", "password": "", "active": "yes" }),
        ],
    );
}

#[test]
fn test_schema_and_adapter_agree_on_product_purchase() {
    let adapter = EntityAdapter::<ProductPurchase>::with_settings(&settings()).unwrap();
    assert_same_outcome(
        registry().product_purchase(),
        &adapter,
        &[
            json!({
                "product_id": "1",
                "purchase_history_id": 2,
                "tax_id": 3,
                "status": 7,
                "price": -2,
                "total_price": 1,
                "quantity": 0
            }),
            json!({
                "product_id": 1,
                "purchase_history_id": 2,
                "tax_id": 3,
                "status": "processed",
                "price": 2.5,
                "total_price": 5,
                "quantity": 2
            }),
        ],
    );
}

#[test]
fn test_mixed_validators_behind_one_trait() {
    let validators: Vec<Box<dyn Validator<Vehicle> + Send + Sync>> = vec![
        Box::new(schemas::vehicle_schema(&settings()).unwrap()),
        Box::new(EntityAdapter::<Vehicle>::new().unwrap()),
    ];
    let input = json!({ "brand": "Lada", "model": "Niva", "year": 1977 });
    for validator in &validators {
        assert_eq!(validate(validator, &input).unwrap().model, "Niva");
    }
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_registry_across_tasks() {
    let registry = Arc::new(registry());
    let mut handles = Vec::new();

    for i in 0..32_i64 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let input: Value = json!({ "quantity": i - 16, "product_id": 1 });
            (i, registry.validate_record(EntityKind::StockProduct, &input).is_ok())
        }));
    }

    for handle in handles {
        let (i, accepted) = handle.await.unwrap();
        assert_eq!(accepted, i >= 16);
    }
}

#[tokio::test]
async fn test_adapter_check_async() {
    let adapter = EntityAdapter::<StockProduct>::new().unwrap();
    let errors = adapter
        .check_async(StockProduct {
            quantity: -4,
            product_id: 0,
            timestamp: None,
        })
        .await
        .unwrap_err();
    assert_eq!(errors.fields(), vec!["quantity", "product_id"]);
}
