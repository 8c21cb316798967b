//! # Record Types
//!
//! The typed records produced by validation.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Record Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │    Vehicle      │   │  ProductType    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  username       │   │  brand          │   │  name           │       │
//! │  │  email          │   │  model          │   │  category_id    │       │
//! │  │  password       │   │  year           │   └─────────────────┘       │
//! │  │  active         │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  StockProduct   │   │ ProductPurchase │   │ PurchaseHistory │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  quantity       │   │  product_id     │   │  description    │       │
//! │  │  product_id     │   │  history_id     │   │  purchase_date  │       │
//! │  │  timestamp?     │   │  tax_id, status │   │  arrival_date   │       │
//! │  └─────────────────┘   │  price, total   │   │  purchases?     │       │
//! │                        │  quantity       │   │   └► PurchaseLine│      │
//! │  ┌─────────────────┐   └─────────────────┘   └─────────────────┘       │
//! │  │   WorkTicket    │                                                    │
//! │  │  description    │                                                    │
//! │  │  status, date   │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records reference each other by integer id only; whether a referenced id
//! exists is the storage layer's concern.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entity::{Constrained, FieldConstraints};
use crate::normalize::Searchable;
use crate::rules::{Constraint, Scalar, ValueKind};
use crate::schemas::{vehicle_year_message, SchemaSettings};
use crate::FIRST_VEHICLE_YEAR;

/// Calendar year used as the default upper bound on vehicle years.
pub fn current_year() -> i32 {
    Utc::now().year()
}

// =============================================================================
// User
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Searchable for User {
    fn search_text(&self) -> String {
        self.username.clone()
    }
}

impl Constrained for User {
    fn entity_name() -> &'static str {
        "user"
    }

    fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
        vec![
            FieldConstraints::required("username", ValueKind::String).with(min_length(1)),
            FieldConstraints::required("email", ValueKind::String).with(Constraint::Email),
            FieldConstraints::required("password", ValueKind::String).with(min_length(1)),
            FieldConstraints::optional("active", ValueKind::Boolean),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "username" => Some(Scalar::Text(&self.username)),
            "email" => Some(Scalar::Text(&self.email)),
            "password" => Some(Scalar::Text(&self.password)),
            "active" => Some(Scalar::Flag(self.active)),
            _ => None,
        }
    }
}

// =============================================================================
// Vehicle
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Vehicle {
    pub brand: String,
    pub model: String,
    pub year: i32,
}

impl Searchable for Vehicle {
    fn search_text(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

impl Constrained for Vehicle {
    fn entity_name() -> &'static str {
        "vehicle"
    }

    fn constraint_table(settings: &SchemaSettings) -> Vec<FieldConstraints> {
        let max_year = settings.vehicle_max_year();
        vec![
            FieldConstraints::required("brand", ValueKind::String).with(min_length(1)),
            FieldConstraints::required("model", ValueKind::String).with(min_length(1)),
            FieldConstraints::required("year", ValueKind::Integer)
                .with(Constraint::Range {
                    min: Some(f64::from(FIRST_VEHICLE_YEAR)),
                    max: Some(f64::from(max_year)),
                })
                .message(vehicle_year_message(max_year)),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "brand" => Some(Scalar::Text(&self.brand)),
            "model" => Some(Scalar::Text(&self.model)),
            "year" => Some(Scalar::Number(f64::from(self.year))),
            _ => None,
        }
    }
}

// =============================================================================
// Product Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductType {
    pub name: String,
    pub category_id: i64,
}

impl Searchable for ProductType {
    fn search_text(&self) -> String {
        self.name.clone()
    }
}

impl Constrained for ProductType {
    fn entity_name() -> &'static str {
        "product_type"
    }

    fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
        vec![
            FieldConstraints::required("name", ValueKind::String).with(Constraint::Length {
                min: Some(2),
                max: Some(50),
            }),
            FieldConstraints::required("category_id", ValueKind::Integer)
                .with(Constraint::Positive),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "name" => Some(Scalar::Text(&self.name)),
            "category_id" => Some(Scalar::Number(self.category_id as f64)),
            _ => None,
        }
    }
}

// =============================================================================
// Stock Product
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockProduct {
    pub quantity: i64,
    pub product_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Constrained for StockProduct {
    fn entity_name() -> &'static str {
        "stock_product"
    }

    fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
        vec![
            FieldConstraints::required("quantity", ValueKind::Integer)
                .with(Constraint::NonNegative),
            FieldConstraints::required("product_id", ValueKind::Integer)
                .with(Constraint::Positive),
            FieldConstraints::optional("timestamp", ValueKind::Date),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "quantity" => Some(Scalar::Number(self.quantity as f64)),
            "product_id" => Some(Scalar::Number(self.product_id as f64)),
            "timestamp" => self.timestamp.map(Scalar::Date),
            _ => None,
        }
    }
}

// =============================================================================
// Product Purchase
// =============================================================================

/// Lifecycle state of one purchased product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Processed,
    Returned,
}

impl PurchaseStatus {
    pub const ALL: [PurchaseStatus; 2] = [PurchaseStatus::Processed, PurchaseStatus::Returned];

    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Processed => "processed",
            PurchaseStatus::Returned => "returned",
        }
    }
}

/// One product bought as part of a purchase history.
///
/// `total_price` is carried as supplied; it is not recomputed from
/// `price * quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPurchase {
    pub product_id: i64,
    pub purchase_history_id: i64,
    pub tax_id: i64,
    pub status: PurchaseStatus,
    pub price: f64,
    pub total_price: f64,
    pub quantity: i64,
}

impl Constrained for ProductPurchase {
    fn entity_name() -> &'static str {
        "product_purchase"
    }

    fn constraint_table(settings: &SchemaSettings) -> Vec<FieldConstraints> {
        let statuses = PurchaseStatus::ALL
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();
        vec![
            FieldConstraints::required("product_id", ValueKind::Integer)
                .with(Constraint::Positive),
            FieldConstraints::required("purchase_history_id", ValueKind::Integer)
                .with(Constraint::Positive),
            FieldConstraints::required("tax_id", ValueKind::Integer).with(Constraint::Positive),
            FieldConstraints::required("status", ValueKind::String).with(Constraint::OneOf {
                allowed: statuses,
                list_limit: settings.enum_list_limit,
            }),
            FieldConstraints::required("price", ValueKind::Number)
                .with(Constraint::NonNegative),
            FieldConstraints::required("total_price", ValueKind::Number)
                .with(Constraint::NonNegative),
            FieldConstraints::required("quantity", ValueKind::Integer).with(Constraint::Range {
                min: Some(1.0),
                max: None,
            }),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "product_id" => Some(Scalar::Number(self.product_id as f64)),
            "purchase_history_id" => Some(Scalar::Number(self.purchase_history_id as f64)),
            "tax_id" => Some(Scalar::Number(self.tax_id as f64)),
            "status" => Some(Scalar::Text(self.status.as_str())),
            "price" => Some(Scalar::Number(self.price)),
            "total_price" => Some(Scalar::Number(self.total_price)),
            "quantity" => Some(Scalar::Number(self.quantity as f64)),
            _ => None,
        }
    }
}

// =============================================================================
// Purchase History
// =============================================================================

/// Embedded line item on a purchase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub unit_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseHistory {
    pub description: String,
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub arrival_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchases: Option<Vec<PurchaseLine>>,
}

impl PurchaseHistory {
    /// Number of embedded line items.
    pub fn line_count(&self) -> usize {
        self.purchases.as_ref().map_or(0, Vec::len)
    }
}

impl Searchable for PurchaseHistory {
    fn search_text(&self) -> String {
        self.description.clone()
    }
}

/// Line items are not in the table; they are decoded as-is and their rules
/// live in the declared schema.
impl Constrained for PurchaseHistory {
    fn entity_name() -> &'static str {
        "purchase_history"
    }

    fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
        vec![
            FieldConstraints::required("description", ValueKind::String).with(
                Constraint::Length {
                    min: Some(10),
                    max: Some(500),
                },
            ),
            FieldConstraints::required("purchase_date", ValueKind::Date),
            FieldConstraints::required("arrival_date", ValueKind::Date),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "description" => Some(Scalar::Text(&self.description)),
            "purchase_date" => Some(Scalar::Date(self.purchase_date)),
            "arrival_date" => Some(Scalar::Date(self.arrival_date)),
            _ => None,
        }
    }
}

// =============================================================================
// Work Ticket
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkTicket {
    pub description: String,
    pub status: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl Searchable for WorkTicket {
    fn search_text(&self) -> String {
        self.description.clone()
    }
}

impl Constrained for WorkTicket {
    fn entity_name() -> &'static str {
        "work_ticket"
    }

    fn constraint_table(_settings: &SchemaSettings) -> Vec<FieldConstraints> {
        vec![
            FieldConstraints::required("description", ValueKind::String).with(
                Constraint::Length {
                    min: Some(10),
                    max: Some(1000),
                },
            ),
            FieldConstraints::required("status", ValueKind::String).with(Constraint::Length {
                min: None,
                max: Some(50),
            }),
            FieldConstraints::required("date", ValueKind::Date).coerce(),
        ]
    }

    fn field_value(&self, field: &str) -> Option<Scalar<'_>> {
        match field {
            "description" => Some(Scalar::Text(&self.description)),
            "status" => Some(Scalar::Text(&self.status)),
            "date" => Some(Scalar::Date(self.date)),
            _ => None,
        }
    }
}

fn min_length(min: usize) -> Constraint {
    Constraint::Length {
        min: Some(min),
        max: None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
