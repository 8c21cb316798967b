//! # Schema Registry
//!
//! Looks up the declared schema for an entity kind named at runtime, e.g. by
//! the importer's `--entity` flag. Built once, then shared read-only across
//! threads.
//!
//! ```text
//!   "work_ticket" ──► EntityKind::WorkTicket ──► Schema<WorkTicket>
//!                                                    │
//!                          ┌─────────────────────────┴──────────┐
//!                          ▼                                    ▼
//!                 validate_record(kind, &payload)     validate_partial(kind, &payload)
//!                 record + search key                 sparse patch fields
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::engine::validate;
use crate::error::{ErrorKind, FieldError, SchemaError, ValidationErrors, ValidationResult};
use crate::models::{
    ProductPurchase, ProductType, PurchaseHistory, StockProduct, User, Vehicle, WorkTicket,
};
use crate::normalize::{NormalizedText, Searchable};
use crate::partial::Patch;
use crate::path::FieldPath;
use crate::schema::{ObjectSchema, Schema};
use crate::schemas::{self, SchemaSettings};

// =============================================================================
// Entity Kind
// =============================================================================

/// The record types the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Vehicle,
    ProductType,
    StockProduct,
    ProductPurchase,
    PurchaseHistory,
    WorkTicket,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::User,
        EntityKind::Vehicle,
        EntityKind::ProductType,
        EntityKind::StockProduct,
        EntityKind::ProductPurchase,
        EntityKind::PurchaseHistory,
        EntityKind::WorkTicket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Vehicle => "vehicle",
            EntityKind::ProductType => "product_type",
            EntityKind::StockProduct => "stock_product",
            EntityKind::ProductPurchase => "product_purchase",
            EntityKind::PurchaseHistory => "purchase_history",
            EntityKind::WorkTicket => "work_ticket",
        }
    }

    /// Fields that must not be echoed back in reports.
    pub fn sensitive_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["password"],
            _ => &[],
        }
    }

    /// Whether records of this kind carry a search key.
    pub fn is_searchable(&self) -> bool {
        !matches!(self, EntityKind::StockProduct | EntityKind::ProductPurchase)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an entity name matches no known kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown entity kind '{0}' (expected one of: user, vehicle, product_type, stock_product, product_purchase, purchase_history, work_ticket)")]
pub struct UnknownEntity(pub String);

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    /// Accepts snake_case or kebab-case, any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownEntity(s.to_string()))
    }
}

// =============================================================================
// Registry
// =============================================================================

/// A validated record, type-erased back to JSON for transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRecord {
    pub kind: EntityKind,
    pub record: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_key: Option<NormalizedText>,
}

/// Every declared schema, built from one set of [`SchemaSettings`].
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    user: Schema<User>,
    vehicle: Schema<Vehicle>,
    product_type: Schema<ProductType>,
    stock_product: Schema<StockProduct>,
    product_purchase: Schema<ProductPurchase>,
    purchase_history: Schema<PurchaseHistory>,
    work_ticket: Schema<WorkTicket>,
}

impl SchemaRegistry {
    pub fn new(settings: &SchemaSettings) -> Result<Self, SchemaError> {
        Ok(SchemaRegistry {
            user: schemas::user_schema()?,
            vehicle: schemas::vehicle_schema(settings)?,
            product_type: schemas::product_type_schema()?,
            stock_product: schemas::stock_product_schema()?,
            product_purchase: schemas::product_purchase_schema(settings)?,
            purchase_history: schemas::purchase_history_schema(settings)?,
            work_ticket: schemas::work_ticket_schema()?,
        })
    }

    pub fn user(&self) -> &Schema<User> {
        &self.user
    }

    pub fn vehicle(&self) -> &Schema<Vehicle> {
        &self.vehicle
    }

    pub fn product_type(&self) -> &Schema<ProductType> {
        &self.product_type
    }

    pub fn stock_product(&self) -> &Schema<StockProduct> {
        &self.stock_product
    }

    pub fn product_purchase(&self) -> &Schema<ProductPurchase> {
        &self.product_purchase
    }

    pub fn purchase_history(&self) -> &Schema<PurchaseHistory> {
        &self.purchase_history
    }

    pub fn work_ticket(&self) -> &Schema<WorkTicket> {
        &self.work_ticket
    }

    /// The untyped descriptor behind `kind`.
    pub fn object(&self, kind: EntityKind) -> &ObjectSchema {
        match kind {
            EntityKind::User => self.user.object(),
            EntityKind::Vehicle => self.vehicle.object(),
            EntityKind::ProductType => self.product_type.object(),
            EntityKind::StockProduct => self.stock_product.object(),
            EntityKind::ProductPurchase => self.product_purchase.object(),
            EntityKind::PurchaseHistory => self.purchase_history.object(),
            EntityKind::WorkTicket => self.work_ticket.object(),
        }
    }

    /// Validates a full payload for `kind`, returning the typed record as JSON.
    pub fn validate(&self, kind: EntityKind, input: &Value) -> ValidationResult<Value> {
        self.validate_record(kind, input).map(|validated| validated.record)
    }

    /// Validates a full payload for `kind`, attaching its search key.
    pub fn validate_record(
        &self,
        kind: EntityKind,
        input: &Value,
    ) -> ValidationResult<ValidatedRecord> {
        match kind {
            EntityKind::User => typed(kind, &self.user, input, searchable),
            EntityKind::Vehicle => typed(kind, &self.vehicle, input, searchable),
            EntityKind::ProductType => typed(kind, &self.product_type, input, searchable),
            EntityKind::StockProduct => typed(kind, &self.stock_product, input, unsearchable),
            EntityKind::ProductPurchase => {
                typed(kind, &self.product_purchase, input, unsearchable)
            }
            EntityKind::PurchaseHistory => typed(kind, &self.purchase_history, input, searchable),
            EntityKind::WorkTicket => typed(kind, &self.work_ticket, input, searchable),
        }
    }

    /// Validates an update payload for `kind`, returning only supplied fields.
    pub fn validate_partial(
        &self,
        kind: EntityKind,
        input: &Value,
    ) -> ValidationResult<Map<String, Value>> {
        match kind {
            EntityKind::User => sparse(&self.user, input),
            EntityKind::Vehicle => sparse(&self.vehicle, input),
            EntityKind::ProductType => sparse(&self.product_type, input),
            EntityKind::StockProduct => sparse(&self.stock_product, input),
            EntityKind::ProductPurchase => sparse(&self.product_purchase, input),
            EntityKind::PurchaseHistory => sparse(&self.purchase_history, input),
            EntityKind::WorkTicket => sparse(&self.work_ticket, input),
        }
    }

    /// Search key for an already validated record, if `kind` has one.
    pub fn search_key(&self, kind: EntityKind, record: &Value) -> Option<NormalizedText> {
        match kind {
            EntityKind::User => key_of::<User>(record),
            EntityKind::Vehicle => key_of::<Vehicle>(record),
            EntityKind::ProductType => key_of::<ProductType>(record),
            EntityKind::PurchaseHistory => key_of::<PurchaseHistory>(record),
            EntityKind::WorkTicket => key_of::<WorkTicket>(record),
            EntityKind::StockProduct | EntityKind::ProductPurchase => None,
        }
    }
}

fn key_of<T: Searchable + DeserializeOwned>(record: &Value) -> Option<NormalizedText> {
    T::deserialize(record).ok().map(|record| record.search_key())
}

fn searchable<T: Searchable>(record: &T) -> Option<NormalizedText> {
    Some(record.search_key())
}

fn unsearchable<T>(_record: &T) -> Option<NormalizedText> {
    None
}

fn sparse<T>(schema: &Schema<T>, input: &Value) -> ValidationResult<Map<String, Value>> {
    let patch: Patch<T> = validate(&schema.partial(), input)?;
    Ok(patch.into_fields())
}

fn typed<T>(
    kind: EntityKind,
    schema: &Schema<T>,
    input: &Value,
    key: fn(&T) -> Option<NormalizedText>,
) -> ValidationResult<ValidatedRecord>
where
    T: Serialize + DeserializeOwned,
{
    let record: T = validate(schema, input)?;
    let search_key = key(&record);
    let record = serde_json::to_value(&record).map_err(|err| {
        ValidationErrors::single(FieldError::new(
            &FieldPath::root(),
            ErrorKind::Internal,
            format!("{kind} record could not be serialized: {err}"),
        ))
    })?;

    Ok(ValidatedRecord {
        kind,
        record,
        search_key,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
