//! # intake-core: Validation & Normalization for Intake
//!
//! This crate is the gate every inbound record passes through. It turns
//! untyped payloads into typed records, or into the complete list of field
//! problems, and derives canonical search keys from free text.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Intake Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Collaborators (request handlers, intake CLI)           │   │
//! │  │      JSON payload ──► validate ──► typed record / errors        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ intake-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │  rules   │  │  schema  │  │ partial  │  │    entity    │  │   │
//! │  │   │ coercion │  │ objects  │  │ updates  │  │ constraint   │  │   │
//! │  │   │ checks   │  │ arrays   │  │ patches  │  │   tables     │  │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘  │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │  engine  │  │normalize │  │ schemas  │  │   registry   │  │   │
//! │  │   │Validator │  │search key│  │ 7 record │  │ by entity    │  │   │
//! │  │   │          │  │          │  │  types   │  │    kind      │  │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Field errors, the error list, schema construction errors
//! - [`path`] - Dot/bracket field paths
//! - [`rules`] - Primitive rules, constraints and coercion
//! - [`schema`] - Object and array descriptors, `Schema<T>`
//! - [`partial`] - Update variants and patches
//! - [`engine`] - The `Validator` trait and entry points
//! - [`normalize`] - Canonical search keys
//! - [`entity`] - Constraint tables on persisted models
//! - [`models`] - The seven record types
//! - [`schemas`] - Their declared schemas
//! - [`registry`] - Schema lookup by entity kind
//!
//! ## Example Usage
//!
//! ```rust
//! use intake_core::{validate, schemas, SchemaSettings, Vehicle};
//! use serde_json::json;
//!
//! let schema = schemas::vehicle_schema(&SchemaSettings::default()).unwrap();
//!
//! let vehicle: Vehicle =
//!     validate(&schema, &json!({ "brand": "Ford", "model": "T", "year": 1927 })).unwrap();
//! assert_eq!(vehicle.year, 1927);
//!
//! let errors = validate::<Vehicle, _>(&schema, &json!({ "brand": "", "model": "X", "year": 1800 }))
//!     .unwrap_err();
//! assert_eq!(errors.fields(), vec!["brand", "year"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod entity;
pub mod error;
pub mod models;
pub mod normalize;
pub mod partial;
pub mod path;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod schemas;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use engine::{validate, validate_batch, validate_str, Validator};
pub use entity::{Constrained, EntityAdapter, FieldConstraints};
pub use error::{ErrorKind, FieldError, SchemaError, ValidationErrors, ValidationResult};
pub use models::*;
pub use normalize::{normalize, NormalizedText, Searchable};
pub use partial::{Patch, PartialSchema};
pub use path::FieldPath;
pub use registry::{EntityKind, SchemaRegistry, UnknownEntity, ValidatedRecord};
pub use rules::{Constraint, Primitive, ValueKind};
pub use schema::{ArrayRule, ObjectSchema, Rule, Schema};
pub use schemas::SchemaSettings;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest allowed-value set that is still spelled out in an enum message.
pub const DEFAULT_ENUM_LIST_LIMIT: usize = 10;

/// Joins several messages reported on one field.
pub const MESSAGE_SEPARATOR: &str = "; ";

/// Line items accepted on one purchase history.
///
/// ## Business Reason
/// Bounds the work done per payload; a history larger than this is almost
/// always a bulk export that should be split.
pub const DEFAULT_MAX_LINE_ITEMS: usize = 500;

/// Earliest model year a vehicle can carry.
pub const FIRST_VEHICLE_YEAR: i32 = 1886;
