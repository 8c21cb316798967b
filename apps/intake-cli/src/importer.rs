//! # Record Importer
//!
//! Reads a batch of raw records, validates each one independently and writes
//! a JSON-lines report.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  file / stdin                                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read_records(format)                                                  │
//! │  ├── json    one object, or an array of objects                        │
//! │  ├── ndjson  one value per line; a bad line is a rejected record       │
//! │  └── auto    json if the whole text parses, else ndjson                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SchemaRegistry::validate_record / validate_partial  (per record)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  {"status":"accepted","index":0,"record":{..},"search_key":".."}       │
//! │  {"status":"rejected","index":1,"errors":[{field,message,code}]}       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::Write;

use intake_core::{
    EntityKind, ErrorKind, FieldError, FieldPath, NormalizedText, SchemaRegistry,
    ValidationErrors, ValueKind,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ImportSettings, InputFormat};
use crate::error::{CliError, CliResult};

const REDACTED: &str = "[redacted]";

// =============================================================================
// Report Types
// =============================================================================

/// One line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Accepted {
        index: usize,
        record: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        search_key: Option<NormalizedText>,
    },
    Rejected {
        index: usize,
        errors: Vec<FieldError>,
    },
}

/// Totals for one import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub run_id: Uuid,
    pub entity: EntityKind,
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl ImportSummary {
    /// Turns rejections into an error when the run must fail on them.
    pub fn check(&self, fail_on_reject: bool) -> CliResult<()> {
        if fail_on_reject && self.rejected > 0 {
            return Err(CliError::Rejected {
                rejected: self.rejected,
                total: self.total,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Importer
// =============================================================================

/// What to import and how.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub entity: EntityKind,
    pub partial: bool,
    pub format: InputFormat,
    pub max_records: Option<usize>,
    pub emit_search_keys: bool,
}

impl ImportOptions {
    pub fn new(entity: EntityKind, settings: &ImportSettings) -> Self {
        ImportOptions {
            entity,
            partial: false,
            format: settings.format,
            max_records: settings.max_records,
            emit_search_keys: settings.emit_search_keys,
        }
    }
}

pub struct Importer<'a> {
    registry: &'a SchemaRegistry,
    options: ImportOptions,
    run_id: Uuid,
}

impl<'a> Importer<'a> {
    pub fn new(registry: &'a SchemaRegistry, options: ImportOptions) -> Self {
        Importer {
            registry,
            options,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Validates every record in `text`, writing one report line each.
    pub fn run<W: Write>(&self, text: &str, out: &mut W) -> CliResult<ImportSummary> {
        let records = read_records(text, self.options.format)?;

        if let Some(limit) = self.options.max_records {
            if records.len() > limit {
                return Err(CliError::TooManyRecords {
                    found: records.len(),
                    limit,
                });
            }
        }

        info!(
            run_id = %self.run_id,
            entity = %self.options.entity,
            partial = self.options.partial,
            records = records.len(),
            "Starting import"
        );

        let mut accepted = 0;
        for (index, record) in records.iter().enumerate() {
            let outcome = match record {
                Ok(value) => self.check(index, value),
                Err(errors) => RecordOutcome::Rejected {
                    index,
                    errors: errors.clone().into_vec(),
                },
            };

            match &outcome {
                RecordOutcome::Accepted { .. } => {
                    accepted += 1;
                    debug!(run_id = %self.run_id, index, "Record accepted");
                }
                RecordOutcome::Rejected { errors, .. } => {
                    warn!(
                        run_id = %self.run_id,
                        index,
                        errors = errors.len(),
                        first = %errors.first().map(|e| e.to_string()).unwrap_or_default(),
                        "Record rejected"
                    );
                }
            }

            serde_json::to_writer(&mut *out, &outcome)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        let summary = ImportSummary {
            run_id: self.run_id,
            entity: self.options.entity,
            total: records.len(),
            accepted,
            rejected: records.len() - accepted,
        };

        info!(
            run_id = %summary.run_id,
            total = summary.total,
            accepted = summary.accepted,
            rejected = summary.rejected,
            "Import finished"
        );

        Ok(summary)
    }

    fn check(&self, index: usize, input: &Value) -> RecordOutcome {
        let kind = self.options.entity;

        let result = if self.options.partial {
            self.registry
                .validate_partial(kind, input)
                .map(|fields| (Value::Object(fields), None))
        } else {
            self.registry
                .validate_record(kind, input)
                .map(|validated| (validated.record, validated.search_key))
        };

        match result {
            Ok((mut record, search_key)) => {
                redact(kind, &mut record);
                RecordOutcome::Accepted {
                    index,
                    record,
                    search_key: search_key.filter(|_| self.options.emit_search_keys),
                }
            }
            Err(errors) => RecordOutcome::Rejected {
                index,
                errors: errors.into_vec(),
            },
        }
    }
}

fn redact(kind: EntityKind, record: &mut Value) {
    if let Value::Object(fields) = record {
        for name in kind.sensitive_fields() {
            if let Some(value) = fields.get_mut(*name) {
                *value = Value::String(REDACTED.to_string());
            }
        }
    }
}

// =============================================================================
// Input Parsing
// =============================================================================

/// A parsed record, or the payload-level error that replaces it.
pub type RawRecord = Result<Value, ValidationErrors>;

/// Splits `text` into records according to `format`.
pub fn read_records(text: &str, format: InputFormat) -> CliResult<Vec<RawRecord>> {
    match format {
        InputFormat::Json => read_json(text),
        InputFormat::Ndjson => Ok(read_ndjson(text)),
        InputFormat::Auto => match serde_json::from_str::<Value>(text) {
            Ok(document) => Ok(flatten(document)),
            Err(_) => Ok(read_ndjson(text)),
        },
    }
}

fn read_json(text: &str) -> CliResult<Vec<RawRecord>> {
    let document: Value = serde_json::from_str(text).map_err(|source| CliError::Json {
        line: source.line(),
        source,
    })?;
    Ok(flatten(document))
}

fn flatten(document: Value) -> Vec<RawRecord> {
    match document {
        Value::Array(items) => items.into_iter().map(Ok).collect(),
        single => vec![Ok(single)],
    }
}

fn read_ndjson(text: &str) -> Vec<RawRecord> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|err| {
                ValidationErrors::single(FieldError::new(
                    &FieldPath::root(),
                    ErrorKind::WrongType {
                        expected: ValueKind::Object,
                    },
                    format!("line {} is not valid JSON: {err}", number + 1),
                ))
            })
        })
        .collect()
}
