//! # Field Paths
//!
//! Dot/bracket paths that locate a failing value inside a payload.
//!
//! ```text
//! payload                      path
//! ─────────────────────────    ─────────────────────────
//! { "quantity": -1 }           quantity
//! { "purchases": [ {}, {      purchases[1].quantity
//!     "quantity": -3 } ] }
//! "not an object"              (root: empty path)
//! ```

use std::fmt;

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a value within a (possibly nested) payload.
///
/// The root path renders as the empty string, which is the reserved path for
/// payload-level errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// The root of the payload.
    pub fn root() -> Self {
        FieldPath::default()
    }

    /// Returns a new path with a named field appended.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        FieldPath { segments }
    }

    /// Returns a new path with a collection index appended.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        FieldPath { segments }
    }

    /// True for the payload root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The closest named field, used as the subject of error messages.
    ///
    /// `purchases[1].quantity` → `quantity`, `purchases[1]` → `purchases`.
    pub fn label(&self) -> &str {
        self.segments
            .iter()
            .rev()
            .find_map(|segment| match segment {
                Segment::Field(name) => Some(name.as_str()),
                Segment::Index(_) => None,
            })
            .unwrap_or("payload")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if position == 0 => write!(f, "{name}")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
