//! # Text Normalizer
//!
//! Canonical search keys for free-text fields.
//!
//! ## Pipeline (order is fixed)
//! ```text
//! "Café Núñez!!  2024"
//!      │  1. lowercase (locale-independent)
//!      ▼
//! "café núñez!!  2024"
//!      │  2. canonical decomposition, drop diacritical marks
//!      ▼
//! "cafe nunez!!  2024"
//!      │  3. non-word, non-space characters → " "
//!      ▼
//! "cafe nunez    2024"
//!      │  4. collapse whitespace runs   5. trim
//!      ▼
//! "cafe nunez 2024"
//! ```
//!
//! Word characters are Unicode letters, digits, marks and `_`, so non-Latin
//! scripts survive step 3. Step 2 drops only marks with a non-zero canonical
//! combining class (accents, cedillas, Arabic harakat); spacing vowel signs
//! such as Devanagari `ि` have class 0 and stay. Canonically equivalent inputs (precomposed vs
//! decomposed accents) produce identical keys, and normalizing a key again
//! returns it unchanged.

use std::fmt;
use std::ops::Deref;

use serde::Serialize;
use unicode_normalization::char::{canonical_combining_class, is_combining_mark};
use unicode_normalization::UnicodeNormalization;

/// Output of [`normalize`]: lowercase, mark-free, word characters and single
/// spaces only, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for NormalizedText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for NormalizedText {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NormalizedText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn is_diacritic(c: char) -> bool {
    is_combining_mark(c) && canonical_combining_class(c) != 0
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || is_combining_mark(c)
}

/// Produces the canonical search key for `text`.
pub fn normalize(text: &str) -> NormalizedText {
    let lowered = text.to_lowercase();

    let stripped: String = lowered.nfd().filter(|c| !is_diacritic(*c)).collect();

    let spaced: String = stripped
        .chars()
        .map(|c| if is_word(c) || c.is_whitespace() { c } else { ' ' })
        .collect();

    // split_whitespace covers both collapsing and trimming
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    NormalizedText(collapsed)
}

/// A record that contributes a canonical search key.
pub trait Searchable {
    /// Free text the key is derived from.
    fn search_text(&self) -> String;

    fn search_key(&self) -> NormalizedText {
        normalize(&self.search_text())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
