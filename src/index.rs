//! Property key classification.
//!
//! Hosts address list slots through string keys. Only the exact decimal
//! rendering of a slot position counts as an index: `"01"`, `"+1"`, `"1.0"`
//! and `"-0"` are ordinary property names that some other layer may own.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CANONICAL_INDEX: Regex = Regex::new(r"^(0|[1-9][0-9]*)$").unwrap();
}

/// Name of the synthetic length pseudo-property.
pub const LENGTH_KEY: &str = "length";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Length,
    Index(usize),
    NotAnIndex,
}

impl PropertyKey {
    pub fn classify(key: &str) -> Self {
        if key == LENGTH_KEY {
            return Self::Length;
        }
        if !CANONICAL_INDEX.is_match(key) {
            return Self::NotAnIndex;
        }
        // Overflow cannot reference a real slot
        key.parse::<usize>()
            .map(Self::Index)
            .unwrap_or(Self::NotAnIndex)
    }

    /// Canonical key for a slot position.
    pub fn index_key(index: usize) -> String {
        index.to_string()
    }
}
