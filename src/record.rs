//! Core record types.
//!
//! A [`Record`] is what callers get back from lookups: the value key, the
//! stored vector (empty when the collection discards raw vectors), and the
//! optional metadata map. Vectors live in the collection's columnar slab;
//! records are copied out so no reference escapes the collection lock.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// String-to-string metadata attached to a record, used verbatim by
/// search filters.
pub type Metadata = HashMap<String, String>;

/// A stored embedding as seen by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique text key within the owning collection.
    pub value: String,
    /// The stored vector. Empty when the collection was created with
    /// `keep_raw = false` and the binary metric (signature-only storage).
    pub vector: Vec<f32>,
    /// Optional metadata map.
    pub metadata: Option<Metadata>,
}
