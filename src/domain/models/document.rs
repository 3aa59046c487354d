//! Documents and vector query results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key carrying the originating document id on a query hit.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// Metadata key carrying the passage text on a query hit.
pub const TEXT_KEY: &str = "text";

/// A unit of indexed source text. Immutable once indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Flat metadata as exposed on query hits: the document metadata plus
    /// the reserved `document_id` and `text` keys.
    pub fn hit_metadata(&self) -> BTreeMap<String, String> {
        let mut flat = self.metadata.clone();
        flat.insert(DOCUMENT_ID_KEY.to_string(), self.id.clone());
        flat.insert(TEXT_KEY.to_string(), self.text.clone());
        flat
    }
}

/// One ranked hit of a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    /// Position in the result, starting at 0.
    pub rank: usize,
    /// Ordinal position of the entry inside the index.
    pub index: usize,
    /// Squared L2 distance to the query embedding. Finite and non-negative.
    pub distance: f32,
    pub metadata: BTreeMap<String, String>,
}

impl QueryHit {
    /// Passage text stored with the hit.
    pub fn text(&self) -> &str {
        self.metadata.get(TEXT_KEY).map_or("", String::as_str)
    }

    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get(DOCUMENT_ID_KEY).map(String::as_str)
    }
}

/// Ordered result of a similarity query. Distances are non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult {
    pub hits: Vec<QueryHit>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryHit> {
        self.hits.iter()
    }

    /// Check the ordering invariant.
    pub fn is_sorted_by_distance(&self) -> bool {
        self.hits.windows(2).all(|w| w[0].distance <= w[1].distance)
    }
}

impl IntoIterator for QueryResult {
    type Item = QueryHit;
    type IntoIter = std::vec::IntoIter<QueryHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_metadata_includes_reserved_keys() {
        let doc = Document::new("doc-1", "SQL injection is an attack.")
            .with_metadata("source", "security.txt");

        let flat = doc.hit_metadata();
        assert_eq!(flat.get("source").map(String::as_str), Some("security.txt"));
        assert_eq!(flat.get(DOCUMENT_ID_KEY).map(String::as_str), Some("doc-1"));
        assert_eq!(flat.get(TEXT_KEY).map(String::as_str), Some("SQL injection is an attack."));
    }

    #[test]
    fn test_query_result_serializes_as_array() {
        let result = QueryResult {
            hits: vec![QueryHit {
                rank: 0,
                index: 4,
                distance: 0.25,
                metadata: BTreeMap::from([("text".to_string(), "hello".to_string())]),
            }],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["index"], 4);
        assert_eq!(json[0]["metadata"]["text"], "hello");
        assert!(result.is_sorted_by_distance());
    }
}
