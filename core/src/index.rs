use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use time::OffsetDateTime;

use crate::tokenizer::analyze;

pub type DocId = String;
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A scalar metadata value. Filters compare values by their display form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
}

// JSON has no NaN or infinity, so non-finite numbers are written as their display string.
impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
            MetadataValue::Int(n) => serializer.serialize_i64(*n),
            MetadataValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            MetadataValue::Number(n) => serializer.collect_str(n),
            MetadataValue::String(s) => serializer.serialize_str(s),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Int(n) => write!(f, "{n}"),
            MetadataValue::Number(n) => write!(f, "{n}"),
            MetadataValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self { MetadataValue::String(s.to_string()) }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self { MetadataValue::String(s) }
}

/// NaN and the infinities become strings ("NaN", "inf", "-inf") so the value survives export.
impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        if n.is_finite() { MetadataValue::Number(n) } else { MetadataValue::String(n.to_string()) }
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self { MetadataValue::Int(n) }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self { MetadataValue::Bool(b) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(with = "unix_nanos")]
    pub timestamp: OffsetDateTime,
    /// Query-time relevance. Only meaningful on documents returned by a search.
    #[serde(default)]
    pub score: f64,
}

impl Document {
    pub fn new(id: impl Into<DocId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            timestamp: OffsetDateTime::now_utc(),
            score: 0.0,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// True when every filter entry equals the document's metadata entry stringwise.
    pub fn matches_filters(&self, filters: &Metadata) -> bool {
        filters.iter().all(|(key, want)| {
            self.metadata
                .get(key)
                .is_some_and(|have| have.to_string() == want.to_string())
        })
    }
}

/// Timestamps as integer nanoseconds since the Unix epoch. Covers every `OffsetDateTime`
/// regardless of offset or year; the offset itself is not kept, only the instant.
mod unix_nanos {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub(super) fn serialize<S: Serializer>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i128(ts.unix_timestamp_nanos())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let nanos = i128::deserialize(deserializer)?;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(de::Error::custom)
    }
}

/// One occurrence of a term in a document. `position` counts post-stopword tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub document_id: DocId,
    pub position: usize,
    pub weight: f64,
}

/// Document store plus term -> postings map. A term never maps to an empty list,
/// and every posting refers to a stored document.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    pub(crate) documents: HashMap<DocId, Document>,
    pub(crate) terms: HashMap<String, Vec<Posting>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Store `doc` and append its postings. Any postings left over from a previous
    /// document with the same id are purged first. Returns the number of postings added.
    pub(crate) fn insert(&mut self, mut doc: Document) -> usize {
        if self.documents.contains_key(&doc.id) {
            self.purge_postings(&doc.id);
        }
        doc.score = 0.0;
        let tokens = analyze(&doc.content);
        for (pos, token) in tokens.iter().enumerate() {
            self.terms.entry(token.clone()).or_default().push(Posting {
                document_id: doc.id.clone(),
                position: pos,
                weight: 1.0,
            });
        }
        self.documents.insert(doc.id.clone(), doc);
        tokens.len()
    }

    /// Remove a document and all its postings. Returns whether it was present.
    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let existed = self.documents.remove(id).is_some();
        self.purge_postings(id);
        existed
    }

    fn purge_postings(&mut self, id: &str) {
        self.terms.retain(|_, postings| {
            postings.retain(|p| p.document_id != id);
            !postings.is_empty()
        });
    }

    /// Rebuild every posting list from a snapshot of the stored documents.
    pub(crate) fn rebuild(&mut self) -> usize {
        let mut docs: Vec<Document> = self.documents.values().cloned().collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        self.terms.clear();
        self.documents.clear();
        docs.into_iter().map(|doc| self.insert(doc)).sum()
    }

    pub fn document(&self, id: &str) -> Option<&Document> { self.documents.get(id) }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.terms.get(term).map(Vec::as_slice)
    }

    pub fn num_documents(&self) -> usize { self.documents.len() }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn num_postings(&self) -> usize { self.terms.values().map(Vec::len).sum() }

    pub fn terms(&self) -> impl Iterator<Item = &str> { self.terms.keys().map(String::as_str) }
}
