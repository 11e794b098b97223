//! Snapshot codec for the document store and inverted index.
//!
//! The snapshot is a JSON object with exactly two top-level fields:
//! `documents` (id -> document) and `terms` (term -> postings in insertion order).
//! Keys are written in sorted order so the same state always exports the same bytes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SearchError};
use crate::index::{DocId, Document, InvertedIndex, Posting};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    documents: BTreeMap<&'a str, &'a Document>,
    terms: BTreeMap<&'a str, &'a [Posting]>,
}

#[derive(Deserialize)]
struct Snapshot {
    documents: HashMap<DocId, Document>,
    terms: HashMap<String, Vec<Posting>>,
}

pub fn encode(index: &InvertedIndex) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        documents: index.documents.iter().map(|(id, doc)| (id.as_str(), doc)).collect(),
        terms: index.terms.iter().map(|(term, p)| (term.as_str(), p.as_slice())).collect(),
    };
    serde_json::to_vec_pretty(&snapshot).map_err(SearchError::Export)
}

/// Decode and validate a snapshot. Nothing is returned unless the whole payload is sound.
pub fn decode(data: &[u8]) -> Result<InvertedIndex> {
    let snapshot: Snapshot =
        serde_json::from_slice(data).map_err(|e| SearchError::Parse(e.to_string()))?;
    validate(&snapshot)?;
    let mut documents = snapshot.documents;
    for doc in documents.values_mut() {
        doc.score = 0.0;
    }
    Ok(InvertedIndex { documents, terms: snapshot.terms })
}

fn validate(snapshot: &Snapshot) -> Result<()> {
    for (key, doc) in &snapshot.documents {
        if key != &doc.id {
            return Err(SearchError::Parse(format!(
                "document stored under {key:?} has id {:?}",
                doc.id
            )));
        }
    }
    for (term, postings) in &snapshot.terms {
        if postings.is_empty() {
            return Err(SearchError::Parse(format!("term {term:?} has no postings")));
        }
        if let Some(p) = postings.iter().find(|p| !snapshot.documents.contains_key(&p.document_id)) {
            return Err(SearchError::Parse(format!(
                "term {term:?} references missing document {:?}",
                p.document_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_has_two_sorted_sections() {
        let mut idx = InvertedIndex::new();
        idx.insert(Document::new("b", "zeta"));
        idx.insert(Document::new("a", "alpha"));
        let bytes = encode(&idx).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        let ids: Vec<&String> = obj["documents"].as_object().unwrap().keys().collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(json["terms"]["alpha"][0]["document_id"], "a");
    }

    #[test]
    fn decode_rejects_dangling_postings() {
        let payload = br#"{"documents": {}, "terms": {"x": [{"document_id": "gone", "position": 0, "weight": 1.0}]}}"#;
        assert!(matches!(decode(payload), Err(SearchError::Parse(_))));
    }

    #[test]
    fn decode_rejects_empty_posting_lists() {
        let payload = br#"{"documents": {}, "terms": {"x": []}}"#;
        assert!(matches!(decode(payload), Err(SearchError::Parse(_))));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode(b"not json"), Err(SearchError::Parse(_))));
        assert!(matches!(decode(br#"{"documents": {}}"#), Err(SearchError::Parse(_))));
    }
}
