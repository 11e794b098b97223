use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

use crate::error::{Result, SearchError};
use crate::highlight::highlight;
use crate::index::{Document, InvertedIndex, Metadata};
use crate::persist;
use crate::tokenizer::analyze;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub highlight_pre: String,
    pub highlight_post: String,
    /// Upper bound applied to `SearchOptions::limit`. `None` leaves limits uncapped.
    pub max_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { highlight_pre: "**".into(), highlight_post: "**".into(), max_limit: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub limit: usize,
    pub offset: usize,
    pub highlight: bool,
}

impl Default for SearchOptions {
    fn default() -> Self { Self { limit: 10, offset: 0, highlight: false } }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query: String,
    /// Matches before pagination.
    pub total: usize,
    pub results: Vec<Document>,
    pub took: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub total_terms: usize,
    pub total_postings: usize,
}

/// In-memory full-text search engine.
///
/// One readers-writer lock guards the document store and the inverted index together.
/// Mutations take the write lock for their whole duration; queries share the read lock
/// and hand back owned copies.
#[derive(Debug, Default)]
pub struct SearchEngine {
    index: RwLock<InvertedIndex>,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { index: RwLock::new(InvertedIndex::new()), config }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn index_document(&self, doc: Document) {
        tracing::debug!(doc_id = %doc.id, content_length = doc.content.len(), "indexing document");
        let doc_id = doc.id.clone();
        let terms_indexed = self.index.write().insert(doc);
        tracing::debug!(%doc_id, terms_indexed, "document indexed");
    }

    /// Index structured metadata as a document whose content is `key:value` pairs in key order.
    pub fn index_metadata(&self, id: impl Into<String>, metadata: Metadata) {
        let id = id.into();
        tracing::debug!(%id, fields = metadata.len(), "indexing metadata");
        let content = metadata_to_text(&metadata);
        let doc = Document { id, content, metadata, timestamp: OffsetDateTime::now_utc(), score: 0.0 };
        self.index_document(doc);
    }

    /// Replace a document. Readers see either the old or the new version, never neither.
    pub fn update_document(&self, doc: Document) {
        tracing::debug!(doc_id = %doc.id, "updating document");
        let mut index = self.index.write();
        index.remove(&doc.id);
        index.insert(doc);
    }

    /// Remove a document and its postings. Unknown ids are ignored.
    pub fn delete_document(&self, id: &str) {
        tracing::debug!(doc_id = %id, "deleting document");
        let existed = self.index.write().remove(id);
        if !existed {
            tracing::debug!(doc_id = %id, "delete of unknown document ignored");
        }
    }

    pub fn get_document(&self, id: &str) -> Result<Document> {
        self.index
            .read()
            .document(id)
            .cloned()
            .ok_or_else(|| SearchError::NotFound(id.to_string()))
    }

    pub fn search(&self, query: &str, opts: &SearchOptions) -> SearchResult {
        tracing::debug!(query, limit = opts.limit, offset = opts.offset, "searching");
        self.run_query(query, None, opts)
    }

    /// Search, keeping only documents whose metadata equals every filter entry.
    ///
    /// Filtering happens before pagination, so pages are full whenever enough
    /// filtered matches exist and `total` counts filtered matches.
    pub fn advanced_search(&self, query: &str, filters: &Metadata, opts: &SearchOptions) -> SearchResult {
        tracing::debug!(query, filters = filters.len(), "performing advanced search");
        self.run_query(query, Some(filters), opts)
    }

    fn run_query(&self, query: &str, filters: Option<&Metadata>, opts: &SearchOptions) -> SearchResult {
        let start = Instant::now();
        let terms = analyze(query);
        if terms.is_empty() {
            return SearchResult { query: query.to_string(), total: 0, results: vec![], took: start.elapsed() };
        }

        let index = self.index.read();
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for term in &terms {
            if let Some(postings) = index.postings(term) {
                for p in postings {
                    *scores.entry(p.document_id.as_str()).or_insert(0.0) += p.weight;
                }
            }
        }

        let mut ranked: Vec<(&Document, f64)> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .filter_map(|(id, score)| index.document(id).map(|doc| (doc, score)))
            .filter(|(doc, _)| filters.map_or(true, |f| doc.matches_filters(f)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));

        let total = ranked.len();
        let limit = self.config.max_limit.map_or(opts.limit, |cap| opts.limit.min(cap));
        let begin = opts.offset.min(total);
        let end = begin.saturating_add(limit).min(total);

        let results: Vec<Document> = ranked[begin..end]
            .iter()
            .map(|(doc, score)| {
                let mut hit = (*doc).clone();
                hit.score = *score;
                if opts.highlight {
                    hit.content = highlight(&hit.content, &terms, &self.config.highlight_pre, &self.config.highlight_post);
                }
                hit
            })
            .collect();

        tracing::debug!(query, total, returned = results.len(), "search completed");
        SearchResult { query: query.to_string(), total, results, took: start.elapsed() }
    }

    /// Indexed terms starting with the lowercased `prefix`, sorted. A `limit` of 0 means no limit.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        tracing::debug!(prefix, limit, "generating suggestions");
        let prefix = prefix.to_lowercase();
        let mut suggestions: Vec<String> = self
            .index
            .read()
            .terms()
            .filter(|term| term.starts_with(&prefix))
            .map(str::to_string)
            .collect();
        suggestions.sort();
        if limit > 0 {
            suggestions.truncate(limit);
        }
        suggestions
    }

    pub fn stats(&self) -> IndexStats {
        let index = self.index.read();
        IndexStats {
            total_documents: index.num_documents(),
            total_terms: index.num_terms(),
            total_postings: index.num_postings(),
        }
    }

    /// Rebuild all postings from the stored documents.
    pub fn reindex(&self) {
        let mut index = self.index.write();
        let postings = index.rebuild();
        tracing::info!(documents = index.num_documents(), terms = index.num_terms(), postings, "index rebuilt");
    }

    pub fn export_index(&self) -> Result<Vec<u8>> {
        persist::encode(&self.index.read())
    }

    /// Replace the whole index with a snapshot. On error the current state is kept.
    pub fn import_index(&self, data: &[u8]) -> Result<()> {
        let imported = persist::decode(data).map_err(|e| {
            tracing::warn!(error = %e, "rejected index import");
            e
        })?;
        let (documents, terms) = (imported.num_documents(), imported.num_terms());
        *self.index.write() = imported;
        tracing::info!(documents, terms, "index imported");
        Ok(())
    }
}

fn metadata_to_text(metadata: &Metadata) -> String {
    metadata
        .iter()
        .map(|(key, value)| format!("{key}:{value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_text_is_key_ordered() {
        let mut m = Metadata::new();
        m.insert("title".into(), "Dune".into());
        m.insert("author".into(), "Herbert".into());
        m.insert("year".into(), 1965i64.into());
        assert_eq!(metadata_to_text(&m), "author:Herbert title:Dune year:1965");
    }

    #[test]
    fn max_limit_caps_page_size() {
        let engine = SearchEngine::with_config(EngineConfig { max_limit: Some(1), ..Default::default() });
        engine.index_document(Document::new("a", "rust"));
        engine.index_document(Document::new("b", "rust"));
        let res = engine.search("rust", &SearchOptions { limit: 10, ..Default::default() });
        assert_eq!(res.total, 2);
        assert_eq!(res.results.len(), 1);
    }

    #[test]
    fn highlight_uses_configured_markers() {
        let engine = SearchEngine::with_config(EngineConfig {
            highlight_pre: "<em>".into(),
            highlight_post: "</em>".into(),
            ..Default::default()
        });
        engine.index_document(Document::new("a", "Rust is fast"));
        let res = engine.search("rust", &SearchOptions { highlight: true, ..Default::default() });
        assert_eq!(res.results[0].content, "<em>Rust</em> is fast");
        assert_eq!(engine.get_document("a").unwrap().content, "Rust is fast");
    }
}
