pub mod engine;
pub mod error;
pub mod highlight;
pub mod index;
pub mod persist;
pub mod tokenizer;

pub use engine::{EngineConfig, IndexStats, SearchEngine, SearchOptions, SearchResult};
pub use error::{Result, SearchError};
pub use index::{DocId, Document, InvertedIndex, Metadata, MetadataValue, Posting};
