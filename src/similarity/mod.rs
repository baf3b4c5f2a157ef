//! Semantic similarity between ontology entities.
//!
//! [`SimilarityEngine`] combines taxonomic similarity, derived from depths in
//! the class or property hierarchy, with the similarity of each entity's
//! outgoing links. Link sets are compared either with an optimal one-to-one
//! assignment ([`hungarian`]) or with a greedy best-partner aggregate.

pub mod cache;
mod engine;
pub mod hungarian;
pub mod matching;
mod neighbors;
pub mod record;
pub mod table;
mod taxonomy;

pub use cache::SimilarityCache;
pub use engine::SimilarityEngine;
pub use matching::{match_sets, MatchingMode};
pub use record::{read_records, write_records, ComparisonRecord, RecordError, UnorderedPair};
pub use table::SimilarityTable;
