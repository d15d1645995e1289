pub mod activity;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod rerank;
pub mod server;
pub mod signals;
pub mod table;

// Re-export commonly used types
pub use activity::{ActivityId, Candidate, Event};
pub use config::{ClickFeature, Config, DuplicatePolicy, RerankConfig};
pub use error::{RerankError, Result};
pub use rerank::{Reranker, ScoredCandidate, WeightedReranker};
pub use signals::{aggregate, BehaviorSummary, SignalIndex};
