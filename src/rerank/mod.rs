use serde::Serialize;

use crate::activity::{ActivityId, Candidate};
use crate::error::Result;
use crate::signals::SignalIndex;

mod weighted;

pub use weighted::{normalize_dwell, WeightedReranker};

/// Reranking strategies
pub trait Reranker: Send + Sync {
    /// Score candidates against aggregated behavior and return them ranked
    fn rerank(&self, candidates: Vec<Candidate>, signals: &SignalIndex) -> Result<Vec<ScoredCandidate>>;
}

/// A candidate joined with its behavior and features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub activity_id: ActivityId,
    pub title: String,
    pub sim: f64,
    /// Mean dwell after imputation
    pub dwell_sec: f64,
    /// Click statistic after imputation
    pub click: f64,
    pub f_dwell: f64,
    pub g_click: f64,
    pub score: f64,
}
