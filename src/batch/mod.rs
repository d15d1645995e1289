//! Parallel scoring of independent rerank requests
//!
//! Each request is aggregated then scored on its own; nothing is shared
//! between requests except the read-only base configuration.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::activity::{validate_candidates, validate_events, Candidate, Event};
use crate::config::RerankConfig;
use crate::error::Result;
use crate::rerank::{Reranker, ScoredCandidate, WeightedReranker};
use crate::signals::aggregate;

/// One (candidate set, event log) pair to rank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankRequest {
    /// Caller-supplied label, echoed back in the response
    #[serde(default)]
    pub query: Option<String>,
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub events: Vec<Event>,
    /// Per-request override of the base configuration
    #[serde(default)]
    pub config: Option<RerankConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RerankResponse {
    pub query: Option<String>,
    pub results: Vec<ScoredCandidate>,
}

/// Validate, aggregate and score a single request
pub fn rerank_request(request: RerankRequest, base: &RerankConfig) -> Result<RerankResponse> {
    validate_candidates(&request.candidates)?;
    validate_events(&request.events)?;

    let config = request.config.unwrap_or_else(|| base.clone());
    let reranker = WeightedReranker::new(config)?;

    // Aggregation finishes before any scoring starts
    let signals = aggregate(&request.events);
    let results = reranker.rerank(request.candidates, &signals)?;

    Ok(RerankResponse {
        query: request.query,
        results,
    })
}

/// Score many requests in parallel; output order matches input order
pub fn rerank_batch(requests: Vec<RerankRequest>, base: &RerankConfig) -> Vec<Result<RerankResponse>> {
    let start = Instant::now();
    let count = requests.len();

    let responses: Vec<Result<RerankResponse>> = requests
        .into_par_iter()
        .map(|request| rerank_request(request, base))
        .collect();

    let failed = responses.iter().filter(|r| r.is_err()).count();
    info!(
        requests = count,
        failed = failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch rerank completed"
    );

    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RerankError;

    fn request(query: &str, sims: &[f64]) -> RerankRequest {
        RerankRequest {
            query: Some(query.to_string()),
            candidates: sims
                .iter()
                .enumerate()
                .map(|(i, &sim)| Candidate::new(i as u64, format!("{} {}", query, i), sim))
                .collect(),
            events: Vec::new(),
            config: None,
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let requests: Vec<RerankRequest> = (0..64)
            .map(|i| request(&format!("q{}", i), &[0.1, 0.9, 0.5]))
            .collect();

        let responses = rerank_batch(requests, &RerankConfig::default());
        assert_eq!(responses.len(), 64);
        for (i, response) in responses.into_iter().enumerate() {
            let response = response.unwrap();
            assert_eq!(response.query.as_deref(), Some(format!("q{}", i).as_str()));
            assert_eq!(response.results[0].activity_id.as_str(), "1");
        }
    }

    #[test]
    fn test_batch_isolates_failures() {
        let mut bad = request("bad", &[0.4]);
        bad.events.push(Event::new(0u64, -1.0, false));

        let mut custom = request("custom", &[0.4, 0.2]);
        custom.config = Some(RerankConfig::default().top_k(1));

        let responses = rerank_batch(vec![request("ok", &[0.3]), bad, custom], &RerankConfig::default());

        assert!(responses[0].is_ok());
        assert!(matches!(responses[1], Err(RerankError::InvalidValue { .. })));
        assert_eq!(responses[2].as_ref().unwrap().results.len(), 1);
    }

    #[test]
    fn test_request_json() {
        let json = r#"{
            "candidates": [{"id": 1, "title": "Temple walk", "sim": 0.9}, {"id": 2, "title": "Ramen class", "sim": 0.5}],
            "events": [{"activity_id": 1, "dwell_sec": 5, "clicked": 0}, {"activity_id": 1, "dwell_sec": 15, "clicked": 1}]
        }"#;
        let request: RerankRequest = serde_json::from_str(json).unwrap();
        let response = rerank_request(request, &RerankConfig::default()).unwrap();

        assert_eq!(response.results[0].activity_id.as_str(), "1");
        assert!((response.results[0].score - 0.94).abs() < 1e-12);
    }
}
