//! Weighted linear reranking
//!
//! `score = alpha * sim + beta * f(dwell) + gamma * g(click)` where
//! `f(dwell) = clamp(dwell / T0, 0, 1)` and `g(click)` is the click flag
//! (or click rate, see [`ClickFeature`]).

use std::collections::HashSet;
use tracing::debug;

use super::{Reranker, ScoredCandidate};
use crate::activity::{validate_candidates, Candidate};
use crate::config::{ClickFeature, DuplicatePolicy, RerankConfig};
use crate::error::{RerankError, Result};
use crate::signals::SignalIndex;

/// Map a dwell time onto [0, 1], saturating at `t0` seconds
pub fn normalize_dwell(dwell_sec: f64, t0: f64) -> f64 {
    (dwell_sec / t0).clamp(0.0, 1.0)
}

/// Linear combinator over similarity, dwell and click
///
/// Weights are taken as given: no sum-to-one or sign requirement.
#[derive(Debug, Clone)]
pub struct WeightedReranker {
    config: RerankConfig,
}

impl WeightedReranker {
    /// Create a reranker, validating the configuration once
    pub fn new(config: RerankConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RerankConfig {
        &self.config
    }

    fn score_one(&self, candidate: Candidate, signals: &SignalIndex) -> ScoredCandidate {
        let (dwell_sec, click) = match signals.get(&candidate.activity_id) {
            Some(summary) => {
                let click = match self.config.click_feature {
                    ClickFeature::Ever => summary.click,
                    ClickFeature::Rate => summary.click_rate,
                };
                (summary.dwell_sec, click)
            }
            None => (0.0, 0.0),
        };

        let f_dwell = normalize_dwell(dwell_sec, self.config.t0);
        let g_click = click;
        // Adding 0.0 folds -0.0 into 0.0 so total_cmp ties them
        let score = self.config.alpha * candidate.sim + self.config.beta * f_dwell + self.config.gamma * g_click + 0.0;

        ScoredCandidate {
            activity_id: candidate.activity_id,
            title: candidate.title,
            sim: candidate.sim,
            dwell_sec,
            click,
            f_dwell,
            g_click,
            score,
        }
    }

    fn check_duplicates(&self, candidates: &[Candidate]) -> Result<()> {
        if self.config.duplicates == DuplicatePolicy::Keep {
            return Ok(());
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        for candidate in candidates {
            if !seen.insert(&candidate.activity_id) {
                return Err(RerankError::DuplicateCandidate(candidate.activity_id.to_string()));
            }
        }
        Ok(())
    }
}

impl Reranker for WeightedReranker {
    fn rerank(&self, candidates: Vec<Candidate>, signals: &SignalIndex) -> Result<Vec<ScoredCandidate>> {
        validate_candidates(&candidates)?;
        self.check_duplicates(&candidates)?;

        let input_count = candidates.len();
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|c| self.score_one(c, signals))
            .collect();

        // Stable: equal scores keep their input order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.config.top_k);

        debug!(
            input_count = input_count,
            with_behavior = signals.len(),
            output_count = scored.len(),
            "Weighted rerank completed"
        );

        Ok(scored)
    }
}
