//! Core records shared by ingestion, aggregation and scoring
//!
//! A [`Candidate`] comes from the similarity collaborator, an [`Event`]
//! from the telemetry log. Both are validated once at the boundary.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{RerankError, Result};

/// Opaque activity identifier
///
/// Integer ids are kept as their decimal text so CSV and JSON inputs
/// join on the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.len() == id.len() {
            Self(id)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for ActivityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ActivityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => ActivityId::new(s),
            RawId::Unsigned(n) => ActivityId(n.to_string()),
            RawId::Signed(n) => ActivityId(n.to_string()),
        })
    }
}

/// An item eligible for ranking, with its precomputed similarity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "id")]
    pub activity_id: ActivityId,
    pub title: String,
    /// Cosine-like similarity, expected in [0, 1] but passed through as-is
    pub sim: f64,
}

impl Candidate {
    pub fn new(activity_id: impl Into<ActivityId>, title: impl Into<String>, sim: f64) -> Self {
        Self {
            activity_id: activity_id.into(),
            title: title.into(),
            sim,
        }
    }

    /// Reject an empty id or non-finite similarity. `row` is 1-based for error messages.
    pub fn validate(&self, row: usize) -> Result<()> {
        require_id(&self.activity_id, "candidate", row)?;
        if !self.sim.is_finite() {
            return Err(RerankError::InvalidValue {
                table: "candidate",
                row,
                column: "sim",
                value: self.sim.to_string(),
            });
        }
        Ok(())
    }
}

/// One observed interaction between a user and an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub activity_id: ActivityId,
    pub dwell_sec: f64,
    #[serde(deserialize_with = "deserialize_clicked")]
    pub clicked: bool,
}

impl Event {
    pub fn new(activity_id: impl Into<ActivityId>, dwell_sec: f64, clicked: bool) -> Self {
        Self {
            activity_id: activity_id.into(),
            dwell_sec,
            clicked,
        }
    }

    /// Reject an empty id or negative/non-finite dwell. `row` is 1-based for error messages.
    pub fn validate(&self, row: usize) -> Result<()> {
        require_id(&self.activity_id, "event", row)?;
        if !self.dwell_sec.is_finite() || self.dwell_sec < 0.0 {
            return Err(RerankError::InvalidValue {
                table: "event",
                row,
                column: "dwell_sec",
                value: self.dwell_sec.to_string(),
            });
        }
        Ok(())
    }
}

fn require_id(id: &ActivityId, table: &'static str, row: usize) -> Result<()> {
    if id.as_str().is_empty() {
        return Err(RerankError::InvalidValue {
            table,
            row,
            column: "activity_id",
            value: String::new(),
        });
    }
    Ok(())
}

/// Accepts `true`/`false` or the integers `0`/`1`
fn deserialize_clicked<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawClick {
        Flag(bool),
        Int(i64),
    }

    match RawClick::deserialize(deserializer)? {
        RawClick::Flag(b) => Ok(b),
        RawClick::Int(0) => Ok(false),
        RawClick::Int(1) => Ok(true),
        RawClick::Int(other) => Err(serde::de::Error::custom(format!(
            "clicked must be 0 or 1, got {}",
            other
        ))),
    }
}

/// Validate a whole candidate set
pub fn validate_candidates(candidates: &[Candidate]) -> Result<()> {
    for (idx, candidate) in candidates.iter().enumerate() {
        candidate.validate(idx + 1)?;
    }
    Ok(())
}

/// Validate a whole event log
pub fn validate_events(events: &[Event]) -> Result<()> {
    for (idx, event) in events.iter().enumerate() {
        event.validate(idx + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_id_trims() {
        assert_eq!(ActivityId::new("  42 "), ActivityId::new("42"));
        assert_eq!(ActivityId::from(42u64).as_str(), "42");
    }

    #[test]
    fn test_candidate_json_accepts_id_alias_and_numbers() {
        let c: Candidate = serde_json::from_str(r#"{"id": 7, "title": "Kayak tour", "sim": 0.4}"#).unwrap();
        assert_eq!(c.activity_id.as_str(), "7");
        assert_eq!(c.title, "Kayak tour");
    }

    #[test]
    fn test_event_clicked_forms() {
        let e: Event = serde_json::from_str(r#"{"activity_id": "a", "dwell_sec": 3.0, "clicked": 1}"#).unwrap();
        assert!(e.clicked);
        let e: Event = serde_json::from_str(r#"{"activity_id": "a", "dwell_sec": 3.0, "clicked": false}"#).unwrap();
        assert!(!e.clicked);

        let bad = serde_json::from_str::<Event>(r#"{"activity_id": "a", "dwell_sec": 3.0, "clicked": 2}"#);
        assert!(bad.is_err());
        let bad = serde_json::from_str::<Event>(r#"{"activity_id": "a", "dwell_sec": 3.0, "clicked": "yes"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_validation() {
        assert!(Candidate::new("a", "t", f64::NAN).validate(1).is_err());
        assert!(Candidate::new("a", "t", 1.7).validate(1).is_ok());
        assert!(Event::new("a", -1.0, false).validate(3).is_err());
        assert!(Event::new("a", 0.0, true).validate(3).is_ok());
        assert!(Candidate::new(" ", "t", 0.5).validate(1).is_err());
        assert!(Event::new("", 1.0, false).validate(1).is_err());

        let err = validate_events(&[Event::new("a", 1.0, false), Event::new("b", f64::INFINITY, false)])
            .unwrap_err();
        match err {
            RerankError::InvalidValue { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "dwell_sec");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
