//! Behavioral signal aggregation
//!
//! Reduces a raw event log, possibly many rows per activity, to one
//! [`BehaviorSummary`] per activity in a single pass.

use serde::Serialize;
use std::collections::HashMap;

use crate::activity::{ActivityId, Event};

/// Aggregated behavior for one activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorSummary {
    pub activity_id: ActivityId,
    /// Mean dwell over all events
    pub dwell_sec: f64,
    /// 1.0 if any event was a click, else 0.0
    pub click: f64,
    /// Number of events seen
    pub events: usize,
    /// Fraction of events that were clicks
    pub click_rate: f64,
}

#[derive(Debug, Default)]
struct Accumulator {
    dwell_total: f64,
    count: usize,
    clicks: usize,
}

impl Accumulator {
    fn push(&mut self, event: &Event) {
        self.dwell_total += event.dwell_sec;
        self.count += 1;
        if event.clicked {
            self.clicks += 1;
        }
    }

    fn finish(&self, activity_id: ActivityId) -> BehaviorSummary {
        let count = self.count as f64;
        BehaviorSummary {
            activity_id,
            dwell_sec: self.dwell_total / count,
            click: if self.clicks > 0 { 1.0 } else { 0.0 },
            events: self.count,
            click_rate: self.clicks as f64 / count,
        }
    }
}

/// Per-activity summaries keyed by id
///
/// Only ids present in the log have an entry.
#[derive(Debug, Clone, Default)]
pub struct SignalIndex {
    by_id: HashMap<ActivityId, usize>,
    summaries: Vec<BehaviorSummary>,
}

impl SignalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ActivityId) -> Option<&BehaviorSummary> {
        self.by_id.get(id).map(|&idx| &self.summaries[idx])
    }

    /// Summaries in the order their ids first appeared in the log
    pub fn summaries(&self) -> &[BehaviorSummary] {
        &self.summaries
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Group events by activity id: mean dwell, max click
pub fn aggregate(events: &[Event]) -> SignalIndex {
    let mut order: Vec<ActivityId> = Vec::new();
    let mut accumulators: HashMap<ActivityId, Accumulator> = HashMap::new();

    for event in events {
        accumulators
            .entry(event.activity_id.clone())
            .or_insert_with(|| {
                order.push(event.activity_id.clone());
                Accumulator::default()
            })
            .push(event);
    }

    let mut index = SignalIndex {
        by_id: HashMap::with_capacity(order.len()),
        summaries: Vec::with_capacity(order.len()),
    };
    for id in order {
        let summary = accumulators[&id].finish(id.clone());
        index.by_id.insert(id, index.summaries.len());
        index.summaries.push(summary);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log() {
        let index = aggregate(&[]);
        assert!(index.is_empty());
        assert!(index.get(&ActivityId::new("1")).is_none());
    }

    #[test]
    fn test_mean_dwell_and_max_click() {
        let events = vec![
            Event::new("1", 5.0, false),
            Event::new("1", 15.0, true),
            Event::new("2", 4.0, false),
        ];
        let index = aggregate(&events);

        assert_eq!(index.len(), 2);
        let one = index.get(&ActivityId::new("1")).unwrap();
        assert_eq!(one.dwell_sec, 10.0);
        assert_eq!(one.click, 1.0);
        assert_eq!(one.events, 2);
        assert_eq!(one.click_rate, 0.5);

        let two = index.get(&ActivityId::new("2")).unwrap();
        assert_eq!(two.dwell_sec, 4.0);
        assert_eq!(two.click, 0.0);
    }

    #[test]
    fn test_single_click_flips_summary() {
        let mut events: Vec<Event> = (0..50).map(|_| Event::new("a", 1.0, false)).collect();
        events.insert(17, Event::new("a", 1.0, true));

        let index = aggregate(&events);
        let summary = index.get(&ActivityId::new("a")).unwrap();
        assert_eq!(summary.click, 1.0);
        assert_eq!(summary.events, 51);
    }

    #[test]
    fn test_one_summary_per_id_in_first_seen_order() {
        let events = vec![
            Event::new("b", 1.0, false),
            Event::new("a", 2.0, false),
            Event::new("b", 3.0, true),
            Event::new("c", 0.0, false),
            Event::new("a", 4.0, false),
        ];
        let index = aggregate(&events);

        let ids: Vec<&str> = index.summaries().iter().map(|s| s.activity_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(index.get(&ActivityId::new("a")).unwrap().dwell_sec, 3.0);
    }
}
