#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::{StoppingRule, Verdict};
use crate::state::TraversalState;

pub const NOVEL_MAX_JUNCTION_DEPTH: usize = 3;
pub const NOVEL_MAX_SIZE_BEFORE_NOVEL: usize = 200;
pub const NOVEL_AGGREGATION_WINDOW: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct NovelAggregationParams {
    pub max_junction_depth: usize,
    /// Steps allowed before the first novel k-mer turns up.
    pub max_size_before_novel: usize,
    /// Steps allowed after the last novel k-mer without a reunion.
    pub aggregation_window: usize,
}

impl Default for NovelAggregationParams {
    fn default() -> Self {
        NovelAggregationParams {
            max_junction_depth: NOVEL_MAX_JUNCTION_DEPTH,
            max_size_before_novel: NOVEL_MAX_SIZE_BEFORE_NOVEL,
            aggregation_window: NOVEL_AGGREGATION_WINDOW,
        }
    }
}

/// Gathers a novel region: succeeds once novel k-mers have been seen
/// and the joining colors come back.
#[derive(Debug, Clone)]
pub struct NovelAggregationStopper {
    params: NovelAggregationParams,
    steps: usize,
    novel_seen: bool,
    since_novel: usize,
}

impl NovelAggregationStopper {
    pub fn new(params: NovelAggregationParams) -> Self {
        NovelAggregationStopper {
            params,
            steps: 0,
            novel_seen: false,
            since_novel: 0,
        }
    }

    pub fn novel_seen(&self) -> bool {
        self.novel_seen
    }
}

impl StoppingRule for NovelAggregationStopper {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict {
        let p = &self.params;
        self.steps += 1;

        let novel = state.is_novel();
        if novel {
            self.novel_seen = true;
            self.since_novel = 0;
        } else if self.novel_seen {
            self.since_novel += 1;
        }

        if self.novel_seen && !novel && state.has_joining_coverage() {
            return Verdict::Accept;
        }

        if state.junction_depth > p.max_junction_depth {
            Verdict::Reject
        } else if !self.novel_seen && self.steps > p.max_size_before_novel {
            Verdict::Reject
        } else if self.novel_seen && self.since_novel > p.aggregation_window {
            Verdict::Reject
        } else {
            Verdict::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stopper::testing::Fixture;

    #[test]
    fn accepts_on_reunion_after_novelty() {
        let fix = Fixture::new(&[0], &[1]);
        let shared = fix.vertex("ACGTA", &[0, 1]);
        let novel = fix.vertex("CGTAA", &[0]);

        let mut rule = NovelAggregationStopper::new(Default::default());
        // joining coverage before any novelty is not a reunion
        assert_eq!(rule.step(&fix.state(&shared, 0, 1, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&novel, 0, 2, 1)), Verdict::Continue);
        assert!(rule.novel_seen());
        assert_eq!(rule.step(&fix.state(&shared, 0, 3, 1)), Verdict::Accept);
    }

    #[test]
    fn regions_of_interest_count_as_novel() {
        let mut fix = Fixture::new(&[0], &[1]);
        fix.rois.insert("ACGTA".into());
        let roi = fix.vertex("ACGTA", &[0, 1]);
        let shared = fix.vertex("CGTAA", &[0, 1]);

        let mut rule = NovelAggregationStopper::new(Default::default());
        assert_eq!(rule.step(&fix.state(&roi, 0, 1, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&shared, 0, 2, 1)), Verdict::Accept);
    }

    #[test]
    fn rejects_without_novelty() {
        let fix = Fixture::new(&[0], &[1]);
        let shared = fix.vertex("ACGTA", &[0, 1]);
        let mut rule = NovelAggregationStopper::new(NovelAggregationParams {
            max_size_before_novel: 2,
            ..Default::default()
        });
        assert_eq!(rule.step(&fix.state(&shared, 0, 1, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&shared, 0, 2, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&shared, 0, 3, 1)), Verdict::Reject);

        let mut rule = NovelAggregationStopper::new(Default::default());
        assert_eq!(rule.step(&fix.state(&shared, 4, 1, 2)), Verdict::Reject);
    }

    #[test]
    fn rejects_when_novel_region_never_closes() {
        let fix = Fixture::new(&[0], &[1]);
        let novel = fix.vertex("CGTAA", &[0]);
        // neither novel nor joined: counts against the window
        let lone = fix.vertex("GTAAC", &[2]);
        let mut rule = NovelAggregationStopper::new(NovelAggregationParams {
            aggregation_window: 1,
            ..Default::default()
        });
        assert_eq!(rule.step(&fix.state(&novel, 0, 1, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&lone, 0, 2, 1)), Verdict::Continue);
        assert_eq!(rule.step(&fix.state(&lone, 0, 3, 1)), Verdict::Reject);
    }
}
