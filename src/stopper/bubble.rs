#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::{StoppingRule, Verdict};
use crate::state::TraversalState;

pub const OPENING_STABLE_BASES: usize = 5;
pub const OPENING_MAX_SUBGRAPH_SIZE: usize = 1000;
pub const OPENING_MAX_JUNCTION_DEPTH: usize = 3;

pub const CLOSING_MAX_SUBGRAPH_SIZE: usize = 5000;
pub const CLOSING_MAX_JUNCTION_DEPTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct BubbleOpeningParams {
    /// Consecutive joined steps needed before the bubble counts as
    /// open and closed again.
    pub stable_bases: usize,
    pub max_subgraph_size: usize,
    pub max_junction_depth: usize,
}

impl Default for BubbleOpeningParams {
    fn default() -> Self {
        BubbleOpeningParams {
            stable_bases: OPENING_STABLE_BASES,
            max_subgraph_size: OPENING_MAX_SUBGRAPH_SIZE,
            max_junction_depth: OPENING_MAX_JUNCTION_DEPTH,
        }
    }
}

/// Looks for the far side of a bubble: after at least one novel
/// k-mer, the joining colors have to stay present for a run of
/// `stable_bases` steps.
#[derive(Debug, Clone)]
pub struct BubbleOpeningStopper {
    params: BubbleOpeningParams,
    novel_seen: bool,
    since_join: usize,
}

impl BubbleOpeningStopper {
    pub fn new(params: BubbleOpeningParams) -> Self {
        BubbleOpeningStopper {
            params,
            novel_seen: false,
            since_join: 0,
        }
    }
}

impl StoppingRule for BubbleOpeningStopper {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict {
        let novel = state.is_novel();
        if novel {
            self.novel_seen = true;
        }

        if self.novel_seen && !novel && state.has_joining_coverage() {
            self.since_join += 1;
        } else {
            self.since_join = 0;
        }

        if self.since_join >= self.params.stable_bases {
            Verdict::Accept
        } else if state.subgraph_size > self.params.max_subgraph_size
            || state.junction_depth > self.params.max_junction_depth
        {
            Verdict::Reject
        } else {
            Verdict::Continue
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct BubbleClosingParams {
    pub max_subgraph_size: usize,
    pub max_junction_depth: usize,
}

impl Default for BubbleClosingParams {
    fn default() -> Self {
        BubbleClosingParams {
            max_subgraph_size: CLOSING_MAX_SUBGRAPH_SIZE,
            max_junction_depth: CLOSING_MAX_JUNCTION_DEPTH,
        }
    }
}

/// Closes a bubble by running into either the previous traversal's
/// graph or one of the sinks.
#[derive(Debug, Clone)]
pub struct BubbleClosingStopper {
    params: BubbleClosingParams,
}

impl BubbleClosingStopper {
    pub fn new(params: BubbleClosingParams) -> Self {
        BubbleClosingStopper { params }
    }
}

impl StoppingRule for BubbleClosingStopper {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict {
        if state.in_previous_graph() || state.is_sink() {
            Verdict::Accept
        } else if state.subgraph_size > self.params.max_subgraph_size
            || state.junction_depth > self.params.max_junction_depth
        {
            Verdict::Reject
        } else {
            Verdict::Continue
        }
    }
}
