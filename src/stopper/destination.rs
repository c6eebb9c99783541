#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::{StoppingRule, Verdict};
use crate::state::TraversalState;

pub const DESTINATION_MAX_JUNCTION_DEPTH: usize = 2;
pub const DESTINATION_MAX_BRANCH_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct DestinationParams {
    pub max_junction_depth: usize,
    pub max_branch_length: usize,
}

impl Default for DestinationParams {
    fn default() -> Self {
        DestinationParams {
            max_junction_depth: DESTINATION_MAX_JUNCTION_DEPTH,
            max_branch_length: DESTINATION_MAX_BRANCH_LENGTH,
        }
    }
}

/// Searches for any of the sink k-mers, giving up on a branch once it
/// is too deep or too long.
#[derive(Debug, Clone)]
pub struct DestinationStopper {
    params: DestinationParams,
}

impl DestinationStopper {
    pub fn new(params: DestinationParams) -> Self {
        DestinationStopper { params }
    }
}

impl StoppingRule for DestinationStopper {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict {
        if state.is_sink() {
            Verdict::Accept
        } else if state.junction_depth > self.params.max_junction_depth
            || state.branch_length > self.params.max_branch_length
        {
            Verdict::Reject
        } else {
            Verdict::Continue
        }
    }
}
