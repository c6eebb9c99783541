use bstr::BString;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use super::{StoppingRule, Verdict};
use crate::kmer::{self, KmerSet};
use crate::state::TraversalState;

pub const PAIRED_MAX_JUNCTION_DEPTH: usize = 5;
pub const PAIRED_MAX_BRANCH_LENGTH: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(default))]
pub struct PairedReadClosingParams {
    /// Sequence of the mate read to close towards.
    pub mate: BString,
    pub max_junction_depth: usize,
    pub max_branch_length: usize,
}

impl Default for PairedReadClosingParams {
    fn default() -> Self {
        PairedReadClosingParams {
            mate: BString::from(""),
            max_junction_depth: PAIRED_MAX_JUNCTION_DEPTH,
            max_branch_length: PAIRED_MAX_BRANCH_LENGTH,
        }
    }
}

impl PairedReadClosingParams {
    pub fn new<T: Into<BString>>(mate: T) -> Self {
        PairedReadClosingParams {
            mate: mate.into(),
            ..Default::default()
        }
    }
}

/// Closes the gap between the two reads of a pair. The mate's
/// canonical k-mers are computed on the first step, once the k-mer
/// size is known from the traversal itself.
#[derive(Debug, Clone)]
pub struct PairedReadClosingStopper {
    params: PairedReadClosingParams,
    mate_kmers: Option<KmerSet>,
}

impl PairedReadClosingStopper {
    pub fn new(params: PairedReadClosingParams) -> Self {
        PairedReadClosingStopper {
            params,
            mate_kmers: None,
        }
    }
}

impl StoppingRule for PairedReadClosingStopper {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict {
        let k = state.current.kmer().len();
        let mate = &self.params.mate;
        let mate_kmers = self
            .mate_kmers
            .get_or_insert_with(|| kmer::canonical_kmers(mate, k));

        if mate_kmers.contains(&state.current.record().kmer) {
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
