pub mod bubble;
pub mod contig;
pub mod destination;
pub mod novel;
pub mod paired;

pub use self::bubble::*;
pub use self::contig::*;
pub use self::destination::*;
pub use self::novel::*;
pub use self::paired::*;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::state::TraversalState;

/// Outcome of one step of a stopping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Stop here; the traversal so far is a success.
    Accept,
    /// Stop here; the traversal so far is a failure.
    Reject,
    Continue,
}

/// A termination policy, consulted once per traversal step.
///
/// Rules are small state machines: `step` both inspects the state
/// and advances whatever the rule keeps track of, so an instance
/// belongs to exactly one traversal call and is never shared.
pub trait StoppingRule: Send {
    fn step(&mut self, state: &TraversalState<'_>) -> Verdict;

    /// Whether a linear walk may revisit a k-mer without stopping.
    /// A rule returning true has to bound the walk itself.
    fn tolerates_cycles(&self) -> bool {
        false
    }
}

/// The built-in stopping rules and their parameters. This is the
/// configuration-side description of a rule; `build` makes a fresh
/// instance for each traversal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum StoppingRuleKind {
    Contig,
    Destination(DestinationParams),
    NovelAggregation(NovelAggregationParams),
    BubbleOpening(BubbleOpeningParams),
    BubbleClosing(BubbleClosingParams),
    PairedReadClosing(PairedReadClosingParams),
}

impl StoppingRuleKind {
    pub fn build(&self) -> Box<dyn StoppingRule> {
        use StoppingRuleKind::*;
        match self {
            Contig => Box::new(ContigStopper),
            Destination(p) => Box::new(DestinationStopper::new(p.clone())),
            NovelAggregation(p) => {
                Box::new(NovelAggregationStopper::new(p.clone()))
            }
            BubbleOpening(p) => Box::new(BubbleOpeningStopper::new(p.clone())),
            BubbleClosing(p) => Box::new(BubbleClosingStopper::new(p.clone())),
            PairedReadClosing(p) => {
                Box::new(PairedReadClosingStopper::new(p.clone()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        use StoppingRuleKind::*;
        match self {
            Contig => "contig",
            Destination(_) => "destination",
            NovelAggregation(_) => "novel-aggregation",
            BubbleOpening(_) => "bubble-opening",
            BubbleClosing(_) => "bubble-closing",
            PairedReadClosing(_) => "paired-read-closing",
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::{ColorSet, Direction};
    use crate::graph::{Subgraph, Vertex};
    use crate::kmer::{self, KmerSet};
    use crate::record::KmerRecord;
    use crate::state::TraversalState;

    pub const NUM_COLORS: usize = 3;

    /// Owns everything a `TraversalState` borrows.
    pub struct Fixture {
        pub traversal: ColorSet,
        pub joining: ColorSet,
        pub recruitment: ColorSet,
        pub sinks: KmerSet,
        pub rois: KmerSet,
        pub previous: Option<Subgraph>,
    }

    impl Fixture {
        pub fn new(traversal: &[usize], joining: &[usize]) -> Self {
            Fixture {
                traversal: traversal.iter().copied().collect(),
                joining: joining.iter().copied().collect(),
                recruitment: ColorSet::new(),
                sinks: KmerSet::default(),
                rois: KmerSet::default(),
                previous: None,
            }
        }

        /// A vertex with coverage 1 in each of `covered`.
        pub fn vertex(&self, kmer: &str, covered: &[usize]) -> Vertex {
            let (canon, _) = kmer::canonical(kmer.as_bytes());
            let mut rec = KmerRecord::new(canon, NUM_COLORS);
            for &c in covered {
                rec.coverages[c] = 1;
            }
            Vertex::new(kmer.into(), rec, &self.traversal)
        }

        /// A forward state whose branch is as long as the subgraph.
        pub fn state<'a>(
            &'a self,
            current: &'a Vertex,
            junction_depth: usize,
            subgraph_size: usize,
            num_adjacent: usize,
        ) -> TraversalState<'a> {
            TraversalState {
                current,
                direction: Direction::Forward,
                traversal_colors: &self.traversal,
                joining_colors: &self.joining,
                recruitment_colors: &self.recruitment,
                junction_depth,
                subgraph_size,
                branch_length: subgraph_size,
                num_adjacent,
                previous_graph: self.previous.as_ref(),
                sinks: &self.sinks,
                rois: &self.rois,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_build_fresh_instances() {
        use testing::Fixture;

        let fix = Fixture::new(&[0], &[1]);
        let v = fix.vertex("ACGTA", &[0]);
        let kind = StoppingRuleKind::Destination(DestinationParams {
            max_branch_length: 2,
            ..Default::default()
        });

        let mut first = kind.build();
        assert_eq!(first.step(&fix.state(&v, 0, 1, 1)), Verdict::Continue);
        assert_eq!(first.step(&fix.state(&v, 0, 2, 1)), Verdict::Continue);
        assert_eq!(first.step(&fix.state(&v, 0, 3, 1)), Verdict::Reject);

        let mut second = kind.build();
        assert_eq!(second.step(&fix.state(&v, 0, 1, 1)), Verdict::Continue);
        assert_eq!(kind.name(), "destination");
    }
}
