use crate::config::{ColorSet, Direction};
use crate::graph::{Subgraph, Vertex};
use crate::kmer::KmerSet;

/// What a stopping rule gets to see at each step of a traversal.
///
/// A state is built fresh for every step and only ever borrowed by
/// the rule; anything a rule wants to remember between steps lives in
/// the rule itself.
#[derive(Debug, Clone, Copy)]
pub struct TraversalState<'a> {
    pub current: &'a Vertex,
    pub direction: Direction,
    pub traversal_colors: &'a ColorSet,
    pub joining_colors: &'a ColorSet,
    pub recruitment_colors: &'a ColorSet,
    /// Number of junctions branched through to reach `current`.
    pub junction_depth: usize,
    /// Vertices in the walk or subgraph so far, `current` included.
    pub subgraph_size: usize,
    /// Vertices on the path from the seed to `current`, both included.
    /// Equal to `subgraph_size` for a linear walk.
    pub branch_length: usize,
    /// Continuations available from `current` in the traversal
    /// colors, after link resolution.
    pub num_adjacent: usize,
    pub previous_graph: Option<&'a Subgraph>,
    pub sinks: &'a KmerSet,
    pub rois: &'a KmerSet,
}

impl<'a> TraversalState<'a> {
    #[inline]
    pub fn go_forward(&self) -> bool {
        self.direction.is_forward()
    }

    pub fn has_traversal_coverage(&self) -> bool {
        let rec = self.current.record();
        self.traversal_colors.iter().any(|&c| rec.has_color(c))
    }

    pub fn has_joining_coverage(&self) -> bool {
        let rec = self.current.record();
        self.joining_colors.iter().any(|&c| rec.has_color(c))
    }

    #[inline]
    pub fn is_sink(&self) -> bool {
        self.sinks.contains(&self.current.record().kmer)
    }

    #[inline]
    pub fn is_roi(&self) -> bool {
        self.rois.contains(&self.current.record().kmer)
    }

    /// A k-mer is novel if it was flagged as a region of interest, or
    /// if it is present in the traversal colors but in none of the
    /// joining colors.
    pub fn is_novel(&self) -> bool {
        self.is_roi()
            || (self.has_traversal_coverage() && !self.has_joining_coverage())
    }

    /// True if `current` was captured by the previous traversal, on
    /// either strand.
    pub fn in_previous_graph(&self) -> bool {
        self.previous_graph.map_or(false, |g| {
            g.contains_either_strand(self.current.kmer())
        })
    }
}
