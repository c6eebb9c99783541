use std::ops::Range;

use bstr::BString;
use fnv::FnvHashMap;
use log::{debug, info, warn};

use crate::config::{Direction, TraversalDirection};
use crate::engine::TraversalEngine;
use crate::graph::{self, Subgraph, Vertex, DEFAULT_EDGE_WEIGHT};
use crate::stopper::{BubbleClosingParams, StoppingRuleKind};
use crate::store::KmerStore;

/// A stretch of a walk replaced by a reference path. `path` runs from
/// the walk's vertex at `start` to the one at `stop`, both included.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub start: usize,
    pub stop: usize,
    pub path: Vec<Vertex>,
}

/// The outcome of reconciling a walk against the reference colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The walk with every patch spliced in.
    pub vertices: Vec<Vertex>,
    /// Applied patches, in walk order and non-overlapping.
    pub patches: Vec<Patch>,
    /// Walk indices of regions of interest no patch could cover.
    pub gaps: Vec<Range<usize>>,
}

impl Reconciliation {
    pub fn sequence(&self) -> BString {
        graph::spell(&self.vertices)
    }

    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Replaces the novel stretches of a walk with the shortest path the
/// reference colors offer around them.
///
/// For every region of interest in the walk, the reconciler looks a
/// short way back for a root: a walk vertex where the reference
/// diverges from the walk. From each divergent neighbor it searches
/// for a way back into the walk, and splices in the shortest path
/// from the root to the furthest point of return.
pub struct BubbleReconciler<'e, 'a, S: KmerStore + ?Sized> {
    reference: &'e TraversalEngine<'a, S>,
    closing: BubbleClosingParams,
}

impl<'e, 'a, S: KmerStore + ?Sized> BubbleReconciler<'e, 'a, S> {
    /// `reference` supplies the store, the reference colors as its
    /// traversal colors, and the regions of interest.
    pub fn new(reference: &'e TraversalEngine<'a, S>) -> Self {
        BubbleReconciler {
            reference,
            closing: BubbleClosingParams::default(),
        }
    }

    pub fn with_closing_params(mut self, params: BubbleClosingParams) -> Self {
        self.closing = params;
        self
    }

    /// How far back from a region of interest a root is looked for.
    fn search_window(&self) -> usize {
        3 * self.reference.kmer_size()
    }

    pub fn reconcile(&self, walk: &[Vertex]) -> Reconciliation {
        let closer = self.closing_engine(walk);

        let mut positions: FnvHashMap<BString, usize> = Default::default();
        for (ix, v) in walk.iter().enumerate() {
            positions.insert(v.kmer().into(), ix);
        }

        let rois = self.reference.rois();
        let mut patches: Vec<Patch> = Vec::new();
        let mut gaps: Vec<Range<usize>> = Vec::new();
        // roots must come after the last patch
        let mut floor = 0;

        let mut ix = 0;
        while ix < walk.len() {
            if !rois.contains(&walk[ix].record().kmer) {
                ix += 1;
                continue;
            }

            let lowest = ix.saturating_sub(self.search_window()).max(floor);
            let patch = (lowest..ix)
                .rev()
                .filter_map(|root| {
                    self.root_patch(&closer, walk, &positions, root)
                })
                .find(|p| p.stop > ix);

            match patch {
                Some(patch) => {
                    debug!(
                        "patched walk indices {}..={} with {} vertices",
                        patch.start,
                        patch.stop,
                        patch.path.len()
                    );
                    ix = patch.stop + 1;
                    floor = ix;
                    patches.push(patch);
                }
                None => {
                    match gaps.last_mut() {
                        Some(gap) if gap.end == ix => gap.end = ix + 1,
                        _ => gaps.push(ix..ix + 1),
                    }
                    ix += 1;
                }
            }
        }

        for gap in gaps.iter() {
            warn!("no reference path around walk indices {:?}", gap);
        }

        let vertices = splice(walk, &patches);
        info!(
            "reconciled walk of {} vertices into {}: {} patches, {} gaps",
            walk.len(),
            vertices.len(),
            patches.len(),
            gaps.len()
        );

        Reconciliation {
            vertices,
            patches,
            gaps,
        }
    }

    /// An engine over the reference colors that stops on reaching any
    /// k-mer of the walk.
    fn closing_engine(&self, walk: &[Vertex]) -> TraversalEngine<'a, S> {
        let reference = self.reference;
        let mut config = reference.config().clone();
        config.direction = TraversalDirection::Forward;
        config.stopping_rule =
            Some(StoppingRuleKind::BubbleClosing(self.closing.clone()));

        let mut builder = TraversalEngine::builder()
            .graph(reference.store())
            .config(config)
            .sinks(walk.iter().map(|v| v.kmer()))
            .rois(reference.rois().iter());
        if let Some(links) = reference.links() {
            builder = builder.links(links);
        }
        if let Some(previous) = reference.previous_graph() {
            builder = builder.previous_graph(previous);
        }
        // the reference engine's configuration was already validated
        builder.build()
    }

    /// If the reference diverges from the walk right after `root`,
    /// the best patch out of the divergent neighbors: the one that
    /// returns furthest along the walk, then the shortest.
    fn root_patch(
        &self,
        closer: &TraversalEngine<'a, S>,
        walk: &[Vertex],
        positions: &FnvHashMap<BString, usize>,
        root: usize,
    ) -> Option<Patch> {
        let next: BString = walk.get(root + 1)?.kmer().into();
        let root_vertex = closer.vertex(walk[root].kmer())?;

        let divergent: Vec<BString> = closer
            .neighbors(root_vertex.kmer(), Direction::Forward)
            .into_iter()
            .map(|(_, kmer)| kmer)
            .filter(|kmer| *kmer != next)
            .collect();
        if divergent.is_empty() {
            return None;
        }

        let mut best: Option<Patch> = None;
        for neighbor in divergent {
            let mut graph = match closer.dfs(&neighbor) {
                Some(graph) => graph,
                None => continue,
            };

            let stop = graph
                .vertices()
                .enumerate()
                .filter(|(vx, _)| !graph.is_rejected(*vx))
                .filter_map(|(_, v)| {
                    positions.get(&BString::from(v.kmer())).copied()
                })
                .filter(|&pos| pos > root)
                .max();
            let stop = match stop {
                Some(stop) => stop,
                None => continue,
            };

            connect_root(&mut graph, &root_vertex, &neighbor, closer);
            let path = match graph
                .shortest_path(root_vertex.kmer(), walk[stop].kmer())
            {
                Some(path) => path,
                None => continue,
            };

            let better = best.as_ref().map_or(true, |b| {
                stop > b.stop || (stop == b.stop && path.len() < b.path.len())
            });
            if better {
                best = Some(Patch {
                    start: root,
                    stop,
                    path,
                });
            }
        }
        best
    }
}

/// Adds the root to a subgraph grown from one of its successors,
/// with one edge per reference color that carries the step.
fn connect_root<S: KmerStore + ?Sized>(
    graph: &mut Subgraph,
    root: &Vertex,
    neighbor: &[u8],
    engine: &TraversalEngine<'_, S>,
) {
    let to = match graph.index_of(neighbor) {
        Some(to) => to,
        None => return,
    };
    let from = graph.add_vertex(root.clone());
    let base = neighbor[neighbor.len() - 1];
    for &color in engine.traversal_colors().iter() {
        let (_, out) = root.record().oriented_edges(color, root.orientation());
        if out.contains(base) {
            graph.add_edge(from, to, color, DEFAULT_EDGE_WEIGHT);
        }
    }
}

fn splice(walk: &[Vertex], patches: &[Patch]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(walk.len());
    let mut next = 0;
    for patch in patches {
        vertices.extend_from_slice(&walk[next..patch.start]);
        vertices.extend(patch.path.iter().cloned());
        next = patch.stop + 1;
    }
    vertices.extend_from_slice(&walk[next..]);
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Walk;
    use crate::kmer::{self, KmerSet};
    use crate::store::MemoryStore;

    const REF: &str = "GGCTGAAGCAACCTTGTTAGGCGGACCAGAATACTCGTGT";

    /// Walks the sample color, and reconciles against the reference
    /// color with every sample-only k-mer as a region of interest.
    fn reconcile_sample(sample: &str) -> (Walk, Reconciliation) {
        let store = MemoryStore::builder(5, 2)
            .add_sequence(0, REF.as_bytes())
            .add_sequence(1, sample.as_bytes())
            .build();

        let walker = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![1])
            .stopping_rule(StoppingRuleKind::Contig)
            .build();
        let walk = walker.walk(&sample.as_bytes()[..5], Direction::Forward);

        let reference_kmers = kmer::canonical_kmers(REF.as_bytes(), 5);
        let rois: KmerSet = kmer::canonical_kmers(sample.as_bytes(), 5)
            .difference(&reference_kmers)
            .cloned()
            .collect();

        let reference = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![0])
            .stopping_rule(StoppingRuleKind::Contig)
            .rois(rois.iter())
            .build();
        let reconciler = BubbleReconciler::new(&reference);
        let result = reconciler.reconcile(&walk.vertices);
        (walk, result)
    }

    #[test]
    fn substitution_is_replaced_by_reference() {
        let sample = "GGCTGAAGCAACCTTGTTAGTCGGACCAGAATACTCGTGT";
        let (walk, result) = reconcile_sample(sample);
        assert_eq!(walk.sequence(), sample);

        assert_eq!(result.sequence(), REF);
        assert!(result.is_complete());
        assert_eq!(result.patches.len(), 1);
        let patch = &result.patches[0];
        assert_eq!((patch.start, patch.stop), (15, 21));
        assert_eq!(patch.path.len(), 7);
        assert_eq!(graph::spell(&patch.path), &REF[15..26]);
    }

    #[test]
    fn separate_substitutions_get_separate_patches() {
        let sample = "GGCTGAAGTAACCTTGTTAGGCGGACCATAATACTCGTGT";
        let (_, result) = reconcile_sample(sample);

        assert_eq!(result.sequence(), REF);
        let spans: Vec<_> =
            result.patches.iter().map(|p| (p.start, p.stop)).collect();
        assert_eq!(spans, vec![(3, 9), (23, 29)]);
    }

    #[test]
    fn short_returns_fall_back_to_earlier_roots() {
        let sample = "GCCAACCGCATTAGCGTATGAACAAAATAA";
        // G>T at 15, plus a detour leaving TAGCG that comes straight
        // back to AGCGT
        let reference = "GCCAACCGCATTAGCTTATGAACAAAATAA";
        let detour = "TAGCGGTGCGAAGCGT";
        let store = MemoryStore::builder(5, 2)
            .add_sequence(0, reference.as_bytes())
            .add_sequence(0, detour.as_bytes())
            .add_sequence(1, sample.as_bytes())
            .build();

        let walker = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![1])
            .stopping_rule(StoppingRuleKind::Contig)
            .build();
        let walk = walker.walk(&sample.as_bytes()[..5], Direction::Forward);
        assert_eq!(walk.sequence(), sample);
        assert_eq!(walk.vertices[12].kmer(), "AGCGT");

        let reference_engine = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![0])
            .stopping_rule(StoppingRuleKind::Contig)
            .rois(std::iter::once("AGCGT"))
            .build();
        let result =
            BubbleReconciler::new(&reference_engine).reconcile(&walk.vertices);

        assert!(result.is_complete());
        let spans: Vec<_> =
            result.patches.iter().map(|p| (p.start, p.stop)).collect();
        assert_eq!(spans, vec![(10, 16)]);
        assert_eq!(result.patches[0].path.len(), 7);
        assert_eq!(result.sequence(), reference);
    }

    #[test]
    fn unmatched_regions_become_gaps() {
        // shares nothing with the reference
        let sample = "AATCCCAAATGTGATGG";
        let (walk, result) = reconcile_sample(sample);
        assert_eq!(walk.len(), sample.len() - 4);

        assert!(result.patches.is_empty());
        assert_eq!(result.gaps, vec![0..walk.len()]);
        assert_eq!(result.vertices, walk.vertices);
    }
}
