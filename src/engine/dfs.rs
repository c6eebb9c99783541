use bstr::BString;
use fnv::FnvHashSet;
use log::{debug, trace};

use crate::config::Direction;
use crate::graph::{Subgraph, Vertex, DEFAULT_EDGE_WEIGHT};
use crate::kmer;
use crate::stopper::{StoppingRule, Verdict};
use crate::store::KmerStore;

use super::TraversalEngine;

/// State of one depth-first search in one direction.
struct Search<'s, 'a, S: KmerStore + ?Sized> {
    engine: &'s TraversalEngine<'a, S>,
    rule: &'s mut dyn StoppingRule,
    direction: Direction,
    /// Canonical form of the destination k-mer.
    destination: Option<&'s BString>,
    graph: Subgraph,
    on_path: FnvHashSet<BString>,
}

impl<'s, 'a, S: KmerStore + ?Sized> Search<'s, 'a, S> {
    /// Adds the edges between two adjacent vertices, pointing in
    /// sequence order, one per traversal color that carries it.
    fn connect(&mut self, prev: usize, next: usize) {
        let (from, to) = match self.direction {
            Direction::Forward => (prev, next),
            Direction::Reverse => (next, prev),
        };
        let source = self.graph.vertex(from);
        let base = self.graph.vertex(to).last_base();
        let colors: Vec<usize> = self
            .engine
            .traversal_colors()
            .iter()
            .copied()
            .filter(|&c| {
                let (_, out) =
                    source.record().oriented_edges(c, source.orientation());
                out.contains(base)
            })
            .collect();
        for color in colors {
            self.graph.add_edge(from, to, color, DEFAULT_EDGE_WEIGHT);
        }
    }

    fn is_destination(&self, vertex: &Vertex) -> bool {
        self.destination.map_or(false, |d| *d == vertex.record().kmer)
    }

    /// Follows one branch from `start`, reached from the vertex at
    /// index `from`. Unbranched stretches are walked in a loop, and
    /// junctions recurse with one more level of depth. Returns true
    /// if the branch succeeded; otherwise every vertex it added is
    /// marked rejected.
    fn branch(
        &mut self,
        start: Vertex,
        from: Option<usize>,
        depth: usize,
    ) -> bool {
        let mut added = Vec::new();
        let mut path = Vec::new();
        let mut current = start;
        let mut prev = from;

        let success = loop {
            let key: BString = current.kmer().into();
            if self.on_path.contains(&key) {
                break false;
            }
            if let Some(ix) = self.graph.index_of(&key) {
                // reached from a sibling branch
                if self.graph.is_rejected(ix) {
                    break false;
                }
                if let Some(p) = prev {
                    self.connect(p, ix);
                }
                break true;
            }

            let ix = self.graph.add_vertex(current.clone());
            added.push(ix);
            if let Some(p) = prev {
                self.connect(p, ix);
            }
            self.on_path.insert(key.clone());
            path.push(key);

            if self.is_destination(&current) {
                break true;
            }

            let mut candidates =
                self.engine.neighbors(current.kmer(), self.direction);
            if let Some(p) = prev {
                let back: BString = self.graph.vertex(p).kmer().into();
                candidates.retain(|(_, k)| *k != back);
            }

            let state = self.engine.state(
                &current,
                self.direction,
                depth,
                self.graph.len(),
                self.on_path.len(),
                candidates.len(),
            );
            match self.rule.step(&state) {
                Verdict::Accept => break true,
                Verdict::Reject => break false,
                Verdict::Continue => (),
            }

            if candidates.len() == 1 {
                match self.engine.vertex(&candidates[0].1) {
                    Some(next) => {
                        prev = Some(ix);
                        current = next;
                        continue;
                    }
                    None => break false,
                }
            }

            let mut any = false;
            for (_, kmer) in candidates {
                if let Some(child) = self.engine.vertex(&kmer) {
                    if self.branch(child, Some(ix), depth + 1) {
                        any = true;
                    }
                }
            }
            break any;
        };

        for key in path {
            self.on_path.remove(&key);
        }
        if !success {
            for &ix in added.iter() {
                self.graph.mark_rejected(ix);
            }
        }
        trace!(
            "branch at depth {} with {} new vertices {}",
            depth,
            added.len(),
            if success { "succeeded" } else { "failed" }
        );
        success
    }
}

impl<'a, S: KmerStore + ?Sized> TraversalEngine<'a, S> {
    /// Collects the subgraph around `seed` that the stopping rule
    /// accepts, exploring in the configured direction(s). Returns
    /// `None` if no branch succeeds.
    pub fn dfs(&self, seed: &[u8]) -> Option<Subgraph> {
        self.dfs_in(seed, None, self.config.direction.directions())
    }

    /// Like `dfs`, but reaching `destination` (on either strand) also
    /// ends a branch successfully.
    pub fn dfs_to(&self, seed: &[u8], destination: &[u8]) -> Option<Subgraph> {
        self.dfs_in(
            seed,
            Some(destination),
            self.config.direction.directions(),
        )
    }

    /// Searches forward from `a` to `b`, and failing that, in reverse
    /// from `b` back to `a`.
    pub fn dfs_between(&self, a: &[u8], b: &[u8]) -> Option<Subgraph> {
        self.dfs_in(a, Some(b), &[Direction::Forward])
            .or_else(|| self.dfs_in(b, Some(a), &[Direction::Reverse]))
    }

    /// Like `dfs_to`, with a caller-supplied rule that is shared by
    /// the searches in every configured direction.
    pub fn dfs_with_rule(
        &self,
        seed: &[u8],
        destination: Option<&[u8]>,
        rule: &mut dyn StoppingRule,
    ) -> Option<Subgraph> {
        let start = self.dfs_seed(seed)?;
        let destination = destination.map(canonical_destination);
        let mut results = Vec::new();
        for &direction in self.config.direction.directions() {
            let dest = destination.as_ref();
            results.push(self.search(&start, dest, direction, rule));
        }
        combine(results)
    }

    fn dfs_in(
        &self,
        seed: &[u8],
        destination: Option<&[u8]>,
        directions: &[Direction],
    ) -> Option<Subgraph> {
        let start = self.dfs_seed(seed)?;
        let destination = destination.map(canonical_destination);
        let mut results = Vec::new();
        for &direction in directions {
            let mut rule = self.new_rule();
            results.push(self.search(
                &start,
                destination.as_ref(),
                direction,
                rule.as_mut(),
            ));
        }
        combine(results)
    }

    fn dfs_seed(&self, seed: &[u8]) -> Option<Vertex> {
        let seed = seed.to_ascii_uppercase();
        let start = self.vertex(&seed);
        if start.is_none() {
            debug!("dfs seed {} not found", BString::from(seed));
        }
        start
    }

    fn search(
        &self,
        start: &Vertex,
        destination: Option<&BString>,
        direction: Direction,
        rule: &mut dyn StoppingRule,
    ) -> (bool, Subgraph) {
        let mut search = Search {
            engine: self,
            rule,
            direction,
            destination,
            graph: Subgraph::new(),
            on_path: FnvHashSet::default(),
        };
        let success = search.branch(start.clone(), None, 0);
        debug!(
            "{:?} dfs from {} {} with {} vertices",
            direction,
            start,
            if success { "succeeded" } else { "failed" },
            search.graph.len()
        );
        (success, search.graph)
    }
}

fn canonical_destination(kmer: &[u8]) -> BString {
    kmer::canonical(&kmer.to_ascii_uppercase()).0
}

/// Merges the graphs of the searches in each direction. Succeeds if
/// any search did; the rejected vertices of failed searches are kept.
fn combine(results: Vec<(bool, Subgraph)>) -> Option<Subgraph> {
    if !results.iter().any(|(success, _)| *success) {
        return None;
    }
    let mut merged = Subgraph::new();
    for (_, graph) in results.iter() {
        merged.merge(graph);
    }
    Some(merged)
}
