use crate::config::Direction;
use crate::graph::Vertex;
use crate::links::LinkStore;
use crate::store::KmerStore;

use super::TraversalEngine;

/// Steps through the graph one vertex at a time, following the same
/// adjacency and link rules as `TraversalEngine::walk` but without a
/// stopping rule. A step is only taken where exactly one continuation
/// remains; junctions and dead ends end iteration.
///
/// The cursor does not detect cycles, so iterating around a circular
/// sequence never ends on its own.
pub struct Cursor<'e, 'a, S: KmerStore + ?Sized> {
    engine: &'e TraversalEngine<'a, S>,
    current: Option<Vertex>,
    forward_links: LinkStore,
    reverse_links: LinkStore,
}

impl<'e, 'a, S: KmerStore + ?Sized> Cursor<'e, 'a, S> {
    pub(crate) fn new(engine: &'e TraversalEngine<'a, S>) -> Self {
        Cursor {
            engine,
            current: None,
            forward_links: LinkStore::new(),
            reverse_links: LinkStore::new(),
        }
    }

    /// Moves the cursor to `kmer`, forgetting any links picked up so
    /// far. Returns the new current vertex, or `None` if the k-mer is
    /// not in the graph, leaving the cursor unplaced.
    pub fn seek(&mut self, kmer: &[u8]) -> Option<&Vertex> {
        self.forward_links = LinkStore::new();
        self.reverse_links = LinkStore::new();
        self.current = self.engine.vertex(&kmer.to_ascii_uppercase());
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&Vertex> {
        self.current.as_ref()
    }

    fn links(&self, direction: Direction) -> &LinkStore {
        match direction {
            Direction::Forward => &self.forward_links,
            Direction::Reverse => &self.reverse_links,
        }
    }

    /// The vertex one step away, with the link store as it would be
    /// after taking that step.
    fn peek(&self, direction: Direction) -> Option<(Vertex, LinkStore)> {
        let current = self.current.as_ref()?;
        let mut links = self.links(direction).clone();
        let (candidates, _) =
            self.engine
                .resolve_links(&mut links, current.kmer(), direction);
        match candidates.as_slice() {
            [(_, next)] => self.engine.vertex(next).map(|v| (v, links)),
            _ => None,
        }
    }

    fn step(&mut self, direction: Direction) -> Option<Vertex> {
        let (next, links) = self.peek(direction)?;
        // links only make sense for the direction they were read in
        match direction {
            Direction::Forward => {
                self.forward_links = links;
                self.reverse_links = LinkStore::new();
            }
            Direction::Reverse => {
                self.reverse_links = links;
                self.forward_links = LinkStore::new();
            }
        }
        self.current = Some(next.clone());
        Some(next)
    }

    pub fn has_next(&self) -> bool {
        self.peek(Direction::Forward).is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.peek(Direction::Reverse).is_some()
    }

    /// Steps to the unique predecessor of the current vertex.
    pub fn previous(&mut self) -> Option<Vertex> {
        self.step(Direction::Reverse)
    }
}

impl<'e, 'a, S: KmerStore + ?Sized> Iterator for Cursor<'e, 'a, S> {
    type Item = Vertex;

    fn next(&mut self) -> Option<Vertex> {
        self.step(Direction::Forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorSet, Combination};
    use crate::engine::tests::trio;
    use crate::graph;
    use crate::links::MemoryLinks;
    use crate::stopper::StoppingRuleKind;
    use crate::store::MemoryStore;

    const REPEAT: &str = "ACTGATTTCGATGCGATGCGATGCCACGGTGG";

    #[test]
    fn steps_both_ways() {
        let store = trio();
        let engine = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![0])
            .stopping_rule(StoppingRuleKind::Contig)
            .build();

        let mut cursor = engine.cursor();
        assert!(cursor.current().is_none());
        assert!(!cursor.has_next());
        assert!(cursor.seek(b"CTGGG").is_some());

        let tail: Vec<u8> = cursor.by_ref().map(|v| v.last_base()).collect();
        assert_eq!(tail, b"CTATATGCT");
        assert!(!cursor.has_next());
        assert_eq!(cursor.current().unwrap().kmer(), "ATGCT");

        assert!(cursor.has_previous());
        assert_eq!(cursor.previous().unwrap().kmer(), "TATGC");
        assert!(cursor.has_next());
        assert_eq!(cursor.next().unwrap().kmer(), "ATGCT");
    }

    #[test]
    fn stops_at_junctions() {
        let store = trio();
        let engine = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![1])
            .stopping_rule(StoppingRuleKind::Contig)
            .build();

        let mut cursor = engine.cursor();
        cursor.seek(b"CTGGG");
        let mut steps = 0;
        while cursor.has_previous() {
            cursor.previous();
            steps += 1;
        }
        assert_eq!(steps, 7);
        assert_eq!(cursor.current().unwrap().kmer(), "TTCGA");
        assert!(cursor.previous().is_none());
        assert_eq!(cursor.current().unwrap().kmer(), "TTCGA");

        assert!(cursor.seek(b"AAAAA").is_none());
        assert!(!cursor.has_next() && !cursor.has_previous());
    }

    #[test]
    fn follows_links_through_repeats() {
        let store = MemoryStore::builder(5, 1)
            .add_sequence(0, REPEAT.as_bytes())
            .build();
        let colors: ColorSet = vec![0].into_iter().collect();
        let mut links = MemoryLinks::new();
        links.thread(&store, &colors, Combination::Or, REPEAT.as_bytes());

        let plain = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![0])
            .stopping_rule(StoppingRuleKind::Contig)
            .build();
        let mut cursor = plain.cursor();
        let seed = cursor.seek(b"ACTGA").cloned().unwrap();
        let path: Vec<_> = std::iter::once(seed).chain(cursor).collect();
        assert_eq!(graph::spell(&path), "ACTGATTTCGATGC");

        let linked = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![0])
            .stopping_rule(StoppingRuleKind::Contig)
            .links(&links)
            .build();
        let mut cursor = linked.cursor();
        let seed = cursor.seek(b"ACTGA").cloned().unwrap();
        // peeking leaves the links untouched
        assert!(cursor.has_next());
        assert!(cursor.has_next());
        let path: Vec<_> = std::iter::once(seed).chain(cursor).collect();
        assert_eq!(graph::spell(&path), REPEAT);
    }

    #[test]
    fn follows_links_backwards_through_repeats() {
        let store = MemoryStore::builder(5, 1)
            .add_sequence(0, REPEAT.as_bytes())
            .build();
        let colors: ColorSet = vec![0].into_iter().collect();
        let mut links = MemoryLinks::new();
        links.thread(&store, &colors, Combination::Or, REPEAT.as_bytes());

        let engine = TraversalEngine::builder()
            .graph(&store)
            .traversal_colors(vec![0])
            .stopping_rule(StoppingRuleKind::Contig)
            .links(&links)
            .build();
        let mut cursor = engine.cursor();
        let seed = cursor.seek(b"GGTGG").cloned().unwrap();

        let mut path = vec![seed];
        while let Some(prev) = cursor.previous() {
            path.push(prev);
        }
        path.reverse();
        assert_eq!(graph::spell(&path), REPEAT);
        assert_eq!(cursor.current().unwrap().kmer(), "ACTGA");
        assert!(!cursor.has_previous());
    }
}
