pub mod cursor;
pub mod dfs;

pub use self::cursor::Cursor;

use bstr::BString;
use fnv::FnvHashMap;
use log::debug;

use crate::config::{
    ColorSet, Combination, Direction, TraversalConfig, TraversalDirection,
};
use crate::error::ConfigError;
use crate::graph::{self, Subgraph, Vertex};
use crate::kmer::{self, Kmer, KmerSet};
use crate::links::{LinkSource, LinkStore};
use crate::state::TraversalState;
use crate::stopper::{StoppingRule, StoppingRuleKind, Verdict};
use crate::store::KmerStore;

/// Why a linear walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// No continuation in the traversal colors.
    DeadEnd,
    /// More than one continuation, and no link to pick between them.
    Junction,
    /// The stopping rule accepted the last vertex.
    Accepted,
    /// The stopping rule rejected the last vertex.
    Rejected,
    /// The last vertex had already been visited.
    Cycle,
    /// The seed, or the next k-mer, is not in the store.
    NotFound,
}

/// The vertices of a linear walk, in sequence order.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk {
    pub vertices: Vec<Vertex>,
    pub termination: Termination,
}

impl Walk {
    pub fn sequence(&self) -> BString {
        graph::spell(&self.vertices)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A contig grown in both directions from a seed.
#[derive(Debug, Clone, PartialEq)]
pub struct Contig {
    pub vertices: Vec<Vertex>,
    /// Why the reverse walk stopped.
    pub left: Termination,
    /// Why the forward walk stopped.
    pub right: Termination,
}

impl Contig {
    pub fn sequence(&self) -> BString {
        graph::spell(&self.vertices)
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// A continuation from a k-mer: the base added, and the resulting
/// k-mer in the same orientation.
pub type Step = (u8, Kmer);

/// Walks and searches a colored de Bruijn graph.
///
/// An engine holds only borrowed, read-only data plus its
/// configuration; every traversal builds its own stopping rule,
/// link store and subgraph, so one engine can serve any number of
/// threads at once.
pub struct TraversalEngine<'a, S: KmerStore + ?Sized> {
    store: &'a S,
    config: TraversalConfig,
    stopping_rule: StoppingRuleKind,
    links: Option<&'a dyn LinkSource>,
    sinks: KmerSet,
    rois: KmerSet,
    previous_graph: Option<&'a Subgraph>,
}

impl<'a, S: KmerStore + ?Sized> TraversalEngine<'a, S> {
    pub fn builder() -> EngineBuilder<'a, S> {
        EngineBuilder::new()
    }

    #[inline]
    pub fn store(&self) -> &'a S {
        self.store
    }

    #[inline]
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    #[inline]
    pub fn kmer_size(&self) -> usize {
        self.store.kmer_size()
    }

    #[inline]
    pub fn sinks(&self) -> &KmerSet {
        &self.sinks
    }

    #[inline]
    pub fn rois(&self) -> &KmerSet {
        &self.rois
    }

    #[inline]
    pub fn links(&self) -> Option<&'a dyn LinkSource> {
        self.links
    }

    #[inline]
    pub fn previous_graph(&self) -> Option<&'a Subgraph> {
        self.previous_graph
    }

    #[inline]
    pub fn traversal_colors(&self) -> &ColorSet {
        &self.config.traversal_colors
    }

    /// A fresh instance of the configured stopping rule.
    pub fn new_rule(&self) -> Box<dyn StoppingRule> {
        self.stopping_rule.build()
    }

    /// The vertex for `kmer` in the given orientation, if the k-mer
    /// is in the store.
    pub fn vertex(&self, kmer: &[u8]) -> Option<Vertex> {
        let record = self.store.lookup(kmer)?;
        Some(Vertex::new(
            BString::from(kmer),
            record,
            &self.config.traversal_colors,
        ))
    }

    /// Continuations of `kmer` in the traversal colors, in ACGT order
    /// of the added base: successors when going forward, predecessors
    /// when going in reverse.
    pub fn neighbors(&self, kmer: &[u8], direction: Direction) -> Vec<Step> {
        let (incoming, outgoing) = self.store.combined_adjacency(
            kmer,
            &self.config.traversal_colors,
            self.config.combination,
        );
        let k = kmer.len();
        match direction {
            Direction::Forward => outgoing
                .iter()
                .map(|b| {
                    let mut next = BString::from(&kmer[1..]);
                    next.push(b);
                    (b, next)
                })
                .collect(),
            Direction::Reverse => incoming
                .iter()
                .map(|b| {
                    let mut prev = BString::from(vec![b]);
                    prev.extend_from_slice(&kmer[..k - 1]);
                    (b, prev)
                })
                .collect(),
        }
    }

    /// Continuations of `kmer` after consulting the links. Returns
    /// the candidates and whether a link picked one of several.
    pub(crate) fn resolve_links(
        &self,
        links: &mut LinkStore,
        kmer: &[u8],
        direction: Direction,
    ) -> (Vec<Step>, bool) {
        let mut candidates = self.neighbors(kmer, direction);
        let source = match self.links {
            Some(source) => source,
            None => return (candidates, false),
        };

        // links are anchored on the strand being extended
        let extended = match direction {
            Direction::Forward => BString::from(kmer),
            Direction::Reverse => kmer::reverse_complement(kmer),
        };
        links.add_links(source, &extended);

        let mut resolved = false;
        if candidates.len() > 1 {
            if let Some(choice) = links.choice() {
                let base = match direction {
                    Direction::Forward => choice,
                    Direction::Reverse => kmer::complement(choice),
                };
                if candidates.iter().any(|(b, _)| *b == base) {
                    candidates.retain(|(b, _)| *b == base);
                    links.advance(choice);
                    resolved = true;
                }
            }
        }
        links.age();
        (candidates, resolved)
    }

    pub(crate) fn state<'s>(
        &'s self,
        current: &'s Vertex,
        direction: Direction,
        junction_depth: usize,
        subgraph_size: usize,
        branch_length: usize,
        num_adjacent: usize,
    ) -> TraversalState<'s> {
        TraversalState {
            current,
            direction,
            traversal_colors: &self.config.traversal_colors,
            joining_colors: &self.config.joining_colors,
            recruitment_colors: &self.config.recruitment_colors,
            junction_depth,
            subgraph_size,
            branch_length,
            num_adjacent,
            previous_graph: self.previous_graph,
            sinks: &self.sinks,
            rois: &self.rois,
        }
    }

    /// Walks from `seed` until the stopping rule, the graph or a
    /// cycle ends the walk. The seed is included; a reverse walk ends
    /// with it.
    pub fn walk(&self, seed: &[u8], direction: Direction) -> Walk {
        let mut rule = self.new_rule();
        self.walk_with_rule(seed, direction, rule.as_mut())
    }

    /// Like `walk`, with a caller-supplied stopping rule.
    pub fn walk_with_rule(
        &self,
        seed: &[u8],
        direction: Direction,
        rule: &mut dyn StoppingRule,
    ) -> Walk {
        let seed = seed.to_ascii_uppercase();
        let mut current = match self.vertex(&seed) {
            Some(v) => v,
            None => {
                debug!("walk seed {} not found", BString::from(seed));
                return Walk {
                    vertices: Vec::new(),
                    termination: Termination::NotFound,
                };
            }
        };

        let mut links = LinkStore::new();
        // oriented k-mer -> number of link resolutions at the visit
        let mut visited: FnvHashMap<BString, usize> = FnvHashMap::default();
        let mut resolutions = 0;
        visited.insert(current.kmer().into(), resolutions);
        let mut vertices = vec![current.clone()];

        let termination = loop {
            let (candidates, resolved) =
                self.resolve_links(&mut links, current.kmer(), direction);
            if resolved {
                resolutions += 1;
            }

            let state = self.state(
                &current,
                direction,
                0,
                vertices.len(),
                vertices.len(),
                candidates.len(),
            );
            match rule.step(&state) {
                Verdict::Accept => break Termination::Accepted,
                Verdict::Reject => break Termination::Rejected,
                Verdict::Continue => (),
            }

            let next_kmer = match candidates.as_slice() {
                [] => break Termination::DeadEnd,
                [(_, next)] => next,
                _ => break Termination::Junction,
            };
            let next = match self.vertex(next_kmer) {
                Some(v) => v,
                None => break Termination::NotFound,
            };

            if !rule.tolerates_cycles() {
                let key: BString = next.kmer().into();
                let repeat = visited
                    .get(&key)
                    .map_or(false, |&seen_at| resolutions <= seen_at);
                if repeat {
                    vertices.push(next);
                    break Termination::Cycle;
                }
                visited.insert(key, resolutions);
            }

            vertices.push(next.clone());
            current = next;
        };

        if !direction.is_forward() {
            vertices.reverse();
        }

        debug!(
            "{:?} walk from {} stopped after {} k-mers: {:?}",
            direction,
            BString::from(seed),
            vertices.len(),
            termination
        );

        Walk {
            vertices,
            termination,
        }
    }

    /// Walks in both directions from `seed` and joins the two walks
    /// at the seed.
    pub fn assemble(&self, seed: &[u8]) -> Contig {
        let left = self.walk(seed, Direction::Reverse);
        let right = self.walk(seed, Direction::Forward);

        let mut vertices = left.vertices;
        vertices.pop();
        vertices.extend(right.vertices);

        Contig {
            vertices,
            left: left.termination,
            right: right.termination,
        }
    }

    /// A cursor over this engine's graph, not yet placed anywhere.
    pub fn cursor(&self) -> Cursor<'_, 'a, S> {
        Cursor::new(self)
    }
}

/// Assembles a `TraversalEngine`.
///
/// The store, a stopping rule and at least one traversal color are
/// required; everything else is optional.
pub struct EngineBuilder<'a, S: KmerStore + ?Sized> {
    store: Option<&'a S>,
    config: TraversalConfig,
    links: Option<&'a dyn LinkSource>,
    sinks: KmerSet,
    rois: KmerSet,
    previous_graph: Option<&'a Subgraph>,
}

impl<'a, S: KmerStore + ?Sized> Default for EngineBuilder<'a, S> {
    fn default() -> Self {
        EngineBuilder {
            store: None,
            config: TraversalConfig::default(),
            links: None,
            sinks: KmerSet::default(),
            rois: KmerSet::default(),
            previous_graph: None,
        }
    }
}

fn canonical_set<I, T>(kmers: I) -> KmerSet
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    kmers
        .into_iter()
        .map(|k| kmer::canonical(&k.as_ref().to_ascii_uppercase()).0)
        .collect()
}

impl<'a, S: KmerStore + ?Sized> EngineBuilder<'a, S> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn graph(mut self, store: &'a S) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the whole configuration, stopping rule included.
    pub fn config(mut self, config: TraversalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn traversal_colors<I>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.config.traversal_colors = colors.into_iter().collect();
        self
    }

    pub fn joining_colors<I>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.config.joining_colors = colors.into_iter().collect();
        self
    }

    pub fn recruitment_colors<I>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.config.recruitment_colors = colors.into_iter().collect();
        self
    }

    pub fn combination(mut self, combination: Combination) -> Self {
        self.config.combination = combination;
        self
    }

    pub fn direction(mut self, direction: TraversalDirection) -> Self {
        self.config.direction = direction;
        self
    }

    pub fn stopping_rule(mut self, kind: StoppingRuleKind) -> Self {
        self.config.stopping_rule = Some(kind);
        self
    }

    pub fn links(mut self, links: &'a dyn LinkSource) -> Self {
        self.links = Some(links);
        self
    }

    /// K-mers a traversal is looking for; stored canonically.
    pub fn sinks<I, T>(mut self, kmers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.sinks = canonical_set(kmers);
        self
    }

    /// Regions of interest; stored canonically.
    pub fn rois<I, T>(mut self, kmers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.rois = canonical_set(kmers);
        self
    }

    pub fn previous_graph(mut self, graph: &'a Subgraph) -> Self {
        self.previous_graph = Some(graph);
        self
    }

    pub fn try_build(self) -> Result<TraversalEngine<'a, S>, ConfigError> {
        let store = self.store.ok_or(ConfigError::MissingGraph)?;
        let stopping_rule = self
            .config
            .stopping_rule
            .clone()
            .ok_or(ConfigError::MissingStoppingRule)?;
        if self.config.traversal_colors.is_empty() {
            return Err(ConfigError::NoTraversalColors);
        }
        let num_colors = store.num_colors();
        let out_of_range = self.config.all_colors().find(|&c| c >= num_colors);
        if let Some(color) = out_of_range {
            return Err(ConfigError::ColorOutOfRange { color, num_colors });
        }

        Ok(TraversalEngine {
            store,
            config: self.config,
            stopping_rule,
            links: self.links,
            sinks: self.sinks,
            rois: self.rois,
            previous_graph: self.previous_graph,
        })
    }

    /// Panics if the configuration is incomplete or inconsistent; use
    /// `try_build` to get the error instead.
    pub fn build(self) -> TraversalEngine<'a, S> {
        match self.try_build() {
            Ok(engine) => engine,
            Err(err) => {
                panic!("invalid traversal engine configuration: {}", err)
            }
        }
    }
}
