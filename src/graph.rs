use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::{Hash, Hasher};

use bstr::{BStr, BString, ByteSlice};
use fnv::FnvHashMap;

use crate::config::ColorSet;
use crate::kmer::{self, Orientation};
use crate::record::KmerRecord;

pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// A k-mer as met during a traversal: the k-mer in the orientation it
/// was read in, its record, and the traversal colors it is present in.
///
/// Equality ignores the strand: two vertices for the same underlying
/// k-mer with the same record and colors are equal.
#[derive(Debug, Clone)]
pub struct Vertex {
    kmer: BString,
    orientation: Orientation,
    record: KmerRecord,
    colors: ColorSet,
}

impl Vertex {
    pub fn new(kmer: BString, record: KmerRecord, traversal: &ColorSet) -> Self {
        let orientation = Orientation::of_kmer(&kmer);
        let colors = traversal
            .iter()
            .copied()
            .filter(|&c| record.has_color(c))
            .collect();
        Vertex {
            kmer,
            orientation,
            record,
            colors,
        }
    }

    #[inline]
    pub fn kmer(&self) -> &BStr {
        self.kmer.as_bstr()
    }

    #[inline]
    pub fn canonical(&self) -> &BStr {
        self.record.kmer.as_bstr()
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn record(&self) -> &KmerRecord {
        &self.record
    }

    /// Traversal colors with coverage at this k-mer.
    #[inline]
    pub fn colors(&self) -> &ColorSet {
        &self.colors
    }

    #[inline]
    pub fn first_base(&self) -> u8 {
        self.kmer[0]
    }

    #[inline]
    pub fn last_base(&self) -> u8 {
        self.kmer[self.kmer.len() - 1]
    }

    /// The same vertex read on the opposite strand.
    pub fn flipped(&self) -> Vertex {
        Vertex {
            kmer: kmer::reverse_complement(&self.kmer),
            orientation: self.orientation.flip(),
            record: self.record.clone(),
            colors: self.colors.clone(),
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.record.kmer == other.record.kmer
            && self.record == other.record
            && self.colors == other.colors
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.record.hash(state);
        self.colors.hash(state);
    }
}

impl std::fmt::Display for Vertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kmer)
    }
}

/// Spells out the sequence of a path of overlapping k-mers.
pub fn spell<'a, I>(path: I) -> BString
where
    I: IntoIterator<Item = &'a Vertex>,
{
    let mut iter = path.into_iter();
    let mut seq = match iter.next() {
        Some(first) => first.kmer.clone(),
        None => return BString::from(""),
    };
    for v in iter {
        seq.push(v.last_base());
    }
    seq
}

/// A directed edge of a single color between two subgraph vertices,
/// given by their indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub color: usize,
    pub weight: f64,
}

/// A directed, weighted multigraph of vertices found by a traversal.
///
/// Vertices live in an arena indexed by their oriented k-mer, and
/// edges refer to them by index, with at most one edge per color
/// between any ordered pair. Vertices of failed branches are kept
/// but flagged as rejected.
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    vertices: Vec<Vertex>,
    rejected: Vec<bool>,
    index: FnvHashMap<BString, usize>,
    edges: Vec<Edge>,
    out_edges: Vec<Vec<usize>>,
}

impl Subgraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Inserts a vertex, or returns the index of the vertex already
    /// present with the same oriented k-mer.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        if let Some(&ix) = self.index.get(&vertex.kmer) {
            return ix;
        }
        let ix = self.vertices.len();
        self.index.insert(vertex.kmer.clone(), ix);
        self.vertices.push(vertex);
        self.rejected.push(false);
        self.out_edges.push(Vec::new());
        ix
    }

    /// Adds an edge unless one of the same color already joins the
    /// two vertices. Returns true if the edge is new.
    pub fn add_edge(
        &mut self,
        from: usize,
        to: usize,
        color: usize,
        weight: f64,
    ) -> bool {
        debug_assert!(weight >= 0.0, "edge weights must be non-negative");
        let exists = self.out_edges[from].iter().any(|&e| {
            let edge = &self.edges[e];
            edge.to == to && edge.color == color
        });
        if exists {
            return false;
        }
        self.out_edges[from].push(self.edges.len());
        self.edges.push(Edge {
            from,
            to,
            color,
            weight,
        });
        true
    }

    #[inline]
    pub fn index_of(&self, kmer: &[u8]) -> Option<usize> {
        self.index.get(&BString::from(kmer)).copied()
    }

    /// True if the k-mer is present in the given orientation.
    #[inline]
    pub fn contains(&self, kmer: &[u8]) -> bool {
        self.index_of(kmer).is_some()
    }

    /// True if the k-mer is present on either strand.
    pub fn contains_either_strand(&self, kmer: &[u8]) -> bool {
        self.contains(kmer) || self.contains(&kmer::reverse_complement(kmer))
    }

    #[inline]
    pub fn vertex(&self, ix: usize) -> &Vertex {
        &self.vertices[ix]
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edges_from(&self, ix: usize) -> impl Iterator<Item = &Edge> {
        self.out_edges[ix].iter().map(move |&e| &self.edges[e])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn mark_rejected(&mut self, ix: usize) {
        self.rejected[ix] = true;
    }

    #[inline]
    pub fn is_rejected(&self, ix: usize) -> bool {
        self.rejected[ix]
    }

    pub fn accepted_vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices
            .iter()
            .zip(self.rejected.iter())
            .filter(|(_, &rej)| !rej)
            .map(|(v, _)| v)
    }

    /// A copy of this graph without the rejected vertices and their
    /// edges.
    pub fn prune_rejected(&self) -> Subgraph {
        let mut pruned = Subgraph::new();
        let mut remap = vec![None; self.len()];
        for (ix, v) in self.vertices.iter().enumerate() {
            if !self.rejected[ix] {
                remap[ix] = Some(pruned.add_vertex(v.clone()));
            }
        }
        for e in self.edges.iter() {
            if let (Some(from), Some(to)) = (remap[e.from], remap[e.to]) {
                pruned.add_edge(from, to, e.color, e.weight);
            }
        }
        pruned
    }

    /// Adds every vertex and edge of `other`. A vertex ends up
    /// rejected only if it is rejected wherever it is present.
    pub fn merge(&mut self, other: &Subgraph) {
        let mut remap = Vec::with_capacity(other.len());
        for (ix, v) in other.vertices.iter().enumerate() {
            let is_new = !self.index.contains_key(&v.kmer);
            let new_ix = self.add_vertex(v.clone());
            if is_new {
                self.rejected[new_ix] = other.rejected[ix];
            } else if !other.rejected[ix] {
                self.rejected[new_ix] = false;
            }
            remap.push(new_ix);
        }
        for e in other.edges.iter() {
            self.add_edge(remap[e.from], remap[e.to], e.color, e.weight);
        }
    }

    /// Minimum-weight path between two oriented k-mers, using
    /// Dijkstra's algorithm over the non-rejected vertices. Parallel
    /// edges count once, with the lightest weight.
    pub fn shortest_path(&self, from: &[u8], to: &[u8]) -> Option<Vec<Vertex>> {
        let start = self.index_of(from)?;
        let end = self.index_of(to)?;
        if self.rejected[start] || self.rejected[end] {
            return None;
        }

        let mut dist = vec![f64::INFINITY; self.len()];
        let mut prev: Vec<Option<usize>> = vec![None; self.len()];
        let mut heap = BinaryHeap::new();

        dist[start] = 0.0;
        heap.push(HeapEntry {
            cost: 0.0,
            ix: start,
        });

        while let Some(HeapEntry { cost, ix }) = heap.pop() {
            if ix == end {
                break;
            }
            if cost > dist[ix] {
                continue;
            }
            for edge in self.edges_from(ix) {
                if self.rejected[edge.to] {
                    continue;
                }
                let next = cost + edge.weight;
                if next < dist[edge.to] {
                    dist[edge.to] = next;
                    prev[edge.to] = Some(ix);
                    heap.push(HeapEntry {
                        cost: next,
                        ix: edge.to,
                    });
                }
            }
        }

        if dist[end].is_infinite() {
            return None;
        }

        let mut path = vec![end];
        let mut cur = end;
        while let Some(p) = prev[cur] {
            path.push(p);
            cur = p;
        }
        path.reverse();
        Some(path.into_iter().map(|ix| self.vertices[ix].clone()).collect())
    }
}

/// Min-heap entry for Dijkstra; ties go to the lower index so that
/// results are deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    cost: f64,
    ix: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.ix.cmp(&self.ix))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
