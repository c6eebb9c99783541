pub mod mmap;

pub use self::mmap::MmapStore;

use bstr::BString;
use fnv::FnvHashMap;
use crate::config::{ColorSet, Combination};
use crate::kmer::{self, Bases, Orientation};
use crate::record::KmerRecord;

/// Read-only access to the k-mers of a colored de Bruijn graph.
///
/// Implementations must be immutable once built, so that any number
/// of traversals can share one store across threads.
pub trait KmerStore: Sync {
    fn kmer_size(&self) -> usize;

    fn num_colors(&self) -> usize;

    /// Looks up a k-mer in either orientation; the returned record is
    /// keyed by the canonical k-mer.
    fn lookup(&self, kmer: &[u8]) -> Option<KmerRecord>;

    /// Incoming and outgoing bases of `kmer`, read in the orientation
    /// it was given in. Absent k-mers have no edges.
    fn adjacency(&self, kmer: &[u8], color: usize) -> (Bases, Bases) {
        match self.lookup(kmer) {
            Some(rec) => rec.oriented_edges(color, Orientation::of_kmer(kmer)),
            None => (Bases::EMPTY, Bases::EMPTY),
        }
    }

    /// Adjacency over several colors at once: per side, the union of
    /// the colors' bases for `Combination::Or`, the intersection for
    /// `Combination::And`.
    fn combined_adjacency(
        &self,
        kmer: &[u8],
        colors: &ColorSet,
        combination: Combination,
    ) -> (Bases, Bases) {
        let rec = match self.lookup(kmer) {
            Some(rec) => rec,
            None => return (Bases::EMPTY, Bases::EMPTY),
        };
        let orient = Orientation::of_kmer(kmer);
        let mut sides = colors.iter().map(|&c| rec.oriented_edges(c, orient));
        let first = match sides.next() {
            Some(first) => first,
            None => return (Bases::EMPTY, Bases::EMPTY),
        };
        sides.fold(first, |(inc, out), (i, o)| match combination {
            Combination::Or => (inc.union(i), out.union(o)),
            Combination::And => (inc.intersection(i), out.intersection(o)),
        })
    }

    #[inline]
    fn contains(&self, kmer: &[u8]) -> bool {
        self.lookup(kmer).is_some()
    }
}

/// A store held entirely in a hash map, keyed by canonical k-mer.
#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    kmer_size: usize,
    num_colors: usize,
    records: FnvHashMap<BString, KmerRecord>,
}

impl MemoryStore {
    pub fn builder(kmer_size: usize, num_colors: usize) -> MemoryStoreBuilder {
        MemoryStoreBuilder::new(kmer_size, num_colors)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &KmerRecord> {
        self.records.values()
    }
}

impl KmerStore for MemoryStore {
    fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    fn num_colors(&self) -> usize {
        self.num_colors
    }

    fn lookup(&self, kmer: &[u8]) -> Option<KmerRecord> {
        if kmer.len() != self.kmer_size {
            return None;
        }
        let (key, _) = kmer::canonical(kmer);
        self.records.get(&key).cloned()
    }
}

/// Builds a `MemoryStore` from sequences, one color at a time. Edges
/// come from adjacent k-mers within a sequence; k-mers spanning
/// anything other than ACGT are never created, and neither are edges
/// across them.
#[derive(Debug)]
pub struct MemoryStoreBuilder {
    store: MemoryStore,
}

impl MemoryStoreBuilder {
    pub fn new(kmer_size: usize, num_colors: usize) -> Self {
        assert!(kmer_size > 0, "k-mer size must be positive");
        MemoryStoreBuilder {
            store: MemoryStore {
                kmer_size,
                num_colors,
                records: Default::default(),
            },
        }
    }

    pub fn add_sequence(mut self, color: usize, seq: &[u8]) -> Self {
        assert!(
            color < self.store.num_colors,
            "color {} out of range for a {}-color store",
            color,
            self.store.num_colors
        );
        for run in kmer::acgt_runs(seq) {
            self.add_run(color, &run);
        }
        self
    }

    fn add_run(&mut self, color: usize, run: &[u8]) {
        let k = self.store.kmer_size;
        if run.len() < k {
            return;
        }
        let num_colors = self.store.num_colors;
        let last = run.len() - k;
        for (i, window) in run.windows(k).enumerate() {
            let (key, orient) = kmer::canonical(window);
            let rec = self
                .store
                .records
                .entry(key.clone())
                .or_insert_with(|| KmerRecord::new(key, num_colors));
            rec.coverages[color] += 1;

            if i > 0 {
                let prev = run[i - 1];
                match orient {
                    Orientation::Forward => rec.add_incoming(color, prev),
                    Orientation::Reverse => {
                        rec.add_outgoing(color, kmer::complement(prev))
                    }
                }
            }
            if i < last {
                let next = run[i + k];
                match orient {
                    Orientation::Forward => rec.add_outgoing(color, next),
                    Orientation::Reverse => {
                        rec.add_incoming(color, kmer::complement(next))
                    }
                }
            }
        }
    }

    pub fn build(self) -> MemoryStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_from_sequence() {
        let store = MemoryStore::builder(3, 1)
            .add_sequence(0, b"ACGTTa")
            .build();

        // ACG/CGT share a canonical form
        assert_eq!(store.len(), 3);
        let rec = store.lookup(b"CGT").unwrap();
        assert_eq!(rec.kmer, "ACG");
        assert_eq!(rec.coverage(0), 2);

        let (inc, out) = store.adjacency(b"GTT", 0);
        assert_eq!(inc.iter().collect::<Vec<_>>(), b"C");
        assert_eq!(out.iter().collect::<Vec<_>>(), b"A");
    }

    #[test]
    fn ambiguous_bases_break_kmers() {
        let store = MemoryStore::builder(3, 2)
            .add_sequence(1, b"AACNNGGA")
            .build();
        assert_eq!(store.len(), 2);
        let (inc, out) = store.adjacency(b"AAC", 1);
        assert!(inc.is_empty() && out.is_empty());
        assert!(store.lookup(b"ACN").is_none());
        assert!(!store.lookup(b"GGA").unwrap().has_color(0));
    }

    #[test]
    fn combined_adjacency_over_colors() {
        let store = MemoryStore::builder(3, 2)
            .add_sequence(0, b"ACGTA")
            .add_sequence(1, b"ACGTC")
            .build();
        let both: ColorSet = vec![0, 1].into_iter().collect();

        let (_, out) = store.combined_adjacency(b"CGT", &both, Combination::Or);
        assert_eq!(out.iter().collect::<Vec<_>>(), b"AC");
        let (inc, out) =
            store.combined_adjacency(b"CGT", &both, Combination::And);
        assert!(out.is_empty());
        assert_eq!(inc.iter().collect::<Vec<_>>(), b"A");
    }
}
