use bstr::BString;
use fnv::FnvHashMap;

use crate::config::{ColorSet, Combination};
use crate::kmer::{self, Orientation};
use crate::store::KmerStore;

/// Junction choices recorded by a read passing through a k-mer.
///
/// `orientation` is the strand of the anchor k-mer the read passed
/// through, relative to its canonical form; `junctions` holds the
/// base taken at each successive junction, read on that strand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkRecord {
    pub orientation: Orientation,
    pub junctions: BString,
}

impl LinkRecord {
    pub fn new<T>(orientation: Orientation, junctions: T) -> Self
    where
        T: Into<BString>,
    {
        LinkRecord {
            orientation,
            junctions: junctions.into(),
        }
    }
}

/// Anything that can hand out the links anchored at a canonical
/// k-mer.
pub trait LinkSource: Sync {
    fn links_for(&self, canonical: &[u8]) -> Vec<LinkRecord>;
}

/// Links held in memory, keyed by canonical anchor k-mer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLinks {
    links: FnvHashMap<BString, Vec<LinkRecord>>,
}

impl MemoryLinks {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert<T: Into<BString>>(&mut self, canonical: T, link: LinkRecord) {
        self.links.entry(canonical.into()).or_default().push(link);
    }

    /// Number of anchor k-mers with at least one link.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Derives links from a read and adds them. Each strand of the
    /// read is walked forward through the graph; at every k-mer with
    /// more than one successor in `colors` the read's next base is
    /// recorded, and the choices are anchored at the first k-mer.
    /// Runs of ACGT are threaded separately.
    pub fn thread<S: KmerStore + ?Sized>(
        &mut self,
        store: &S,
        colors: &ColorSet,
        combination: Combination,
        read: &[u8],
    ) {
        let k = store.kmer_size();
        for run in kmer::acgt_runs(read) {
            if run.len() <= k {
                continue;
            }
            let strands = [run.clone(), kmer::reverse_complement(&run)];
            for strand in strands.iter() {
                let junctions: BString = strand
                    .windows(k + 1)
                    .filter(|w| {
                        let (_, out) = store.combined_adjacency(
                            &w[..k],
                            colors,
                            combination,
                        );
                        out.len() > 1
                    })
                    .map(|w| w[k])
                    .collect::<Vec<_>>()
                    .into();
                if junctions.is_empty() {
                    continue;
                }
                let (anchor, orientation) = kmer::canonical(&strand[..k]);
                self.insert(anchor, LinkRecord::new(orientation, junctions));
            }
        }
    }
}

impl LinkSource for MemoryLinks {
    fn links_for(&self, canonical: &[u8]) -> Vec<LinkRecord> {
        self.links
            .get(&BString::from(canonical))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
struct ActiveLink {
    junctions: BString,
    pos: usize,
    age: usize,
}

impl ActiveLink {
    #[inline]
    fn next_choice(&self) -> u8 {
        self.junctions[self.pos]
    }
}

/// The links followed by a single walk. Built fresh for each walk and
/// cursor direction.
///
/// Choices are given on the strand the links were picked up on, that
/// is, the strand of the oriented k-mer being extended.
#[derive(Debug, Clone, Default)]
pub struct LinkStore {
    active: Vec<ActiveLink>,
}

impl LinkStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Picks up the links anchored at `oriented` whose orientation
    /// matches the strand `oriented` is on.
    pub fn add_links(&mut self, source: &dyn LinkSource, oriented: &[u8]) {
        let (anchor, orientation) = kmer::canonical(oriented);
        for link in source.links_for(&anchor) {
            if link.orientation == orientation && !link.junctions.is_empty() {
                self.active.push(ActiveLink {
                    junctions: link.junctions,
                    pos: 0,
                    age: 0,
                });
            }
        }
    }

    /// The base the oldest links agree on, if they do.
    pub fn choice(&self) -> Option<u8> {
        let oldest = self.active.iter().map(|l| l.age).max()?;
        let mut choices = self
            .active
            .iter()
            .filter(|l| l.age == oldest)
            .map(|l| l.next_choice());
        let first = choices.next()?;
        if choices.all(|c| c == first) {
            Some(first)
        } else {
            None
        }
    }

    /// Moves every link that predicted `taken` to its next junction,
    /// and drops the rest along with the exhausted ones.
    pub fn advance(&mut self, taken: u8) {
        self.active.retain(|l| l.next_choice() == taken);
        for link in self.active.iter_mut() {
            link.pos += 1;
        }
        self.active.retain(|l| l.pos < l.junctions.len());
    }

    /// Ages every active link by one step.
    pub fn age(&mut self) {
        for link in self.active.iter_mut() {
            link.age += 1;
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const REPEAT: &str = "ACTGATTTCGATGCGATGCGATGCCACGGTGG";

    #[test]
    fn thread_records_both_strands() {
        let store = MemoryStore::builder(5, 1)
            .add_sequence(0, REPEAT.as_bytes())
            .build();
        let colors: ColorSet = vec![0].into_iter().collect();

        let mut links = MemoryLinks::new();
        links.thread(&store, &colors, Combination::Or, REPEAT.as_bytes());

        assert_eq!(links.len(), 2);
        assert_eq!(
            links.links_for(b"ACTGA"),
            vec![LinkRecord::new(Orientation::Forward, "GGC")]
        );
        assert_eq!(
            links.links_for(b"CCACC"),
            vec![LinkRecord::new(Orientation::Forward, "CCA")]
        );
        assert!(links.links_for(b"GGTGG").is_empty());
    }

    #[test]
    fn strand_must_match() {
        let mut links = MemoryLinks::new();
        links.insert("AACGT", LinkRecord::new(Orientation::Forward, "G"));

        let mut store = LinkStore::new();
        store.add_links(&links, b"ACGTT");
        assert!(!store.is_active());
        store.add_links(&links, b"AACGT");
        assert_eq!(store.len(), 1);
        assert_eq!(store.choice(), Some(b'G'));
    }

    #[test]
    fn oldest_links_decide() {
        let mut links = MemoryLinks::new();
        links.insert("AAAAA", LinkRecord::new(Orientation::Forward, "CA"));
        links.insert("AAAAC", LinkRecord::new(Orientation::Forward, "T"));

        let mut store = LinkStore::new();
        store.add_links(&links, b"AAAAA");
        store.age();
        store.add_links(&links, b"AAAAC");
        assert_eq!(store.choice(), Some(b'C'));

        // the younger link disagreed and is dropped
        store.advance(b'C');
        assert_eq!(store.len(), 1);
        assert_eq!(store.choice(), Some(b'A'));
        store.advance(b'A');
        assert!(!store.is_active());
        assert_eq!(store.choice(), None);
    }

    #[test]
    fn disagreement_gives_no_choice() {
        let mut links = MemoryLinks::new();
        links.insert("AAAAA", LinkRecord::new(Orientation::Forward, "C"));
        links.insert("AAAAA", LinkRecord::new(Orientation::Forward, "G"));

        let mut store = LinkStore::new();
        store.add_links(&links, b"AAAAA");
        assert_eq!(store.choice(), None);
        store.advance(b'G');
        assert_eq!(store.choice(), None);
        assert!(store.is_empty());
    }
}
