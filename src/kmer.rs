//! Nucleotide-level helpers shared by the store, the engine and the
//! link machinery.

pub mod orientation;

pub use self::orientation::*;

use bstr::BString;
use fnv::FnvHashSet;
use lazy_static::lazy_static;
use regex::bytes::Regex;

/// An oriented k-mer, stored as uppercase ACGT bytes.
pub type Kmer = BString;

/// A set of canonical k-mers, used for sinks and regions of interest.
pub type KmerSet = FnvHashSet<BString>;

pub const BASES: [u8; 4] = *b"ACGT";

#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        other => other,
    }
}

pub fn reverse_complement(seq: &[u8]) -> BString {
    seq.iter().rev().map(|&b| complement(b)).collect::<Vec<_>>().into()
}

/// True if `kmer` is lexicographically no greater than its reverse
/// complement. Compares in place without allocating.
pub fn is_canonical(kmer: &[u8]) -> bool {
    let fwd = kmer.iter();
    let rev = kmer.iter().rev().map(|&b| complement(b));
    for (a, b) in fwd.zip(rev) {
        if *a != b {
            return *a < b;
        }
    }
    true
}

/// Canonical form of `kmer`, plus the orientation `kmer` has relative
/// to it.
pub fn canonical(kmer: &[u8]) -> (BString, Orientation) {
    let orient = Orientation::of_kmer(kmer);
    (orient.apply(kmer), orient)
}

#[inline]
pub fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

pub fn is_acgt(seq: &[u8]) -> bool {
    seq.iter().all(|&b| matches!(b, b'A' | b'C' | b'G' | b'T'))
}

/// Canonical k-mers of every window of `seq`; windows containing
/// anything but ACGT are skipped.
pub fn canonical_kmers(seq: &[u8], k: usize) -> KmerSet {
    if k == 0 || seq.len() < k {
        return KmerSet::default();
    }
    seq.windows(k)
        .filter(|w| is_acgt(w))
        .map(|w| canonical(w).0)
        .collect()
}

/// Maximal runs of ACGT in `seq`, either case, uppercased. Anything
/// else, `N` included, splits the sequence.
pub fn acgt_runs(seq: &[u8]) -> impl Iterator<Item = BString> + '_ {
    lazy_static! {
        static ref RE_ACGT: Regex = Regex::new(r"(?-u)[ACGTacgt]+").unwrap();
    }
    RE_ACGT
        .find_iter(seq)
        .map(|run| BString::from(run.as_bytes().to_ascii_uppercase()))
}

/// Set of up to four nucleotides, one bit per base in ACGT order.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bases(u8);

impl Bases {
    pub const EMPTY: Bases = Bases(0);

    #[inline]
    pub fn from_bits(bits: u8) -> Self {
        Bases(bits & 0x0f)
    }

    #[inline]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Panics if `base` is not one of ACGT.
    pub fn insert(&mut self, base: u8) {
        let ix = base_index(base)
            .unwrap_or_else(|| panic!("not a nucleotide: {}", base as char));
        self.0 |= 1 << ix;
    }

    #[inline]
    pub fn contains(&self, base: u8) -> bool {
        base_index(base).map_or(false, |ix| self.0 & (1 << ix) != 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Bases(self.0 | other.0)
    }

    #[inline]
    pub fn intersection(self, other: Self) -> Self {
        Bases(self.0 & other.0)
    }

    /// The set of complementary bases (A <-> T, C <-> G).
    pub fn complement(self) -> Self {
        let b = self.0;
        Bases(
            ((b & 0b0001) << 3)
                | ((b & 0b0010) << 1)
                | ((b & 0b0100) >> 1)
                | ((b & 0b1000) >> 3),
        )
    }

    /// Iterates over the contained bases in ACGT order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        BASES
            .iter()
            .enumerate()
            .filter(move |(ix, _)| self.0 & (1 << ix) != 0)
            .map(|(_, &b)| b)
    }
}

impl std::iter::FromIterator<u8> for Bases {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut bases = Bases::EMPTY;
        iter.into_iter().for_each(|b| bases.insert(b));
        bases
    }
}

impl std::fmt::Debug for Bases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bases(")?;
        for (ix, &b) in BASES.iter().enumerate() {
            let sym = if self.0 & (1 << ix) != 0 { b } else { b'.' };
            write!(f, "{}", sym as char)?;
        }
        write!(f, ")")
    }
}
