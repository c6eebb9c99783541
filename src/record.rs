use bstr::BString;

use crate::kmer::{Bases, Orientation};

/// A k-mer entry in a colored graph. The k-mer is always stored in
/// canonical form, and so are the edges: each color has one edge
/// byte whose low nibble holds the bases that can follow the
/// canonical k-mer and whose high nibble holds the bases that can
/// precede it, both in ACGT bit order.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct KmerRecord {
    pub kmer: BString,
    pub coverages: Vec<u32>,
    pub edges: Vec<u8>,
}

impl KmerRecord {
    pub fn new(kmer: BString, num_colors: usize) -> Self {
        KmerRecord {
            kmer,
            coverages: vec![0; num_colors],
            edges: vec![0; num_colors],
        }
    }

    #[inline]
    pub fn num_colors(&self) -> usize {
        self.coverages.len()
    }

    #[inline]
    pub fn coverage(&self, color: usize) -> u32 {
        self.coverages.get(color).copied().unwrap_or(0)
    }

    #[inline]
    pub fn has_color(&self, color: usize) -> bool {
        self.coverage(color) > 0
    }

    /// Bases preceding the canonical k-mer in `color`.
    #[inline]
    pub fn incoming(&self, color: usize) -> Bases {
        Bases::from_bits(self.edges.get(color).map_or(0, |e| e >> 4))
    }

    /// Bases following the canonical k-mer in `color`.
    #[inline]
    pub fn outgoing(&self, color: usize) -> Bases {
        Bases::from_bits(self.edges.get(color).map_or(0, |e| e & 0x0f))
    }

    /// Incoming and outgoing bases as seen from a k-mer with the
    /// given orientation relative to this record. Reading the record
    /// on the reverse strand swaps and complements the two sides.
    pub fn oriented_edges(
        &self,
        color: usize,
        orient: Orientation,
    ) -> (Bases, Bases) {
        let (inc, out) = (self.incoming(color), self.outgoing(color));
        match orient {
            Orientation::Forward => (inc, out),
            Orientation::Reverse => (out.complement(), inc.complement()),
        }
    }

    pub fn add_incoming(&mut self, color: usize, base: u8) {
        let mut bases = self.incoming(color);
        bases.insert(base);
        self.edges[color] = (self.edges[color] & 0x0f) | (bases.bits() << 4);
    }

    pub fn add_outgoing(&mut self, color: usize, base: u8) {
        let mut bases = self.outgoing(color);
        bases.insert(base);
        self.edges[color] = (self.edges[color] & 0xf0) | bases.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_by_orientation() {
        // AACGT preceded by C and followed by G or T in color 1
        let mut rec = KmerRecord::new("AACGT".into(), 2);
        rec.add_incoming(1, b'C');
        rec.add_outgoing(1, b'G');
        rec.add_outgoing(1, b'T');

        assert!(rec.outgoing(0).is_empty());
        let (inc, out) = rec.oriented_edges(1, Orientation::Forward);
        assert_eq!(inc.iter().collect::<Vec<_>>(), b"C");
        assert_eq!(out.iter().collect::<Vec<_>>(), b"GT");

        // ACGTT is preceded by A or C and followed by G
        let (inc, out) = rec.oriented_edges(1, Orientation::Reverse);
        assert_eq!(inc.iter().collect::<Vec<_>>(), b"AC");
        assert_eq!(out.iter().collect::<Vec<_>>(), b"G");
    }
}
