use crate::error::StoreError;
use crate::kmer::{self, KmerSet};
use crate::record::KmerRecord;

use super::KmerStore;

use anyhow::Result;

use bstr::BString;
use bytemuck::{Pod, Zeroable};
use log::debug;
use memmap::Mmap;

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const MAGIC: [u8; 8] = *b"CDBGKMER";
const VERSION: u32 = 1;

/// File header. Everything after it is `num_records` records of
/// `record_width` bytes, sorted by k-mer. All integers are stored in
/// native byte order.
#[repr(C)]
#[derive(Zeroable, Pod, Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    magic: [u8; 8],
    version: u32,
    kmer_size: u32,
    num_colors: u32,
    record_width: u32,
    num_records: u64,
}

const HEADER_LEN: usize = std::mem::size_of::<Header>();

/// Byte layout of a single record: the 2-bit packed canonical k-mer
/// in `words` u64s (first base in the highest bits, so that word
/// order is lexicographic k-mer order), one u32 coverage per color,
/// one edge byte per color, zero padding up to a multiple of 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    kmer_size: usize,
    num_colors: usize,
    words: usize,
    width: usize,
}

impl Layout {
    fn new(kmer_size: usize, num_colors: usize) -> Self {
        let words = (kmer_size + 31) / 32;
        let payload = num_colors * 5;
        let width = words * 8 + (payload + 7) / 8 * 8;
        Layout {
            kmer_size,
            num_colors,
            words,
            width,
        }
    }

    #[inline]
    fn coverage_offset(&self) -> usize {
        self.words * 8
    }

    #[inline]
    fn edge_offset(&self) -> usize {
        self.coverage_offset() + self.num_colors * 4
    }

    fn pack(&self, kmer: &[u8]) -> Vec<u64> {
        let mut words = vec![0u64; self.words];
        for (i, &base) in kmer.iter().enumerate() {
            let code = kmer::base_index(base).unwrap_or(0) as u64;
            words[i / 32] |= code << (62 - 2 * (i % 32));
        }
        words
    }

    fn unpack(&self, words: &[u64]) -> BString {
        (0..self.kmer_size)
            .map(|i| {
                let code = (words[i / 32] >> (62 - 2 * (i % 32))) & 0b11;
                kmer::BASES[code as usize]
            })
            .collect::<Vec<_>>()
            .into()
    }

    fn encode(&self, words: &[u64], rec: &KmerRecord, out: &mut Vec<u8>) {
        out.clear();
        for w in words {
            out.extend_from_slice(bytemuck::bytes_of(w));
        }
        for cov in rec.coverages.iter() {
            out.extend_from_slice(bytemuck::bytes_of(cov));
        }
        out.extend_from_slice(&rec.edges);
        out.resize(self.width, 0);
    }
}

/// A k-mer store backed by a memory-mapped, sorted file of
/// fixed-width records. Lookups are binary searches over the mapped
/// bytes, so opening is cheap and nothing is loaded eagerly.
pub struct MmapStore {
    mmap: Mmap,
    layout: Layout,
    num_records: usize,
}

impl MmapStore {
    /// Maps a store file and validates its header, size and record
    /// order. An unsorted file is corrupt, and is rejected here rather
    /// than producing wrong lookups later.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < HEADER_LEN {
            return Err(StoreError::Truncated {
                expected: HEADER_LEN,
                found: mmap.len(),
            }
            .into());
        }

        let header: Header = bytemuck::pod_read_unaligned(&mmap[..HEADER_LEN]);
        if header.magic != MAGIC {
            return Err(StoreError::BadMagic.into());
        }
        if header.version != VERSION {
            return Err(StoreError::UnsupportedVersion(header.version).into());
        }

        let layout =
            Layout::new(header.kmer_size as usize, header.num_colors as usize);
        if layout.width != header.record_width as usize {
            return Err(StoreError::InvalidRecord(format!(
                "record width {} (expected {})",
                header.record_width, layout.width
            ))
            .into());
        }

        let num_records = header.num_records as usize;
        let expected = HEADER_LEN + num_records * layout.width;
        if mmap.len() != expected {
            return Err(StoreError::Truncated {
                expected,
                found: mmap.len(),
            }
            .into());
        }

        let store = MmapStore {
            mmap,
            layout,
            num_records,
        };

        for ix in 1..num_records {
            if store.key(ix - 1).cmp(store.key(ix)) != Ordering::Less {
                return Err(StoreError::Unsorted(ix).into());
            }
        }

        debug!(
            "Opened k-mer store with {} records, k = {}, {} colors",
            num_records, layout.kmer_size, layout.num_colors
        );

        Ok(store)
    }

    /// Writes `records` as a store file. Records must hold canonical
    /// ACGT k-mers of length `kmer_size`, with `num_colors` coverages
    /// and edge bytes each; they are sorted before writing.
    pub fn write<P, I>(
        path: P,
        kmer_size: usize,
        num_colors: usize,
        records: I,
    ) -> Result<()>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = KmerRecord>,
    {
        let layout = Layout::new(kmer_size, num_colors);

        let mut packed = Vec::new();
        for rec in records {
            let valid = rec.kmer.len() == kmer_size
                && kmer::is_acgt(&rec.kmer)
                && kmer::is_canonical(&rec.kmer)
                && rec.coverages.len() == num_colors
                && rec.edges.len() == num_colors;
            if !valid {
                return Err(StoreError::invalid_record(&rec.kmer).into());
            }
            packed.push((layout.pack(&rec.kmer), rec));
        }
        packed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen = KmerSet::default();
        for (_, rec) in packed.iter() {
            if !seen.insert(rec.kmer.clone()) {
                return Err(StoreError::invalid_record(&rec.kmer).into());
            }
        }

        let header = Header {
            magic: MAGIC,
            version: VERSION,
            kmer_size: kmer_size as u32,
            num_colors: num_colors as u32,
            record_width: layout.width as u32,
            num_records: packed.len() as u64,
        };

        let file = File::create(path.as_ref())?;
        let mut out = BufWriter::new(file);
        out.write_all(bytemuck::bytes_of(&header))?;

        let mut buf = Vec::with_capacity(layout.width);
        for (words, rec) in packed.iter() {
            layout.encode(words, rec, &mut buf);
            out.write_all(&buf)?;
        }
        out.flush()?;

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.num_records
    }

    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }

    fn record_bytes(&self, ix: usize) -> &[u8] {
        let start = HEADER_LEN + ix * self.layout.width;
        &self.mmap[start..start + self.layout.width]
    }

    /// The packed k-mer words of a record, read in place.
    fn key(&self, ix: usize) -> impl Iterator<Item = u64> + '_ {
        let bytes = self.record_bytes(ix);
        bytes[..self.layout.words * 8]
            .chunks_exact(8)
            .map(bytemuck::pod_read_unaligned::<u64>)
    }

    fn record_at(&self, ix: usize) -> KmerRecord {
        let layout = &self.layout;
        let bytes = self.record_bytes(ix);
        let words: Vec<u64> = self.key(ix).collect();
        let kmer = layout.unpack(&words);

        let cov_start = layout.coverage_offset();
        let coverages = (0..layout.num_colors)
            .map(|c| {
                let o = cov_start + c * 4;
                bytemuck::pod_read_unaligned::<u32>(&bytes[o..o + 4])
            })
            .collect();

        let edge_start = layout.edge_offset();
        let edges = bytes[edge_start..edge_start + layout.num_colors].to_vec();

        KmerRecord {
            kmer,
            coverages,
            edges,
        }
    }

    /// Iterate over the records in k-mer order.
    pub fn records(&self) -> impl Iterator<Item = KmerRecord> + '_ {
        (0..self.num_records).map(move |ix| self.record_at(ix))
    }
}

impl KmerStore for MmapStore {
    fn kmer_size(&self) -> usize {
        self.layout.kmer_size
    }

    fn num_colors(&self) -> usize {
        self.layout.num_colors
    }

    fn lookup(&self, kmer: &[u8]) -> Option<KmerRecord> {
        if kmer.len() != self.layout.kmer_size || !kmer::is_acgt(kmer) {
            return None;
        }
        let (key, _) = kmer::canonical(kmer);
        let target = self.layout.pack(&key);

        let (mut lo, mut hi) = (0, self.num_records);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key(mid).cmp(target.iter().copied()) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return Some(self.record_at(mid)),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn sample_store() -> MemoryStore {
        MemoryStore::builder(5, 2)
            .add_sequence(0, b"AGTTCTGATCTGGGCTATATGCT")
            .add_sequence(1, b"AGTTCGAATCTGGGCTATATGCT")
            .build()
    }

    #[test]
    fn pack_preserves_order() {
        let layout = Layout::new(40, 1);
        assert_eq!(layout.words, 2);
        let a = layout.pack(b"ACGTACGTACGTACGTACGTACGTACGTACGTAAAAAAAA");
        let b = layout.pack(b"ACGTACGTACGTACGTACGTACGTACGTACGTAAAAAAAC");
        assert!(a < b);
        assert_eq!(
            layout.unpack(&b),
            "ACGTACGTACGTACGTACGTACGTACGTACGTAAAAAAAC"
        );
    }

    #[test]
    fn write_then_open() {
        let mem = sample_store();
        let file = tempfile::NamedTempFile::new().unwrap();
        MmapStore::write(file.path(), 5, 2, mem.records().cloned()).unwrap();

        let store = MmapStore::open(file.path()).unwrap();
        assert_eq!(store.len(), mem.len());
        assert_eq!(store.kmer_size(), 5);
        assert_eq!(store.num_colors(), 2);

        for rec in mem.records() {
            let rc = kmer::reverse_complement(&rec.kmer);
            assert_eq!(store.lookup(&rec.kmer).as_ref(), Some(rec));
            assert_eq!(store.lookup(&rc).as_ref(), Some(rec));
            for color in 0..2 {
                assert_eq!(
                    store.adjacency(&rc, color),
                    mem.adjacency(&rc, color)
                );
            }
        }
        assert!(store.lookup(b"CCCCC").is_none());
        assert!(store.lookup(b"CCCC").is_none());

        let kmers: Vec<_> = store.records().map(|r| r.kmer).collect();
        let mut sorted = kmers.clone();
        sorted.sort();
        assert_eq!(kmers, sorted);
    }

    #[test]
    fn lookup_across_words() {
        let seq = b"GGCTGAAGCAACCTTGTTAGGCGGACCAGAATACTCGTGTACCGATTGCAAGT";
        let mem = MemoryStore::builder(37, 1).add_sequence(0, seq).build();
        let file = tempfile::NamedTempFile::new().unwrap();
        MmapStore::write(file.path(), 37, 1, mem.records().cloned()).unwrap();
        let store = MmapStore::open(file.path()).unwrap();
        assert_eq!(store.layout.words, 2);

        for rec in mem.records() {
            assert_eq!(store.lookup(&rec.kmer).as_ref(), Some(rec));
            // same first word, different second word
            let mut miss = rec.kmer.clone();
            let last = miss.len() - 1;
            miss[last] = if miss[last] == b'A' { b'C' } else { b'A' };
            if mem.lookup(&miss).is_none() {
                assert!(store.lookup(&miss).is_none());
            }
        }
    }

    #[test]
    fn rejects_non_canonical_records() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let rec = KmerRecord::new("TTTTT".into(), 1);
        assert!(MmapStore::write(file.path(), 5, 1, vec![rec]).is_err());
    }

    #[test]
    fn rejects_unsorted_file() {
        let layout = Layout::new(3, 1);
        let header = Header {
            magic: MAGIC,
            version: VERSION,
            kmer_size: 3,
            num_colors: 1,
            record_width: layout.width as u32,
            num_records: 2,
        };
        let mut bytes = bytemuck::bytes_of(&header).to_vec();
        let mut buf = Vec::new();
        for kmer in [b"ACT", b"AAC"].iter() {
            let rec = KmerRecord::new(BString::from(&kmer[..]), 1);
            layout.encode(&layout.pack(&kmer[..]), &rec, &mut buf);
            bytes.extend_from_slice(&buf);
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();

        let err = MmapStore::open(file.path()).err().unwrap();
        match err.downcast_ref::<StoreError>() {
            Some(StoreError::Unsorted(1)) => (),
            other => panic!("expected an unsorted store, got {:?}", other),
        }
    }

    #[test]
    fn rejects_foreign_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();
        file.flush().unwrap();

        let err = MmapStore::open(file.path()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::BadMagic)
        ));
    }
}
