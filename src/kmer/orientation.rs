#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use bstr::BString;

use super::reverse_complement;

/// Strand of an oriented k-mer relative to its canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    /// The orientation of `kmer` with respect to its canonical form;
    /// palindromic k-mers are `Forward`.
    #[inline]
    pub fn of_kmer(kmer: &[u8]) -> Self {
        if super::is_canonical(kmer) {
            Orientation::Forward
        } else {
            Orientation::Reverse
        }
    }

    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        matches!(self, Orientation::Reverse)
    }

    /// Reads `kmer` in this orientation, i.e. reverse complements it
    /// for `Reverse`.
    pub fn apply(&self, kmer: &[u8]) -> BString {
        match self {
            Self::Forward => BString::from(kmer),
            Self::Reverse => reverse_complement(kmer),
        }
    }

    /// Parses the strand letter used by link records, `F` or `R`.
    pub fn from_strand_byte(b: u8) -> Option<Self> {
        match b.to_ascii_uppercase() {
            b'F' => Some(Orientation::Forward),
            b'R' => Some(Orientation::Reverse),
            _ => None,
        }
    }

    #[inline]
    pub fn strand_byte(&self) -> u8 {
        match self {
            Self::Forward => b'F',
            Self::Reverse => b'R',
        }
    }
}

impl Default for Orientation {
    fn default() -> Orientation {
        Orientation::Forward
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [b] => Orientation::from_strand_byte(*b),
            _ => None,
        }
        .ok_or_else(|| format!("Invalid strand {:?}, expected F or R", s))
    }
}

/// ```
/// use cdbg::kmer::Orientation;
///
/// assert_eq!(Orientation::Reverse.to_string(), "R");
/// ```
impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", char::from(self.strand_byte()))
    }
}
