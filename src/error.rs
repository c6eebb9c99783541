use std::{error, fmt};

use bstr::ByteSlice;

pub type StoreResult<T> = Result<T, StoreError>;

/// Problems with an engine's configuration. These are programming
/// errors: `EngineBuilder::build` panics on them, while
/// `EngineBuilder::try_build` hands them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No k-mer store was supplied.
    MissingGraph,
    /// No stopping rule was supplied.
    MissingStoppingRule,
    /// The traversal color set was empty.
    NoTraversalColors,
    /// A color index does not exist in the store.
    ColorOutOfRange { color: usize, num_colors: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConfigError as CE;
        match self {
            CE::MissingGraph => write!(f, "No graph was given to the engine"),
            CE::MissingStoppingRule => {
                write!(f, "No stopping rule was given to the engine")
            }
            CE::NoTraversalColors => {
                write!(f, "At least one traversal color is required")
            }
            CE::ColorOutOfRange { color, num_colors } => write!(
                f,
                "Color {} is out of range for a graph with {} colors",
                color, num_colors
            ),
        }
    }
}

impl error::Error for ConfigError {}

/// Ways a memory-mapped store file can be unusable.
#[derive(Debug)]
pub enum StoreError {
    /// The file does not start with the store magic bytes.
    BadMagic,
    UnsupportedVersion(u32),
    /// The file size does not match the header's record count.
    Truncated { expected: usize, found: usize },
    /// Records must be strictly increasing; includes the index of the
    /// first record that is not.
    Unsorted(usize),
    /// A record handed to the writer was malformed. Includes the
    /// offending k-mer.
    InvalidRecord(String),
    /// Wrapper for an IO error.
    IOError(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StoreError as SE;
        match self {
            SE::BadMagic => write!(f, "File is not a k-mer store"),
            SE::UnsupportedVersion(v) => {
                write!(f, "Unsupported k-mer store version {}", v)
            }
            SE::Truncated { expected, found } => write!(
                f,
                "Store should be {} bytes long, but is {}",
                expected, found
            ),
            SE::Unsorted(ix) => {
                write!(f, "Store records are not sorted at record {}", ix)
            }
            SE::InvalidRecord(kmer) => {
                write!(f, "Invalid record for k-mer {}", kmer)
            }
            SE::IOError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl error::Error for StoreError {}

impl StoreError {
    #[inline]
    pub(crate) fn invalid_record(kmer: &[u8]) -> Self {
        let mut dest = String::new();
        kmer.to_str_lossy_into(&mut dest);
        Self::InvalidRecord(dest)
    }
}
