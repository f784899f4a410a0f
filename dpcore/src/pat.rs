//! Bit pattern store: parsing pattern sources into an ordered sequence of levels
//!
//! A pattern source is plain text. Lines starting with `#` are comments and
//! are skipped entirely. On every other line, each `1` or `0` contributes one
//! bit in order of appearance and every other character is ignored, so bits
//! can be grouped freely:
//!
//! ```text
//! # start marker, then a byte
//! 111 0
//! 1010 1100
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on the number of bits in a pattern
pub const MAX_BITS: usize = 2000;

/// Errors that can occur while loading a pattern.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open '{}' for reading", path.display())]
    NotFound { path: PathBuf },

    #[error("could not open '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `line` is the 1-indexed line that could not be read.
    #[error("reading failed at line {line}: {source}")]
    ReadFailure {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("pattern exceeds the maximum of {max} bits")]
    CapacityExceeded { max: usize },

    #[error("pattern contains no bits")]
    EmptyPattern,
}

/// An immutable, non-empty sequence of output levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    bits: Vec<bool>,
}

impl Pattern {
    /// Load a pattern from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Pattern, LoadError> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Pattern::parse(BufReader::new(f))
    }

    /// Parse a pattern from any buffered source.
    ///
    /// Lines are split on `\n` and scanned as raw bytes, so sources that are
    /// not valid UTF-8 still parse as long as their bits are ASCII.
    pub fn parse(mut rdr: impl BufRead) -> Result<Pattern, LoadError> {
        let mut bits = Vec::new();
        let mut line = Vec::new();
        let mut lineno = 0;
        loop {
            line.clear();
            lineno += 1;
            match rdr.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(source) => {
                    return Err(LoadError::ReadFailure {
                        line: lineno,
                        source,
                    })
                }
            }
            if line.first() == Some(&b'#') {
                continue;
            }
            for &c in &line {
                let bit = match c {
                    b'1' => true,
                    b'0' => false,
                    _ => continue,
                };
                if bits.len() == MAX_BITS {
                    return Err(LoadError::CapacityExceeded { max: MAX_BITS });
                }
                bits.push(bit);
            }
        }
        if bits.is_empty() {
            return Err(LoadError::EmptyPattern);
        }
        Ok(Pattern { bits })
    }

    /// Number of bits, always at least one.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Always false: an empty source is rejected when loading.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Level at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn at(&self, index: usize) -> bool {
        self.bits[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// Render the pattern as rows of space-separated bits, `columns` per row.
    pub fn debug_dump(&self, columns: usize) -> Vec<String> {
        self.bits
            .chunks(columns.max(1))
            .map(|row| {
                row.iter()
                    .map(|&b| if b { "1" } else { "0" })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl FromStr for Pattern {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::parse(s.as_bytes())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.iter() {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}
