//! Sequential ISIS export reader.
//!
//! An export holds one record per line with cells split on a separator.
//! The whole file is decoded as UTF-8; when that fails, the whole file is
//! decoded again as Latin-1. Encodings are never mixed per line.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Encoding a [`SeqFile`] was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEncoding::Utf8 => f.write_str("utf-8"),
            SourceEncoding::Latin1 => f.write_str("iso-8859-1"),
        }
    }
}

/// A decoded sequential file. Call [`SeqFile::rows`] as often as needed;
/// every call starts from the first line.
#[derive(Debug, Clone)]
pub struct SeqFile {
    path: PathBuf,
    text: String,
    encoding: SourceEncoding,
    separator: char,
}

impl SeqFile {
    pub fn open(path: &Path, separator: char) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read sequential file: {}", path.display()))?;
        Ok(Self::from_bytes(path, bytes, separator))
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>, separator: char) -> Self {
        let (text, encoding) = match String::from_utf8(bytes) {
            Ok(text) => (text, SourceEncoding::Utf8),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    valid_up_to = err.utf8_error().valid_up_to(),
                    "not valid UTF-8, re-reading whole file as Latin-1"
                );
                (latin1_to_string(err.as_bytes()), SourceEncoding::Latin1)
            }
        };
        Self {
            path: path.to_path_buf(),
            text,
            encoding,
            separator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Raw rows, one per line, surrounding whitespace trimmed.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.text
            .lines()
            .map(move |line| split_row(line.trim(), self.separator))
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Split one trimmed line into cells.
pub fn split_row(line: &str, separator: char) -> Vec<String> {
    line.split(separator).map(str::to_string).collect()
}

/// ISO-8859-1 maps every byte to the code point of the same value.
fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
