//! Caret-tagged subfield decoder.
//!
//! ISIS packs several mini-fields into one cell: `^aFoo^bBar` carries
//! `Foo` under tag `a` and `Bar` under tag `b`. A leading run that is not
//! introduced by a tag belongs to the wildcard tag `*`.
//!
//! # Example
//!
//! ```rust
//! use isis_dataprep_core::subfield::decode_subfields;
//!
//! let map = decode_subfields("^aFoo^bBar", '^');
//! assert_eq!(map.get('a'), Some("Foo"));
//! assert_eq!(map.get('b'), Some("Bar"));
//! ```

use std::collections::BTreeMap;

/// Default tag introducer.
pub const TAG_INTRODUCER: char = '^';

/// Tag assigned to an untagged leading run.
pub const WILDCARD: char = '*';

/// Mapping from one-character tag to its (trimmed) value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subfields {
    values: BTreeMap<char, String>,
}

impl Subfields {
    pub fn get(&self, tag: char) -> Option<&str> {
        self.values.get(&tag).map(String::as_str)
    }

    /// Value under `tag`, or `""` when absent.
    pub fn get_or_empty(&self, tag: char) -> &str {
        self.get(tag).unwrap_or("")
    }

    /// Non-empty value under `tag`, falling back to the wildcard run.
    pub fn get_or_wildcard(&self, tag: char) -> Option<&str> {
        self.get(tag)
            .filter(|v| !v.is_empty())
            .or_else(|| self.get(WILDCARD).filter(|v| !v.is_empty()))
    }

    pub fn contains(&self, tag: char) -> bool {
        self.values.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn insert(&mut self, tag: char, value: &str) {
        // Repeated tags: the later segment overwrites the earlier one.
        self.values.insert(tag, value.trim().to_string());
    }
}

/// Decode a caret-tagged blob into its subfields.
///
/// - `""` decodes to an empty map.
/// - A blob not starting with `sep` puts its leading run under `*`.
/// - Empty segments (`^^`) are skipped.
pub fn decode_subfields(blob: &str, sep: char) -> Subfields {
    let mut map = Subfields::default();
    if blob.is_empty() {
        return map;
    }

    let mut segments = blob.split(sep);
    if let Some(head) = segments.next() {
        if !head.is_empty() {
            map.insert(WILDCARD, head);
        }
    }

    for segment in segments {
        let mut chars = segment.chars();
        if let Some(tag) = chars.next() {
            map.insert(tag, chars.as_str());
        }
    }

    map
}
