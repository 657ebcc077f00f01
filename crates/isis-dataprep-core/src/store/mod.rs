//! Per-article merge store abstraction.
//!
//! Decoded rows for one article arrive in separate files (titles,
//! abstracts, keywords, references), in any order and possibly more than
//! once. The [`PartialStore`] trait keeps one [`PartialDocument`] per
//! `(pid, label)` and appends rows idempotently: a row structurally equal
//! to one already stored is never added twice.
//!
//! Implementations:
//!
//! - [`memory::InMemoryStore`] for tests.
//! - `JsonFileStore` in the `isis-dataprep` crate, one JSON file per
//!   `(pid, label)` under `<root>/<issn>/<year>/<pid>_<label>.json`.

pub mod memory;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::DataLabel;
use crate::pid::Pid;

/// One stored row: a flat JSON object of column name to value.
pub type PartialRow = Map<String, Value>;

/// Result of an [`PartialStore::append`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    AlreadyPresent,
}

/// A JSON object keyed by data label, each value a list of rows.
///
/// Body on disk: `{ "<label>": [ <row>, ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialDocument(Map<String, Value>);

impl PartialDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows stored under `label`; empty when absent or not a list.
    pub fn rows(&self, label: &str) -> &[Value] {
        self.0
            .get(label)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Top-level string value, if any.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Append `row` under `label` unless an equal row is already there.
    ///
    /// A missing, `null`, empty or non-list entry is replaced by a fresh
    /// list first.
    pub fn append(&mut self, label: &str, row: PartialRow) -> AppendOutcome {
        let mut rows = match self.0.remove(label) {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        };

        let row = Value::Object(row);
        let outcome = if rows.contains(&row) {
            AppendOutcome::AlreadyPresent
        } else {
            rows.push(row);
            AppendOutcome::Appended
        };
        self.0.insert(label.to_string(), Value::Array(rows));
        outcome
    }

    /// Shallow union: top-level keys of `other` overwrite ours.
    pub fn merge_from(&mut self, other: PartialDocument) {
        self.0.extend(other.0);
    }
}

/// Storage for partial documents.
pub trait PartialStore {
    /// Load the document for `(pid, label)`. `Ok(None)` when absent.
    fn load(&self, pid: &Pid, label: DataLabel) -> Result<Option<PartialDocument>>;

    /// Replace the document for `(pid, label)`.
    fn save(&self, pid: &Pid, label: DataLabel, doc: &PartialDocument) -> Result<()>;

    /// Whether a document exists for `(pid, label)`.
    fn exists(&self, pid: &Pid, label: DataLabel) -> Result<bool> {
        Ok(self.load(pid, label)?.is_some())
    }

    /// Read-modify-write append. The document is written back only when
    /// the row was new.
    fn append(&self, pid: &Pid, label: DataLabel, row: PartialRow) -> Result<AppendOutcome> {
        let mut doc = self.load(pid, label)?.unwrap_or_default();
        let outcome = doc.append(label.as_str(), row);
        if outcome == AppendOutcome::Appended {
            self.save(pid, label, &doc)?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> PartialRow {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn append_is_idempotent() {
        let mut doc = PartialDocument::new();
        let r = row(json!({"pid": "x", "lang": "en", "text": "Hi"}));
        assert_eq!(doc.append("abstracts", r.clone()), AppendOutcome::Appended);
        assert_eq!(doc.append("abstracts", r), AppendOutcome::AlreadyPresent);
        assert_eq!(doc.rows("abstracts").len(), 1);
    }

    #[test]
    fn equality_ignores_key_order() {
        let mut doc = PartialDocument::new();
        doc.append("keywords", row(json!({"a": "1", "b": "2"})));
        let outcome = doc.append("keywords", row(json!({"b": "2", "a": "1"})));
        assert_eq!(outcome, AppendOutcome::AlreadyPresent);
    }

    #[test]
    fn append_replaces_non_list_entry() {
        let mut doc: PartialDocument = serde_json::from_value(json!({"abstracts": null})).unwrap();
        doc.append("abstracts", row(json!({"t": "x"})));
        assert_eq!(doc.rows("abstracts").len(), 1);
    }

    #[test]
    fn serializes_as_label_object() {
        let mut doc = PartialDocument::new();
        doc.append("references", row(json!({"pid": "p"})));
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"references": [{"pid": "p"}]})
        );
    }
}
