//! JSON-file backed [`PartialStore`] implementation.
//!
//! One file per `(pid, label)`:
//!
//! ```text
//! <root>/<issn-bucket>/<year>/<pid>_<label>.json
//! <root>/<issn-bucket>/<year>/<pid>_rs.json      (canonical document)
//! ```
//!
//! Files are rewritten whole on every append. There is no locking; two
//! processes must never write the same pid concurrently.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use isis_dataprep_core::models::DataLabel;
use isis_dataprep_core::pid::Pid;
use isis_dataprep_core::store::{PartialDocument, PartialStore};

/// File-name suffix of canonical documents.
pub const CANONICAL_SUFFIX: &str = "rs";

/// `<root>/<issn-bucket>/<year>/<pid[:23]>_<suffix>.json`.
pub fn document_path(root: &Path, pid: &Pid, suffix: &str) -> PathBuf {
    root.join(pid.issn_bucket())
        .join(pid.year())
        .join(format!("{}_{}.json", pid.article(), suffix))
}

/// Path of the canonical document for `pid`.
pub fn canonical_path(root: &Path, pid: &Pid) -> PathBuf {
    document_path(root, pid, CANONICAL_SUFFIX)
}

/// Write `body` to `path`, creating parent directories.
pub fn write_json_file(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

/// JSON-file implementation of the [`PartialStore`] trait.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, pid: &Pid, label: DataLabel) -> PathBuf {
        document_path(&self.root, pid, label.as_str())
    }
}

impl PartialStore for JsonFileStore {
    /// A file that cannot be read counts as absent. A file that reads but
    /// does not parse is an error.
    fn load(&self, pid: &Pid, label: DataLabel) -> Result<Option<PartialDocument>> {
        let path = self.path(pid, label);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "no partial document");
                return Ok(None);
            }
        };
        let doc: PartialDocument = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt partial document: {}", path.display()))?;
        Ok(Some(doc))
    }

    fn save(&self, pid: &Pid, label: DataLabel, doc: &PartialDocument) -> Result<()> {
        let path = self.path(pid, label);
        let body = serde_json::to_string(doc)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;
        write_json_file(&path, &body)?;
        tracing::debug!(path = %path.display(), "partial document written");
        Ok(())
    }

    fn exists(&self, pid: &Pid, label: DataLabel) -> Result<bool> {
        Ok(self.path(pid, label).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isis_dataprep_core::store::AppendOutcome;
    use serde_json::json;
    use tempfile::TempDir;

    fn pid() -> Pid {
        Pid::parse("S0001-37652020000100001").unwrap()
    }

    #[test]
    fn path_layout() {
        let pid = Pid::parse("S0001-3765202000010000100012").unwrap();
        assert_eq!(
            document_path(Path::new("/data"), &pid, "references"),
            PathBuf::from("/data/0001-3765/2020/S0001-37652020000100001_references.json")
        );
        assert_eq!(
            canonical_path(Path::new("/data"), &pid),
            PathBuf::from("/data/0001-3765/2020/S0001-37652020000100001_rs.json")
        );
    }

    #[test]
    fn append_persists_and_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        let row = json!({"pid": "S0001-37652020000100001", "text": "Mar"});
        let row = row.as_object().unwrap().clone();

        let first = store.append(&pid(), DataLabel::Abstracts, row.clone()).unwrap();
        let second = store.append(&pid(), DataLabel::Abstracts, row).unwrap();
        assert_eq!(first, AppendOutcome::Appended);
        assert_eq!(second, AppendOutcome::AlreadyPresent);

        let body = fs::read_to_string(store.path(&pid(), DataLabel::Abstracts)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["abstracts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_absent() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        assert!(store.load(&pid(), DataLabel::Keywords).unwrap().is_none());
        assert!(!store.exists(&pid(), DataLabel::Keywords).unwrap());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path());
        let path = store.path(&pid(), DataLabel::Keywords);
        write_json_file(&path, "{\"keywords\": [").unwrap();
        assert!(store.load(&pid(), DataLabel::Keywords).is_err());
    }
}
