//! In-memory [`PartialStore`] implementation for tests.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`, keyed by the article part
//! of the pid and the label, mirroring the file layout of the JSON store.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use crate::models::DataLabel;
use crate::pid::Pid;

use super::{PartialDocument, PartialStore};

/// In-memory partial document store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<(String, DataLabel), PartialDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialStore for InMemoryStore {
    fn load(&self, pid: &Pid, label: DataLabel) -> Result<Option<PartialDocument>> {
        let docs = self.docs.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(docs.get(&(pid.article().to_string(), label)).cloned())
    }

    fn save(&self, pid: &Pid, label: DataLabel, doc: &PartialDocument) -> Result<()> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        docs.insert((pid.article().to_string(), label), doc.clone());
        Ok(())
    }
}
