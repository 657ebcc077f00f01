//! Batch assembly of canonical documents.
//!
//! For each pid of an identifiers CSV, the four partial documents are
//! merged into `<pid>_rs.json`. A pid missing any partial document is
//! logged to `incomplete.txt` and skipped; the batch always runs to the
//! end.

use anyhow::{Context, Result};
use std::path::Path;

use isis_dataprep_core::canonical::{assemble, AssembleError, SubjectAreas};
use isis_dataprep_core::pid::Pid;
use isis_dataprep_core::store::PartialStore;

use crate::csv_rows::{read_pids, read_subject_areas};
use crate::json_store::{canonical_path, write_json_file};
use crate::progress::{ProgressReporter, Stage, Throttle};
use crate::tracking::{TrackingKind, TrackingLogs};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssembleSummary {
    pub pids: u64,
    pub exists: u64,
    pub created: u64,
    pub incomplete: u64,
}

impl AssembleSummary {
    pub fn print(&self) {
        println!("assemble");
        println!("  pids: {}", self.pids);
        println!("  already existed: {}", self.exists);
        println!("  created: {}", self.created);
        println!("  incomplete: {}", self.incomplete);
        println!("ok");
    }
}

/// Assemble one pid and write its canonical document under `root`.
pub fn assemble_one(
    store: &dyn PartialStore,
    root: &Path,
    pid: &Pid,
    subject_areas: &SubjectAreas,
) -> Result<Result<(), AssembleError>> {
    let doc = match assemble(store, pid, subject_areas) {
        Ok(doc) => doc,
        Err(err) => return Ok(Err(err)),
    };
    let path = canonical_path(root, pid);
    let body = serde_json::to_string(&doc)
        .with_context(|| format!("Failed to serialize canonical document for {}", pid))?;
    write_json_file(&path, &body)?;
    tracing::debug!(path = %path.display(), "canonical document written");
    Ok(Ok(()))
}

/// Assemble every pid listed in `pids_csv`.
///
/// The tracking logs under `tracking_dir` are truncated first.
pub fn run_assemble(
    pids_csv: &Path,
    subject_areas_csv: &Path,
    store: &dyn PartialStore,
    root: &Path,
    tracking_dir: &Path,
    progress: &dyn ProgressReporter,
) -> Result<AssembleSummary> {
    let subject_areas = read_subject_areas(subject_areas_csv)?;
    tracing::debug!(issns = subject_areas.len(), "subject areas loaded");
    let logs = TrackingLogs::reset(tracking_dir)?;
    let pids = read_pids(pids_csv)?;

    let input = pids_csv.display().to_string();
    let mut throttle = Throttle::new(progress, Stage::Assembling, &input, Some(pids.len() as u64));
    let mut summary = AssembleSummary::default();

    for pid in &pids {
        summary.pids += 1;
        throttle.tick();

        if canonical_path(root, pid).is_file() {
            summary.exists += 1;
            logs.record(TrackingKind::Exists, pid.as_str())?;
        }

        match assemble_one(store, root, pid, &subject_areas)? {
            Ok(()) => {
                summary.created += 1;
                logs.record(TrackingKind::Created, pid.as_str())?;
            }
            Err(err) => {
                summary.incomplete += 1;
                tracing::warn!(pid = %pid, error = %err, "incomplete");
                logs.record(TrackingKind::Incomplete, pid.as_str())?;
            }
        }
    }
    throttle.finish();

    tracing::info!(
        input = %input,
        created = summary.created,
        incomplete = summary.incomplete,
        "assemble finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_store::JsonFileStore;
    use crate::progress::NoProgress;
    use isis_dataprep_core::models::DataLabel;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const COMPLETE: &str = "S0001-37652020000100001";
    const PARTIAL: &str = "S0001-37652021000100002";

    fn seed(store: &JsonFileStore, pid: &str, labels: &[DataLabel]) {
        let pid = Pid::parse(pid).unwrap();
        for label in labels {
            let row = json!({"pid": pid.as_str(), "collection": "scl", "lang": "en", "text": "x"});
            store
                .append(&pid, *label, row.as_object().unwrap().clone())
                .unwrap();
        }
    }

    #[test]
    fn batch_tracks_created_and_incomplete() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("json");
        let store = JsonFileStore::new(&root);
        seed(&store, COMPLETE, &DataLabel::ALL);
        seed(
            &store,
            PARTIAL,
            &[DataLabel::Abstracts, DataLabel::Keywords, DataLabel::ArticleTitles],
        );

        let pids = tmp.path().join("pids.csv");
        fs::write(&pids, format!("pid\n{}\n{}\n{}\n", COMPLETE, PARTIAL, COMPLETE)).unwrap();
        let areas = tmp.path().join("areas.csv");
        fs::write(&areas, "key,value\n0001-3765,Health Sciences\n").unwrap();
        let logs = tmp.path().join("logs");

        let summary = run_assemble(&pids, &areas, &store, &root, &logs, &NoProgress).unwrap();
        assert_eq!(summary.pids, 2);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(fs::read_to_string(logs.join("created.txt")).unwrap(), format!("{}\n", COMPLETE));
        assert_eq!(fs::read_to_string(logs.join("incomplete.txt")).unwrap(), format!("{}\n", PARTIAL));

        let pid = Pid::parse(COMPLETE).unwrap();
        let body = fs::read_to_string(canonical_path(&root, &pid)).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(doc["subject_areas"], json!(["Health Sciences"]));
        assert_eq!(doc["pub_year"], "2020");

        // Second run: the canonical document is reported and rebuilt.
        let summary = run_assemble(&pids, &areas, &store, &root, &logs, &NoProgress).unwrap();
        assert_eq!(summary.exists, 1);
        assert_eq!(summary.created, 1);
        assert_eq!(fs::read_to_string(logs.join("exists.txt")).unwrap(), format!("{}\n", COMPLETE));
    }
}
