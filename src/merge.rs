//! Merge one decoded CSV into per-article partial documents.
//!
//! The data label comes from the CSV file name (`abstracts`, `keywords`,
//! `article_titles` or `references`). Each row is routed to its pid's
//! partial document and appended unless an equal row is already there, so
//! replaying the same CSV changes nothing.

use anyhow::{bail, Result};
use serde_json::Value;
use std::path::Path;

use isis_dataprep_core::models::DataLabel;
use isis_dataprep_core::store::{AppendOutcome, PartialRow, PartialStore};

use crate::csv_rows::{read_rows, row_pid};
use crate::progress::{ProgressReporter, Stage, Throttle};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeSummary {
    pub rows_read: u64,
    pub appended: u64,
    pub already_present: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl MergeSummary {
    pub fn print(&self, label: DataLabel) {
        println!("merge {}", label);
        println!("  rows read: {}", self.rows_read);
        println!("  appended: {}", self.appended);
        println!("  already present: {}", self.already_present);
        println!("  skipped (bad pid): {}", self.skipped);
        println!("  failed: {}", self.failed);
        println!("ok");
    }
}

/// Label for a CSV path, from its file name.
pub fn label_for(csv_path: &Path) -> Result<DataLabel> {
    let name = csv_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match DataLabel::from_filename(&name) {
        Some(label) => Ok(label),
        None => bail!(
            "{} does not name any of: {}",
            name,
            DataLabel::ALL
                .iter()
                .map(DataLabel::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Replace `text` with a non-empty `original`, dropping `original`.
pub fn format_row(mut row: PartialRow) -> PartialRow {
    let has_original = row
        .get("original")
        .and_then(Value::as_str)
        .is_some_and(|o| !o.is_empty());
    if has_original {
        if let Some(original) = row.remove("original") {
            row.insert("text".to_string(), original);
        }
    }
    row
}

/// Merge every row of `csv_path` into `store`.
///
/// A row whose partial document cannot be read back (corrupt JSON) or
/// written is counted as failed and logged; the run goes on.
pub fn merge_csv(
    csv_path: &Path,
    store: &dyn PartialStore,
    progress: &dyn ProgressReporter,
) -> Result<(DataLabel, MergeSummary)> {
    let label = label_for(csv_path)?;
    let rows = read_rows(csv_path)?;

    let input = csv_path.display().to_string();
    let mut throttle = Throttle::new(progress, Stage::Merging, &input, Some(rows.len() as u64));
    let mut summary = MergeSummary::default();

    for row in rows {
        summary.rows_read += 1;
        throttle.tick();

        let Some(pid) = row_pid(&row) else {
            summary.skipped += 1;
            continue;
        };

        match store.append(&pid, label, format_row(row)) {
            Ok(AppendOutcome::Appended) => summary.appended += 1,
            Ok(AppendOutcome::AlreadyPresent) => summary.already_present += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(pid = %pid, label = %label, error = %format!("{:#}", err), "merge failed");
            }
        }
    }
    throttle.finish();

    tracing::info!(
        input = %input,
        label = %label,
        appended = summary.appended,
        "merge finished"
    );
    Ok((label, summary))
}
