//! Header-driven CSV reading.
//!
//! Decoded CSVs, identifier lists and the subject-areas lookup are all
//! read the same way: the first line names the columns and every later
//! line becomes a JSON object keyed by those names. Values stay strings.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

use isis_dataprep_core::canonical::SubjectAreas;
use isis_dataprep_core::pid::Pid;
use isis_dataprep_core::store::PartialRow;

/// Read every data row of `path` as a column-name to value object.
///
/// A short line yields an object without its missing trailing columns.
pub fn read_rows(path: &Path) -> Result<Vec<PartialRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV: {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("Failed to read {} line {}", path.display(), i + 2))?;
        let row: PartialRow = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Identifier of a row: `pid`, or `key` when `pid` is absent or empty.
///
/// `None` unless the value is a well-formed 23 or 28 character pid.
pub fn row_pid(row: &PartialRow) -> Option<Pid> {
    let raw = ["pid", "key"]
        .iter()
        .filter_map(|k| row.get(*k).and_then(Value::as_str))
        .find(|v| !v.is_empty())?;
    Pid::parse(raw).ok()
}

/// Unique identifiers of an identifiers CSV, in first-seen order.
/// Uniqueness is by article pid, so a 28 character pid and its 23
/// character prefix count once. Rows without a valid identifier are
/// skipped.
pub fn read_pids(path: &Path) -> Result<Vec<Pid>> {
    let mut seen = HashSet::new();
    let mut pids = Vec::new();
    let mut skipped = 0usize;
    for row in read_rows(path)? {
        match row_pid(&row) {
            Some(pid) => {
                if seen.insert(pid.article().to_string()) {
                    pids.push(pid);
                }
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(path = %path.display(), skipped, "rows without a valid pid");
    }
    Ok(pids)
}

/// Subject-areas lookup: columns `key` (issn bucket) and `value`.
pub fn read_subject_areas(path: &Path) -> Result<SubjectAreas> {
    let mut areas = SubjectAreas::new();
    for row in read_rows(path)? {
        let issn = row.get("key").and_then(Value::as_str).unwrap_or_default();
        let area = row.get("value").and_then(Value::as_str).unwrap_or_default();
        if issn.is_empty() || area.is_empty() {
            continue;
        }
        areas.insert(issn, area);
    }
    Ok(areas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PID_A: &str = "S0001-37652020000100001";
    const PID_B: &str = "S0044-59672019000200010";

    #[test]
    fn rows_keyed_by_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("abstracts.csv");
        fs::write(&path, "pid,lang,text\nX,en,\"a, b\"\n").unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["text"], "a, b");
        assert_eq!(rows[0]["lang"], "en");
    }

    #[test]
    fn pids_unique_in_first_seen_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pids.csv");
        fs::write(
            &path,
            format!("pid\n{b}\nbad\n{a}\n{b}\n{a}00001\n", a = PID_A, b = PID_B),
        )
        .unwrap();
        let pids: Vec<String> = read_pids(&path)
            .unwrap()
            .iter()
            .map(|p| p.as_str().to_string())
            .collect();
        assert_eq!(pids, vec![PID_B.to_string(), PID_A.to_string()]);
    }

    #[test]
    fn key_column_is_an_identifier() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("keywords.csv");
        fs::write(&path, format!("key,collection,value\n{},scl,x\n", PID_A)).unwrap();
        assert_eq!(read_pids(&path).unwrap().len(), 1);
    }

    #[test]
    fn subject_areas_grouped_by_issn() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("areas.csv");
        fs::write(
            &path,
            "key,value\n0001-3765,Health\n0001-3765,Biology\n0001-3765,Health\n",
        )
        .unwrap();
        let areas = read_subject_areas(&path).unwrap();
        let got: Vec<&String> = areas.get("0001-3765").unwrap().iter().collect();
        assert_eq!(got, vec!["Biology", "Health"]);
    }
}
