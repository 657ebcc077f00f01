//! Merge store statistics.
//!
//! Walks a partial-document tree and summarizes, per label and for
//! canonical documents, how many files exist, across how many issn
//! buckets, and when the most recent one was written. Used by
//! `dataprep stats` to check that merge and assemble runs landed.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use isis_dataprep_core::models::DataLabel;

use crate::json_store::CANONICAL_SUFFIX;

/// Counts for one document suffix.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuffixStats {
    pub files: u64,
    pub issns: HashSet<String>,
    pub last_write_ts: Option<i64>,
}

/// Collect statistics for every known suffix under `root`.
pub fn collect(root: &Path) -> Result<BTreeMap<&'static str, SuffixStats>> {
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    let suffixes: Vec<&'static str> = DataLabel::ALL
        .iter()
        .map(DataLabel::as_str)
        .chain(std::iter::once(CANONICAL_SUFFIX))
        .collect();
    let mut stats: BTreeMap<&'static str, SuffixStats> = suffixes
        .iter()
        .map(|s| (*s, SuffixStats::default()))
        .collect();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let Some(stem) = name.strip_suffix(".json") else {
            continue;
        };
        let Some(suffix) = suffixes
            .iter()
            .find(|s| stem.ends_with(&format!("_{}", s)))
        else {
            continue;
        };

        let issn = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(|rel| rel.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .unwrap_or_default();
        let mtime = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);

        if let Some(s) = stats.get_mut(suffix) {
            s.files += 1;
            s.issns.insert(issn);
            s.last_write_ts = s.last_write_ts.max(mtime);
        }
    }
    Ok(stats)
}

/// Run the stats command: walk `root` and print a summary.
pub fn run_stats(root: &Path) -> Result<()> {
    let stats = collect(root)?;

    println!("ISIS Dataprep: Merge Store Stats");
    println!("================================");
    println!();
    println!("  Root:        {}", root.display());
    println!();
    println!(
        "  {:<16} {:>8} {:>8}   {}",
        "SUFFIX", "FILES", "ISSNS", "LAST WRITE"
    );
    println!("  {}", "-".repeat(56));

    for (suffix, s) in &stats {
        let write_display = match s.last_write_ts {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        };
        println!(
            "  {:<16} {:>8} {:>8}   {}",
            suffix,
            s.files,
            s.issns.len(),
            write_display
        );
    }

    println!();
    println!("ok");
    Ok(())
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
