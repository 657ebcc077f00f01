//! Structured CSV writer with the `.err` side file.
//!
//! Every raw row of a [`SeqFile`] goes through the selected decoder. Rows
//! that decode are written to the CSV (one line per record, several for
//! `key-and-value`); rows that fail, come out empty or belong to a
//! skipped collection are appended verbatim to `<output>.err`.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use isis_dataprep_core::decode::{decode_row, CollectionFilter, DecodeContext};
use isis_dataprep_core::error::DecodeError;
use isis_dataprep_core::models::RecordKind;

use crate::progress::{ProgressReporter, Stage, Throttle};
use crate::seq::SeqFile;

/// Counts for one decode run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeSummary {
    pub rows_read: u64,
    pub records_written: u64,
    pub rows_diverted: u64,
    pub rows_filtered: u64,
}

impl DecodeSummary {
    pub fn print(&self, kind: RecordKind, output: &Path) {
        println!("decode {}", kind);
        println!("  output: {}", output.display());
        println!("  rows read: {}", self.rows_read);
        println!("  records written: {}", self.records_written);
        println!("  rows diverted: {}", self.rows_diverted);
        println!("  rows filtered: {}", self.rows_filtered);
        println!("ok");
    }
}

/// `<output>.err`, next to the CSV.
pub fn error_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".err");
    PathBuf::from(name)
}

/// Decode `seq` as `kind` into the CSV at `output`.
///
/// `output` is truncated; its `.err` sibling is appended to, so diverted
/// rows accumulate across runs. Only I/O failures on the output side
/// abort the run.
pub fn write_csv(
    seq: &SeqFile,
    kind: RecordKind,
    ctx: &DecodeContext<'_>,
    filter: &CollectionFilter,
    output: &Path,
    progress: &dyn ProgressReporter,
) -> Result<DecodeSummary> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut csv_out = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create CSV: {}", output.display()))?;
    csv_out
        .write_record(kind.fieldnames())
        .context("Failed to write CSV header")?;

    let err_path = error_path(output);
    let err_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&err_path)
        .with_context(|| format!("Failed to open error file: {}", err_path.display()))?;
    let mut err_out = BufWriter::new(err_file);

    let input = seq.path().display().to_string();
    let mut throttle = Throttle::new(
        progress,
        Stage::Decoding,
        &input,
        Some(seq.line_count() as u64),
    );
    let mut summary = DecodeSummary::default();

    for row in seq.rows() {
        summary.rows_read += 1;
        throttle.tick();

        let decoded = decode_row(kind, &row, ctx).and_then(|records| {
            if records.is_empty() {
                return Err(DecodeError::EmptyField { field: "record" });
            }
            for record in &records {
                filter.check(record)?;
            }
            Ok(records)
        });

        match decoded {
            Ok(records) => {
                for record in &records {
                    csv_out
                        .write_record(record.values())
                        .with_context(|| format!("Failed to write CSV: {}", output.display()))?;
                    summary.records_written += 1;
                }
            }
            Err(err) => {
                if matches!(err, DecodeError::CollectionFiltered { .. }) {
                    summary.rows_filtered += 1;
                } else {
                    summary.rows_diverted += 1;
                }
                tracing::warn!(line = summary.rows_read, kind = err.kind(), error = %err, "row diverted");
                writeln!(err_out, "{}", list_repr(&row))
                    .with_context(|| format!("Failed to write {}", err_path.display()))?;
            }
        }
    }

    csv_out
        .flush()
        .with_context(|| format!("Failed to flush CSV: {}", output.display()))?;
    err_out
        .flush()
        .with_context(|| format!("Failed to flush {}", err_path.display()))?;
    throttle.finish();

    tracing::info!(
        input = %input,
        encoding = %seq.encoding(),
        read = summary.rows_read,
        written = summary.records_written,
        "decode finished"
    );
    Ok(summary)
}

/// Render raw cells as a bracketed list of quoted strings, `['a', 'b']`,
/// the line format of existing `.err` files.
pub fn list_repr(cells: &[String]) -> String {
    let items: Vec<String> = cells.iter().map(|c| quote_cell(c)).collect();
    format!("[{}]", items.join(", "))
}

/// Single quotes unless the cell holds a `'` and no `"`.
fn quote_cell(cell: &str) -> String {
    let quote = if cell.contains('\'') && !cell.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(cell.len() + 2);
    out.push(quote);
    for c in cell.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else {
                    out.push_str(&format!("\\u{:04x}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Open the input, decode it, and write the CSV. Convenience wrapper used
/// by the `decode` command.
pub fn run_decode(
    input: &Path,
    output: &Path,
    kind: RecordKind,
    ctx: &DecodeContext<'_>,
    filter: &CollectionFilter,
    progress: &dyn ProgressReporter,
) -> Result<DecodeSummary> {
    let seq = SeqFile::open(input, ctx.separator)?;
    let summary = write_csv(&seq, kind, ctx, filter, output, progress)?;
    summary.print(kind, output);
    Ok(summary)
}
