//! # ISIS Dataprep CLI (`dataprep`)
//!
//! The `dataprep` binary drives the migration pipeline one step at a time.
//! Every step reads files and writes files; steps are chained by the
//! operator (or a shell script), not by the binary.
//!
//! ## Usage
//!
//! ```bash
//! dataprep --config ./config/dataprep.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dataprep decode <kind> <seq> <csv>` | Decode one sequential file into one CSV |
//! | `dataprep merge <csv> <root>` | Append CSV rows to per-article partial documents |
//! | `dataprep assemble <pids> <areas> <root>` | Build `_rs.json` canonical documents |
//! | `dataprep shards <pids> <root> <lists> <script>` | Write registration shard scripts |
//! | `dataprep stats <root>` | Summarize a partial-document tree |
//!
//! ## Examples
//!
//! ```bash
//! # Older two-cell abstracts export
//! dataprep decode text-and-lang abstracts.seq out/abstracts.csv
//!
//! # Keyword export split on '~', body in subfield ^k
//! dataprep decode text-and-lang-and-year keywords.seq out/keywords.csv --separator '~'
//!
//! # Merge, then assemble every pid of the list
//! dataprep merge out/abstracts.csv ./json
//! dataprep assemble pids.csv subject_areas.csv ./json
//!
//! # Eight registration processes
//! dataprep shards pids.csv ./json ./lists ./register.sh --calls 8
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use isis_dataprep::config::{self, Config};
use isis_dataprep::json_store::JsonFileStore;
use isis_dataprep::progress::ProgressMode;
use isis_dataprep::{assemble, merge, shards, stats, writer};
use isis_dataprep_core::decode::DecodeContext;
use isis_dataprep_core::models::RecordKind;

/// ISIS Dataprep CLI: decode legacy ISIS exports and merge them into
/// per-article documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/dataprep.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "dataprep",
    about = "ISIS Dataprep: decode legacy ISIS exports into per-article JSON documents",
    version,
    long_about = "ISIS Dataprep decodes legacy ISIS sequential exports into CSV, merges the \
    CSV rows into per-article partial JSON documents, and assembles them into canonical \
    documents ready for registration."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dataprep.toml`. A missing file means built-in
    /// defaults; an invalid file is an error.
    #[arg(long, global = true, default_value = "./config/dataprep.toml")]
    config: PathBuf,

    /// Progress on stderr: `off`, `human` or `json`. Defaults to `human`
    /// when stderr is a terminal, otherwise `off`.
    #[arg(long, global = true)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Decode one sequential file into one CSV.
    ///
    /// Rows that fail to decode, decode to nothing, or belong to a skipped
    /// collection are written verbatim to `<csv>.err`.
    Decode {
        /// Record type: `text-and-lang`, `text-and-lang-and-year`,
        /// `key-and-value`, `articles` or `references`.
        kind: RecordKind,

        /// Input sequential file.
        input: PathBuf,

        /// Output CSV. Parent directories are created.
        output: PathBuf,

        /// Subfield holding the text body. Defaults to the
        /// `[decode.subfields]` entry for the input file name, else `*`.
        #[arg(long)]
        tag: Option<char>,

        /// Row separator. Defaults to `decode.separator`, or
        /// `decode.keyword_separator` for dated keyword exports.
        #[arg(long)]
        separator: Option<char>,
    },

    /// Merge one decoded CSV into partial JSON documents.
    ///
    /// The data label is taken from the CSV file name. Replaying the same
    /// CSV adds nothing.
    Merge {
        /// Decoded CSV (`*abstracts*`, `*keywords*`, `*article_titles*`
        /// or `*references*`).
        csv: PathBuf,

        /// Root of the partial-document tree.
        root: PathBuf,
    },

    /// Assemble canonical `_rs.json` documents for a list of pids.
    Assemble {
        /// CSV with a `pid` (or `key`) column.
        pids: PathBuf,

        /// CSV with `key` (issn) and `value` (subject area) columns.
        subject_areas: PathBuf,

        /// Root of the partial-document tree.
        root: PathBuf,

        /// Directory for `exists.txt`, `created.txt` and `incomplete.txt`.
        /// Defaults to `tracking.dir`.
        #[arg(long)]
        tracking_dir: Option<PathBuf>,
    },

    /// Write registration shard lists and a launcher script.
    Shards {
        /// CSV with a `pid` (or `key`) column.
        pids: PathBuf,

        /// Root of the partial-document tree.
        root: PathBuf,

        /// Directory for the `.lst`, `.jsonl` and `.out` files.
        lists_dir: PathBuf,

        /// Shell script to write.
        script: PathBuf,

        /// List file prefix. Defaults to the pids CSV file stem.
        #[arg(long)]
        prefix: Option<String>,

        /// Number of shards. Defaults to `shards.count`.
        #[arg(long)]
        calls: Option<usize>,
    },

    /// Summarize a partial-document tree.
    Stats {
        /// Root of the partial-document tree.
        root: PathBuf,
    },
}

/// Separator for `kind` reading `input` when none was given.
fn default_separator(cfg: &Config, kind: RecordKind, input: &Path) -> char {
    let is_keywords = file_name(input).contains("keyword");
    if kind == RecordKind::TextAndLangAndYear && is_keywords {
        cfg.keyword_separator()
    } else {
        cfg.separator()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("isis_dataprep=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Decode {
            kind,
            input,
            output,
            tag,
            separator,
        } => {
            let languages = cfg.language_table();
            let tag = tag.unwrap_or_else(|| cfg.subfield_for(&file_name(&input)));
            let separator = separator.unwrap_or_else(|| default_separator(&cfg, kind, &input));
            let ctx = DecodeContext::new(tag, separator, &languages);
            writer::run_decode(
                &input,
                &output,
                kind,
                &ctx,
                &cfg.collection_filter(),
                progress.as_ref(),
            )?;
        }
        Commands::Merge { csv, root } => {
            let store = JsonFileStore::new(&root);
            let (label, summary) = merge::merge_csv(&csv, &store, progress.as_ref())?;
            summary.print(label);
        }
        Commands::Assemble {
            pids,
            subject_areas,
            root,
            tracking_dir,
        } => {
            let store = JsonFileStore::new(&root);
            let tracking_dir = tracking_dir.unwrap_or_else(|| cfg.tracking.dir.clone());
            let summary = assemble::run_assemble(
                &pids,
                &subject_areas,
                &store,
                &root,
                &tracking_dir,
                progress.as_ref(),
            )?;
            summary.print();
        }
        Commands::Shards {
            pids,
            root,
            lists_dir,
            script,
            prefix,
            calls,
        } => {
            let count = calls.unwrap_or(cfg.shards.count);
            if count == 0 {
                anyhow::bail!("--calls must be >= 1");
            }
            shards::run_shards(
                &pids,
                &root,
                &lists_dir,
                &script,
                prefix.as_deref(),
                count,
                &cfg.register_command(),
            )?;
        }
        Commands::Stats { root } => {
            stats::run_stats(&root)?;
        }
    }

    Ok(())
}
