//! # ISIS Dataprep
//!
//! Batch migration of legacy ISIS sequential exports into per-article JSON
//! documents ready for registration.
//!
//! Decoding rules, normalization and the canonical document shape live in
//! [`isis_dataprep_core`]; this crate adds the file readers and writers,
//! the JSON-file merge store, the batch runners and the `dataprep` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────┐   ┌──────────────┐   ┌────────────┐
//! │ .seq files │──▶│  decode  │──▶│  .csv (+err) │──▶│   merge    │
//! │ UTF-8/L1   │   │ per kind │   │  per label   │   │ JSON store │
//! └────────────┘   └──────────┘   └──────────────┘   └─────┬──────┘
//!                                                          │
//!                     ┌──────────────┐   ┌──────────┐      │
//!                     │ shard .sh    │◀──│ assemble │◀─────┘
//!                     │ + .lst lists │   │ _rs.json │
//!                     └──────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dataprep decode text-and-lang-and-year abstracts.seq out/abstracts.csv
//! dataprep merge out/abstracts.csv ./json
//! dataprep assemble pids.csv subject_areas.csv ./json
//! dataprep shards pids.csv ./json ./lists ./register.sh --calls 8
//! dataprep stats ./json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`seq`] | Sequential file reader with Latin-1 fallback |
//! | [`writer`] | CSV writer with the `.err` side file |
//! | [`csv_rows`] | Header-driven CSV reading |
//! | [`json_store`] | JSON-file merge store |
//! | [`merge`] | CSV to partial documents |
//! | [`assemble`] | Partial documents to canonical documents |
//! | [`tracking`] | `exists` / `created` / `incomplete` logs |
//! | [`shards`] | Registration shard scripts |
//! | [`stats`] | Merge store statistics |
//! | [`progress`] | Progress reporting on stderr |

pub mod assemble;
pub mod config;
pub mod csv_rows;
pub mod json_store;
pub mod merge;
pub mod progress;
pub mod seq;
pub mod shards;
pub mod stats;
pub mod tracking;
pub mod writer;
