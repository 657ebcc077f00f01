//! # ISIS Dataprep Core
//!
//! Pure decoding and merge logic for legacy ISIS sequential exports:
//! subfield decoding, text normalization, language resolution, the
//! per-record-type field-set decoders, the merge store abstraction and
//! the canonical document shape.
//!
//! This crate performs no filesystem I/O. File readers, the JSON-file
//! merge store and the CLI live in the `isis-dataprep` crate.

pub mod canonical;
pub mod decode;
pub mod error;
pub mod lang;
pub mod models;
pub mod normalize;
pub mod pid;
pub mod store;
pub mod subfield;
