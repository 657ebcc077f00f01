//! TOML configuration parsing and validation.
//!
//! Every section is optional; a missing config file means built-in
//! defaults. Example:
//!
//! ```toml
//! [decode]
//! separator = "|"
//! keyword_separator = "~"
//! skip_collections = ["sss", "spa", "psi", "rve", "rvt"]
//!
//! [decode.subfields]
//! "abstracts.seq" = "a"
//! "article_titles.seq" = "t"
//!
//! [languages]
//! english = "en"
//! portugues = "pt"
//!
//! [tracking]
//! dir = "./logs"
//!
//! [shards]
//! count = 8
//! register_command = "python rs/app.py"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use isis_dataprep_core::decode::{CollectionFilter, DEFAULT_SEPARATOR, DEFAULT_SKIP_COLLECTIONS};
use isis_dataprep_core::lang::LanguageTable;
use isis_dataprep_core::subfield::{TAG_INTRODUCER, WILDCARD};

/// Environment variable overriding `shards.register_command`.
pub const REGISTER_COMMAND_ENV: &str = "RS_APP_CALL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub decode: DecodeConfig,
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub shards: ShardsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DecodeConfig {
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_keyword_separator")]
    pub keyword_separator: String,
    #[serde(default = "default_skip_collections")]
    pub skip_collections: Vec<String>,
    #[serde(default = "default_subfields")]
    pub subfields: BTreeMap<String, String>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            keyword_separator: default_keyword_separator(),
            skip_collections: default_skip_collections(),
            subfields: default_subfields(),
        }
    }
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}
fn default_keyword_separator() -> String {
    "~".to_string()
}
fn default_skip_collections() -> Vec<String> {
    DEFAULT_SKIP_COLLECTIONS
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_subfields() -> BTreeMap<String, String> {
    [
        ("abstracts.seq", "a"),
        ("article_titles.seq", "t"),
        ("keywords.seq", "k"),
        ("title_mission.seq", "*"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    #[serde(default = "default_tracking_dir")]
    pub dir: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            dir: default_tracking_dir(),
        }
    }
}

fn default_tracking_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShardsConfig {
    #[serde(default = "default_shard_count")]
    pub count: usize,
    #[serde(default = "default_register_command")]
    pub register_command: String,
}

impl Default for ShardsConfig {
    fn default() -> Self {
        Self {
            count: default_shard_count(),
            register_command: default_register_command(),
        }
    }
}

fn default_shard_count() -> usize {
    4
}
fn default_register_command() -> String {
    "python rs/app.py".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Row separator for most record types.
    pub fn separator(&self) -> char {
        single_char(&self.decode.separator).unwrap_or(DEFAULT_SEPARATOR)
    }

    /// Row separator for keyword exports of the dated text shape.
    pub fn keyword_separator(&self) -> char {
        single_char(&self.decode.keyword_separator).unwrap_or('~')
    }

    /// Subfield tag holding the text body for an input file name.
    pub fn subfield_for(&self, file_name: &str) -> char {
        self.decode
            .subfields
            .get(file_name)
            .and_then(|t| single_char(t))
            .unwrap_or(WILDCARD)
    }

    pub fn collection_filter(&self) -> CollectionFilter {
        CollectionFilter::new(self.decode.skip_collections.iter().cloned())
    }

    pub fn language_table(&self) -> LanguageTable {
        LanguageTable::from_pairs(self.languages.iter())
    }

    /// Command prefix written into shard scripts.
    pub fn register_command(&self) -> String {
        std::env::var(REGISTER_COMMAND_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.shards.register_command.clone())
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` when it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    for (name, sep) in [
        ("decode.separator", &config.decode.separator),
        ("decode.keyword_separator", &config.decode.keyword_separator),
    ] {
        match single_char(sep) {
            Some(TAG_INTRODUCER) => bail!("{} must not be '{}'", name, TAG_INTRODUCER),
            Some(_) => {}
            None => bail!("{} must be exactly one character, got {:?}", name, sep),
        }
    }

    for (file, tag) in &config.decode.subfields {
        if single_char(tag).is_none() {
            bail!(
                "decode.subfields.\"{}\" must be exactly one character, got {:?}",
                file,
                tag
            );
        }
    }

    if config.shards.count == 0 {
        bail!("shards.count must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.separator(), '|');
        assert_eq!(config.keyword_separator(), '~');
        assert_eq!(config.subfield_for("abstracts.seq"), 'a');
        assert_eq!(config.subfield_for("article_titles.seq"), 't');
        assert_eq!(config.subfield_for("other.seq"), '*');
        assert!(config.collection_filter().is_skipped("sss"));
        assert_eq!(config.shards.count, 4);
    }

    #[test]
    fn overrides() {
        let config = parse(
            r##"
[decode]
separator = "#"
skip_collections = ["xyz"]

[decode.subfields]
"resumos.seq" = "r"

[languages]
english = "en"
"##,
        )
        .unwrap();
        assert_eq!(config.separator(), '#');
        assert_eq!(config.subfield_for("resumos.seq"), 'r');
        assert_eq!(config.subfield_for("abstracts.seq"), '*');
        assert!(config.collection_filter().is_skipped("xyz"));
        assert!(!config.collection_filter().is_skipped("sss"));
        assert_eq!(config.language_table().len(), 1);
    }

    #[test]
    fn example_config_parses() {
        let config = parse(include_str!("../config/dataprep.example.toml")).unwrap();
        assert_eq!(config.language_table().len(), 5);
        assert_eq!(config.tracking.dir, PathBuf::from("./logs"));
    }

    #[test]
    fn rejects_bad_separator() {
        assert!(parse("[decode]\nseparator = \"||\"").is_err());
        assert!(parse("[decode]\nseparator = \"^\"").is_err());
    }

    #[test]
    fn rejects_zero_shards() {
        assert!(parse("[shards]\ncount = 0").is_err());
    }

    #[test]
    fn rejects_long_subfield_tag() {
        assert!(parse("[decode.subfields]\n\"a.seq\" = \"ab\"").is_err());
    }
}
