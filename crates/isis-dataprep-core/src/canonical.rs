//! Canonical per-article document.
//!
//! Once every partial label exists for a pid, the partial documents are
//! merged and reshaped into the registration schema:
//!
//! ```text
//! abstracts ─┐
//! keywords ──┼─▶ merge ─▶ CanonicalDocument ─▶ <pid>_rs.json
//! titles ────┤              ▲
//! references ┘              └── SubjectAreas (issn bucket fallback)
//! ```
//!
//! Titles, abstracts and keywords are flattened to `{lang, text}` pairs;
//! references go through [`ReferenceAttributes::from_row`].

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::DataLabel;
use crate::pid::Pid;
use crate::store::{PartialDocument, PartialStore};

/// Assembly failure for one pid. Never fatal to a batch.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("partial document '{label}' not found for {pid}")]
    MissingPartialDocument { pid: String, label: DataLabel },

    #[error("cannot read partial documents for {pid}: {source}")]
    Store {
        pid: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Subject areas per issn bucket, loaded once and passed by reference.
#[derive(Debug, Clone, Default)]
pub struct SubjectAreas {
    by_issn: HashMap<String, BTreeSet<String>>,
}

impl SubjectAreas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, issn: impl Into<String>, area: impl Into<String>) {
        self.by_issn
            .entry(issn.into())
            .or_default()
            .insert(area.into());
    }

    pub fn get(&self, issn: &str) -> Option<&BTreeSet<String>> {
        self.by_issn.get(issn)
    }

    /// Number of issn buckets.
    pub fn len(&self) -> usize {
        self.by_issn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_issn.is_empty()
    }
}

/// A language-tagged text (title, abstract or keyword).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangText {
    pub lang: String,
    pub text: String,
}

impl LangText {
    fn from_row(row: &Value) -> Self {
        Self {
            lang: str_field(row, "lang").to_string(),
            text: str_field(row, "text").to_string(),
        }
    }
}

/// Cited reference in registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAttributes {
    pub pub_year: String,
    pub vol: String,
    pub num: String,
    pub suppl: String,
    pub page: String,
    pub surname: String,
    pub organization_author: String,
    pub doi: String,
    pub journal: String,
    pub paper_title: Option<String>,
    pub source: String,
    pub issn: String,
    pub thesis_date: String,
    pub thesis_loc: String,
    pub thesis_country: String,
    pub thesis_degree: String,
    pub thesis_org: String,
    pub conf_date: String,
    pub conf_loc: String,
    pub conf_country: String,
    pub conf_name: String,
    pub conf_org: String,
    pub publisher_loc: String,
    pub publisher_country: String,
    pub publisher_name: String,
    pub edition: String,
    pub source_person_author_surname: String,
    pub source_organization_author: String,
}

impl ReferenceAttributes {
    /// Map a stored reference row. Every value is cut at its first `^`.
    pub fn from_row(row: &Value) -> Self {
        let attr = |key: &str| before_caret(str_field(row, key).trim()).to_string();
        let renamed = |key: &str| before_caret(str_field(row, key)).to_string();

        let paper_title = before_caret(before_caret(str_field(row, "article_title")).trim());

        Self {
            pub_year: str_field(row, "pub_date").chars().take(4).collect(),
            vol: attr("vol"),
            num: attr("num"),
            suppl: attr("suppl"),
            page: attr("page"),
            surname: attr("surname"),
            organization_author: renamed("corpauth"),
            doi: attr("doi"),
            journal: attr("journal"),
            paper_title: (!paper_title.is_empty()).then(|| paper_title.to_string()),
            source: attr("source"),
            issn: attr("issn"),
            thesis_date: attr("thesis_date"),
            thesis_loc: attr("thesis_loc"),
            thesis_country: attr("thesis_country"),
            thesis_degree: attr("thesis_degree"),
            thesis_org: attr("thesis_org"),
            conf_date: attr("conf_date"),
            conf_loc: attr("conf_loc"),
            conf_country: attr("conf_country"),
            conf_name: attr("conf_name"),
            conf_org: attr("conf_org"),
            publisher_loc: attr("publisher_loc"),
            publisher_country: attr("publisher_country"),
            publisher_name: attr("publisher_name"),
            edition: attr("edition"),
            source_person_author_surname: renamed("source_author"),
            source_organization_author: renamed("source_corpauth"),
        }
    }
}

/// Registration-ready article document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    pub network_collection: String,
    pub pid: String,
    pub main_lang: Option<String>,
    pub doi: Option<String>,
    pub pub_year: String,
    pub subject_areas: Vec<String>,
    pub paper_titles: Vec<LangText>,
    pub abstracts: Vec<LangText>,
    pub keywords: Vec<LangText>,
    pub references: Vec<ReferenceAttributes>,
}

impl CanonicalDocument {
    /// Reshape the union of all partial documents for `pid`.
    ///
    /// `pid` and `network_collection` come from the top level when both
    /// are present, else from the first abstract, keyword or title row
    /// carrying both, else from `pid` itself with an empty collection.
    pub fn from_merged(pid: &Pid, merged: &PartialDocument, subject_areas: &SubjectAreas) -> Self {
        let top = match (merged.get_str("pid"), merged.get_str("collection")) {
            (Some(p), Some(c)) if !p.is_empty() && !c.is_empty() => Some((p, c)),
            _ => None,
        };
        let (doc_pid, collection) = top
            .or_else(|| backfill_identity(merged))
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .unwrap_or_else(|| (pid.article().to_string(), String::new()));

        let texts = |label: DataLabel| -> Vec<LangText> {
            merged
                .rows(label.as_str())
                .iter()
                .map(LangText::from_row)
                .collect()
        };

        let own_areas: Vec<String> = merged
            .get("subject_areas")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();
        let areas: BTreeSet<String> = if own_areas.is_empty() {
            subject_areas
                .get(pid.issn_bucket())
                .cloned()
                .unwrap_or_default()
        } else {
            own_areas.into_iter().collect()
        };

        Self {
            network_collection: collection,
            pid: doc_pid,
            main_lang: merged.get_str("lang").map(str::to_string),
            doi: merged.get_str("doi").map(str::to_string),
            pub_year: pid.year().to_string(),
            subject_areas: areas.into_iter().collect(),
            paper_titles: texts(DataLabel::ArticleTitles),
            abstracts: texts(DataLabel::Abstracts),
            keywords: texts(DataLabel::Keywords),
            references: merged
                .rows(DataLabel::References.as_str())
                .iter()
                .map(ReferenceAttributes::from_row)
                .collect(),
        }
    }
}

/// Load every partial label for `pid` and build its canonical document.
pub fn assemble(
    store: &dyn PartialStore,
    pid: &Pid,
    subject_areas: &SubjectAreas,
) -> Result<CanonicalDocument, AssembleError> {
    let mut merged = PartialDocument::new();
    for label in DataLabel::ALL {
        let doc = store
            .load(pid, label)
            .map_err(|source| AssembleError::Store {
                pid: pid.to_string(),
                source,
            })?
            .ok_or_else(|| AssembleError::MissingPartialDocument {
                pid: pid.to_string(),
                label,
            })?;
        merged.merge_from(doc);
    }
    Ok(CanonicalDocument::from_merged(pid, &merged, subject_areas))
}

fn backfill_identity(merged: &PartialDocument) -> Option<(&str, &str)> {
    [
        DataLabel::Abstracts,
        DataLabel::Keywords,
        DataLabel::ArticleTitles,
    ]
    .into_iter()
    .filter_map(|label| merged.rows(label.as_str()).first())
    .find_map(|first| {
        let pid = first.get("pid").and_then(Value::as_str)?;
        let collection = first.get("collection").and_then(Value::as_str)?;
        Some((pid, collection))
    })
}

fn str_field<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("")
}

fn before_caret(value: &str) -> &str {
    value.split('^').next().unwrap_or_default()
}
