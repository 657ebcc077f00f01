//! Decoded record types.
//!
//! Each ISIS export flavor decodes into one [`Record`] variant with a
//! fixed, statically declared column list. The CSV writer dispatches on
//! [`RecordKind`] for the header and on the decoded `Vec<Record>` length
//! for row expansion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The record shapes the decoders understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    TextAndLang,
    TextAndLangAndYear,
    KeyAndValue,
    Articles,
    References,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::TextAndLang,
        RecordKind::TextAndLangAndYear,
        RecordKind::KeyAndValue,
        RecordKind::Articles,
        RecordKind::References,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::TextAndLang => "text-and-lang",
            RecordKind::TextAndLangAndYear => "text-and-lang-and-year",
            RecordKind::KeyAndValue => "key-and-value",
            RecordKind::Articles => "articles",
            RecordKind::References => "references",
        }
    }

    /// CSV header for this kind, in column order.
    pub fn fieldnames(&self) -> &'static [&'static str] {
        match self {
            RecordKind::TextAndLang => TEXT_FIELDS,
            RecordKind::TextAndLangAndYear => DATED_TEXT_FIELDS,
            RecordKind::KeyAndValue => KEY_VALUE_FIELDS,
            RecordKind::Articles => ARTICLE_FIELDS,
            RecordKind::References => REFERENCE_FIELDS,
        }
    }

    /// Whether one input row may expand into several records.
    pub fn is_one_to_many(&self) -> bool {
        matches!(self, RecordKind::KeyAndValue)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace('_', "-");
        RecordKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = RecordKind::ALL.iter().map(|k| k.name()).collect();
                format!("unknown record type '{}'; expected one of {}", s, names.join(", "))
            })
    }
}

pub const TEXT_FIELDS: &[&str] = &["pid", "collection", "lang", "text", "original"];

pub const DATED_TEXT_FIELDS: &[&str] =
    &["pid", "collection", "lang", "text", "original", "pub_year"];

pub const KEY_VALUE_FIELDS: &[&str] = &["key", "collection", "value", "original"];

pub const ARTICLE_FIELDS: &[&str] = &[
    "pid", "collection", "aop_pid", "issn", "pub_date", "vol", "num", "suppl", "fpage", "lpage",
    "page_seq", "elocation", "doi", "path", "doctopic",
];

pub const REFERENCE_FIELDS: &[&str] = &[
    "pid",
    "collection",
    "pub_date",
    "vol",
    "num",
    "suppl",
    "page",
    "surname",
    "corpauth",
    "doi",
    "journal",
    "article_title",
    "source",
    "issn",
    "thesis_date",
    "thesis_loc",
    "thesis_country",
    "thesis_degree",
    "thesis_org",
    "conf_date",
    "conf_loc",
    "conf_country",
    "conf_name",
    "conf_org",
    "publisher_loc",
    "publisher_country",
    "publisher_name",
    "edition",
    "source_author",
    "source_corpauth",
];

/// Title, abstract or keyword-with-language row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    pub pid: String,
    pub collection: String,
    pub lang: String,
    /// Normalized comparison key.
    pub text: String,
    /// Text as found in the export, trimmed.
    pub original: String,
    pub pub_year: String,
}

/// One item of a `;`-separated value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueRecord {
    pub key: String,
    pub collection: String,
    pub value: String,
    pub original: String,
}

/// Article metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub pid: String,
    pub collection: String,
    pub aop_pid: String,
    pub issn: String,
    pub pub_date: String,
    pub vol: String,
    pub num: String,
    pub suppl: String,
    pub fpage: String,
    pub lpage: String,
    pub page_seq: String,
    pub elocation: String,
    pub doi: String,
    pub path: String,
    pub doctopic: String,
}

/// Cited reference row. Values are kept positionally, in
/// [`REFERENCE_FIELDS`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    values: Vec<String>,
}

impl ReferenceRecord {
    /// Build from values ordered as [`REFERENCE_FIELDS`].
    pub(crate) fn from_values(values: Vec<String>) -> Self {
        debug_assert_eq!(values.len(), REFERENCE_FIELDS.len());
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        REFERENCE_FIELDS
            .iter()
            .position(|f| *f == field)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn pid(&self) -> &str {
        &self.values[0]
    }

    pub fn collection(&self) -> &str {
        &self.values[1]
    }
}

/// A decoded row, one variant per record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    TextAndLang(TextRecord),
    TextAndLangAndYear(TextRecord),
    KeyAndValue(KeyValueRecord),
    Article(ArticleRecord),
    Reference(ReferenceRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::TextAndLang(_) => RecordKind::TextAndLang,
            Record::TextAndLangAndYear(_) => RecordKind::TextAndLangAndYear,
            Record::KeyAndValue(_) => RecordKind::KeyAndValue,
            Record::Article(_) => RecordKind::Articles,
            Record::Reference(_) => RecordKind::References,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Record::TextAndLang(r) | Record::TextAndLangAndYear(r) => &r.collection,
            Record::KeyAndValue(r) => &r.collection,
            Record::Article(r) => &r.collection,
            Record::Reference(r) => r.collection(),
        }
    }

    /// Column values in [`RecordKind::fieldnames`] order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Record::TextAndLang(r) => vec![
                r.pid.as_str(),
                r.collection.as_str(),
                r.lang.as_str(),
                r.text.as_str(),
                r.original.as_str(),
            ],
            Record::TextAndLangAndYear(r) => vec![
                r.pid.as_str(),
                r.collection.as_str(),
                r.lang.as_str(),
                r.text.as_str(),
                r.original.as_str(),
                r.pub_year.as_str(),
            ],
            Record::KeyAndValue(r) => vec![
                r.key.as_str(),
                r.collection.as_str(),
                r.value.as_str(),
                r.original.as_str(),
            ],
            Record::Article(r) => vec![
                r.pid.as_str(),
                r.collection.as_str(),
                r.aop_pid.as_str(),
                r.issn.as_str(),
                r.pub_date.as_str(),
                r.vol.as_str(),
                r.num.as_str(),
                r.suppl.as_str(),
                r.fpage.as_str(),
                r.lpage.as_str(),
                r.page_seq.as_str(),
                r.elocation.as_str(),
                r.doi.as_str(),
                r.path.as_str(),
                r.doctopic.as_str(),
            ],
            Record::Reference(r) => r.values.iter().map(String::as_str).collect(),
        }
    }
}

/// Label of a partial document; also the file-name suffix under the
/// merge store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLabel {
    Abstracts,
    Keywords,
    ArticleTitles,
    References,
}

impl DataLabel {
    /// Every label a canonical document needs, in lookup order.
    pub const ALL: [DataLabel; 4] = [
        DataLabel::Abstracts,
        DataLabel::Keywords,
        DataLabel::ArticleTitles,
        DataLabel::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataLabel::Abstracts => "abstracts",
            DataLabel::Keywords => "keywords",
            DataLabel::ArticleTitles => "article_titles",
            DataLabel::References => "references",
        }
    }

    /// First label whose name occurs in `filename`.
    pub fn from_filename(filename: &str) -> Option<DataLabel> {
        DataLabel::ALL
            .into_iter()
            .find(|label| filename.contains(label.as_str()))
    }
}

impl fmt::Display for DataLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
