//! Record field-set decoders.
//!
//! One decoder per ISIS export flavor. Each maps a raw row (cells split
//! on the row separator) to typed records, or fails with a
//! [`DecodeError`]; none of them returns a partially filled record.
//!
//! | Kind | Cells | Output |
//! |------|-------|--------|
//! | `text-and-lang` | `id, text[, year]` | one [`TextRecord`] |
//! | `text-and-lang-and-year` | `id, text, year` | one [`TextRecord`] |
//! | `key-and-value` | `id, value` | one [`KeyValueRecord`] per `;` item |
//! | `articles` | 11 positional cells | one [`ArticleRecord`] |
//! | `references` | 28 positional cells | one [`ReferenceRecord`] |

use std::collections::HashSet;

use crate::error::DecodeError;
use crate::lang::{english_override, extract_title_language, LangShape, LanguageTable};
use crate::models::{ArticleRecord, KeyValueRecord, Record, RecordKind, ReferenceRecord, TextRecord};
use crate::normalize::{standardize_keyword, standardize_text};
use crate::pid::{split_identifier, Pid};
use crate::subfield::{decode_subfields, TAG_INTRODUCER};

/// Default row separator.
pub const DEFAULT_SEPARATOR: char = '|';

/// Collections whose records are double counted elsewhere.
pub const DEFAULT_SKIP_COLLECTIONS: &[&str] = &["sss", "spa", "psi", "rve", "rvt"];

/// Input cells of a reference row, in export order.
const REFERENCE_INPUT_LEN: usize = 28;

/// Input cells of an article row, in export order.
const ARTICLE_INPUT_LEN: usize = 11;

/// Per-file decoding parameters.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Subfield holding the text body (`a`, `t`, `k` or `*`).
    pub tag: char,
    /// Row separator the cells were split on.
    pub separator: char,
    pub languages: &'a LanguageTable,
}

impl<'a> DecodeContext<'a> {
    pub fn new(tag: char, separator: char, languages: &'a LanguageTable) -> Self {
        Self {
            tag,
            separator,
            languages,
        }
    }
}

/// Decode one raw row as `kind`.
///
/// Every kind yields exactly one record except `key-and-value`, which
/// yields one per list item.
pub fn decode_row(
    kind: RecordKind,
    row: &[String],
    ctx: &DecodeContext<'_>,
) -> Result<Vec<Record>, DecodeError> {
    let records = match kind {
        RecordKind::TextAndLang => vec![Record::TextAndLang(text_and_lang(row, ctx)?)],
        RecordKind::TextAndLangAndYear => {
            vec![Record::TextAndLangAndYear(text_and_lang_and_year(row, ctx)?)]
        }
        RecordKind::KeyAndValue => key_and_value(row, ctx)?
            .into_iter()
            .map(Record::KeyAndValue)
            .collect(),
        RecordKind::Articles => vec![Record::Article(articles(row)?)],
        RecordKind::References => vec![Record::Reference(references(row)?)],
    };
    Ok(records)
}

/// Older text row: `id|text`, or `id|text|year` with the year ignored.
/// Language truncated to two letters.
pub fn text_and_lang(row: &[String], ctx: &DecodeContext<'_>) -> Result<TextRecord, DecodeError> {
    decode_text(row, ctx, false)
}

/// Current text row: `id|text|year`. Full language run plus the English
/// override on normalized text.
pub fn text_and_lang_and_year(
    row: &[String],
    ctx: &DecodeContext<'_>,
) -> Result<TextRecord, DecodeError> {
    decode_text(row, ctx, true)
}

fn decode_text(
    row: &[String],
    ctx: &DecodeContext<'_>,
    dated: bool,
) -> Result<TextRecord, DecodeError> {
    let sep = ctx.separator.to_string();
    // Beyond 3 cells, the text itself contained the separator.
    let raw_text = match (row.len(), dated) {
        (0 | 1, _) => {
            return Err(DecodeError::structural(format!(
                "text row needs at least 2 cells, got {}",
                row.len()
            )))
        }
        (2 | 3, _) => row[1].clone(),
        (n, true) => row[1..n - 1].join(&sep),
        (_, false) => row[1..].join(&sep),
    };

    let (pid, collection) = split_identifier(&row[0])?;
    let pid = Pid::parse(&pid)?;

    if raw_text.is_empty() {
        return Err(DecodeError::EmptyField { field: "text" });
    }

    let blob = if ctx.tag == 't' {
        extract_title_language(&raw_text)
    } else {
        raw_text
    };

    let subfields = decode_subfields(&blob, TAG_INTRODUCER);
    let original = subfields
        .get_or_wildcard(ctx.tag)
        .ok_or(DecodeError::EmptyField { field: "text" })?
        .to_string();
    let text = standardize_text(&original);

    let lang = if dated {
        let lang = ctx.languages.resolve(subfields.get('l'), LangShape::FullRun);
        english_override(&text, lang)
    } else {
        ctx.languages.resolve(subfields.get('l'), LangShape::TwoLetter)
    };

    Ok(TextRecord {
        pub_year: pid.year().to_string(),
        pid: pid.as_str().to_string(),
        collection,
        lang,
        text,
        original,
    })
}

/// `id|value` where value is a `;`- or `/`-separated list. Every item is
/// kept, blanks included; `original` is the item as split.
pub fn key_and_value(
    row: &[String],
    ctx: &DecodeContext<'_>,
) -> Result<Vec<KeyValueRecord>, DecodeError> {
    let value = match row.len() {
        0 | 1 => {
            return Err(DecodeError::structural(format!(
                "key/value row needs 2 cells, got {}",
                row.len()
            )))
        }
        2 => row[1].clone(),
        _ => row[1..].join(&ctx.separator.to_string()),
    };

    let (key, collection) = split_identifier(&row[0])?;
    if value.is_empty() {
        return Err(DecodeError::EmptyField { field: "value" });
    }

    let items = value
        .replace('/', ";")
        .split(';')
        .map(|item| KeyValueRecord {
            key: key.clone(),
            collection: collection.clone(),
            value: standardize_keyword(item),
            original: item.to_string(),
        })
        .collect();
    Ok(items)
}

/// Positional article row:
/// `pid|aop_pid|issn|pub_date|vol|num|suppl|page|doi|path|doctopic`.
///
/// `page` is itself subfield tagged: `^f` first page, `^l` last page,
/// `^s` sequence, `^e` electronic location.
pub fn articles(row: &[String]) -> Result<ArticleRecord, DecodeError> {
    if row.len() != ARTICLE_INPUT_LEN {
        return Err(DecodeError::structural(format!(
            "article row needs {} cells, got {}",
            ARTICLE_INPUT_LEN,
            row.len()
        )));
    }
    let (pid, collection) = split_identifier(&row[0])?;
    let page = decode_subfields(&row[7], TAG_INTRODUCER);

    Ok(ArticleRecord {
        pid,
        collection,
        aop_pid: row[1].clone(),
        issn: row[2].clone(),
        pub_date: row[3].clone(),
        vol: row[4].clone(),
        num: row[5].clone(),
        suppl: row[6].clone(),
        fpage: page.get_or_empty('f').to_string(),
        lpage: page.get_or_empty('l').to_string(),
        page_seq: page.get_or_empty('s').to_string(),
        elocation: page.get_or_empty('e').to_string(),
        doi: row[8].clone(),
        path: row[9].clone(),
        doctopic: row[10].clone(),
    })
}

/// Positional reference row (28 cells).
///
/// `num` may carry a `^s` supplement, split into `suppl`; `article_title`
/// may carry a trailing `^l` language, which is dropped.
pub fn references(row: &[String]) -> Result<ReferenceRecord, DecodeError> {
    if row.len() != REFERENCE_INPUT_LEN {
        return Err(DecodeError::structural(format!(
            "reference row needs {} cells, got {}",
            REFERENCE_INPUT_LEN,
            row.len()
        )));
    }
    let (pid, collection) = split_identifier(&row[0])?;
    let (num, suppl) = peel(&row[3], "^s");
    let (article_title, _lang) = peel(&row[9], "^l");

    let mut values = Vec::with_capacity(REFERENCE_INPUT_LEN + 2);
    values.push(pid);
    values.push(collection);
    values.push(row[1].clone()); // pub_date
    values.push(row[2].clone()); // vol
    values.push(num);
    values.push(suppl);
    values.push(row[4].clone()); // page
    values.extend(row[5..9].iter().cloned()); // surname, corpauth, doi, journal
    values.push(article_title);
    values.extend(row[10..].iter().cloned());

    Ok(ReferenceRecord::from_values(values))
}

/// Split `value` at the first `marker`, returning the head and the text
/// up to the next `marker`.
fn peel(value: &str, marker: &str) -> (String, String) {
    match value.split_once(marker) {
        Some((head, rest)) => (
            head.to_string(),
            rest.split(marker).next().unwrap_or_default().to_string(),
        ),
        None => (value.to_string(), String::new()),
    }
}

/// Drops records from collections known to be double counted.
#[derive(Debug, Clone, Default)]
pub struct CollectionFilter {
    skip: HashSet<String>,
}

impl CollectionFilter {
    pub fn new<I, S>(collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip: collections.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SKIP_COLLECTIONS.iter().copied())
    }

    pub fn is_skipped(&self, collection: &str) -> bool {
        self.skip.contains(collection)
    }

    pub fn check(&self, record: &Record) -> Result<(), DecodeError> {
        let collection = record.collection();
        if self.is_skipped(collection) {
            Err(DecodeError::CollectionFiltered {
                collection: collection.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PID: &str = "S0001-37652020000100001";

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn ctx(tag: char, languages: &LanguageTable) -> DecodeContext<'_> {
        DecodeContext::new(tag, '|', languages)
    }

    #[test]
    fn text_and_lang_basic() {
        let langs = LanguageTable::new();
        let id = format!("{PID}^cscl");
        let rec = text_and_lang(&row(&[&id, "^aSaúde  pública.^lPT"]), &ctx('a', &langs)).unwrap();
        assert_eq!(rec.pid, PID);
        assert_eq!(rec.collection, "scl");
        assert_eq!(rec.lang, "pt");
        assert_eq!(rec.text, "SAUDE PUBLIC");
        assert_eq!(rec.original, "Saúde  pública.");
        assert_eq!(rec.pub_year, "2020");
    }

    #[test]
    fn text_and_lang_is_idempotent() {
        let langs = LanguageTable::new();
        let raw = row(&[PID, "^aOcean^len"]);
        let a = text_and_lang(&raw, &ctx('a', &langs)).unwrap();
        let b = text_and_lang(&raw, &ctx('a', &langs)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn text_absorbs_separator_fragments() {
        let langs = LanguageTable::new();
        let rec = text_and_lang(&row(&[PID, "^aA", "B", "C^len"]), &ctx('a', &langs)).unwrap();
        assert_eq!(rec.original, "A|B|C");
        assert_eq!(rec.lang, "en");

        let rec = text_and_lang_and_year(&row(&[PID, "^aA", "B^len", "2020"]), &ctx('a', &langs))
            .unwrap();
        assert_eq!(rec.original, "A|B");
    }

    #[test]
    fn text_and_lang_third_cell_is_year() {
        let langs = LanguageTable::new();
        let rec = text_and_lang(&row(&[PID, "^lpt^aOceano", "2020"]), &ctx('a', &langs)).unwrap();
        assert_eq!(rec.original, "Oceano");
        assert_eq!(rec.text, "OCEANO");
        assert_eq!(rec.lang, "pt");
    }

    #[test]
    fn text_falls_back_to_wildcard() {
        let langs = LanguageTable::new();
        let rec = text_and_lang(&row(&[PID, "Plain body"]), &ctx('a', &langs)).unwrap();
        assert_eq!(rec.original, "Plain body");
        assert_eq!(rec.lang, "un");

        let rec = text_and_lang_and_year(&row(&[PID, "^aOceano", "2020"]), &ctx('a', &langs))
            .unwrap();
        assert_eq!(rec.lang, "unknown");
    }

    #[test]
    fn text_rejects_bad_pid() {
        let langs = LanguageTable::new();
        let err = text_and_lang(&row(&["S0001^cscl", "^aX"]), &ctx('a', &langs)).unwrap_err();
        assert!(matches!(err, DecodeError::Structural(_)));
    }

    #[test]
    fn text_rejects_empty_body() {
        let langs = LanguageTable::new();
        let err = text_and_lang(&row(&[PID, ""]), &ctx('a', &langs)).unwrap_err();
        assert_eq!(err, DecodeError::EmptyField { field: "text" });
        let err = text_and_lang(&row(&[PID, "^a  ^lpt"]), &ctx('a', &langs)).unwrap_err();
        assert_eq!(err, DecodeError::EmptyField { field: "text" });
        assert!(text_and_lang(&row(&[PID]), &ctx('a', &langs)).is_err());
    }

    #[test]
    fn dated_text_english_override() {
        let langs = LanguageTable::new();
        let rec = text_and_lang_and_year(
            &row(&[PID, "^kA study of the ocean^lpt", "2020"]),
            &ctx('k', &langs),
        )
        .unwrap();
        assert_eq!(rec.text, "A STUDY OF THE OCEAN");
        assert_eq!(rec.lang, "en");

        let rec = text_and_lang_and_year(
            &row(&[PID, "^kO estudo do oceano^lpt", "2020"]),
            &ctx('k', &langs),
        )
        .unwrap();
        assert_eq!(rec.lang, "pt");
    }

    #[test]
    fn dated_text_keeps_full_language_run() {
        let langs = LanguageTable::new();
        let rec = text_and_lang_and_year(&row(&[PID, "^aTexto^lspa", "2020"]), &ctx('a', &langs))
            .unwrap();
        assert_eq!(rec.lang, "spa");
    }

    #[test]
    fn title_language_marker() {
        let langs = LanguageTable::new();
        let rec = text_and_lang(
            &row(&[PID, "[title language=es]Corrientes marinas"]),
            &ctx('t', &langs),
        )
        .unwrap();
        assert_eq!(rec.lang, "es");
        assert_eq!(rec.original, "Corrientes marinas");

        let rec = text_and_lang(
            &row(&[PID, "^t[title language=es]Corrientes^len"]),
            &ctx('t', &langs),
        )
        .unwrap();
        assert_eq!(rec.lang, "en");
        assert_eq!(rec.original, "Corrientes");

        let rec = text_and_lang(
            &row(&[PID, "Junk [title language=es]Corrientes"]),
            &ctx('t', &langs),
        )
        .unwrap();
        assert_eq!(rec.original, "Corrientes");
        assert_eq!(rec.lang, "es");
    }

    #[test]
    fn key_and_value_expands() {
        let langs = LanguageTable::new();
        let recs = key_and_value(&row(&[PID, "Saúde/Epidemiologia; Ética"]), &ctx('*', &langs))
            .unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].key, PID);
        assert_eq!(recs[0].collection, "");
        assert_eq!(recs[0].value, "SAUDE");
        assert_eq!(recs[2].value, "ETICA");
        assert_eq!(recs[2].original, " Ética");
    }

    #[test]
    fn key_and_value_keeps_every_item() {
        let langs = LanguageTable::new();
        let recs = key_and_value(&row(&[PID, "a; b;;c"]), &ctx('*', &langs)).unwrap();
        let originals: Vec<&str> = recs.iter().map(|r| r.original.as_str()).collect();
        assert_eq!(originals, vec!["a", " b", "", "c"]);
        assert_eq!(recs[1].value, "B");
        assert_eq!(recs[2].value, "");
    }

    #[test]
    fn key_and_value_collection_and_empty() {
        let langs = LanguageTable::new();
        let recs = key_and_value(&row(&["K1^cscl", "x"]), &ctx('*', &langs)).unwrap();
        assert_eq!(recs[0].collection, "scl");
        assert_eq!(
            key_and_value(&row(&["K1", ""]), &ctx('*', &langs)).unwrap_err(),
            DecodeError::EmptyField { field: "value" }
        );
        assert_eq!(
            key_and_value(&row(&["K1", " ; / "]), &ctx('*', &langs))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn articles_page_subfields() {
        let rec = articles(&row(&[
            "S0001^c01", "", "0001-0001", "20200000", "1", "2", "", "^f10^l20", "10.1/x", "/path",
            "oa",
        ]))
        .unwrap();
        assert_eq!(rec.pid, "S0001");
        assert_eq!(rec.collection, "01");
        assert_eq!(rec.fpage, "10");
        assert_eq!(rec.lpage, "20");
        assert_eq!(rec.page_seq, "");
        assert_eq!(rec.elocation, "");
        assert_eq!(rec.doi, "10.1/x");
        assert_eq!(rec.doctopic, "oa");
    }

    #[test]
    fn articles_wrong_length() {
        assert!(articles(&row(&["S0001^c01", "x"])).is_err());
    }

    fn reference_row() -> Vec<String> {
        let mut cells = vec![String::new(); 28];
        cells[0] = "S0011-8516202100010001000003^csza".into();
        cells[1] = "20160000".into();
        cells[2] = "34".into();
        cells[3] = "52^s1".into();
        cells[4] = "6700-6".into();
        cells[5] = "Paterson".into();
        cells[8] = "Vaccine".into();
        cells[9] = "Vaccine hesitancy^len".into();
        cells[11] = "0264-410X".into();
        cells[27] = "WHO".into();
        cells
    }

    #[test]
    fn references_peel_supplement_and_title_lang() {
        let rec = references(&reference_row()).unwrap();
        assert_eq!(rec.pid(), "S0011-8516202100010001000003");
        assert_eq!(rec.collection(), "sza");
        assert_eq!(rec.get("num"), Some("52"));
        assert_eq!(rec.get("suppl"), Some("1"));
        assert_eq!(rec.get("article_title"), Some("Vaccine hesitancy"));
        assert_eq!(rec.get("journal"), Some("Vaccine"));
        assert_eq!(rec.get("issn"), Some("0264-410X"));
        assert_eq!(rec.get("source_corpauth"), Some("WHO"));
        assert_eq!(
            Record::Reference(rec).values().len(),
            RecordKind::References.fieldnames().len()
        );
    }

    #[test]
    fn references_wrong_length() {
        let mut cells = reference_row();
        cells.pop();
        assert!(matches!(
            references(&cells).unwrap_err(),
            DecodeError::Structural(_)
        ));
    }

    #[test]
    fn collection_filter() {
        let filter = CollectionFilter::with_defaults();
        let rec = articles(&row(&[
            "S0001^csss", "", "", "", "", "", "", "", "", "", "",
        ]))
        .unwrap();
        assert_eq!(
            filter.check(&Record::Article(rec)).unwrap_err(),
            DecodeError::CollectionFiltered {
                collection: "sss".into()
            }
        );
        assert!(!filter.is_skipped("scl"));
    }
}
