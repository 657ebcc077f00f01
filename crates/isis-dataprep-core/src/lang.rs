//! Language resolution for text-bearing records.
//!
//! The raw `^l` subfield is noisy: `pt`, `PT`, `(en)`, `english`, entity
//! escaped names. Resolution keeps only alphabetic characters, lower-cases
//! them, maps full names through the configured [`LanguageTable`], and
//! then shapes the result for the row generation being decoded.

use std::collections::HashMap;

use crate::normalize::decode_entities;

/// Language assigned when nothing usable is present.
pub const UNKNOWN: &str = "unknown";

/// Marker some title exports embed instead of a `^l` subfield.
pub const TITLE_LANGUAGE_MARKER: &str = "[title language=";

/// How the resolved alphabetic run is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangShape {
    /// Older row shape: exactly two letters, `unknown` when fewer remain.
    TwoLetter,
    /// Current row shape: the full alphabetic run.
    FullRun,
}

/// Language-name to code table, built once from configuration and
/// passed by reference to the decoders.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    names: HashMap<String, String>,
}

impl LanguageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, code)` pairs. Names are matched on their
    /// lower-cased alphabetic characters.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let names = pairs
            .into_iter()
            .map(|(k, v)| (alpha_lower(k.as_ref()), v.into()))
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a raw `^l` value. A missing value reads as `unknown`, so
    /// the two-letter shape turns it into `un`.
    pub fn resolve(&self, raw: Option<&str>, shape: LangShape) -> String {
        let raw = raw.unwrap_or(UNKNOWN);
        let run = alpha_lower(&decode_entities(raw));
        let run = self.names.get(&run).cloned().unwrap_or(run);

        match shape {
            LangShape::TwoLetter => {
                let two: String = run.chars().take(2).collect();
                if two.chars().count() < 2 {
                    UNKNOWN.to_string()
                } else {
                    two
                }
            }
            LangShape::FullRun if run.is_empty() => UNKNOWN.to_string(),
            LangShape::FullRun => run,
        }
    }
}

fn alpha_lower(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Force English when normalized (upper-cased) text contains `" THE "`.
pub fn english_override(normalized_text: &str, lang: String) -> String {
    if lang != "en" && normalized_text.contains(" THE ") {
        "en".to_string()
    } else {
        lang
    }
}

/// Pull a `[title language=XX]` marker out of a title blob.
///
/// Everything up to the marker's closing `]` is dropped, including text
/// before the marker. Without a `]` the blob is kept from the marker on.
/// When the blob has no `^l` subfield, the two-letter code is appended
/// as one. Blobs without the marker are returned unchanged.
pub fn extract_title_language(text: &str) -> String {
    let Some(start) = text.find(TITLE_LANGUAGE_MARKER) else {
        return text.to_string();
    };
    let marked = &text[start..];
    let kept = match marked.find(']') {
        Some(close) => &marked[close + 1..],
        None => marked,
    };
    let code: String = alpha_lower(&marked[TITLE_LANGUAGE_MARKER.len()..])
        .chars()
        .take(2)
        .collect();

    let mut cleaned = kept.to_string();
    if !marked.contains("^l") && !code.is_empty() {
        cleaned.push_str("^l");
        cleaned.push_str(&code);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_letter_shape() {
        let table = LanguageTable::new();
        assert_eq!(table.resolve(Some("PT"), LangShape::TwoLetter), "pt");
        assert_eq!(table.resolve(Some("(en)"), LangShape::TwoLetter), "en");
        assert_eq!(table.resolve(Some("spa"), LangShape::TwoLetter), "sp");
        assert_eq!(table.resolve(Some("e"), LangShape::TwoLetter), UNKNOWN);
        assert_eq!(table.resolve(None, LangShape::TwoLetter), "un");
        assert_eq!(table.resolve(None, LangShape::FullRun), UNKNOWN);
    }

    #[test]
    fn full_run_shape() {
        let table = LanguageTable::new();
        assert_eq!(table.resolve(Some("Spa."), LangShape::FullRun), "spa");
        assert_eq!(table.resolve(Some("12"), LangShape::FullRun), UNKNOWN);
    }

    #[test]
    fn table_maps_names() {
        let table = LanguageTable::from_pairs([("English", "en"), ("português", "pt")]);
        assert_eq!(table.resolve(Some("english"), LangShape::FullRun), "en");
        assert_eq!(table.resolve(Some("Portugu&ecirc;s"), LangShape::TwoLetter), "pt");
    }

    #[test]
    fn english_override_rules() {
        assert_eq!(english_override("A STUDY OF THE OCEAN", "pt".into()), "en");
        assert_eq!(english_override("O ESTUDO DO OCEANO", "pt".into()), "pt");
        assert_eq!(english_override("THE OCEAN", "es".into()), "es");
    }

    #[test]
    fn title_marker_injects_lang() {
        assert_eq!(
            extract_title_language("[title language=en]Ocean currents"),
            "Ocean currents^len"
        );
        assert_eq!(
            extract_title_language("^t[title language=es]Corrientes^les"),
            "Corrientes^les"
        );
        assert_eq!(extract_title_language("Plain title"), "Plain title");
    }

    #[test]
    fn title_marker_drops_prefix() {
        assert_eq!(
            extract_title_language("Junk [title language=es]Corrientes"),
            "Corrientes^les"
        );
        assert_eq!(
            extract_title_language("Junk [title language=es Corrientes"),
            "[title language=es Corrientes^les"
        );
    }
}
