//! Text normalization for decoded ISIS values.
//!
//! Two flavors are exposed:
//!
//! - [`decode_entities`] only resolves HTML/XML character references and
//!   is used for free text that is kept verbatim (the `original` column).
//! - [`standardize_text`] / [`standardize_keyword`] run the full pipeline
//!   used for comparison keys: entity decoding, whitespace collapsing,
//!   diacritic stripping, upper-casing and edge-punctuation trimming.
//!
//! # Pipeline
//!
//! 1. Resolve `&name;`, `&#NN;` and `&#xHH;` references. Codes 128 to 159
//!    are read as Windows-1252, and the Latin-1 names also resolve without
//!    the `;`. Unknown names are left as written.
//! 2. Split on single spaces, drop empty tokens, trim each token, re-join
//!    with one space.
//! 3. NFKD-decompose and keep only ASCII characters.
//! 4. Upper-case.
//! 5. Drop leading non-alphanumeric characters one at a time; while the
//!    last character is not alphanumeric, drop the last *two*.
//!
//! Step 5 is asymmetric on purpose: downstream comparison keys were built
//! with this exact trim, so `"FOO."` becomes `"FO"`.

use quick_xml::escape::resolve_html5_entity;
use unicode_normalization::UnicodeNormalization;

/// Longest entity name worth looking up (`&CounterClockwiseContourIntegral;`).
const MAX_ENTITY_LEN: usize = 32;

/// Named references that also resolve without a trailing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr",
    "micro", "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm",
    "oslash", "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy",
    "sup1", "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml",
    "uuml", "yacute", "yen", "yuml",
];

/// Windows-1252 characters for codes 0x80..=0x9F. Unassigned slots keep
/// the C1 control.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{8D}', '\u{017D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{9D}', '\u{017E}', '\u{0178}',
];

/// Resolve HTML/XML numeric and named character references.
///
/// Malformed references are passed through untouched; invalid code
/// points become U+FFFD.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let resolved = match after.strip_prefix('#') {
            Some(num) => numeric_reference(num).map(|(ch, used)| (ch.to_string(), used + 1)),
            None => named_reference(after),
        };

        match resolved {
            Some((replacement, used)) => {
                out.push_str(&replacement);
                rest = &after[used..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// `NN`, `xHH` or `XHH` with an optional `;`. Returns the character and
/// the bytes consumed.
fn numeric_reference(num: &str) -> Option<(char, usize)> {
    let (digits, radix, prefix) = match num.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16, 1),
        None => (num, 10, 0),
    };
    let len = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    if len == 0 {
        return None;
    }
    let code = u32::from_str_radix(&digits[..len], radix).unwrap_or(u32::MAX);
    let ch = match code {
        0 => char::REPLACEMENT_CHARACTER,
        0x80..=0x9F => CP1252_HIGH[(code - 0x80) as usize],
        c => char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER),
    };
    let semi = usize::from(digits[len..].starts_with(';'));
    Some((ch, prefix + len + semi))
}

/// `name;`, or a Latin-1 name with no `;`. The name run stops at
/// whitespace, `<`, `&`, `#` or `;`. When the whole run is unknown, its
/// longest Latin-1 prefix is resolved and the rest kept as text.
fn named_reference(after: &str) -> Option<(String, usize)> {
    let end = after
        .char_indices()
        .take(MAX_ENTITY_LEN)
        .find(|&(_, c)| matches!(c, '\t' | '\n' | '\x0C' | ' ' | '<' | '&' | '#' | ';'))
        .map(|(i, _)| i)
        .unwrap_or_else(|| {
            after
                .char_indices()
                .nth(MAX_ENTITY_LEN)
                .map_or(after.len(), |(i, _)| i)
        });
    let name = &after[..end];
    if name.is_empty() {
        return None;
    }
    let terminated = after[end..].starts_with(';');

    if terminated {
        if let Some(value) = resolve_html5_entity(name) {
            return Some((value.to_string(), end + 1));
        }
    } else if LEGACY_ENTITIES.contains(&name) {
        return resolve_html5_entity(name).map(|v| (v.to_string(), end));
    }

    // Longest legacy prefix, at least two characters, shorter than the run.
    name.char_indices()
        .skip(2)
        .map(|(i, _)| i)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .find(|&i| LEGACY_ENTITIES.contains(&&name[..i]))
        .and_then(|i| resolve_html5_entity(&name[..i]).map(|v| (v.to_string(), i)))
}

/// Collapse runs of spaces and trim each space-separated token.
pub fn remove_extra_spaces(text: &str) -> String {
    text.split(' ')
        .filter(|w| !w.is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip diacritics via compatibility decomposition, keeping ASCII only.
pub fn remove_diacritics(text: &str) -> String {
    text.nfkd().filter(char::is_ascii).collect()
}

/// Full normalization pipeline for titles, abstracts and language text.
pub fn standardize_text(text: &str) -> String {
    let txt = decode_entities(text);
    let txt = remove_extra_spaces(&txt);
    let txt = remove_diacritics(&txt);
    trim_edges(txt.to_ascii_uppercase())
}

/// Normalization for keyword values.
///
/// Kept separate from [`standardize_text`] so keyword keys can diverge;
/// the pipeline is currently identical.
pub fn standardize_keyword(text: &str) -> String {
    let txt = decode_entities(text);
    let txt = remove_extra_spaces(&txt);
    let txt = remove_diacritics(&txt);
    trim_edges(txt.to_ascii_uppercase())
}

fn trim_edges(mut txt: String) -> String {
    let lead = txt
        .char_indices()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(txt.len());
    txt.drain(..lead);

    while txt.chars().last().is_some_and(|c| !c.is_alphanumeric()) {
        txt.pop();
        txt.pop();
    }
    txt
}
