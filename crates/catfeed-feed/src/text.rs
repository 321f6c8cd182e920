//! Plain-text cleanup for term names and attribute values.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Decodes entities, strips tags, collapses whitespace and trims.
///
/// Entities are decoded first so that encoded markup (`&lt;b&gt;`) is
/// stripped as well.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let decoded = decode_entities(raw);
    let stripped = TAG_RE.replace_all(&decoded, " ");
    WHITESPACE_RE
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Cleans every value and drops the ones that end up empty.
pub fn clean_list<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raw.into_iter()
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Decodes the common named entities plus decimal and hex references.
/// Unknown entities are left as written.
#[must_use]
pub fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures<'_>| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        _ => return None,
    };
    Some(decoded.to_owned())
}
