//! Tolerant extraction of tag contents from semi-structured feed markup.
//!
//! Upstream feeds are not guaranteed to be well-formed XML, so nothing in
//! here validates structure or ever fails: a tag that cannot be found (or a
//! pattern that cannot be built) yields an empty string, which callers treat
//! as a missing field.

use once_cell::sync::Lazy;
use regex::Regex;

static ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<item[\s\S]*?</item>").expect("item pattern"));

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#\d+|#[xX][0-9a-fA-F]+|\w+);").expect("entity pattern"));

/// Inner text of the first matching element, case-insensitively and tolerant
/// of attributes on the opening tag. Empty string when absent.
pub fn extract_tag(fragment: &str, tag: &str) -> String {
    let pattern = format!(r"(?is)<{0}[^>]*>(.*?)</{0}>", regex::escape(tag));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    re.captures(fragment)
        .and_then(|caps| caps.get(1))
        .map(|m| sanitize_text(m.as_str()))
        .unwrap_or_default()
}

/// Ordered fallback over candidate tag names: the first non-empty match wins.
pub fn extract_first(fragment: &str, tags: &[&str]) -> String {
    for tag in tags {
        let value = extract_tag(fragment, tag);
        if !value.is_empty() {
            return value;
        }
    }
    String::new()
}

/// Top-level `<item>` fragments in document order. Matching is non-recursive
/// and does not check well-formedness.
pub fn split_items(document: &str) -> Vec<&str> {
    ITEM_RE.find_iter(document).map(|m| m.as_str()).collect()
}

/// Strip CDATA wrapper markers, trim boundary whitespace, decode entities.
pub fn sanitize_text(raw: &str) -> String {
    let stripped = raw.replace("<![CDATA[", "").replace("]]>", "");
    decode_entities(stripped.trim())
}

/// Decode the five standard named entities plus decimal and hexadecimal
/// numeric character references. Unrecognized entities stay verbatim.
fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            match entity {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                _ if entity.starts_with('#') => decode_numeric(entity)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string()),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn decode_numeric(entity: &str) -> Option<char> {
    let digits = &entity[1..];
    let code = if digits.starts_with('x') || digits.starts_with('X') {
        u32::from_str_radix(&digits[1..], 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}
