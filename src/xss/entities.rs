//! Character entity normalization and decoding.
//!
//! Browsers honour entities that lack their trailing semicolon, so before
//! anything is matched against the denylists the filter first terminates
//! such entities and then decodes every entity that sits inside a tag.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static QUERY_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&([a-z_0-9\-]+)=([a-z_0-9\-]+)").expect("pattern compiles"));

static UNTERMINATED_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(&#?[0-9a-z]{2,})([\x00-\x20])*;?").expect("pattern compiles")
});

static UNTERMINATED_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(&#x?)([0-9a-f]+);?").expect("pattern compiles"));

static TERMINATED_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]+)|#[xX]([0-9a-fA-F]+)|([A-Za-z][A-Za-z0-9]*));")
        .expect("pattern compiles")
});

static LOOSE_HEX_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&#x(0*[0-9a-f]{2,5})").expect("pattern compiles"));

static LOOSE_DECIMAL_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([0-9]{2,4})").expect("pattern compiles"));

// From `<name` up to, not including, the next bracket or the end of input.
static TAG_OPENING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z0-9_]+[^<>]*").expect("pattern compiles"));

/// Terminate entities that are missing their semicolon.
///
/// `&name=value` query fragments are masked with `hash` first so that
/// `?a=1&section=2` is not rewritten into `&section;=2`.
pub(crate) fn validate_entities(text: &str, hash: &str) -> String {
    let masked = QUERY_PARAM.replace_all(text, format!("{hash}${{1}}=${{2}}").as_str());
    let terminated = UNTERMINATED_ENTITY.replace_all(&masked, "${1};${2}");
    let terminated = UNTERMINATED_NUMERIC.replace_all(&terminated, "${1}${2};");
    terminated.replace(hash, "&")
}

/// Decode character entities, including numeric ones written without the
/// trailing semicolon (`&#60` or `&#x3c`).
pub(crate) fn entity_decode(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let decoded = TERMINATED_ENTITY.replace_all(text, |caps: &Captures| {
        if let Some(dec) = caps.get(1) {
            decode_code_point(&caps[0], dec.as_str(), 10)
        } else if let Some(hex) = caps.get(2) {
            decode_code_point(&caps[0], hex.as_str(), 16)
        } else {
            decode_named(&caps[0])
        }
    });

    let decoded = LOOSE_HEX_ENTITY.replace_all(&decoded, |caps: &Captures| {
        decode_code_point(&caps[0], &caps[1], 16)
    });

    LOOSE_DECIMAL_ENTITY
        .replace_all(&decoded, |caps: &Captures| {
            decode_code_point(&caps[0], &caps[1], 10)
        })
        .into_owned()
}

fn decode_code_point(whole: &str, digits: &str, radix: u32) -> String {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
        .filter(|ch| *ch != '\0')
        .map_or_else(|| whole.to_string(), |ch| ch.to_string())
}

/// Decode one `&name;` reference. Legacy prefixes such as `&not` in
/// `&notit;` decode to more than two characters and are rejected, so only
/// a reference consumed as a whole is replaced.
fn decode_named(whole: &str) -> String {
    match html_escape::decode_html_entities(whole) {
        Cow::Owned(decoded) if decoded.chars().count() <= 2 => decoded,
        _ => whole.to_string(),
    }
}

/// Decode entities inside tag openings only; text between tags keeps its
/// entities.
pub(crate) fn decode_entities_in_tags(text: &str) -> String {
    TAG_OPENING
        .replace_all(text, |caps: &Captures| entity_decode(&caps[0]))
        .into_owned()
}
