//! Removal of non-printing control characters.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

// url encoded 00-08, 11, 12, 14, 15
static URL_ENCODED_LOW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%0[0-8bcef]").expect("pattern compiles"));

// url encoded 16-31
static URL_ENCODED_HIGH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%1[0-9a-f]").expect("pattern compiles"));

// 00-08, 11, 12, 14-31, 127; keeps tab, newline and carriage return
static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]+").expect("pattern compiles")
});

/// Strip control characters, and with `url_encoded` their `%xx` forms too,
/// until a full pass removes nothing.
///
/// A single pass is not enough: `%0%0bb` becomes `%0b` after the first.
pub(crate) fn remove_invisible_chars(text: &str, url_encoded: bool) -> String {
    let mut patterns: Vec<&Regex> = Vec::with_capacity(3);
    if url_encoded {
        patterns.push(&URL_ENCODED_LOW);
        patterns.push(&URL_ENCODED_HIGH);
    }
    patterns.push(&CONTROL_CHARS);

    let mut out = text.to_string();
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut removed = false;
        for re in &patterns {
            let next = match re.replace_all(&out, "") {
                Cow::Borrowed(_) => continue,
                Cow::Owned(next) => next,
            };
            out = next;
            removed = true;
        }
        if !removed {
            break;
        }
    }
    tracing::trace!(passes, "invisible characters removed");
    out
}
