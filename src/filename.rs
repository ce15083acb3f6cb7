//! Filename sanitizing for user-supplied upload names.

use std::sync::LazyLock;

use crate::sanitizer::{Sanitizer, SubstringSanitizer};
use crate::xss::remove_invisible_chars;

/// Path traversal, markup, shell and query metacharacters, and their
/// percent-encoded forms.
const BAD_FILENAME_PARTS: &[&str] = &[
    "../", "<!--", "-->", "<", ">", "'", "\"", "&", "$", "#", "{", "}", "[", "]", "=", ";", "?",
    "%20", "%22", "%3c", "%253c", "%3e", "%0e", "%28", "%29", "%2528", "%26", "%24", "%3f",
    "%3b", "%3d",
];

static RELATIVE_PATH_FILTER: LazyLock<SubstringSanitizer> =
    LazyLock::new(|| SubstringSanitizer::new(denylist(&[])));

static FLAT_FILTER: LazyLock<SubstringSanitizer> =
    LazyLock::new(|| SubstringSanitizer::new(denylist(&["./", "/"])));

fn denylist(extra: &[&'static str]) -> Vec<(&'static str, &'static str)> {
    BAD_FILENAME_PARTS
        .iter()
        .chain(extra)
        .map(|part| (*part, ""))
        .collect()
}

/// Clean a user-supplied filename.
///
/// Control characters are dropped, then the denylisted fragments are
/// removed in a single ordered pass, then backslash escapes are undone.
/// Unless `allow_relative_path` is set, `/` and `./` are removed as well so
/// the result is a single path component.
///
/// ```
/// use xss_filter::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd", false), "etcpasswd");
/// assert_eq!(sanitize_filename("../../etc/passwd", true), "etc/passwd");
/// ```
pub fn sanitize_filename(filename: &str, allow_relative_path: bool) -> String {
    let visible = remove_invisible_chars(filename, false);
    let filter = if allow_relative_path {
        &*RELATIVE_PATH_FILTER
    } else {
        &*FLAT_FILTER
    };
    strip_slashes(&filter.sanitize(&visible))
}

/// Undo backslash escaping: `\x` becomes `x`, `\\` becomes `\`, and a lone
/// trailing backslash is dropped. `\0` yields `0`, never a NUL.
fn strip_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(ch);
        }
    }
    out
}
