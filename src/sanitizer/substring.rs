//! Literal-string-replacement sanitizer.

use super::Sanitizer;

/// Sanitizer that performs exact substring replacements.
///
/// Rules are applied in order; each rule operates on the output of the
/// previous one. Matching is case-sensitive unless
/// [`ignore_ascii_case`](Self::ignore_ascii_case) is enabled.
///
/// # Example
///
/// ```
/// use xss_filter::{SubstringSanitizer, Sanitizer};
///
/// let s = SubstringSanitizer::new(vec![("document.cookie", "[removed]")]).ignore_ascii_case();
/// assert_eq!(s.sanitize("x=Document.Cookie"), "x=[removed]");
/// ```
#[derive(Clone, Debug)]
pub struct SubstringSanitizer {
    rules: Vec<(String, String)>,
    ignore_ascii_case: bool,
}

impl SubstringSanitizer {
    /// Create a new `SubstringSanitizer` from `(needle, replacement)` pairs.
    pub fn new(rules: Vec<(&str, &str)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(needle, replacement)| (needle.to_string(), replacement.to_string()))
                .collect(),
            ignore_ascii_case: false,
        }
    }

    /// Match needles without regard to ASCII letter case.
    pub fn ignore_ascii_case(mut self) -> Self {
        self.ignore_ascii_case = true;
        self
    }
}

impl Sanitizer for SubstringSanitizer {
    fn sanitize(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (needle, replacement)| {
                if needle.is_empty() {
                    acc
                } else if self.ignore_ascii_case {
                    replace_ignore_ascii_case(&acc, needle, replacement)
                } else {
                    acc.replace(needle.as_str(), replacement)
                }
            })
    }
}

/// ASCII lowercasing keeps byte offsets stable, so match positions found in
/// the lowered copy are valid char boundaries in the original.
fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let lowered = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (start, _) in lowered.match_indices(needle.as_str()) {
        out.push_str(&haystack[last..start]);
        out.push_str(replacement);
        last = start + needle.len();
    }
    out.push_str(&haystack[last..]);
    out
}
