//! Strings and patterns that are never allowed through, wherever they occur.

use std::sync::LazyLock;

use regex::Regex;

use crate::sanitizer::{RegexSanitizer, Sanitizer, SubstringSanitizer};

/// Literal replacements. The `[removed]` here is fixed and does not follow
/// the configurable removal marker.
const NEVER_ALLOWED_STR: &[(&str, &str)] = &[
    ("document.cookie", "[removed]"),
    ("document.write", "[removed]"),
    (".parentNode", "[removed]"),
    (".innerHTML", "[removed]"),
    ("window.location", "[removed]"),
    ("-moz-binding", "[removed]"),
    ("<!--", "&lt;!--"),
    ("-->", "--&gt;"),
    ("<![CDATA[", "&lt;![CDATA["),
    ("<comment>", "&lt;comment&gt;"),
];

const NEVER_ALLOWED_REGEX: &[&str] = &[
    r"javascript\s*:",
    r"expression\s*(\(|&#40;)",
    r"vbscript\s*:",
    r"Redirect\s+302",
    // data: URI carrying base64, with its optional closing quote
    concat!(
        r#""data\s*:[^\x01]*?base64[^\x01]*?,"?"#,
        r#"|'data\s*:[^\x01]*?base64[^\x01]*?,'?"#,
        r#"|data\s*:[^\x01]*?base64[^\x01]*?,"#,
    ),
];

static NEVER_ALLOWED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NEVER_ALLOWED_REGEX
        .iter()
        .map(|pattern| Regex::new(&format!("(?is){pattern}")).expect("pattern compiles"))
        .collect()
});

/// The never-allowed table: literal substitutions, then regex hits replaced
/// by the removal marker.
#[derive(Clone, Debug)]
pub(crate) struct NeverAllowed {
    literals: SubstringSanitizer,
    patterns: RegexSanitizer,
}

impl NeverAllowed {
    pub(crate) fn new(removal_marker: &str) -> Self {
        Self {
            literals: SubstringSanitizer::new(NEVER_ALLOWED_STR.to_vec()).ignore_ascii_case(),
            patterns: RegexSanitizer::literal(
                NEVER_ALLOWED_PATTERNS.iter().cloned(),
                removal_marker,
            ),
        }
    }
}

impl Sanitizer for NeverAllowed {
    fn sanitize(&self, text: &str) -> String {
        self.patterns.sanitize(&self.literals.sanitize(text))
    }
}
