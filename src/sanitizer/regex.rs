//! Regex-based sanitizer.

use regex::{NoExpand, Regex};

use super::Sanitizer;
use crate::error::Result;

/// How a matched span is rewritten.
#[derive(Clone, Debug)]
enum Replacement {
    /// Capture-group template, e.g. `"$1;"`.
    Template(String),
    /// Inserted verbatim; `$` has no special meaning.
    Literal(String),
}

/// Sanitizer that applies a series of regex find-and-replace rules.
///
/// Rules are applied in order; each rule operates on the output of the
/// previous one.
///
/// # Example
///
/// ```
/// use xss_filter::{RegexSanitizer, Sanitizer};
///
/// let sanitizer = RegexSanitizer::new(vec![(r"(?i)vbscript\s*:", "[removed]")]);
/// let result = sanitizer.sanitize(r#"<a href="VBScript :msgbox(1)">"#);
/// assert_eq!(result, r#"<a href="[removed]msgbox(1)">"#);
/// ```
#[derive(Clone, Debug)]
pub struct RegexSanitizer {
    rules: Vec<(Regex, Replacement)>,
}

impl RegexSanitizer {
    /// Create a new `RegexSanitizer` from a list of `(pattern, replacement)` pairs.
    ///
    /// Replacements may reference capture groups (`$1`, `${name}`).
    ///
    /// # Panics
    ///
    /// Panics if any regex pattern is invalid. Use [`try_new`](Self::try_new)
    /// for a fallible alternative.
    pub fn new(rules: Vec<(&str, &str)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| {
                (
                    Regex::new(pattern).expect("invalid regex pattern"),
                    Replacement::Template(replacement.to_string()),
                )
            })
            .collect();
        Self { rules }
    }

    /// Fallible constructor that returns
    /// [`XssFilterError::InvalidPattern`](crate::XssFilterError::InvalidPattern)
    /// for invalid patterns.
    pub fn try_new(rules: Vec<(&str, &str)>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| -> Result<(Regex, Replacement)> {
                Ok((
                    Regex::new(pattern)?,
                    Replacement::Template(replacement.to_string()),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Build from already compiled patterns, each match replaced verbatim by
    /// `replacement`.
    pub fn literal(patterns: impl IntoIterator<Item = Regex>, replacement: &str) -> Self {
        let rules = patterns
            .into_iter()
            .map(|re| (re, Replacement::Literal(replacement.to_string())))
            .collect();
        Self { rules }
    }
}

impl Sanitizer for RegexSanitizer {
    fn sanitize(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_string(), |acc, (re, replacement)| match replacement {
                Replacement::Template(template) => {
                    re.replace_all(&acc, template.as_str()).into_owned()
                }
                Replacement::Literal(literal) => {
                    re.replace_all(&acc, NoExpand(literal.as_str())).into_owned()
                }
            })
    }
}
