//! Sanitizer pipeline for filtering untrusted input values.
//!
//! Sanitizers implement the [`Sanitizer`] trait and are composed into a
//! [`SanitizerPipeline`] that runs them sequentially.
//!
//! Built-in sanitizers:
//!
//! - [`XssFilter`](crate::XssFilter) -- the cross-site-scripting filter.
//! - [`SubstringSanitizer`] -- literal string replacements.
//! - [`RegexSanitizer`] -- regex-based replacements.

mod regex;
mod substring;

pub use self::regex::RegexSanitizer;
pub use substring::SubstringSanitizer;

use crate::xss::XssFilter;

/// Trait for input sanitizers.
///
/// Each sanitizer receives a text value and returns a transformed version.
/// Implementations must be `Send + Sync` so one pipeline can serve many
/// request handlers.
pub trait Sanitizer: Send + Sync {
    /// Transform the given text, returning the sanitized result.
    fn sanitize(&self, text: &str) -> String;
}

/// An ordered chain of [`Sanitizer`] implementations applied sequentially.
///
/// Each sanitizer receives the output of the previous one. An empty pipeline
/// is a no-op.
///
/// # Example
///
/// ```
/// use xss_filter::{SanitizerPipeline, SubstringSanitizer};
///
/// let mut pipeline = SanitizerPipeline::with_xss_filter();
/// pipeline.add(SubstringSanitizer::new(vec![("[removed]", "")]));
/// assert_eq!(pipeline.sanitize("a<script>b"), "ab");
/// ```
pub struct SanitizerPipeline {
    sanitizers: Vec<Box<dyn Sanitizer>>,
}

impl SanitizerPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            sanitizers: Vec::new(),
        }
    }

    /// Create a pipeline whose first stage is a default [`XssFilter`].
    pub fn with_xss_filter() -> Self {
        let mut pipeline = Self::new();
        pipeline.add(XssFilter::new());
        pipeline
    }

    /// Append a sanitizer to the end of the pipeline.
    pub fn add(&mut self, sanitizer: impl Sanitizer + 'static) {
        self.sanitizers.push(Box::new(sanitizer));
    }

    /// Run the full pipeline on the given text, returning the final result.
    pub fn sanitize(&self, text: &str) -> String {
        self.sanitizers
            .iter()
            .fold(text.to_string(), |acc, s| s.sanitize(&acc))
    }

    /// Run the pipeline over every value of a keyed collection.
    ///
    /// Keys are untouched and iteration order is preserved.
    pub fn sanitize_values<K, V, I, C>(&self, values: I) -> C
    where
        I: IntoIterator<Item = (K, V)>,
        V: AsRef<str>,
        C: FromIterator<(K, String)>,
    {
        values
            .into_iter()
            .map(|(key, value)| (key, self.sanitize(value.as_ref())))
            .collect()
    }

    /// Returns `true` if no sanitizers have been added.
    pub fn is_empty(&self) -> bool {
        self.sanitizers.is_empty()
    }
}

impl Default for SanitizerPipeline {
    fn default() -> Self {
        Self::new()
    }
}
