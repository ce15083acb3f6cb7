//! # xss_filter
//!
//! A denylist-driven cross-site-scripting filter for untrusted input.
//!
//! ## Overview
//!
//! `xss_filter` rewrites user-supplied text so that known XSS vectors are
//! removed, replaced by a removal marker, or entity-encoded into inert text.
//! It does not parse HTML: input is normalized (control characters,
//! entities, URL encoding) and run through an ordered series of pattern
//! rewrites. The same engine checks uploaded images for embedded script and
//! cleans user-supplied filenames.
//!
//! The filter composes with other [`Sanitizer`]s through a
//! [`SanitizerPipeline`].
//!
//! ## Quick start
//!
//! ```rust
//! use xss_filter::{sanitize_filename, sanitize_image_payload, sanitize_text, XssFilter};
//!
//! assert_eq!(sanitize_text("<script>alert(1)</script>"), "[removed]alert&#40;1&#41;[removed]");
//! assert!(!sanitize_image_payload("GIF89a<?php echo 1; ?>"));
//! assert_eq!(sanitize_filename("../../etc/passwd", false), "etcpasswd");
//!
//! let mut filter = XssFilter::new();
//! filter.set_removal_marker("").unwrap();
//! assert_eq!(filter.filter("hi<xss>"), "hi");
//! ```

pub mod config;
pub mod error;
pub mod filename;
pub mod sanitizer;
mod xss;

pub use config::XssFilterBuilder;
pub use error::{Result, XssFilterError};
pub use filename::sanitize_filename;
pub use sanitizer::{RegexSanitizer, Sanitizer, SanitizerPipeline, SubstringSanitizer};
pub use xss::{DEFAULT_REMOVAL_MARKER, XssFilter};

use std::sync::OnceLock;

// Shared filter behind the free functions
static DEFAULT_FILTER: OnceLock<XssFilter> = OnceLock::new();

/// The process-wide [`XssFilter`] with the default marker.
///
/// Created on first use. Its protection hash is fixed for the process
/// lifetime.
pub fn default_filter() -> &'static XssFilter {
    DEFAULT_FILTER.get_or_init(XssFilter::new)
}

/// Sanitize a single text value with the [`default_filter()`].
///
/// Removed content is replaced by [`DEFAULT_REMOVAL_MARKER`]. To use another
/// marker build your own filter with [`XssFilter::builder`]; markers
/// containing `<` or `>` are rejected there with
/// [`XssFilterError::InvalidMarker`].
pub fn sanitize_text(text: &str) -> String {
    default_filter().filter(text)
}

/// Sanitize every value of a keyed collection with the [`default_filter()`].
///
/// See [`XssFilter::filter_values`].
pub fn sanitize_text_map<K, V, I, C>(values: I) -> C
where
    I: IntoIterator<Item = (K, V)>,
    V: AsRef<str>,
    C: FromIterator<(K, String)>,
{
    default_filter().filter_values(values)
}

/// Returns `true` if the payload carries no XSS according to the
/// [`default_filter()`].
pub fn sanitize_image_payload(payload: impl AsRef<[u8]>) -> bool {
    default_filter().is_image_clean(payload)
}
