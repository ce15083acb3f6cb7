//! The XSS filter: an ordered, multi-pass rewrite of untrusted text.
//!
//! [`XssFilter`] neutralizes known cross-site-scripting vectors without
//! parsing HTML. Input is normalized (control characters, entities, URL
//! encoding), matched against fixed denylists, and rewritten so that
//! dangerous constructs are removed, replaced by the removal marker, or
//! entity-encoded into inert text.
//!
//! The same pipeline runs in image mode, where the question is only whether
//! anything would have been changed.

mod entities;
mod invisible;
mod never_allowed;
mod tags;

use std::sync::OnceLock;

use percent_encoding::percent_decode_str;
use rand::Rng;

use crate::config::{XssFilterBuilder, validate_marker};
use crate::error::Result;
use crate::sanitizer::Sanitizer;

pub(crate) use invisible::remove_invisible_chars;
use never_allowed::NeverAllowed;

/// Replacement for removed content unless configured otherwise.
pub const DEFAULT_REMOVAL_MARKER: &str = "[removed]";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Text,
    Image,
}

/// Cross-site-scripting filter for untrusted text.
///
/// The filter is total: every input produces an output and nothing panics,
/// whatever the input looks like. Unterminated tags are treated as running
/// to the end of the input.
///
/// # Example
///
/// ```
/// use xss_filter::XssFilter;
///
/// let filter = XssFilter::new();
/// assert_eq!(
///     filter.filter("'';!--\"<XSS>=&{()}"),
///     "'';!--\"[removed]=&{()}"
/// );
/// assert!(filter.is_image_clean("plain text, no tags"));
/// assert!(!filter.is_image_clean("<script>alert(1)</script>"));
/// ```
#[derive(Clone, Debug)]
pub struct XssFilter {
    removal_marker: String,
    never_allowed: NeverAllowed,
    protection_hash: OnceLock<String>,
}

/// Pipeline output plus the snapshot taken right after normalization.
struct Cleaned {
    output: String,
    converted: String,
}

impl XssFilter {
    /// Create a filter using [`DEFAULT_REMOVAL_MARKER`].
    pub fn new() -> Self {
        Self::with_marker(DEFAULT_REMOVAL_MARKER.to_string())
    }

    /// Start configuring a filter.
    pub fn builder() -> XssFilterBuilder {
        XssFilterBuilder::new()
    }

    pub(crate) fn with_marker(removal_marker: String) -> Self {
        Self {
            never_allowed: NeverAllowed::new(&removal_marker),
            removal_marker,
            protection_hash: OnceLock::new(),
        }
    }

    /// The string substituted for removed content.
    pub fn removal_marker(&self) -> &str {
        &self.removal_marker
    }

    /// Replace the removal marker used by subsequent calls.
    ///
    /// Returns [`XssFilterError::InvalidMarker`](crate::XssFilterError::InvalidMarker)
    /// if the marker contains `<` or `>`; the current marker is kept then.
    pub fn set_removal_marker(&mut self, marker: impl Into<String>) -> Result<()> {
        let marker = marker.into();
        validate_marker(&marker)?;
        self.never_allowed = NeverAllowed::new(&marker);
        self.removal_marker = marker;
        Ok(())
    }

    /// Random token used to mask URL query ampersands while entities are
    /// normalized. Generated on first use and fixed for the filter's lifetime.
    pub fn protection_hash(&self) -> &str {
        self.protection_hash
            .get_or_init(|| format!("{:032x}", rand::rng().random::<u128>()))
    }

    /// Sanitize a single text value.
    pub fn filter(&self, text: &str) -> String {
        let Cleaned { output, .. } = self.clean(text, Mode::Text);
        if output != text {
            tracing::debug!(
                input_len = text.len(),
                output_len = output.len(),
                "xss filter altered input"
            );
        }
        output
    }

    /// Sanitize raw bytes; invalid UTF-8 sequences become U+FFFD first.
    pub fn filter_bytes(&self, bytes: &[u8]) -> String {
        self.filter(&String::from_utf8_lossy(bytes))
    }

    /// Sanitize every value of a keyed collection independently.
    ///
    /// Keys are passed through untouched and the output is collected in the
    /// input's iteration order, so a `Vec`, `BTreeMap` or `HashMap` comes back
    /// in the same shape.
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use xss_filter::XssFilter;
    ///
    /// let params = BTreeMap::from([("a", "<script>1</script>"), ("b", "ok")]);
    /// let clean: BTreeMap<_, _> = XssFilter::new().filter_values(params);
    /// assert_eq!(clean["a"], "[removed]1[removed]");
    /// assert_eq!(clean["b"], "ok");
    /// ```
    pub fn filter_values<K, V, I, C>(&self, values: I) -> C
    where
        I: IntoIterator<Item = (K, V)>,
        V: AsRef<str>,
        C: FromIterator<(K, String)>,
    {
        values
            .into_iter()
            .map(|(key, value)| (key, self.filter(value.as_ref())))
            .collect()
    }

    /// Check an uploaded image (or any binary payload) for embedded XSS.
    ///
    /// Returns `true` when the pipeline would leave the payload unchanged
    /// after normalization, meaning nothing disallowed was found.
    pub fn is_image_clean(&self, payload: impl AsRef<[u8]>) -> bool {
        let payload = String::from_utf8_lossy(payload.as_ref());
        let Cleaned { output, converted } = self.clean(&payload, Mode::Image);
        let clean = output == converted;
        if !clean {
            tracing::debug!(payload_len = payload.len(), "image payload rejected");
        }
        clean
    }

    fn clean(&self, input: &str, mode: Mode) -> Cleaned {
        let mut text = remove_invisible_chars(input, true);
        text = entities::validate_entities(&text, self.protection_hash());

        // raw decode: '+' stays a plus sign
        text = percent_decode_str(&text).decode_utf8_lossy().into_owned();

        text = tags::escape_attribute_brackets(&text);
        text = entities::decode_entities_in_tags(&text);

        // decoding may have produced new control characters
        text = remove_invisible_chars(&text, true);

        if text.contains('\t') {
            text = text.replace('\t', " ");
        }

        let converted = text.clone();

        text = self.never_allowed.sanitize(&text);
        text = tags::neutralize_php_tags(&text, mode);
        text = tags::compact_exploded_words(&text);
        text = tags::strip_links_and_scripts(text, &self.removal_marker);
        text = tags::remove_evil_attributes(text, mode);
        text = tags::neutralize_naughty_tags(&text);
        text = tags::neutralize_dangerous_calls(&text);
        text = self.never_allowed.sanitize(&text);

        Cleaned {
            output: text,
            converted,
        }
    }
}

impl Default for XssFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for XssFilter {
    fn sanitize(&self, text: &str) -> String {
        self.filter(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xss_tag_replaced_by_marker() {
        let filter = XssFilter::new();
        assert_eq!(
            filter.filter("'';!--\"<XSS>=&{()}"),
            "'';!--\"[removed]=&{()}"
        );
    }

    #[test]
    fn custom_marker_applies() {
        let mut filter = XssFilter::new();
        filter.set_removal_marker("[[rem]]").unwrap();
        assert_eq!(
            filter.filter("'';!--\"<XSS>=&{()}"),
            "'';!--\"[[rem]]=&{()}"
        );
    }

    #[test]
    fn marker_with_brackets_rejected_and_previous_kept() {
        let mut filter = XssFilter::new();
        assert!(filter.set_removal_marker("<xss>").is_err());
        assert_eq!(filter.removal_marker(), DEFAULT_REMOVAL_MARKER);
    }

    #[test]
    fn protection_hash_is_stable_per_instance() {
        let filter = XssFilter::new();
        let first = filter.protection_hash().to_string();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(filter.protection_hash(), first);
    }

    #[test]
    fn empty_input() {
        assert_eq!(XssFilter::new().filter(""), "");
        assert!(XssFilter::new().is_image_clean(""));
    }

    #[test]
    fn plain_text_untouched() {
        let text = "Tom & Jerry: 3 < 4, a+b=c; see https://example.com/?q=rust&page=2";
        assert_eq!(XssFilter::new().filter(text), text);
    }

    #[test]
    fn script_block_removed() {
        assert_eq!(
            XssFilter::new().filter("<script>alert(document.cookie)</script>"),
            "[removed]alert&#40;[removed]&#41;[removed]"
        );
    }

    #[test]
    fn javascript_href_removed() {
        assert_eq!(
            XssFilter::new().filter(r#"<a href="javascript:alert(1)">x</a>"#),
            "<a >x</a>"
        );
    }

    #[test]
    fn url_encoded_payload_decoded_before_matching() {
        let out = XssFilter::new().filter("%3Cscript%3Ealert(1)%3C/script%3E");
        assert_eq!(out, "[removed]alert&#40;1&#41;[removed]");
    }

    #[test]
    fn entity_obfuscated_scheme_inside_tag() {
        let out = XssFilter::new()
            .filter(r#"<a href="&#106;&#97;&#118;&#97;&#115;&#99;&#114;&#105;&#112;&#116;&#58;alert(1)">x</a>"#);
        assert!(!out.to_lowercase().contains("javascript"));
        assert!(!out.contains("alert("));
    }

    #[test]
    fn tab_exploded_scheme_defeated() {
        let out = XssFilter::new().filter("<img src=\"jav\tascript:alert(1)\">");
        assert!(!out.to_lowercase().contains("javascript"));
        assert!(!out.contains("alert("));
    }

    #[test]
    fn invalid_utf8_bytes_are_tolerated() {
        let out = XssFilter::new().filter_bytes(b"ok \xff\xfe <script>");
        assert_eq!(out, "ok \u{fffd}\u{fffd} [removed]");
    }

    #[test]
    fn image_with_xmp_metadata_is_clean() {
        let filter = XssFilter::new();
        assert!(filter.is_image_clean(
            br#"GIF89a<?xpacket begin="abc"?><rdf xmlns="http://ns.adobe.com/">"#
        ));
    }

    #[test]
    fn image_with_php_or_handler_is_not_clean() {
        let filter = XssFilter::new();
        assert!(!filter.is_image_clean("GIF89a<?php system($_GET['c']); ?>"));
        assert!(!filter.is_image_clean(r#"<svg onload="alert(1)">"#));
    }
}
