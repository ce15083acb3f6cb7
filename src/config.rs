//! Builder for configuring an [`XssFilter`].

use crate::error::{Result, XssFilterError};
use crate::xss::{DEFAULT_REMOVAL_MARKER, XssFilter};

/// Builder for configuring an [`XssFilter`].
///
/// The removal marker is the only setting: denylists and patterns are
/// fixed.
///
/// # Example
///
/// ```
/// use xss_filter::XssFilterBuilder;
///
/// let filter = XssFilterBuilder::new()
///     .removal_marker("[[rem]]")
///     .build()
///     .unwrap();
/// assert_eq!(filter.filter("<xss>"), "[[rem]]");
/// ```
#[derive(Clone, Debug)]
pub struct XssFilterBuilder {
    removal_marker: String,
}

impl XssFilterBuilder {
    /// Create a builder with the default `[removed]` marker.
    pub fn new() -> Self {
        Self {
            removal_marker: DEFAULT_REMOVAL_MARKER.to_string(),
        }
    }

    /// String substituted wherever disallowed content is removed.
    pub fn removal_marker(mut self, marker: impl Into<String>) -> Self {
        self.removal_marker = marker.into();
        self
    }

    /// Validate the configuration and produce the filter.
    pub fn build(self) -> Result<XssFilter> {
        validate_marker(&self.removal_marker)?;
        Ok(XssFilter::with_marker(self.removal_marker))
    }
}

impl Default for XssFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A marker must not carry brackets: re-inserting markup would undo the
/// removal and keep the stripping loops from settling.
pub(crate) fn validate_marker(marker: &str) -> Result<()> {
    if marker.contains(['<', '>']) {
        return Err(XssFilterError::InvalidMarker(marker.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_marker() {
        let filter = XssFilterBuilder::default().build().unwrap();
        assert_eq!(filter.removal_marker(), "[removed]");
    }

    #[test]
    fn custom_marker() {
        let filter = XssFilterBuilder::new().removal_marker("").build().unwrap();
        assert_eq!(filter.removal_marker(), "");
        assert_eq!(filter.filter("a<script>b"), "ab");
    }

    #[test]
    fn marker_with_markup_rejected() {
        let err = XssFilterBuilder::new()
            .removal_marker("<b>gone</b>")
            .build()
            .unwrap_err();
        assert!(matches!(err, XssFilterError::InvalidMarker(m) if m == "<b>gone</b>"));
    }
}
