//! Error types for the `xss_filter` crate.
//!
//! Sanitizing itself never fails; errors only arise while configuring a
//! filter or compiling user-supplied patterns.

/// All errors that can occur while building filters and pipelines.
#[derive(Debug, thiserror::Error)]
pub enum XssFilterError {
    /// A user-supplied regex pattern failed to compile.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The removal marker would re-introduce markup into sanitized output.
    #[error("Invalid removal marker {0:?}: must not contain '<' or '>'")]
    InvalidMarker(String),
}

/// A type alias for `Result<T, XssFilterError>`.
pub type Result<T> = std::result::Result<T, XssFilterError>;
