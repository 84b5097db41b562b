//! Error types for the chime-grammar crate.

/// Errors produced while interpreting alarm text.
///
/// Reason extraction never fails on its own; the only failure is text that
/// matches none of the interval, delay, or date grammars.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No grammar recognised the input. Carries the text exactly as given.
    #[error("could not parse time from input: '{0}'")]
    Unrecognized(String),
}

/// Convenience type alias for chime-grammar results.
pub type Result<T> = std::result::Result<T, ParseError>;
