//! Error types for the chime service.

use chime_grammar::ParseError;

/// Top-level error type for the alarm service.
#[derive(Debug, thiserror::Error)]
pub enum ChimeError {
    /// Alarm text could not be interpreted.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),

    /// Scheduler lifecycle error.
    #[error("scheduler error: {0}")]
    Scheduler(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ChimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_keeps_interpreter_message() {
        let err: ChimeError = ParseError::Unrecognized("blah".into()).into();
        assert_eq!(err.to_string(), "could not parse time from input: 'blah'");
    }

    #[test]
    fn scheduler_error_is_prefixed() {
        let err = ChimeError::Scheduler("already running".into());
        assert_eq!(err.to_string(), "scheduler error: already running");
    }
}
