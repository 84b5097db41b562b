//! # chime-grammar
//!
//! Natural-language alarm interpreter for chime.
//!
//! Turns short phrases such as "remind me to stretch every 10 minutes" or
//! "tomorrow at 8am" into an [`AlarmSpec`] the scheduler can run. The crate is
//! pure: no I/O, no shared state, and the only clock read is
//! [`Interpreter::interpret`] asking for the local time.
//!
//! ## Design
//!
//! - Interval, delay, then date fallback, first match wins
//! - Pattern strictness sits behind [`GrammarMatcher`]
//! - Date phrases go through the [`TimeResolver`] capability, with
//!   [`NaturalTimeResolver`] as the built-in implementation
//! - Reason extraction is best-effort and never fails a recognised time

pub mod error;
pub mod interpreter;
pub mod matcher;
pub mod resolver;
pub mod types;

pub use error::{ParseError, Result};
pub use interpreter::Interpreter;
pub use matcher::{GrammarMatcher, MatchMode, PhraseMatch, SearchMatcher, WordBoundaryMatcher};
pub use resolver::{NaturalTimeResolver, TimeResolver};
pub use types::{
    AlarmSpec, TimeUnit, UnitWord, DEFAULT_DELAY_REASON, DEFAULT_GENERIC_REASON, DEFAULT_INTERVAL_REASON,
};

/// Interpret alarm text with the default interpreter.
///
/// # Errors
///
/// Returns [`ParseError::Unrecognized`] if the text names no interval, delay,
/// or date.
///
/// # Examples
///
/// ```
/// let spec = chime_grammar::interpret("remind me to stretch every 10 minutes")?;
/// assert_eq!(spec.reason(), "stretch");
/// assert_eq!(spec.describe(), "every 10 minutes");
/// # Ok::<(), chime_grammar::ParseError>(())
/// ```
pub fn interpret(text: &str) -> Result<AlarmSpec> {
    Interpreter::default().interpret(text)
}
