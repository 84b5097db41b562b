//! Text to [`AlarmSpec`] interpretation.
//!
//! Rules are tried in a fixed order and the first match wins:
//!
//! 1. interval: `every <N> <unit>`
//! 2. delay: `in <N> <unit>`
//! 3. date fallback through the [`TimeResolver`]
//!
//! Text that none of them recognise fails with [`ParseError::Unrecognized`].

use crate::error::{ParseError, Result};
use crate::matcher::{GrammarMatcher, MatchMode, PhraseMatch, SearchMatcher};
use crate::resolver::{NaturalTimeResolver, TimeResolver};
use crate::types::{
    AlarmSpec, DEFAULT_DELAY_REASON, DEFAULT_GENERIC_REASON, DEFAULT_INTERVAL_REASON,
};
use chrono::{DateTime, Local, TimeDelta, Utc};

/// Interprets free-form alarm text.
///
/// Holds no state between calls; one instance can be shared freely.
pub struct Interpreter {
    matcher: Box<dyn GrammarMatcher>,
    resolver: Box<dyn TimeResolver>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self {
            matcher: Box::new(SearchMatcher),
            resolver: Box::new(NaturalTimeResolver),
        }
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter").finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Interpreter using the matcher for `mode` and the built-in resolver.
    #[must_use]
    pub fn new(mode: MatchMode) -> Self {
        Self {
            matcher: mode.matcher(),
            resolver: Box::new(NaturalTimeResolver),
        }
    }

    /// Replace the grammar matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: impl GrammarMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Replace the date fallback.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl TimeResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Interpret `text` against the current local time.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Unrecognized`] when no rule matches.
    pub fn interpret(&self, text: &str) -> Result<AlarmSpec> {
        self.interpret_at(text, Local::now())
    }

    /// Interpret `text` relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Unrecognized`] carrying `text` unchanged when no
    /// rule matches.
    pub fn interpret_at(&self, text: &str, now: DateTime<Local>) -> Result<AlarmSpec> {
        let normalized = text.trim().to_lowercase();

        if let Some(spec) = self.matcher.interval(&normalized).and_then(interval_spec) {
            tracing::trace!(rule = "interval", "alarm text recognised");
            return Ok(spec);
        }

        if let Some(spec) = self
            .matcher
            .delay(&normalized)
            .and_then(|m| delay_spec(m, now.with_timezone(&Utc)))
        {
            tracing::trace!(rule = "delay", "alarm text recognised");
            return Ok(spec);
        }

        if let Some(fire_at) = self.resolver.resolve(&normalized, now) {
            tracing::trace!(rule = "date", "alarm text recognised");
            return Ok(AlarmSpec::Absolute {
                fire_at,
                reason: DEFAULT_GENERIC_REASON.to_owned(),
            });
        }

        Err(ParseError::Unrecognized(text.to_owned()))
    }
}

/// Zero or overflowing periods are not intervals.
fn interval_spec(m: PhraseMatch) -> Option<AlarmSpec> {
    if m.count == 0 {
        return None;
    }
    m.unit.duration(m.count)?;
    Some(AlarmSpec::Interval {
        every: m.count,
        unit: m.unit,
        reason: m
            .reason
            .unwrap_or_else(|| DEFAULT_INTERVAL_REASON.to_owned()),
    })
}

fn delay_spec(m: PhraseMatch, now: DateTime<Utc>) -> Option<AlarmSpec> {
    let delay = TimeDelta::from_std(m.unit.duration(m.count)?).ok()?;
    Some(AlarmSpec::Absolute {
        fire_at: now.checked_add_signed(delay)?,
        reason: m.reason.unwrap_or_else(|| DEFAULT_DELAY_REASON.to_owned()),
    })
}
