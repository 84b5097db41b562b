//! Interval and delay phrase matching.
//!
//! Matching is isolated behind [`GrammarMatcher`] so the interpreter's rule
//! order stays fixed while the pattern strictness can change.
//!
//! | Matcher | `"every 5 minutes"` | `"within 5 minutes"` |
//! |---------|---------------------|----------------------|
//! | [`SearchMatcher`] | interval | delay (`in 5 minutes` found inside `within`) |
//! | [`WordBoundaryMatcher`] | interval | no match |

use crate::types::UnitWord;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A recognised `<count> <unit>` phrase plus the reason phrase found next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    /// The integer literal before the unit.
    pub count: u64,
    /// The matched unit.
    pub unit: UnitWord,
    /// Trimmed reason phrase, `None` when absent or empty.
    pub reason: Option<String>,
}

/// Grammar matching for the interval (`every N unit`) and delay
/// (`in N unit`) rules. Inputs are already trimmed and lowercased.
pub trait GrammarMatcher: Send + Sync {
    /// Match `every <N> <unit>` and its `(to|that says) <phrase> every` reason.
    fn interval(&self, text: &str) -> Option<PhraseMatch>;

    /// Match `in <N> <unit>` and its `to <phrase> in` reason.
    fn delay(&self, text: &str) -> Option<PhraseMatch>;
}

/// Which matcher the interpreter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Search anywhere in the text, keywords may sit inside other words.
    #[default]
    Search,
    /// Keywords must sit on word boundaries.
    WordBoundary,
}

impl MatchMode {
    /// Build the matcher for this mode.
    #[must_use]
    pub fn matcher(self) -> Box<dyn GrammarMatcher> {
        match self {
            Self::Search => Box::new(SearchMatcher),
            Self::WordBoundary => Box::new(WordBoundaryMatcher),
        }
    }
}

const UNIT_ALTERNATION: &str = "second|seconds|minute|minutes|hour|hours";

struct Grammar {
    interval: Regex,
    interval_reason: Regex,
    delay: Regex,
    delay_reason: Regex,
}

impl Grammar {
    fn compile(word_boundary: bool) -> Self {
        let b = if word_boundary { r"\b" } else { "" };
        // With a trailing `\b` the plural alternative wins when the word continues.
        let interval = format!(r"{b}every\s+(\d+)\s+({UNIT_ALTERNATION}){b}");
        let interval_reason = format!(r"{b}(?:to|that says)\s+(.+?)\s+every{b}");
        let delay = format!(r"{b}in\s+(\d+)\s+({UNIT_ALTERNATION}){b}");
        let delay_reason = format!(r"{b}to\s+(.*?)\s+in{b}");

        Self {
            interval: static_pattern(&interval),
            interval_reason: static_pattern(&interval_reason),
            delay: static_pattern(&delay),
            delay_reason: static_pattern(&delay_reason),
        }
    }

    fn interval(&self, text: &str) -> Option<PhraseMatch> {
        let caps = self.interval.captures(text)?;
        phrase_match(&caps, &self.interval_reason, text)
    }

    fn delay(&self, text: &str) -> Option<PhraseMatch> {
        let caps = self.delay.captures(text)?;
        phrase_match(&caps, &self.delay_reason, text)
    }
}

/// Compile one of the grammar's fixed patterns.
#[allow(clippy::expect_used)]
fn static_pattern(pattern: &str) -> Regex {
    Regex::new(pattern).expect("grammar patterns are fixed and valid")
}

fn phrase_match(caps: &Captures<'_>, reason_pattern: &Regex, text: &str) -> Option<PhraseMatch> {
    let count = caps.get(1)?.as_str().parse::<u64>().ok()?;
    let unit = UnitWord::from_keyword(caps.get(2)?.as_str())?;
    Some(PhraseMatch {
        count,
        unit,
        reason: extract_reason(reason_pattern, text),
    })
}

/// Best-effort reason extraction; never fails the surrounding match.
fn extract_reason(pattern: &Regex, text: &str) -> Option<String> {
    let phrase = pattern.captures(text)?.get(1)?.as_str().trim();
    if phrase.is_empty() {
        None
    } else {
        Some(phrase.to_owned())
    }
}

fn search_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| Grammar::compile(false))
}

fn word_boundary_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| Grammar::compile(true))
}

/// Finds the grammar anywhere in the text, including inside other words.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchMatcher;

impl GrammarMatcher for SearchMatcher {
    fn interval(&self, text: &str) -> Option<PhraseMatch> {
        search_grammar().interval(text)
    }

    fn delay(&self, text: &str) -> Option<PhraseMatch> {
        search_grammar().delay(text)
    }
}

/// Like [`SearchMatcher`] but keywords must be whole words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBoundaryMatcher;

impl GrammarMatcher for WordBoundaryMatcher {
    fn interval(&self, text: &str) -> Option<PhraseMatch> {
        word_boundary_grammar().interval(text)
    }

    fn delay(&self, text: &str) -> Option<PhraseMatch> {
        word_boundary_grammar().delay(text)
    }
}
