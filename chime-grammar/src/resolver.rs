//! Last-resort date resolution for alarm text.
//!
//! The interpreter only asks one question of this module: "does this text name
//! a point in time?". [`TimeResolver`] is that capability; closures with the
//! same signature implement it, which keeps tests and alternative resolvers
//! cheap to plug in.
//!
//! [`NaturalTimeResolver`] understands, searched anywhere in the text:
//!
//! | Phrase | Example | Result |
//! |--------|---------|--------|
//! | ISO-8601 / RFC 3339 | `2026-01-02t08:00:00z`, `2026-01-02 08:00` | that instant (local when no offset) |
//! | ISO date | `2026-01-02` | local midnight, or the clock time given alongside |
//! | relative days | `in 3 days`, `2 weeks from now` | now + N days |
//! | day word + clock | `tomorrow at 8am`, `tonight at 9`, `next friday 18:30` | that local time |
//! | day word alone | `tomorrow`, `monday` | 09:00 local (`tonight`: 20:00) |
//! | clock alone | `at 7`, `7:30 pm`, `noon` | next local occurrence |
//! | `now` | `right now` | now |

use chrono::{
    DateTime, Datelike, Days, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Timelike, Utc,
    Weekday,
};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Resolves free text to an absolute point in time.
pub trait TimeResolver: Send + Sync {
    /// Resolve `text` relative to `now`. `None` when the text names no time.
    fn resolve(&self, text: &str, now: DateTime<Local>) -> Option<DateTime<Utc>>;
}

impl<F> TimeResolver for F
where
    F: Fn(&str, DateTime<Local>) -> Option<DateTime<Utc>> + Send + Sync,
{
    fn resolve(&self, text: &str, now: DateTime<Local>) -> Option<DateTime<Utc>> {
        self(text, now)
    }
}

/// Built-in resolver for common English date and clock phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalTimeResolver;

impl TimeResolver for NaturalTimeResolver {
    fn resolve(&self, text: &str, now: DateTime<Local>) -> Option<DateTime<Utc>> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let p = patterns();
        timestamp(p, &text)
            .or_else(|| relative_days(p, &text, now))
            .or_else(|| day_and_clock(p, &text, now))
            .or_else(|| p.now.is_match(&text).then(|| now.with_timezone(&Utc)))
    }
}

/// Clock time used for day words without an explicit time.
const DEFAULT_DAY_TIME: (u32, u32) = (9, 0);

/// Clock time used for `tonight` without an explicit time.
const DEFAULT_EVENING_TIME: (u32, u32) = (20, 0);

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

const DAY_SPANS: &[(&str, u64)] = &[("day", 1), ("days", 1), ("week", 7), ("weeks", 7)];

struct Patterns {
    timestamp: Regex,
    relative_in: Regex,
    relative_from_now: Regex,
    day_word: Regex,
    weekday: Regex,
    clock_meridiem: Regex,
    clock_24h: Regex,
    clock_at: Regex,
    clock_named: Regex,
    now: Regex,
}

#[allow(clippy::expect_used)]
fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("resolver patterns are fixed and valid");
        Patterns {
            timestamp: re(
                r"\b(\d{4})-(\d{2})-(\d{2})(?:[t ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?\s*(z|[+-]\d{2}:?\d{2})?)?",
            ),
            relative_in: re(r"\bin\s+(\d+)\s+(days|day|weeks|week)\b"),
            relative_from_now: re(r"\b(\d+)\s+(days|day|weeks|week)\s+from\s+now\b"),
            day_word: re(r"\b(today|tonight|tomorrow)\b"),
            weekday: re(
                r"\b(next\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            ),
            clock_meridiem: re(r"\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\b"),
            clock_24h: re(r"\b(\d{1,2}):(\d{2})\b"),
            clock_at: re(r"\bat\s+(\d{1,2})\b"),
            clock_named: re(r"\b(noon|midday|midnight)\b"),
            now: re(r"\bnow\b"),
        }
    })
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, group: usize) -> Option<T> {
    caps.get(group)?.as_str().parse().ok()
}

fn to_utc<Tz: TimeZone>(dt: DateTime<Tz>) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}

/// Local wall-clock time on `date`, earliest mapping on DST overlap.
fn at_local(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(to_utc)
}

fn timestamp(p: &Patterns, text: &str) -> Option<DateTime<Utc>> {
    let caps = p.timestamp.captures(text)?;
    // Date-only forms are handled as a day anchor.
    caps.get(4)?;

    let date = iso_date(&caps)?;
    let seconds = match caps.get(6) {
        Some(_) => number(&caps, 6)?,
        None => 0,
    };
    let time = NaiveTime::from_hms_opt(number(&caps, 4)?, number(&caps, 5)?, seconds)?;
    let naive = date.and_time(time);

    match caps.get(7).map(|m| m.as_str()) {
        Some("z") => Some(Utc.from_utc_datetime(&naive)),
        Some(offset) => parse_offset(offset)?
            .from_local_datetime(&naive)
            .single()
            .map(to_utc),
        None => Local.from_local_datetime(&naive).earliest().map(to_utc),
    }
}

fn iso_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(number(caps, 1)?, number(caps, 2)?, number(caps, 3)?)
}

/// Parse `+05:30` and `-0800` style offsets.
fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = match raw.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits: String = raw[1..].chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 4 {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn relative_days(p: &Patterns, text: &str, now: DateTime<Local>) -> Option<DateTime<Utc>> {
    let caps = p
        .relative_in
        .captures(text)
        .or_else(|| p.relative_from_now.captures(text))?;
    let count: u64 = number(&caps, 1)?;
    let span = caps.get(2)?.as_str();
    let per = DAY_SPANS
        .iter()
        .find(|(word, _)| *word == span)
        .map(|(_, days)| *days)?;
    now.checked_add_days(Days::new(count.checked_mul(per)?))
        .map(to_utc)
}

/// Outcome of looking for one kind of phrase.
enum Phrase<T> {
    Absent,
    /// The phrase is present but names an impossible date or time.
    Invalid,
    Found(T),
}

impl<T> Phrase<T> {
    fn from_match(parsed: Option<T>) -> Self {
        parsed.map_or(Self::Invalid, Self::Found)
    }

    /// `None` when invalid, so a malformed phrase fails the whole resolution.
    fn valid(self) -> Option<Option<T>> {
        match self {
            Self::Absent => Some(None),
            Self::Invalid => None,
            Self::Found(value) => Some(Some(value)),
        }
    }
}

/// A clock time found in the text.
#[derive(Debug, Clone, Copy)]
struct Clock {
    time: NaiveTime,
    /// An explicit am/pm or 24h form was used, so no evening shift applies.
    unambiguous: bool,
}

fn clock(p: &Patterns, text: &str) -> Phrase<Clock> {
    if let Some(caps) = p.clock_meridiem.captures(text) {
        return Phrase::from_match(meridiem_clock(&caps));
    }
    if let Some(caps) = p.clock_24h.captures(text) {
        return Phrase::from_match(plain_clock(&caps, Some(2)));
    }
    if let Some(caps) = p.clock_at.captures(text) {
        return Phrase::from_match(plain_clock(&caps, None));
    }
    match p.clock_named.captures(text).and_then(|caps| caps.get(1)) {
        Some(named) => {
            let hour = if named.as_str() == "midnight" { 0 } else { 12 };
            Phrase::from_match(NaiveTime::from_hms_opt(hour, 0, 0).map(|time| Clock {
                time,
                unambiguous: true,
            }))
        }
        None => Phrase::Absent,
    }
}

fn meridiem_clock(caps: &Captures<'_>) -> Option<Clock> {
    let hour: u32 = number(caps, 1)?;
    let minute: u32 = match caps.get(2) {
        Some(_) => number(caps, 2)?,
        None => 0,
    };
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (caps.get(3)?.as_str(), hour) {
        ("a", 12) => 0,
        ("a", h) => h,
        ("p", 12) => 12,
        (_, h) => h + 12,
    };
    Some(Clock {
        time: NaiveTime::from_hms_opt(hour, minute, 0)?,
        unambiguous: true,
    })
}

fn plain_clock(caps: &Captures<'_>, minute_group: Option<usize>) -> Option<Clock> {
    let hour: u32 = number(caps, 1)?;
    let minute: u32 = match minute_group {
        Some(group) => number(caps, group)?,
        None => 0,
    };
    Some(Clock {
        time: NaiveTime::from_hms_opt(hour, minute, 0)?,
        unambiguous: hour >= 13 || hour == 0,
    })
}

/// A calendar day named in the text.
#[derive(Debug, Clone, Copy)]
struct DayAnchor {
    date: NaiveDate,
    default_time: (u32, u32),
    evening: bool,
    /// Plain weekday names roll forward a week when the time has passed.
    rolls_weekly: bool,
}

impl DayAnchor {
    fn on(date: NaiveDate, default_time: (u32, u32), evening: bool) -> Self {
        Self {
            date,
            default_time,
            evening,
            rolls_weekly: false,
        }
    }
}

fn day_anchor(p: &Patterns, text: &str, today: NaiveDate) -> Phrase<DayAnchor> {
    if let Some(caps) = p.timestamp.captures(text) {
        return Phrase::from_match(iso_date(&caps).map(|date| DayAnchor::on(date, (0, 0), false)));
    }

    if let Some(word) = p.day_word.captures(text).and_then(|caps| caps.get(1)) {
        return Phrase::from_match(match word.as_str() {
            "tomorrow" => today
                .succ_opt()
                .map(|date| DayAnchor::on(date, DEFAULT_DAY_TIME, false)),
            "tonight" => Some(DayAnchor::on(today, DEFAULT_EVENING_TIME, true)),
            _ => Some(DayAnchor::on(today, DEFAULT_DAY_TIME, false)),
        });
    }

    match p.weekday.captures(text) {
        Some(caps) => Phrase::from_match(weekday_anchor(&caps, today)),
        None => Phrase::Absent,
    }
}

fn weekday_anchor(caps: &Captures<'_>, today: NaiveDate) -> Option<DayAnchor> {
    let explicit_next = caps.get(1).is_some();
    let name = caps.get(2)?.as_str();
    let target = WEEKDAYS
        .iter()
        .find(|(word, _)| *word == name)
        .map(|(_, day)| *day)?;

    let current = today.weekday().num_days_from_monday();
    let wanted = target.num_days_from_monday();
    let mut ahead = (wanted + 7 - current) % 7;
    if explicit_next && ahead == 0 {
        ahead = 7;
    }
    Some(DayAnchor {
        date: today.checked_add_days(Days::new(u64::from(ahead)))?,
        default_time: DEFAULT_DAY_TIME,
        evening: false,
        rolls_weekly: !explicit_next,
    })
}

fn day_and_clock(p: &Patterns, text: &str, now: DateTime<Local>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let now_utc = to_utc(now);
    let clock = clock(p, text).valid()?;

    let Some(anchor) = day_anchor(p, text, today).valid()? else {
        // A bare clock time means its next occurrence.
        let time = clock?.time;
        let candidate = at_local(today, time)?;
        return if candidate > now_utc {
            Some(candidate)
        } else {
            at_local(today.succ_opt()?, time)
        };
    };

    let time = match clock {
        Some(c) if anchor.evening && !c.unambiguous && c.time.hour() < 12 => {
            NaiveTime::from_hms_opt(c.time.hour() + 12, c.time.minute(), 0)?
        }
        Some(c) => c.time,
        None => NaiveTime::from_hms_opt(anchor.default_time.0, anchor.default_time.1, 0)?,
    };

    let candidate = at_local(anchor.date, time)?;
    if anchor.rolls_weekly && candidate <= now_utc {
        return at_local(anchor.date.checked_add_days(Days::new(7))?, time);
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    /// Wednesday 2026-01-14 10:00 local.
    fn wednesday_morning() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 14, 10, 0, 0).single().unwrap()
    }

    fn local(dt: DateTime<Utc>) -> DateTime<Local> {
        dt.with_timezone(&Local)
    }

    fn resolve(text: &str) -> Option<DateTime<Local>> {
        NaturalTimeResolver
            .resolve(text, wednesday_morning())
            .map(local)
    }

    fn ymd_hm(dt: DateTime<Local>) -> (i32, u32, u32, u32, u32) {
        (dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute())
    }

    #[test]
    fn gibberish_is_unresolved() {
        assert!(resolve("asdkjhaslkdj").is_none());
        assert!(resolve("").is_none());
        assert!(resolve("   ").is_none());
    }

    #[test]
    fn tomorrow_at_8am() {
        let dt = resolve("tomorrow at 8am").unwrap();
        assert_eq!(ymd_hm(dt), (2026, 1, 15, 8, 0));
    }

    #[test]
    fn tomorrow_without_time_defaults_to_nine() {
        let dt = resolve("Tomorrow").unwrap();
        assert_eq!(ymd_hm(dt), (2026, 1, 15, 9, 0));
    }

    #[test]
    fn tonight_shifts_small_hours_to_evening() {
        assert_eq!(ymd_hm(resolve("tonight at 9").unwrap()), (2026, 1, 14, 21, 0));
        assert_eq!(ymd_hm(resolve("tonight").unwrap()), (2026, 1, 14, 20, 0));
        assert_eq!(
            ymd_hm(resolve("tonight at 9am").unwrap()),
            (2026, 1, 14, 9, 0)
        );
    }

    #[test]
    fn meridiem_variants() {
        assert_eq!(ymd_hm(resolve("today at 7:30 pm").unwrap()), (2026, 1, 14, 19, 30));
        assert_eq!(ymd_hm(resolve("today 12am").unwrap()), (2026, 1, 14, 0, 0));
        assert_eq!(ymd_hm(resolve("today 12 p.m.").unwrap()), (2026, 1, 14, 12, 0));
        assert!(resolve("today 13pm").is_none());
    }

    #[test]
    fn bare_clock_rolls_to_next_occurrence() {
        // 11:00 is still ahead at 10:00.
        assert_eq!(ymd_hm(resolve("at 11").unwrap()), (2026, 1, 14, 11, 0));
        // 08:00 has passed, so tomorrow.
        assert_eq!(ymd_hm(resolve("wake me at 8:00").unwrap()), (2026, 1, 15, 8, 0));
        assert_eq!(ymd_hm(resolve("noon").unwrap()), (2026, 1, 14, 12, 0));
        assert_eq!(ymd_hm(resolve("midnight").unwrap()), (2026, 1, 15, 0, 0));
    }

    #[test]
    fn weekday_names() {
        // Friday after a Wednesday.
        assert_eq!(ymd_hm(resolve("friday at 6pm").unwrap()), (2026, 1, 16, 18, 0));
        // Today's weekday with a time still ahead stays today.
        assert_eq!(ymd_hm(resolve("wednesday 11:00").unwrap()), (2026, 1, 14, 11, 0));
        // Today's weekday with a passed time rolls a week.
        assert_eq!(ymd_hm(resolve("wednesday at 8am").unwrap()), (2026, 1, 21, 8, 0));
        // `next` never means today.
        assert_eq!(ymd_hm(resolve("next wednesday").unwrap()), (2026, 1, 21, 9, 0));
        assert_eq!(ymd_hm(resolve("next monday").unwrap()), (2026, 1, 19, 9, 0));
    }

    #[test]
    fn relative_days_and_weeks() {
        let now = wednesday_morning();
        let in_three = NaturalTimeResolver.resolve("in 3 days", now).unwrap();
        assert_eq!(ymd_hm(local(in_three)), (2026, 1, 17, 10, 0));
        let from_now = NaturalTimeResolver
            .resolve("2 weeks from now", now)
            .unwrap();
        assert_eq!(ymd_hm(local(from_now)), (2026, 1, 28, 10, 0));
    }

    #[test]
    fn rfc3339_with_zulu_and_offset() {
        let zulu = NaturalTimeResolver
            .resolve("2026-02-01T08:00:00Z", wednesday_morning())
            .unwrap();
        assert_eq!(zulu, Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap());

        let offset = NaturalTimeResolver
            .resolve("at 2026-02-01 08:00+05:30", wednesday_morning())
            .unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2026, 2, 1, 2, 30, 0).unwrap());
    }

    #[test]
    fn iso_without_offset_is_local() {
        let dt = resolve("2026-02-01 08:15").unwrap();
        assert_eq!(ymd_hm(dt), (2026, 2, 1, 8, 15));
    }

    #[test]
    fn iso_date_alone_or_with_clock() {
        assert_eq!(ymd_hm(resolve("2026-03-05").unwrap()), (2026, 3, 5, 0, 0));
        assert_eq!(ymd_hm(resolve("2026-03-05 at 7pm").unwrap()), (2026, 3, 5, 19, 0));
    }

    #[test]
    fn invalid_calendar_values_are_unresolved() {
        assert!(resolve("2026-02-30T08:00:00z").is_none());
        assert!(resolve("today at 25:00").is_none());
    }

    #[test]
    fn now_resolves_to_reference_instant() {
        let now = wednesday_morning();
        assert_eq!(
            NaturalTimeResolver.resolve("right now", now),
            Some(now.with_timezone(&Utc))
        );
    }

    #[test]
    fn closures_are_resolvers() {
        let fixed = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let resolver = move |_: &str, _: DateTime<Local>| Some(fixed);
        assert_eq!(resolver.resolve("anything", wednesday_morning()), Some(fixed));
    }
}
