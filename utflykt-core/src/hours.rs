//! Interpreter for the restricted opening-hours mini-language.
//!
//! Real-world opening-hours strings are free text with many dialects. This
//! evaluator understands a constrained subset (`24/7`, day selectors with
//! time spans, explicit `off` days) and fails safe to [`OpenState::Unknown`]
//! for anything else, so callers can distinguish "parsed but currently
//! closed" from "could not parse".

use chrono::{DateTime, Datelike as _, NaiveTime, TimeZone};

/// Weekday tokens in Monday-first order, matching the mini-language.
pub const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Three-valued availability result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenState {
    /// The evaluation instant falls inside an opening span.
    Open,
    /// The specification was interpretable but no span matched.
    Closed,
    /// The specification carried no interpretable structure.
    Unknown,
}

impl OpenState {
    /// Collapse to the tri-state stored on a place record: `None` when the
    /// specification could not be interpreted.
    pub fn as_open_now(self) -> Option<bool> {
        match self {
            Self::Open => Some(true),
            Self::Closed => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Evaluate an opening-hours specification at the given instant.
///
/// The instant's time zone determines the weekday and time of day; pass a
/// zoned `DateTime` (e.g. `chrono_tz::Europe::Stockholm`) for local
/// semantics. Span boundaries are inclusive at both ends.
///
/// # Examples
/// ```
/// use chrono::{TimeZone as _, Utc};
/// use utflykt_core::{evaluate, OpenState};
///
/// // 2024-01-01 was a Monday.
/// let monday_noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
/// assert_eq!(evaluate("Mo-Fr 09:00-17:00", &monday_noon), OpenState::Open);
/// assert_eq!(evaluate("24/7", &monday_noon), OpenState::Open);
/// assert_eq!(evaluate("banana", &monday_noon), OpenState::Unknown);
/// ```
pub fn evaluate<Tz: TimeZone>(spec: &str, at: &DateTime<Tz>) -> OpenState {
    let spec = spec.trim();
    if spec.is_empty() {
        return OpenState::Unknown;
    }
    if spec.eq_ignore_ascii_case("24/7") {
        return OpenState::Open;
    }

    let weekday = at.weekday().num_days_from_monday() as usize;
    let now = at.time();
    let mut interpretable = false;

    for rule in spec.split(';').map(str::trim).filter(|r| !r.is_empty()) {
        // Explicit closure: "Su off". Counts as structure only when it
        // names today; other days' closures say nothing about now.
        if let Some(day_part) = rule.strip_suffix(" off") {
            if expand_days(day_part).contains(&weekday) {
                interpretable = true;
            }
            continue;
        }

        let Some((day_part, time_part)) = rule.split_once(char::is_whitespace) else {
            continue;
        };
        if !day_part
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ',' || c == '-')
        {
            continue;
        }
        let days = expand_days(day_part);

        let mut valid_span = false;
        for span in time_part.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((start, end)) = parse_span(span) else {
                continue;
            };
            valid_span = true;
            if days.contains(&weekday) && start <= now && now <= end {
                return OpenState::Open;
            }
        }
        if valid_span {
            interpretable = true;
        }
    }

    if interpretable {
        OpenState::Closed
    } else {
        OpenState::Unknown
    }
}

/// Expand a day selector (`"Mo,We"`, `"Fr-Mo"`) into Monday-first indices.
///
/// Ranges wrap across the week boundary when the end token precedes the
/// start token. Unknown tokens are dropped; order is preserved without
/// duplicates.
fn expand_days(selector: &str) -> Vec<usize> {
    let mut days = Vec::new();
    for part in selector.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let (Some(start), Some(end)) = (day_index(start.trim()), day_index(end.trim())) else {
                continue;
            };
            if start <= end {
                days.extend(start..=end);
            } else {
                days.extend(start..WEEKDAYS.len());
                days.extend(0..=end);
            }
        } else if let Some(day) = day_index(part) {
            days.push(day);
        }
    }
    let mut seen = [false; 7];
    days.retain(|&d| !std::mem::replace(&mut seen[d], true));
    days
}

fn day_index(token: &str) -> Option<usize> {
    WEEKDAYS.iter().position(|&wd| wd == token)
}

/// Parse one `HH:MM-HH:MM` span; both components must be two digits.
fn parse_span(span: &str) -> Option<(NaiveTime, NaiveTime)> {
    let (start, end) = span.split_once('-')?;
    Some((parse_time(start)?, parse_time(end)?))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let (hours, minutes) = text.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(hours.parse().ok()?, minutes.parse().ok()?, 0)
}
