// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT

//! Hand-rolled parser for the small "every ..." cadence grammar (§4.J).
//!
//! Deliberately not backed by the `cron` crate: the grammar configs use is
//! a handful of human phrases ("every 5 minutes", "every day at 07:30",
//! "every monday at 09:00"), not cron syntax, and a dozen-line parser reads
//! more plainly than adapting a 5-field expression evaluator to match it.

use chrono::{DateTime, NaiveTime, TimeZone, Weekday};

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Interval(std::time::Duration),
    DailyAt(NaiveTime),
    WeeklyAt(Weekday, NaiveTime),
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Parses one of:
/// - `"every N <unit>(s)"` with unit in second/minute/hour/day/week
/// - `"every day at HH:MM"`
/// - `"every <weekday> at HH:MM"`
///
/// Returns `None` for anything else rather than erroring — the caller logs
/// and skips an unschedulable heartbeat instead of failing startup.
pub fn parse(expr: &str) -> Option<Cadence> {
    let lowered = expr.trim().to_lowercase();
    let rest = lowered.strip_prefix("every ")?;

    if let Some(time_str) = rest.strip_prefix("day at ") {
        return parse_time(time_str).map(Cadence::DailyAt);
    }

    for (name, weekday) in WEEKDAYS {
        if let Some(time_str) = rest.strip_prefix(name).and_then(|r| r.strip_prefix(" at ")) {
            return parse_time(time_str).map(|t| Cadence::WeeklyAt(weekday, t));
        }
    }

    let mut parts = rest.split_whitespace();
    let count: u64 = parts.next()?.parse().ok()?;
    let unit = parts.next()?.trim_end_matches('s');
    if parts.next().is_some() {
        return None;
    }
    let secs = match unit {
        "second" => count,
        "minute" => count * 60,
        "hour" => count * 3600,
        "day" => count * 86400,
        "week" => count * 604800,
        _ => return None,
    };
    Some(Cadence::Interval(std::time::Duration::from_secs(secs)))
}

/// Whether `cadence` should fire given `now` and the timestamp it last
/// fired (`None` if it has never fired). Daily/weekly cadences fire once
/// per qualifying day, checked by comparing dates rather than exact times
/// since the caller only polls every `check_interval`.
pub fn is_due<Tz: TimeZone>(cadence: &Cadence, last_fired: Option<DateTime<Tz>>, now: DateTime<Tz>) -> bool {
    match cadence {
        Cadence::Interval(duration) => match last_fired {
            None => true,
            Some(last) => (now.clone() - last).to_std().map(|elapsed| elapsed >= *duration).unwrap_or(true),
        },
        Cadence::DailyAt(time) => {
            if now.time() < *time {
                return false;
            }
            match last_fired {
                None => true,
                Some(last) => last.date_naive() != now.date_naive(),
            }
        }
        Cadence::WeeklyAt(weekday, time) => {
            if now.weekday() != *weekday || now.time() < *time {
                return false;
            }
            match last_fired {
                None => true,
                Some(last) => last.date_naive() != now.date_naive(),
            }
        }
    }
}
