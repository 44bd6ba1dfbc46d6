//! Game-calendar time helpers: countdown formatting and offset parsing.

use crate::constants::{SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

/// Day and year lengths of the planetary calendar used for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calendar {
    pub seconds_per_day: f64,
    pub seconds_per_year: f64,
}

impl Calendar {
    /// Six-hour days and 426-day years.
    pub const KERBIN: Calendar = Calendar {
        seconds_per_day: 6.0 * SECONDS_PER_HOUR,
        seconds_per_year: 426.0 * 6.0 * SECONDS_PER_HOUR,
    };

    /// 24-hour days and 365-day years.
    pub const EARTH: Calendar = Calendar {
        seconds_per_day: 24.0 * SECONDS_PER_HOUR,
        seconds_per_year: 365.0 * 24.0 * SECONDS_PER_HOUR,
    };

    fn units(&self) -> [(char, f64); 5] {
        [
            ('y', self.seconds_per_year),
            ('d', self.seconds_per_day),
            ('h', SECONDS_PER_HOUR),
            ('m', SECONDS_PER_MINUTE),
            ('s', 1.0),
        ]
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Calendar::KERBIN
    }
}

/// Format a duration as at most `max_units` calendar units, largest first (`"2d 3h 4m"`).
///
/// With `explicit_sign` the output always carries a leading `+ ` or `- `; otherwise only negative
/// durations are prefixed with `-`.
pub fn format_countdown(seconds: f64, calendar: &Calendar, max_units: usize, explicit_sign: bool) -> String {
    if !seconds.is_finite() {
        return "-".to_string();
    }

    let negative = seconds < 0.0;
    let mut remaining = seconds.abs().floor();
    let mut parts = Vec::new();

    for (label, length) in calendar.units() {
        if parts.len() >= max_units.max(1) {
            break;
        }
        let count = (remaining / length).floor();
        if count >= 1.0 || !parts.is_empty() {
            parts.push(format!("{}{}", count as u64, label));
            remaining -= count * length;
        }
    }

    if parts.is_empty() {
        parts.push("0s".to_string());
    }

    let body = parts.join(" ");
    match (explicit_sign, negative) {
        (true, true) => format!("- {body}"),
        (true, false) => format!("+ {body}"),
        (false, true) => format!("-{body}"),
        (false, false) => body,
    }
}

/// Parse an offset like `"1y 2d 3h 4m 5s"` into seconds. Unknown text is ignored; missing units count
/// as zero. Only the first number attached to each unit letter is used.
pub fn parse_offset(text: &str, calendar: &Calendar) -> f64 {
    calendar
        .units()
        .iter()
        .map(|(label, length)| first_value_before(text, *label) * length)
        .sum()
}

/// Absolute UT for an offset string measured from `now`.
pub fn parse_ut(text: &str, now: f64, calendar: &Calendar) -> f64 {
    now + parse_offset(text, calendar)
}

fn first_value_before(text: &str, unit: char) -> f64 {
    let chars: Vec<char> = text.chars().collect();
    let mut start = None;
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_digit() {
            if start.is_none() {
                start = Some(i);
            }
            continue;
        }
        if let Some(s) = start.take() {
            if *c == unit {
                let digits: String = chars[s..i].iter().collect();
                return digits.parse().unwrap_or(0.0);
            }
        }
    }
    0.0
}
