//! Due-date input parsing and relative formatting for the command line.

use chrono::{Datelike, Duration, NaiveDate};

use crate::db::start_end_of_week;
use crate::error::{Error, Result};

const WEEKDAYS: [(&str, &str, u32); 7] = [
    ("monday", "mon", 0),
    ("tuesday", "tue", 1),
    ("wednesday", "wed", 2),
    ("thursday", "thu", 3),
    ("friday", "fri", 4),
    ("saturday", "sat", 5),
    ("sunday", "sun", 6),
];

/// Parse a due date typed by a person, relative to `today`.
///
/// Accepts `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday`, `eow`/`end of week`,
/// `eom`/`end of month`, `in 3d`/`in 2w`/`in 1m`, and weekday names
/// (`fri`, `this friday`, `next friday`).
pub fn parse_due_input(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = input.trim().to_lowercase();
    let invalid = || {
        Error::validation(
            "due date",
            format!("'{input}' is not a date; use YYYY-MM-DD, 'today', 'tomorrow', 'in Nd' or a weekday"),
        )
    };

    match s.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        "end of week" | "eow" => return Ok(start_end_of_week(today).1),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
            return Ok(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let unit = rest.chars().last().ok_or_else(invalid)?;
        let amount = &rest[..rest.len() - unit.len_utf8()];
        let n: i64 = amount.trim().parse().map_err(|_| invalid())?;
        let days = match unit {
            'd' => Some(n),
            'w' => n.checked_mul(7),
            // Months are approximated as 30 days.
            'm' => n.checked_mul(30),
            _ => return Err(invalid()),
        };
        return days
            .and_then(Duration::try_days)
            .and_then(|offset| today.checked_add_signed(offset))
            .ok_or_else(invalid);
    }

    let (next_week, day_name) = match s.split_once(' ') {
        Some(("next", rest)) => (true, rest),
        Some(("this", rest)) => (false, rest),
        _ => (false, s.as_str()),
    };
    if let Some(&(_, _, target)) = WEEKDAYS.iter().find(|(long, short, _)| *long == day_name || *short == day_name) {
        let current = today.weekday().num_days_from_monday();
        let mut ahead = i64::from((target + 7 - current) % 7);
        if next_week {
            ahead += 7;
        }
        return Ok(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Describe a due date relative to `today`: "today", "tomorrow", "in 3d", "2d late".
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(d) = due else {
        return "-".into();
    };
    match (d - today).num_days() {
        0 => "today".into(),
        1 => "tomorrow".into(),
        n if n > 1 => format!("in {n}d"),
        n => format!("{}d late", -n),
    }
}
