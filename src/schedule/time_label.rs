use crate::error::{ScheduleError, ScheduleResult};

/// Minutes past midnight, in `[0, 1440)`
pub type TimeOfDay = u32;

pub const MINUTES_PER_DAY: TimeOfDay = 24 * 60;

/// Separator used between the start and end of a range label
pub const RANGE_SEPARATOR: char = '–';

/// Format minutes past midnight as a compact 12-hour label such as `8AM` or `11:30AM`.
///
/// The caller normalizes values into `[0, 1440)`; nothing is wrapped here.
pub fn format_time(minutes: TimeOfDay) -> String {
    let hour = minutes / 60;
    let minute = minutes % 60;

    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };

    if minute == 0 {
        format!("{}{}", display_hour, suffix)
    } else {
        format!("{}:{:02}{}", display_hour, minute, suffix)
    }
}

/// Parse a 12-hour clock token (`8AM`, `11:30am`, `12PM`) into minutes past midnight.
///
/// Minutes are optional and take exactly two digits, so every label
/// [`format_time`] writes parses back.
pub fn parse_time(label: &str) -> ScheduleResult<TimeOfDay> {
    let malformed = || ScheduleError::MalformedTimeLabel(label.to_string());

    let token = label.trim();
    if token.len() < 3 || !token.is_ascii() {
        return Err(malformed());
    }

    let (clock, suffix) = token.split_at(token.len() - 2);
    let is_pm = match suffix.to_ascii_uppercase().as_str() {
        "AM" => false,
        "PM" => true,
        _ => return Err(malformed()),
    };

    let (hour_part, minute) = match clock.split_once(':') {
        Some((hour_part, minute_part)) => {
            if minute_part.len() != 2 || !minute_part.chars().all(|c| c.is_ascii_digit()) {
                return Err(malformed());
            }
            let minute: u32 = minute_part.parse().map_err(|_| malformed())?;
            if minute >= 60 {
                return Err(malformed());
            }
            (hour_part, minute)
        }
        None => (clock, 0),
    };

    if hour_part.is_empty()
        || hour_part.len() > 2
        || !hour_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }

    let hour: u32 = hour_part.parse().map_err(|_| malformed())?;
    if !(1..=12).contains(&hour) {
        return Err(malformed());
    }

    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    Ok(hour * 60 + minute)
}

/// Format a start/end pair as a range label such as `8AM–5PM`.
///
/// No ordering check is done; generators and callers own that.
pub fn format_range(start: TimeOfDay, end: TimeOfDay) -> String {
    format!("{}{}{}", format_time(start), RANGE_SEPARATOR, format_time(end))
}

/// Split a range label into its start and end tokens.
///
/// Accepts the en-dash and a plain hyphen. Returns `None` unless there are exactly two parts.
pub fn split_range(label: &str) -> Option<(&str, &str)> {
    let mut parts = label.split(|c: char| c == RANGE_SEPARATOR || c == '-');
    let start = parts.next()?;
    let end = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((start, end))
}

/// Strictly decode a range label into its start and end, surfacing any malformed token
pub fn parse_range(label: &str) -> ScheduleResult<(TimeOfDay, TimeOfDay)> {
    let (start, end) =
        split_range(label).ok_or_else(|| ScheduleError::MalformedTimeLabel(label.to_string()))?;
    Ok((parse_time(start)?, parse_time(end)?))
}
