use crate::schedule::time_label::{parse_time, split_range, MINUTES_PER_DAY};

/// Sentinel label for a day without a shift
pub const OFF: &str = "Off";

/// Paid hours for a shift label.
///
/// `Off`, empty and missing labels are zero hours. Malformed labels also
/// degrade to zero so that bad historical data never breaks a total. A range
/// whose end is before its start is treated as running past midnight.
pub fn hours_of(label: Option<&str>) -> f64 {
    let label = match label.map(str::trim) {
        None | Some("") | Some(OFF) => return 0.,
        Some(label) => label,
    };

    let Some((start, end)) = split_range(label) else {
        return 0.;
    };

    let (start, end) = match (parse_time(start), parse_time(end)) {
        (Ok(start), Ok(end)) => (start as i64, end as i64),
        _ => return 0.,
    };

    let mut minutes = end - start;
    if minutes < 0 {
        minutes += MINUTES_PER_DAY as i64;
    }

    minutes as f64 / 60.
}

/// Round to the nearest half hour to drop floating point residue
pub fn round_half_hour(hours: f64) -> f64 {
    (hours * 2.).round() / 2.
}
