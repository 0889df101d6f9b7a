use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::duration::OFF;
use crate::schedule::time_label::{format_range, TimeOfDay, MINUTES_PER_DAY, RANGE_SEPARATOR};

/// Candidate durations advance in half-hour increments
const DURATION_INCREMENT: TimeOfDay = 30;

/// Short list of shifts the editor offers without a custom picker
pub const DEFAULT_COMMON_SHIFTS: [&str; 7] = [
    "8AM–5PM",
    "9AM–6PM",
    "10AM–7PM",
    "11AM–8PM",
    "8AM–2PM",
    "2PM–8PM",
    "8AM–8PM",
];

/// Rules deciding which shift ranges are selectable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftPolicy {
    pub earliest_start: TimeOfDay,
    pub latest_end: TimeOfDay,
    /// Minutes between candidate start times
    pub step: TimeOfDay,
    pub min_duration_hours: f64,
    pub max_duration_hours: f64,
    /// When set, only the `earliest_start..latest_end` range may reach the maximum duration
    pub full_span_exception: bool,
}

impl ShiftPolicy {
    /// 8AM to 8PM, 6 to 12 hour shifts, with only 8AM–8PM allowed to run the full 12 hours
    pub fn capped() -> Self {
        Self {
            earliest_start: 8 * 60,
            latest_end: 20 * 60,
            step: 30,
            min_duration_hours: 6.,
            max_duration_hours: 12.,
            full_span_exception: true,
        }
    }

    /// Every start/end pair inside 8AM to 8PM with the start before the end
    pub fn unrestricted() -> Self {
        let earliest_start = 8 * 60;
        let latest_end = 20 * 60;
        Self {
            earliest_start,
            latest_end,
            step: 30,
            min_duration_hours: DURATION_INCREMENT as f64 / 60.,
            max_duration_hours: (latest_end - earliest_start) as f64 / 60.,
            full_span_exception: false,
        }
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "capped" => Some(Self::capped()),
            "unrestricted" => Some(Self::unrestricted()),
            _ => None,
        }
    }

    /// Check that the policy describes a same-day half-hour grid.
    ///
    /// The window must lie inside one day with its end before midnight, times
    /// and step must fall on half hours, and durations must be positive half
    /// hours with `min <= max <= window`.
    pub fn validate(&self) -> ScheduleResult<()> {
        let invalid = |reason: &str| -> ScheduleResult<()> {
            Err(ScheduleError::Config(format!("shift policy: {}", reason)))
        };

        if self.latest_end >= MINUTES_PER_DAY {
            return invalid("latest_end must be before midnight (1440)");
        }
        if self.earliest_start >= self.latest_end {
            return invalid("earliest_start must be before latest_end");
        }
        if self.earliest_start % DURATION_INCREMENT != 0
            || self.latest_end % DURATION_INCREMENT != 0
        {
            return invalid("earliest_start and latest_end must fall on a half hour");
        }
        if self.step == 0 || self.step % DURATION_INCREMENT != 0 {
            return invalid("step must be a positive multiple of 30 minutes");
        }

        for hours in [self.min_duration_hours, self.max_duration_hours] {
            if !hours.is_finite() || hours <= 0. || (hours * 2.).fract() != 0. {
                return invalid("durations must be positive whole half hours");
            }
        }
        if self.min_duration_hours > self.max_duration_hours {
            return invalid("min_duration_hours is above max_duration_hours");
        }
        let window_hours = (self.latest_end - self.earliest_start) as f64 / 60.;
        if self.max_duration_hours > window_hours {
            return invalid("max_duration_hours is longer than the window");
        }
        Ok(())
    }
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        Self::capped()
    }
}

/// Ordered set of selectable shift labels, always led by `Off`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ShiftOptionSet {
    labels: Vec<String>,
}

impl ShiftOptionSet {
    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

fn hours_to_minutes(hours: f64) -> TimeOfDay {
    (hours.max(0.) * 60.).round() as TimeOfDay
}

/// Generate the selectable shift labels for a policy.
///
/// A policy that fails [`ShiftPolicy::validate`] only offers `Off`.
pub fn generate(policy: &ShiftPolicy) -> ShiftOptionSet {
    let mut labels = vec![OFF.to_string()];
    if let Err(err) = policy.validate() {
        warn!("Offering only {}: {}", OFF, err);
        return ShiftOptionSet { labels };
    }

    let min_duration = hours_to_minutes(policy.min_duration_hours).max(DURATION_INCREMENT);
    let max_duration = hours_to_minutes(policy.max_duration_hours);
    let within_window = |minutes: &TimeOfDay| *minutes <= policy.latest_end;

    let mut seen: HashSet<String> = HashSet::new();
    let mut start = policy.earliest_start;
    while let Some(next_start) = start.checked_add(policy.step).filter(within_window) {
        let mut duration = min_duration;
        while duration <= max_duration {
            let Some(end) = start.checked_add(duration).filter(within_window) else {
                break;
            };

            let full_span_only = policy.full_span_exception && duration == max_duration;
            if !full_span_only || (start == policy.earliest_start && end == policy.latest_end) {
                let label = format_range(start, end);
                if seen.insert(label.clone()) {
                    labels.push(label);
                }
            }

            match duration.checked_add(DURATION_INCREMENT) {
                Some(next) => duration = next,
                None => break,
            }
        }
        start = next_start;
    }

    ShiftOptionSet { labels }
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '-' { RANGE_SEPARATOR } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether a label is `Off` or one of the curated common shifts.
///
/// Whitespace, letter case and hyphen versus en-dash are ignored.
pub fn is_common_or_off<S: AsRef<str>>(label: &str, curated: &[S]) -> bool {
    let label = normalize_label(label);
    if label.is_empty() || label == normalize_label(OFF) {
        return true;
    }
    curated
        .iter()
        .any(|common| normalize_label(common.as_ref()) == label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::duration::hours_of;

    #[test]
    fn test_capped_options_are_bounded() {
        let options = generate(&ShiftPolicy::capped());
        assert_eq!(options.iter().next(), Some("Off"));

        for label in options.iter().skip(1) {
            let hours = hours_of(Some(label));
            assert!((6. ..=12.).contains(&hours), "{} is {} hours", label, hours);
        }

        let full_shifts: Vec<&str> = options
            .iter()
            .filter(|label| hours_of(Some(*label)) == 12.)
            .collect();
        assert_eq!(full_shifts, vec!["8AM–8PM"]);
    }

    #[test]
    fn test_capped_options_respect_window() {
        let options = generate(&ShiftPolicy::capped());
        assert!(options.contains("8AM–2PM"));
        assert!(options.contains("8AM–7:30PM"));
        assert!(options.contains("2PM–8PM"));
        assert!(!options.contains("2:30PM–8PM"));
        assert!(!options.contains("8:30AM–8:30PM"));
        assert!(!options.contains("7:30AM–3PM"));
    }

    #[test]
    fn test_generated_options_have_no_duplicates() {
        for policy in [ShiftPolicy::capped(), ShiftPolicy::unrestricted()] {
            let options = generate(&policy);
            let unique: HashSet<&str> = options.iter().collect();
            assert_eq!(unique.len(), options.len());
        }
    }

    #[test]
    fn test_unrestricted_options_cover_every_pair() {
        let options = generate(&ShiftPolicy::unrestricted());
        // 25 half-hour marks from 8AM to 8PM give 25 * 24 / 2 ordered pairs
        assert_eq!(options.len(), 1 + 300);
        assert!(options.contains("8AM–8:30AM"));
        assert!(options.contains("7:30PM–8PM"));
        assert!(options.contains("8AM–8PM"));
        assert!(options.contains("12PM–12:30PM"));
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ShiftPolicy::capped().validate().is_ok());
        assert!(ShiftPolicy::unrestricted().validate().is_ok());
    }

    #[test]
    fn test_invalid_policies_are_rejected() {
        let capped = ShiftPolicy::capped();
        let invalid = [
            ShiftPolicy { step: 0, ..capped.clone() },
            // quarter-hour starts would produce labels the grid cannot show
            ShiftPolicy { step: 15, ..capped.clone() },
            ShiftPolicy { step: 45, ..capped.clone() },
            ShiftPolicy { earliest_start: 8 * 60 + 15, ..capped.clone() },
            // past midnight, and midnight itself, cannot be labelled as an end
            ShiftPolicy { latest_end: 1500, ..capped.clone() },
            ShiftPolicy { latest_end: MINUTES_PER_DAY, ..capped.clone() },
            ShiftPolicy { earliest_start: 20 * 60, ..capped.clone() },
            ShiftPolicy { earliest_start: 21 * 60, ..capped.clone() },
            ShiftPolicy { min_duration_hours: 1e8, ..capped.clone() },
            ShiftPolicy { min_duration_hours: 13., ..capped.clone() },
            ShiftPolicy { max_duration_hours: 13., ..capped.clone() },
            ShiftPolicy { min_duration_hours: 0., ..capped.clone() },
            ShiftPolicy { min_duration_hours: -6., ..capped.clone() },
            ShiftPolicy { min_duration_hours: 6.25, ..capped.clone() },
            ShiftPolicy { max_duration_hours: f64::NAN, ..capped.clone() },
            ShiftPolicy { max_duration_hours: f64::INFINITY, ..capped.clone() },
        ];

        for policy in invalid {
            assert!(
                matches!(policy.validate(), Err(ScheduleError::Config(_))),
                "expected {:?} to be rejected",
                policy
            );
            assert_eq!(generate(&policy).as_slice(), &["Off".to_string()]);
        }
    }

    #[test]
    fn test_huge_durations_do_not_overflow() {
        let policy = ShiftPolicy {
            min_duration_hours: 1e8,
            max_duration_hours: 1e9,
            ..ShiftPolicy::capped()
        };
        assert_eq!(generate(&policy).len(), 1);
    }

    #[test]
    fn test_valid_custom_policy_labels_are_whole_half_hours() {
        let policy = ShiftPolicy {
            earliest_start: 6 * 60,
            latest_end: 23 * 60 + 30,
            step: 90,
            min_duration_hours: 0.5,
            max_duration_hours: 17.5,
            full_span_exception: false,
        };
        policy.validate().unwrap();

        let options = generate(&policy);
        assert!(options.contains("6AM–11:30PM"));
        for label in options.iter().skip(1) {
            let hours = hours_of(Some(label));
            assert!(hours >= 0.5 && hours <= 17.5, "{} is {} hours", label, hours);
            assert_eq!((hours * 2.).fract(), 0., "{}", label);
        }
    }

    #[test]
    fn test_asymmetric_full_span() {
        let policy = ShiftPolicy {
            earliest_start: 9 * 60,
            latest_end: 17 * 60,
            step: 60,
            min_duration_hours: 4.,
            max_duration_hours: 8.,
            full_span_exception: true,
        };
        let options = generate(&policy);
        let full: Vec<&str> = options
            .iter()
            .filter(|label| hours_of(Some(*label)) == 8.)
            .collect();
        assert_eq!(full, vec!["9AM–5PM"]);
        assert!(options.contains("10AM–5PM"));
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(ShiftPolicy::preset("Capped"), Some(ShiftPolicy::capped()));
        assert_eq!(
            ShiftPolicy::preset("unrestricted"),
            Some(ShiftPolicy::unrestricted())
        );
        assert_eq!(ShiftPolicy::preset("weekend"), None);
    }

    #[test]
    fn test_is_common_or_off() {
        let curated = DEFAULT_COMMON_SHIFTS;
        assert!(is_common_or_off("Off", &curated));
        assert!(is_common_or_off("off", &curated));
        assert!(is_common_or_off("", &curated));
        assert!(is_common_or_off("8AM–5PM", &curated));
        assert!(is_common_or_off("8AM-5PM", &curated));
        assert!(is_common_or_off("8am–5pm", &curated));
        assert!(is_common_or_off(" 8AM – 5PM ", &curated));
        assert!(!is_common_or_off("8:30AM–5PM", &curated));
        assert!(!is_common_or_off("8AM–5PM", &[] as &[&str]));
    }
}
