use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schedule::duration::{hours_of, round_half_hour, OFF};
use crate::schedule::week::Day;

/// Local editing identity of an employee row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u32);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    /// May be empty while the row is being edited
    #[serde(default)]
    pub name: String,
    /// Days without an entry are off
    #[serde(default)]
    pub shifts: BTreeMap<Day, String>,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            shifts: BTreeMap::new(),
        }
    }

    /// Build an employee from a Monday-first list of labels
    pub fn with_week(id: EmployeeId, name: impl Into<String>, week: &[String; 7]) -> Self {
        Self {
            id,
            name: name.into(),
            shifts: Day::ALL
                .iter()
                .zip(week.iter())
                .map(|(day, label)| (*day, label.clone()))
                .collect(),
        }
    }

    pub fn shift_for(&self, day: Day) -> &str {
        self.shifts.get(&day).map(String::as_str).unwrap_or(OFF)
    }

    /// Monday-first labels with `Off` filled in
    pub fn week_shifts(&self) -> [String; 7] {
        Day::ALL.map(|day| self.shift_for(day).to_string())
    }
}

/// Hours across `days`, rounded to the nearest half hour
pub fn weekly_total(employee: &Employee, days: &[Day]) -> f64 {
    let hours: f64 = days
        .iter()
        .map(|day| hours_of(employee.shifts.get(day).map(String::as_str)))
        .sum();
    round_half_hour(hours)
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub employee_id: EmployeeId,
    pub name: String,
    pub hours: f64,
    pub days_worked: usize,
}

impl EmployeeSummary {
    pub fn of(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id,
            name: employee.name.clone(),
            hours: weekly_total(employee, &Day::ALL),
            days_worked: Day::ALL
                .iter()
                .filter(|day| hours_of(Some(employee.shift_for(**day))) > 0.)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn week(labels: [&str; 7]) -> [String; 7] {
        labels.map(str::to_string)
    }

    #[test]
    fn test_weekly_total() {
        let employee = Employee::with_week(
            EmployeeId(1),
            "Tyler",
            &week(["8AM–5PM", "Off", "8AM–5PM", "Off", "8AM–5PM", "Off", "Off"]),
        );
        assert_eq!(weekly_total(&employee, &Day::ALL), 27.);
        assert_eq!(weekly_total(&employee, &[Day::Mon, Day::Tue]), 9.);
    }

    #[test]
    fn test_weekly_total_ignores_malformed_days() {
        let employee = Employee::with_week(
            EmployeeId(1),
            "Derrick",
            &week(["8AM–2:30PM", "garbage", "", "8AM", "Off", "10PM–6AM", "Off"]),
        );
        assert_eq!(weekly_total(&employee, &Day::ALL), 14.5);
    }

    #[test]
    fn test_missing_days_are_off() {
        let mut employee = Employee::new(EmployeeId(3), "Sam");
        employee.shifts.insert(Day::Wed, "9AM–6PM".to_string());

        assert_eq!(employee.shift_for(Day::Mon), "Off");
        assert_eq!(employee.shift_for(Day::Wed), "9AM–6PM");
        assert_eq!(
            employee.week_shifts(),
            week(["Off", "Off", "9AM–6PM", "Off", "Off", "Off", "Off"])
        );
    }

    #[test]
    fn test_employee_summary() {
        let employee = Employee::with_week(
            EmployeeId(7),
            "Tyler",
            &week(["8AM–5PM", "Off", "8AM–8PM", "Off", "Off", "Off", "Off"]),
        );
        let summary = EmployeeSummary::of(&employee);
        assert_eq!(summary.hours, 21.);
        assert_eq!(summary.days_worked, 2);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["employeeId"], 7);
        assert_eq!(json["daysWorked"], 2);
    }
}
