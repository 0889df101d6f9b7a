use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::duration::round_half_hour;
use crate::schedule::week::{Day, WeekKey};

pub use crate::schedule::employee::{weekly_total, Employee, EmployeeId, EmployeeSummary};

/// Store name and roster used when nothing has been saved for a week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterDefaults {
    pub store_name: String,
    pub employees: Vec<String>,
}

impl Default for RosterDefaults {
    fn default() -> Self {
        Self {
            store_name: "My Schedule".to_string(),
            employees: vec![
                "Employee 1".to_string(),
                "Employee 2".to_string(),
                "Employee 3".to_string(),
            ],
        }
    }
}

/// One store's schedule for one week.
///
/// Every editing operation returns a new snapshot, so anything holding a
/// snapshot for saving or sharing always sees a complete state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSnapshot {
    pub store_id: String,
    pub week: WeekKey,
    pub store_name: String,
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// Set when the snapshot is written to a store, never carried to another week
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub store_id: String,
    pub week: WeekKey,
    pub store_name: String,
    pub employees: Vec<EmployeeSummary>,
    pub total_hours: f64,
}

/// Seed snapshot with the default roster, everyone off
pub fn default_snapshot(
    defaults: &RosterDefaults,
    store_id: impl Into<String>,
    week: WeekKey,
) -> ScheduleSnapshot {
    ScheduleSnapshot {
        store_id: store_id.into(),
        week,
        store_name: defaults.store_name.clone(),
        employees: defaults
            .employees
            .iter()
            .zip(1..)
            .map(|(name, id)| Employee::new(EmployeeId(id), name.clone()))
            .collect(),
        saved_at: None,
    }
}

/// Sum of every employee's weekly total
pub fn grand_total(snapshot: &ScheduleSnapshot) -> f64 {
    let total: f64 = snapshot
        .employees
        .iter()
        .map(|employee| weekly_total(employee, &Day::ALL))
        .sum();
    round_half_hour(total)
}

impl ScheduleSnapshot {
    /// Same roster and shift pattern under another week, without week-specific metadata
    pub fn copy_forward(&self, week: WeekKey) -> ScheduleSnapshot {
        ScheduleSnapshot {
            store_id: self.store_id.clone(),
            week,
            store_name: self.store_name.clone(),
            employees: self.employees.clone(),
            saved_at: None,
        }
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == id)
    }

    fn update_employee(
        &self,
        id: EmployeeId,
        update: impl FnOnce(&mut Employee),
    ) -> ScheduleResult<ScheduleSnapshot> {
        let mut next = self.clone();
        let employee = next
            .employees
            .iter_mut()
            .find(|employee| employee.id == id)
            .ok_or(ScheduleError::UnknownEmployee(id))?;
        update(employee);
        Ok(next)
    }

    pub fn set_shift(
        &self,
        id: EmployeeId,
        day: Day,
        label: impl Into<String>,
    ) -> ScheduleResult<ScheduleSnapshot> {
        let label = label.into();
        self.update_employee(id, |employee| {
            employee.shifts.insert(day, label);
        })
    }

    pub fn rename_employee(
        &self,
        id: EmployeeId,
        name: impl Into<String>,
    ) -> ScheduleResult<ScheduleSnapshot> {
        let name = name.into();
        self.update_employee(id, |employee| employee.name = name)
    }

    /// Append an employee with a fresh id, all days off
    pub fn add_employee(&self, name: impl Into<String>) -> (ScheduleSnapshot, EmployeeId) {
        let id = self.next_employee_id();
        let mut next = self.clone();
        next.employees.push(Employee::new(id, name));
        (next, id)
    }

    pub fn remove_employee(&self, id: EmployeeId) -> ScheduleResult<ScheduleSnapshot> {
        if self.employee(id).is_none() {
            return Err(ScheduleError::UnknownEmployee(id));
        }
        let mut next = self.clone();
        next.employees.retain(|employee| employee.id != id);
        Ok(next)
    }

    pub fn with_store_name(&self, store_name: impl Into<String>) -> ScheduleSnapshot {
        ScheduleSnapshot {
            store_name: store_name.into(),
            ..self.clone()
        }
    }

    pub fn stamped(&self, saved_at: DateTime<Utc>) -> ScheduleSnapshot {
        ScheduleSnapshot {
            saved_at: Some(saved_at),
            ..self.clone()
        }
    }

    /// Lowest positive id not held by any employee
    fn next_employee_id(&self) -> EmployeeId {
        let used: BTreeSet<u32> = self.employees.iter().map(|employee| employee.id.0).collect();
        // n employees cannot fill all of 1..=n+1
        let id = (1..=(self.employees.len() as u32).saturating_add(1))
            .find(|n| !used.contains(n))
            .unwrap_or_else(|| used.last().map_or(1, |max| max.saturating_add(1)));
        debug_assert!(!used.contains(&id), "employee id {} already allocated", id);
        EmployeeId(id)
    }

    pub fn summarize(&self) -> WeekSummary {
        WeekSummary {
            store_id: self.store_id.clone(),
            week: self.week,
            store_name: self.store_name.clone(),
            employees: self.employees.iter().map(EmployeeSummary::of).collect(),
            total_hours: grand_total(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::{path::PathBuf, str::FromStr};

    use chrono::TimeZone;

    use super::*;

    fn week() -> WeekKey {
        "2025-10-13".parse().unwrap()
    }

    fn read_snapshot(path: &str) -> ScheduleSnapshot {
        let path = PathBuf::from_str(path).unwrap();
        let raw = std::fs::read_to_string(path).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_default_snapshot() {
        let snapshot = default_snapshot(&RosterDefaults::default(), "murray", week());

        assert_eq!(snapshot.store_id, "murray");
        assert_eq!(snapshot.store_name, "My Schedule");
        assert_eq!(snapshot.employees.len(), 3);
        assert_eq!(snapshot.employees[2].name, "Employee 3");
        assert!(snapshot
            .employees
            .iter()
            .all(|employee| employee.week_shifts().iter().all(|s| s == "Off")));
        assert_eq!(grand_total(&snapshot), 0.);
    }

    #[test]
    fn test_read_snapshot_from_json_file() {
        let snapshot = read_snapshot("./test_datasets/snapshot_murray.json");

        assert_eq!(snapshot.store_id, "murray");
        assert_eq!(snapshot.week.to_string(), "2025-10-13");
        assert_eq!(snapshot.store_name, "Murdock Hyundai");
        assert_eq!(snapshot.employees.len(), 3);
        assert_eq!(snapshot.employees[0].shift_for(Day::Mon), "8AM–5PM");
        assert_eq!(snapshot.employees[0].shift_for(Day::Sun), "Off");
        assert!(snapshot.saved_at.is_some());
    }

    #[test]
    fn test_totals_from_json_file() {
        let snapshot = read_snapshot("./test_datasets/snapshot_murray.json");

        assert_eq!(weekly_total(&snapshot.employees[0], &Day::ALL), 27.);
        assert_eq!(weekly_total(&snapshot.employees[1], &Day::ALL), 0.);
        assert_eq!(weekly_total(&snapshot.employees[2], &Day::ALL), 18.5);
        assert_eq!(grand_total(&snapshot), 45.5);

        let summary = snapshot.summarize();
        assert_eq!(summary.total_hours, 45.5);
        assert_eq!(summary.employees[2].name, "Priya");
        assert_eq!(summary.employees[2].days_worked, 3);
    }

    #[test]
    fn test_copy_forward_drops_saved_at() {
        let snapshot = read_snapshot("./test_datasets/snapshot_murray.json");
        let next_week = snapshot.week.next().unwrap();
        let copied = snapshot.copy_forward(next_week);

        assert_eq!(copied.week.to_string(), "2025-10-20");
        assert_eq!(copied.employees, snapshot.employees);
        assert_eq!(copied.store_name, snapshot.store_name);
        assert_eq!(copied.saved_at, None);
        assert_eq!(snapshot.week.to_string(), "2025-10-13");
    }

    #[test]
    fn test_mutators_leave_original_untouched() {
        let original = default_snapshot(&RosterDefaults::default(), "murray", week());
        let edited = original
            .set_shift(EmployeeId(1), Day::Mon, "8AM–5PM")
            .unwrap()
            .rename_employee(EmployeeId(1), "Tyler")
            .unwrap();

        assert_eq!(original.employees[0].name, "Employee 1");
        assert_eq!(original.employees[0].shift_for(Day::Mon), "Off");
        assert_eq!(edited.employees[0].name, "Tyler");
        assert_eq!(edited.employees[0].shift_for(Day::Mon), "8AM–5PM");
        assert_eq!(grand_total(&edited), 9.);
    }

    #[test]
    fn test_unknown_employee() {
        let snapshot = default_snapshot(&RosterDefaults::default(), "murray", week());
        assert!(matches!(
            snapshot.set_shift(EmployeeId(42), Day::Mon, "8AM–5PM"),
            Err(ScheduleError::UnknownEmployee(EmployeeId(42)))
        ));
        assert!(snapshot.rename_employee(EmployeeId(42), "x").is_err());
        assert!(snapshot.remove_employee(EmployeeId(42)).is_err());
    }

    #[test]
    fn test_add_employee_reuses_lowest_free_id() {
        let snapshot = default_snapshot(&RosterDefaults::default(), "murray", week());
        let snapshot = snapshot.remove_employee(EmployeeId(2)).unwrap();

        let (snapshot, id) = snapshot.add_employee("Derrick");
        assert_eq!(id, EmployeeId(2));
        assert_eq!(snapshot.employees.last().unwrap().name, "Derrick");

        let (snapshot, id) = snapshot.add_employee("Priya");
        assert_eq!(id, EmployeeId(4));
        assert_eq!(snapshot.employees.len(), 4);
    }

    #[test]
    fn test_add_employee_never_collides() {
        let mut snapshot = ScheduleSnapshot {
            store_id: "murray".to_string(),
            week: week(),
            store_name: "Murdock Hyundai".to_string(),
            employees: vec![
                Employee::new(EmployeeId(5), "a"),
                Employee::new(EmployeeId(1), "b"),
                Employee::new(EmployeeId(3), "c"),
            ],
            saved_at: None,
        };
        for i in 0..20 {
            let (next, _) = snapshot.add_employee(format!("new {}", i));
            snapshot = next;
            if i % 3 == 0 {
                let first = snapshot.employees[0].id;
                snapshot = snapshot.remove_employee(first).unwrap();
            }
            let ids: HashSet<EmployeeId> = snapshot.employees.iter().map(|e| e.id).collect();
            assert_eq!(ids.len(), snapshot.employees.len());
        }
    }

    #[test]
    fn test_with_store_name_and_stamp() {
        let snapshot = default_snapshot(&RosterDefaults::default(), "murray", week());
        let at = Utc.with_ymd_and_hms(2025, 10, 14, 15, 0, 0).unwrap();
        let named = snapshot.with_store_name("Murdock Hyundai").stamped(at);

        assert_eq!(named.store_name, "Murdock Hyundai");
        assert_eq!(named.saved_at, Some(at));
        assert_eq!(snapshot.saved_at, None);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = default_snapshot(&RosterDefaults::default(), "murray", week())
            .set_shift(EmployeeId(1), Day::Tue, "9AM–6PM")
            .unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["storeId"], "murray");
        assert_eq!(json["week"], "2025-10-13");
        assert_eq!(json["employees"][0]["id"], 1);
        assert_eq!(json["employees"][0]["shifts"]["tue"], "9AM–6PM");
        assert!(json.get("savedAt").is_none());
    }
}
