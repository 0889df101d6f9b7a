use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::options::{
    generate, is_common_or_off, ShiftOptionSet, ShiftPolicy, DEFAULT_COMMON_SHIFTS,
};
use crate::schedule::snapshot::RosterDefaults;
use crate::schedule::week::WeekKey;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/schedule.toml";

/// A named preset (`"capped"`, `"unrestricted"`) or a full policy table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicySetting {
    Preset(String),
    Custom(ShiftPolicy),
}

impl Default for PolicySetting {
    fn default() -> Self {
        PolicySetting::Preset("capped".to_string())
    }
}

/// Application settings, supplied once at start-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
    pub default_store_name: String,
    pub default_roster: Vec<String>,
    /// Shifts offered without the custom picker
    pub common_shifts: Vec<String>,
    pub policy: PolicySetting,
    /// Carry last week's schedule into a week with nothing saved
    pub copy_forward: bool,
    pub data_dir: PathBuf,
    /// Shared secret that unlocks editing
    pub admin_pass: String,
}

impl Default for Config {
    fn default() -> Self {
        let roster = RosterDefaults::default();
        Self {
            timezone: "America/Chicago".to_string(),
            default_store_name: roster.store_name,
            default_roster: roster.employees,
            common_shifts: DEFAULT_COMMON_SHIFTS.iter().map(|s| s.to_string()).collect(),
            policy: PolicySetting::default(),
            copy_forward: true,
            data_dir: PathBuf::from("data"),
            admin_pass: "admin123".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file (defaults when it is missing), then apply environment overrides
    pub fn load(path: Option<&Path>) -> ScheduleResult<Self> {
        dotenv().ok();
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// [`Config::load`] with the environment supplied by `lookup`
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ScheduleResult<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let mut config = match fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loading configuration from {}", path.display());
                Self::from_toml_str(&content)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ScheduleResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `SCHEDULE_TIMEZONE`, `SCHEDULE_STORE_NAME`, `SCHEDULE_DATA_DIR` and `ADMIN_PASS`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(timezone) = lookup("SCHEDULE_TIMEZONE") {
            self.timezone = timezone;
        }
        if let Some(store_name) = lookup("SCHEDULE_STORE_NAME") {
            self.default_store_name = store_name;
        }
        if let Some(data_dir) = lookup("SCHEDULE_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(admin_pass) = lookup("ADMIN_PASS") {
            self.admin_pass = admin_pass;
        }
    }

    fn validate(&self) -> ScheduleResult<()> {
        self.tz()?;
        self.shift_policy()?.validate()
    }

    pub fn tz(&self) -> ScheduleResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ScheduleError::Config(format!("unknown timezone {:?}", self.timezone)))
    }

    pub fn shift_policy(&self) -> ScheduleResult<ShiftPolicy> {
        match &self.policy {
            PolicySetting::Preset(name) => ShiftPolicy::preset(name)
                .ok_or_else(|| ScheduleError::Config(format!("unknown policy preset {:?}", name))),
            PolicySetting::Custom(policy) => Ok(policy.clone()),
        }
    }

    pub fn shift_options(&self) -> ScheduleResult<ShiftOptionSet> {
        Ok(generate(&self.shift_policy()?))
    }

    pub fn is_common_or_off(&self, label: &str) -> bool {
        is_common_or_off(label, &self.common_shifts)
    }

    pub fn roster(&self) -> RosterDefaults {
        RosterDefaults {
            store_name: self.default_store_name.clone(),
            employees: self.default_roster.clone(),
        }
    }

    /// Calendar date right now in the configured timezone
    pub fn today(&self) -> ScheduleResult<NaiveDate> {
        Ok(Utc::now().with_timezone(&self.tz()?).date_naive())
    }

    pub fn current_week(&self) -> ScheduleResult<WeekKey> {
        Ok(WeekKey::from_date(self.today()?))
    }

    /// Whether `secret` unlocks editing
    pub fn is_authorized(&self, secret: &str) -> bool {
        !self.admin_pass.is_empty() && secret == self.admin_pass
    }
}
