use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::form_urlencoded;

use crate::config::Config;
use crate::error::{persistence_error, ScheduleResult};
use crate::schedule::snapshot::{default_snapshot, ScheduleSnapshot};
use crate::schedule::week::WeekKey;

/// Key a snapshot is stored under, e.g. `schedule:murray:2025-10-13`
pub fn storage_key(store_id: &str, week: WeekKey) -> String {
    format!("schedule:{}:{}", store_id, week)
}

/// Key a store's display name is stored under, e.g. `schedule:storeName:murray`
pub fn store_name_key(store_id: &str) -> String {
    format!("schedule:storeName:{}", store_id)
}

/// Somewhere snapshots can be loaded from and saved to
pub trait SnapshotStore {
    /// `Ok(None)` when nothing has been saved for this store and week
    fn load(&self, store_id: &str, week: WeekKey) -> ScheduleResult<Option<ScheduleSnapshot>>;

    /// Replace whatever is stored for this store and week
    fn save(&self, store_id: &str, week: WeekKey, snapshot: &ScheduleSnapshot)
        -> ScheduleResult<()>;

    /// Display name chosen for a store, shared by all of its weeks
    fn load_store_name(&self, store_id: &str) -> ScheduleResult<Option<String>>;

    fn save_store_name(&self, store_id: &str, store_name: &str) -> ScheduleResult<()>;
}

/// Process-local store, used by tests and embedders
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshots: RwLock<HashMap<String, ScheduleSnapshot>>,
    store_names: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> crate::error::ScheduleError {
    persistence_error(format!("lock poisoned: {}", e))
}

impl SnapshotStore for InMemoryStore {
    fn load(&self, store_id: &str, week: WeekKey) -> ScheduleResult<Option<ScheduleSnapshot>> {
        let snapshots = self.snapshots.read().map_err(poisoned)?;
        Ok(snapshots.get(&storage_key(store_id, week)).cloned())
    }

    fn save(
        &self,
        store_id: &str,
        week: WeekKey,
        snapshot: &ScheduleSnapshot,
    ) -> ScheduleResult<()> {
        let mut snapshots = self.snapshots.write().map_err(poisoned)?;
        snapshots.insert(storage_key(store_id, week), snapshot.clone());
        Ok(())
    }

    fn load_store_name(&self, store_id: &str) -> ScheduleResult<Option<String>> {
        let store_names = self.store_names.read().map_err(poisoned)?;
        Ok(store_names.get(&store_name_key(store_id)).cloned())
    }

    fn save_store_name(&self, store_id: &str, store_name: &str) -> ScheduleResult<()> {
        let mut store_names = self.store_names.write().map_err(poisoned)?;
        store_names.insert(store_name_key(store_id), store_name.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreInfo {
    store_name: String,
}

/// One pretty-printed JSON document per `<root>/<store>/<week>.json`, plus
/// `<root>/<store>/store.json` for the display name.
///
/// Any non-empty store id is accepted. The directory name is the id
/// percent-encoded, with `.` also escaped, so ids like `../etc` or
/// `murray.lot` stay a single directory under the root.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, store_id: &str) -> ScheduleResult<PathBuf> {
        if store_id.is_empty() {
            return Err(persistence_error("store id must not be empty"));
        }
        let encoded: String = form_urlencoded::byte_serialize(store_id.as_bytes())
            .collect::<String>()
            .replace('.', "%2E")
            .replace('*', "%2A");
        Ok(self.root.join(encoded))
    }

    fn path_for(&self, store_id: &str, week: WeekKey) -> ScheduleResult<PathBuf> {
        Ok(self.store_dir(store_id)?.join(format!("{}.json", week)))
    }

    /// Contents of `path`, or `None` when it does not exist
    fn read_optional(path: &Path) -> ScheduleResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Nothing saved at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(persistence_error(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> ScheduleResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                persistence_error(format!("failed to create {}: {}", dir.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| persistence_error(format!("failed to serialize: {}", e)))?;
        fs::write(path, json).map_err(|e| {
            persistence_error(format!("failed to write {}: {}", path.display(), e))
        })
    }
}

impl SnapshotStore for JsonDirStore {
    fn load(&self, store_id: &str, week: WeekKey) -> ScheduleResult<Option<ScheduleSnapshot>> {
        let path = self.path_for(store_id, week)?;
        let Some(raw) = Self::read_optional(&path)? else {
            return Ok(None);
        };

        let snapshot = serde_json::from_str(&raw).map_err(|e| {
            persistence_error(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    fn save(
        &self,
        store_id: &str,
        week: WeekKey,
        snapshot: &ScheduleSnapshot,
    ) -> ScheduleResult<()> {
        Self::write_json(&self.path_for(store_id, week)?, snapshot)?;
        info!("Saved schedule for {} week {}", store_id, week);
        Ok(())
    }

    fn load_store_name(&self, store_id: &str) -> ScheduleResult<Option<String>> {
        let path = self.store_dir(store_id)?.join("store.json");
        let Some(raw) = Self::read_optional(&path)? else {
            return Ok(None);
        };

        let info: StoreInfo = serde_json::from_str(&raw).map_err(|e| {
            persistence_error(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(info.store_name))
    }

    fn save_store_name(&self, store_id: &str, store_name: &str) -> ScheduleResult<()> {
        let info = StoreInfo {
            store_name: store_name.to_string(),
        };
        Self::write_json(&self.store_dir(store_id)?.join("store.json"), &info)
    }
}

/// Load the schedule for a week, seeding one when nothing is saved.
///
/// With copy-forward enabled the previous week's roster and shifts are
/// carried over; otherwise the configured default roster is used. A seeded
/// or copied week takes the store's saved display name. Load failures are
/// returned, never replaced by a seed.
pub fn open_week(
    store: &dyn SnapshotStore,
    config: &Config,
    store_id: &str,
    week: WeekKey,
) -> ScheduleResult<ScheduleSnapshot> {
    if let Some(snapshot) = store.load(store_id, week)? {
        return Ok(snapshot);
    }

    let mut seeded = None;
    if config.copy_forward {
        if let Ok(previous_week) = week.previous() {
            if let Some(previous) = store.load(store_id, previous_week)? {
                info!(
                    "Copying schedule for {} forward from {} to {}",
                    store_id, previous_week, week
                );
                seeded = Some(previous.copy_forward(week));
            }
        }
    }

    let snapshot = match seeded {
        Some(snapshot) => snapshot,
        None => {
            info!("Seeding default schedule for {} week {}", store_id, week);
            default_snapshot(&config.roster(), store_id, week)
        }
    };

    match store.load_store_name(store_id)? {
        Some(store_name) => Ok(snapshot.with_store_name(store_name)),
        None => Ok(snapshot),
    }
}

/// Stamp and save a snapshot, returning the stamped copy
pub fn save_snapshot(
    store: &dyn SnapshotStore,
    snapshot: &ScheduleSnapshot,
    now: DateTime<Utc>,
) -> ScheduleResult<ScheduleSnapshot> {
    let stamped = snapshot.stamped(now);
    store.save(&stamped.store_id, stamped.week, &stamped)?;
    Ok(stamped)
}

/// Remember the store's display name and apply it to `snapshot`
pub fn rename_store(
    store: &dyn SnapshotStore,
    snapshot: &ScheduleSnapshot,
    store_name: &str,
) -> ScheduleResult<ScheduleSnapshot> {
    let store_name = store_name.trim();
    if store_name.is_empty() {
        return Err(persistence_error("store name must not be empty"));
    }
    store.save_store_name(&snapshot.store_id, store_name)?;
    Ok(snapshot.with_store_name(store_name))
}
