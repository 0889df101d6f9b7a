use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::snapshot::{Employee, EmployeeId, ScheduleSnapshot};
use crate::schedule::week::WeekKey;

const TOKEN_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedEmployee {
    pub name: String,
    pub shifts: [String; 7],
}

/// The part of a snapshot carried in a share link. Employee ids are not carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotProjection {
    pub v: u32,
    #[serde(rename = "storeId")]
    pub store_id: String,
    #[serde(rename = "weekISO")]
    pub week: WeekKey,
    #[serde(rename = "storeName")]
    pub store_name: String,
    pub employees: Vec<SharedEmployee>,
}

impl SnapshotProjection {
    pub fn of(snapshot: &ScheduleSnapshot) -> Self {
        Self {
            v: TOKEN_VERSION,
            store_id: snapshot.store_id.clone(),
            week: snapshot.week,
            store_name: snapshot.store_name.clone(),
            employees: snapshot
                .employees
                .iter()
                .map(|employee| SharedEmployee {
                    name: employee.name.clone(),
                    shifts: employee.week_shifts(),
                })
                .collect(),
        }
    }

    /// Rebuild a snapshot, numbering employees from 1 in list order
    pub fn into_snapshot(self) -> ScheduleSnapshot {
        ScheduleSnapshot {
            store_id: self.store_id,
            week: self.week,
            store_name: self.store_name,
            employees: self
                .employees
                .into_iter()
                .zip(1..)
                .map(|(shared, id)| Employee::with_week(EmployeeId(id), shared.name, &shared.shifts))
                .collect(),
            saved_at: None,
        }
    }
}

/// Encode a snapshot as a URL-safe token (base64url JSON, no padding)
pub fn encode(snapshot: &ScheduleSnapshot) -> ScheduleResult<String> {
    let json = serde_json::to_vec(&SnapshotProjection::of(snapshot))
        .map_err(|e| ScheduleError::MalformedSnapshotToken(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a token produced by [`encode`]
pub fn decode(token: &str) -> ScheduleResult<SnapshotProjection> {
    let malformed = |reason: String| ScheduleError::MalformedSnapshotToken(reason);

    let bytes = URL_SAFE_NO_PAD
        .decode(token.trim().trim_end_matches('='))
        .map_err(|e| malformed(format!("not base64url: {}", e)))?;
    let projection: SnapshotProjection =
        serde_json::from_slice(&bytes).map_err(|e| malformed(format!("bad payload: {}", e)))?;

    if projection.v != TOKEN_VERSION {
        return Err(malformed(format!("unsupported version {}", projection.v)));
    }
    Ok(projection)
}
