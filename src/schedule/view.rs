use chrono::NaiveDate;
use tracing::warn;
use url::form_urlencoded;

use crate::schedule::snapshot::ScheduleSnapshot;
use crate::schedule::transport::decode;
use crate::schedule::week::{resolve_week_param, WeekKey};

pub const DEFAULT_STORE_ID: &str = "default";

/// Parameters a schedule link can carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub store: Option<String>,
    pub week: Option<String>,
    pub manager: bool,
    /// Share token, from the `share` parameter or the URL fragment
    pub share: Option<String>,
}

impl ViewParams {
    /// Parse `store=..&week=..&manager=1&share=..`, with or without a leading `?`
    pub fn from_query(query: &str) -> Self {
        let mut params = ViewParams::default();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "store" => params.store = Some(value.to_string()),
                "week" => params.week = Some(value.to_string()),
                "manager" => params.manager = value == "1",
                "share" => params.share = Some(value.to_string()),
                _ => {}
            }
        }
        params
    }

    /// Take the share token from a URL fragment when the query did not carry one
    pub fn with_fragment(mut self, fragment: &str) -> Self {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment).trim();
        if self.share.is_none() && !fragment.is_empty() {
            self.share = Some(fragment.to_string());
        }
        self
    }

    pub fn store_id(&self) -> &str {
        self.store.as_deref().unwrap_or(DEFAULT_STORE_ID)
    }
}

/// How a request should be rendered
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMode {
    /// A shared snapshot, always read-only
    Shared(ScheduleSnapshot),
    Edit { store_id: String, week: WeekKey },
    ReadOnly { store_id: String, week: WeekKey },
}

impl ViewMode {
    pub fn is_editable(&self) -> bool {
        matches!(self, ViewMode::Edit { .. })
    }
}

/// Decide what to show for a link.
///
/// A valid share token wins over every other parameter. Editing needs both
/// the manager flag and an authorized session. A broken token or week falls
/// back to the unshared view of the current week.
pub fn resolve_view(params: &ViewParams, today: NaiveDate, authorized: bool) -> ViewMode {
    if let Some(token) = &params.share {
        match decode(token) {
            Ok(projection) => return ViewMode::Shared(projection.into_snapshot()),
            Err(err) => warn!("Ignoring share token: {}", err),
        }
    }

    let store_id = params.store_id().to_string();
    let week = resolve_week_param(params.week.as_deref(), today);
    if params.manager && authorized {
        ViewMode::Edit { store_id, week }
    } else {
        ViewMode::ReadOnly { store_id, week }
    }
}
