use chrono::{DateTime, Utc};
use serde::Serialize;

use super::docker::{DockerStats, SystemStats};

/// One successful combined stats fetch. Both halves come from the same tick;
/// a tick where either half failed never produces a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub docker: DockerStats,
    pub system: SystemStats,
    pub fetched_at: DateTime<Utc>,
}

/// What `/api/overview` serves: the last good snapshot plus staleness info
/// when the most recent tick failed.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    #[serde(flatten)]
    pub snapshot: DashboardSnapshot,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
