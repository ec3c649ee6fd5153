use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

use super::{BackendClient, ClientError};
use crate::models::views::{DashboardSnapshot, OverviewResponse};

/// Background refresh loop for the dashboard. Fetches resource counts and host
/// system stats together on a fixed interval; a tick counts only if both calls
/// succeed. The last good snapshot is retained across failed ticks, so the
/// dashboard never regresses to a blank state once it has rendered.
pub struct StatsPoller {
    backend: Arc<BackendClient>,
    interval: Duration,
    state: RwLock<StatsState>,
}

#[derive(Default)]
struct StatsState {
    // Generation guard: a tick that started before a newer tick finished must
    // not overwrite the newer result.
    next_generation: u64,
    applied_generation: u64,
    snapshot: Option<DashboardSnapshot>,
    error: Option<String>,
}

impl StatsPoller {
    pub fn new(backend: Arc<BackendClient>, interval_secs: u64) -> Self {
        Self {
            backend,
            interval: Duration::from_secs(interval_secs),
            state: RwLock::new(StatsState::default()),
        }
    }

    /// Current dashboard state. `Err` only before the first successful tick.
    pub async fn overview(&self) -> Result<OverviewResponse, String> {
        let state = self.state.read().await;
        match &state.snapshot {
            Some(snapshot) => Ok(OverviewResponse {
                snapshot: snapshot.clone(),
                stale: state.error.is_some(),
                error: state.error.clone(),
            }),
            None => Err(state
                .error
                .clone()
                .unwrap_or_else(|| "Stats not available yet".to_string())),
        }
    }

    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<()>) {
        // Initial fetch so the dashboard has data as soon as possible
        self.refresh().await;

        let mut interval = time::interval(self.interval);
        interval.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.changed() => {
                    info!("stats poller shutting down");
                    return;
                }
            }
        }
    }

    /// One combined fetch, applied under the generation guard.
    pub async fn refresh(&self) {
        let generation = self.begin_tick().await;
        let result = tokio::try_join!(self.backend.docker_stats(), self.backend.system_stats());
        self.apply(
            generation,
            result.map(|(docker, system)| DashboardSnapshot {
                docker,
                system,
                fetched_at: Utc::now(),
            }),
        )
        .await;
    }

    async fn begin_tick(&self) -> u64 {
        let mut state = self.state.write().await;
        state.next_generation += 1;
        state.next_generation
    }

    async fn apply(&self, generation: u64, result: Result<DashboardSnapshot, ClientError>) {
        let mut state = self.state.write().await;
        if generation <= state.applied_generation {
            debug!("discarding stale stats tick (generation {})", generation);
            return;
        }
        state.applied_generation = generation;

        match result {
            Ok(snapshot) => {
                state.snapshot = Some(snapshot);
                state.error = None;
            }
            Err(e) => {
                warn!("stats refresh failed: {}", e);
                state.error = Some(e.to_string());
            }
        }
    }
}
