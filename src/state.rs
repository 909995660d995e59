use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::BackendClient;
use crate::error::{Result, TraceErr};
use crate::points::{self, PerformanceReport};
use crate::resolver::{CanonicalPlayer, IdentityResolver};

#[derive(Debug, Clone)]
struct Snapshot {
    report: PerformanceReport,
    roster: Vec<CanonicalPlayer>,
}

/// Owns the backend client and the last computed analysis snapshot. The
/// snapshot is rebuilt on refresh; a failed refresh leaves the previous one
/// in place.
pub struct AppStateManager {
    pub backend: Arc<BackendClient>,
    cache: RwLock<Option<Snapshot>>,
}

impl AppStateManager {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self {
            backend,
            cache: RwLock::new(None),
        }
    }

    pub async fn has_report(&self) -> bool {
        self.cache.read().await.is_some()
    }

    /// Fetch all three feeds, reconcile identities, aggregate points, and
    /// replace the cached snapshot.
    pub async fn refresh(&self) -> Result<PerformanceReport> {
        let batches = self
            .backend
            .fetch_player_batches()
            .await
            .trace_err("fetching player batches")?;
        let individuals = self
            .backend
            .fetch_individual_results()
            .await
            .trace_err("fetching individual results")?;
        let groups = self
            .backend
            .fetch_group_results()
            .await
            .trace_err("fetching group results")?;

        let mut resolver = IdentityResolver::new();
        resolver.ingest_batches(&batches);
        let report = points::aggregate(&resolver, &individuals, &groups);
        tracing::info!(
            "analysis refreshed: {} canonical players from {} batches, {} points awarded",
            resolver.len(),
            batches.len(),
            report.total_points_awarded
        );

        let snapshot = Snapshot {
            report: report.clone(),
            roster: resolver.players().to_vec(),
        };
        *self.cache.write().await = Some(snapshot);
        Ok(report)
    }

    /// Cached report, computing it on first use.
    pub async fn performance_report(&self) -> Result<PerformanceReport> {
        if let Some(snapshot) = self.cache.read().await.as_ref() {
            return Ok(snapshot.report.clone());
        }
        self.refresh().await
    }

    /// Cached canonical roster, computing it on first use.
    pub async fn roster(&self) -> Result<Vec<CanonicalPlayer>> {
        if let Some(snapshot) = self.cache.read().await.as_ref() {
            return Ok(snapshot.roster.clone());
        }
        self.refresh().await?;
        let guard = self.cache.read().await;
        Ok(guard
            .as_ref()
            .map(|s| s.roster.clone())
            .unwrap_or_default())
    }
}
