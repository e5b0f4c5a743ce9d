// Fans out one fetch per resource kind and merges the results.
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::control_plane::ControlPlane;
use super::kubeconfig::ContextSource;
use super::resources;
use crate::error::{FetchError, SnapshotError};
use crate::models::snapshot::{ClusterSnapshot, ResourceKind, ResourceRecords};

/// How a snapshot is gathered.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Kinds whose failure aborts the whole snapshot.
    pub critical_kinds: BTreeSet<ResourceKind>,
    /// Upper bound on listings in flight at once.
    pub max_concurrency: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            critical_kinds: BTreeSet::new(),
            max_concurrency: ResourceKind::ALL.len(),
        }
    }
}

/// Captures the current cluster state.
///
/// The context read happens first, on the blocking pool since it touches the
/// filesystem, and aborts everything when it fails.
/// Resource kinds are then listed concurrently; a failed kind is recorded in
/// `fetch_errors` unless it is configured as critical. Dropping the returned
/// future aborts every listing still in flight.
pub async fn assemble<C: ControlPlane + Clone>(
    plane: &C,
    contexts: Arc<dyn ContextSource>,
    config: &SnapshotConfig,
) -> Result<ClusterSnapshot, SnapshotError> {
    let contexts = tokio::task::spawn_blocking(move || contexts.contexts())
        .await
        .map_err(|e| SnapshotError::Task(e.to_string()))??;
    let now = Utc::now();
    let mut snapshot = ClusterSnapshot::new(contexts.current.clone(), contexts.names());
    snapshot.active_context = contexts.active().cloned();

    let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for kind in ResourceKind::ALL {
        let plane = plane.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (kind, resources::fetch(&plane, kind, now).await)
        });
    }

    let mut outcomes: Vec<(ResourceKind, Result<ResourceRecords, FetchError>)> =
        Vec::with_capacity(ResourceKind::ALL.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                // Only a panicking fetcher gets here.
                log::error!("snapshot: fetch task failed: {e}");
                return Err(SnapshotError::Task(e.to_string()));
            }
        }
    }

    // Merge in a fixed order so the result does not depend on completion order.
    outcomes.sort_by_key(|(kind, _)| *kind);
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(records) => {
                log::debug!("snapshot: {kind}: {} record(s)", records.len());
                snapshot.insert(records);
            }
            Err(err) if config.critical_kinds.contains(&kind) => {
                log::error!("snapshot: critical {err}");
                return Err(SnapshotError::Critical(err));
            }
            Err(err) => {
                log::warn!("snapshot: {err}");
                snapshot.record_failure(kind, err.source.to_string());
            }
        }
    }

    log::info!(
        "snapshot: context {} with {} kind(s), {} failed",
        snapshot.current_context,
        snapshot.resources.len(),
        snapshot.fetch_errors.len()
    );
    Ok(snapshot)
}
