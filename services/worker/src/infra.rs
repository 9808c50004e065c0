use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rehab_discharge::error::AppError;
use rehab_discharge::workflows::discharge::{
    DischargePolicy, DischargeService, DischargeWorker, InMemoryCaseSystem,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type CaseWorker =
    DischargeWorker<InMemoryCaseSystem, InMemoryCaseSystem, InMemoryCaseSystem>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Prefer the path given on the command line, then the configured one.
pub(crate) fn snapshot_path(
    explicit: Option<PathBuf>,
    configured: Option<&PathBuf>,
) -> Result<PathBuf, AppError> {
    explicit
        .or_else(|| configured.cloned())
        .ok_or(AppError::MissingSnapshot)
}

pub(crate) fn load_snapshot(path: &Path) -> Result<Arc<InMemoryCaseSystem>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let system = InMemoryCaseSystem::from_json(&raw)?;
    info!(path = %path.display(), "case snapshot loaded");
    Ok(Arc::new(system))
}

/// The case system plays store, mutation sink and tracker at once.
pub(crate) fn build_worker(
    system: &Arc<InMemoryCaseSystem>,
    result_capacity: usize,
) -> CaseWorker {
    let service = DischargeService::new(
        system.clone(),
        system.clone(),
        system.clone(),
        DischargePolicy::standard(),
    );
    DischargeWorker::with_capacity(Arc::new(service), result_capacity)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
