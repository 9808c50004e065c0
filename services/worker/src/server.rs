use crate::cli::ServeArgs;
use crate::infra::{build_worker, load_snapshot, AppState};
use crate::routes::with_discharge_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rehab_discharge::config::AppConfig;
use rehab_discharge::error::AppError;
use rehab_discharge::telemetry;
use rehab_discharge::workflows::discharge::InMemoryCaseSystem;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(snapshot) = args.snapshot.take() {
        config.discharge.snapshot_path = Some(snapshot);
    }

    telemetry::init(&config.telemetry)?;

    let system = match &config.discharge.snapshot_path {
        Some(path) => load_snapshot(path)?,
        None => {
            warn!("no case snapshot configured, serving an empty case system");
            Arc::new(InMemoryCaseSystem::default())
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let worker = Arc::new(build_worker(&system, config.discharge.result_capacity));
    let app = with_discharge_routes(worker)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "discharge worker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
