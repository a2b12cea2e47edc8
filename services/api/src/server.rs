use crate::cli::ServeArgs;
use crate::infra::{describe_source, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use store_dr::config::AppConfig;
use store_dr::error::AppError;
use store_dr::telemetry;
use store_dr::unloadability::{PolicyStore, UnloadabilityEngine};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = PolicyStore::new(config.policy.path());
    let (policy, source) = store.load_or_default()?;
    let engine = Arc::new(UnloadabilityEngine::new(policy));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        policy_source: Arc::new(source),
    };
    let policy_label = describe_source(&app_state.policy_source);

    let app = with_service_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, policy = %policy_label, "unloadability service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
