use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryParticipantRepository};
use crate::routes::with_program_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use paj_diversion::config::AppConfig;
use paj_diversion::error::AppError;
use paj_diversion::telemetry;
use paj_diversion::workflows::diversion::DiversionService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryParticipantRepository::default());
    let rules = config.program.rules.clone();
    info!(
        absolute = rules.absolute_exclusions().len(),
        conditional = rules.summary_eligible_exceptions().len(),
        "eligibility rule table loaded"
    );
    let service = Arc::new(DiversionService::new(repository, rules));

    let app = with_program_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(environment = ?config.environment, %addr, "diversion coordination service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
