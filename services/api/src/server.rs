use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fiascha::config::AppConfig;
use fiascha::error::AppError;
use fiascha::telemetry;
use fiascha::PortalContext;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let context = PortalContext::in_memory(&config.portal);
    if let Some(admin) = &config.portal.admin {
        if let Some(account) = context.accounts().bootstrap_admin(admin)? {
            info!(account = %account.id, username = %account.username, "administrator account created");
        }
    }

    let app = with_portal_routes(&context)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "fiascha portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
