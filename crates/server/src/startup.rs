use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use service::{
    cache::CourseListCache,
    mail::{spawn_worker, LogMailer, MailQueue},
    payment::StripeGateway,
    Repositories, Services,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Router over an already-wired service graph.
pub fn build_app(services: Services) -> Router {
    routes::build_router(AppState::new(services), build_cors())
}

/// Public entry: load config, migrate, wire services and serve HTTP
pub async fn run() -> Result<(), StartupError> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    init_logging(&cfg.logging.format);

    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await.map_err(anyhow::Error::from)?;
    info!("migrations applied");

    let gateway = StripeGateway::new(&cfg.payment).map_err(|e| StartupError::Gateway(e.to_string()))?;
    let (mail, rx) = MailQueue::channel(cfg.mail.queue_capacity, cfg.mail.from_address.clone());
    spawn_worker(rx, Arc::new(LogMailer));
    let cache = Arc::new(CourseListCache::from_config(&cfg.cache));

    let services = Services::new(
        Repositories::seaorm(db),
        Arc::new(gateway),
        cache,
        mail,
        cfg.payment.currency.clone(),
    );
    let app = build_app(services);

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting learning platform api");
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(anyhow::Error::from)?;
    axum::serve(listener, app).await.map_err(anyhow::Error::from)?;
    Ok(())
}
