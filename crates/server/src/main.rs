use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, put},
    Router,
};
use server_api::ApiContext;
use storage::Storage;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod auth;
mod config;
mod routes;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
        read_api_key: settings.read_api_key,
        admin_jwt_secret: settings.admin_jwt_secret,
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(routes::healthz))
        .route(
            "/schedule",
            get(routes::get_schedule)
                .post(routes::create_or_update_schedule)
                .put(routes::update_schedule)
                .delete(routes::reset_schedule),
        )
        .route("/schedule/details", get(routes::schedule_details))
        .route("/schedule/public", get(routes::public_schedule))
        .route(
            "/schedule/days",
            get(routes::list_days).post(routes::create_day),
        )
        .route(
            "/schedule/days/:day_id",
            put(routes::update_day).delete(routes::delete_day),
        )
        .route(
            "/schedule/days/:day_id/events",
            get(routes::list_events).post(routes::create_event),
        )
        .route(
            "/schedule/days/:day_id/events/reorder",
            put(routes::reorder_events),
        )
        .route(
            "/schedule/events/:event_id",
            put(routes::update_event).delete(routes::delete_event),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
