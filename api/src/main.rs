mod extract;
mod handlers;
mod models;
mod ws;

use axum::{
    extract::State,
    http::{HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::config::Settings;
use common::persistence::establish_connection;
use common::Services;
use models::{reject, ApiResponse};
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub services: Services,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api=debug,common=info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Arc::new(establish_connection(&settings.database.url).await?);
    let (_repos, services) = common::build_all(db.clone(), &settings).await;

    let state = Arc::new(AppState { db, services });

    let app = app(state).layer(build_cors(&settings));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.db.ping().await {
        Ok(()) => Json(ApiResponse::with_message(200, "Eventisa API", "ok")).into_response(),
        Err(e) => {
            tracing::error!("database ping failed: {}", e);
            reject(503, "Database unavailable")
        }
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", handlers::router())
        .route("/ws/:channel", get(ws::subscribe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors(settings: &Settings) -> CorsLayer {
    if settings.debug || settings.cors.allowed_origins().is_empty() {
        return CorsLayer::permissive();
    }

    let cors = settings.cors.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .map(|origin| cors.allows(origin))
                    .unwrap_or(false)
            },
        ))
        .allow_credentials(true)
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use tower::ServiceExt;

    pub async fn test_state() -> Arc<AppState> {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();

        let settings = Settings {
            debug: true,
            ..Settings::default()
        };
        let db = Arc::new(db);
        let (_repos, services) = common::build_all(db.clone(), &settings).await;

        Arc::new(AppState { db, services })
    }

    pub async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }
}
