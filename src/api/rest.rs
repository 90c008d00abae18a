use crate::config::ApiConfig;
use crate::error::Error;
use crate::services::IncidentStore;
use anyhow::Result;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub mod dashboard_controller;
pub mod incident_controller;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncidentStore>,
    pub assets_dir: PathBuf,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// JSON error body: `{error}` for client errors, `{error, details}` for server errors
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip)]
    pub status: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        ApiError {
            error: error.into(),
            details: None,
            status: status.as_u16(),
        }
    }

    /// Map a failed operation, replacing server-side messages with `summary`
    /// and moving the original text into `details`.
    pub fn from_failure(err: anyhow::Error, summary: &str) -> Self {
        let mut api_error = ApiError::from(err);
        if api_error.status == StatusCode::INTERNAL_SERVER_ERROR.as_u16() {
            api_error.details = Some(std::mem::replace(&mut api_error.error, summary.to_string()));
        }
        api_error
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Database(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError::new(status, err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return err.clone().into();
        }

        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

/// Query string extractor whose rejections use the JSON error body
#[derive(Debug, Clone, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text()))
    }
}

/// Build the full router: JSON API, dashboard pages, and static assets
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(Duration::from_secs(3600));
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        // Incident routes
        .route("/api/incidents", get(incident_controller::list_incidents))
        .route(
            "/api/incidents/:id/resolve",
            patch(incident_controller::resolve_incident),
        )
        .route("/api/cameras", get(incident_controller::list_cameras))
        .route("/api/health", get(incident_controller::health))
        // Dashboard routes
        .route("/", get(dashboard_controller::dashboard))
        .route(
            "/dashboard/incidents/:id/resolve",
            post(dashboard_controller::resolve_from_dashboard),
        )
        .with_state(state)
        // Thumbnails and other static files
        .fallback_service(assets)
        .layer(cors)
}

/// Resolve once `signal` fires. If the handler cannot be installed, never resolve.
async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down..."),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}

pub struct RestApi {
    config: ApiConfig,
    store: Arc<dyn IncidentStore>,
}

impl RestApi {
    pub fn new(config: &ApiConfig, store: Arc<dyn IncidentStore>) -> Self {
        Self {
            config: config.clone(),
            store,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let app = router(AppState {
            store: Arc::clone(&self.store),
            assets_dir: self.config.assets_dir.clone(),
        });

        let addr = self.config.address.clone() + ":" + &self.config.port.to_string();
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid API address {}: {}", addr, e)))?;

        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_waits_when_signal_handler_fails() {
        let failed = shutdown_signal(async {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no signal driver"))
        });
        assert!(tokio::time::timeout(Duration::from_millis(50), failed)
            .await
            .is_err());

        let received = shutdown_signal(async { Ok(()) });
        assert!(tokio::time::timeout(Duration::from_millis(50), received)
            .await
            .is_ok());
    }
}
