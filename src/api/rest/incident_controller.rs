use crate::api::rest::{ApiError, ApiQuery, ApiResult, AppState};
use crate::db::models::{Camera, IncidentFilter, IncidentRecord, ResolveAction};
use crate::error::Error;
use crate::services::validate_incident_id;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use log::{error, info};
use serde::{Deserialize, Serialize};

/// Query parameters of `GET /api/incidents`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub resolved: Option<String>,
}

/// Query parameters of `PATCH /api/incidents/:id/resolve`
#[derive(Debug, Default, Deserialize)]
pub struct ResolveParams {
    /// Set the flag to this value instead of toggling
    pub resolved: Option<String>,
    /// Only apply if the stored flag currently has this value
    pub expected: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
}

/// Parse an optional `true`/`false` query value; empty counts as absent
fn parse_bool_param(name: &str, value: Option<&str>) -> Result<Option<bool>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(Error::Validation(format!(
            "Invalid value for '{}': {} (expected true or false)",
            name, other
        ))),
    }
}

/// List incidents, optionally filtered by resolution state, newest first
pub async fn list_incidents(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Vec<IncidentRecord>>> {
    let filter = IncidentFilter {
        resolved: parse_bool_param("resolved", params.resolved.as_deref())?,
    };

    let incidents = state.store.list_incidents(filter).await.map_err(|e| {
        error!("Error fetching incidents: {}", e);
        ApiError::from_failure(e, "Failed to fetch incidents")
    })?;

    Ok(Json(incidents))
}

/// Toggle, set, or compare-and-set the resolved flag of one incident
pub async fn resolve_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(params): ApiQuery<ResolveParams>,
) -> ApiResult<Json<IncidentRecord>> {
    let id = validate_incident_id(&id)?;
    let action = ResolveAction::from_params(
        parse_bool_param("resolved", params.resolved.as_deref())?,
        parse_bool_param("expected", params.expected.as_deref())?,
    );

    let incident = state
        .store
        .resolve_incident(id, action)
        .await
        .map_err(|e| {
            error!("Error updating incident {}: {}", id, e);
            ApiError::from_failure(e, "Failed to update incident")
        })?;

    info!(
        "Incident {} is now {}",
        incident.id,
        if incident.resolved { "resolved" } else { "open" }
    );

    Ok(Json(incident))
}

/// List all cameras
pub async fn list_cameras(State(state): State<AppState>) -> ApiResult<Json<Vec<Camera>>> {
    let cameras = state.store.list_cameras().await.map_err(|e| {
        error!("Error fetching cameras: {}", e);
        ApiError::from_failure(e, "Failed to fetch cameras")
    })?;

    Ok(Json(cameras))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.store.health_check().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "unavailable" }.to_string(),
            storage: state.store.backend_name().to_string(),
        }),
    )
}
