use crate::api::rest::{ApiQuery, AppState};
use crate::dashboard::{render_dashboard, IncidentListState, PlayerState};
use crate::services::validate_incident_id;
use axum::extract::{Path, State};
use axum::response::Html;
use log::warn;
use serde::Deserialize;
use std::path::Path as FsPath;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    /// Incident shown in the player
    pub selected: Option<String>,
    /// Index of the highlighted camera tile
    pub camera: Option<usize>,
}

/// Render the dashboard with the open incidents and the selected one in the player
pub async fn dashboard(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DashboardParams>,
) -> Html<String> {
    let mut list = IncidentListState::new();
    list.load(state.store.as_ref()).await;

    let mut player = camera_wall(&state).await;
    if let Some(index) = params.camera {
        player.set_active_camera(index);
    }
    if let Some(selected) = params.selected.as_deref() {
        select_incident(&state, &list, &mut player, selected).await;
    }

    Html(render_dashboard(&list, &player))
}

/// Resolve a row from the list form and render the list with that row removed
pub async fn resolve_from_dashboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Html<String> {
    let mut list = IncidentListState::new();
    list.load(state.store.as_ref()).await;

    match validate_incident_id(&id) {
        Ok(id) => {
            list.resolve(state.store.as_ref(), id).await;
        }
        Err(e) => warn!("Rejected dashboard resolve: {}", e),
    }

    let player = camera_wall(&state).await;
    Html(render_dashboard(&list, &player))
}

async fn camera_wall(state: &AppState) -> PlayerState {
    match state.store.list_cameras().await {
        Ok(cameras) => PlayerState::new(cameras),
        Err(e) => {
            warn!("Failed to load camera tiles: {}", e);
            PlayerState::new(Vec::new())
        }
    }
}

async fn select_incident(
    state: &AppState,
    list: &IncidentListState,
    player: &mut PlayerState,
    id: &str,
) {
    let incident = list.find(id).cloned();
    let missing = match &incident {
        Some(incident) => thumbnail_missing(&state.assets_dir, &incident.thumbnail_url).await,
        None => false,
    };

    player.select(incident);
    if missing {
        player.mark_media_failed();
    }
}

/// True when a relative thumbnail path has no file under the asset root.
/// Absolute URLs are left for the browser to load.
async fn thumbnail_missing(assets_dir: &FsPath, thumbnail_url: &str) -> bool {
    if thumbnail_url.contains("://") {
        return false;
    }
    let relative = thumbnail_url.trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|part| part == "..") {
        return true;
    }
    match tokio::fs::metadata(assets_dir.join(relative)).await {
        Ok(metadata) => !metadata.is_file(),
        Err(_) => true,
    }
}
