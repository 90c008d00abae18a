use crate::db::models::{Camera, Incident, NewIncident, ThreatType};
use crate::db::repositories::{CamerasRepository, IncidentsRepository};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Number of incidents generated by [`generate_incidents`]
pub const SEED_INCIDENT_COUNT: usize = 15;

/// Number of distinct thumbnail files under `thumbnails/`
const THUMBNAIL_COUNT: usize = 5;

/// The cameras installed at the demo site
pub fn demo_cameras() -> Vec<Camera> {
    vec![
        Camera::new("Shop Floor A", "Building A - Floor 1"),
        Camera::new("Vault", "Building B - Basement"),
        Camera::new("Main Entrance", "Building A - Ground Floor"),
        Camera::new("Parking Lot", "Outdoor - Section C"),
    ]
}

pub fn thumbnail_path(index: usize) -> String {
    format!("/thumbnails/thumb-{}.jpeg", (index % THUMBNAIL_COUNT) + 1)
}

/// Random incidents spread over the 24 hours before `now`
pub fn generate_incidents<R: Rng>(
    rng: &mut R,
    cameras: &[Camera],
    now: DateTime<Utc>,
) -> Result<Vec<Incident>> {
    if cameras.is_empty() {
        return Err(crate::error::Error::Validation(
            "Cannot seed incidents without cameras".to_string(),
        )
        .into());
    }

    let mut incidents = Vec::with_capacity(SEED_INCIDENT_COUNT);
    for i in 0..SEED_INCIDENT_COUNT {
        let hours_ago = rng.gen_range(0..24);
        let minutes_ago = rng.gen_range(0..60);
        let duration_secs = rng.gen_range(30..330);

        let ts_start = now - Duration::hours(hours_ago) - Duration::minutes(minutes_ago);
        let camera = &cameras[rng.gen_range(0..cameras.len())];
        let threat = ThreatType::KNOWN[rng.gen_range(0..ThreatType::KNOWN.len())].clone();

        let incident = NewIncident {
            camera_id: camera.id.clone(),
            incident_type: threat,
            ts_start,
            ts_end: ts_start + Duration::seconds(duration_secs),
            thumbnail_url: thumbnail_path(i),
            resolved: rng.gen_bool(0.3),
        };
        incidents.push(incident.into_incident()?);
    }

    Ok(incidents)
}

/// Write the demo cameras and a fresh batch of incidents
pub async fn seed_database(pool: Arc<PgPool>) -> Result<(usize, usize)> {
    let cameras_repo = CamerasRepository::new(pool.clone());
    let incidents_repo = IncidentsRepository::new(pool);

    let mut cameras = Vec::new();
    for camera in demo_cameras() {
        cameras.push(cameras_repo.create(&camera).await?);
    }

    let incidents = generate_incidents(&mut rand::thread_rng(), &cameras, Utc::now())?;
    for incident in &incidents {
        incidents_repo.create(incident).await?;
    }

    info!(
        "Seeded {} cameras and {} incidents ({} incidents stored in total)",
        cameras.len(),
        incidents.len(),
        incidents_repo.count().await?
    );

    Ok((cameras.len(), incidents.len()))
}
