use crate::db::models::incident_models::sort_newest_first;
use crate::db::models::{
    Camera, Incident, IncidentFilter, IncidentRecord, NewIncident, ResolveAction, ThreatType,
};
use crate::db::seed::{demo_cameras, thumbnail_path};
use crate::error::Error;
use crate::services::incident_store::IncidentStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use tokio::sync::RwLock;

/// Incident store holding its dataset in process memory
#[derive(Default)]
pub struct InMemoryIncidentStore {
    cameras: RwLock<Vec<Camera>>,
    incidents: RwLock<Vec<Incident>>,
}

impl InMemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Four open incidents, 2/4/6/8 hours before `now`, one per demo camera
    pub fn fixture(now: DateTime<Utc>) -> Self {
        let cameras = demo_cameras();
        let camera_id = |name: &str| {
            cameras
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.id.clone())
                .unwrap_or_default()
        };

        let rows = [
            ("1", ThreatType::GunThreat, "Shop Floor A", 2, 300),
            ("2", ThreatType::UnauthorisedAccess, "Main Entrance", 4, 180),
            ("3", ThreatType::FaceRecognised, "Vault", 6, 120),
            ("4", ThreatType::SuspiciousActivity, "Parking Lot", 8, 240),
        ];
        let incidents = rows
            .into_iter()
            .enumerate()
            .map(|(index, (id, threat, camera, hours_ago, duration_secs))| {
                let ts_start = now - Duration::hours(hours_ago);
                Incident {
                    id: id.to_string(),
                    camera_id: camera_id(camera),
                    incident_type: threat.into(),
                    ts_start,
                    ts_end: ts_start + Duration::seconds(duration_secs),
                    thumbnail_url: thumbnail_path(index),
                    resolved: false,
                }
            })
            .collect();

        Self {
            cameras: RwLock::new(cameras),
            incidents: RwLock::new(incidents),
        }
    }

    pub async fn insert_camera(&self, camera: Camera) -> Camera {
        self.cameras.write().await.push(camera.clone());
        camera
    }

    /// Store a new incident; its camera must already exist
    pub async fn insert_incident(&self, incident: NewIncident) -> Result<Incident> {
        let known_camera = self
            .cameras
            .read()
            .await
            .iter()
            .any(|c| c.id == incident.camera_id);
        if !known_camera {
            return Err(Error::Validation(format!("Unknown camera: {}", incident.camera_id)).into());
        }

        let incident = incident.into_incident()?;
        self.incidents.write().await.push(incident.clone());
        Ok(incident)
    }

    fn to_record(cameras: &[Camera], incident: &Incident) -> Result<IncidentRecord> {
        let camera = cameras
            .iter()
            .find(|c| c.id == incident.camera_id)
            .ok_or_else(|| {
                Error::Internal(format!(
                    "Incident {} references missing camera {}",
                    incident.id, incident.camera_id
                ))
            })?;
        Ok(IncidentRecord::from_parts(incident.clone(), camera.summary()))
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentRecord>> {
        let cameras = self.cameras.read().await;
        let incidents = self.incidents.read().await;

        let mut records = incidents
            .iter()
            .filter(|incident| filter.matches(incident.resolved))
            .map(|incident| Self::to_record(&cameras, incident))
            .collect::<Result<Vec<_>>>()?;
        sort_newest_first(&mut records);

        debug!("Listed {} incidents (resolved={:?})", records.len(), filter.resolved);

        Ok(records)
    }

    async fn resolve_incident(&self, id: &str, action: ResolveAction) -> Result<IncidentRecord> {
        let cameras = self.cameras.read().await;
        // Held across read and write so concurrent resolves serialize.
        let mut incidents = self.incidents.write().await;

        let incident = incidents
            .iter_mut()
            .find(|incident| incident.id == id)
            .ok_or_else(|| Error::NotFound(format!("Incident {}", id)))?;
        incident.resolved = action.apply(id, incident.resolved)?;

        Self::to_record(&cameras, incident)
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        let mut cameras = self.cameras.read().await.clone();
        cameras.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(cameras)
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
