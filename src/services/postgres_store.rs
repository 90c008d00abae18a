use crate::db::health_check;
use crate::db::models::{Camera, IncidentFilter, IncidentRecord, ResolveAction};
use crate::db::repositories::{CamerasRepository, IncidentsRepository};
use crate::services::incident_store::IncidentStore;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// Incident store backed by PostgreSQL
#[derive(Clone)]
pub struct PgIncidentStore {
    pool: Arc<PgPool>,
    cameras: CamerasRepository,
    incidents: IncidentsRepository,
}

impl PgIncidentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            cameras: CamerasRepository::new(pool.clone()),
            incidents: IncidentsRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl IncidentStore for PgIncidentStore {
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentRecord>> {
        self.incidents.list(filter).await
    }

    async fn resolve_incident(&self, id: &str, action: ResolveAction) -> Result<IncidentRecord> {
        self.incidents.resolve(id, action).await
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        self.cameras.get_all().await
    }

    async fn health_check(&self) -> bool {
        health_check(&self.pool).await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::models::{Incident, NewIncident, ThreatType};
    use crate::error::Error;
    use chrono::{Duration, Utc};
    use sqlx::postgres::PgPoolOptions;

    // Needs a scratch PostgreSQL database; set TEST_DATABASE_URL to run.
    async fn test_store() -> Option<(PgIncidentStore, Camera, Incident)> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("Skipping PostgreSQL test. Set TEST_DATABASE_URL to run.");
                return None;
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let pool = Arc::new(pool);

        let camera = CamerasRepository::new(pool.clone())
            .create(&Camera::new("Vault", "Building B - Basement"))
            .await
            .unwrap();
        let now = Utc::now();
        let incident = NewIncident {
            camera_id: camera.id.clone(),
            incident_type: ThreatType::GunThreat,
            ts_start: now - Duration::minutes(5),
            ts_end: now,
            thumbnail_url: "/thumbnails/thumb-1.jpeg".to_string(),
            resolved: false,
        }
        .into_incident()
        .unwrap();
        IncidentsRepository::new(pool.clone())
            .create(&incident)
            .await
            .unwrap();

        Some((PgIncidentStore::new(pool), camera, incident))
    }

    #[tokio::test]
    async fn test_resolve_moves_incident_between_filters() -> Result<()> {
        let Some((store, camera, incident)) = test_store().await else {
            return Ok(());
        };

        let unresolved = store.list_incidents(IncidentFilter::unresolved()).await?;
        let listed = unresolved.iter().find(|r| r.id == incident.id).unwrap();
        assert_eq!(listed.camera.name, camera.name);

        let updated = store
            .resolve_incident(&incident.id, ResolveAction::Toggle)
            .await?;
        assert!(updated.resolved);

        let unresolved = store.list_incidents(IncidentFilter::unresolved()).await?;
        assert!(unresolved.iter().all(|r| r.id != incident.id));
        let resolved = store
            .list_incidents(IncidentFilter { resolved: Some(true) })
            .await?;
        assert!(resolved.iter().any(|r| r.id == incident.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_stale_compare_and_set_conflicts() -> Result<()> {
        let Some((store, _, incident)) = test_store().await else {
            return Ok(());
        };

        let action = ResolveAction::CompareAndSet {
            expected: true,
            value: false,
        };
        let err = store
            .resolve_incident(&incident.id, action)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Conflict(_))));

        let missing = store
            .resolve_incident("does-not-exist", ResolveAction::Toggle)
            .await
            .unwrap_err();
        assert!(matches!(missing.downcast_ref::<Error>(), Some(Error::NotFound(_))));

        Ok(())
    }
}
