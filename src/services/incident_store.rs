use crate::config::{Config, StorageBackend};
use crate::db::models::{Camera, IncidentFilter, IncidentRecord, ResolveAction};
use crate::db::DatabaseService;
use crate::error::Error;
use crate::services::memory_store::InMemoryIncidentStore;
use crate::services::postgres_store::PgIncidentStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use std::sync::Arc;

/// Query and resolution contract shared by the database and fixture backends
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Incidents matching `filter` with camera fields attached, newest first
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentRecord>>;

    /// Apply `action` to one incident atomically and return the updated record.
    /// Unknown ids fail with `Error::NotFound` and change nothing.
    async fn resolve_incident(&self, id: &str, action: ResolveAction) -> Result<IncidentRecord>;

    async fn list_cameras(&self) -> Result<Vec<Camera>>;

    /// Whether the backing storage currently answers
    async fn health_check(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

/// Reject blank identifiers before they reach storage
pub fn validate_incident_id(id: &str) -> std::result::Result<&str, Error> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::Validation("Incident ID is required".to_string()));
    }
    Ok(id)
}

/// Build the store selected by `storage.backend`
pub async fn create_incident_store(config: &Config) -> Result<Arc<dyn IncidentStore>> {
    let store: Arc<dyn IncidentStore> = match config.storage.backend {
        StorageBackend::Postgres => {
            let database = DatabaseService::new(&config.database).await?;
            Arc::new(PgIncidentStore::new(database.pool))
        }
        StorageBackend::Memory => Arc::new(InMemoryIncidentStore::fixture(Utc::now())),
    };

    info!("Incident store ready ({})", store.backend_name());

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_rejected() {
        assert!(matches!(validate_incident_id(""), Err(Error::Validation(_))));
        assert!(matches!(validate_incident_id("  "), Err(Error::Validation(_))));
        assert_eq!(validate_incident_id(" abc "), Ok("abc"));
    }
}
