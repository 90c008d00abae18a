use crate::db::models::{
    Incident, IncidentFilter, IncidentRecord, IncidentWithCamera, ResolveAction,
};
use crate::error::Error;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

const SELECT_WITH_CAMERA: &str = r#"
    SELECT i.id, i.camera_id, i.incident_type, i.ts_start, i.ts_end, i.thumbnail_url,
           i.resolved, c.name AS camera_name, c.location AS camera_location
    FROM incidents i
    JOIN cameras c ON c.id = i.camera_id
"#;

/// Incidents repository for handling incident operations
#[derive(Clone)]
pub struct IncidentsRepository {
    pool: Arc<PgPool>,
}

impl IncidentsRepository {
    /// Create a new incidents repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a new incident
    pub async fn create(&self, incident: &Incident) -> Result<Incident> {
        if incident.ts_end < incident.ts_start {
            return Err(Error::Validation(format!(
                "Incident {} ends before it starts",
                incident.id
            ))
            .into());
        }

        let result = sqlx::query_as::<_, Incident>(
            r#"
            INSERT INTO incidents (
                id, camera_id, incident_type, ts_start, ts_end, thumbnail_url, resolved
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, camera_id, incident_type, ts_start, ts_end, thumbnail_url, resolved
            "#,
        )
        .bind(&incident.id)
        .bind(&incident.camera_id)
        .bind(&incident.incident_type)
        .bind(incident.ts_start)
        .bind(incident.ts_end)
        .bind(&incident.thumbnail_url)
        .bind(incident.resolved)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create incident: {}", e)))?;

        Ok(result)
    }

    /// List incidents matching the filter, newest first
    pub async fn list(&self, filter: IncidentFilter) -> Result<Vec<IncidentRecord>> {
        let sql = format!(
            "{} WHERE ($1::BOOLEAN IS NULL OR i.resolved = $1) ORDER BY i.ts_start DESC, i.id ASC",
            SELECT_WITH_CAMERA
        );

        let result = sqlx::query_as::<_, IncidentWithCamera>(&sql)
            .bind(filter.resolved)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list incidents: {}", e)))?;

        debug!("Listed {} incidents (resolved={:?})", result.len(), filter.resolved);

        Ok(result.into_iter().map(IncidentRecord::from).collect())
    }

    /// Apply a resolve action in a single UPDATE and return the updated incident
    pub async fn resolve(&self, id: &str, action: ResolveAction) -> Result<IncidentRecord> {
        // $2 NULL flips the stored value; $3 NULL skips the compare-and-set guard.
        let (value, expected) = match action {
            ResolveAction::Toggle => (None, None),
            ResolveAction::Set(value) => (Some(value), None),
            ResolveAction::CompareAndSet { expected, value } => (Some(value), Some(expected)),
        };

        let result = sqlx::query_as::<_, IncidentWithCamera>(
            r#"
            WITH updated AS (
                UPDATE incidents
                SET resolved = COALESCE($2::BOOLEAN, NOT resolved)
                WHERE id = $1 AND ($3::BOOLEAN IS NULL OR resolved = $3)
                RETURNING id, camera_id, incident_type, ts_start, ts_end, thumbnail_url, resolved
            )
            SELECT u.id, u.camera_id, u.incident_type, u.ts_start, u.ts_end, u.thumbnail_url,
                   u.resolved, c.name AS camera_name, c.location AS camera_location
            FROM updated u
            JOIN cameras c ON c.id = u.camera_id
            "#,
        )
        .bind(id)
        .bind(value)
        .bind(expected)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update incident: {}", e)))?;

        match result {
            Some(row) => {
                info!("Incident {} resolved={}", row.id, row.resolved);
                Ok(IncidentRecord::from(row))
            }
            None => Err(self.missed_update_error(id, expected).await?.into()),
        }
    }

    /// Explain why the UPDATE matched no row
    async fn missed_update_error(&self, id: &str, expected: Option<bool>) -> Result<Error> {
        let current: Option<bool> =
            sqlx::query_scalar("SELECT resolved FROM incidents WHERE id = $1")
                .bind(id)
                .fetch_optional(&*self.pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to get incident by ID: {}", e)))?;

        Ok(match (current, expected) {
            (Some(current), Some(expected)) => Error::Conflict(format!(
                "Incident {} has resolved={}, expected {}",
                id, current, expected
            )),
            _ => Error::NotFound(format!("Incident {}", id)),
        })
    }

    /// Count all incidents
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM incidents")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count incidents: {}", e)))?;

        Ok(count)
    }
}
