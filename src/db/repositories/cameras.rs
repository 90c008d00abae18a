use crate::{db::models::Camera, error::Error};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Cameras repository for handling camera operations
#[derive(Clone)]
pub struct CamerasRepository {
    pool: Arc<PgPool>,
}

impl CamerasRepository {
    /// Create a new cameras repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a new camera
    pub async fn create(&self, camera: &Camera) -> Result<Camera> {
        info!("Creating new camera: {}", camera.name);

        let result = sqlx::query_as::<_, Camera>(
            r#"
            INSERT INTO cameras (id, name, location)
            VALUES ($1, $2, $3)
            RETURNING id, name, location
            "#,
        )
        .bind(&camera.id)
        .bind(&camera.name)
        .bind(&camera.location)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create camera: {}", e)))?;

        Ok(result)
    }

    /// Get all cameras
    pub async fn get_all(&self) -> Result<Vec<Camera>> {
        let result = sqlx::query_as::<_, Camera>(
            r#"
            SELECT id, name, location
            FROM cameras
            ORDER BY name, id
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get cameras: {}", e)))?;

        Ok(result)
    }
}
