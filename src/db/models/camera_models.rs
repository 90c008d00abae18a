use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Camera model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Camera {
    pub id: String,
    pub name: String,
    pub location: String,
}

impl Camera {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            location: location.into(),
        }
    }

    pub fn summary(&self) -> CameraSummary {
        CameraSummary {
            name: self.name.clone(),
            location: self.location.clone(),
        }
    }
}

/// Camera fields attached to every incident read result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSummary {
    pub name: String,
    pub location: String,
}
