use crate::db::models::{Camera, IncidentRecord};

/// Image shown when an incident has no usable thumbnail
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Number of camera tiles under the player
pub const CAMERA_TILE_COUNT: usize = 3;

/// Selected incident and the mock camera wall beside it
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    selected: Option<IncidentRecord>,
    media_failed: bool,
    cameras: Vec<Camera>,
    active_camera: usize,
}

impl PlayerState {
    pub fn new(mut cameras: Vec<Camera>) -> Self {
        cameras.truncate(CAMERA_TILE_COUNT);
        Self {
            cameras,
            ..Self::default()
        }
    }

    pub fn select(&mut self, incident: Option<IncidentRecord>) {
        self.selected = incident;
        self.media_failed = false;
    }

    /// The thumbnail could not be loaded; show the placeholder instead
    pub fn mark_media_failed(&mut self) {
        self.media_failed = true;
    }

    pub fn selected(&self) -> Option<&IncidentRecord> {
        self.selected.as_ref()
    }

    /// Image source for the media surface
    pub fn media_src(&self) -> &str {
        match &self.selected {
            Some(incident) if !self.media_failed && !incident.thumbnail_url.trim().is_empty() => {
                &incident.thumbnail_url
            }
            _ => PLACEHOLDER_IMAGE,
        }
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn set_active_camera(&mut self, index: usize) {
        if index < self.cameras.len() {
            self.active_camera = index;
        }
    }

    pub fn active_camera(&self) -> usize {
        self.active_camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CameraSummary, ThreatType};
    use chrono::Utc;

    fn incident(thumbnail: &str) -> IncidentRecord {
        let now = Utc::now();
        IncidentRecord {
            id: "1".to_string(),
            incident_type: ThreatType::GunThreat,
            ts_start: now,
            ts_end: now,
            thumbnail_url: thumbnail.to_string(),
            resolved: false,
            camera: CameraSummary {
                name: "Shop Floor A".to_string(),
                location: "Building A - Floor 1".to_string(),
            },
        }
    }

    #[test]
    fn falls_back_to_placeholder() {
        let mut player = PlayerState::new(Vec::new());
        assert_eq!(player.media_src(), PLACEHOLDER_IMAGE);

        player.select(Some(incident("/thumbnails/thumb-1.jpeg")));
        assert_eq!(player.media_src(), "/thumbnails/thumb-1.jpeg");

        player.mark_media_failed();
        assert_eq!(player.media_src(), PLACEHOLDER_IMAGE);

        // A new selection gets a fresh attempt.
        player.select(Some(incident("/thumbnails/thumb-2.jpeg")));
        assert_eq!(player.media_src(), "/thumbnails/thumb-2.jpeg");

        player.select(Some(incident("  ")));
        assert_eq!(player.media_src(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn keeps_three_tiles_and_clamps_active() {
        let cameras = (0..5)
            .map(|i| Camera::new(format!("Cam {}", i), "Site"))
            .collect();
        let mut player = PlayerState::new(cameras);
        assert_eq!(player.cameras().len(), CAMERA_TILE_COUNT);

        player.set_active_camera(2);
        assert_eq!(player.active_camera(), 2);
        player.set_active_camera(7);
        assert_eq!(player.active_camera(), 2);
    }
}
