pub mod camera_models;
pub mod incident_models;

pub use camera_models::{Camera, CameraSummary};
pub use incident_models::{
    Incident, IncidentFilter, IncidentRecord, IncidentWithCamera, NewIncident, ResolveAction,
    ThreatType,
};
