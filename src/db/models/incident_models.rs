use super::camera_models::CameraSummary;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of threat an incident reports. Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatType {
    GunThreat,
    UnauthorisedAccess,
    FaceRecognised,
    SuspiciousActivity,
    Other(String),
}

impl ThreatType {
    /// The four threat types the detection pipeline emits
    pub const KNOWN: [ThreatType; 4] = [
        ThreatType::UnauthorisedAccess,
        ThreatType::GunThreat,
        ThreatType::FaceRecognised,
        ThreatType::SuspiciousActivity,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ThreatType::GunThreat => "Gun Threat",
            ThreatType::UnauthorisedAccess => "Unauthorised Access",
            ThreatType::FaceRecognised => "Face Recognised",
            ThreatType::SuspiciousActivity => "Suspicious Activity",
            ThreatType::Other(label) => label,
        }
    }

    /// CSS class of the badge shown next to the incident
    pub fn badge_class(&self) -> &'static str {
        match self {
            ThreatType::GunThreat => "bg-red-500",
            ThreatType::UnauthorisedAccess => "bg-yellow-500",
            ThreatType::FaceRecognised => "bg-blue-500",
            ThreatType::SuspiciousActivity => "bg-orange-500",
            ThreatType::Other(_) => "bg-gray-500",
        }
    }
}

impl From<String> for ThreatType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Gun Threat" => ThreatType::GunThreat,
            "Unauthorised Access" => ThreatType::UnauthorisedAccess,
            "Face Recognised" => ThreatType::FaceRecognised,
            "Suspicious Activity" => ThreatType::SuspiciousActivity,
            _ => ThreatType::Other(label),
        }
    }
}

impl From<&str> for ThreatType {
    fn from(label: &str) -> Self {
        ThreatType::from(label.to_string())
    }
}

impl From<ThreatType> for String {
    fn from(threat: ThreatType) -> Self {
        match threat {
            ThreatType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident row as stored in the `incidents` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Incident {
    pub id: String,
    pub camera_id: String,
    pub incident_type: String,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
}

/// Incident row joined with its camera's descriptive columns
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IncidentWithCamera {
    pub id: String,
    pub camera_id: String,
    pub incident_type: String,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
    pub camera_name: String,
    pub camera_location: String,
}

/// Incident as returned to API clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub incident_type: ThreatType,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
    pub camera: CameraSummary,
}

impl IncidentRecord {
    pub fn from_parts(incident: Incident, camera: CameraSummary) -> Self {
        Self {
            id: incident.id,
            incident_type: ThreatType::from(incident.incident_type),
            ts_start: incident.ts_start,
            ts_end: incident.ts_end,
            thumbnail_url: incident.thumbnail_url,
            resolved: incident.resolved,
            camera,
        }
    }
}

impl From<IncidentWithCamera> for IncidentRecord {
    fn from(row: IncidentWithCamera) -> Self {
        Self {
            id: row.id,
            incident_type: ThreatType::from(row.incident_type),
            ts_start: row.ts_start,
            ts_end: row.ts_end,
            thumbnail_url: row.thumbnail_url,
            resolved: row.resolved,
            camera: CameraSummary {
                name: row.camera_name,
                location: row.camera_location,
            },
        }
    }
}

/// Orders newest first; equal start times fall back to id order.
pub fn sort_newest_first(records: &mut [IncidentRecord]) {
    records.sort_by(|a, b| b.ts_start.cmp(&a.ts_start).then_with(|| a.id.cmp(&b.id)));
}

/// Incident produced by ingestion, before it has an identifier
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub camera_id: String,
    pub incident_type: ThreatType,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
}

impl NewIncident {
    pub fn validate(&self) -> Result<(), Error> {
        if self.camera_id.trim().is_empty() {
            return Err(Error::Validation("Camera ID is required".to_string()));
        }
        if self.ts_end < self.ts_start {
            return Err(Error::Validation(format!(
                "Incident end {} precedes start {}",
                self.ts_end.to_rfc3339(),
                self.ts_start.to_rfc3339()
            )));
        }
        Ok(())
    }

    /// Validate and assign a fresh identifier
    pub fn into_incident(self) -> Result<Incident, Error> {
        self.validate()?;
        Ok(Incident {
            id: Uuid::new_v4().to_string(),
            camera_id: self.camera_id,
            incident_type: self.incident_type.into(),
            ts_start: self.ts_start,
            ts_end: self.ts_end,
            thumbnail_url: self.thumbnail_url,
            resolved: self.resolved,
        })
    }
}

/// Resolution filter for incident queries; `None` matches everything
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub resolved: Option<bool>,
}

impl IncidentFilter {
    pub fn all() -> Self {
        Self { resolved: None }
    }

    pub fn unresolved() -> Self {
        Self {
            resolved: Some(false),
        }
    }

    pub fn matches(&self, resolved: bool) -> bool {
        self.resolved.map_or(true, |wanted| wanted == resolved)
    }
}

/// How a resolve request changes the `resolved` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    /// Flip whatever is stored
    Toggle,
    /// Store this value regardless of the current one
    Set(bool),
    /// Store `value` only if the current value equals `expected`
    CompareAndSet { expected: bool, value: bool },
}

impl ResolveAction {
    pub fn from_params(resolved: Option<bool>, expected: Option<bool>) -> Self {
        match (resolved, expected) {
            (None, None) => ResolveAction::Toggle,
            (Some(value), None) => ResolveAction::Set(value),
            (None, Some(expected)) => ResolveAction::CompareAndSet {
                expected,
                value: !expected,
            },
            (Some(value), Some(expected)) => ResolveAction::CompareAndSet { expected, value },
        }
    }

    /// New flag value given the stored one, or a conflict when the guard fails
    pub fn apply(&self, id: &str, current: bool) -> Result<bool, Error> {
        match *self {
            ResolveAction::Toggle => Ok(!current),
            ResolveAction::Set(value) => Ok(value),
            ResolveAction::CompareAndSet { expected, value } => {
                if current == expected {
                    Ok(value)
                } else {
                    Err(Error::Conflict(format!(
                        "Incident {} has resolved={}, expected {}",
                        id, current, expected
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn threat_type_keeps_unknown_labels() {
        assert_eq!(ThreatType::from("Gun Threat"), ThreatType::GunThreat);
        let other = ThreatType::from("Loitering");
        assert_eq!(other, ThreatType::Other("Loitering".to_string()));
        assert_eq!(other.badge_class(), "bg-gray-500");
        assert_eq!(String::from(other), "Loitering");
    }

    #[test]
    fn record_serializes_with_dashboard_field_names() {
        let start = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = IncidentRecord {
            id: "abc".to_string(),
            incident_type: ThreatType::FaceRecognised,
            ts_start: start,
            ts_end: start + Duration::seconds(120),
            thumbnail_url: "/thumbnails/thumb-3.jpeg".to_string(),
            resolved: false,
            camera: CameraSummary {
                name: "Vault".to_string(),
                location: "Building B - Basement".to_string(),
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Face Recognised");
        assert_eq!(json["tsStart"], "2024-05-01T10:00:00Z");
        assert_eq!(json["tsEnd"], "2024-05-01T10:02:00Z");
        assert_eq!(json["thumbnailUrl"], "/thumbnails/thumb-3.jpeg");
        assert_eq!(json["resolved"], false);
        assert_eq!(json["camera"]["name"], "Vault");
    }

    #[test]
    fn new_incident_rejects_end_before_start() {
        let now = Utc::now();
        let incident = NewIncident {
            camera_id: "cam".to_string(),
            incident_type: ThreatType::GunThreat,
            ts_start: now,
            ts_end: now - Duration::seconds(1),
            thumbnail_url: String::new(),
            resolved: false,
        };
        assert!(matches!(incident.validate(), Err(Error::Validation(_))));

        let instant = NewIncident {
            ts_end: now,
            ..incident
        };
        let stored = instant.into_incident().unwrap();
        assert_eq!(stored.ts_start, stored.ts_end);
        assert!(!stored.id.is_empty());
    }

    #[test]
    fn resolve_action_from_params() {
        assert_eq!(ResolveAction::from_params(None, None), ResolveAction::Toggle);
        assert_eq!(
            ResolveAction::from_params(Some(true), None),
            ResolveAction::Set(true)
        );
        assert_eq!(
            ResolveAction::from_params(None, Some(false)),
            ResolveAction::CompareAndSet {
                expected: false,
                value: true
            }
        );
    }

    #[test]
    fn compare_and_set_rejects_stale_expectation() {
        let action = ResolveAction::CompareAndSet {
            expected: false,
            value: true,
        };
        assert_eq!(action.apply("a", false), Ok(true));
        assert!(matches!(action.apply("a", true), Err(Error::Conflict(_))));
        assert_eq!(ResolveAction::Toggle.apply("a", true), Ok(false));
        assert_eq!(ResolveAction::Set(true).apply("a", true), Ok(true));
    }

    #[test]
    fn newest_first_breaks_ties_by_id() {
        let start = Utc::now();
        let make = |id: &str, offset: i64| IncidentRecord {
            id: id.to_string(),
            incident_type: ThreatType::GunThreat,
            ts_start: start - Duration::minutes(offset),
            ts_end: start,
            thumbnail_url: String::new(),
            resolved: false,
            camera: CameraSummary {
                name: "A".to_string(),
                location: "B".to_string(),
            },
        };
        let mut records = vec![make("b", 5), make("c", 0), make("a", 5)];
        sort_newest_first(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }
}
