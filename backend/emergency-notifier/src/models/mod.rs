use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::NotifierError;

pub mod location;

pub use location::{GeoPoint, RadiusBand, EARTH_RADIUS_KM};

/// Emergency category; doubles as the FCM topic name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyCategory {
    Fire,
    Medical,
    Police,
    NaturalDisaster,
    Accident,
    Security,
    Other,
}

impl EmergencyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyCategory::Fire => "fire",
            EmergencyCategory::Medical => "medical",
            EmergencyCategory::Police => "police",
            EmergencyCategory::NaturalDisaster => "natural_disaster",
            EmergencyCategory::Accident => "accident",
            EmergencyCategory::Security => "security",
            EmergencyCategory::Other => "other",
        }
    }
}

impl fmt::Display for EmergencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyCategory {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fire" => Ok(EmergencyCategory::Fire),
            "medical" => Ok(EmergencyCategory::Medical),
            "police" => Ok(EmergencyCategory::Police),
            "natural_disaster" => Ok(EmergencyCategory::NaturalDisaster),
            "accident" => Ok(EmergencyCategory::Accident),
            "security" => Ok(EmergencyCategory::Security),
            "other" => Ok(EmergencyCategory::Other),
            other => Err(NotifierError::InvalidInput(format!(
                "unknown emergency category '{}'",
                other
            ))),
        }
    }
}

/// Emergency report as it arrives on the wire. Every field is optional so
/// that missing values surface as validation errors instead of body-parse
/// failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyReportPayload {
    #[serde(alias = "emergencyId")]
    pub id: Option<String>,
    #[serde(alias = "type")]
    pub category: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
}

/// Validated emergency report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergencyReport {
    pub id: String,
    pub category: EmergencyCategory,
    pub location: GeoPoint,
    pub description: String,
}

impl EmergencyReport {
    pub fn new(
        id: impl Into<String>,
        category: EmergencyCategory,
        latitude: f64,
        longitude: f64,
        description: impl Into<String>,
    ) -> Result<Self, NotifierError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(NotifierError::InvalidInput(
                "emergency id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id,
            category,
            location: GeoPoint::new(latitude, longitude).map_err(NotifierError::InvalidInput)?,
            description: description.into(),
        })
    }
}

impl TryFrom<EmergencyReportPayload> for EmergencyReport {
    type Error = NotifierError;

    fn try_from(payload: EmergencyReportPayload) -> Result<Self, Self::Error> {
        let missing = |field: &str| NotifierError::InvalidInput(format!("missing {}", field));

        let id = payload.id.ok_or_else(|| missing("id"))?;
        let category: EmergencyCategory =
            payload.category.ok_or_else(|| missing("category"))?.parse()?;
        let latitude = payload.latitude.ok_or_else(|| missing("latitude"))?;
        let longitude = payload.longitude.ok_or_else(|| missing("longitude"))?;

        EmergencyReport::new(
            id,
            category,
            latitude,
            longitude,
            payload.description.unwrap_or_default(),
        )
    }
}

/// Role of a user in the directory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Citizen,
    Responder,
    Admin,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    /// Unrecognised roles map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "citizen" => UserRole::Citizen,
            "responder" => UserRole::Responder,
            "admin" => UserRole::Admin,
            _ => UserRole::Unknown,
        }
    }
}

/// Read-only view of a user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDirectoryEntry {
    pub role: UserRole,
    pub location: Option<GeoPoint>,
    pub device_token: Option<String>,
}

impl UserDirectoryEntry {
    pub fn new(role: UserRole, location: Option<GeoPoint>, device_token: Option<&str>) -> Self {
        Self {
            role,
            location,
            device_token: device_token.map(str::to_string),
        }
    }
}

/// Push message content, shared by the topic and device broadcasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

/// Outcome of one dispatch branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    Sent,
    /// Nothing to send (no eligible recipients)
    Skipped,
    Failed { reason: String },
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Sent => "sent",
            DispatchStatus::Skipped => "skipped",
            DispatchStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchStatus::Failed { .. })
    }
}

/// Aggregate view over both branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Partial,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Partial => "partial",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

/// Result of one fan-out invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub emergency_id: String,
    pub topic: String,
    pub topic_status: DispatchStatus,
    /// Unique device tokens targeted by the nearby broadcast
    pub nearby_recipients: usize,
    pub nearby_status: DispatchStatus,
    pub nearby_delivered: usize,
    pub nearby_failed: usize,
    pub completed_at: DateTime<Utc>,
}

impl DeliveryResult {
    pub fn outcome(&self) -> DeliveryOutcome {
        let topic_failed = self.topic_status.is_failed();
        let nearby_failed = self.nearby_status.is_failed();

        match (topic_failed, nearby_failed) {
            (false, false) if self.nearby_failed == 0 => DeliveryOutcome::Delivered,
            (true, true) => DeliveryOutcome::Failed,
            // Topic failed and there was nobody nearby to reach instead
            (true, false) if self.nearby_status == DispatchStatus::Skipped => {
                DeliveryOutcome::Failed
            }
            _ => DeliveryOutcome::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(topic: DispatchStatus, nearby: DispatchStatus, failed: usize) -> DeliveryResult {
        DeliveryResult {
            emergency_id: "e1".to_string(),
            topic: "fire".to_string(),
            topic_status: topic,
            nearby_recipients: 2,
            nearby_status: nearby,
            nearby_delivered: 2 - failed.min(2),
            nearby_failed: failed,
            completed_at: Utc::now(),
        }
    }

    fn failed() -> DispatchStatus {
        DispatchStatus::Failed {
            reason: "boom".to_string(),
        }
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "natural_disaster".parse::<EmergencyCategory>().unwrap(),
            EmergencyCategory::NaturalDisaster
        );
        assert_eq!("FIRE".parse::<EmergencyCategory>().unwrap(), EmergencyCategory::Fire);
        assert!("flood".parse::<EmergencyCategory>().is_err());
        assert_eq!(EmergencyCategory::NaturalDisaster.to_string(), "natural_disaster");
    }

    #[test]
    fn test_report_from_payload() {
        let payload = EmergencyReportPayload {
            id: Some("em-1".to_string()),
            category: Some("medical".to_string()),
            latitude: Some(10.0),
            longitude: Some(20.0),
            description: None,
        };

        let report = EmergencyReport::try_from(payload).unwrap();
        assert_eq!(report.id, "em-1");
        assert_eq!(report.category, EmergencyCategory::Medical);
        assert_eq!(report.location, GeoPoint::new(10.0, 20.0).unwrap());
        assert_eq!(report.description, "");
    }

    #[test]
    fn test_report_missing_fields_rejected() {
        let base = EmergencyReportPayload {
            id: Some("em-1".to_string()),
            category: Some("fire".to_string()),
            latitude: Some(10.0),
            longitude: Some(20.0),
            description: Some("smoke".to_string()),
        };

        let mut no_category = base.clone();
        no_category.category = None;
        let err = EmergencyReport::try_from(no_category).unwrap_err();
        assert!(err.to_string().contains("missing category"));

        let mut no_lon = base.clone();
        no_lon.longitude = None;
        assert!(EmergencyReport::try_from(no_lon).is_err());

        let mut bad_lat = base.clone();
        bad_lat.latitude = Some(123.0);
        assert!(EmergencyReport::try_from(bad_lat).is_err());

        let mut blank_id = base;
        blank_id.id = Some("  ".to_string());
        assert!(EmergencyReport::try_from(blank_id).is_err());
    }

    #[test]
    fn test_payload_accepts_legacy_field_names() {
        let payload: EmergencyReportPayload = serde_json::from_value(serde_json::json!({
            "emergencyId": "em-9",
            "type": "police",
            "latitude": 1.5,
            "longitude": 2.5,
            "description": "Break-in"
        }))
        .unwrap();

        assert_eq!(payload.id.as_deref(), Some("em-9"));
        assert_eq!(payload.category.as_deref(), Some("police"));
    }

    #[test]
    fn test_user_role_parsing() {
        assert_eq!(UserRole::parse("Citizen"), UserRole::Citizen);
        assert_eq!(UserRole::parse("responder"), UserRole::Responder);
        assert_eq!(UserRole::parse("superuser"), UserRole::Unknown);

        let role: UserRole = serde_json::from_str("\"dispatcher\"").unwrap();
        assert_eq!(role, UserRole::Unknown);
    }

    #[test]
    fn test_delivery_outcome() {
        assert_eq!(
            result(DispatchStatus::Sent, DispatchStatus::Sent, 0).outcome(),
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            result(DispatchStatus::Sent, DispatchStatus::Skipped, 0).outcome(),
            DeliveryOutcome::Delivered
        );
        assert_eq!(
            result(failed(), DispatchStatus::Sent, 0).outcome(),
            DeliveryOutcome::Partial
        );
        assert_eq!(
            result(DispatchStatus::Sent, DispatchStatus::Sent, 1).outcome(),
            DeliveryOutcome::Partial
        );
        assert_eq!(
            result(DispatchStatus::Sent, failed(), 2).outcome(),
            DeliveryOutcome::Partial
        );
        assert_eq!(
            result(failed(), DispatchStatus::Skipped, 0).outcome(),
            DeliveryOutcome::Failed
        );
        assert_eq!(result(failed(), failed(), 2).outcome(), DeliveryOutcome::Failed);
    }

    #[test]
    fn test_dispatch_status_serialization() {
        let json = serde_json::to_value(failed()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
        assert_eq!(
            serde_json::to_value(DispatchStatus::Skipped).unwrap()["status"],
            "skipped"
        );
    }
}
