//! Wire contracts for the CultureRadar REST API
//!
//! The API emits datetimes either as RFC 3339 or as naive
//! `YYYY-MM-DDTHH:MM:SS[.f]` strings depending on the endpoint; both are
//! accepted here. Required dates fail deserialization when unparsable,
//! optional ones degrade to `None`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Parse a datetime string in either wire form
pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

fn de_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_datetime(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("unparsable datetime: {s}")))
}

fn de_datetime_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.as_deref().and_then(parse_datetime))
}

/// One concrete time slot of an event. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Occurrence {
    pub id: i64,
    /// Slot start
    #[serde(deserialize_with = "de_datetime")]
    pub debut: DateTime<Utc>,
    /// Slot end, when the API provides one
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub fin: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
}

/// A cultural event with its ordered occurrences
#[derive(Debug, Clone, Deserialize)]
pub struct EventDetail {
    pub id: i64,
    pub titre: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub longdescription: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub lieu: Option<String>,
    #[serde(default)]
    pub commune: Option<String>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub code_postal: Option<String>,
    #[serde(default)]
    pub pays: Option<String>,
    #[serde(default)]
    pub prix: Option<f64>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub age_min: Option<i64>,
    #[serde(default)]
    pub age_max: Option<i64>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

impl EventDetail {
    /// Look up an occurrence of this event by id
    pub fn occurrence(&self, occurrence_id: i64) -> Option<&Occurrence> {
        self.occurrences.iter().find(|o| o.id == occurrence_id)
    }
}

/// Participation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    Going,
    Cancelled,
}

/// A user's commitment to attend one specific occurrence
#[derive(Debug, Clone, Deserialize)]
pub struct Participation {
    /// The only handle usable for a later DELETE
    pub id: i64,
    pub status: ParticipationStatus,
    pub occurrence_id: i64,
    /// Parent event id, denormalized by the API for convenience
    pub evenement_id: i64,
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub occurrence_debut: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub occurrence_fin: Option<DateTime<Utc>>,
    #[serde(default)]
    pub occurrence_all_day: Option<bool>,
    #[serde(default)]
    pub evenement_titre: Option<String>,
    #[serde(default)]
    pub evenement_lieu: Option<String>,
    #[serde(default)]
    pub evenement_commune: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of POST `/me/participations`
#[derive(Debug, Serialize)]
pub struct JoinRequest {
    pub occurrence_id: i64,
}

/// Subscription state of the current user
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionStatus {
    pub is_active: bool,
    #[serde(default, deserialize_with = "de_datetime_opt")]
    pub premium_since: Option<DateTime<Utc>>,
}

/// Public rating aggregate of an event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RatingAverage {
    /// `None` while the event has no ratings
    pub average: Option<f64>,
    pub count: u64,
}

/// The current user's own rating of an event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MyRating {
    pub rating: u8,
    #[serde(default)]
    pub commentaire: Option<String>,
}

/// Body of PUT `/evenements/{id}/ratings` (upsert)
#[derive(Debug, Clone, Serialize)]
pub struct RatingSubmission {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentaire: Option<String>,
}

/// Body of POST `/login`
#[derive(Debug, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// User object returned by the auth endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub nom: Option<String>,
    pub role: String,
}

/// Response of POST `/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: ApiUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_datetime_both_forms() {
        let rfc = parse_datetime("2025-06-01T20:30:00Z").unwrap();
        assert_eq!(rfc.hour(), 20);

        let naive = parse_datetime("2025-06-01T20:30:00").unwrap();
        assert_eq!(naive, rfc);

        let fractional = parse_datetime("2025-06-01T20:30:00.123456").unwrap();
        assert_eq!(fractional.hour(), 20);

        assert!(parse_datetime("pas une date").is_none());
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{
            "id": 12,
            "titre": "Nuit des musées",
            "lieu": "Musée des Beaux-Arts",
            "commune": "Lyon",
            "latitude": 45.7578,
            "longitude": 4.8320,
            "keywords": ["musée", "nocturne"],
            "occurrences": [
                {"id": 3, "debut": "2025-05-17T19:00:00", "fin": "2025-05-17T23:00:00"},
                {"id": 4, "debut": "2025-05-18T19:00:00Z", "all_day": false}
            ]
        }"#;
        let ev: EventDetail = serde_json::from_str(json).unwrap();
        assert_eq!(ev.titre, "Nuit des musées");
        assert_eq!(ev.occurrences.len(), 2);
        assert!(ev.occurrences[0].fin.is_some());
        assert!(!ev.occurrences[1].all_day);
        assert_eq!(ev.occurrence(4).unwrap().id, 4);
        assert!(ev.occurrence(99).is_none());
    }

    #[test]
    fn test_participation_deserialization() {
        let json = r#"{
            "id": 101,
            "status": "going",
            "occurrence_id": 3,
            "evenement_id": 12,
            "occurrence_debut": "2025-05-17T19:00:00",
            "evenement_titre": "Nuit des musées",
            "created_at": "2025-04-01T08:00:00Z",
            "updated_at": "2025-04-01T08:00:00Z"
        }"#;
        let p: Participation = serde_json::from_str(json).unwrap();
        assert_eq!(p.status, ParticipationStatus::Going);
        assert_eq!(p.occurrence_id, 3);
        assert_eq!(p.evenement_id, 12);
    }

    #[test]
    fn test_unparsable_optional_date_degrades_to_none() {
        let json = r#"{
            "id": 101,
            "status": "cancelled",
            "occurrence_id": 3,
            "evenement_id": 12,
            "occurrence_debut": "n/a"
        }"#;
        let p: Participation = serde_json::from_str(json).unwrap();
        assert!(p.occurrence_debut.is_none());
    }

    #[test]
    fn test_rating_average_null() {
        let avg: RatingAverage = serde_json::from_str(r#"{"average": null, "count": 0}"#).unwrap();
        assert!(avg.average.is_none());
        assert_eq!(avg.count, 0);
    }
}
