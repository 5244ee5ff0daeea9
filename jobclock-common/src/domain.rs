use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle of a time entry. Stored as a string column, not a db enum,
/// so legacy rows with odd casing ("Completed") still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntryStatus {
    Active,
    Paused,
    Completed,
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown entry status {other:?}")),
        }
    }
}

impl EntryStatus {
    /// The canonical stored spelling. Completed entries have historically
    /// been written with a capital C and existing data depends on it.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Active => "active",
            EntryStatus::Paused => "paused",
            EntryStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoAccuracy {
    Good,
    Fair,
    Poor,
}

impl GeoAccuracy {
    /// Classify a reported accuracy radius in meters.
    pub fn classify(accuracy_m: f64) -> Self {
        if accuracy_m <= 20.0 {
            Self::Good
        } else if accuracy_m <= 100.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// A single GPS fix as captured at timer start/end.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub accuracy_class: GeoAccuracy,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp: OffsetDateTime::now_utc(),
            accuracy_class: GeoAccuracy::classify(accuracy),
        }
    }
}

/// A saved (job, account) pairing used to pre-fill the timer start form.
/// Unique per job_no; the latest write wins and carries updated_at.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Favorite {
    pub job_no: String,
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc_name: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub added_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Wire form of a time entry as served by the API and consumed by the
/// client timer engine.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub job_no: String,
    pub job_name: String,
    pub employee_code: String,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub account_no: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub total_seconds: i64,
    #[serde(default)]
    pub comment: Option<String>,
    pub status: EntryStatus,
    pub spire_status: String,
    #[serde(default)]
    pub start_location: Vec<GeoFix>,
    #[serde(default)]
    pub end_location: Vec<GeoFix>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TimeEntry {
    /// True while the entry still counts toward the one-active-timer rule.
    pub fn is_running(&self) -> bool {
        self.status == EntryStatus::Active && self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_any_casing() {
        assert_eq!("Completed".parse::<EntryStatus>(), Ok(EntryStatus::Completed));
        assert_eq!("completed".parse::<EntryStatus>(), Ok(EntryStatus::Completed));
        assert_eq!("ACTIVE".parse::<EntryStatus>(), Ok(EntryStatus::Active));
        assert!("done".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn completed_keeps_legacy_capitalisation() {
        assert_eq!(EntryStatus::Completed.as_str(), "Completed");
    }

    #[test]
    fn accuracy_classification_boundaries() {
        assert_eq!(GeoAccuracy::classify(5.0), GeoAccuracy::Good);
        assert_eq!(GeoAccuracy::classify(20.0), GeoAccuracy::Good);
        assert_eq!(GeoAccuracy::classify(20.1), GeoAccuracy::Fair);
        assert_eq!(GeoAccuracy::classify(100.0), GeoAccuracy::Fair);
        assert_eq!(GeoAccuracy::classify(250.0), GeoAccuracy::Poor);
    }
}
