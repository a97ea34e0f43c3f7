use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttendanceStatus {
    #[default]
    Hadir,
    Izin,
    Sakit,
    Terlambat,
    Alpa,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 5] = [
        AttendanceStatus::Hadir,
        AttendanceStatus::Izin,
        AttendanceStatus::Sakit,
        AttendanceStatus::Terlambat,
        AttendanceStatus::Alpa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Hadir => "Hadir",
            AttendanceStatus::Izin => "Izin",
            AttendanceStatus::Sakit => "Sakit",
            AttendanceStatus::Terlambat => "Terlambat",
            AttendanceStatus::Alpa => "Alpa",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check-in vs check-out. Independent of [`AttendanceStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceType {
    In,
    Out,
}

impl AttendanceType {
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceType::In => "Masuk",
            AttendanceType::Out => "Pulang",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            AttendanceType::In => "Laporan Kehadiran Berhasil Terkirim!",
            AttendanceType::Out => "Laporan Selesai Tugas Berhasil Terkirim!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_category: Option<String>,
}

/// `YYYY-MM-DDTHH:MM:SS.sssZ`, the shape browsers write with `toISOString`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Immutable snapshot of the record list, newest first.
pub type Records = Arc<[AttendanceRecord]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    pub unit: String,
    pub avatar: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: "u101".to_string(),
            name: "Ustadz Ahmad Fauzi".to_string(),
            role: "Pengajar Madrasah".to_string(),
            unit: "Unit Aliyah".to_string(),
            avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=Ahmad".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: u64,
    pub present: u64,
    pub excused_or_sick: u64,
    pub late: u64,
    pub discipline_rate: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: AttendanceStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct PersonRecap {
    pub name: String,
    pub hadir: u64,
    pub izin: u64,
    pub sakit: u64,
    pub terlambat: u64,
    pub alpa: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub stats: SummaryStats,
    pub distribution: Vec<StatusCount>,
    pub daily: Vec<DailyPoint>,
    pub recap: Vec<PersonRecap>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DraftUpdate {
    pub status: Option<AttendanceStatus>,
    pub note: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub status: AttendanceStatus,
    pub note: String,
    pub photo_attached: bool,
    pub pending: bool,
    pub can_submit: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "type")]
    pub kind: AttendanceType,
    #[serde(default)]
    pub location: Option<LocationData>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: String,
    pub record: AttendanceRecord,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsightResponse {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_camel_case_and_omits_absent_fields() {
        let record = AttendanceRecord {
            id: "1700000000000".to_string(),
            user_id: "u1".to_string(),
            user_name: "Ahmad".to_string(),
            timestamp: "2026-01-05T01:30:00.000Z".parse().unwrap(),
            kind: AttendanceType::In,
            status: AttendanceStatus::Terlambat,
            location: None,
            photo: None,
            note: Some("rapat".to_string()),
            activity_category: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["userId"], "u1");
        assert_eq!(object["userName"], "Ahmad");
        assert_eq!(object["type"], "In");
        assert_eq!(object["status"], "Terlambat");
        assert!(!object.contains_key("location"));
        assert!(!object.contains_key("photo"));
        assert!(!object.contains_key("activityCategory"));
    }

    #[test]
    fn record_parses_browser_shaped_payload() {
        let raw = r#"{
            "id": "1736040600000",
            "userId": "u101",
            "userName": "Ustadz Ahmad Fauzi",
            "timestamp": "2025-01-05T01:30:00.000Z",
            "type": "Out",
            "status": "Izin",
            "location": {"latitude": -7.1, "longitude": 112.4},
            "note": ""
        }"#;
        let record: AttendanceRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.kind, AttendanceType::Out);
        assert_eq!(record.status, AttendanceStatus::Izin);
        assert_eq!(record.location.as_ref().unwrap().address, None);
        assert_eq!(record.note.as_deref(), Some(""));
    }

    #[test]
    fn timestamp_keeps_millisecond_shape() {
        let raw = r#"{"id":"1","userId":"u1","userName":"A","timestamp":"2026-01-05T01:30:00.000Z","type":"In","status":"Hadir"}"#;
        let record: AttendanceRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&record).unwrap(), raw);

        let offset: AttendanceRecord = serde_json::from_str(
            &raw.replace("2026-01-05T01:30:00.000Z", "2026-01-05T08:30:00.250+07:00"),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&offset).unwrap()["timestamp"],
            "2026-01-05T01:30:00.250Z"
        );
    }

    #[test]
    fn labels_follow_direction() {
        assert_eq!(AttendanceType::In.label(), "Masuk");
        assert_eq!(AttendanceType::Out.label(), "Pulang");
        assert!(AttendanceType::Out.success_message().contains("Selesai Tugas"));
    }
}
