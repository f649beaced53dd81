use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event users can register for.
///
/// The boolean flags are computed by the server for the requesting user, so
/// the same event reads differently depending on whose token fetched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResource {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    /// Maximum number of participants.
    pub capacity: u32,
    #[serde(rename = "waitListCapacity")]
    pub wait_list_capacity: u32,
    pub status: String,
    #[serde(with = "timestamp")]
    pub starts_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub ends_at: DateTime<Utc>,
    pub is_happening: bool,
    pub is_participant: bool,
    pub is_past: bool,
    pub is_waiting: bool,
    #[serde(rename = "can_add_in_waitList")]
    pub can_add_in_wait_list: bool,
    pub can_add_new_participant: bool,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// A participant reference inside an [`EventResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: u64,
}

impl EventResource {
    pub fn participant_ids(&self) -> Vec<u64> {
        self.participants.iter().map(|p| p.id).collect()
    }

    pub fn seats_taken(&self) -> usize {
        self.participants.len()
    }

    /// Free participant seats. Zero when the event is over capacity.
    pub fn seats_left(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.participants.len())
    }
}

/// Timestamps arrive either as RFC 3339 or as `YYYY-MM-DD HH:MM:SS`, the
/// latter meaning UTC. They are always written back as RFC 3339.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw:?}")))
    }

    fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}
