//! The local event schema.
//!
//! Events are stored as an ordered list per partition. Each event carries a
//! surrogate [`EventId`] so deletion never depends on list position. Two events
//! describe "the same thing" when title, date and start time match exactly.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color;
use crate::error::{AgendaError, AgendaResult};

/// Duration assigned to all-day events, in minutes.
pub const ALL_DAY_MINUTES: u32 = 1440;

/// Stable identifier of a stored event.
///
/// Files written before ids existed deserialize to the nil id; the store
/// replaces those with fresh ids on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        EventId(Uuid::new_v4())
    }

    pub fn unassigned() -> Self {
        EventId(Uuid::nil())
    }

    pub fn is_unassigned(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::unassigned()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = AgendaError;

    fn from_str(s: &str) -> AgendaResult<Self> {
        Uuid::parse_str(s.trim())
            .map(EventId)
            .map_err(|_| AgendaError::EventNotFound(s.to_string()))
    }
}

fn default_color() -> String {
    color::DEFAULT_HEX.to_string()
}

/// A locally stored calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Length in minutes, always positive.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    /// Set on events pulled from Google; these are never pushed back.
    #[serde(default)]
    pub imported_from_google: bool,
}

impl Event {
    /// Exact (title, date, time) equality used for pull deduplication.
    pub fn same_slot(&self, other: &Event) -> bool {
        self.title == other.title && self.date == other.date && self.time == other.time
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(i64::from(self.duration))
    }
}

/// User-supplied fields for a new event, validated by [`EventDraft::into_event`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub time: String,
    pub duration: u32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl EventDraft {
    pub fn into_event(self) -> AgendaResult<Event> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AgendaError::InvalidEvent("title must not be empty".into()));
        }
        if self.duration == 0 {
            return Err(AgendaError::InvalidEvent(
                "duration must be at least one minute".into(),
            ));
        }

        let color = match self.color.as_deref().map(str::trim) {
            None | Some("") => color::DEFAULT_HEX.to_string(),
            Some(c) => color::resolve(c)
                .ok_or_else(|| AgendaError::InvalidEvent(format!("unknown colour '{c}'")))?
                .to_string(),
        };

        Ok(Event {
            id: EventId::new(),
            title,
            date: parse_date(&self.date)?,
            time: parse_time(&self.time)?,
            duration: self.duration,
            description: self.description.filter(|d| !d.trim().is_empty()),
            color,
            imported_from_google: false,
        })
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> AgendaResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AgendaError::InvalidEvent(format!("invalid date '{s}', expected YYYY-MM-DD")))
}

/// Parse a 24h `HH:MM` time (seconds are tolerated and dropped).
pub fn parse_time(s: &str) -> AgendaResult<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
        .and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0))
        .ok_or_else(|| AgendaError::InvalidEvent(format!("invalid time '{s}', expected HH:MM")))
}

/// Serde adapter writing times as `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> EventDraft {
        EventDraft {
            title: "Gym".to_string(),
            date: "2025-06-10".to_string(),
            time: "18:00".to_string(),
            duration: 60,
            description: None,
            color: None,
        }
    }

    #[test]
    fn test_draft_defaults_color_and_flags() {
        let event = draft().into_event().unwrap();
        assert_eq!(event.color, color::DEFAULT_HEX);
        assert!(!event.imported_from_google);
        assert!(!event.id.is_unassigned());
    }

    #[test]
    fn test_draft_rejects_invalid_fields() {
        let mut d = draft();
        d.duration = 0;
        assert!(matches!(d.into_event(), Err(AgendaError::InvalidEvent(_))));

        let mut d = draft();
        d.time = "6pm".to_string();
        assert!(d.into_event().is_err());

        let mut d = draft();
        d.color = Some("#000000".to_string());
        assert!(d.into_event().is_err());

        let mut d = draft();
        d.title = "   ".to_string();
        assert!(d.into_event().is_err());
    }

    #[test]
    fn test_serializes_time_as_hhmm() {
        let event = draft().into_event().unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["time"], "18:00");
        assert_eq!(json["date"], "2025-06-10");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_legacy_record_without_id_or_color() {
        let json = r#"{"title":"Gym","date":"2025-06-10","time":"18:00","duration":60}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(event.id.is_unassigned());
        assert_eq!(event.color, color::DEFAULT_HEX);
        assert!(!event.imported_from_google);
    }

    #[test]
    fn test_same_slot_is_exact() {
        let a = draft().into_event().unwrap();
        let mut b = draft().into_event().unwrap();
        assert!(a.same_slot(&b));
        b.title = "gym".to_string();
        assert!(!a.same_slot(&b));
    }

    #[test]
    fn test_end_time_crosses_midnight() {
        let mut event = draft().into_event().unwrap();
        event.time = parse_time("23:30").unwrap();
        event.duration = 90;
        assert_eq!(
            event.ends_at(),
            parse_date("2025-06-11").unwrap().and_time(parse_time("01:00").unwrap())
        );
    }
}
