//! Calendar event records
//!
//! Plain values crossing the store boundary. No driver types leak out of here.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A stored calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub person: String,
}

/// Input for inserting an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    pub person: String,
}

impl NewEvent {
    pub fn new(start_time: NaiveDateTime, person: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time: None,
            person: person.into(),
        }
    }

    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }
}

/// Fields to overwrite on an existing event. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChanges {
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

impl EventChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    pub fn start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = Some(end_time);
        self
    }
}

/// One record of a batch upsert: updates when `id` is set, inserts otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub person: String,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
}

impl BatchItem {
    pub fn changes(&self) -> EventChanges {
        EventChanges {
            person: Some(self.person.clone()),
            start_time: Some(self.start_time),
            end_time: self.end_time,
        }
    }

    pub fn to_new_event(&self) -> NewEvent {
        NewEvent {
            start_time: self.start_time,
            end_time: self.end_time,
            person: self.person.clone(),
        }
    }
}

/// Result of a batch upsert, ids listed in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub inserted: Vec<i64>,
    pub updated: Vec<i64>,
}

/// Feed entry returned by range queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    pub id: i64,
    pub start: String,
    pub end: Option<String>,
    pub title: String,
}

impl From<CalendarEvent> for EventView {
    fn from(event: CalendarEvent) -> Self {
        Self {
            id: event.id,
            start: iso8601(&event.start_time),
            end: event.end_time.as_ref().map(iso8601),
            title: event.person,
        }
    }
}

/// ISO-8601 text without zone; fractional seconds only when non-zero
pub fn iso8601(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
