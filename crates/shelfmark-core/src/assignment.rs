//! Assignment: the record binding one identifier to one book.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of one identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Available,
    Reserved,
    Scheduled,
    Assigned,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Available => "available",
            Status::Reserved => "reserved",
            Status::Scheduled => "scheduled",
            Status::Assigned => "assigned",
        }
    }

    /// Active means the identifier is bound and may not be handed out again.
    pub fn is_active(self) -> bool {
        self != Status::Available
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "available" => Ok(Status::Available),
            "reserved" => Ok(Status::Reserved),
            "scheduled" => Ok(Status::Scheduled),
            "assigned" => Ok(Status::Assigned),
            other => Err(format!(
                "unknown status `{other}`; expected available, reserved, scheduled, or assigned"
            )),
        }
    }
}

/// One identifier's state. Keyed by canonical ISBN in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub isbn: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub book_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub imprint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publisher: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default)]
    pub status: Status,
    #[serde(default = "default_priority")]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<NaiveDate>,

    /// Identifier lies outside every registered block (manually supplied).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub external: bool,

    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_priority() -> i32 {
    2
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl Assignment {
    /// A fresh Available record for `isbn`, nothing booked.
    pub fn new(isbn: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            isbn: isbn.into(),
            book_id: String::new(),
            title: String::new(),
            imprint: String::new(),
            publisher: String::new(),
            format: String::new(),
            notes: String::new(),
            status: Status::Available,
            priority: default_priority(),
            scheduled_date: None,
            assigned_date: None,
            external: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    pub fn touch_updated_at(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Reset to Available: the booking is cleared, the record stays.
    pub fn clear_booking(&mut self, now: DateTime<Utc>) {
        self.book_id.clear();
        self.scheduled_date = None;
        self.assigned_date = None;
        self.set_status(Status::Available, now);
    }
}
