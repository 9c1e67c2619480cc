use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Top-level snapshot key holding the capture time
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Identity fields of the logged-in account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub gid: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub platform: Option<String>,
}

/// Complete agent state broadcast to observers once per tick.
///
/// Built in one pass by the state aggregator and never mutated afterwards;
/// sections that could not be read are serialized as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    timestamp: i64,
    user: Option<Identity>,
    connection: Option<Value>,
    #[serde(flatten)]
    sections: BTreeMap<String, Option<Value>>,
}

impl Snapshot {
    pub fn new(
        taken_at: DateTime<Utc>,
        user: Option<Identity>,
        connection: Option<Value>,
        sections: BTreeMap<String, Option<Value>>,
    ) -> Self {
        Self {
            timestamp: taken_at.timestamp_millis(),
            user,
            connection,
            sections,
        }
    }

    /// Epoch milliseconds at which the snapshot was taken
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    pub fn connection(&self) -> Option<&Value> {
        self.connection.as_ref()
    }

    /// Sub-state of one provider; `None` when the section is unknown or unavailable
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name).and_then(Option::as_ref)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
