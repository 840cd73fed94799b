//! Meter domain models.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format used when reporting the last communication timestamp.
pub const LAST_COMMUNICATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the `MeterData` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterRecord {
    pub meter_id: String,
    pub last_communication: Option<NaiveDateTime>,
    pub meter_type: Option<String>,
    pub communication_medium: Option<String>,
    pub ctwc: Option<String>,
}

/// Whether a meter has reported in today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterStatus {
    Communicating,
    #[serde(rename = "noncommunicating")]
    NonCommunicating,
}

impl MeterStatus {
    /// A meter is communicating iff it last reported on the calendar day `today`.
    /// A meter that has never reported is non-communicating.
    pub fn derive(last_communication: Option<NaiveDateTime>, today: NaiveDate) -> Self {
        match last_communication {
            Some(ts) if ts.date() == today => MeterStatus::Communicating,
            _ => MeterStatus::NonCommunicating,
        }
    }
}

impl MeterRecord {
    pub fn status(&self, today: NaiveDate) -> MeterStatus {
        MeterStatus::derive(self.last_communication, today)
    }

    pub fn last_communication_display(&self) -> Option<String> {
        self.last_communication
            .map(|ts| ts.format(LAST_COMMUNICATION_FORMAT).to_string())
    }
}
