use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// Raw export records
// ============================================================================

/// One conversation record as it appears in the exported archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawConversation {
    pub participants: Vec<String>,
    pub conversation: Vec<RawMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub sender: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<Vec<RawLike>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLike {
    pub username: String,
}

// ============================================================================
// Normalized messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeEvent {
    pub liker: String,
}

/// A message reduced to what the aggregation engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: String,
    pub timestamp: NaiveDate,
    pub likes: Vec<LikeEvent>,
}

impl Message {
    pub fn from_raw(raw: &RawMessage) -> Result<Self> {
        Ok(Self {
            sender: raw.sender.clone(),
            timestamp: parse_message_date(&raw.created_at)?,
            likes: raw
                .likes
                .iter()
                .flatten()
                .map(|like| LikeEvent {
                    liker: like.username.clone(),
                })
                .collect(),
        })
    }
}

/// Parse an export timestamp down to its calendar date.
///
/// The date is taken in the timestamp's own offset, so
/// "2019-03-12T23:30:00-05:00" lands on the 12th.
pub fn parse_message_date(created_at: &str) -> Result<NaiveDate> {
    let trimmed = created_at.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt.date());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    bail!("Unparsable message timestamp: {created_at:?}")
}
