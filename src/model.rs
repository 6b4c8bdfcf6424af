use std::fmt;

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const VOICE_COLLECTION: &str = "voice_activity";
pub const TEXT_COLLECTION: &str = "text_activity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

/// An open voice session. Lives only in memory until the user leaves or moves.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSession {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub joined_at: DateTime<Utc>,
}

impl VoiceSession {
    pub fn open(user_id: UserId, channel: &ChannelRef, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            channel_id: channel.id,
            channel_name: channel.name.clone(),
            joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceActivityRecord {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub channel_name: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub left_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub date: String,
}

impl VoiceActivityRecord {
    /// Turns a finished session into the record that gets persisted.
    pub fn close(session: VoiceSession, left_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: session.user_id.to_string(),
            channel_id: session.channel_id.to_string(),
            channel_name: session.channel_name,
            joined_at: session.joined_at,
            left_at,
            duration_seconds: duration_seconds(session.joined_at, left_at),
            date: activity_date(left_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextActivityRecord {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub message_count: i64,
    pub date: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_message_at: DateTime<Utc>,
}

impl TextActivityRecord {
    pub fn first_message(user_id: UserId, channel: &ChannelRef, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            channel_id: channel.id.to_string(),
            channel_name: channel.name.clone(),
            message_count: 1,
            date: activity_date(at),
            last_message_at: at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounts {
    pub voice_records: u64,
    pub text_records: u64,
}

/// Whole seconds between join and leave, never negative.
pub fn duration_seconds(joined_at: DateTime<Utc>, left_at: DateTime<Utc>) -> i64 {
    (left_at - joined_at).num_seconds().max(0)
}

/// UTC calendar day as `YYYY-MM-DD`.
pub fn activity_date(at: DateTime<Utc>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}
