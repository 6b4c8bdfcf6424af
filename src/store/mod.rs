use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{ActivityCounts, TextActivityRecord, VoiceActivityRecord};

#[cfg(test)]
pub mod memory;
pub mod mongo;

#[cfg(test)]
pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Where completed voice sessions and daily message tallies end up.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn insert_voice(&self, record: &VoiceActivityRecord) -> Result<(), StoreError>;

    async fn find_text(
        &self,
        user_id: &str,
        channel_id: &str,
        date: &str,
    ) -> Result<Option<TextActivityRecord>, StoreError>;

    /// Bumps `message_count` by one and moves `last_message_at` forward.
    async fn increment_text(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn insert_text(&self, record: &TextActivityRecord) -> Result<(), StoreError>;

    async fn counts(&self) -> Result<ActivityCounts, StoreError>;
}
