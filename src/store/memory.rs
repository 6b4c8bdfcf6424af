use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::ActivityStore;
use crate::error::StoreError;
use crate::model::{ActivityCounts, TextActivityRecord, VoiceActivityRecord};

/// In-memory store for exercising the trackers without a database.
#[derive(Default)]
pub struct MemoryStore {
    voice: Mutex<Vec<VoiceActivityRecord>>,
    text: Mutex<Vec<TextActivityRecord>>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails with `StoreError::Rejected`.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn voice_records(&self) -> Vec<VoiceActivityRecord> {
        self.voice.lock().await.clone()
    }

    pub async fn text_records(&self) -> Vec<TextActivityRecord> {
        self.text.lock().await.clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("store is read-only"));
        }
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn insert_voice(&self, record: &VoiceActivityRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        self.voice.lock().await.push(record.clone());
        Ok(())
    }

    async fn find_text(
        &self,
        user_id: &str,
        channel_id: &str,
        date: &str,
    ) -> Result<Option<TextActivityRecord>, StoreError> {
        let text = self.text.lock().await;
        Ok(text
            .iter()
            .find(|r| r.user_id == user_id && r.channel_id == channel_id && r.date == date)
            .cloned())
    }

    async fn increment_text(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut text = self.text.lock().await;
        if let Some(record) = text.iter_mut().find(|r| r.id == id) {
            record.message_count += 1;
            record.last_message_at = at;
        }
        Ok(())
    }

    async fn insert_text(&self, record: &TextActivityRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        self.text.lock().await.push(record.clone());
        Ok(())
    }

    async fn counts(&self) -> Result<ActivityCounts, StoreError> {
        Ok(ActivityCounts {
            voice_records: self.voice.lock().await.len() as u64,
            text_records: self.text.lock().await.len() as u64,
        })
    }
}
