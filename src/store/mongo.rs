use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::{Client, Collection};

use super::ActivityStore;
use crate::error::StoreError;
use crate::model::{
    ActivityCounts, TEXT_COLLECTION, TextActivityRecord, VOICE_COLLECTION, VoiceActivityRecord,
};

pub struct MongoStore {
    voice: Collection<VoiceActivityRecord>,
    text: Collection<TextActivityRecord>,
}

impl MongoStore {
    // The driver connects lazily, so this only fails on a malformed url
    pub async fn connect(url: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url).await?;
        let db = client.database(db_name);

        Ok(Self {
            voice: db.collection(VOICE_COLLECTION),
            text: db.collection(TEXT_COLLECTION),
        })
    }
}

#[async_trait]
impl ActivityStore for MongoStore {
    async fn insert_voice(&self, record: &VoiceActivityRecord) -> Result<(), StoreError> {
        self.voice.insert_one(record).await?;
        Ok(())
    }

    async fn find_text(
        &self,
        user_id: &str,
        channel_id: &str,
        date: &str,
    ) -> Result<Option<TextActivityRecord>, StoreError> {
        let filter = doc! {
            "user_id": user_id,
            "channel_id": channel_id,
            "date": date,
        };

        Ok(self.text.find_one(filter).await?)
    }

    async fn increment_text(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let update = doc! {
            "$inc": { "message_count": 1_i64 },
            "$set": { "last_message_at": bson::DateTime::from_chrono(at) },
        };

        self.text.update_one(doc! { "id": id }, update).await?;
        Ok(())
    }

    async fn insert_text(&self, record: &TextActivityRecord) -> Result<(), StoreError> {
        self.text.insert_one(record).await?;
        Ok(())
    }

    async fn counts(&self) -> Result<ActivityCounts, StoreError> {
        Ok(ActivityCounts {
            voice_records: self.voice.count_documents(doc! {}).await?,
            text_records: self.text.count_documents(doc! {}).await?,
        })
    }
}
