use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::StoreError;
use crate::model::{ChannelRef, TextActivityRecord, UserId, activity_date};
use crate::store::ActivityStore;

#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub user_id: UserId,
    pub display_name: String,
    pub is_bot: bool,
    pub in_guild: bool,
    pub channel: ChannelRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOutcome {
    Ignored,
    Created,
    Incremented,
    Failed,
}

/// Keeps one message tally per user, channel and UTC day.
///
/// The lookup and the write are separate store calls with nothing held in
/// between, so two messages landing at the same instant can lose a count.
pub struct TextRecorder<S> {
    store: Arc<S>,
}

impl<S: ActivityStore> TextRecorder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn handle_message(&self, event: MessageEvent, now: DateTime<Utc>) -> TextOutcome {
        // Skip bot messages and DMs
        if event.is_bot || !event.in_guild {
            return TextOutcome::Ignored;
        }

        info!(user = %event.display_name, channel = %event.channel.name, "message sent");

        match self.count(&event, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(user = %event.display_name, error = %err, "error tracking text activity");
                TextOutcome::Failed
            }
        }
    }

    async fn count(&self, event: &MessageEvent, now: DateTime<Utc>) -> Result<TextOutcome, StoreError> {
        let user_id = event.user_id.to_string();
        let channel_id = event.channel.id.to_string();
        let today = activity_date(now);

        match self.store.find_text(&user_id, &channel_id, &today).await? {
            Some(existing) => {
                self.store.increment_text(&existing.id, now).await?;
                info!(user = %event.display_name, "updated message count");
                Ok(TextOutcome::Incremented)
            }
            None => {
                let record = TextActivityRecord::first_message(event.user_id, &event.channel, now);
                self.store.insert_text(&record).await?;
                info!(user = %event.display_name, "created text activity record");
                Ok(TextOutcome::Created)
            }
        }
    }
}
