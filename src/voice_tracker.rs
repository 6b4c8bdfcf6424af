use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::model::{ChannelRef, UserId, VoiceActivityRecord, VoiceSession};
use crate::store::ActivityStore;

/// A voice state change as seen by the tracker, stripped of platform types.
#[derive(Debug, Clone)]
pub struct VoiceUpdate {
    pub user_id: UserId,
    pub display_name: String,
    pub is_bot: bool,
    pub before: Option<ChannelRef>,
    pub after: Option<ChannelRef>,
}

enum Transition {
    Join(ChannelRef),
    Leave(ChannelRef),
    Move { from: ChannelRef, to: ChannelRef },
}

impl Transition {
    // Updates that keep the same channel (mute, deafen, stream) are not transitions
    fn between(before: Option<ChannelRef>, after: Option<ChannelRef>) -> Option<Self> {
        match (before, after) {
            (None, Some(to)) => Some(Self::Join(to)),
            (Some(from), None) => Some(Self::Leave(from)),
            (Some(from), Some(to)) if from.id != to.id => Some(Self::Move { from, to }),
            _ => None,
        }
    }
}

/// What a single update did to the tracker.
#[derive(Debug, Default, PartialEq)]
pub struct VoiceOutcome {
    /// Session that was closed, whether or not the write went through.
    pub closed: Option<VoiceActivityRecord>,
    pub persisted: bool,
    pub opened: Option<ChannelRef>,
}

/// Tracks open voice sessions per user and persists each one once it ends.
pub struct SessionTracker<S> {
    sessions: Mutex<HashMap<UserId, VoiceSession>>,
    store: Arc<S>,
}

impl<S: ActivityStore> SessionTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub async fn handle_voice(&self, update: VoiceUpdate, now: DateTime<Utc>) -> VoiceOutcome {
        if update.is_bot {
            return VoiceOutcome::default();
        }

        let Some(transition) = Transition::between(update.before, update.after) else {
            return VoiceOutcome::default();
        };

        let user_id = update.user_id;
        let name = update.display_name;

        // The map is only touched here, never across the store call below
        let (closed, opened) = {
            let mut sessions = self.sessions.lock().await;

            match transition {
                Transition::Join(to) => {
                    info!(user = %name, channel = %to.name, "joined voice channel");
                    let stale = sessions.insert(user_id, VoiceSession::open(user_id, &to, now));
                    if let Some(stale) = stale {
                        warn!(
                            user = %name,
                            channel = %stale.channel_name,
                            since = %stale.joined_at,
                            "replaced voice session that never saw a leave"
                        );
                    }
                    (None, Some(to))
                }
                Transition::Leave(from) => {
                    info!(user = %name, channel = %from.name, "left voice channel");
                    (sessions.remove(&user_id), None)
                }
                Transition::Move { from, to } => {
                    info!(user = %name, from = %from.name, to = %to.name, "moved voice channel");
                    let previous = sessions.insert(user_id, VoiceSession::open(user_id, &to, now));
                    (previous, Some(to))
                }
            }
        };

        let Some(session) = closed else {
            if opened.is_none() {
                debug!(user = %name, "no open voice session to close");
            }
            return VoiceOutcome {
                opened,
                ..Default::default()
            };
        };

        let record = VoiceActivityRecord::close(session, now);
        let persisted = match self.store.insert_voice(&record).await {
            Ok(()) => {
                let minutes = record.duration_seconds as f64 / 60.0;
                info!(user = %name, channel = %record.channel_name, minutes, "saved voice session");
                true
            }
            Err(err) => {
                error!(user = %name, error = %err, "error tracking voice activity");
                false
            }
        };

        VoiceOutcome {
            closed: Some(record),
            persisted,
            opened,
        }
    }

    #[cfg(test)]
    pub async fn open_sessions(&self) -> HashMap<UserId, VoiceSession> {
        self.sessions.lock().await.clone()
    }
}

/// Sending half of the voice worker. Updates carry the time they were dispatched.
pub type VoiceSender = mpsc::UnboundedSender<(VoiceUpdate, DateTime<Utc>)>;

/// Runs the tracker on its own task so updates apply one at a time in the
/// order they were sent. The task hands the tracker back once every sender
/// is dropped.
pub fn spawn_worker<S>(tracker: SessionTracker<S>) -> (VoiceSender, JoinHandle<SessionTracker<S>>)
where
    S: ActivityStore + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<(VoiceUpdate, DateTime<Utc>)>();

    let handle = tokio::spawn(async move {
        while let Some((update, at)) = rx.recv().await {
            let outcome = tracker.handle_voice(update, at).await;
            debug!(
                closed = outcome.closed.is_some(),
                persisted = outcome.persisted,
                opened = outcome.opened.is_some(),
                "voice update handled"
            );
        }
        tracker
    });

    (tx, handle)
}
