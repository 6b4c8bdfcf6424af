use std::sync::Arc;

use chrono::Utc;
use serenity::all::{Context, EventHandler, GuildId, Message, Ready, VoiceState};
use serenity::async_trait;
use tracing::{debug, error, info, warn};

use crate::model::{ChannelId, ChannelRef, UserId};
use crate::store::ActivityStore;
use crate::text_tracker::{MessageEvent, TextRecorder};
use crate::voice_tracker::{SessionTracker, VoiceSender, VoiceUpdate, spawn_worker};

const UNKNOWN_CHANNEL: &str = "unknown";

/// Feeds gateway events into the voice and text trackers.
///
/// serenity runs every event on its own task, so voice updates are queued to
/// a single worker instead of touching the session map from the handler.
pub struct ActivityHandler<S> {
    store: Arc<S>,
    voice: VoiceSender,
    text: TextRecorder<S>,
}

impl<S: ActivityStore + 'static> ActivityHandler<S> {
    /// Must be called inside the tokio runtime; it spawns the voice worker.
    pub fn new(store: Arc<S>) -> Self {
        let (voice, _worker) = spawn_worker(SessionTracker::new(store.clone()));

        Self {
            voice,
            text: TextRecorder::new(store.clone()),
            store,
        }
    }
}

/// Who sent a voice update, as far as the gateway payload and cache can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Identity {
    is_bot: bool,
    display_name: String,
}

// A leave still has to close the session when the payload lacks the member
fn resolve_identity(
    member: Option<Identity>,
    cached: impl FnOnce() -> Option<Identity>,
    user_id: UserId,
) -> Identity {
    member.or_else(cached).unwrap_or_else(|| {
        debug!(user_id = %user_id, "voice update without member or cached user");
        Identity {
            is_bot: false,
            display_name: user_id.to_string(),
        }
    })
}

#[async_trait]
impl<S: ActivityStore + 'static> EventHandler for ActivityHandler<S> {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "activity bot logged in");

        match self.store.counts().await {
            Ok(counts) => info!(
                voice_records = counts.voice_records,
                text_records = counts.text_records,
                "activity records on file"
            ),
            Err(err) => warn!(error = %err, "could not count activity records"),
        }
    }

    async fn cache_ready(&self, ctx: Context, guilds: Vec<GuildId>) {
        for guild_id in guilds {
            if let Some(guild) = ctx.cache.guild(guild_id) {
                info!(
                    guild = %guild.name,
                    id = %guild_id,
                    members = guild.member_count,
                    "monitoring guild"
                );
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let at = Utc::now();
        let user_id = UserId(new.user_id.get());

        let member = new.member.as_ref().map(|member| Identity {
            is_bot: member.user.bot,
            display_name: member.display_name().to_string(),
        });
        let identity = resolve_identity(
            member,
            || {
                ctx.cache.user(new.user_id).map(|user| Identity {
                    is_bot: user.bot,
                    display_name: user.display_name().to_string(),
                })
            },
            user_id,
        );

        let before = old
            .as_ref()
            .and_then(|state| channel_ref(&ctx, state.guild_id, state.channel_id));
        let after = channel_ref(&ctx, new.guild_id, new.channel_id);

        let update = VoiceUpdate {
            user_id,
            display_name: identity.display_name,
            is_bot: identity.is_bot,
            before,
            after,
        };

        if self.voice.send((update, at)).is_err() {
            error!(user_id = %user_id, "voice worker stopped, dropping update");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let event = MessageEvent {
            user_id: UserId(msg.author.id.get()),
            display_name: msg.author.display_name().to_string(),
            is_bot: msg.author.bot,
            in_guild: msg.guild_id.is_some(),
            channel: ChannelRef {
                id: ChannelId(msg.channel_id.get()),
                name: channel_name(&ctx, msg.guild_id, msg.channel_id),
            },
        };

        self.text.handle_message(event, Utc::now()).await;
    }
}

fn channel_ref(
    ctx: &Context,
    guild_id: Option<GuildId>,
    channel_id: Option<serenity::model::id::ChannelId>,
) -> Option<ChannelRef> {
    let channel_id = channel_id?;

    Some(ChannelRef {
        id: ChannelId(channel_id.get()),
        name: channel_name(ctx, guild_id, channel_id),
    })
}

// Channel names come from the cache; nothing is fetched over http
fn channel_name(
    ctx: &Context,
    guild_id: Option<GuildId>,
    channel_id: serenity::model::id::ChannelId,
) -> String {
    if let Some(guild) = guild_id.and_then(|id| ctx.cache.guild(id)) {
        if let Some(channel) = guild.channels.get(&channel_id) {
            return channel.name.clone();
        }
        if let Some(thread) = guild.threads.iter().find(|thread| thread.id == channel_id) {
            return thread.name.clone();
        }
    }
    UNKNOWN_CHANNEL.to_string()
}
