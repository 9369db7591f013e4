use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::{debug, warn},
};

use tgbridge_channels::{AccountEvent, ChatMessage, ChatMessageMeta, RichMessage, Segment};

use crate::{
    entities::{ByteSpanEntity, compose, map_entities},
    wire::{MembershipChange, WireMessage},
};

/// Turns a Telegram file id into a URL the host can download.
#[async_trait]
pub trait FileLinkResolver: Send + Sync {
    async fn file_url(&self, file_id: &str) -> tgbridge_channels::Result<String>;
}

/// Converts inbound wire messages into host events.
///
/// Stateless apart from its collaborators; one instance serves every
/// concurrently dispatched update.
pub struct InboundTranscoder {
    files: Arc<dyn FileLinkResolver>,
    self_id: Option<u64>,
}

impl InboundTranscoder {
    pub fn new(files: Arc<dyn FileLinkResolver>) -> Self {
        Self {
            files,
            self_id: None,
        }
    }

    /// Ignore messages authored by this user id (the bot itself).
    pub fn with_self_id(mut self, self_id: u64) -> Self {
        self.self_id = Some(self_id);
        self
    }

    /// Produce the host events for one wire message.
    ///
    /// Membership notifications become `member_joined` / `member_left`
    /// events and are never transcoded. Messages without a sender, from the
    /// bot itself, or that transcode to nothing produce no events.
    pub async fn transcode(&self, wire: &WireMessage) -> Vec<AccountEvent> {
        let chat_id = wire.chat_id.to_string();

        if let Some(change) = &wire.membership {
            return membership_events(&chat_id, change);
        }

        let Some(sender_id) = wire.sender_id else {
            debug!(chat_id, "message has no sender, skipping");
            return Vec::new();
        };
        if self.self_id == Some(sender_id) {
            debug!(chat_id, "ignoring own message");
            return Vec::new();
        }

        let message = self.transcode_message(wire).await;
        if message.is_empty() {
            debug!(chat_id, message_id = wire.message_id, "message is empty after transcoding");
            return Vec::new();
        }

        vec![AccountEvent::ChatMessage(ChatMessage {
            kind: wire.chat_kind,
            chat_id,
            sender_id: sender_id.to_string(),
            message,
            meta: ChatMessageMeta {
                message_id: wire.message_id.to_string(),
            },
        })]
    }

    /// Build the canonical message: an optional leading image followed by the
    /// text with its mentions inlined.
    pub async fn transcode_message(&self, wire: &WireMessage) -> RichMessage {
        let mut spans = Vec::with_capacity(wire.entities.len() + 1);

        if let Some(photo) = wire.best_photo() {
            match self.files.file_url(&photo.file_id).await {
                Ok(url) if !url.is_empty() => spans.push(ByteSpanEntity {
                    start: 0,
                    end: 0,
                    segment: Segment::InlineImage(url),
                }),
                Ok(_) => debug!(file_id = %photo.file_id, "photo has no download link, skipping"),
                Err(e) => warn!(
                    file_id = %photo.file_id,
                    error = %e,
                    "failed to resolve photo link, skipping attachment"
                ),
            }
        }

        spans.extend(map_entities(&wire.text, &wire.entities));
        compose(&wire.text, spans)
    }
}

fn membership_events(chat_id: &str, change: &MembershipChange) -> Vec<AccountEvent> {
    match change {
        MembershipChange::Joined { members, inviter } => members
            .iter()
            .map(|member| AccountEvent::MemberJoined {
                chat_id: chat_id.to_string(),
                member_id: member.to_string(),
                inviter_id: inviter.map(|id| id.to_string()),
            })
            .collect(),
        MembershipChange::Left { member } => vec![AccountEvent::MemberLeft {
            chat_id: chat_id.to_string(),
            member_id: member.to_string(),
        }],
    }
}
