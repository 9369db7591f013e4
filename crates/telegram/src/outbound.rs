use std::sync::Arc;

use {
    async_trait::async_trait,
    teloxide::types::ParseMode,
    tracing::{debug, info, warn},
};

use tgbridge_channels::{BlobFetcher, MemberResolver, MentionRef, RichMessage, Segment};

use crate::{
    Result,
    config::TelegramAccountConfig,
    markdown::{escape_markdown_v2, user_link},
};

/// One deliverable unit produced by outbound transcoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Formatted text message.
    Text { text: String, parse_mode: ParseMode },
    /// Image upload.
    Binary { file_name: String, bytes: Vec<u8> },
}

impl Packet {
    #[must_use]
    pub fn markdown(text: String) -> Self {
        Self::Text {
            text,
            parse_mode: ParseMode::MarkdownV2,
        }
    }
}

/// Sends packets to a chat.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send(&self, chat_id: &str, packet: &Packet) -> Result<()>;
}

/// Converts canonical messages into Telegram packets and delivers them.
///
/// Each call owns its own text buffer; nothing is shared between calls.
pub struct OutboundTranscoder {
    members: Arc<dyn MemberResolver>,
    blobs: Arc<dyn BlobFetcher>,
    sink: Arc<dyn DeliverySink>,
    image_file_name: String,
    unsupported_placeholder: String,
}

impl OutboundTranscoder {
    pub fn new(
        members: Arc<dyn MemberResolver>,
        blobs: Arc<dyn BlobFetcher>,
        sink: Arc<dyn DeliverySink>,
    ) -> Self {
        let defaults = TelegramAccountConfig::default();
        Self {
            members,
            blobs,
            sink,
            image_file_name: defaults.image_file_name,
            unsupported_placeholder: defaults.unsupported_placeholder,
        }
    }

    pub fn with_config(mut self, config: &TelegramAccountConfig) -> Self {
        self.image_file_name = config.image_file_name.clone();
        self.unsupported_placeholder = config.unsupported_placeholder.clone();
        self
    }

    /// Build the packet list for `message` as it will appear in `target`.
    ///
    /// Mentions that cannot be resolved and images that cannot be fetched are
    /// left out; neither fails the message.
    pub async fn transcode(&self, message: &RichMessage, target: &str) -> Vec<Packet> {
        let mut packets = Vec::new();
        let mut buffer = String::new();

        for segment in message {
            match segment {
                Segment::Text(text) => buffer.push_str(&escape_markdown_v2(text)),
                Segment::Mention(payload) => match MentionRef::parse(payload) {
                    MentionRef::Handle(handle) => buffer.push_str(handle),
                    MentionRef::Member(member_id) => {
                        match self.members.resolve(target, member_id).await {
                            Ok(name) => buffer.push_str(&user_link(&name, member_id)),
                            Err(e) => debug!(
                                chat_id = target,
                                member_id,
                                error = %e,
                                "mention could not be resolved, omitting"
                            ),
                        }
                    },
                },
                Segment::InlineImage(url) => {
                    if !buffer.is_empty() {
                        packets.push(Packet::markdown(std::mem::take(&mut buffer)));
                    }
                    match self.blobs.fetch(url).await {
                        Ok(bytes) => packets.push(Packet::Binary {
                            file_name: self.image_file_name.clone(),
                            bytes,
                        }),
                        Err(e) => warn!(url, error = %e, "failed to fetch image, omitting"),
                    }
                },
                Segment::Unknown => {
                    buffer.push_str(&escape_markdown_v2(&self.unsupported_placeholder));
                },
            }
        }

        if !buffer.is_empty() {
            packets.push(Packet::markdown(buffer));
        }
        packets
    }

    /// Transcode `message` and send the packets to `target`, in order.
    ///
    /// Stops at the first failed packet and returns its error; packets
    /// already sent stay sent. Returns the number of packets delivered.
    pub async fn deliver(&self, message: &RichMessage, source: &str, target: &str) -> Result<usize> {
        let packets = self.transcode(message, target).await;
        if packets.is_empty() {
            debug!(source, target, "message produced no packets, nothing to send");
            return Ok(0);
        }

        for (index, packet) in packets.iter().enumerate() {
            if let Err(e) = self.sink.send(target, packet).await {
                warn!(
                    source,
                    target,
                    sent = index,
                    total = packets.len(),
                    error = %e,
                    "telegram delivery failed"
                );
                return Err(e);
            }
        }

        info!(
            source,
            target,
            packet_count = packets.len(),
            "telegram outbound message sent"
        );
        Ok(packets.len())
    }
}
