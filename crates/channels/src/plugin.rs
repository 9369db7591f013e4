use {async_trait::async_trait, std::time::Duration};

use crate::{
    Error, Result,
    message::{ChatKind, ChatMessage, RichMessage},
};

// ── Host events ─────────────────────────────────────────────────────────────

/// Events a channel account reports to the host framework.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccountEvent {
    /// A transcoded chat message.
    ChatMessage(ChatMessage),
    /// Someone joined a chat. Membership changes never carry segments.
    MemberJoined {
        chat_id: String,
        member_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        inviter_id: Option<String>,
    },
    /// Someone left (or was removed from) a chat.
    MemberLeft { chat_id: String, member_id: String },
}

/// Sink for account events; the host provides the concrete implementation.
///
/// Called from many concurrently spawned tasks, in no particular order.
#[async_trait]
pub trait AccountEventSink: Send + Sync {
    async fn emit(&self, event: AccountEvent);
}

// ── Query collaborators ─────────────────────────────────────────────────────

/// Looks up chat members by numeric id.
#[async_trait]
pub trait MemberResolver: Send + Sync {
    /// Display name of `member_id` within `chat_id`.
    ///
    /// Must return an error (never panic) when the member is unknown or the
    /// platform is unreachable.
    async fn resolve(&self, chat_id: &str, member_id: &str) -> Result<String>;
}

/// Retrieves raw bytes for a remote resource.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

// ── Account surface ─────────────────────────────────────────────────────────

/// Account-level capabilities exposed to the host.
///
/// Capabilities a platform cannot offer keep the default implementation,
/// which fails with [`Error::Unsupported`].
#[async_trait]
pub trait Account: Send + Sync {
    /// Human-readable platform name (e.g. "Telegram Bot").
    fn name(&self) -> &str;

    async fn group_name(&self, chat_id: &str) -> Result<String>;

    async fn user_name(&self, _user_id: &str) -> Result<String> {
        Err(Error::unsupported("user_name"))
    }

    async fn login(&self) -> Result<()> {
        Err(Error::unsupported("login"))
    }

    async fn logout(&self) -> Result<()> {
        Err(Error::unsupported("logout"))
    }

    /// Transcode and deliver `message` into the conversation `source`.
    /// `target` names the addressed user.
    async fn send_chat_message(
        &self,
        kind: ChatKind,
        source: &str,
        target: &str,
        message: &RichMessage,
    ) -> Result<()>;

    async fn remove_member(&self, chat_id: &str, member_id: &str) -> Result<()>;

    async fn mute_member(
        &self,
        _chat_id: &str,
        _member_id: &str,
        _duration: Duration,
    ) -> Result<()> {
        Err(Error::unsupported("mute_member"))
    }

    async fn mute_all(&self, _chat_id: &str, _enabled: bool) -> Result<()> {
        Err(Error::unsupported("mute_all"))
    }

    async fn member_name(&self, chat_id: &str, member_id: &str) -> Result<String>;

    /// URL of the user's avatar, or an empty string when there is none.
    async fn user_avatar(&self, user_id: &str) -> Result<String>;

    async fn self_id(&self) -> Result<String>;
}
