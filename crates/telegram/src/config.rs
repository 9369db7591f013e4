use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Configuration for a single Telegram bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramAccountConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Long-poll timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,

    /// HTTP client timeout (seconds). Must exceed `poll_timeout_secs` or the
    /// client aborts long polls before Telegram answers.
    pub request_timeout_secs: u64,

    /// File name attached to outbound image uploads.
    pub image_file_name: String,

    /// Text sent in place of segments Telegram cannot represent.
    pub unsupported_placeholder: String,

    /// Drop updates authored by the bot itself.
    pub ignore_self_messages: bool,
}

impl TelegramAccountConfig {
    /// Effective HTTP timeout, never shorter than the long-poll window.
    #[must_use]
    pub fn effective_request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .max(u64::from(self.poll_timeout_secs) + 15)
    }
}

impl std::fmt::Debug for TelegramAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAccountConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("image_file_name", &self.image_file_name)
            .field("unsupported_placeholder", &self.unsupported_placeholder)
            .field("ignore_self_messages", &self.ignore_self_messages)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for TelegramAccountConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 60,
            request_timeout_secs: 75,
            image_file_name: "image.png".into(),
            unsupported_placeholder: "[unsupported message type]".into(),
            ignore_self_messages: true,
        }
    }
}
