use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use tgbridge_channels::AccountEventSink;

use crate::inbound::InboundTranscoder;

/// Runtime state shared by the polling loop and the per-message tasks of
/// one bot account.
pub struct AccountState {
    pub account_id: String,
    pub bot: teloxide::Bot,
    pub bot_username: Option<String>,
    /// Long-poll window passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,
    pub inbound: Arc<InboundTranscoder>,
    pub event_sink: Arc<dyn AccountEventSink>,
    pub cancel: CancellationToken,
}
