use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    teloxide::prelude::*,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use tgbridge_channels::{
    Account, AccountEventSink, ChatKind, Error as ChannelError, MemberResolver, RichMessage,
};

use crate::{
    api::{TelegramApi, recipient, user_id},
    bot,
    config::TelegramAccountConfig,
    fetch::HttpBlobFetcher,
    inbound::InboundTranscoder,
    outbound::OutboundTranscoder,
    state::AccountState,
};

/// A single Telegram bot account.
///
/// Queries and outbound delivery work as soon as the account is built;
/// inbound events flow only between [`TelegramAccount::start`] and
/// [`TelegramAccount::stop`].
pub struct TelegramAccount {
    account_id: String,
    config: TelegramAccountConfig,
    api: TelegramApi,
    outbound: OutboundTranscoder,
    running: Mutex<Option<CancellationToken>>,
}

impl TelegramAccount {
    pub fn new(account_id: impl Into<String>, config: TelegramAccountConfig) -> crate::Result<Self> {
        if config.token.expose_secret().is_empty() {
            return Err(ChannelError::invalid_input("telegram bot token is required").into());
        }
        let bot = bot::build_bot(&config)?;
        let blobs = HttpBlobFetcher::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::with_parts(account_id, config, bot, blobs))
    }

    /// Assemble an account around an existing bot client.
    pub fn with_parts(
        account_id: impl Into<String>,
        config: TelegramAccountConfig,
        bot: Bot,
        blobs: HttpBlobFetcher,
    ) -> Self {
        let api = TelegramApi::new(bot);
        let outbound = OutboundTranscoder::new(
            Arc::new(api.clone()),
            Arc::new(blobs),
            Arc::new(api.clone()),
        )
        .with_config(&config);
        Self {
            account_id: account_id.into(),
            config,
            api,
            outbound,
            running: Mutex::new(None),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn config(&self) -> &TelegramAccountConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|running| running.as_ref().is_some_and(|c| !c.is_cancelled()))
            .unwrap_or(false)
    }

    /// Connect to Telegram and start delivering inbound events to `sink`.
    ///
    /// The returned token stops the polling loop when cancelled; it is also
    /// cancelled if another instance takes over the bot token.
    pub async fn start(&self, sink: Arc<dyn AccountEventSink>) -> anyhow::Result<CancellationToken> {
        if self.is_running() {
            anyhow::bail!("telegram account {} is already running", self.account_id);
        }

        info!(account_id = self.account_id, "starting telegram account");
        let me = bot::connect(self.api.bot()).await?;
        info!(
            account_id = self.account_id,
            username = ?me.username,
            "telegram bot connected (webhook cleared)"
        );

        let mut inbound = InboundTranscoder::new(Arc::new(self.api.clone()));
        if self.config.ignore_self_messages {
            inbound = inbound.with_self_id(me.id.0);
        }

        let cancel = CancellationToken::new();
        let state = Arc::new(AccountState {
            account_id: self.account_id.clone(),
            bot: self.api.bot().clone(),
            bot_username: me.username.clone(),
            poll_timeout_secs: self.config.poll_timeout_secs,
            inbound: Arc::new(inbound),
            event_sink: sink,
            cancel: cancel.clone(),
        });
        bot::spawn_polling(state);

        if let Ok(mut running) = self.running.lock() {
            *running = Some(cancel.clone());
        }
        Ok(cancel)
    }

    /// Stop the polling loop. A no-op when the account is not running.
    pub fn stop(&self) {
        let cancel = self.running.lock().ok().and_then(|mut r| r.take());
        match cancel {
            Some(cancel) => {
                info!(account_id = self.account_id, "stopping telegram account");
                cancel.cancel();
            },
            None => warn!(account_id = self.account_id, "telegram account is not running"),
        }
    }
}

#[async_trait]
impl Account for TelegramAccount {
    fn name(&self) -> &str {
        "Telegram Bot"
    }

    async fn group_name(&self, chat_id: &str) -> tgbridge_channels::Result<String> {
        let chat = self
            .api
            .bot()
            .get_chat(recipient(chat_id))
            .await
            .map_err(crate::Error::from)?;
        Ok(chat.title().unwrap_or_default().to_string())
    }

    async fn send_chat_message(
        &self,
        kind: ChatKind,
        source: &str,
        target: &str,
        message: &RichMessage,
    ) -> tgbridge_channels::Result<()> {
        debug!(
            account_id = self.account_id,
            kind = ?kind,
            source,
            target,
            segment_count = message.len(),
            "sending chat message"
        );
        self.outbound.deliver(message, source, source).await?;
        Ok(())
    }

    async fn remove_member(&self, chat_id: &str, member_id: &str) -> tgbridge_channels::Result<()> {
        self.api
            .bot()
            .ban_chat_member(recipient(chat_id), user_id(member_id)?)
            .await
            .map_err(crate::Error::from)?;
        info!(account_id = self.account_id, chat_id, member_id, "removed chat member");
        Ok(())
    }

    async fn member_name(&self, chat_id: &str, member_id: &str) -> tgbridge_channels::Result<String> {
        self.api.resolve(chat_id, member_id).await
    }

    async fn user_avatar(&self, user_id_str: &str) -> tgbridge_channels::Result<String> {
        let photos = self
            .api
            .bot()
            .get_user_profile_photos(user_id(user_id_str)?)
            .await
            .map_err(crate::Error::from)?;
        let Some(largest) = photos.photos.first().and_then(|sizes| sizes.last()) else {
            return Ok(String::new());
        };
        Ok(self.api.file_link(&largest.file.id).await?)
    }

    async fn self_id(&self) -> tgbridge_channels::Result<String> {
        let me = self.api.bot().get_me().await.map_err(crate::Error::from)?;
        Ok(me.id.0.to_string())
    }
}

impl std::fmt::Debug for TelegramAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramAccount")
            .field("account_id", &self.account_id)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}
