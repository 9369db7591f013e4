use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, Me, UpdateKind},
    },
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, info, warn},
};

use crate::{config::TelegramAccountConfig, handlers, state::AccountState};

/// Delay before retrying a failed `getUpdates` call.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Build a bot whose HTTP client outlives the long-poll window.
pub fn build_bot(config: &TelegramAccountConfig) -> crate::Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(config.effective_request_timeout_secs()))
        .build()?;
    Ok(Bot::with_client(config.token.expose_secret(), client))
}

/// Verify credentials and clear any webhook so long polling works.
pub async fn connect(bot: &Bot) -> crate::Result<Me> {
    let me = bot.get_me().await?;
    bot.delete_webhook().await?;
    Ok(me)
}

/// Start the polling loop and the message dispatcher for one account.
///
/// The loop runs until `state.cancel` is cancelled or Telegram reports that
/// another instance is polling with the same token. Every message is handled
/// in its own task, so one slow message never delays the next.
pub fn spawn_polling(state: Arc<AccountState>) -> JoinHandle<()> {
    let (tx, rx) = mpsc::unbounded_channel::<Message>();
    let dispatcher = tokio::spawn(dispatch(Arc::clone(&state), rx));

    tokio::spawn(async move {
        poll(&state, tx).await;
        // Dropping the sender lets the dispatcher drain and exit.
        if let Err(e) = dispatcher.await {
            warn!(account_id = state.account_id, error = %e, "telegram dispatcher panicked");
        }
        info!(account_id = state.account_id, "telegram polling stopped");
    })
}

async fn dispatch(state: Arc<AccountState>, mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(msg) = rx.recv().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            handlers::handle_message(msg, &state).await;
        });
    }
}

async fn poll(state: &AccountState, tx: mpsc::UnboundedSender<Message>) {
    let aid = state.account_id.as_str();
    info!(
        account_id = aid,
        username = ?state.bot_username,
        "starting telegram polling loop"
    );
    let mut offset: i32 = 0;

    loop {
        let request = state
            .bot
            .get_updates()
            .offset(offset)
            .timeout(state.poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message]);

        let result = tokio::select! {
            () = state.cancel.cancelled() => break,
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(account_id = aid, count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            if tx.send(msg).is_err() {
                                warn!(account_id = aid, "telegram dispatcher is gone");
                                return;
                            }
                        },
                        other => {
                            debug!(account_id = aid, "ignoring non-message update: {other:?}");
                        },
                    }
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!(
                    account_id = aid,
                    "telegram polling disabled: another instance is already running with this token"
                );
                state.cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(account_id = aid, error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = state.cancel.cancelled() => break,
                    () = tokio::time::sleep(RETRY_DELAY) => {},
                }
            },
        }
    }
}
