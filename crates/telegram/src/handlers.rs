use {teloxide::types::Message, tracing::debug};

use tgbridge_channels::AccountEvent;

use crate::{state::AccountState, wire::WireMessage};

/// Handle a single inbound Telegram message.
///
/// Runs in its own task per message; events from different messages may
/// reach the sink in any order. Returns the number of events emitted.
pub async fn handle_message(msg: Message, state: &AccountState) -> usize {
    let wire = WireMessage::from(&msg);
    debug!(
        account_id = state.account_id,
        chat_id = wire.chat_id,
        message_id = wire.message_id,
        entity_count = wire.entities.len(),
        has_photo = !wire.photo.is_empty(),
        "handling telegram message"
    );

    let events = state.inbound.transcode(&wire).await;
    let count = events.len();
    for event in events {
        log_event(&state.account_id, &event);
        state.event_sink.emit(event).await;
    }
    count
}

fn log_event(account_id: &str, event: &AccountEvent) {
    match event {
        AccountEvent::ChatMessage(msg) => debug!(
            account_id,
            chat_id = msg.chat_id,
            sender_id = msg.sender_id,
            segment_count = msg.message.len(),
            "emitting chat message"
        ),
        AccountEvent::MemberJoined {
            chat_id, member_id, ..
        } => debug!(account_id, chat_id, member_id, "emitting member joined"),
        AccountEvent::MemberLeft { chat_id, member_id } => {
            debug!(account_id, chat_id, member_id, "emitting member left")
        },
    }
}
