//! Transport-neutral view of an inbound Telegram message.
//!
//! Only the fields the inbound transcoder reads are kept, so the transcoder
//! can be exercised without constructing full teloxide messages.

use teloxide::types::{Message, MessageEntity, MessageEntityKind};

use {
    crate::entities::{WireEntity, WireEntityKind},
    tgbridge_channels::ChatKind,
};

/// One resolution of a photo attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

/// Service notification about chat membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipChange {
    Joined {
        members: Vec<u64>,
        inviter: Option<u64>,
    },
    Left {
        member: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub message_id: i32,
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub sender_id: Option<u64>,
    /// Message text, or the media caption when there is no text.
    pub text: String,
    /// Entities belonging to `text` (caption entities for captions).
    pub entities: Vec<WireEntity>,
    /// Photo resolutions as sent by Telegram.
    pub photo: Vec<PhotoVariant>,
    pub membership: Option<MembershipChange>,
}

impl WireMessage {
    /// Highest-resolution photo variant, if the message carries a photo.
    /// Ties keep the later variant.
    #[must_use]
    pub fn best_photo(&self) -> Option<&PhotoVariant> {
        self.photo
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
    }
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        let sender_id = msg.from.as_ref().map(|u| u.id.0);

        let (text, entities) = match msg.text().filter(|t| !t.is_empty()) {
            Some(text) => (text, msg.entities()),
            None => (msg.caption().unwrap_or_default(), msg.caption_entities()),
        };
        let entities = entities
            .unwrap_or_default()
            .iter()
            .map(wire_entity)
            .collect();

        let photo = msg
            .photo()
            .unwrap_or_default()
            .iter()
            .map(|ps| PhotoVariant {
                file_id: ps.file.id.clone(),
                width: ps.width,
                height: ps.height,
            })
            .collect();

        let membership = if let Some(members) = msg.new_chat_members() {
            let members: Vec<u64> = members.iter().map(|u| u.id.0).collect();
            let inviter = sender_id.filter(|id| !members.contains(id));
            Some(MembershipChange::Joined { members, inviter })
        } else {
            msg.left_chat_member()
                .map(|u| MembershipChange::Left { member: u.id.0 })
        };

        Self {
            message_id: msg.id.0,
            chat_id: msg.chat.id.0,
            chat_kind: if msg.chat.is_private() {
                ChatKind::Private
            } else {
                ChatKind::Group
            },
            sender_id,
            text: text.to_string(),
            entities,
            photo,
            membership,
        }
    }
}

fn wire_entity(entity: &MessageEntity) -> WireEntity {
    let kind = match &entity.kind {
        MessageEntityKind::Mention => WireEntityKind::Mention,
        MessageEntityKind::TextMention { user } => WireEntityKind::TextMention { user_id: user.id.0 },
        other => WireEntityKind::Other(entity_kind_name(other).to_string()),
    };
    WireEntity::new(kind, entity.offset, entity.length)
}

fn entity_kind_name(kind: &MessageEntityKind) -> &'static str {
    match kind {
        MessageEntityKind::Mention => "mention",
        MessageEntityKind::TextMention { .. } => "text_mention",
        MessageEntityKind::Hashtag => "hashtag",
        MessageEntityKind::Cashtag => "cashtag",
        MessageEntityKind::BotCommand => "bot_command",
        MessageEntityKind::Url => "url",
        MessageEntityKind::Email => "email",
        MessageEntityKind::PhoneNumber => "phone_number",
        MessageEntityKind::Bold => "bold",
        MessageEntityKind::Italic => "italic",
        MessageEntityKind::Underline => "underline",
        MessageEntityKind::Strikethrough => "strikethrough",
        MessageEntityKind::Spoiler => "spoiler",
        MessageEntityKind::Code => "code",
        MessageEntityKind::Pre { .. } => "pre",
        MessageEntityKind::TextLink { .. } => "text_link",
        _ => "other",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn message(value: serde_json::Value) -> Message {
        serde_json::from_value(value).expect("deserialize telegram message")
    }

    #[test]
    fn text_message_with_mentions() {
        let msg = message(json!({
            "message_id": 7,
            "date": 1,
            "chat": { "id": -100, "type": "supergroup", "title": "Team" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "text": "hi @bob and Carol",
            "entities": [
                { "type": "mention", "offset": 3, "length": 4 },
                { "type": "text_mention", "offset": 12, "length": 5,
                  "user": { "id": 2002, "is_bot": false, "first_name": "Carol" } },
                { "type": "bold", "offset": 0, "length": 2 }
            ]
        }));

        let wire = WireMessage::from(&msg);
        assert_eq!(wire.message_id, 7);
        assert_eq!(wire.chat_id, -100);
        assert_eq!(wire.chat_kind, ChatKind::Group);
        assert_eq!(wire.sender_id, Some(1001));
        assert_eq!(wire.text, "hi @bob and Carol");
        assert_eq!(wire.entities, vec![
            WireEntity::new(WireEntityKind::Mention, 3, 4),
            WireEntity::new(WireEntityKind::TextMention { user_id: 2002 }, 12, 5),
            WireEntity::new(WireEntityKind::Other("bold".into()), 0, 2),
        ]);
        assert!(wire.membership.is_none());
    }

    #[test]
    fn photo_caption_uses_caption_entities() {
        let msg = message(json!({
            "message_id": 8,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 10 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 1280, "file_size": 900 }
            ],
            "caption": "look @bob",
            "caption_entities": [ { "type": "mention", "offset": 5, "length": 4 } ]
        }));

        let wire = WireMessage::from(&msg);
        assert_eq!(wire.chat_kind, ChatKind::Private);
        assert_eq!(wire.text, "look @bob");
        assert_eq!(wire.entities, vec![WireEntity::new(WireEntityKind::Mention, 5, 4)]);
        assert_eq!(wire.best_photo().map(|p| p.file_id.as_str()), Some("large"));
    }

    #[test]
    fn new_members_become_membership_change() {
        let msg = message(json!({
            "message_id": 9,
            "date": 1,
            "chat": { "id": -100, "type": "supergroup", "title": "Team" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
            "new_chat_members": [
                { "id": 3003, "is_bot": false, "first_name": "Dan" },
                { "id": 4004, "is_bot": false, "first_name": "Eve" }
            ]
        }));

        let wire = WireMessage::from(&msg);
        assert_eq!(
            wire.membership,
            Some(MembershipChange::Joined {
                members: vec![3003, 4004],
                inviter: Some(1001),
            })
        );
    }

    #[test]
    fn left_member_becomes_membership_change() {
        let msg = message(json!({
            "message_id": 10,
            "date": 1,
            "chat": { "id": -100, "type": "supergroup", "title": "Team" },
            "from": { "id": 3003, "is_bot": false, "first_name": "Dan" },
            "left_chat_member": { "id": 3003, "is_bot": false, "first_name": "Dan" }
        }));

        let wire = WireMessage::from(&msg);
        assert_eq!(wire.membership, Some(MembershipChange::Left { member: 3003 }));
    }

    #[test]
    fn best_photo_is_largest_by_area_regardless_of_order() {
        let msg = message(json!({
            "message_id": 11,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "photo": [
                { "file_id": "medium", "file_unique_id": "m", "width": 320, "height": 320, "file_size": 40 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 720, "file_size": 900 },
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 10 }
            ]
        }));

        let wire = WireMessage::from(&msg);
        assert_eq!(wire.best_photo().map(|p| p.file_id.as_str()), Some("large"));

        let empty = WireMessage::from(&message(json!({
            "message_id": 12,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "text": "no photo"
        })));
        assert!(empty.best_photo().is_none());
    }
}
