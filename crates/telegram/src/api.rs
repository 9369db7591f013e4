//! Bot API adapters for the transcoder collaborators.

use {
    async_trait::async_trait,
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{InputFile, Recipient, User},
    },
    tracing::debug,
};

use tgbridge_channels::MemberResolver;

use crate::{
    Error, Result,
    inbound::FileLinkResolver,
    outbound::{DeliverySink, Packet},
};

/// Shared teloxide client used as member resolver, file-link resolver and
/// delivery sink.
#[derive(Clone)]
pub struct TelegramApi {
    bot: Bot,
}

impl TelegramApi {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Download URL for a file already known to the Bot API.
    pub async fn file_link(&self, file_id: &str) -> Result<String> {
        let file = self.bot.get_file(file_id).await?;
        Ok(format!(
            "{}file/bot{}/{}",
            self.bot.api_url(),
            self.bot.token(),
            file.path
        ))
    }
}

/// Numeric chat ids address chats directly; anything else is treated as a
/// public `@username`.
pub(crate) fn recipient(chat_id: &str) -> Recipient {
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.to_string()),
    }
}

pub(crate) fn user_id(member_id: &str) -> Result<UserId> {
    let id = member_id
        .parse::<u64>()
        .map_err(tgbridge_channels::Error::from)?;
    Ok(UserId(id))
}

/// "First Last", falling back to the username when both are blank.
pub(crate) fn display_name(user: &User) -> String {
    let last = user.last_name.as_deref().unwrap_or("");
    let name = format!("{} {last}", user.first_name).trim().to_string();
    if name.is_empty() {
        user.username.clone().unwrap_or_default()
    } else {
        name
    }
}

#[async_trait]
impl MemberResolver for TelegramApi {
    async fn resolve(&self, chat_id: &str, member_id: &str) -> tgbridge_channels::Result<String> {
        let member = self
            .bot
            .get_chat_member(recipient(chat_id), user_id(member_id)?)
            .await
            .map_err(Error::from)?;
        Ok(display_name(&member.user))
    }
}

#[async_trait]
impl FileLinkResolver for TelegramApi {
    async fn file_url(&self, file_id: &str) -> tgbridge_channels::Result<String> {
        Ok(self.file_link(file_id).await?)
    }
}

#[async_trait]
impl DeliverySink for TelegramApi {
    async fn send(&self, chat_id: &str, packet: &Packet) -> Result<()> {
        let to = recipient(chat_id);
        match packet {
            Packet::Text { text, parse_mode } => {
                debug!(chat_id, text_len = text.len(), "sending text packet");
                self.bot
                    .send_message(to, text.clone())
                    .parse_mode(*parse_mode)
                    .await?;
            },
            Packet::Binary { file_name, bytes } => {
                debug!(chat_id, size = bytes.len(), "sending photo packet");
                let photo = InputFile::memory(bytes.clone()).file_name(file_name.clone());
                self.bot.send_photo(to, photo).await?;
            },
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::MockTelegramApi,
        serde_json::json,
        teloxide::types::ParseMode,
    };

    #[test]
    fn numeric_ids_and_usernames_become_recipients() {
        assert_eq!(recipient("-100123"), Recipient::Id(ChatId(-100_123)));
        assert_eq!(
            recipient("@channel"),
            Recipient::ChannelUsername("@channel".into())
        );
    }

    #[test]
    fn member_ids_must_be_numeric() {
        assert_eq!(user_id("42").unwrap(), UserId(42));
        assert!(user_id("bob").is_err());
    }

    #[test]
    fn display_name_joins_first_and_last() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "is_bot": false, "first_name": "Ann", "last_name": "Lee"
        }))
        .unwrap();
        assert_eq!(display_name(&user), "Ann Lee");

        let user: User = serde_json::from_value(json!({
            "id": 2, "is_bot": false, "first_name": "Bo"
        }))
        .unwrap();
        assert_eq!(display_name(&user), "Bo");
    }

    #[tokio::test]
    async fn resolves_member_display_name() {
        let mock = MockTelegramApi::start()
            .await
            .respond(
                "GetChatMember",
                json!({
                    "status": "member",
                    "user": { "id": 1001, "is_bot": false, "first_name": "Ann", "last_name": "Lee" }
                }),
            );
        let api = TelegramApi::new(mock.bot());

        let name = api.resolve("-100", "1001").await.unwrap();
        assert_eq!(name, "Ann Lee");

        let calls = mock.calls("GetChatMember");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["chat_id"], json!(-100));
        assert_eq!(calls[0]["user_id"], json!(1001));
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_member_fails_instead_of_panicking() {
        let mock = MockTelegramApi::start().await;
        let api = TelegramApi::new(mock.bot());

        assert!(api.resolve("-100", "1001").await.is_err());
        assert!(api.resolve("-100", "not-a-number").await.is_err());
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn file_link_points_at_file_endpoint() {
        let mock = MockTelegramApi::start().await.respond(
            "GetFile",
            json!({
                "file_id": "big",
                "file_unique_id": "u-big",
                "file_size": 900,
                "file_path": "photos/file_1.jpg"
            }),
        );
        let api = TelegramApi::new(mock.bot());

        let url = api.file_url("big").await.unwrap();
        assert_eq!(
            url,
            format!("{}file/bottest-token/photos/file_1.jpg", mock.base_url())
        );
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn text_packets_are_sent_as_markdown_v2() {
        let mock = MockTelegramApi::start().await;
        let api = TelegramApi::new(mock.bot());

        api.send("-100", &Packet::Text {
            text: "hi \\*there\\*".into(),
            parse_mode: ParseMode::MarkdownV2,
        })
        .await
        .unwrap();

        let calls = mock.calls("SendMessage");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["chat_id"], json!(-100));
        assert_eq!(calls[0]["text"], json!("hi \\*there\\*"));
        assert_eq!(calls[0]["parse_mode"], json!("MarkdownV2"));
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn binary_packets_are_uploaded_as_photos() {
        let mock = MockTelegramApi::start().await;
        let api = TelegramApi::new(mock.bot());

        api.send("-100", &Packet::Binary {
            file_name: "image.png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
        .await
        .unwrap();

        assert_eq!(mock.call_count("SendPhoto"), 1);
        mock.shutdown().await;
    }

    #[tokio::test]
    async fn api_errors_surface_as_delivery_failures() {
        let mock = MockTelegramApi::start().await.fail("SendMessage", "Bad Request: chat not found");
        let api = TelegramApi::new(mock.bot());

        let err = api
            .send("-100", &Packet::markdown("hello".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Telegram(_)));
        mock.shutdown().await;
    }
}
