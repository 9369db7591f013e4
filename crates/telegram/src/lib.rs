//! Telegram account for tgbridge.
//!
//! Converts inbound Bot API messages into canonical [`RichMessage`]s and
//! renders outbound ones as MarkdownV2 text and photo uploads, using teloxide
//! for transport.
//!
//! [`RichMessage`]: tgbridge_channels::RichMessage

pub mod api;
pub mod bot;
pub mod config;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod handlers;
pub mod inbound;
pub mod markdown;
pub mod outbound;
pub mod plugin;
pub mod state;
pub mod wire;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_support;

pub use {
    api::TelegramApi,
    config::TelegramAccountConfig,
    error::{Error, Result},
    fetch::HttpBlobFetcher,
    inbound::{FileLinkResolver, InboundTranscoder},
    outbound::{DeliverySink, OutboundTranscoder, Packet},
    plugin::TelegramAccount,
};
