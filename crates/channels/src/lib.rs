//! Channel abstraction for tgbridge.
//!
//! Defines the canonical rich-message model the host framework speaks, the
//! query collaborators transcoders depend on, and the account surface each
//! platform implements.

pub mod error;
pub mod message;
pub mod plugin;

pub use {
    error::{Error, Result},
    message::{ChatKind, ChatMessage, ChatMessageMeta, MentionRef, RichMessage, Segment, SegmentKind},
    plugin::{Account, AccountEvent, AccountEventSink, BlobFetcher, MemberResolver},
};
