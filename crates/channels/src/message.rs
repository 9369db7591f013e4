//! Canonical rich-message model shared by every channel.
//!
//! A [`RichMessage`] is an ordered run of [`Segment`]s. Channels translate
//! their wire formats into and out of this model; the host only ever sees
//! segments.

use serde::{Deserialize, Serialize};

/// Kind tag of a [`Segment`], as exchanged with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Text,
    Mention,
    InlineImage,
    Unknown,
}

impl SegmentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Mention => "mention",
            Self::InlineImage => "inline_image",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed unit of a canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSegment", into = "RawSegment")]
pub enum Segment {
    /// Literal text, rendered verbatim.
    Text(String),
    /// A `@handle` token or a numeric member id. See [`MentionRef`].
    Mention(String),
    /// URL of image bytes.
    InlineImage(String),
    /// Content this model cannot represent. Carries no payload.
    Unknown,
}

impl Segment {
    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::Text(_) => SegmentKind::Text,
            Self::Mention(_) => SegmentKind::Mention,
            Self::InlineImage(_) => SegmentKind::InlineImage,
            Self::Unknown => SegmentKind::Unknown,
        }
    }

    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Text(s) | Self::Mention(s) | Self::InlineImage(s) => s,
            Self::Unknown => "",
        }
    }
}

/// Wire shape of a segment: `{"kind": "...", "payload": "..."}`.
///
/// Kinds this model does not know deserialize to [`Segment::Unknown`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSegment {
    kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    payload: String,
}

impl From<RawSegment> for Segment {
    fn from(raw: RawSegment) -> Self {
        match raw.kind.as_str() {
            "text" => Self::Text(raw.payload),
            "mention" => Self::Mention(raw.payload),
            "inline_image" => Self::InlineImage(raw.payload),
            _ => Self::Unknown,
        }
    }
}

impl From<Segment> for RawSegment {
    fn from(segment: Segment) -> Self {
        let kind = segment.kind().as_str().to_string();
        let payload = match segment {
            Segment::Text(s) | Segment::Mention(s) | Segment::InlineImage(s) => s,
            Segment::Unknown => String::new(),
        };
        Self { kind, payload }
    }
}

/// Interpretation of a mention payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionRef<'a> {
    /// Self-contained `@handle`, rendered as-is.
    Handle(&'a str),
    /// Numeric member id that must be resolved within a chat.
    Member(&'a str),
}

impl<'a> MentionRef<'a> {
    #[must_use]
    pub fn parse(payload: &'a str) -> Self {
        if payload.starts_with('@') {
            Self::Handle(payload)
        } else {
            Self::Member(payload)
        }
    }
}

/// Ordered, non-overlapping sequence of segments.
///
/// The push methods drop empty payloads and merge adjacent text, so a built
/// message never holds a zero-length text or mention segment. Deserialized
/// messages go through the same path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct RichMessage {
    segments: Vec<Segment>,
}

impl RichMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Text(text) => self.push_text(&text),
            Segment::Mention(m) if m.is_empty() => {},
            Segment::InlineImage(url) if url.is_empty() => {},
            other => self.segments.push(other),
        }
    }

    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

impl FromIterator<Segment> for RichMessage {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut message = Self::new();
        for segment in iter {
            message.push(segment);
        }
        message
    }
}

impl From<Vec<Segment>> for RichMessage {
    fn from(segments: Vec<Segment>) -> Self {
        segments.into_iter().collect()
    }
}

impl From<RichMessage> for Vec<Segment> {
    fn from(message: RichMessage) -> Self {
        message.segments
    }
}

impl<'a> IntoIterator for &'a RichMessage {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Whether an inbound message came from a private chat or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
}

/// Platform metadata carried next to a transcoded message.
///
/// Inbound messages are dispatched concurrently, so consumers that need
/// arrival order must sort on `message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageMeta {
    pub message_id: String,
}

/// A transcoded inbound chat message, ready for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub kind: ChatKind,
    pub chat_id: String,
    pub sender_id: String,
    pub message: RichMessage,
    pub meta: ChatMessageMeta,
}
