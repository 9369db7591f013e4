//! Wire entities and their mapping onto UTF-8 text.
//!
//! Telegram locates entities in UTF-16 code units while Rust strings index
//! UTF-8 bytes. [`map_entities`] walks the text once per entity run to rebase
//! each entity onto a byte range, and [`compose`] interleaves the resulting
//! spans with the literal text between them.

use {tgbridge_channels::{RichMessage, Segment}, tracing::debug};

/// Kind of a wire entity. Only mentions matter to the transcoder; every other
/// platform kind lands in `Other` and is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEntityKind {
    /// `@handle` written in the text itself.
    Mention,
    /// Mention of a user without a handle; the identity travels with it.
    TextMention { user_id: u64 },
    Other(String),
}

/// Annotation over message text, located by UTF-16 offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEntity {
    pub kind: WireEntityKind,
    pub offset: usize,
    pub length: usize,
}

impl WireEntity {
    #[must_use]
    pub fn new(kind: WireEntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }
}

/// A wire entity rebased to `[start, end)` bytes, with the segment it becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ByteSpanEntity {
    pub start: usize,
    pub end: usize,
    pub segment: Segment,
}

/// Position in the text, tracked in both encodings at once.
struct Cursor<'a> {
    text: &'a str,
    utf16: usize,
    byte: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            utf16: 0,
            byte: 0,
        }
    }

    fn reset(&mut self) {
        self.utf16 = 0;
        self.byte = 0;
    }

    /// Advance one codepoint at a time until `target` UTF-16 units are
    /// consumed. Returns the byte position only when the cursor lands exactly
    /// on `target`; `None` when it overshoots mid-codepoint or the text ends.
    fn seek(&mut self, target: usize) -> Option<usize> {
        while self.utf16 < target {
            let c = self.text[self.byte..].chars().next()?;
            self.byte += c.len_utf8();
            self.utf16 += c.len_utf16();
        }
        (self.utf16 == target).then_some(self.byte)
    }
}

/// Rebase wire entities onto byte spans of `text`, in input order.
///
/// Entities whose bounds fall inside a codepoint or past the end of the text
/// are dropped, as are kinds that have no segment representation. An entity
/// that starts before the cursor rewinds the walk to the beginning, which
/// tolerates lists concatenated from independently ordered sources.
pub(crate) fn map_entities(text: &str, entities: &[WireEntity]) -> Vec<ByteSpanEntity> {
    let mut cursor = Cursor::new(text);
    let mut spans = Vec::with_capacity(entities.len());

    for entity in entities {
        if entity.offset < cursor.utf16 {
            cursor.reset();
        }
        let Some(start) = cursor.seek(entity.offset) else {
            debug!(
                offset = entity.offset,
                "entity start does not fall on a codepoint boundary, dropping"
            );
            continue;
        };
        let Some(end) = cursor.seek(entity.offset.saturating_add(entity.length)) else {
            debug!(
                offset = entity.offset,
                length = entity.length,
                "entity end does not fall on a codepoint boundary, dropping"
            );
            continue;
        };

        let segment = match &entity.kind {
            WireEntityKind::Mention => Segment::Mention(text[start..end].to_string()),
            WireEntityKind::TextMention { user_id } => Segment::Mention(user_id.to_string()),
            WireEntityKind::Other(_) => continue,
        };
        if segment.payload().is_empty() {
            continue;
        }
        spans.push(ByteSpanEntity {
            start,
            end,
            segment,
        });
    }

    spans
}

/// Build a message from `text` and its byte spans.
///
/// Spans are applied by increasing start regardless of input order; a span
/// starting inside text already consumed by an earlier span is skipped.
pub(crate) fn compose(text: &str, mut spans: Vec<ByteSpanEntity>) -> RichMessage {
    spans.sort_by_key(|span| span.start);

    let mut message = RichMessage::new();
    let mut boundary = 0;
    for span in spans {
        if span.start < boundary {
            debug!(
                start = span.start,
                boundary, "entity overlaps an earlier one, skipping"
            );
            continue;
        }
        message.push_text(&text[boundary..span.start]);
        message.push(span.segment);
        boundary = span.end;
    }
    message.push_text(&text[boundary..]);
    message
}
