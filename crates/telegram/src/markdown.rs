//! Telegram MarkdownV2 helpers.
//!
//! Outbound text is escaped segment by segment, so markup the transcoder
//! writes itself (mention links) is never escaped a second time.

/// Characters MarkdownV2 reserves outside code spans and link targets.
pub const MARKDOWN_V2_RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Deep-link scheme Telegram clients open as a user profile.
const USER_LINK_PREFIX: &str = "tg://user?id=";

/// Escape plain text for a MarkdownV2 message body.
#[must_use]
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for c in text.chars() {
        if MARKDOWN_V2_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape the target of an inline link; inside `(...)` only `)` and `\` are
/// special.
#[must_use]
pub fn escape_link_target(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if c == ')' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Inline link to a user's profile, labelled with their display name.
#[must_use]
pub fn user_link(display_name: &str, user_id: &str) -> String {
    format!(
        "[{}]({})",
        escape_markdown_v2(display_name),
        escape_link_target(&format!("{USER_LINK_PREFIX}{user_id}"))
    )
}
