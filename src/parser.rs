//! Response Parser
//!
//! Pure extraction of the `{reasoning, action, reply}` triple from raw
//! model output. For each recognized tag the first well-formed delimited
//! region wins, matched case-insensitively. Two fallbacks are applied and
//! nothing more: a non-empty prefix before the first recognized tag
//! becomes the reasoning, and when all three fields are absent the text
//! after the last recognized closing tag becomes the reply. Output with
//! none of the markers at all stays a parse failure; ambiguity is
//! surfaced, not guessed at.

use lorekeeper_core::ParsedResponse;

/// Recognized delimiter tags, in reasoning/action/reply order.
const TAGS: [&str; 3] = ["think", "act", "reply"];

/// One extracted tag region: trimmed content plus the byte spans of the
/// opening and closing delimiters in the original text.
struct TagRegion {
    content: String,
    open_start: usize,
    close_end: usize,
}

/// Byte-window search, ASCII-case-insensitive, so positions stay valid
/// regardless of any non-ASCII content around the tags.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if from + needle.len() > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|pos| from + pos)
}

/// Find the first well-formed `<tag>...</tag>` region, case-insensitive.
fn extract_tag(text: &str, tag: &str) -> Option<TagRegion> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let open_start = find_ci(text, &open, 0)?;
    let content_start = open_start + open.len();
    let close_start = find_ci(text, &close, content_start)?;

    Some(TagRegion {
        content: text[content_start..close_start].trim().to_string(),
        open_start,
        close_end: close_start + close.len(),
    })
}

/// Parse one raw model output into its structured fields.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let regions: Vec<Option<TagRegion>> =
        TAGS.iter().map(|tag| extract_tag(raw, tag)).collect();

    let mut reasoning = regions[0]
        .as_ref()
        .map(|r| r.content.clone())
        .filter(|c| !c.is_empty());
    let action = regions[1]
        .as_ref()
        .map(|r| r.content.clone())
        .filter(|c| !c.is_empty());
    let reply = regions[2]
        .as_ref()
        .map(|r| r.content.clone())
        .filter(|c| !c.is_empty());

    // Fallback 1: text preceding the first recognized tag becomes the
    // reasoning when no reasoning tag was found.
    if reasoning.is_none() {
        if let Some(first_open) = regions
            .iter()
            .flatten()
            .map(|r| r.open_start)
            .min()
        {
            let prefix = raw[..first_open].trim();
            if !prefix.is_empty() {
                reasoning = Some(prefix.to_string());
            }
        }
    }

    // Fallback 2: with all three fields absent, trailing text after the
    // last recognized closing tag becomes the reply.
    let mut parsed = ParsedResponse {
        reasoning,
        action,
        reply,
    };
    if parsed.is_empty() {
        if let Some(last_close) = regions.iter().flatten().map(|r| r.close_end).max() {
            let suffix = raw[last_close..].trim();
            if !suffix.is_empty() {
                parsed.reply = Some(suffix.to_string());
            }
        }
    }

    parsed
}
