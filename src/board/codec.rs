//! Reading and writing the fenced `lifeboat` block inside a card note.
//!
//! The block is the only persisted state:
//!
//! ````text
//! free text the user wrote
//! ```lifeboat
//! {"color":"rgb(255,173,173)","emphasize":true}
//! ```
//! ````

use std::sync::LazyLock;

use regex::Regex;

use super::CardConfig;

/// Language tag of the fenced block.
pub const FENCE_TAG: &str = "lifeboat";

/// Any block opened with "```lifeboat" (any case), body matched lazily up to
/// the next fence.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)```{FENCE_TAG}(.*?)```")).expect("fence pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid lifeboat block: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw body of the first block in `note`, if any.
pub fn extract_block(note: &str) -> Option<&str> {
    BLOCK_RE
        .captures(note)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse a block body. The body must be a JSON object.
pub fn parse_block(body: &str) -> Result<CardConfig, CodecError> {
    Ok(serde_json::from_str(body.trim())?)
}

/// Decode the config stored in `note`.
///
/// `Ok(None)` means the note carries no block at all, which is not the same
/// as a block holding `{}`.
pub fn decode(note: &str) -> Result<Option<CardConfig>, CodecError> {
    extract_block(note).map(parse_block).transpose()
}

/// Replace every block in `note` with one holding `config`.
///
/// An empty config leaves no block behind. Text outside blocks is kept as is,
/// including an opening "```lifeboat" that is never closed. Such an opener
/// swallows the appended block on the next decode, so that note does not
/// round-trip.
pub fn encode(note: &str, config: &CardConfig) -> Result<String, CodecError> {
    let mut text = BLOCK_RE.replace_all(note, "").into_owned();
    let config = config.normalized();
    if config.is_empty() {
        return Ok(text);
    }

    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str("```");
    text.push_str(FENCE_TAG);
    text.push('\n');
    text.push_str(&serde_json::to_string(&config)?);
    text.push_str("\n```");
    Ok(text)
}

/// Remove all metadata from `note`.
pub fn strip(note: &str) -> String {
    BLOCK_RE.replace_all(note, "").into_owned()
}
