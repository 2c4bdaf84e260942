//! Shared gateway utilities.

/// Telegram's per-message limit, in characters.
pub const TELEGRAM_MAX_LEN: usize = 4096;

/// Split a message into chunks of at most `max_len` characters,
/// preferring to break at newlines when possible.
///
/// Counts characters, not bytes: show names and labels are mostly Cyrillic.
pub fn chunk_message(text: &str, max_len: usize) -> Vec<String> {
    if max_len == 0 || text.chars().count() <= max_len {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        // Byte offset just past the first `max_len` characters.
        let Some((limit, _)) = remaining.char_indices().nth(max_len) else {
            chunks.push(remaining.to_owned());
            break;
        };

        // Break before the whole newline run, not just its last newline.
        let chunk = match remaining[..limit].rfind('\n') {
            Some(i) => remaining[..i].trim_end_matches('\n'),
            None => "",
        };
        let chunk = if chunk.is_empty() { &remaining[..limit] } else { chunk };

        chunks.push(chunk.to_owned());
        remaining = remaining[chunk.len()..].trim_start_matches('\n');
    }

    chunks
}
