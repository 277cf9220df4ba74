//! Outgoing text utilities: Discord length limits and markdown escaping
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Count the limit in characters instead of bytes (Cyrillic text is two bytes per char)
//! - 1.0.0: Line-aware chunking for schedule listings

/// Discord message content limit, in characters
pub const MESSAGE_LIMIT: usize = 2000;

/// Characters Discord interprets as markdown
const MARKDOWN_SPECIAL: &[char] = &['\\', '*', '_', '~', '`', '|', '>', '[', ']', '(', ')'];

/// Split text into pieces of at most `max_chars` characters.
///
/// Prefers splitting at newlines; a single line longer than the limit is
/// cut at character boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count() + 1;
        if current_len + line_len > max_chars {
            if !current.is_empty() {
                chunks.push(current.trim_end().to_string());
                current.clear();
                current_len = 0;
            }
            if line_len > max_chars {
                chunks.extend(split_long_line(line, max_chars));
                continue;
            }
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len;
    }

    if !current.trim_end().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

fn split_long_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Chunk text for message content
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Escape markdown so user-supplied text renders literally
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
