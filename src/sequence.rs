//! Frame-sequence descriptors: one `<filename> [delay_ms]` pair per line, `#` comments.

use crate::frame::DEFAULT_DELAY_MS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEntry {
    pub filename: String,
    pub delay_ms: u32,
}

/// Parses a descriptor. A missing, zero or unreadable delay becomes [`DEFAULT_DELAY_MS`].
pub fn parse_sequence(text: &str) -> Vec<SequenceEntry> {
    text.lines()
        .map(str::trim_start)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let filename = tokens.next()?.to_owned();
            let delay_ms = tokens
                .next()
                .and_then(|token| token.parse::<u32>().ok())
                .filter(|delay| *delay != 0)
                .unwrap_or(DEFAULT_DELAY_MS);

            Some(SequenceEntry { filename, delay_ms })
        })
        .collect()
}
