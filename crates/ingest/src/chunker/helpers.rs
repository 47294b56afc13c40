//! Text splitting and merging utilities shared by the structural and
//! sub-token passes.

use std::collections::VecDeque;

use super::oracle::LengthOracle;

/// A text fragment paired with its length under the active oracle.
pub(crate) type Measured<'a> = (&'a str, usize);

/// Split `text` on `separator`, keeping each separator attached to the start
/// of the fragment that follows it. An empty separator splits into chars.
/// Empty fragments are dropped.
pub(crate) fn split_keep_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Greedily merge measured fragments into outputs whose summed length stays
/// within `max_len`. When an output is emitted, fragments are dropped from
/// its front until at most `overlap` length remains and the next fragment
/// fits; the remainder seeds the next output.
///
/// Outputs are joined with `joiner`, whitespace-trimmed, and never empty.
pub(crate) fn merge_with_overlap(
    fragments: &[Measured<'_>],
    joiner: &str,
    joiner_len: usize,
    max_len: usize,
    overlap: usize,
) -> Vec<String> {
    let mut merged = Vec::new();
    let mut window: VecDeque<Measured<'_>> = VecDeque::new();
    let mut total = 0usize;

    for &(frag, len) in fragments {
        let sep = if window.is_empty() { 0 } else { joiner_len };
        if total + len + sep > max_len && !window.is_empty() {
            push_joined(&mut merged, &window, joiner);

            loop {
                let sep = if window.is_empty() { 0 } else { joiner_len };
                let over_overlap = total > overlap;
                let blocks_next = total > 0 && total + len + sep > max_len;
                if !(over_overlap || blocks_next) {
                    break;
                }
                let Some((_, first_len)) = window.pop_front() else {
                    break;
                };
                let first_sep = if window.is_empty() { 0 } else { joiner_len };
                total = total.saturating_sub(first_len + first_sep);
            }
        }

        let sep = if window.is_empty() { 0 } else { joiner_len };
        window.push_back((frag, len));
        total += len + sep;
    }

    push_joined(&mut merged, &window, joiner);
    merged
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<Measured<'_>>, joiner: &str) {
    let joined = window
        .iter()
        .map(|(frag, _)| *frag)
        .collect::<Vec<_>>()
        .join(joiner);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Split `text` at sentence boundaries (`. `, `! `, `? ` followed by uppercase
/// or newline). Returns non-empty, trimmed fragments.
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        let is_terminal = bytes[i] == b'.' || bytes[i] == b'!' || bytes[i] == b'?';
        if is_terminal {
            // Look ahead: must be followed by a space then uppercase or newline.
            if i + 1 < bytes.len() && bytes[i + 1] == b' ' {
                let after_space = if i + 2 < bytes.len() {
                    bytes[i + 2]
                } else {
                    b'\n' // end-of-string acts like newline
                };
                if after_space.is_ascii_uppercase() || after_space == b'\n' {
                    let end = i + 1; // include the terminal punctuation
                    let s = text[start..end].trim();
                    if !s.is_empty() {
                        sentences.push(s.to_string());
                    }
                    start = end + 1; // skip the space
                    i = start;
                    continue;
                }
            }
        }
        i += 1;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Split `text` into pieces of at most `max_tokens`, measuring each candidate
/// with the oracle. Breaks after whitespace first; a single word over budget
/// is broken between characters. A lone character over budget is emitted
/// as-is.
pub(crate) fn hard_split(text: &str, max_tokens: usize, oracle: &dyn LengthOracle) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut buf = String::new();

    for word in text.split_inclusive(char::is_whitespace) {
        if fits(&buf, word, max_tokens, oracle) {
            buf.push_str(word);
            continue;
        }
        flush(&mut pieces, &mut buf);

        if oracle.token_count(word.trim()) <= max_tokens {
            buf.push_str(word);
            continue;
        }
        for (i, ch) in word.char_indices() {
            let ch = &word[i..i + ch.len_utf8()];
            if !fits(&buf, ch, max_tokens, oracle) {
                flush(&mut pieces, &mut buf);
            }
            buf.push_str(ch);
        }
    }
    flush(&mut pieces, &mut buf);
    pieces
}

/// Measured trimmed, since that is what `flush` emits.
fn fits(buf: &str, next: &str, max_tokens: usize, oracle: &dyn LengthOracle) -> bool {
    if buf.is_empty() {
        return oracle.token_count(next.trim()) <= max_tokens;
    }
    let mut candidate = String::with_capacity(buf.len() + next.len());
    candidate.push_str(buf);
    candidate.push_str(next);
    oracle.token_count(candidate.trim()) <= max_tokens
}

fn flush(pieces: &mut Vec<String>, buf: &mut String) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
    buf.clear();
}
