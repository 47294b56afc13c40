//! Separator-guided structural splitting.

use tracing::debug;

use super::helpers::{hard_split, merge_with_overlap, split_keep_separator, Measured};
use super::oracle::LengthOracle;

/// Paragraph, line, word, then character boundaries.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Split `text` into trimmed pieces of at most `max_len` tokens, overlapping
/// consecutive pieces by up to `overlap` tokens.
///
/// Text that already fits comes back as a single piece. A segment that is
/// still over budget once every separator is exhausted is emitted whole.
pub fn split_structural(
    text: &str,
    max_len: usize,
    overlap: usize,
    oracle: &dyn LengthOracle,
) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if oracle.token_count(trimmed) <= max_len {
        return vec![trimmed.to_string()];
    }

    let mut pieces = Vec::new();
    split_with(text, &DEFAULT_SEPARATORS, max_len, overlap, oracle, &mut pieces);
    pieces
}

/// Each level recurses only with the strictly finer separators after the one
/// it chose, so depth never exceeds `separators.len()`.
fn split_with(
    text: &str,
    separators: &[&str],
    max_len: usize,
    overlap: usize,
    oracle: &dyn LengthOracle,
    out: &mut Vec<String>,
) {
    let chosen = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(chosen).copied().unwrap_or("");
    let finer = separators.get(chosen + 1..).unwrap_or(&[]);

    let mut good: Vec<Measured<'_>> = Vec::new();
    for frag in split_keep_separator(text, separator) {
        let len = oracle.token_count(frag);
        if len < max_len {
            good.push((frag, len));
            continue;
        }

        if !good.is_empty() {
            emit_merged(&good, finer, max_len, overlap, oracle, out);
            good.clear();
        }

        if finer.is_empty() {
            debug!(tokens = len, max_len, "emitting unsplittable segment over budget");
            let frag = frag.trim();
            if !frag.is_empty() {
                out.push(frag.to_string());
            }
        } else {
            split_with(frag, finer, max_len, overlap, oracle, out);
        }
    }

    if !good.is_empty() {
        emit_merged(&good, finer, max_len, overlap, oracle, out);
    }
}

/// Merge fragments and re-measure each joined piece. Summed fragment counts
/// can undershoot the joined count under BPE, so an over-budget piece is split
/// again with the finer separators, or hard-split at the character level.
fn emit_merged(
    good: &[Measured<'_>],
    finer: &[&str],
    max_len: usize,
    overlap: usize,
    oracle: &dyn LengthOracle,
    out: &mut Vec<String>,
) {
    for piece in merge_with_overlap(good, "", 0, max_len, overlap) {
        if oracle.token_count(&piece) <= max_len {
            out.push(piece);
        } else if finer.is_empty() {
            out.extend(hard_split(&piece, max_len, oracle));
        } else {
            split_with(&piece, finer, max_len, overlap, oracle, out);
        }
    }
}
