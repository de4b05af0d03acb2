/*!
 * Size-bounded chunking at sentence boundaries.
 */

const SENTENCE_BREAKS: [&str; 3] = [". ", "! ", "? "];

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Each window is cut right after the last `". "`, `"! "` or `"? "` that lies
/// fully inside it and does not start at the window start. When no such
/// boundary exists the window is hard-cut at `max_chars`. Cuts always fall on
/// character boundaries and the pieces concatenate back to `text`.
pub fn chunk(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let window_end = match rest.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => byte_idx,
            None => {
                chunks.push(rest);
                break;
            }
        };

        let window = &rest[..window_end];
        let cut = last_sentence_break(window).unwrap_or(window_end);

        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    chunks
}

/// Byte offset just past the rightmost sentence break, if it is not at offset 0
fn last_sentence_break(window: &str) -> Option<usize> {
    SENTENCE_BREAKS
        .iter()
        .filter_map(|sep| window.rfind(sep))
        .filter(|&pos| pos > 0)
        .max()
        .map(|pos| pos + 2)
}
