//! crates/medminder_core/src/chunk.rs
//!
//! Splits extracted document text into overlapping chunks for embedding.

/// Target size of one chunk, in characters.
pub const CHUNK_SIZE: usize = 1000;
/// Number of characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 200;

/// Splits `text` into overlapping chunks of at most `chunk_size` characters.
///
/// Chunks prefer to break at whitespace so words are not cut in half, and
/// consecutive chunks share roughly `overlap` characters of context. This is
/// a fixed heuristic, not adaptive. Whitespace-only input yields no chunks.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 || text.trim().is_empty() {
        return Vec::new();
    }
    let overlap = overlap.min(chunk_size / 2);

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());

        // Prefer breaking at the last whitespace in the window, unless that
        // would make the chunk pathologically short.
        let mut cut = end;
        if end < chars.len() {
            if let Some(ws) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                if ws > chunk_size / 2 {
                    cut = start + ws;
                }
            }
        }

        let chunk: String = chars[start..cut].iter().collect();
        let trimmed = chunk.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if cut >= chars.len() {
            break;
        }
        let next = cut.saturating_sub(overlap);
        start = if next > start { next } else { cut };
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_text("", CHUNK_SIZE, CHUNK_OVERLAP).is_empty());
        assert!(split_text("   \n\t ", CHUNK_SIZE, CHUNK_OVERLAP).is_empty());
    }

    #[test]
    fn short_input_yields_single_chunk() {
        let chunks = split_text("Take one aspirin every morning.", CHUNK_SIZE, CHUNK_OVERLAP);
        assert_eq!(chunks, vec!["Take one aspirin every morning.".to_string()]);
    }

    #[test]
    fn long_input_respects_size_and_overlaps() {
        let word = "medicine ";
        let text = word.repeat(400); // 3600 characters
        let chunks = split_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= CHUNK_SIZE);
        }
        // Consecutive chunks share context: the head of each chunk after the
        // first must appear near the tail of its predecessor.
        for pair in chunks.windows(2) {
            let tail: String = pair[0]
                .chars()
                .rev()
                .take(CHUNK_OVERLAP + 20)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            let head: String = pair[1].chars().take(50).collect();
            assert!(
                tail.contains(head.trim()),
                "expected overlap between consecutive chunks"
            );
        }
    }

    #[test]
    fn breaks_at_whitespace_when_possible() {
        let text = format!("{} {}", "a".repeat(900), "b".repeat(900));
        let chunks = split_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);
        assert_eq!(chunks[0], "a".repeat(900));
    }

    #[test]
    fn unbroken_text_still_terminates() {
        let text = "x".repeat(5000);
        let chunks = split_text(&text, CHUNK_SIZE, CHUNK_OVERLAP);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= CHUNK_SIZE));
    }
}
