use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n{2,}").expect("valid regex");
}

/// Split raw corpus text into passages of at most `max_chunk_chars` characters.
///
/// Paragraphs are separated by blank lines. A paragraph that fits is kept whole;
/// a longer one is cut into windows of `max_chunk_chars` characters where each
/// window starts `overlap` characters before the previous window ended. A word
/// longer than `max_chunk_chars` is never split: the window before it stops at
/// the preceding whitespace and the word is emitted whole as its own passage.
pub fn chunk(raw: &str, max_chunk_chars: usize, overlap: usize) -> Vec<String> {
    let max_chunk_chars = max_chunk_chars.max(1);
    let raw = raw.replace("\r\n", "\n");
    let mut chunks = Vec::new();

    for para in PARAGRAPH_BREAK.split(&raw).map(str::trim).filter(|p| !p.is_empty()) {
        let chars: Vec<char> = para.chars().collect();
        if chars.len() <= max_chunk_chars {
            chunks.push(para.to_string());
            continue;
        }

        let mut start = 0usize;
        while start < chars.len() {
            let (end, resume) = window_end(&chars, start, max_chunk_chars);
            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
            if end >= chars.len() {
                break;
            }
            // always make progress, even when overlap >= max_chunk_chars
            start = resume.unwrap_or_else(|| (start + 1).max(end.saturating_sub(overlap)));
        }
    }
    chunks
}

/// End of the window starting at `start`, plus a forced next start when the
/// window boundary falls on a word that cannot fit in any window. Such a word
/// is cut off at its first character (next window starts on it) or, when the
/// window begins on it, widened to its last character (next window starts
/// after it, with no overlap into the word).
fn window_end(chars: &[char], start: usize, max_chunk_chars: usize) -> (usize, Option<usize>) {
    let end = (start + max_chunk_chars).min(chars.len());
    if end >= chars.len() || chars[end].is_whitespace() || chars[end - 1].is_whitespace() {
        return (end, None);
    }
    let word_start = chars[start..end]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(start, |p| start + p + 1);
    let word_end = end + chars[end..].iter().position(|c| c.is_whitespace()).unwrap_or(chars.len() - end);
    if word_end - word_start <= max_chunk_chars {
        return (end, None);
    }
    if word_start == start {
        (word_end, Some(word_end))
    } else {
        (word_start, Some(word_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_blank_lines() {
        let chunks = chunk("Reze works at a cafe.\n\nReze is the Bomb Devil.", 600, 60);
        assert_eq!(chunks, vec!["Reze works at a cafe.", "Reze is the Bomb Devil."]);
    }

    #[test]
    fn drops_empty_paragraphs_and_handles_crlf() {
        let chunks = chunk("\n\n  first  \r\n\r\n\n\n\nsecond\n", 600, 60);
        assert_eq!(chunks, vec!["first", "second"]);
    }

    #[test]
    fn single_newline_does_not_split() {
        let chunks = chunk("line one\nline two", 600, 0);
        assert_eq!(chunks, vec!["line one\nline two"]);
    }

    #[test]
    fn long_paragraph_is_windowed_with_overlap() {
        let text = "aaaa bbbb cccc dddd eeee";
        let chunks = chunk(text, 10, 3);
        assert_eq!(chunks, vec!["aaaa bbbb", "bb cccc dd", "dddd eeee"]);
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(&prev[prev.len() - 2..], &next[..2]);
        }
    }

    #[test]
    fn windows_respect_max_chars() {
        let text = "word ".repeat(200);
        let chunks = chunk(&text, 50, 10);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
    }

    #[test]
    fn overlap_larger_than_window_terminates() {
        let text = "ab ".repeat(20);
        let chunks = chunk(&text, 5, 50);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }

    #[test]
    fn oversized_word_is_emitted_whole() {
        let word = "x".repeat(40);
        let text = format!("{word} tail words here");
        let chunks = chunk(&text, 10, 2);
        assert_eq!(chunks[0], word);
        assert!(chunks.iter().skip(1).all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn oversized_word_after_prefix_is_emitted_whole() {
        let word = "x".repeat(40);
        let text = format!("ab {word} tail words here");
        let chunks = chunk(&text, 10, 2);
        assert_eq!(chunks, vec!["ab".to_string(), word.clone(), "tail word".into(), "rds here".into()]);
        for c in &chunks {
            assert!(c.chars().count() <= 10 || *c == word);
        }
    }

    #[test]
    fn oversized_word_mid_window_with_large_overlap() {
        let word = "y".repeat(25);
        let text = format!("one two {word} three four five");
        let chunks = chunk(&text, 10, 50);
        assert_eq!(chunks.iter().filter(|c| c.contains('y')).collect::<Vec<_>>(), vec![&word]);
        for c in &chunks {
            assert!(c.chars().count() <= 10 || *c == word);
        }
    }

    #[test]
    fn multibyte_text_is_windowed_by_chars() {
        let text = "레제는 카페에서 일한다 ".repeat(20);
        let chunks = chunk(&text, 12, 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 12));
    }
}
