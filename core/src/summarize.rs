//! Extractive compression of a chunk down to a few sentences.
//!
//! Sentence boundaries are a heuristic for mixed Korean/English prose: a break
//! follows `.`, `?`, `!`, `…` or a newline, and the whitespace after a
//! sentence-final `다` or `요`. Abbreviations and decimals are split too.

use crate::tokenizer::Tokenizer;
use std::collections::HashSet;

/// Length in chars at which a sentence earns the full length bonus.
const LENGTH_BONUS_CHARS: usize = 40;

pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        let boundary = matches!(c, '.' | '?' | '!' | '…' | '\n')
            || (c.is_whitespace() && matches!(prev, Some('다') | Some('요')));
        if boundary {
            let end = i + c.len_utf8();
            push_trimmed(&mut out, &text[start..end]);
            start = end;
        }
        prev = Some(c);
    }
    push_trimmed(&mut out, &text[start..]);
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}

/// Keep the first sentence, then the highest scoring others until `lines`
/// sentences are collected. Output is in selection order, not reading order.
pub fn summarize(tokenizer: &Tokenizer, text: &str, lines: usize) -> String {
    let lines = lines.max(1);
    let sentences = split_sentences(text);
    if sentences.len() <= lines {
        return sentences.join(" ");
    }

    let vocab: HashSet<String> = tokenizer.tokenize(text).into_iter().collect();
    let mut scored: Vec<(&str, f64)> = sentences
        .iter()
        .map(|&s| {
            let overlap = tokenizer.tokenize(s).iter().filter(|t| vocab.contains(*t)).count();
            let bonus = s.chars().count().min(LENGTH_BONUS_CHARS) as f64 / LENGTH_BONUS_CHARS as f64;
            (s, overlap as f64 + bonus)
        })
        .collect();
    // stable: equal scores keep reading order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut out = vec![sentences[0]];
    for (s, _) in scored {
        if out.len() >= lines {
            break;
        }
        if out.contains(&s) {
            continue;
        }
        out.push(s);
    }
    out.join(" ")
}
