use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

/// English function words plus a handful of standalone Korean conjunctions and
/// demonstratives. Apostrophe forms are absent because punctuation is stripped
/// before the stop-word check.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "about","above","after","again","against","all","am","an","and","any","are","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","cannot","could",
    "did","do","does","doing","down","during",
    "each","few","for","from","further",
    "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
    "if","in","into","is","it","its","itself",
    "me","more","most","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","should","so","some","such",
    "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
    "under","until","up","very",
    "was","we","were","what","when","where","which","while","who","whom","why","with","would",
    "you","your","yours","yourself","yourselves",
    "그리고","그러나","하지만","그래서","그런데","또는","또한","및","그","이","저","것","수","등",
];

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\p{L}\p{N}\s]+").expect("valid regex");
    static ref DEFAULT_STOPSET: Arc<HashSet<String>> =
        Arc::new(DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect());
}

/// Lowercasing, punctuation-stripping tokenizer with a configurable stop-word set.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: Arc<HashSet<String>>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { stopwords: DEFAULT_STOPSET.clone() }
    }
}

impl Tokenizer {
    /// Build a tokenizer with a custom stop-word set. Words are lowercased to
    /// match the token stream.
    pub fn with_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        Self { stopwords: Arc::new(set) }
    }

    pub fn is_stopword(&self, token: &str) -> bool { self.stopwords.contains(token) }

    /// Lowercase, replace every run of non-letter/non-digit characters with a
    /// space, split on whitespace and drop single-character tokens and stop words.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = NON_WORD.replace_all(&lowered, " ");
        cleaned
            .split_whitespace()
            .filter(|t| t.chars().count() > 1 && !self.is_stopword(t))
            .map(str::to_string)
            .collect()
    }
}

/// Tokenize with the default stop-word set.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Reze works at a cafe!");
        assert_eq!(t, vec!["reze", "works", "cafe"]);
    }

    #[test]
    fn keeps_hangul_and_digits() {
        let t = tokenize("레제는 폭탄의 악마, 2024년!");
        assert_eq!(t, vec!["레제는", "폭탄의", "악마", "2024년"]);
    }

    #[test]
    fn custom_stopwords_are_lowercased() {
        let tk = Tokenizer::with_stopwords(["Reze"]);
        assert_eq!(tk.tokenize("Reze and the cafe"), vec!["and", "the", "cafe"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ... !!! a b").is_empty());
    }
}
