use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::economy::EconomyError;

const TOKEN_TRIM: &[char] = &['.', ',', '!', '?', '"', '\'', '\n', '\r', '\t', ' '];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// banned entries must line up with whole tokens
    WholeWord,
    /// banned entries match anywhere inside the text
    Substring,
}

/// word-based gate for post submissions
#[derive(Debug, Clone)]
pub struct WordFilter {
    banned_words: BTreeSet<String>,
    mode: MatchMode,
}

impl WordFilter {
    pub fn from_words<I, S>(words: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let banned_words = words
            .into_iter()
            .filter_map(|word| normalize_entry(word.as_ref()))
            .collect();
        Self { banned_words, mode }
    }

    pub fn words(&self) -> Vec<String> {
        self.banned_words.iter().cloned().collect()
    }

    /// returns false when the entry was empty or already present
    pub fn add_word(&mut self, word: &str) -> bool {
        match normalize_entry(word) {
            Some(word) => self.banned_words.insert(word),
            None => false,
        }
    }

    pub fn remove_word(&mut self, word: &str) -> bool {
        match normalize_entry(word) {
            Some(word) => self.banned_words.remove(&word),
            None => false,
        }
    }

    pub fn find_banned(&self, text: &str) -> Option<String> {
        match self.mode {
            MatchMode::WholeWord => {
                let tokens = tokenize(text);
                if tokens.is_empty() {
                    return None;
                }
                // padding lets multi-word entries match contiguous tokens only
                let haystack = format!(" {} ", tokens.join(" "));
                self.banned_words
                    .iter()
                    .find(|word| haystack.contains(&format!(" {} ", word)))
                    .cloned()
            }
            MatchMode::Substring => {
                let haystack = text.to_lowercase();
                self.banned_words
                    .iter()
                    .find(|word| haystack.contains(word.as_str()))
                    .cloned()
            }
        }
    }

    pub fn is_allowed(&self, text: &str) -> bool {
        self.find_banned(text).is_none()
    }

    pub fn assert_allowed(&self, text: &str) -> Result<(), EconomyError> {
        match self.find_banned(text) {
            Some(word) => Err(EconomyError::BannedContent(word)),
            None => Ok(()),
        }
    }
}

fn normalize_entry(word: &str) -> Option<String> {
    let tokens = tokenize(word);
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| token.trim_matches(TOKEN_TRIM).to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
