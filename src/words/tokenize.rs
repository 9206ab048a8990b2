use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use super::{
    detect::{LetterScript, letter_script},
    preprocess::is_protected_token,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("{segmenter}: word of {length} characters exceeds the {limit}-character window")]
    InputTooLong {
        segmenter: &'static str,
        length: usize,
        limit: usize,
    },
    #[error("{segmenter}: no dictionary configured for '{language}'")]
    MissingDictionary {
        segmenter: &'static str,
        language: String,
    },
}

pub trait Tokenizer: Send + Sync {
    fn name(&self) -> &'static str;
    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError>;
}

pub fn whitespace_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn name(&self) -> &'static str {
        "whitespace"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        Ok(whitespace_tokens(text))
    }
}

fn is_hangul(ch: char) -> bool {
    letter_script(ch) == Some(LetterScript::Hangul)
}

fn split_where<F>(word: &str, mut boundary: F) -> Vec<String>
where
    F: FnMut(char, char) -> bool,
{
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut previous: Option<char> = None;
    for ch in word.chars() {
        if let Some(prev) = previous
            && boundary(prev, ch)
            && !current.is_empty()
        {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(ch);
        previous = Some(ch);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LinguisticTokenizer;

impl Tokenizer for LinguisticTokenizer {
    fn name(&self) -> &'static str {
        "linguistic"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            if is_protected_token(word) {
                tokens.push(word.to_string());
                continue;
            }
            tokens.extend(
                word.split_word_bounds()
                    .filter(|segment| !segment.trim().is_empty())
                    .map(str::to_string),
            );
        }
        Ok(tokens)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HangulRunSegmenter;

impl Tokenizer for HangulRunSegmenter {
    fn name(&self) -> &'static str {
        "hangul-runs"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        Ok(text
            .split_whitespace()
            .flat_map(|word| split_where(word, |prev, cur| is_hangul(prev) != is_hangul(cur)))
            .collect())
    }
}

pub const DEFAULT_SEGMENT_WINDOW: usize = 4_096;

#[derive(Debug, Clone)]
pub struct DictionarySegmenter {
    language: String,
    words: HashSet<String>,
    longest: usize,
    char_fallback: bool,
    window: usize,
}

impl DictionarySegmenter {
    pub fn new<I, S>(language: impl Into<String>, words: I, char_fallback: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = words
            .into_iter()
            .map(Into::into)
            .filter(|word: &String| !word.trim().is_empty())
            .collect::<HashSet<_>>();
        let longest = words.iter().map(|w| w.chars().count()).max().unwrap_or(1);
        Self {
            language: language.into(),
            words,
            longest,
            char_fallback,
            window: DEFAULT_SEGMENT_WINDOW,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    fn is_unspaced(ch: char) -> bool {
        matches!(
            letter_script(ch),
            Some(LetterScript::Han | LetterScript::Kana | LetterScript::Thai)
        )
    }

    fn segment_run(&self, run: &[char], tokens: &mut Vec<String>) {
        let mut start = 0;
        while start < run.len() {
            let max_len = self.longest.min(run.len() - start);
            let len = (2..=max_len)
                .rev()
                .find(|len| {
                    let candidate = run[start..start + len].iter().collect::<String>();
                    self.words.contains(&candidate)
                })
                .unwrap_or(1);
            tokens.push(run[start..start + len].iter().collect());
            start += len;
        }
    }
}

impl Tokenizer for DictionarySegmenter {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, TokenizeError> {
        if self.words.is_empty() && !self.char_fallback {
            return Err(TokenizeError::MissingDictionary {
                segmenter: self.name(),
                language: self.language.clone(),
            });
        }
        let mut tokens = Vec::new();
        for word in text.split_whitespace() {
            let chars = word.chars().collect::<Vec<_>>();
            if chars.len() > self.window {
                return Err(TokenizeError::InputTooLong {
                    segmenter: self.name(),
                    length: chars.len(),
                    limit: self.window,
                });
            }
            let mut index = 0;
            while index < chars.len() {
                let unspaced = Self::is_unspaced(chars[index]);
                let end = chars[index..]
                    .iter()
                    .position(|ch| Self::is_unspaced(*ch) != unspaced)
                    .map_or(chars.len(), |offset| index + offset);
                if unspaced {
                    self.segment_run(&chars[index..end], &mut tokens);
                } else {
                    tokens.push(chars[index..end].iter().collect());
                }
                index = end;
            }
        }
        Ok(tokens)
    }
}

pub struct TokenizerRegistry {
    strategies: HashMap<String, Box<dyn Tokenizer>>,
    fallback: WhitespaceTokenizer,
}

impl Default for TokenizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: WhitespaceTokenizer,
        }
    }

    pub fn with_defaults(dictionaries: &BTreeMap<String, Vec<String>>) -> Self {
        let mut registry = Self::new();
        registry.register("ko", HangulRunSegmenter);
        for code in ["en", "es", "fr", "de", "pt", "it", "ru"] {
            registry.register(code, LinguisticTokenizer);
        }
        for (code, char_fallback) in [("zh-cn", true), ("zh-tw", true), ("ja", true), ("th", false)]
        {
            let words = dictionaries.get(code).cloned().unwrap_or_default();
            registry.register(code, DictionarySegmenter::new(code, words, char_fallback));
        }
        registry
    }

    pub fn register(&mut self, code: impl Into<String>, tokenizer: impl Tokenizer + 'static) {
        self.strategies.insert(code.into(), Box::new(tokenizer));
    }

    pub fn resolve(&self, code: &str) -> &dyn Tokenizer {
        match self.strategies.get(code) {
            Some(tokenizer) => tokenizer.as_ref(),
            None => &self.fallback,
        }
    }

    pub fn fallback(&self) -> &dyn Tokenizer {
        &self.fallback
    }
}
