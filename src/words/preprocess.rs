use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::category::Structure;

fn structure_source(structure: Structure) -> &'static str {
    match structure {
        Structure::HtmlXml => r"</?[^<>]*?>",
        Structure::Brackets => r"\{[^{}]+\}",
        Structure::Newlines => r"\\n",
        Structure::FilePaths => r"[a-zA-Z]:\\[^ ]+|/[^ ]+",
    }
}

fn structure_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Structure::ALL.map(|structure| {
            Regex::new(structure_source(structure)).expect("structure patterns are valid regexes")
        })
    })
}

const PROTECTED_SOURCES: &[&str] = &[
    // versions: 1.0.4, v1.2.3
    r"\b(?:v)?\d+(?:\.\d+){1,3}\b",
    // dates: 2024-01-15, 15/01/2024, 01.15.24
    r"\b\d{4}[-/.]\d{1,2}[-/.]\d{1,2}\b",
    r"\b\d{1,2}[-/.]\d{1,2}[-/.]\d{4}\b",
    r"\b\d{1,2}[-/.]\d{1,2}[-/.]\d{2}\b",
    // times: 14:30, 2:30:45
    r"\b\d{1,2}:\d{2}(?::\d{2})?\b",
    // numbers: decimals, percentages, unit suffixes, currency, integers
    r"\b\d+\.\d+\b",
    r"\b\d+%\b",
    r"\b\d+[km]?\b",
    r"\$\d+(?:\.\d{2})?\b",
    r"\b\d+\b",
];

struct Cleaners {
    protected: Vec<Regex>,
    punctuation: Regex,
    whitespace: Regex,
}

fn cleaners() -> &'static Cleaners {
    static CLEANERS: OnceLock<Cleaners> = OnceLock::new();
    CLEANERS.get_or_init(|| Cleaners {
        protected: PROTECTED_SOURCES
            .iter()
            .map(|source| Regex::new(source).expect("protected patterns are valid regexes"))
            .collect(),
        // `\w` includes combining marks, so vowel signs stay attached to their words.
        punctuation: Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"),
        whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
    })
}

pub fn is_protected_token(word: &str) -> bool {
    cleaners().protected.iter().any(|pattern| {
        pattern
            .find(word)
            .is_some_and(|m| m.start() == 0 && m.end() == word.len())
    })
}

pub fn structure_matches(text: &str) -> Vec<(Structure, Vec<&str>)> {
    Structure::ALL
        .iter()
        .zip(structure_patterns())
        .filter_map(|(structure, pattern)| {
            let found = pattern
                .find_iter(text)
                .map(|m| m.as_str())
                .collect::<Vec<_>>();
            (!found.is_empty()).then_some((*structure, found))
        })
        .collect()
}

pub fn strip_structures(text: &str) -> String {
    structure_patterns()
        .iter()
        .fold(text.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, " ").into_owned()
        })
}

// Letters and underscores only, so no numeric pattern can match inside one.
fn placeholder(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index;
    loop {
        letters.push(b'a' + (remaining % 26) as u8);
        remaining /= 26;
        if remaining == 0 {
            break;
        }
    }
    letters.reverse();
    format!("__PROTECTED{}__", String::from_utf8_lossy(&letters))
}

pub fn preprocess(text: &str) -> String {
    let cleaners = cleaners();
    let mut protected: Vec<String> = Vec::new();
    let mut working = text.to_string();
    for pattern in &cleaners.protected {
        working = pattern
            .replace_all(&working, |caps: &Captures| {
                let marker = placeholder(protected.len());
                protected.push(caps[0].to_string());
                marker
            })
            .into_owned();
    }

    let joined = working.replace('-', "");
    let stripped = cleaners.punctuation.replace_all(&joined, " ");
    let mut cleaned = cleaners
        .whitespace
        .replace_all(&stripped, " ")
        .trim()
        .to_string();

    for (index, original) in protected.iter().enumerate() {
        cleaned = cleaned.replace(&placeholder(index), original);
    }
    cleaned
}

pub fn clean_text(text: &str) -> String {
    preprocess(&strip_structures(text.trim()))
}
