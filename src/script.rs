use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

use crate::{
    category::{AnalysisMode, Category, Script},
    scanner::{CellReading, SheetAnalyzer},
    source::Sheet,
};

fn pattern_source(script: Script) -> &'static str {
    match script {
        Script::Korean => r"[가-힣]",
        Script::Alphabet => r"[A-Za-zÀ-ÿ]",
        Script::Number => r"[0-9]",
        Script::Chinese => r"[\u{4E00}-\u{9FFF}]",
        Script::Japanese => r"[\u{30A0}-\u{30FF}\u{3040}-\u{309F}]",
        Script::Thai => r"[\u{0E00}-\u{0E7F}]",
        Script::Russian => r"[\u{0400}-\u{04FF}]",
        // Marks are neither letters nor digits, so Thai vowel signs count here.
        Script::Special => r"[^\p{L}\p{N}_\s]",
    }
}

// Independent passes: a character may count toward several scripts.
fn patterns() -> &'static [Regex; 8] {
    static PATTERNS: OnceLock<[Regex; 8]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Script::ALL.map(|script| {
            Regex::new(pattern_source(script)).expect("script patterns are valid regexes")
        })
    })
}

fn pattern(script: Script) -> &'static Regex {
    &patterns()[script as usize]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptCounts([usize; 8]);

impl ScriptCounts {
    pub fn get(&self, script: Script) -> usize {
        self.0[script as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Script, usize)> + '_ {
        Script::ALL.iter().map(|script| (*script, self.get(*script)))
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

pub fn count_script(text: &str, script: Script) -> usize {
    pattern(script).find_iter(text).count()
}

pub fn count_characters(text: &str) -> ScriptCounts {
    ScriptCounts(Script::ALL.map(|script| count_script(text, script)))
}

pub fn contains_script(text: &str, script: Script) -> bool {
    pattern(script).is_match(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dominant {
    Single(Script),
    Tied(Vec<Script>),
}

pub fn dominant_script(counts: &ScriptCounts) -> Dominant {
    let non_special = counts
        .iter()
        .filter(|(script, _)| *script != Script::Special)
        .map(|(_, count)| count)
        .sum::<usize>();
    if non_special == 0 {
        return highest(counts, &[Script::Special, Script::Number]);
    }
    let non_alphabet = [
        Script::Korean,
        Script::Number,
        Script::Chinese,
        Script::Japanese,
        Script::Thai,
        Script::Russian,
    ];
    if non_alphabet.iter().any(|script| counts.get(*script) > 0) {
        return highest(counts, &non_alphabet);
    }
    Dominant::Single(Script::Alphabet)
}

fn highest(counts: &ScriptCounts, candidates: &[Script]) -> Dominant {
    let max = candidates
        .iter()
        .map(|script| counts.get(*script))
        .max()
        .unwrap_or(0);
    let leaders = candidates
        .iter()
        .copied()
        .filter(|script| counts.get(*script) == max)
        .collect::<Vec<_>>();
    match leaders.as_slice() {
        [single] => Dominant::Single(*single),
        _ => Dominant::Tied(leaders),
    }
}

#[derive(Debug, Default)]
pub struct CharAnalyzer;

impl CharAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl SheetAnalyzer for CharAnalyzer {
    fn mode(&self) -> AnalysisMode {
        AnalysisMode::Chars
    }

    fn prepare(&mut self, _sheet: &Sheet) -> Vec<Category> {
        Script::ALL.iter().copied().map(Category::from).collect()
    }

    fn read_cell(&self, _column: usize, text: &str) -> CellReading {
        let counts = count_characters(text);
        let units = counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(script, count)| (Category::from(script), count))
            .collect::<Vec<_>>();
        let folder_values = units
            .iter()
            .map(|(category, _)| (category.clone(), vec![text.to_string()]))
            .collect();
        CellReading {
            distinct_units: units.clone(),
            units,
            folder_values,
        }
    }

    fn folder_measure(&self, category: &Category, values: &HashSet<String>) -> usize {
        match category {
            Category::Script(script) => values
                .iter()
                .map(|text| count_script(text, *script))
                .sum(),
            _ => 0,
        }
    }
}
