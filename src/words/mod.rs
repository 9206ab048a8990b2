pub mod detect;
pub mod preprocess;
pub mod tokenize;

use std::collections::{BTreeSet, HashSet};

use log::debug;

pub use detect::{LanguageDetector, ScriptDetector, detect_column_language};
pub use preprocess::{clean_text, preprocess, structure_matches};
pub use tokenize::{Tokenizer, TokenizerRegistry, TokenizeError, whitespace_tokens};

use crate::{
    category::{AnalysisMode, Category, Structure},
    scanner::{CellReading, SheetAnalyzer},
    source::Sheet,
};

pub struct WordAnalyzer {
    detector: Box<dyn LanguageDetector>,
    registry: TokenizerRegistry,
    column_languages: Vec<Option<String>>,
}

impl WordAnalyzer {
    pub fn new(detector: impl LanguageDetector + 'static, registry: TokenizerRegistry) -> Self {
        Self {
            detector: Box::new(detector),
            registry,
            column_languages: Vec::new(),
        }
    }

    pub fn column_language(&self, column: usize) -> Option<&str> {
        self.column_languages.get(column)?.as_deref()
    }

    pub fn tokens(&self, language: &str, text: &str) -> Vec<String> {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Vec::new();
        }
        let tokenizer = self.registry.resolve(language);
        let tokens = match tokenizer.tokenize(&cleaned) {
            Ok(tokens) => tokens,
            Err(err) => {
                debug!("Falling back to whitespace for '{language}': {err}");
                whitespace_tokens(&cleaned)
            }
        };
        tokens
            .into_iter()
            .filter(|token| !token.trim().is_empty())
            .collect()
    }
}

pub fn word_counts(tokens: &[String]) -> (usize, usize) {
    let distinct = tokens.iter().collect::<HashSet<_>>().len();
    (tokens.len(), distinct)
}

impl SheetAnalyzer for WordAnalyzer {
    fn mode(&self) -> AnalysisMode {
        AnalysisMode::Words
    }

    fn prepare(&mut self, sheet: &Sheet) -> Vec<Category> {
        self.column_languages = (0..sheet.width())
            .map(|column| detect_column_language(sheet, column, self.detector.as_ref()))
            .collect();
        debug!(
            "Column languages for '{}': {:?}",
            sheet.name, self.column_languages
        );
        let languages = self
            .column_languages
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>();
        languages
            .into_iter()
            .map(Category::Language)
            .chain(Structure::ALL.iter().copied().map(Category::from))
            .collect()
    }

    fn read_cell(&self, column: usize, text: &str) -> CellReading {
        let mut reading = CellReading::default();
        if let Some(language) = self.column_language(column) {
            let tokens = self.tokens(language, text);
            let (total, distinct) = word_counts(&tokens);
            if total > 0 {
                let category = Category::language(language);
                reading.units.push((category.clone(), total));
                reading.distinct_units.push((category.clone(), distinct));
                reading.folder_values.push((category, tokens));
            }
        }
        for (structure, found) in structure_matches(text) {
            let category = Category::from(structure);
            reading.units.push((category.clone(), found.len()));
            reading.distinct_units.push((category.clone(), found.len()));
            reading
                .folder_values
                .push((category, found.into_iter().map(str::to_string).collect()));
        }
        reading
    }

    fn folder_measure(&self, _category: &Category, values: &HashSet<String>) -> usize {
        values.len()
    }
}
