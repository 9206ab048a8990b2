use std::fmt;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum AnalysisMode {
    #[default]
    Chars,
    Words,
}

impl AnalysisMode {
    pub fn unit_noun(self) -> &'static str {
        match self {
            AnalysisMode::Chars => "characters",
            AnalysisMode::Words => "words",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Chars => f.write_str("chars"),
            AnalysisMode::Words => f.write_str("words"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Script {
    Korean,
    Alphabet,
    Number,
    Chinese,
    Japanese,
    Thai,
    Russian,
    Special,
}

impl Script {
    pub const ALL: [Script; 8] = [
        Script::Korean,
        Script::Alphabet,
        Script::Number,
        Script::Chinese,
        Script::Japanese,
        Script::Thai,
        Script::Russian,
        Script::Special,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Script::Korean => "Korean",
            Script::Alphabet => "Alphabet",
            Script::Number => "Number",
            Script::Chinese => "Chinese",
            Script::Japanese => "Japanese",
            Script::Thai => "Thai",
            Script::Russian => "Russian",
            Script::Special => "Special",
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Script::Korean => "🇰🇷",
            Script::Alphabet => "🇺🇸",
            Script::Number => "🔢",
            Script::Chinese => "🇨🇳",
            Script::Japanese => "🇯🇵",
            Script::Thai => "🇹🇭",
            Script::Russian => "🇷🇺",
            Script::Special => "🔣",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Structure {
    HtmlXml,
    Brackets,
    Newlines,
    FilePaths,
}

impl Structure {
    pub const ALL: [Structure; 4] = [
        Structure::HtmlXml,
        Structure::Brackets,
        Structure::Newlines,
        Structure::FilePaths,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Structure::HtmlXml => "html_xml",
            Structure::Brackets => "brackets",
            Structure::Newlines => "newlines",
            Structure::FilePaths => "file_paths",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Script(Script),
    Language(String),
    Structure(Structure),
}

impl Category {
    pub fn language(code: impl Into<String>) -> Self {
        Category::Language(code.into())
    }

    pub fn key(&self) -> &str {
        match self {
            Category::Script(script) => script.key(),
            Category::Language(code) => code,
            Category::Structure(structure) => structure.key(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Language(code) => language_display_name(code).unwrap_or(code),
            other => other.key(),
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Category::Script(script) => script.glyph(),
            Category::Language(_) => "🌐",
            Category::Structure(_) => "🔧",
        }
    }
}

impl From<Script> for Category {
    fn from(value: Script) -> Self {
        Category::Script(value)
    }
}

impl From<Structure> for Category {
    fn from(value: Structure) -> Self {
        Category::Structure(value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ko", "Korean"),
    ("en", "English"),
    ("zh-cn", "Simplified_Chinese"),
    ("zh-tw", "Traditional_Chinese"),
    ("ja", "Japanese"),
    ("vi", "Vietnamese"),
    ("th", "Thai"),
    ("id", "Indonesian"),
    ("ru", "Russian"),
    ("es", "Spanish"),
    ("pt", "Portuguese"),
    ("tr", "Turkish"),
    ("fr", "French"),
    ("it", "Italian"),
    ("de", "German"),
];

pub fn language_display_name(code: &str) -> Option<&'static str> {
    LANGUAGE_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| *name)
}
