use std::collections::HashSet;

use crate::source::Sheet;

pub const MIN_DETECTABLE_CHARS: usize = 3;

pub trait LanguageDetector {
    fn detect(&self, text: &str) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LetterScript {
    Latin,
    Cyrillic,
    Hangul,
    Han,
    Kana,
    Thai,
    Other,
}

pub(crate) fn letter_script(ch: char) -> Option<LetterScript> {
    if !ch.is_alphabetic() {
        return None;
    }
    let script = match ch as u32 {
        0x0041..=0x024F | 0x1E00..=0x1EFF => LetterScript::Latin,
        0x0400..=0x04FF => LetterScript::Cyrillic,
        0xAC00..=0xD7A3 | 0x1100..=0x11FF | 0x3130..=0x318F => LetterScript::Hangul,
        0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => LetterScript::Han,
        0x3040..=0x30FF => LetterScript::Kana,
        0x0E00..=0x0E7F => LetterScript::Thai,
        _ => LetterScript::Other,
    };
    Some(script)
}

#[derive(Debug, Default)]
struct ScriptTally {
    hangul: usize,
    kana: usize,
    han: usize,
    thai: usize,
    cyrillic: usize,
    latin: usize,
}

const TRADITIONAL_ONLY: &str = "們說這個來時國會學對開關門長發處現問體與請讓麼還種點見經過";

const STOP_WORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "the", "and", "is", "of", "to", "in", "that", "it", "for", "with", "you", "this",
            "are", "on", "be",
        ],
    ),
    (
        "es",
        &[
            "el", "la", "los", "las", "de", "que", "y", "en", "un", "una", "es", "por", "para",
            "con", "del",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "des", "et", "est", "un", "une", "du", "que", "pour", "dans", "pas",
            "vous", "avec",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "zu", "mit", "den", "von",
            "sie", "ich", "auf",
        ],
    ),
    (
        "pt",
        &[
            "o", "os", "as", "de", "que", "e", "do", "da", "um", "uma", "para", "com", "não",
            "em", "por",
        ],
    ),
    (
        "it",
        &[
            "il", "lo", "gli", "di", "che", "e", "è", "un", "una", "per", "non", "con", "della",
            "sono", "del",
        ],
    ),
    (
        "id",
        &[
            "yang", "dan", "di", "ini", "itu", "dengan", "untuk", "tidak", "dari", "dalam",
            "akan", "ada", "saya", "kami", "anda",
        ],
    ),
];

const VIETNAMESE_MARKS: &str = "ơưđăạảấầẩẫậắằẳẵặẹẻẽếềểễệỉịọỏốồổỗộớờởỡợụủứừửữựỳỵỷỹ";
const TURKISH_MARKS: &str = "ışğİŞĞ";

impl ScriptDetector {
    fn tally(text: &str) -> ScriptTally {
        let mut tally = ScriptTally::default();
        for script in text.chars().filter_map(letter_script) {
            match script {
                LetterScript::Hangul => tally.hangul += 1,
                LetterScript::Kana => tally.kana += 1,
                LetterScript::Han => tally.han += 1,
                LetterScript::Thai => tally.thai += 1,
                LetterScript::Cyrillic => tally.cyrillic += 1,
                LetterScript::Latin => tally.latin += 1,
                LetterScript::Other => {}
            }
        }
        tally
    }

    fn latin_language(text: &str) -> &'static str {
        let lower = text.to_lowercase();
        if lower.chars().any(|c| VIETNAMESE_MARKS.contains(c)) {
            return "vi";
        }
        if text.chars().any(|c| TURKISH_MARKS.contains(c)) {
            return "tr";
        }
        let words = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>();
        let mut best = ("en", 0usize);
        for (code, stop_words) in STOP_WORDS {
            let stop_words = stop_words.iter().copied().collect::<HashSet<_>>();
            let mut score = words.iter().filter(|w| stop_words.contains(**w)).count() * 2;
            score += match *code {
                "de" => lower.chars().filter(|c| "äöüß".contains(*c)).count(),
                "es" => lower.chars().filter(|c| "ñ¿¡".contains(*c)).count() * 2,
                "fr" => lower.chars().filter(|c| "çèêëœ".contains(*c)).count(),
                "pt" => lower.chars().filter(|c| "ãõ".contains(*c)).count() * 2,
                _ => 0,
            };
            if score > best.1 {
                best = (code, score);
            }
        }
        best.0
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_DETECTABLE_CHARS {
            return None;
        }
        let tally = Self::tally(trimmed);
        // Kana marks Japanese even when kanji outnumber it.
        if tally.kana > 0 && tally.kana + tally.han >= tally.hangul.max(tally.latin) {
            return Some("ja".to_string());
        }
        let candidates = [
            ("ko", tally.hangul),
            ("zh", tally.han),
            ("th", tally.thai),
            ("ru", tally.cyrillic),
            ("latin", tally.latin),
        ];
        let (family, count) = candidates
            .iter()
            .copied()
            .fold(("", 0), |best, next| if next.1 > best.1 { next } else { best });
        if count == 0 {
            return None;
        }
        let code = match family {
            "zh" if trimmed.chars().any(|c| TRADITIONAL_ONLY.contains(c)) => "zh-tw",
            "zh" => "zh-cn",
            "latin" => Self::latin_language(trimmed),
            other => other,
        };
        Some(code.to_string())
    }
}

pub fn detect_column_language(
    sheet: &Sheet,
    column: usize,
    detector: &dyn LanguageDetector,
) -> Option<String> {
    let mut votes: Vec<(String, usize)> = Vec::new();
    for (_, text) in sheet.column(column) {
        if text.trim().chars().count() < MIN_DETECTABLE_CHARS {
            continue;
        }
        let Some(code) = detector.detect(text) else {
            continue;
        };
        match votes.iter_mut().find(|(seen, _)| *seen == code) {
            Some((_, count)) => *count += 1,
            None => votes.push((code, 1)),
        }
    }
    let mut winner: Option<(String, usize)> = None;
    for (code, count) in votes {
        if winner.as_ref().is_none_or(|(_, best)| count > *best) {
            winner = Some((code, count));
        }
    }
    winner.map(|(code, _)| code)
}
