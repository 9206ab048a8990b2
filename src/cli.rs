use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    category::AnalysisMode,
    i18n::{Message, UiLanguage, t},
};

#[derive(Debug, Parser)]
#[command(
    name = "cell-census",
    author,
    version,
    about = "Count characters or words per script and language across a folder of spreadsheets",
    long_about = None
)]
pub struct Cli {
    /// Folder to scan recursively (defaults to the current directory)
    pub root: Option<PathBuf>,
    /// Unit to count; prompts when omitted on a terminal
    #[arg(short, long, value_enum)]
    pub mode: Option<AnalysisMode>,
    /// Console language; prompts when omitted on a terminal
    #[arg(short, long, value_enum)]
    pub lang: Option<UiLanguage>,
    /// Directory that receives the timestamped report folder (defaults to ROOT)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Distinct values held in memory per category before spilling to disk
    #[arg(long, value_parser = parse_spill_limit)]
    pub spill_limit: Option<usize>,
}

pub fn parse_spill_limit(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("Spill limit must be greater than zero".to_string()),
        Ok(limit) => Ok(limit),
        Err(err) => Err(format!("Invalid spill limit '{value}': {err}")),
    }
}

/// Numeric menu answer: `1` or `2`, anything else is invalid.
fn read_choice<R: BufRead>(input: &mut R) -> Result<Option<u8>> {
    let mut line = String::new();
    input.read_line(&mut line).context("Reading menu choice")?;
    Ok(match line.trim() {
        "1" => Some(1),
        "2" => Some(2),
        _ => None,
    })
}

/// Asks for the console language. Invalid answers fall back to Korean.
pub fn prompt_language<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<UiLanguage> {
    let language = UiLanguage::Ko;
    writeln!(output, "{}", t(Message::SelectLanguage, language))?;
    writeln!(output, "{}", t(Message::LanguageKorean, language))?;
    writeln!(output, "{}", t(Message::LanguageEnglish, language))?;
    write!(output, "{}", t(Message::Choice, language))?;
    output.flush()?;
    Ok(match read_choice(input)? {
        Some(1) => UiLanguage::Ko,
        Some(2) => UiLanguage::En,
        _ => {
            writeln!(output, "{}", t(Message::InvalidLanguage, language))?;
            UiLanguage::default()
        }
    })
}

/// Asks for the analysis mode. Invalid answers fall back to characters.
pub fn prompt_mode<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    language: UiLanguage,
) -> Result<AnalysisMode> {
    writeln!(output, "{}", t(Message::SelectMode, language))?;
    writeln!(output, "{}", t(Message::ModeChars, language))?;
    writeln!(output, "{}", t(Message::ModeWords, language))?;
    write!(output, "{}", t(Message::Choice, language))?;
    output.flush()?;
    Ok(match read_choice(input)? {
        Some(1) => AnalysisMode::Chars,
        Some(2) => AnalysisMode::Words,
        _ => {
            writeln!(output, "{}", t(Message::InvalidMode, language))?;
            AnalysisMode::default()
        }
    })
}
