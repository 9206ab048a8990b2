pub mod address;
pub mod category;
pub mod cli;
pub mod config;
pub mod driver;
pub mod i18n;
pub mod io_utils;
pub mod report;
pub mod scanner;
pub mod script;
pub mod source;
pub mod spill;
pub mod words;

use std::{
    env,
    io::{self, IsTerminal},
    path::PathBuf,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    category::AnalysisMode,
    cli::Cli,
    config::Settings,
    i18n::{Message, UiLanguage, t},
    scanner::SheetAnalyzer,
    script::CharAnalyzer,
    words::{ScriptDetector, TokenizerRegistry, WordAnalyzer},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("cell_census", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    execute(&cli)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            Settings::load(path).with_context(|| format!("Loading settings from {path:?}"))?
        }
        None => Settings::default(),
    };
    if let Some(limit) = cli.spill_limit {
        settings.spill_limit = limit;
    }
    settings.validate()?;
    debug!("Settings: {settings:?}");
    Ok(settings)
}

pub fn analyzer_for(mode: AnalysisMode, settings: &Settings) -> Box<dyn SheetAnalyzer> {
    match mode {
        AnalysisMode::Chars => Box::new(CharAnalyzer::new()),
        AnalysisMode::Words => Box::new(WordAnalyzer::new(
            ScriptDetector,
            TokenizerRegistry::with_defaults(&settings.dictionaries),
        )),
    }
}

fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let interactive = io::stdin().is_terminal();
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();

    let language = match cli.lang {
        Some(language) => language,
        None if interactive => cli::prompt_language(&mut stdin, &mut stdout)?,
        None => UiLanguage::default(),
    };
    let mode = match cli.mode {
        Some(mode) => mode,
        None if interactive => cli::prompt_mode(&mut stdin, &mut stdout, language)?,
        None => AnalysisMode::default(),
    };

    let root = match &cli.root {
        Some(root) => root.clone(),
        None => env::current_dir().context("Resolving the current directory")?,
    };
    let output_parent = cli.output.clone().unwrap_or_else(|| root.clone());
    let report_dir: PathBuf =
        output_parent.join(report::report_dir_name(mode, Local::now().naive_local()));
    println!("{}: {}", t(Message::ScanRoot, language), root.display());
    println!("{}: {}", t(Message::ReportPath, language), report_dir.display());
    info!("Counting {} under {:?}", mode.unit_noun(), root);

    let files = source::discover(&root, &settings)?;
    println!("{}: {}", t(Message::FilesDetected, language), files.len());
    println!("{}", t(Message::StopHint, language));

    let mut analyzer = analyzer_for(mode, &settings);
    let report = driver::run_files(&files, &settings, analyzer.as_mut())?;
    for skipped in &report.skipped {
        println!(
            "{}: {} {}: {}",
            t(Message::Caution, language),
            skipped.path,
            t(Message::CausedError, language),
            skipped.reason
        );
    }
    println!(
        "{}: {}/{}",
        t(Message::FilesCompleted, language),
        report.files_processed,
        report.files_found
    );

    println!("{}", t(Message::GeneratingReport, language));
    report::write_report(&report, &report_dir, settings.report_bom)?;
    println!("{}: {}", t(Message::ReportSaved, language), report_dir.display());
    println!();
    println!("{}", t(Message::FolderSummary, language));
    print!("{}", report::render_folder_summary(&report));
    Ok(())
}
