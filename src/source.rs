use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use encoding_rs::Encoding;
use log::{debug, warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::{config::Settings, io_utils};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unsupported file type {0:?}")]
    Unsupported(PathBuf),
    #[error("Opening workbook {path:?}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("Reading sheet '{sheet}' of {path:?}")]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("Reading CSV {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<Option<String>>>,
    width: usize,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            width: 0,
        }
    }

    pub fn from_rows<R, C, S>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sheet = Sheet::new(name);
        for (row, cells) in rows.into_iter().enumerate() {
            for (column, text) in cells.into_iter().enumerate() {
                sheet.set(row, column, text.as_ref());
            }
            if sheet.rows.len() <= row {
                sheet.rows.resize_with(row + 1, Vec::new);
            }
        }
        sheet
    }

    pub fn set(&mut self, row: usize, column: usize, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize(column + 1, None);
        }
        cells[column] = Some(text.to_string());
        self.width = self.width.max(column + 1);
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .and_then(|cell| cell.as_deref())
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(column, cell)| cell.as_deref().map(|text| (row, column, text)))
        })
    }

    pub fn column(&self, column: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(move |(row, cells)| cells.get(column)?.as_deref().map(|text| (row, text)))
    }
}

pub trait TabularSource {
    fn sheet_names(&self) -> Vec<String>;
    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError>;
}

pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let workbook = open_workbook_auto(path).map_err(|source| SourceError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl TabularSource for WorkbookSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_owned()
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError> {
        let range = self
            .workbook
            .worksheet_range(name)
            .map_err(|source| SourceError::Sheet {
                path: self.path.clone(),
                sheet: name.to_string(),
                source,
            })?;
        // Ranges start at the first used cell, not A1.
        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        let mut sheet = Sheet::new(name);
        for (row, column, cell) in range.cells() {
            if let Some(text) = cell_text(cell) {
                sheet.set(row_offset as usize + row, col_offset as usize + column, &text);
            }
        }
        Ok(sheet)
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub struct CsvSource {
    sheet: Sheet,
}

impl CsvSource {
    pub fn open(path: &Path, encoding: Option<&'static Encoding>) -> Result<Self, SourceError> {
        let csv_error = |source: anyhow::Error| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());
        let mut reader = io_utils::open_csv_reader(path, encoding).map_err(csv_error)?;
        let mut sheet = Sheet::new(name);
        for (row, record) in reader.records().enumerate() {
            let record = record
                .map_err(|err| csv_error(anyhow::Error::new(err).context(format!("Row {}", row + 1))))?;
            for (column, field) in record.iter().enumerate() {
                sheet.set(row, column, field);
            }
        }
        Ok(Self { sheet })
    }
}

impl TabularSource for CsvSource {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.name.clone()]
    }

    fn read_sheet(&mut self, name: &str) -> Result<Sheet, SourceError> {
        if name == self.sheet.name {
            Ok(self.sheet.clone())
        } else {
            Ok(Sheet::new(name))
        }
    }
}

pub fn open_source(
    path: &Path,
    encoding: Option<&'static Encoding>,
) -> Result<Box<dyn TabularSource>, SourceError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") | Some("tsv") => Ok(Box::new(CsvSource::open(path, encoding)?)),
        Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("xla") | Some("ods") => {
            Ok(Box::new(WorkbookSource::open(path)?))
        }
        _ => Err(SourceError::Unsupported(path.to_path_buf())),
    }
}

pub fn load_sheets(
    path: &Path,
    encoding: Option<&'static Encoding>,
) -> Result<Vec<Sheet>, SourceError> {
    let mut source = open_source(path, encoding)?;
    source
        .sheet_names()
        .iter()
        .map(|name| source.read_sheet(name))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative: String,
    pub file_name: String,
}

pub fn discover(root: &Path, settings: &Settings) -> anyhow::Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("Scan root {root:?} is not a directory");
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_excluded_dir(&entry.file_name().to_string_lossy(), settings)
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {root:?}: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !is_candidate_file(&file_name, settings) {
            debug!("Ignoring {:?}", entry.path());
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        files.push(SourceFile {
            path: entry.path().to_path_buf(),
            relative,
            file_name,
        });
    }
    Ok(files)
}

fn is_excluded_dir(name: &str, settings: &Settings) -> bool {
    settings.excluded_dirs.iter().any(|excluded| excluded == name)
        || name.contains(&settings.report_marker)
}

fn is_candidate_file(name: &str, settings: &Settings) -> bool {
    if name.contains(&settings.report_marker) || name.starts_with(&settings.lock_prefix) {
        return false;
    }
    let Some((_, extension)) = name.rsplit_once('.') else {
        return false;
    };
    settings
        .extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(extension))
}
