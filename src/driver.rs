use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::Path,
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    address::{CellAddress, join_addresses},
    category::{AnalysisMode, Category},
    config::Settings,
    io_utils,
    scanner::{SheetAnalyzer, SheetScan, SheetStatus, scan_sheet},
    source::{self, Sheet, SourceFile},
    spill::{SpillStore, ValueStore},
};

pub const FOLDER_SCOPE: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSet {
    Real,
    UniqueForSheet,
    UniqueForFolder,
    CellAddresses,
    Cells,
}

impl RowSet {
    pub const ALL: [RowSet; 5] = [
        RowSet::Real,
        RowSet::UniqueForSheet,
        RowSet::UniqueForFolder,
        RowSet::CellAddresses,
        RowSet::Cells,
    ];

    pub fn sheet_name(self, mode: AnalysisMode) -> String {
        let prefix = match mode {
            AnalysisMode::Chars => "Summary",
            AnalysisMode::Words => "Words",
        };
        let suffix = match self {
            RowSet::Real => "real",
            RowSet::UniqueForSheet => "unique_for_Sheet",
            RowSet::UniqueForFolder => "unique_for_Folder",
            RowSet::CellAddresses => "cell_address",
            RowSet::Cells => "cells",
        };
        format!("{prefix}_{suffix}")
    }

    pub fn counts_cells(self) -> bool {
        matches!(self, RowSet::CellAddresses | RowSet::Cells)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowValue {
    Count(usize),
    Addresses(Vec<CellAddress>),
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Count(count) => write!(f, "{count}"),
            RowValue::Addresses(addresses) => f.write_str(&join_addresses(addresses)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub path: String,
    pub file_name: String,
    pub sheet_name: String,
    pub status: String,
    pub glyph: &'static str,
    pub category: Category,
    pub total: usize,
    pub values: BTreeMap<usize, RowValue>,
}

impl ReportRow {
    fn for_sheet(
        file: &SourceFile,
        sheet_name: &str,
        category: &Category,
        status: String,
        values: BTreeMap<usize, RowValue>,
        total: usize,
    ) -> Self {
        Self {
            path: file.relative.clone(),
            file_name: file.file_name.clone(),
            sheet_name: sheet_name.to_string(),
            status,
            glyph: category.glyph(),
            category: category.clone(),
            total,
            values,
        }
    }

    fn for_folder(category: &Category, status: String, total: usize) -> Self {
        Self {
            path: FOLDER_SCOPE.to_string(),
            file_name: FOLDER_SCOPE.to_string(),
            sheet_name: FOLDER_SCOPE.to_string(),
            status,
            glyph: category.glyph(),
            category: category.clone(),
            total,
            values: BTreeMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        self.category.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: AnalysisMode,
    pub real: Vec<ReportRow>,
    pub unique_for_sheet: Vec<ReportRow>,
    pub unique_for_folder: Vec<ReportRow>,
    pub cell_addresses: Vec<ReportRow>,
    pub cells: Vec<ReportRow>,
    pub columns: BTreeSet<usize>,
    pub files_found: usize,
    pub files_processed: usize,
    pub skipped: Vec<SkippedFile>,
}

impl RunReport {
    fn new(mode: AnalysisMode, files_found: usize) -> Self {
        Self {
            mode,
            real: Vec::new(),
            unique_for_sheet: Vec::new(),
            unique_for_folder: Vec::new(),
            cell_addresses: Vec::new(),
            cells: Vec::new(),
            columns: BTreeSet::new(),
            files_found,
            files_processed: 0,
            skipped: Vec::new(),
        }
    }

    pub fn rows(&self, set: RowSet) -> &[ReportRow] {
        match set {
            RowSet::Real => &self.real,
            RowSet::UniqueForSheet => &self.unique_for_sheet,
            RowSet::UniqueForFolder => &self.unique_for_folder,
            RowSet::CellAddresses => &self.cell_addresses,
            RowSet::Cells => &self.cells,
        }
    }

    fn push_sheet(&mut self, file: &SourceFile, sheet_name: &str, scan: &SheetScan) {
        let valid = scan.valid_columns();
        self.columns.extend(valid.iter().copied());
        let normal = SheetStatus::Normal.to_string();
        for category in scan.categories() {
            let (values, _) = counts_by_column(valid, |column| scan.column_units(column, category));
            self.real.push(ReportRow::for_sheet(
                file,
                sheet_name,
                category,
                scan.status(category).to_string(),
                values,
                scan.total(category),
            ));

            let (values, total) =
                counts_by_column(valid, |column| scan.column_distinct_units(column, category));
            self.unique_for_sheet.push(ReportRow::for_sheet(
                file,
                sheet_name,
                category,
                normal.clone(),
                values,
                total,
            ));

            let addresses = valid
                .iter()
                .map(|column| {
                    let found = scan.column_addresses(*column, category).to_vec();
                    (*column, RowValue::Addresses(found))
                })
                .collect::<BTreeMap<_, _>>();
            let (values, total) =
                counts_by_column(valid, |column| scan.column_cells(column, category));
            self.cell_addresses.push(ReportRow::for_sheet(
                file,
                sheet_name,
                category,
                normal.clone(),
                addresses,
                total,
            ));
            self.cells.push(ReportRow::for_sheet(
                file,
                sheet_name,
                category,
                normal.clone(),
                values,
                total,
            ));
        }
    }
}

fn counts_by_column(
    columns: &[usize],
    measure: impl Fn(usize) -> usize,
) -> (BTreeMap<usize, RowValue>, usize) {
    let mut total = 0;
    let values = columns
        .iter()
        .map(|column| {
            let count = measure(*column);
            total += count;
            (*column, RowValue::Count(count))
        })
        .collect();
    (values, total)
}

pub fn run(root: &Path, settings: &Settings, analyzer: &mut dyn SheetAnalyzer) -> Result<RunReport> {
    let files = source::discover(root, settings)?;
    info!("Found {} spreadsheet file(s) under {:?}", files.len(), root);
    run_files(&files, settings, analyzer)
}

pub fn run_files(
    files: &[SourceFile],
    settings: &Settings,
    analyzer: &mut dyn SheetAnalyzer,
) -> Result<RunReport> {
    let encoding = io_utils::resolve_encoding(settings.csv_encoding.as_deref())?;
    let mut store = SpillStore::create(settings.spill_dir.as_deref(), settings.spill_limit)?;
    let report = aggregate(files, encoding, analyzer, &mut store);
    store.cleanup();
    Ok(report)
}

/// Scans `files` into a report, recording folder-wide values in `store`.
///
/// A file is skipped when it cannot be loaded or when `store` rejects one of
/// its values; its sheet rows are dropped but values it already recorded stay
/// in `store`. A category whose folder-wide values cannot be read back gets an
/// error status instead of aborting the run.
pub fn aggregate<S>(
    files: &[SourceFile],
    encoding: Option<&'static Encoding>,
    analyzer: &mut dyn SheetAnalyzer,
    store: &mut S,
) -> RunReport
where
    S: ValueStore + ?Sized,
{
    let mut report = RunReport::new(analyzer.mode(), files.len());
    let mut folder_categories = BTreeSet::new();

    for (index, file) in files.iter().enumerate() {
        info!("Processing {} ({}/{})", file.relative, index + 1, files.len());
        let scans = match scan_file(file, encoding, &mut *analyzer, &mut *store) {
            Ok(scans) => scans,
            Err(err) => {
                warn!("Skipping {}: {err:#}", file.relative);
                report.skipped.push(SkippedFile {
                    path: file.relative.clone(),
                    reason: format!("{err:#}"),
                });
                continue;
            }
        };
        for (sheet_name, scan) in &scans {
            folder_categories.extend(scan.categories().iter().cloned());
            report.push_sheet(file, sheet_name, scan);
        }
        report.files_processed += 1;
    }

    for category in &folder_categories {
        let row = match store.distinct_values(category) {
            Ok(values) => {
                let total = analyzer.folder_measure(category, &values);
                debug!(
                    "Folder-wide '{}': {} distinct value(s), measure {}",
                    category,
                    values.len(),
                    total
                );
                ReportRow::for_folder(category, SheetStatus::Normal.to_string(), total)
            }
            Err(err) => {
                warn!("Folder-wide values for '{category}' are unavailable: {err:#}");
                ReportRow::for_folder(category, format!("Error: {err:#}"), 0)
            }
        };
        report.unique_for_folder.push(row);
    }

    info!(
        "Processed {}/{} file(s), {} skipped",
        report.files_processed,
        report.files_found,
        report.skipped.len()
    );
    report
}

fn scan_file<S>(
    file: &SourceFile,
    encoding: Option<&'static Encoding>,
    analyzer: &mut dyn SheetAnalyzer,
    store: &mut S,
) -> Result<Vec<(String, SheetScan)>>
where
    S: ValueStore + ?Sized,
{
    let sheets = source::load_sheets(&file.path, encoding)?;
    let mut scans = Vec::with_capacity(sheets.len());
    for sheet in sheets {
        let scan = scan_one(&sheet, &mut *analyzer, &mut *store)
            .with_context(|| format!("Recording values of sheet '{}'", sheet.name))?;
        scans.push((sheet.name, scan));
    }
    Ok(scans)
}

fn scan_one<S>(sheet: &Sheet, analyzer: &mut dyn SheetAnalyzer, store: &mut S) -> Result<SheetScan>
where
    S: ValueStore + ?Sized,
{
    debug!(
        "Scanning sheet '{}' ({} x {})",
        sheet.name,
        sheet.height(),
        sheet.width()
    );
    scan_sheet(sheet, analyzer, |category, values| store.record(category, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_set_names_follow_mode() {
        assert_eq!(RowSet::Real.sheet_name(AnalysisMode::Chars), "Summary_real");
        assert_eq!(
            RowSet::UniqueForFolder.sheet_name(AnalysisMode::Words),
            "Words_unique_for_Folder"
        );
        assert!(RowSet::Cells.counts_cells());
        assert!(!RowSet::UniqueForSheet.counts_cells());
    }

    #[test]
    fn address_values_render_comma_joined() {
        let value = RowValue::Addresses(vec![CellAddress::new(8, 0), CellAddress::new(9, 0)]);
        assert_eq!(value.to_string(), "A9, A10");
        assert_eq!(RowValue::Count(4).to_string(), "4");
    }
}
