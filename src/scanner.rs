//! Cell Scanner.
//!
//! [`scan_sheet`] walks one sheet cell by cell through a [`SheetAnalyzer`] and
//! builds four parallel aggregations keyed by category × column: unit counts,
//! unit counts over distinct texts, matched cell addresses and matched cell
//! counts. Column validity is decided afterwards from the unit counts.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use anyhow::Result;

use crate::{
    address::CellAddress,
    category::{AnalysisMode, Category},
    source::Sheet,
};

/// Column scanning stops after this many consecutive columns with no units.
/// Data to the right of such a gap is left out of every per-column view.
pub const EMPTY_COLUMN_CUTOFF: usize = 20;

/// Classification of one non-empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellReading {
    /// Units (characters or words) per category.
    pub units: Vec<(Category, usize)>,
    /// Units counted once per distinct unit within this text.
    pub distinct_units: Vec<(Category, usize)>,
    /// Values forwarded to the folder-wide distinct store.
    pub folder_values: Vec<(Category, Vec<String>)>,
}

/// Mode-specific classification plugged into the scanner.
pub trait SheetAnalyzer {
    fn mode(&self) -> AnalysisMode;

    /// Called once per sheet before any cell is read; returns the categories
    /// reported for the sheet, in report order.
    fn prepare(&mut self, sheet: &Sheet) -> Vec<Category>;

    fn read_cell(&self, column: usize, text: &str) -> CellReading;

    /// Folder-wide figure for `category` given every distinct value fed for it.
    fn folder_measure(&self, category: &Category, values: &HashSet<String>) -> usize;
}

#[derive(Debug, Clone, Default)]
struct ColumnTally {
    units: BTreeMap<Category, usize>,
    distinct_units: BTreeMap<Category, usize>,
    addresses: BTreeMap<Category, Vec<CellAddress>>,
}

impl ColumnTally {
    fn total(&self) -> usize {
        self.units.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetStatus {
    Normal,
    Mismatch {
        noun: &'static str,
        total: usize,
        columns: usize,
    },
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStatus::Normal => f.write_str("Normal"),
            SheetStatus::Mismatch {
                noun,
                total,
                columns,
            } => write!(
                f,
                "Error: Total {noun}({total}) and column totals({columns}) do not match"
            ),
        }
    }
}

/// Result of scanning one sheet.
#[derive(Debug, Clone)]
pub struct SheetScan {
    mode: AnalysisMode,
    categories: Vec<Category>,
    totals: BTreeMap<Category, usize>,
    columns: Vec<ColumnTally>,
    valid_columns: Vec<usize>,
}

impl SheetScan {
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Columns with at least one unit, left to right, up to the empty-column cutoff.
    pub fn valid_columns(&self) -> &[usize] {
        &self.valid_columns
    }

    /// Units of `category` over every cell of the sheet, cut-off columns included.
    pub fn total(&self, category: &Category) -> usize {
        self.totals.get(category).copied().unwrap_or(0)
    }

    pub fn column_units(&self, column: usize, category: &Category) -> usize {
        self.columns
            .get(column)
            .and_then(|tally| tally.units.get(category))
            .copied()
            .unwrap_or(0)
    }

    pub fn column_distinct_units(&self, column: usize, category: &Category) -> usize {
        self.columns
            .get(column)
            .and_then(|tally| tally.distinct_units.get(category))
            .copied()
            .unwrap_or(0)
    }

    /// Matched cells of one column, sorted by row.
    pub fn column_addresses(&self, column: usize, category: &Category) -> &[CellAddress] {
        self.columns
            .get(column)
            .and_then(|tally| tally.addresses.get(category))
            .map_or(&[], Vec::as_slice)
    }

    pub fn column_cells(&self, column: usize, category: &Category) -> usize {
        self.column_addresses(column, category).len()
    }

    /// Sum of `category`'s units over the valid columns only.
    pub fn valid_total(&self, category: &Category) -> usize {
        self.valid_columns
            .iter()
            .map(|column| self.column_units(*column, category))
            .sum()
    }

    pub fn status(&self, category: &Category) -> SheetStatus {
        let total = self.total(category);
        let columns = self.valid_total(category);
        if total == columns {
            SheetStatus::Normal
        } else {
            SheetStatus::Mismatch {
                noun: self.mode.unit_noun(),
                total,
                columns,
            }
        }
    }
}

/// Indices of valid columns given each column's unit total.
pub fn valid_columns<I>(column_totals: I) -> Vec<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut valid = Vec::new();
    let mut empty_run = 0;
    for (column, total) in column_totals.into_iter().enumerate() {
        if total > 0 {
            valid.push(column);
            empty_run = 0;
        } else {
            empty_run += 1;
            if empty_run >= EMPTY_COLUMN_CUTOFF {
                break;
            }
        }
    }
    valid
}

/// Scans `sheet`, handing every cell's folder values to `feed` as they are read.
pub fn scan_sheet<A, F>(sheet: &Sheet, analyzer: &mut A, mut feed: F) -> Result<SheetScan>
where
    A: SheetAnalyzer + ?Sized,
    F: FnMut(&Category, Vec<String>) -> Result<()>,
{
    let categories = analyzer.prepare(sheet);
    let mut totals = categories
        .iter()
        .map(|category| (category.clone(), 0))
        .collect::<BTreeMap<_, _>>();
    let mut columns = vec![ColumnTally::default(); sheet.width()];
    let mut seen_in_column: Vec<HashSet<&str>> = vec![HashSet::new(); sheet.width()];

    for (row, column, text) in sheet.cells() {
        let reading = analyzer.read_cell(column, text);
        let tally = &mut columns[column];
        for (category, units) in reading.units {
            if units == 0 {
                continue;
            }
            *totals.entry(category.clone()).or_default() += units;
            *tally.units.entry(category.clone()).or_default() += units;
            tally
                .addresses
                .entry(category)
                .or_default()
                .push(CellAddress::new(row, column));
        }
        if seen_in_column[column].insert(text) {
            for (category, units) in reading.distinct_units {
                *tally.distinct_units.entry(category).or_default() += units;
            }
        }
        for (category, values) in reading.folder_values {
            feed(&category, values)?;
        }
    }

    for tally in &mut columns {
        for addresses in tally.addresses.values_mut() {
            addresses.sort();
        }
    }
    let valid_columns = valid_columns(columns.iter().map(ColumnTally::total));

    Ok(SheetScan {
        mode: analyzer.mode(),
        categories,
        totals,
        columns,
        valid_columns,
    })
}
