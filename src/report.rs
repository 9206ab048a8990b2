use std::{
    borrow::Cow,
    collections::BTreeSet,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::info;

use crate::{
    address::column_letter,
    category::AnalysisMode,
    driver::{ReportRow, RowSet, RunReport},
    io_utils,
};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub fn report_dir_name(mode: AnalysisMode, timestamp: NaiveDateTime) -> String {
    let prefix = match mode {
        AnalysisMode::Chars => "CHAR_COUNT_REPORT",
        AnalysisMode::Words => "WORD_COUNT_REPORT",
    };
    format!("{prefix}_{}", timestamp.format(TIMESTAMP_FORMAT))
}

pub fn headers(mode: AnalysisMode, set: RowSet, columns: &BTreeSet<usize>) -> Vec<String> {
    let (category, total) = match mode {
        AnalysisMode::Chars => ("Char", "TotalChars"),
        AnalysisMode::Words => ("Category", "TotalWords"),
    };
    let total = if set.counts_cells() { "TotalCells" } else { total };
    ["Path", "FileName", "SheetName", "Status", "🏳️", category, total]
        .into_iter()
        .map(String::from)
        .chain(
            columns
                .iter()
                .map(|column| format!("Col {}", column_letter(*column))),
        )
        .collect()
}

pub fn render_row(row: &ReportRow, set: RowSet, columns: &BTreeSet<usize>) -> Vec<String> {
    let missing = if set == RowSet::CellAddresses { "" } else { "0" };
    [
        row.path.clone(),
        row.file_name.clone(),
        row.sheet_name.clone(),
        row.status.clone(),
        row.glyph.to_string(),
        row.label().to_string(),
        row.total.to_string(),
    ]
    .into_iter()
    .chain(columns.iter().map(|column| {
        row.values
            .get(column)
            .map_or_else(|| missing.to_string(), ToString::to_string)
    }))
    .collect()
}

pub fn write_report(report: &RunReport, dir: &Path, with_bom: bool) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Creating report directory {dir:?}"))?;
    let mut written = Vec::with_capacity(RowSet::ALL.len());
    for set in RowSet::ALL {
        let path = dir.join(format!("{}.csv", set.sheet_name(report.mode)));
        let mut writer = io_utils::open_csv_writer(&path, with_bom)?;
        writer
            .write_record(headers(report.mode, set, &report.columns))
            .with_context(|| format!("Writing header to {path:?}"))?;
        let rows = report.rows(set);
        for row in rows {
            writer
                .write_record(render_row(row, set, &report.columns))
                .with_context(|| format!("Writing row to {path:?}"))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing {path:?}"))?;
        info!("Wrote {} row(s) to {:?}", rows.len(), path);
        written.push(path);
    }
    Ok(written)
}

pub fn render_folder_summary(report: &RunReport) -> String {
    let total = match report.mode {
        AnalysisMode::Chars => "TotalChars",
        AnalysisMode::Words => "TotalWords",
    };
    let headers = ["", "Category", total].map(String::from);
    let rows = report
        .unique_for_folder
        .iter()
        .map(|row| {
            vec![
                row.glyph.to_string(),
                row.label().to_string(),
                row.total.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| display_width(header))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths
        .iter()
        .map(|width| "-".repeat((*width).max(3)))
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &separator_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value
        .chars()
        .map(|ch| match ch as u32 {
            0x200D | 0xFE00..=0xFE0F => 0,
            0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1FAFF => 2,
            _ => 1,
        })
        .sum()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
