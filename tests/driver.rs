mod common;

use std::collections::{HashMap, HashSet};

use anyhow::{Result, bail};
use cell_census::{
    category::{Category, Script, Structure},
    driver::{self, ReportRow, RowSet, RowValue, RunReport},
    report,
    script::CharAnalyzer,
    source,
    spill::ValueStore,
    words::{ScriptDetector, TokenizerRegistry, WordAnalyzer},
};
use common::{TestWorkspace, read_report};

fn find<'a>(rows: &'a [ReportRow], path: &str, category: &Category) -> &'a ReportRow {
    rows.iter()
        .find(|row| row.path == path && &row.category == category)
        .unwrap_or_else(|| panic!("no row for {path} / {category}"))
}

fn counts(row: &ReportRow) -> Vec<(usize, String)> {
    row.values
        .iter()
        .map(|(column, value)| (*column, value.to_string()))
        .collect()
}

fn char_folder(workspace: &TestWorkspace) {
    workspace.write_csv("a.csv", &[&["Hello", "안녕"], &["Hello", "123"]]);
    workspace.write_csv("sub/b.csv", &[&["Hello world"]]);
    workspace.write("broken.xlsx", b"definitely not a zip archive");
    workspace.write_csv("~$a.csv", &[&["lock file"]]);
    workspace.write_csv("CHAR_COUNT_REPORT_20240101_000000/Summary_real.csv", &[&["old"]]);
    workspace.write_csv(".git/tracked.csv", &[&["ignored"]]);
    workspace.write("notes.txt", b"not a spreadsheet");
}

fn run_chars(workspace: &TestWorkspace, spill_limit: usize) -> RunReport {
    let settings = workspace.settings(spill_limit);
    driver::run(workspace.path(), &settings, &mut CharAnalyzer::new()).expect("run")
}

#[test]
fn character_run_folds_sheets_and_skips_unreadable_files() {
    let workspace = TestWorkspace::new();
    char_folder(&workspace);
    let report = run_chars(&workspace, 100_000);

    assert_eq!(report.files_found, 3);
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "broken.xlsx");
    assert_eq!(report.columns.iter().copied().collect::<Vec<_>>(), vec![0, 1]);

    let alphabet = Category::from(Script::Alphabet);
    let real = find(&report.real, "a.csv", &alphabet);
    assert_eq!(real.sheet_name, "a");
    assert_eq!(real.total, 10);
    assert_eq!(real.status, "Normal");
    assert_eq!(counts(real), vec![(0, "10".into()), (1, "0".into())]);

    let unique = find(&report.unique_for_sheet, "a.csv", &alphabet);
    assert_eq!(unique.total, 5);

    let addresses = find(&report.cell_addresses, "a.csv", &alphabet);
    assert_eq!(addresses.total, 2);
    assert_eq!(
        addresses.values.get(&0),
        Some(&RowValue::Addresses(vec![
            "A1".parse().expect("address"),
            "A2".parse().expect("address"),
        ]))
    );

    let nested = find(&report.real, "sub/b.csv", &alphabet);
    assert_eq!(nested.total, 10);
    assert_eq!(nested.file_name, "b.csv");
}

#[test]
fn folder_unique_sums_characters_over_distinct_texts() {
    let workspace = TestWorkspace::new();
    char_folder(&workspace);
    let report = run_chars(&workspace, 100_000);

    let folder = |script: Script| {
        find(&report.unique_for_folder, "ALL", &Category::from(script)).total
    };
    // "Hello" twice and "Hello world" once.
    assert_eq!(folder(Script::Alphabet), 15);
    assert_eq!(folder(Script::Korean), 2);
    assert_eq!(folder(Script::Number), 3);
    assert_eq!(folder(Script::Special), 0);
    assert_eq!(report.unique_for_folder.len(), Script::ALL.len());
    assert!(report.unique_for_folder.iter().all(|row| row.sheet_name == "ALL"));
}

#[test]
fn spilling_to_disk_does_not_change_folder_figures() {
    let workspace = TestWorkspace::new();
    char_folder(&workspace);
    let in_memory = run_chars(&workspace, 100_000);
    let spilled = run_chars(&workspace, 1);
    assert_eq!(in_memory.unique_for_folder, spilled.unique_for_folder);
    assert_eq!(workspace.leftover_spill_entries(), 0);
}

#[test]
fn data_past_twenty_empty_columns_is_flagged() {
    let workspace = TestWorkspace::new();
    let mut row = vec![""; 22];
    row[0] = "abc";
    row[21] = "abc";
    workspace.write_csv("wide.csv", &[row.as_slice()]);
    let report = run_chars(&workspace, 100_000);

    let real = find(&report.real, "wide.csv", &Category::from(Script::Alphabet));
    assert_eq!(
        real.status,
        "Error: Total characters(6) and column totals(3) do not match"
    );
    assert_eq!(report.columns.iter().copied().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn word_run_counts_tokens_per_column_language() {
    let workspace = TestWorkspace::new();
    workspace.write_csv(
        "words.csv",
        &[&["the cat sat on the mat", "{name} joined"], &["the cat", ""]],
    );
    let settings = workspace.settings(100_000);
    let mut analyzer = WordAnalyzer::new(
        ScriptDetector,
        TokenizerRegistry::with_defaults(&settings.dictionaries),
    );
    let report = driver::run(workspace.path(), &settings, &mut analyzer).expect("run");

    let english = Category::language("en");
    let real = find(&report.real, "words.csv", &english);
    assert_eq!(real.label(), "English");
    assert_eq!(real.glyph, "🌐");
    assert_eq!(real.total, 9);
    assert_eq!(counts(real), vec![(0, "8".into()), (1, "1".into())]);
    assert_eq!(find(&report.unique_for_sheet, "words.csv", &english).total, 8);
    assert_eq!(find(&report.cells, "words.csv", &english).total, 3);

    let brackets = Category::from(Structure::Brackets);
    assert_eq!(find(&report.real, "words.csv", &brackets).total, 1);
    assert_eq!(find(&report.real, "words.csv", &brackets).glyph, "🔧");

    let folder = |category: &Category| find(&report.unique_for_folder, "ALL", category).total;
    // the, cat, sat, on, mat, joined
    assert_eq!(folder(&english), 6);
    assert_eq!(folder(&brackets), 1);
    assert_eq!(folder(&Category::from(Structure::HtmlXml)), 0);
}

#[test]
fn written_report_aligns_rows_to_the_folder_columns() {
    let workspace = TestWorkspace::new();
    workspace.write_csv("left.csv", &[&["abc"]]);
    workspace.write_csv("right.csv", &[&["", "xy"]]);
    let report = run_chars(&workspace, 100_000);
    let out = workspace.path().join("out");
    let written = report::write_report(&report, &out, true).expect("write report");
    assert_eq!(written.len(), RowSet::ALL.len());
    assert!(written[0].ends_with("Summary_real.csv"));

    let rows = read_report(&written[0]);
    assert_eq!(
        rows[0],
        vec![
            "Path", "FileName", "SheetName", "Status", "🏳️", "Char", "TotalChars", "Col A",
            "Col B"
        ]
    );
    let left = rows
        .iter()
        .find(|row| row[0] == "left.csv" && row[5] == "Alphabet")
        .expect("left row");
    assert_eq!(&left[6..], ["3", "3", "0"]);
    let right = rows
        .iter()
        .find(|row| row[0] == "right.csv" && row[5] == "Alphabet")
        .expect("right row");
    assert_eq!(&right[6..], ["2", "0", "2"]);

    let addresses = read_report(&written[3]);
    let right = addresses
        .iter()
        .find(|row| row[0] == "right.csv" && row[5] == "Alphabet")
        .expect("right address row");
    assert_eq!(&right[6..], ["1", "", "B1"]);

    let folder = read_report(&written[2]);
    let alphabet = folder
        .iter()
        .find(|row| row[5] == "Alphabet")
        .expect("folder row");
    assert_eq!(&alphabet[..7], ["ALL", "ALL", "ALL", "Normal", "🇺🇸", "Alphabet", "5"]);
    assert_eq!(&alphabet[7..], ["0", "0"]);
}

/// In-memory store that rejects values containing `refuse` and cannot read
/// back `unreadable`.
#[derive(Default)]
struct FaultyStore {
    values: HashMap<Category, HashSet<String>>,
    refuse: Option<&'static str>,
    unreadable: Option<Category>,
}

impl ValueStore for FaultyStore {
    fn record(&mut self, category: &Category, values: Vec<String>) -> Result<()> {
        if let Some(refuse) = self.refuse
            && values.iter().any(|value| value.contains(refuse))
        {
            bail!("no space left on device");
        }
        self.values.entry(category.clone()).or_default().extend(values);
        Ok(())
    }

    fn distinct_values(&self, category: &Category) -> Result<HashSet<String>> {
        if self.unreadable.as_ref() == Some(category) {
            bail!("spill chunk is truncated");
        }
        Ok(self.values.get(category).cloned().unwrap_or_default())
    }
}

#[test]
fn store_failure_skips_only_the_affected_file() {
    let workspace = TestWorkspace::new();
    workspace.write_csv("a.csv", &[&["Hello"]]);
    workspace.write_csv("b.csv", &[&["fine"], &["rejected"]]);
    workspace.write_csv("c.csv", &[&["world"]]);
    let settings = workspace.settings(100_000);
    let files = source::discover(workspace.path(), &settings).expect("discover");
    let mut store = FaultyStore {
        refuse: Some("rejected"),
        ..FaultyStore::default()
    };

    let report = driver::aggregate(&files, None, &mut CharAnalyzer::new(), &mut store);

    assert_eq!(report.files_found, 3);
    assert_eq!(report.files_processed, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "b.csv");
    assert!(report.skipped[0].reason.contains("Recording values of sheet 'b'"));
    assert!(report.skipped[0].reason.contains("no space left on device"));

    let alphabet = Category::from(Script::Alphabet);
    assert_eq!(find(&report.real, "a.csv", &alphabet).total, 5);
    assert_eq!(find(&report.real, "c.csv", &alphabet).total, 5);
    for set in RowSet::ALL {
        assert!(report.rows(set).iter().all(|row| row.path != "b.csv"));
    }
    // "fine" reached the store before the rejected cell.
    let folder = find(&report.unique_for_folder, "ALL", &alphabet);
    assert_eq!(folder.status, "Normal");
    assert_eq!(folder.total, 14);
}

#[test]
fn unreadable_folder_values_become_a_row_status() {
    let workspace = TestWorkspace::new();
    workspace.write_csv("a.csv", &[&["Hello 123"]]);
    let settings = workspace.settings(100_000);
    let files = source::discover(workspace.path(), &settings).expect("discover");
    let number = Category::from(Script::Number);
    let mut store = FaultyStore {
        unreadable: Some(number.clone()),
        ..FaultyStore::default()
    };

    let report = driver::aggregate(&files, None, &mut CharAnalyzer::new(), &mut store);

    assert_eq!(report.files_processed, 1);
    assert_eq!(find(&report.real, "a.csv", &number).total, 3);
    let failed = find(&report.unique_for_folder, "ALL", &number);
    assert_eq!(failed.status, "Error: spill chunk is truncated");
    assert_eq!(failed.total, 0);
    let alphabet = find(&report.unique_for_folder, "ALL", &Category::from(Script::Alphabet));
    assert_eq!(alphabet.status, "Normal");
    assert_eq!(alphabet.total, 5);
}
