mod common;

use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::Command;
use common::{TestWorkspace, read_report};
use predicates::str::contains;

fn report_dirs(parent: &Path, prefix: &str) -> Vec<PathBuf> {
    fs::read_dir(parent)
        .expect("read output parent")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
        })
        .collect()
}

fn sample_folder() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    workspace.write_csv("strings.csv", &[&["Hello", "안녕하세요"], &["the cat sat", "감사합니다"]]);
    workspace.write_csv("nested/more.csv", &[&["Hello again"]]);
    workspace
}

#[test]
fn character_run_writes_timestamped_report_next_to_input() {
    let workspace = sample_folder();
    Command::cargo_bin("cell-census")
        .expect("binary exists")
        .write_stdin("")
        .args(["--mode", "chars", "--lang", "en"])
        .arg(workspace.path())
        .assert()
        .success()
        .stdout(contains("files detected: 2"))
        .stdout(contains("Report saved"))
        .stdout(contains("Alphabet"));

    let dirs = report_dirs(workspace.path(), "CHAR_COUNT_REPORT_");
    assert_eq!(dirs.len(), 1);
    for name in [
        "Summary_real.csv",
        "Summary_unique_for_Sheet.csv",
        "Summary_unique_for_Folder.csv",
        "Summary_cell_address.csv",
        "Summary_cells.csv",
    ] {
        assert!(dirs[0].join(name).is_file(), "missing {name}");
    }
    let rows = read_report(&dirs[0].join("Summary_real.csv"));
    assert_eq!(rows[0][6], "TotalChars");
    assert!(rows.iter().any(|row| row[0] == "nested/more.csv"));
}

#[test]
fn second_run_ignores_the_previous_report() {
    let workspace = sample_folder();
    for _ in 0..2 {
        Command::cargo_bin("cell-census")
            .expect("binary exists")
            .write_stdin("")
            .args(["--mode", "chars", "--lang", "en"])
            .arg(workspace.path())
            .assert()
            .success()
            .stdout(contains("files detected: 2"));
        // Report folders are named to the second.
        std::thread::sleep(std::time::Duration::from_millis(1_100));
    }
    assert_eq!(report_dirs(workspace.path(), "CHAR_COUNT_REPORT_").len(), 2);
}

#[test]
fn non_interactive_run_uses_korean_and_character_defaults() {
    let workspace = sample_folder();
    Command::cargo_bin("cell-census")
        .expect("binary exists")
        .arg(workspace.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(contains("보고서 저장됨"));
    assert_eq!(report_dirs(workspace.path(), "CHAR_COUNT_REPORT_").len(), 1);
}

#[test]
fn word_run_honours_output_directory() {
    let workspace = sample_folder();
    let output = TestWorkspace::new();
    Command::cargo_bin("cell-census")
        .expect("binary exists")
        .write_stdin("")
        .args(["--mode", "words", "--lang", "en", "--output"])
        .arg(output.path())
        .arg(workspace.path())
        .assert()
        .success()
        .stdout(contains("English"));

    assert!(report_dirs(workspace.path(), "WORD_COUNT_REPORT_").is_empty());
    let dirs = report_dirs(output.path(), "WORD_COUNT_REPORT_");
    assert_eq!(dirs.len(), 1);
    let rows = read_report(&dirs[0].join("Words_real.csv"));
    assert_eq!(rows[0][5], "Category");
    assert_eq!(rows[0][6], "TotalWords");
}

#[test]
fn missing_root_fails_with_error_message() {
    let workspace = TestWorkspace::new();
    Command::cargo_bin("cell-census")
        .expect("binary exists")
        .write_stdin("")
        .args(["--mode", "chars", "--lang", "en"])
        .arg(workspace.path().join("absent"))
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("is not a directory"));
}

#[test]
fn invalid_settings_file_is_rejected() {
    let workspace = sample_folder();
    let config = workspace.write("settings.yml", b"spill_limit: 0\n");
    Command::cargo_bin("cell-census")
        .expect("binary exists")
        .write_stdin("")
        .args(["--mode", "chars", "--lang", "en", "--config"])
        .arg(&config)
        .arg(workspace.path())
        .assert()
        .failure()
        .stderr(contains("spill_limit must be greater than zero"));
}
