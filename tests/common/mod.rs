#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use cell_census::config::Settings;
use tempfile::{TempDir, tempdir};

/// Scratch folder tree that cleans up on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` to `relative`, creating parent folders as needed.
    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent folders");
        }
        fs::write(&path, contents).expect("write temp file");
        path
    }

    /// Writes rows as a CSV file; fields are quoted so commas survive.
    pub fn write_csv(&self, relative: &str, rows: &[&[&str]]) -> PathBuf {
        let mut contents = String::new();
        for row in rows {
            let line = row
                .iter()
                .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
                .collect::<Vec<_>>()
                .join(",");
            contents.push_str(&line);
            contents.push('\n');
        }
        self.write(relative, contents.as_bytes())
    }

    /// Settings whose spill directory lives inside the workspace.
    pub fn settings(&self, spill_limit: usize) -> Settings {
        let spill_dir = self.temp_dir.path().join(".spill");
        fs::create_dir_all(&spill_dir).expect("create spill parent");
        Settings {
            spill_limit,
            spill_dir: Some(spill_dir),
            ..Settings::default()
        }
    }

    /// Entries left under the spill parent created by [`Self::settings`].
    pub fn leftover_spill_entries(&self) -> usize {
        fs::read_dir(self.temp_dir.path().join(".spill"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Reads a report CSV (BOM stripped) into rows of fields.
pub fn read_report(path: &Path) -> Vec<Vec<String>> {
    let bytes = fs::read(path).expect("read report");
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(&bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(bytes);
    reader
        .records()
        .map(|record| {
            record
                .expect("report record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}
