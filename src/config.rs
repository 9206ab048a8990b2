use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::spill::DEFAULT_SPILL_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub spill_limit: usize,
    pub spill_dir: Option<PathBuf>,
    pub extensions: Vec<String>,
    pub excluded_dirs: Vec<String>,
    pub report_marker: String,
    pub lock_prefix: String,
    pub csv_encoding: Option<String>,
    pub report_bom: bool,
    pub dictionaries: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spill_limit: DEFAULT_SPILL_LIMIT,
            spill_dir: None,
            extensions: ["xlsx", "xlsm", "xls", "xlsb", "ods", "csv"]
                .map(String::from)
                .to_vec(),
            excluded_dirs: [".git", "__pycache__", ".svn", ".hg", "node_modules", "target"]
                .map(String::from)
                .to_vec(),
            report_marker: "REPORT_".to_string(),
            lock_prefix: "~$".to_string(),
            csv_encoding: None,
            report_bom: true,
            dictionaries: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Reading settings file {path:?}"))?;
        let settings: Settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("Parsing settings file {path:?}"))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.spill_limit > 0, "spill_limit must be greater than zero");
        ensure!(
            !self.report_marker.is_empty(),
            "report_marker must not be empty"
        );
        ensure!(
            !self.extensions.is_empty(),
            "At least one file extension must be configured"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.yml");
        fs::write(
            &path,
            "spill_limit: 10\ndictionaries:\n  zh-cn: [你好, 世界]\n",
        )
        .expect("write settings");
        let settings = Settings::load(&path).expect("load settings");
        assert_eq!(settings.spill_limit, 10);
        assert_eq!(settings.report_marker, "REPORT_");
        assert_eq!(settings.dictionaries["zh-cn"], vec!["你好", "世界"]);
    }

    #[test]
    fn zero_spill_limit_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.yml");
        fs::write(&path, "spill_limit: 0\n").expect("write settings");
        assert!(Settings::load(&path).is_err());
    }
}
