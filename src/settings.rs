use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CostError, Result};
use crate::loader::{DEFAULT_SHEET, DEFAULT_SOURCE};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Workbook (or csv) with the cost records.
    pub source_file: String,
    pub sheet_name: String,
    /// Where `export` writes when no `--output` is given.
    pub export_dir: String,
    /// Dealers shown in the dealer chart/ranking; `None` shows all.
    pub dealer_top_n: Option<usize>,
    /// `tracing` filter directive, e.g. `warn` or `scania_costs=debug`.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_file: DEFAULT_SOURCE.to_string(),
            sheet_name: DEFAULT_SHEET.to_string(),
            export_dir: ".".to_string(),
            dealer_top_n: None,
            log_level: "warn".to_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("scania-costs")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn parse_settings(content: &str) -> Settings {
    serde_json::from_str(content).unwrap_or_default()
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        parse_settings(&content)
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CostError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            source_file: "/tmp/custos.xlsx".to_string(),
            sheet_name: "Plan1".to_string(),
            export_dir: "/tmp/exports".to_string(),
            dealer_top_n: Some(10),
            log_level: "debug".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_settings(&content), settings);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.source_file, "consolidado.xlsx");
        assert_eq!(s.sheet_name, "OFICIAL TABLE | DATE");
        assert_eq!(s.dealer_top_n, None);
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let s = parse_settings(r#"{"source_file": "/data/custos.xlsx", "dealer_top_n": 5}"#);
        assert_eq!(s.source_file, "/data/custos.xlsx");
        assert_eq!(s.dealer_top_n, Some(5));
        assert_eq!(s.sheet_name, "OFICIAL TABLE | DATE");
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        assert_eq!(parse_settings("{not json"), Settings::default());
    }

    #[test]
    fn test_shellexpand_keeps_unknown_paths() {
        assert_eq!(shellexpand_path("/definitely/not/here.xlsx"), "/definitely/not/here.xlsx");
    }
}
