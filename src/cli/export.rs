use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::{open_filtered, print_load_notes, FilterArgs, Source};
use crate::error::{CostError, Result};
use crate::fmt::number;
use crate::models::Dataset;
use crate::settings::{shellexpand_path, Settings};
use crate::xlsx;

/// `<export_dir>/dados_completos_custos_YYYYMMDD_HHMM.xlsx` for the current time.
pub fn default_path(export_dir: &str) -> PathBuf {
    let now = chrono::Local::now().naive_local();
    PathBuf::from(shellexpand_path(export_dir)).join(xlsx::export_file_name(now))
}

/// Write `dataset` to `path`. Returns `None` without touching the disk when
/// there is nothing to export.
pub fn export_dataset(dataset: &Dataset, path: &Path) -> Result<Option<usize>> {
    if dataset.is_empty() {
        return Ok(None);
    }
    xlsx::write(dataset, path)?;
    Ok(Some(dataset.len()))
}

pub fn run(filters: &FilterArgs, output: Option<String>, source: &Source, settings: &Settings) -> Result<()> {
    let session = open_filtered(source, filters)?;
    if let Some(error) = &session.outcome().error {
        return Err(CostError::Load(error.clone()));
    }
    print_load_notes(&session);

    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_path(&settings.export_dir));
    match export_dataset(&session.filtered(), &path)? {
        Some(count) => println!(
            "Exported {} records to {}",
            number(count).bold(),
            path.display()
        ),
        None => println!("{}", "No records match the current filters; nothing exported.".yellow()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_uses_export_dir() {
        let path = default_path("/tmp/exports");
        assert!(path.starts_with("/tmp/exports"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("dados_completos_custos_"));
        assert!(name.ends_with(".xlsx"));
    }

    #[test]
    fn test_empty_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        assert_eq!(export_dataset(&Dataset::default(), &path).unwrap(), None);
        assert!(!path.exists());
    }
}
