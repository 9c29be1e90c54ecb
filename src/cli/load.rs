use std::path::PathBuf;

use crate::error::Result;
use crate::fmt::number;
use crate::loader::{self, DEFAULT_SHEET};
use crate::settings::{load_settings, save_settings, shellexpand_path};

/// Point the settings at another workbook, after checking it loads.
pub fn run(path: &str, sheet: Option<String>) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));
    let sheet = sheet.unwrap_or_else(|| DEFAULT_SHEET.to_string());

    let loaded = loader::load(&resolved, &sheet)?;

    let mut settings = load_settings();
    settings.source_file = resolved.to_string_lossy().to_string();
    settings.sheet_name = sheet;
    save_settings(&settings)?;

    println!(
        "Switched to {} ({} records)",
        resolved.display(),
        number(loaded.dataset.len())
    );
    Ok(())
}
