use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("Invalid date: {0} (expected YYYY-MM-DD or DD/MM/YYYY)")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CostError>;

/// Why a source file produced no dataset. The session keeps going with an
/// empty dataset and shows these to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Sheet '{sheet}' not found (available: {})", .available.join(", "))]
    SheetNotFound { sheet: String, available: Vec<String> },

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Could not read {}: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
}

impl LoadError {
    /// Remediation hints shown under the error message.
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::FileNotFound(path) => vec![
                format!("Check that '{}' exists and is readable.", path.display()),
                "Point to another file with --file or `scania-costs load <path>`.".to_string(),
            ],
            Self::SheetNotFound { sheet, .. } => vec![
                format!("The workbook needs a sheet named '{sheet}'."),
                "Pick another sheet with --sheet or `scania-costs load <path> --sheet <name>`."
                    .to_string(),
            ],
            Self::MissingColumns(_) => vec![
                "Check that the header row uses the expected column names (e.g. VALOR, DATA VENCIMENTO)."
                    .to_string(),
                "The header must be the first row of the sheet.".to_string(),
            ],
            Self::Unreadable { .. } => vec![
                "Make sure the file is a valid .xlsx/.xls/.ods or .csv and is not corrupted."
                    .to_string(),
                "Close the file in other programs and try again.".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_not_found_lists_available() {
        let err = LoadError::SheetNotFound {
            sheet: "OFICIAL TABLE | DATE".to_string(),
            available: vec!["Plan1".to_string(), "Plan2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Sheet 'OFICIAL TABLE | DATE' not found (available: Plan1, Plan2)"
        );
        assert!(err.hints()[0].contains("OFICIAL TABLE | DATE"));
    }

    #[test]
    fn test_load_error_wraps_into_cost_error() {
        let err: CostError = LoadError::MissingColumns(vec!["VALOR".to_string()]).into();
        assert_eq!(err.to_string(), "Missing required columns: VALOR");
    }
}
