use std::collections::BTreeSet;
use std::path::Path;

use calamine::{Data, Reader};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::error::LoadError;
use crate::models::{Dataset, Field, Record};

pub const DEFAULT_SOURCE: &str = "consolidado.xlsx";
pub const DEFAULT_SHEET: &str = "OFICIAL TABLE | DATE";

/// Columns without which the sheet cannot be used at all.
const REQUIRED_FIELDS: &[Field] = &[Field::Amount];

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

/// Source-format-neutral cell, so xlsx and csv rows share one normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                CellValue::Text(s.clone())
            }
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
                .map(CellValue::Date)
                .unwrap_or(CellValue::Empty),
        }
    }
}

impl CellValue {
    fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Strict numeric coercion: anything that is not a finite number is `None`.
    pub fn as_amount(&self) -> Option<f64> {
        let value = match self {
            CellValue::Number(f) => *f,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Empty | CellValue::Date(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Number(f) => excel_serial_to_date(*f),
            CellValue::Text(s) => parse_date_dayfirst(s),
            CellValue::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            CellValue::Number(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    Some(format!("{}", *f as i64))
                } else {
                    Some(f.to_string())
                }
            }
            CellValue::Date(d) => Some(d.format("%d/%m/%Y").to_string()),
        }
    }
}

/// Parse a date written day-first (`15/01/2023`, `15-01-23`, `15.01.2023`),
/// or ISO (`2023-01-15`). A trailing time part is ignored.
pub fn parse_date_dayfirst(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next()?;
    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let (y, m, d) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else {
        (parts[2], parts[1], parts[0])
    };
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    let mut year: i32 = y.parse().ok()?;
    if y.len() == 2 {
        year += if year < 69 { 2000 } else { 1900 };
    } else if y.len() != 4 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(0.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.floor() as i64))
}

pub fn compute_checksum(file_path: &Path) -> std::io::Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loaded {
    pub dataset: Dataset,
    /// Data rows discarded because the amount was missing or not numeric.
    pub dropped: usize,
}

/// Map a header row onto canonical fields. The first occurrence of a field wins.
fn map_header(header: &[CellValue]) -> Vec<Option<Field>> {
    let mut seen = BTreeSet::new();
    header
        .iter()
        .map(|cell| {
            let field = cell.as_text().and_then(|h| Field::from_header(&h))?;
            seen.insert(field).then_some(field)
        })
        .collect()
}

/// Turn a header row plus data rows into a dataset.
pub fn normalize<I>(mut rows: I) -> Result<Loaded, LoadError>
where
    I: Iterator<Item = Vec<CellValue>>,
{
    let header = rows.next().unwrap_or_default();
    let mapping = map_header(&header);
    let columns: BTreeSet<Field> = mapping.iter().flatten().copied().collect();

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|f| !columns.contains(*f))
        .map(|f| f.canonical().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns(missing));
    }
    tracing::debug!(?columns, "mapped header");

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in rows {
        if row.iter().all(CellValue::is_blank) {
            continue;
        }
        let mut record = Record::default();
        let mut amount = None;
        for (cell, field) in row.iter().zip(&mapping) {
            let Some(field) = field else { continue };
            match field {
                Field::Amount => amount = cell.as_amount(),
                Field::DueDate => record.due_date = cell.as_date(),
                Field::IssueDate => record.issue_date = cell.as_date(),
                other => {
                    if let Some(slot) = record.text_mut(*other) {
                        *slot = cell.as_text();
                    }
                }
            }
        }
        let Some(amount) = amount else {
            dropped += 1;
            continue;
        };
        record.amount = amount;
        record.derive_period();
        records.push(record);
    }

    Ok(Loaded {
        dataset: Dataset::new(records, columns),
        dropped,
    })
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn read_workbook(path: &Path, sheet: &str) -> Result<Loaded, LoadError> {
    let mut workbook = calamine::open_workbook_auto(path).map_err(|e| LoadError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(LoadError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| LoadError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    normalize(
        range
            .rows()
            .map(|row| row.iter().map(CellValue::from).collect()),
    )
}

fn read_csv(path: &Path) -> Result<Loaded, LoadError> {
    let unreadable = |e: &dyn std::fmt::Display| LoadError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let content = std::fs::read_to_string(path).map_err(|e| unreadable(&e))?;
    // Spreadsheet exports with a decimal comma use ';' as the separator.
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = if first_line.contains(';') && !first_line.contains(',') {
        b';'
    } else {
        b','
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| unreadable(&e))?;
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }
    normalize(rows.into_iter())
}

/// Load and normalize a cost sheet. `sheet` is ignored for csv input.
pub fn load(path: &Path, sheet: &str) -> Result<Loaded, LoadError> {
    if !path.is_file() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    let loaded = if is_csv(path) {
        read_csv(path)?
    } else {
        read_workbook(path, sheet)?
    };
    tracing::info!(
        path = %path.display(),
        records = loaded.dataset.len(),
        dropped = loaded.dropped,
        "loaded cost sheet"
    );
    Ok(loaded)
}

/// Result of a load that never fails: on error the dataset is empty and the
/// error is kept for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub dropped: usize,
    pub error: Option<LoadError>,
}

pub fn load_or_empty(path: &Path, sheet: &str) -> LoadOutcome {
    match load(path, sheet) {
        Ok(loaded) => LoadOutcome {
            dataset: loaded.dataset,
            dropped: loaded.dropped,
            error: None,
        },
        Err(e) => {
            tracing::info!(path = %path.display(), error = %e, "could not load cost sheet");
            LoadOutcome {
                error: Some(e),
                ..LoadOutcome::default()
            }
        }
    }
}
