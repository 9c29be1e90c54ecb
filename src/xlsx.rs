use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, Worksheet};

use crate::error::{CostError, Result};
use crate::models::{Dataset, Field, Record, ALL_FIELDS};

pub const EXPORT_SHEET: &str = "Dados_Completos";

/// Derived period columns appended after the source columns.
const DERIVED_HEADERS: &[&str] = &["ANO", "MES", "MES_ANO", "MES_NOME"];

/// `dados_completos_custos_20240131_1745.xlsx`
pub fn export_file_name(now: NaiveDateTime) -> String {
    format!("dados_completos_custos_{}.xlsx", now.format("%Y%m%d_%H%M"))
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    let year = u16::try_from(date.year())
        .map_err(|_| CostError::Other(format!("Date out of range for export: {date}")))?;
    Ok(ExcelDateTime::from_ymd(
        year,
        date.month() as u8,
        date.day() as u8,
    )?)
}

struct Formats {
    header: Format,
    date: Format,
    money: Format,
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    record: &Record,
    field: Field,
    formats: &Formats,
) -> Result<()> {
    match field {
        Field::Amount => {
            sheet.write_number_with_format(row, col, record.amount, &formats.money)?;
        }
        Field::IssueDate | Field::DueDate => {
            let date = if field == Field::DueDate {
                record.due_date
            } else {
                record.issue_date
            };
            if let Some(d) = date {
                sheet.write_datetime_with_format(row, col, &excel_date(d)?, &formats.date)?;
            }
        }
        other => {
            if let Some(text) = record.text(other) {
                sheet.write_string(row, col, text)?;
            }
        }
    }
    Ok(())
}

fn build_workbook(dataset: &Dataset) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET)?;

    let formats = Formats {
        header: Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x1F77B4)),
        date: Format::new().set_num_format("dd/mm/yyyy"),
        money: Format::new().set_num_format("#,##0.00"),
    };

    let fields: Vec<Field> = ALL_FIELDS
        .iter()
        .copied()
        .filter(|f| dataset.has(*f))
        .collect();
    let with_period = dataset.has(Field::DueDate);

    let mut headers: Vec<&str> = fields.iter().map(|f| f.canonical()).collect();
    if with_period {
        headers.extend_from_slice(DERIVED_HEADERS);
    }
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
        sheet.set_column_width(col as u16, 16)?;
    }

    for (i, record) in dataset.records.iter().enumerate() {
        let row = i as u32 + 1;
        for (col, field) in fields.iter().enumerate() {
            write_cell(sheet, row, col as u16, record, *field, &formats)?;
        }
        if let (true, Some(period)) = (with_period, record.period) {
            let col = fields.len() as u16;
            sheet.write_number(row, col, period.year)?;
            sheet.write_number(row, col + 1, period.month)?;
            sheet.write_string(row, col + 2, period.key())?;
            sheet.write_string(row, col + 3, period.label())?;
        }
    }

    if !headers.is_empty() {
        sheet.autofilter(0, 0, dataset.len() as u32, headers.len() as u16 - 1)?;
    }
    Ok(workbook)
}

/// Render the dataset as xlsx bytes.
pub fn render(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(dataset)?;
    Ok(workbook.save_to_buffer()?)
}

/// Write the dataset as an xlsx file, creating parent directories.
pub fn write(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let bytes = render(dataset)?;
    std::fs::write(path, bytes)?;
    tracing::info!(path = %path.display(), records = dataset.len(), "exported filtered records");
    Ok(())
}
