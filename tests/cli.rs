use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tempfile::TempDir;

const HEADERS: [&str; 7] = [
    "CATEGORIA SCANIA",
    "NOME FORNECEDOR",
    "N. DOCUMENTO",
    "TIPO DOC",
    "DATA VENCIMENTO",
    "VALOR",
    "TAREFA CONSOLIDADA",
];

/// (dealer, supplier, document, doc type, (y, m, d), amount, task)
type Row = (&'static str, &'static str, &'static str, &'static str, (u16, u8, u8), f64, &'static str);

const ROWS: [Row; 3] = [
    ("Norte", "Pecas Ltda", "NF-1", "NF", (2023, 1, 15), 100.0, "REVISAO"),
    ("Sul", "Oficina SA", "NF-2", "NF", (2023, 2, 10), 200.0, "FREIOS"),
    ("Norte", "Pecas Ltda", "NF-3", "RPA", (2024, 1, 5), 50.0, "REVISAO"),
];

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("consolidado.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("OFICIAL TABLE | DATE").unwrap();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (i, (dealer, supplier, doc, doc_type, (y, m, d), amount, task)) in ROWS.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *dealer).unwrap();
        sheet.write_string(row, 1, *supplier).unwrap();
        sheet.write_string(row, 2, *doc).unwrap();
        sheet.write_string(row, 3, *doc_type).unwrap();
        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
        sheet.write_datetime_with_format(row, 4, &date, &date_format).unwrap();
        sheet.write_number(row, 5, *amount).unwrap();
        sheet.write_string(row, 6, *task).unwrap();
    }
    workbook.save(&path).unwrap();
    path
}

/// Binary with HOME pointed at a scratch dir so no real settings are read.
fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("scania-costs").unwrap();
    cmd.env("HOME", home.path()).env("NO_COLOR", "1");
    cmd
}

#[test]
fn summary_reports_totals() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "summary", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 350.00"))
        .stdout(predicate::str::contains("R$ 200.00"));
}

#[test]
fn year_filter_limits_monthly_report() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "monthly", "--year", "2023", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Jan/2023"))
        .stdout(predicate::str::contains("Feb/2023"))
        .stdout(predicate::str::contains("R$ 300.00"))
        .stdout(predicate::str::contains("Jan/2024").not());
}

#[test]
fn date_range_filter_on_dealers() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "dealers", "--from", "01/02/2023", "--to", "2023-02-28", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sul"))
        .stdout(predicate::str::contains("R$ 200.00"))
        .stdout(predicate::str::contains("Norte").not());
}

#[test]
fn to_before_first_due_date_gives_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "summary", "--to", "31/12/2022", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("No records match the current filters."));
}

#[test]
fn one_sided_range_on_missing_file_reports_load_problem() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["report", "summary", "--to", "2023-12-31", "--file"])
        .arg(dir.path().join("nope.xlsx"))
        .assert()
        .success()
        .stdout(predicate::str::contains("File not found"));
}

#[test]
fn absent_column_shows_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "categories", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("CATEGORIA not present"));
}

#[test]
fn export_writes_filtered_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let out = dir.path().join("out").join("norte.xlsx");
    cmd(&dir)
        .args(["export", "--dealer", "Norte", "--file"])
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 records"));
    assert!(out.exists());

    // The export loads back as a cost sheet of its own.
    cmd(&dir)
        .args(["report", "summary", "--sheet", "Dados_Completos", "--file"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 150.00"));
}

#[test]
fn export_with_no_matches_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    let out = dir.path().join("empty.xlsx");
    cmd(&dir)
        .args(["export", "--year", "1999", "--file"])
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing exported"));
    assert!(!out.exists());
}

#[test]
fn missing_file_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["report", "all", "--file"])
        .arg(dir.path().join("nope.xlsx"))
        .assert()
        .success()
        .stdout(predicate::str::contains("File not found"))
        .stdout(predicate::str::contains("No records match the current filters."));
}

#[test]
fn missing_sheet_lists_available_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "summary", "--sheet", "Plan1", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sheet 'Plan1' not found"))
        .stdout(predicate::str::contains("OFICIAL TABLE | DATE"));
}

#[test]
fn export_of_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["export", "--file"])
        .arg(dir.path().join("nope.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: File not found"));
}

#[test]
fn invalid_date_flag_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["report", "summary", "--from", "yesterday", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date: yesterday"));
}

#[test]
fn filters_lists_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .args(["filters", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Norte"))
        .stdout(predicate::str::contains("2024, 2023"))
        .stdout(predicate::str::contains("15/01/2023 .. 05/01/2024"));
}

#[test]
fn load_switches_configured_source() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(dir.path());
    cmd(&dir)
        .arg("load")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records"));
    assert!(dir.path().join(".config/scania-costs/settings.json").exists());

    cmd(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("consolidado.xlsx"))
        .stdout(predicate::str::contains("Records:    3"));
}

#[test]
fn load_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("load")
        .arg(dir.path().join("nope.xlsx"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
    assert!(!dir.path().join(".config/scania-costs/settings.json").exists());
}
