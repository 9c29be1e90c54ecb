use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_filtered, print_load_notes, FilterArgs, ReportCommands, Source};
use crate::error::Result;
use crate::fmt::{money, number, percent};
use crate::models::{Dataset, Field, Record, ALL_FIELDS};
use crate::reports::{self, GroupTotal, MonthTotal, Summary, SupplierTotal, TOP_TASKS};
use crate::settings::Settings;

const NO_MATCHES: &str = "No records match the current filters.";

pub fn run(command: ReportCommands, filters: &FilterArgs, source: &Source, settings: &Settings) -> Result<()> {
    let session = open_filtered(source, filters)?;
    print_load_notes(&session);
    let dataset = session.filtered();
    println!("{}", render(command, &dataset, settings.dealer_top_n));
    Ok(())
}

/// Text for one report command over an already filtered dataset.
pub fn render(command: ReportCommands, dataset: &Dataset, default_top: Option<usize>) -> String {
    match command {
        ReportCommands::Summary => section("Summary", format_summary(&reports::get_summary(dataset))),
        ReportCommands::Monthly => section("Monthly Costs", monthly(dataset)),
        ReportCommands::Categories => section("Cost by Category", categories(dataset)),
        ReportCommands::Dealers { top } => {
            section("Dealer Ranking", dealers(dataset, top.or(default_top)))
        }
        ReportCommands::Tasks => section("Top Consolidated Tasks", tasks(dataset)),
        ReportCommands::Suppliers => section("Suppliers", suppliers(dataset)),
        ReportCommands::Records { limit } => section("Records", format_records(dataset, limit)),
        ReportCommands::All { top } => [
            ReportCommands::Summary,
            ReportCommands::Monthly,
            ReportCommands::Categories,
            ReportCommands::Dealers { top },
            ReportCommands::Tasks,
            ReportCommands::Suppliers,
        ]
        .into_iter()
        .map(|c| render(c, dataset, default_top))
        .collect::<Vec<_>>()
        .join("\n\n"),
    }
}

fn section(title: &str, body: String) -> String {
    format!("{}\n{body}", title.bold())
}

fn missing_column(field: Field) -> String {
    format!("Column {} not present in the source.", field.canonical())
        .dimmed()
        .to_string()
}

fn placeholder(text: &str) -> String {
    text.dimmed().to_string()
}

fn monthly(dataset: &Dataset) -> String {
    if !dataset.has(Field::DueDate) {
        return missing_column(Field::DueDate);
    }
    let months = reports::get_monthly(dataset);
    if months.is_empty() {
        return placeholder(NO_MATCHES);
    }
    format_monthly(&months)
}

fn categories(dataset: &Dataset) -> String {
    if !dataset.has(Field::Category) {
        return missing_column(Field::Category);
    }
    let rows = reports::get_categories(dataset);
    if rows.is_empty() {
        return placeholder(NO_MATCHES);
    }
    format_groups("Category", &rows, dataset.total())
}

fn dealers(dataset: &Dataset, top: Option<usize>) -> String {
    if !dataset.has(Field::DealerCategory) {
        return missing_column(Field::DealerCategory);
    }
    let rows = reports::get_dealer_ranking(dataset, top);
    if rows.is_empty() {
        return placeholder(NO_MATCHES);
    }
    format_groups("Dealer", &rows, dataset.total())
}

fn tasks(dataset: &Dataset) -> String {
    if !dataset.has(Field::ConsolidatedTask) {
        return missing_column(Field::ConsolidatedTask);
    }
    let rows = reports::get_top_tasks(dataset);
    if rows.is_empty() {
        return placeholder(NO_MATCHES);
    }
    let mut out = format_groups("Consolidated Task", &rows, dataset.total());
    if rows.len() == TOP_TASKS {
        out.push_str(&format!("\n{}", placeholder(&format!("Showing the top {TOP_TASKS}."))));
    }
    out
}

fn suppliers(dataset: &Dataset) -> String {
    if !dataset.has(Field::SupplierName) {
        return missing_column(Field::SupplierName);
    }
    let rows = reports::get_suppliers(dataset);
    if rows.is_empty() {
        return placeholder(NO_MATCHES);
    }
    format_suppliers(&rows)
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_summary(summary: &Summary) -> String {
    if summary.count == 0 {
        return placeholder(NO_MATCHES);
    }
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Total cost"), Cell::new(money(summary.total))]);
    table.add_row(vec![Cell::new("Documents"), Cell::new(number(summary.count))]);
    table.add_row(vec![Cell::new("Average per document"), Cell::new(money(summary.average))]);
    table.add_row(vec![
        Cell::new("Largest expense"),
        Cell::new(summary.largest.map(money).unwrap_or_else(|| "-".to_string())),
    ]);
    right_align(&mut table, &[1]);
    table.to_string()
}

pub fn format_monthly(months: &[MonthTotal]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Month", "Records", "Amount"]);
    let mut total = 0.0;
    for m in months {
        total += m.total;
        table.add_row(vec![
            Cell::new(m.period.label()),
            Cell::new(number(m.count)),
            Cell::new(money(m.total)),
        ]);
    }
    table.add_row(vec![Cell::new("Total".bold()), Cell::new(""), Cell::new(money(total).bold())]);
    right_align(&mut table, &[1, 2]);
    table.to_string()
}

/// Ranked group totals with their share of `whole`.
pub fn format_groups(label: &str, rows: &[GroupTotal], whole: f64) -> String {
    let mut table = Table::new();
    table.set_header(vec!["#", label, "Records", "Amount", "Share"]);
    for (i, g) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&g.name),
            Cell::new(number(g.count)),
            Cell::new(money(g.total)),
            Cell::new(percent(g.total, whole)),
        ]);
    }
    right_align(&mut table, &[0, 2, 3, 4]);
    table.to_string()
}

pub fn format_suppliers(rows: &[SupplierTotal]) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Supplier", "Documents", "Amount"]);
    for s in rows {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(number(s.documents)),
            Cell::new(money(s.total)),
        ]);
    }
    right_align(&mut table, &[1, 2]);
    table.to_string()
}

fn record_cell(record: &Record, field: Field) -> String {
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
    };
    match field {
        Field::IssueDate => date(record.issue_date),
        Field::DueDate => date(record.due_date),
        Field::Amount => money(record.amount),
        _ => record.text(field).unwrap_or_default().to_string(),
    }
}

/// Every present column, newest due date first.
pub fn format_records(dataset: &Dataset, limit: Option<usize>) -> String {
    if dataset.is_empty() {
        return placeholder(NO_MATCHES);
    }
    let fields: Vec<Field> = ALL_FIELDS.iter().copied().filter(|f| dataset.has(*f)).collect();
    let rows = reports::get_records_by_due_date(dataset);
    let shown = limit.unwrap_or(rows.len()).min(rows.len());

    let mut table = Table::new();
    table.set_header(fields.iter().map(|f| f.label()).collect::<Vec<_>>());
    for record in rows.iter().take(shown) {
        table.add_row(fields.iter().map(|f| record_cell(record, *f)).collect::<Vec<_>>());
    }
    if let Some(col) = fields.iter().position(|f| *f == Field::Amount) {
        right_align(&mut table, &[col]);
    }

    let mut out = table.to_string();
    if shown < rows.len() {
        out.push_str(&format!(
            "\n{}",
            placeholder(&format!("Showing {shown} of {} records.", number(rows.len())))
        ));
    }
    out
}

fn right_align(table: &mut Table, columns: &[usize]) {
    for &i in columns {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
}
