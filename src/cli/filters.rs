use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{print_load_notes, Source};
use crate::error::Result;
use crate::filter::FilterOptions;
use crate::models::Field;

const FILTER_FIELDS: [(Field, &str); 5] = [
    (Field::DealerCategory, "--dealer"),
    (Field::Category, "--category"),
    (Field::DocumentType, "--doc-type"),
    (Field::TaskName, "--task"),
    (Field::ConsolidatedTask, "--consolidated-task"),
];

pub fn run(source: &Source) -> Result<()> {
    let session = source.open();
    print_load_notes(&session);
    println!("{}", format_options(session.options()));
    Ok(())
}

pub fn format_options(options: &FilterOptions) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Flag", "Column", "Values"]);
    table.add_row(vec![
        Cell::new("--from / --to"),
        Cell::new(Field::DueDate.canonical()),
        Cell::new(format!(
            "{} .. {}",
            options.min_date.format("%d/%m/%Y"),
            options.max_date.format("%d/%m/%Y")
        )),
    ]);
    let years = if options.years.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        options
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    table.add_row(vec![Cell::new("--year"), Cell::new("ANO"), Cell::new(years)]);

    for (field, flag) in FILTER_FIELDS {
        let values = options.values(field);
        let text = if values.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            values.join("\n")
        };
        table.add_row(vec![Cell::new(flag), Cell::new(field.canonical()), Cell::new(text)]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dataset;
    use chrono::NaiveDate;

    #[test]
    fn test_empty_options_show_fallback_range() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let out = format_options(&FilterOptions::from_dataset(&Dataset::default(), today));
        assert!(out.contains("01/01/2024 .. 09/03/2025"));
        assert!(out.contains("--consolidated-task"));
        assert!(out.contains("(none)"));
    }
}
