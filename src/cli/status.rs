use crate::cli::{print_load_problem, Source};
use crate::error::Result;
use crate::fmt::{money, number};
use crate::loader::compute_checksum;
use crate::models::ALL_FIELDS;
use crate::settings::{settings_file_exists, settings_path};

pub fn run(source: &Source) -> Result<()> {
    let settings_note = if settings_file_exists() { "" } else { " (defaults, not saved)" };
    println!("Settings:   {}{settings_note}", settings_path().display());
    println!("Source:     {}", source.path.display());
    println!("Sheet:      {}", source.sheet);

    if source.path.exists() {
        let size = std::fs::metadata(&source.path)?.len();
        println!("Size:       {} bytes", number(size as usize));
        let checksum = compute_checksum(&source.path)?;
        println!("SHA-256:    {}", checksum.get(..12).unwrap_or(&checksum));
    }

    let session = source.open();
    let outcome = session.outcome();
    println!();
    if let Some(error) = &outcome.error {
        print_load_problem(error);
        return Ok(());
    }

    let dataset = session.dataset();
    let options = session.options();
    let columns: Vec<&str> = ALL_FIELDS
        .iter()
        .filter(|f| dataset.has(**f))
        .map(|f| f.canonical())
        .collect();

    println!("Records:    {}", number(dataset.len()));
    println!("Skipped:    {}", number(outcome.dropped));
    println!("Total:      {}", money(dataset.total()));
    println!(
        "Due dates:  {} .. {}",
        options.min_date.format("%d/%m/%Y"),
        options.max_date.format("%d/%m/%Y")
    );
    println!("Dealers:    {}", number(options.dealers.len()));
    println!("Columns:    {}", columns.join(", "));
    Ok(())
}
