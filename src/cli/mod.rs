#[cfg(feature = "tui")]
pub mod dashboard;
pub mod export;
pub mod filters;
pub mod load;
pub mod report;
pub mod status;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::error::{CostError, LoadError, Result};
use crate::filter::{FilterSet, Selection};
use crate::loader::parse_date_dayfirst;
use crate::session::Session;
use crate::settings::{shellexpand_path, Settings};

#[derive(Parser)]
#[command(
    name = "scania-costs",
    version,
    about = "Cost dashboard for Scania supplier records."
)]
pub struct Cli {
    /// Workbook or csv with the cost records (default: settings, then consolidado.xlsx)
    #[arg(long, global = true)]
    pub file: Option<String>,
    /// Sheet to read from the workbook
    #[arg(long, global = true)]
    pub sheet: Option<String>,
    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive cost dashboard (default).
    #[cfg(feature = "tui")]
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print cost reports for the filtered records.
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Export the filtered records to an xlsx workbook.
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output path (default: <export_dir>/dados_completos_custos_YYYYMMDD_HHMM.xlsx)
        #[arg(long)]
        output: Option<String>,
    },
    /// List the values each filter can take.
    Filters,
    /// Show the configured source and what it contains.
    Status,
    /// Switch to another cost workbook.
    Load {
        /// Path to the workbook or csv; pick the sheet with --sheet
        path: String,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCommands {
    /// Total, document count, average and largest expense.
    Summary,
    /// Cost per month.
    Monthly,
    /// Cost per category.
    Categories,
    /// Dealer ranking.
    Dealers {
        /// Show only the N largest dealers
        #[arg(long)]
        top: Option<usize>,
    },
    /// Top consolidated tasks.
    Tasks,
    /// Supplier totals and document counts.
    Suppliers,
    /// Filtered records, newest due date first.
    Records {
        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Every report above except records.
    All {
        /// Show only the N largest dealers
        #[arg(long)]
        top: Option<usize>,
    },
}

/// Predicate flags shared by the dashboard, reports and export.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First due date, YYYY-MM-DD or DD/MM/YYYY
    #[arg(long = "from", global = true)]
    pub from: Option<String>,
    /// Last due date, YYYY-MM-DD or DD/MM/YYYY
    #[arg(long = "to", global = true)]
    pub to: Option<String>,
    /// Due-date year
    #[arg(long, global = true)]
    pub year: Option<i32>,
    /// Dealer (CATEGORIA SCANIA); repeat to select several
    #[arg(long = "dealer", global = true)]
    pub dealers: Vec<String>,
    /// Category (CATEGORIA); repeatable
    #[arg(long = "category", global = true)]
    pub categories: Vec<String>,
    /// Document type (TIPO DOC); repeatable
    #[arg(long = "doc-type", global = true)]
    pub document_types: Vec<String>,
    /// Task name (NOME TAREFA); repeatable
    #[arg(long = "task", global = true)]
    pub task_names: Vec<String>,
    /// Consolidated task (TAREFA CONSOLIDADA); repeatable
    #[arg(long = "consolidated-task", global = true)]
    pub consolidated_tasks: Vec<String>,
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_date_dayfirst(raw).ok_or_else(|| CostError::InvalidDate(raw.to_string()))
}

fn selection(values: &[String]) -> Selection {
    if values.is_empty() {
        Selection::All
    } else {
        Selection::only(values.iter().cloned())
    }
}

impl FilterArgs {
    /// Build the predicate set. A one-sided range stays open on the other
    /// side, so it may match nothing without being an error.
    pub fn to_filter_set(&self) -> Result<FilterSet> {
        let from = self.from.as_deref().map(parse_date_arg).transpose()?;
        let to = self.to.as_deref().map(parse_date_arg).transpose()?;
        let date_range = match (from, to) {
            (None, None) => None,
            (Some(start), Some(end)) if start > end => {
                return Err(CostError::Other(format!(
                    "--from {start} is after --to {end}"
                )));
            }
            (from, to) => Some((from.unwrap_or(NaiveDate::MIN), to.unwrap_or(NaiveDate::MAX))),
        };
        Ok(FilterSet {
            date_range,
            year: self.year,
            dealers: selection(&self.dealers),
            categories: selection(&self.categories),
            document_types: selection(&self.document_types),
            task_names: selection(&self.task_names),
            consolidated_tasks: selection(&self.consolidated_tasks),
        })
    }
}

/// Where the cost records come from: flags win over settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub path: PathBuf,
    pub sheet: String,
}

impl Source {
    pub fn resolve(file: Option<&str>, sheet: Option<&str>, settings: &Settings) -> Self {
        let file = file.unwrap_or(&settings.source_file);
        Self {
            path: PathBuf::from(shellexpand_path(file)),
            sheet: sheet.unwrap_or(&settings.sheet_name).to_string(),
        }
    }

    pub fn open(&self) -> Session {
        Session::open(&self.path, &self.sheet)
    }
}

/// Open the source and apply the filter flags.
pub(crate) fn open_filtered(source: &Source, args: &FilterArgs) -> Result<Session> {
    let mut session = source.open();
    session.filters = args.to_filter_set()?;
    Ok(session)
}

pub(crate) fn print_load_problem(error: &LoadError) {
    println!("{}", error.to_string().red().bold());
    for hint in error.hints() {
        println!("  {}", hint.dimmed());
    }
    println!();
}

/// Load problems and skipped rows, printed before any report.
pub(crate) fn print_load_notes(session: &Session) {
    let outcome = session.outcome();
    if let Some(error) = &outcome.error {
        print_load_problem(error);
    } else if outcome.dropped > 0 {
        println!(
            "{}",
            format!("{} rows skipped (amount missing or not numeric)", outcome.dropped).yellow()
        );
    }
}
