mod cli;
mod error;
mod filter;
mod fmt;
mod loader;
mod models;
mod reports;
mod session;
mod settings;
#[cfg(feature = "tui")]
mod tui;
mod xlsx;

use clap::Parser;

use cli::{Cli, Commands, Source};
use settings::load_settings;

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let settings = load_settings();
    init_tracing(if cli.verbose { "debug" } else { settings.log_level.as_str() });

    let source = Source::resolve(cli.file.as_deref(), cli.sheet.as_deref(), &settings);

    let result = match cli.command {
        #[cfg(feature = "tui")]
        Some(Commands::Dashboard { filters }) => cli::dashboard::run(&filters, &source, &settings),
        #[cfg(feature = "tui")]
        None => cli::dashboard::run(&cli::FilterArgs::default(), &source, &settings),
        #[cfg(not(feature = "tui"))]
        None => cli::report::run(
            cli::ReportCommands::All { top: None },
            &cli::FilterArgs::default(),
            &source,
            &settings,
        ),
        Some(Commands::Report { filters, command }) => {
            cli::report::run(command, &filters, &source, &settings)
        }
        Some(Commands::Export { filters, output }) => {
            cli::export::run(&filters, output, &source, &settings)
        }
        Some(Commands::Filters) => cli::filters::run(&source),
        Some(Commands::Status) => cli::status::run(&source),
        Some(Commands::Load { path }) => cli::load::run(&path, cli.sheet.clone()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
