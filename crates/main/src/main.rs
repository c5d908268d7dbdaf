use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use production_report::config::{FONTS_DIR_ENV, FOOTER_ENV, LOGO_ENV, TITLE_ENV};
use production_report::dashboard::{DashboardData, DashboardMetrics, DashboardSeries};
use production_report::summary::ReportSummary;
use production_report::{ReportComposer, ReportConfig, ReportInput};

/// Renders production reports and dashboard figures from exported record collections.
///
/// `Roboto-Regular.ttf` is looked up in `--fonts-dir`, then in `assets/fonts` next to the binary
/// or the library crate. `arial.ttf` from `PRODUCTION_REPORT_WINDOWS_FONTS_DIR` (or the Windows
/// font directory) is the fallback.
#[derive(Parser)]
#[command(author, version, about = "Production report generator")]
struct Cli {
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the PDF report for a request body.
    Render {
        /// JSON file with `productionData`, `logisticsData`, and `trackingData`; `-` reads stdin.
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, default_value = "report.pdf")]
        output: PathBuf,

        /// Company logo drawn above the title.
        #[arg(long, env = LOGO_ENV)]
        logo: Option<PathBuf>,

        /// Omit the logo even if one is configured.
        #[arg(long, conflicts_with = "logo")]
        no_logo: bool,

        #[arg(long, env = TITLE_ENV)]
        title: Option<String>,

        #[arg(long, env = FOOTER_ENV)]
        footer: Option<String>,

        /// Date printed in the header (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Directory searched first for the report font.
        #[arg(long, env = FONTS_DIR_ENV)]
        fonts_dir: Option<PathBuf>,

        /// Add one PDF outline entry per chart.
        #[cfg(feature = "bookmarks")]
        #[arg(long)]
        bookmarks: bool,
    },

    /// Print the report summary figures as JSON.
    Summary {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print dashboard KPIs and the chart series behind each widget as JSON.
    Dashboard {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Render {
            input,
            output,
            logo,
            no_logo,
            title,
            footer,
            date,
            fonts_dir,
            #[cfg(feature = "bookmarks")]
            bookmarks,
        } => {
            let request = ReportInput::from_json(&read_input(&input)?)?;

            let mut config = ReportConfig::from_env();
            if let Some(title) = title {
                config = config.with_title(title);
            }
            if let Some(footer) = footer {
                config = config.with_footer(footer);
            }
            if no_logo {
                config = config.without_logo();
            } else if let Some(logo) = logo {
                config = config.with_logo_path(logo);
            }
            if let Some(date) = date {
                config = config.with_report_date(date);
            }
            if let Some(dir) = fonts_dir {
                config = config.with_fonts_dir(dir);
            }

            let composer = ReportComposer::new().with_config(config);
            #[cfg(feature = "bookmarks")]
            let report = if bookmarks {
                composer.compose_with_bookmarks(&request)?
            } else {
                composer.compose(&request)?
            };
            #[cfg(not(feature = "bookmarks"))]
            let report = composer.compose(&request)?;

            fs::write(&output, &report.bytes)?;
            info!(
                "Wrote {} ({} page(s))",
                output.display(),
                report.page_count
            );
        }
        Commands::Summary { input } => {
            let request = ReportInput::from_json(&read_input(&input)?)?;
            let summary = ReportSummary::from_input(&request);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Dashboard { input } => {
            let data = DashboardData::from_json(&read_input(&input)?)?;
            let output = serde_json::json!({
                "metrics": DashboardMetrics::compute(&data),
                "series": DashboardSeries::compute(&data),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read(path)
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
