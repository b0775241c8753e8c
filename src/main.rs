use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sales_report::{
    analyze, names, report, table, Analysis, AnalyzerConfig, Bucket, Catalog, Generator, Table,
};

/// Generates sample sales data, analyses it, and writes spreadsheet reports
/// with charts.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Number of sample records to generate
    #[arg(long, default_value_t = 150)]
    records: usize,

    /// Number of days in the past to generate data for
    #[arg(long, default_value_t = 90)]
    days: u32,

    /// Seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,

    /// Filename for raw data
    #[arg(long, default_value = "sales_data.xlsx")]
    data_file: PathBuf,

    /// Directory to save output files
    #[arg(long, default_value = "output", global = true)]
    output_dir: PathBuf,

    /// Filename for summary report
    #[arg(long, default_value = "sales_summary.xlsx", global = true)]
    report_file: PathBuf,

    /// Number of products in the top-products ranking
    #[arg(long, default_value_t = 5, global = true)]
    top: usize,

    /// Time bucket for the sales trend
    #[arg(long, value_enum, default_value_t = Bucket::Day, global = true)]
    bucket: Bucket,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build the summary report from an existing .xlsx or .csv sales table
    Analyze {
        input: PathBuf,
        /// Sheet to read (xlsx only; defaults to the first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Add a "Last Name" column derived from a full-name column
    SplitNames {
        input: PathBuf,
        output: PathBuf,
        /// Sheet to read (defaults to the first sheet)
        #[arg(long)]
        sheet: Option<String>,
        /// Header of the full-name column
        #[arg(long, default_value = "Full Name")]
        column: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = AnalyzerConfig {
        top_n: args.top,
        bucket: args.bucket,
    };
    match &args.command {
        None => {
            info!("Starting sales data generation and analysis process");
            let catalog = Catalog::default();
            let table = Generator::new(&catalog)
                .generate(args.records, args.days, args.seed)
                .context("generating sales data")?;
            let data_file = table::write(
                &table,
                args.output_dir.join(&args.data_file),
                table::DEFAULT_SHEET,
            )
            .context("writing raw sales data")?;
            let analysis = analyze(&table, &config);
            let report_file = report::build(&analysis, args.output_dir.join(&args.report_file))
                .context("building summary report")?;
            info!("Process completed successfully!");
            info!("Raw data file: {}", data_file.display());
            info!("Summary report: {}", report_file.display());
            log_insights(&analysis);
        }
        Some(Command::Analyze { input, sheet }) => {
            let table = load(input, sheet.as_deref())
                .with_context(|| format!("loading sales data from {}", input.display()))?;
            let analysis = analyze(&table, &config);
            let report_file = report::build(&analysis, args.output_dir.join(&args.report_file))
                .context("building summary report")?;
            info!("Summary report: {}", report_file.display());
            log_insights(&analysis);
        }
        Some(Command::SplitNames {
            input,
            output,
            sheet,
            column,
        }) => {
            names::split_names(input, sheet.as_deref(), column, output)
                .with_context(|| format!("splitting names in {}", input.display()))?;
        }
    }
    Ok(())
}

fn load(input: &Path, sheet: Option<&str>) -> sales_report::Result<Table> {
    let is_csv = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        table::read_csv(input)
    } else {
        table::read_xlsx(input, sheet)
    }
}

fn log_insights(analysis: &Analysis) {
    info!("Key insights:");
    info!("Total sales: {}", analysis.totals.revenue);
    for (label, view) in [
        ("Best-selling product", &analysis.by_product),
        ("Top-performing region", &analysis.by_region),
        ("Best sales channel", &analysis.by_channel),
    ] {
        if let Some((name, stats)) = view.leader() {
            info!("{label}: {name} ({})", stats.revenue);
        }
    }
}
