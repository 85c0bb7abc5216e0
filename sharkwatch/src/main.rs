//! Shark-attack dataset cleaning and analysis tool.
//!
//! Loads the raw incident export, runs the cleaning pipeline over it and
//! produces the clean table, hypothesis results, SVG charts and a Markdown
//! report.
//!
//! # Guarantees
//! - Input files are never modified
//! - Cleaning is idempotent, so every command accepts raw or clean input
//! - No network access

mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sharkwatch_core::{
    CleaningOptions, CleaningReport, CsvFormat, Table, TableCleaner, charts,
    io::{load_table, save_json, save_table},
    logging::init_logging,
    report,
};
use tracing::{error, info};

use crate::output::{
    AnalysisBundle, print_charts, print_cleaning_summary, print_partial_report, write_output,
};

#[derive(Parser)]
#[command(name = "sharkwatch")]
#[command(about = "Shark-attack dataset cleaning and analysis tool")]
#[command(version)]
#[command(long_about = "
Sharkwatch - cleaning and analysis for the global shark-attack incident file

The cleaning pipeline runs these steps in order:
- Drop empty and anonymous columns
- Remove duplicate rows
- Standardize free-text columns (Country, Area, Activity, ...)
- Normalize Sex and Fatal onto fixed tokens
- Parse dates into Date_Parsed and coerce Year
- Extract integer ages
- Null placeholder tokens and measure missingness

EXAMPLES:
  sharkwatch clean --delimiter ';' GSAF5.csv -o clean.csv --report cleaning.json
  sharkwatch analyze clean.csv --format markdown
  sharkwatch plot clean.csv --out-dir reports
  sharkwatch run --delimiter ';' GSAF5.csv --out-dir reports
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean a raw export and write the clean table
    Clean(CleanArgs),
    /// Print the hypothesis results
    Analyze(AnalyzeArgs),
    /// Render the SVG charts
    Plot(PlotArgs),
    /// Clean, analyze, plot and write the report
    Run(RunArgs),
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Log line formats
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// Newline-delimited JSON
    Json,
}

/// Analysis output formats
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// All analysis results as JSON
    Json,
    /// Markdown report without charts
    Markdown,
}

/// Input file and cleaning options shared by every command
#[derive(Args)]
pub struct InputArgs {
    /// Raw or clean incident file
    #[arg(help = "Delimited-text incident file")]
    pub input: PathBuf,

    /// Field delimiter
    #[arg(
        long,
        default_value = ",",
        value_parser = parse_delimiter,
        help = "Field delimiter for input and cleaned output: a single character, or 'tab'"
    )]
    pub delimiter: u8,

    /// Column sparseness threshold
    #[arg(long, help = "Drop columns whose missing fraction exceeds this (0.0-1.0)")]
    pub missing_threshold: Option<f64>,

    /// Row sparseness threshold
    #[arg(long, help = "Report rows whose missing fraction exceeds this (0.0-1.0)")]
    pub row_missing_threshold: Option<f64>,

    /// Lowest accepted age
    #[arg(long, help = "Lowest accepted age")]
    pub min_age: Option<i64>,

    /// Highest accepted age
    #[arg(long, help = "Highest accepted age")]
    pub max_age: Option<i64>,

    /// Print one line per cleaning step
    #[arg(long, help = "Narrate each cleaning step (on stderr when analyze prints to stdout)")]
    pub narrate: bool,

    /// Options file
    #[arg(long, help = "JSON file with cleaning options; flags override it")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Clean table path
    #[arg(short, long, help = "Clean table path (default: <input>_clean.csv)")]
    pub output: Option<PathBuf>,

    /// Cleaning report path
    #[arg(long, help = "Write the cleaning report as JSON")]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path
    #[arg(short, long, help = "Output file (default: stdout)")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Chart directory
    #[arg(long, default_value = "reports")]
    pub out_dir: PathBuf,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output directory
    #[arg(long, default_value = "reports")]
    pub out_dir: PathBuf,

    /// Markdown report path
    #[arg(long, help = "Markdown report path (default: <out-dir>/report.md)")]
    pub report: Option<PathBuf>,
}

/// Parses a delimiter argument into a single byte.
fn parse_delimiter(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!(
                "delimiter must be a single ASCII character, got '{}'",
                value
            )),
        },
    }
}

impl InputArgs {
    /// Builds cleaning options from the config file, then the flags.
    fn options(&self) -> Result<CleaningOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                CleaningOptions::from_json(&json)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => CleaningOptions::new(),
        };

        if let Some(threshold) = self.missing_threshold {
            options = options.with_missing_threshold(threshold);
        }
        if let Some(threshold) = self.row_missing_threshold {
            options = options.with_row_missing_threshold(threshold);
        }
        if self.min_age.is_some() || self.max_age.is_some() {
            let min = self.min_age.unwrap_or(options.age_bounds.min);
            let max = self.max_age.unwrap_or(options.age_bounds.max);
            options = options.with_age_bounds(min, max);
        }
        if self.narrate {
            options = options.with_verbose(true);
        }
        Ok(options)
    }

    fn format(&self) -> CsvFormat {
        CsvFormat::with_delimiter(self.delimiter)
    }
}

/// Where `--narrate` lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Narration {
    Stdout,
    /// Keeps stdout clean for a document printed there
    Stderr,
}

/// Loads the input and runs the cleaning pipeline over it.
fn load_and_clean(
    args: &InputArgs,
    quiet: bool,
    narration: Narration,
) -> Result<(Table, CleaningReport)> {
    let options = args.options()?;
    let raw = load_table(&args.input, args.format())
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    info!("Cleaning {} rows x {} columns", raw.row_count(), raw.column_count());
    let cleaner = TableCleaner::new(options);
    let outcome = match narration {
        Narration::Stdout => cleaner.run_all(raw),
        Narration::Stderr => cleaner.run_all_with_writer(raw, &mut std::io::stderr().lock()),
    };
    match outcome {
        Ok(cleaned) => Ok(cleaned),
        Err(failure) => {
            error!("{}: {}", failure, failure.error);
            if !quiet {
                print_partial_report(&failure.report);
            }
            Err(failure).context("Cleaning pipeline failed")
        }
    }
}

/// `<dir>/<stem>_clean.csv` next to the input.
fn default_clean_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "incidents".into(), |s| s.to_string_lossy());
    input.with_file_name(format!("{}_clean.csv", stem))
}

fn clean_command(args: &CleanArgs, quiet: bool) -> Result<()> {
    let (table, report) = load_and_clean(&args.input, quiet, Narration::Stdout)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_clean_path(&args.input.input));
    save_table(&table, &output, args.input.format())
        .with_context(|| format!("Failed to save {}", output.display()))?;

    if let Some(path) = &args.report {
        save_json(&report, path).context("Failed to save cleaning report")?;
    }
    if !quiet {
        print_cleaning_summary(&report);
        println!("Output: {}", output.display());
    }
    Ok(())
}

impl AnalyzeArgs {
    fn narration(&self) -> Narration {
        if self.output.is_some() {
            Narration::Stdout
        } else {
            Narration::Stderr
        }
    }
}

fn analyze_command(args: &AnalyzeArgs, quiet: bool) -> Result<()> {
    let (table, cleaning) = load_and_clean(&args.input, quiet, args.narration())?;
    let bundle = AnalysisBundle::compute(&table)?;

    let text = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&bundle).context("Failed to serialize analysis")?
        }
        OutputFormat::Markdown => {
            report::render_markdown_report(&cleaning, &bundle.hypotheses, &[])?
        }
    };
    write_output(args.output.as_deref(), &text)
}

fn plot_command(args: &PlotArgs, quiet: bool) -> Result<()> {
    let (table, _) = load_and_clean(&args.input, quiet, Narration::Stdout)?;
    let written = charts::render_all_charts(&table, &args.out_dir)
        .with_context(|| format!("Failed to render charts into {}", args.out_dir.display()))?;
    if !quiet {
        print_charts(&written);
    }
    Ok(())
}

fn run_command(args: &RunArgs, quiet: bool) -> Result<()> {
    let (table, cleaning) = load_and_clean(&args.input, quiet, Narration::Stdout)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let clean_path = args.out_dir.join("clean.csv");
    save_table(&table, &clean_path, args.input.format())?;
    save_json(&cleaning, &args.out_dir.join("cleaning_report.json"))?;

    let bundle = AnalysisBundle::compute(&table)?;
    save_json(&bundle, &args.out_dir.join("analysis.json"))?;

    let written = charts::render_all_charts(&table, &args.out_dir)?;
    let report_path = args
        .report
        .clone()
        .unwrap_or_else(|| args.out_dir.join("report.md"));
    report::save_markdown_report(&cleaning, &bundle.hypotheses, &written, &report_path)?;

    if !quiet {
        print_cleaning_summary(&cleaning);
        print_charts(&written);
        println!("Report: {}", report_path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        cli.global.verbose,
        cli.global.quiet,
        cli.global.log_format == LogFormat::Json,
    )?;

    let quiet = cli.global.quiet;
    match &cli.command {
        Command::Clean(args) => clean_command(args, quiet),
        Command::Analyze(args) => analyze_command(args, quiet),
        Command::Plot(args) => plot_command(args, quiet),
        Command::Run(args) => run_command(args, quiet),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sharkwatch",
            "clean",
            "raw.csv",
            "--delimiter",
            ";",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.log_format, LogFormat::Json);
        let Command::Clean(args) = cli.command else {
            panic!("expected clean");
        };
        assert_eq!(args.input.delimiter, b';');
    }

    #[test]
    fn test_flags_override_options() {
        let cli = Cli::try_parse_from([
            "sharkwatch",
            "analyze",
            "clean.csv",
            "--missing-threshold",
            "0.5",
            "--max-age",
            "99",
            "--narrate",
            "--format",
            "markdown",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.format, OutputFormat::Markdown);

        let options = args.input.options().unwrap();
        assert_eq!(options.missing_threshold, 0.5);
        assert_eq!(options.age_bounds.max, 99);
        assert_eq!(options.age_bounds.min, CleaningOptions::default().age_bounds.min);
        assert!(options.verbose);
        assert_eq!(args.narration(), Narration::Stderr);
    }

    #[test]
    fn test_analyze_to_file_narrates_on_stdout() {
        let cli = Cli::try_parse_from([
            "sharkwatch",
            "analyze",
            "clean.csv",
            "--narrate",
            "-o",
            "analysis.json",
        ])
        .unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.narration(), Narration::Stdout);
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("options.json");
        std::fs::write(&config, r#"{"missing_threshold": 0.8, "row_missing_threshold": 0.6}"#)
            .unwrap();

        let cli = Cli::try_parse_from([
            "sharkwatch",
            "plot",
            "raw.csv",
            "--config",
            config.to_str().unwrap(),
            "--row-missing-threshold",
            "0.4",
        ])
        .unwrap();
        let Command::Plot(args) = cli.command else {
            panic!("expected plot");
        };
        assert_eq!(args.out_dir, PathBuf::from("reports"));
        let options = args.input.options().unwrap();
        assert_eq!(options.missing_threshold, 0.8);
        assert_eq!(options.row_missing_threshold, 0.4);
    }

    #[test]
    fn test_default_clean_path() {
        assert_eq!(
            default_clean_path(Path::new("data/GSAF5.csv")),
            PathBuf::from("data/GSAF5_clean.csv")
        );
    }

    #[test]
    fn test_run_command_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        std::fs::write(
            &input,
            "Date;Year;Country;Activity;Sex;Fatal Y/N;Age;Species \n\
             27th November 2005;2005;usa;Surfing;M;N;20;White shark\n\
             06-Sep-2017;2017;AUSTRALIA;Swimming;F;Y;30s;\n",
        )
        .unwrap();
        let out_dir = dir.path().join("reports");

        let cli = Cli::try_parse_from([
            "sharkwatch",
            "run",
            input.to_str().unwrap(),
            "--delimiter",
            ";",
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        run_command(&args, true).unwrap();

        for file in [
            "clean.csv",
            "cleaning_report.json",
            "analysis.json",
            "report.md",
            "h1_geographic.svg",
            "risk_score.svg",
        ] {
            assert!(out_dir.join(file).exists(), "{} missing", file);
        }
        let clean = std::fs::read_to_string(out_dir.join("clean.csv")).unwrap();
        assert!(clean.starts_with("Date;Year;Country;"), "{clean}");
    }
}
