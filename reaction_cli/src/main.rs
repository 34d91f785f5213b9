//! # Support Reaction Analyzer CLI
//!
//! Terminal front end for `reaction_core`: reads one sheet of a workbook,
//! analyzes the support groups given on the command line and prints the
//! governing reactions as text tables or JSON.
//!
//! ## Usage
//!
//! ```bash
//! reaction_cli reactions.xlsx --groups "P1:1,2,3; P2:4,5" --dead-load "3,4"
//! reaction_cli reactions.xlsx --list-sheets
//! reaction_cli reactions.xlsx --sheet "Reactions" --groups "A:10" --json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};

use reaction_core::grid::RawGrid;
use reaction_core::report::{format_force, AnalysisReport, SupportReport};
use reaction_core::{
    extract, list_sheets, read_sheet, AnalysisSettings, ReactionError, ReportMetadata,
};

/// Rows of the raw sheet shown when the reactions table cannot be found
const DIAGNOSTIC_PREVIEW_ROWS: usize = 10;

/// Report the governing support reactions of an analysis export
#[derive(Parser, Debug)]
#[command(
    name = "reaction_cli",
    about = "Summarize support reactions per support group from a structural analysis export",
    version
)]
struct Args {
    /// Workbook exported by the analysis program (xlsx, xls, xlsb, ods)
    #[arg(value_name = "WORKBOOK")]
    workbook: PathBuf,

    /// Sheet to read (defaults to the first sheet)
    #[arg(short, long)]
    sheet: Option<String>,

    /// Support groups, e.g. "P1:1,2,3; P2:4,5"
    #[arg(short, long, required_unless_present_any = ["list_sheets", "preview"])]
    groups: Option<String>,

    /// Additional dead-load L/Cs to sum, comma-separated (e.g. "3,4")
    #[arg(short, long, default_value = "")]
    dead_load: String,

    /// JSON file overriding header keywords and table layout
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// List the sheets of the workbook and exit
    #[arg(long)]
    list_sheets: bool,

    /// Print the first ROWS rows of the raw sheet before analyzing
    #[arg(long, value_name = "ROWS")]
    preview: Option<usize>,

    /// Decimal places in text output
    #[arg(long, default_value_t = 2)]
    decimals: usize,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    log::debug!("{:?}", args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        if let Some(err) = e.downcast_ref::<ReactionError>() {
            if let Ok(json) = serde_json::to_string_pretty(err) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    if args.list_sheets {
        let sheets = list_sheets(&args.workbook)?;
        for name in sheets {
            println!("{}", name);
        }
        return Ok(());
    }

    let settings = match &args.settings {
        Some(path) => AnalysisSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => AnalysisSettings::default(),
    };

    let sheet = read_sheet(&args.workbook, args.sheet.as_deref())
        .with_context(|| format!("Failed to read {}", args.workbook.display()))?;

    if let Some(rows) = args.preview {
        print_preview(&sheet.grid, rows);
    }

    let extraction = match extract(&sheet.grid, &settings) {
        Ok(extraction) => extraction,
        Err(e) => {
            if matches!(e, ReactionError::HeaderNotFound { .. }) {
                eprintln!("Reactions data not found. First rows of sheet '{}':", sheet.sheet);
                print_preview(&sheet.grid, DIAGNOSTIC_PREVIEW_ROWS);
            }
            return Err(e.into());
        }
    };

    let Some(groups) = args.groups.as_deref() else {
        if args.preview.is_some() {
            return Ok(());
        }
        bail!("--groups is required");
    };

    let analysis = extraction.analyze(groups, &args.dead_load, &settings)?;
    let metadata = ReportMetadata::new(args.workbook.display().to_string(), Some(sheet.sheet));
    let report = analysis.into_report(metadata);

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report, args.decimals);
    }
    Ok(())
}

fn print_preview(grid: &RawGrid, rows: usize) {
    for (index, cells) in grid.preview(rows).iter().enumerate() {
        println!("{:>5} | {}", grid.sheet_row(index), cells.join(" | "));
    }
    println!();
}

fn print_report(report: &AnalysisReport, decimals: usize) {
    let diagnostics = &report.diagnostics;
    if let Some(table) = diagnostics.reactions_table {
        println!("[OK] Reactions data found in row {}", table.sheet_row);
    }
    match diagnostics.load_case_table {
        Some(table) => println!("[OK] Load cases data found in row {}", table.sheet_row),
        None => println!("[--] Load cases data not found, using default load case names"),
    }
    for warning in &diagnostics.warnings {
        println!("[WARN] {}", warning);
    }
    println!(
        "{} reaction records, {} named load cases",
        diagnostics.record_count, diagnostics.load_case_count
    );
    println!();

    for support in &report.supports {
        print_support(support, &report.dead_load_cases, decimals);
    }
}

fn print_support(support: &SupportReport, dead_load_cases: &[i64], decimals: usize) {
    let nodes: Vec<String> = support.nodes.iter().map(|n| n.to_string()).collect();

    println!("═══════════════════════════════════════");
    println!("  RESULTS FOR {} (nodes {})", support.name, nodes.join(", "));
    println!("═══════════════════════════════════════");
    for warning in &support.warnings {
        println!("  [WARN] {}", warning);
    }
    println!();

    println!("Overall Max Reactions:");
    println!("  {:<4} {:>12} {:>6}  {}", "Axis", "Value", "L/C", "Load case");
    for row in &support.overall_max {
        println!(
            "  {:<4} {:>12} {:>6}  {}",
            row.axis,
            format_force(row.value, decimals),
            row.load_case.map_or_else(|| "-".to_string(), |lc| lc.to_string()),
            row.load_case_name.as_deref().unwrap_or("-")
        );
    }
    println!();

    if let Some(sums) = &support.dead_load_sum {
        let cases: Vec<String> = dead_load_cases.iter().map(|lc| lc.to_string()).collect();
        println!("Sum of Max Values for Additional Dead Loads (L/C {}):", cases.join(", "));
        println!(
            "  FX = {}  FY = {}  FZ = {}",
            format_force(sums.fx, decimals),
            format_force(sums.fy, decimals),
            format_force(sums.fz, decimals)
        );
        println!();
    }

    println!("Per Load Case Maximums:");
    println!("  {:>6}  {:<24} {:>12} {:>12} {:>12}", "L/C", "Name", "FX", "FY", "FZ");
    for row in &support.per_load_case_max {
        println!(
            "  {:>6}  {:<24} {:>12} {:>12} {:>12}",
            row.load_case,
            row.load_case_name,
            format_force(row.fx, decimals),
            format_force(row.fy, decimals),
            format_force(row.fz, decimals)
        );
    }
    println!();
}
