// Entry point and high-level CLI flow.
//
// - Option [1] processes every RVTools workbook in the input folder and
//   prints a short diagnostic of what was consolidated.
// - Option [2] computes the dashboard metrics and writes the consolidated
//   workbook, summary, data tables and JSON manifest.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit. `--batch` runs both steps once without prompts.
use clap::Parser;
use once_cell::sync::Lazy;
use rvtools_report::output;
use rvtools_report::reports;
use rvtools_report::util;
use rvtools_report::{ConsolidatedData, Consolidator, ProcessingResult};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Mutex, PoisonError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "rvtools_report")]
#[command(version, about = "Consolidate RVTools exports and report infrastructure metrics")]
struct Cli {
    /// Folder containing RVTools workbooks (.xls, .xlsx, .xlsm)
    #[arg(short, long, default_value = "inputs")]
    input: PathBuf,

    /// Folder that receives the consolidated workbook and reports
    #[arg(short, long, default_value = "outputs")]
    output: PathBuf,

    /// Process and generate reports once, without the menu
    #[arg(long)]
    batch: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// In-memory app state so we only consolidate the folder once but can
// generate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { run: None }));

struct AppState {
    run: Option<(ProcessingResult, ConsolidatedData)>,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask the user whether to go back to the selection menu after
/// generating reports.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: consolidate the input folder.
///
/// Returns `false` when the run itself failed (missing folder, no workbooks).
fn handle_process(cli: &Cli) -> bool {
    let mut consolidator = Consolidator::new();
    let result = consolidator.process_folder_with_progress(&cli.input, |p| {
        tracing::debug!("[{:>3}%] {}", p.percent, p.message);
    });

    if !result.success {
        eprintln!("Processing failed: {}\n", result.message);
        return false;
    }

    println!(
        "Processing folder... ({} of {} files processed, {} VMs, {} hosts)",
        util::format_int(result.files_processed),
        util::format_int(result.files_found),
        util::format_int(result.vms_processed),
        util::format_int(result.hosts_processed)
    );
    if !result.errors.is_empty() {
        println!("Note: {} files could not be read:", result.errors.len());
        for e in &result.errors {
            println!("  - {}", e);
        }
    }
    println!();

    let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    state.run = Some((result, consolidator.into_consolidated_data()));
    true
}

/// Handle option [2]: compute metrics and write every report.
///
/// Prints Markdown previews of each data table to the console.
fn handle_generate_reports(cli: &Cli) -> bool {
    let run = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        state.run.clone()
    };
    let Some((result, data)) = run else {
        println!("Error: No data loaded. Please process the input folder first (option 1).\n");
        return false;
    };

    println!("Generating reports...");
    let bundle = reports::build_reports(&data);
    let manifest = match reports::write_reports(&bundle, &data, &result, &cli.output) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Write error: {}", e);
            return false;
        }
    };
    println!("Outputs saved to {}\n", cli.output.display());

    println!("Dashboard Metrics\n");
    for section in &bundle.summary {
        println!("{}", section.title);
        output::preview_table_rows(&section.lines, section.lines.len());
    }

    println!("VM Power State Distribution\n");
    output::preview_table_rows(&bundle.power_states, 10);
    println!("OS Classification Distribution\n");
    output::preview_table_rows(&bundle.os_classes, 10);
    println!("Top Clusters by VM Count\n");
    output::preview_table_rows(&bundle.clusters, 10);
    println!("Host Utilization Heatmap (RAM x CPU buckets)\n");
    output::preview_table_rows(&bundle.heatmap, 10);
    println!("Resource Allocation by OS Classification (powered-on VMs)\n");
    output::preview_table_rows(&bundle.os_resources, 10);

    println!(
        "Manifest ({}): {{\"status\": \"{}\", \"vcpu_to_pcore_ratio\": {}}}\n",
        reports::manifest_path(&cli.output).display(),
        manifest.status,
        util::format_number(bundle.metrics.vcpu_to_pcore_ratio, 2)
    );
    true
}

fn run_menu(cli: &Cli) {
    loop {
        println!("Select Option:");
        println!("[1] Process RVTools folder ({})", cli.input.display());
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => {
                handle_process(cli);
            }
            "2" => {
                println!();
                handle_generate_reports(cli);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    if cli.batch {
        if handle_process(&cli) && handle_generate_reports(&cli) {
            return ExitCode::SUCCESS;
        }
        return ExitCode::FAILURE;
    }

    run_menu(&cli);
    ExitCode::SUCCESS
}
