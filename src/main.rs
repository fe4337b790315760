mod filter;
mod report;
mod tally;

use clap::Parser;
use filter::FilterOptions;
use std::fmt::Display;
use std::fs::File;
use std::path::PathBuf;

/// A CLI tool for generating traffic and security reports from gateway firewall logs
#[derive(Parser, Debug)]
#[command(
    name = "gateway_log_reports",
    author,
    version,
    about = "Scans a gateway log file and generates port traffic, invalid-login, and source-IP reports"
)]
struct Args {
    /// Path to the gateway log file
    #[arg(value_name = "LOG_FILE")]
    file: PathBuf,

    /// Minimum record count for a destination port to get its own CSV report
    #[arg(short = 'm', long = "min-count", default_value_t = 100, value_name = "COUNT")]
    min_count: usize,

    /// Source IP whose records are extracted into a plain-text log
    #[arg(
        short = 's',
        long = "source-ip",
        default_value = "220.195.35.40",
        value_name = "IP"
    )]
    source_ip: String,

    /// Directory where report files are written
    #[arg(short = 'o', long = "output-dir", default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// Match patterns exactly instead of the default case-insensitive matching
    #[arg(long = "case-sensitive")]
    case_sensitive: bool,

    /// Echo every matched record to stdout during each filter pass
    #[arg(long = "print-matches")]
    print_matches: bool,

    /// Print a one-line summary after each filter pass
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Export a JSON run summary to the specified file path
    #[arg(short = 'j', long = "json-summary", value_name = "OUTPUT_FILE")]
    json_summary: Option<PathBuf>,
}

fn fatal(e: impl Display) -> ! {
    eprintln!("error: {}", e);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    // Confirm the log file is readable before any report step runs
    if let Err(e) = File::open(&args.file) {
        eprintln!(
            "error: could not open file '{}': {}",
            args.file.display(),
            e
        );
        std::process::exit(1);
    }

    if let Err(e) = std::fs::create_dir_all(&args.output_dir) {
        eprintln!(
            "error: could not create output directory '{}': {}",
            args.output_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let options = FilterOptions {
        case_insensitive: !args.case_sensitive,
        print_records: args.print_matches,
        print_summary: args.verbose,
    };

    // Determine how much traffic is on each destination port
    let port_tally =
        tally::tally_port_traffic(&args.file, &options).unwrap_or_else(|e| fatal(e));

    let mut artifacts: Vec<PathBuf> = Vec::new();

    // Ports at or above the threshold each get their own CSV report,
    // in ascending port order for deterministic output
    let mut busy_ports: Vec<&String> = port_tally
        .iter()
        .filter(|(_, &count)| count >= args.min_count)
        .map(|(port, _)| port)
        .collect();
    busy_ports.sort_by_key(|port| port.parse::<u64>().unwrap_or(u64::MAX));

    for port in busy_ports {
        let path =
            report::generate_port_traffic_report(&args.file, port, &args.output_dir, &options)
                .unwrap_or_else(|e| fatal(e));
        artifacts.push(path);
    }

    // Report of attempted invalid-user logins
    let path = report::generate_invalid_user_report(&args.file, &args.output_dir, &options)
        .unwrap_or_else(|e| fatal(e));
    artifacts.push(path);

    // Log subset for the investigated source IP
    let path =
        report::generate_source_ip_log(&args.file, &args.source_ip, &args.output_dir, &options)
            .unwrap_or_else(|e| fatal(e));
    artifacts.push(path);

    report::print_report(&port_tally, args.min_count, &artifacts, &args.file);

    // Optionally export the JSON run summary
    if let Some(json_path) = &args.json_summary {
        let summary = report::RunSummary::new(&args.file, &port_tally, args.min_count, &artifacts);
        match report::export_summary_json(&summary, json_path) {
            Ok(_) => println!("\n✓ JSON summary saved to '{}'", json_path.display()),
            Err(e) => {
                eprintln!("error: failed to write JSON summary: {}", e);
                std::process::exit(1);
            }
        }
    }
}
