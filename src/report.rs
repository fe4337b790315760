use crate::filter::{self, CaptureTuple, FilterError, FilterOptions};
use chrono::{DateTime, Local};
use colored::Colorize;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEPARATOR: &str =
    "════════════════════════════════════════════════════════════════════";
const THIN_SEP: &str =
    "────────────────────────────────────────────────────────────────────";

const PORT_TRAFFIC_HEADER: [&str; 6] = [
    "Date",
    "Time",
    "Source IP",
    "Destination IP",
    "Source Port",
    "Destination Port",
];

const INVALID_USER_HEADER: [&str; 3] = ["Timestamp", "Username", "Source IP"];

/// Errors that can occur while generating a report artifact
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("could not write CSV report '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("could not write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Write a CSV report of all traffic to one destination port.
///
/// Each row carries (date, time, source IP, destination IP, source port,
/// destination port). The pattern embeds the target port so only records
/// whose `DPT` field equals it exactly are captured. Returns the path of
/// the written file; zero matches still produce a header-only report.
pub fn generate_port_traffic_report(
    log_path: &Path,
    port: &str,
    out_dir: &Path,
    options: &FilterOptions,
) -> Result<PathBuf, ReportError> {
    let pattern = format!(
        r"^([A-Za-z]{{3}}\s+\d{{1,2}})\s(\d{{2}}:\d{{2}}:\d{{2}}).*SRC=(\S+)\s+DST=(\S+).*SPT=(\d+)\s+DPT=({})\b",
        regex::escape(port)
    );
    let result = filter::scan(log_path, &pattern, options)?;

    let report_path = out_dir.join(format!("destination_port_{port}_report.csv"));
    write_csv(&report_path, &PORT_TRAFFIC_HEADER, &result.captures)?;
    Ok(report_path)
}

/// Write a CSV report of attempted logins with invalid usernames.
///
/// Targets the conventional sshd line shape
/// `<timestamp> <host> sshd[pid]: Invalid user <name> from <ip> ...`,
/// capturing the syslog timestamp, the rejected username, and the source IP.
pub fn generate_invalid_user_report(
    log_path: &Path,
    out_dir: &Path,
    options: &FilterOptions,
) -> Result<PathBuf, ReportError> {
    // sshd spells the marker "Invalid user"; keep that casing so the
    // report survives case-sensitive runs
    let pattern =
        r"^([A-Za-z]{3}\s+\d{1,2}\s\d{2}:\d{2}:\d{2}).*sshd.*Invalid user (\S+) from (\S+)";
    let result = filter::scan(log_path, pattern, options)?;

    let report_path = out_dir.join("invalid_users.csv");
    write_csv(&report_path, &INVALID_USER_HEADER, &result.captures)?;
    Ok(report_path)
}

/// Write a plain-text `.log` file of every record whose source field is the
/// given IP address, verbatim and one per line.
///
/// The filename encodes the IP with every non-alphanumeric character
/// replaced by `_`.
pub fn generate_source_ip_log(
    log_path: &Path,
    ip_address: &str,
    out_dir: &Path,
    options: &FilterOptions,
) -> Result<PathBuf, ReportError> {
    // \b keeps 1.2.3.4 from matching inside SRC=1.2.3.45
    let pattern = format!(r"SRC={}\b", regex::escape(ip_address));
    let result = filter::scan(log_path, &pattern, options)?;

    let log_name = format!("source_ip_{}.log", sanitize_for_filename(ip_address));
    let out_path = out_dir.join(log_name);

    let file = File::create(&out_path).map_err(|e| ReportError::Io {
        path: out_path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    for record in &result.records {
        writeln!(writer, "{record}").map_err(|e| ReportError::Io {
            path: out_path.display().to_string(),
            source: e,
        })?;
    }
    writer.flush().map_err(|e| ReportError::Io {
        path: out_path.display().to_string(),
        source: e,
    })?;

    Ok(out_path)
}

/// Replace every non-alphanumeric character with `_` so the value is safe
/// inside a filename
fn sanitize_for_filename(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Write `tuples` as CSV rows under a fixed header. Absent capture entries
/// become empty fields.
fn write_csv(path: &Path, header: &[&str], tuples: &[CaptureTuple]) -> Result<(), ReportError> {
    let csv_err = |e: csv::Error| ReportError::Csv {
        path: path.display().to_string(),
        source: e,
    };

    let mut writer = csv::Writer::from_path(path).map_err(&csv_err)?;
    writer.write_record(header).map_err(&csv_err)?;
    for tuple in tuples {
        writer
            .write_record(tuple.iter().map(|group| group.as_deref().unwrap_or("")))
            .map_err(&csv_err)?;
    }
    writer.flush().map_err(|e| ReportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// Machine-readable summary of one run, for `--json-summary`
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Local>,
    pub source_file: String,
    pub ports_seen: usize,
    pub port_report_threshold: usize,
    pub artifacts: Vec<String>,
}

impl RunSummary {
    pub fn new(
        source_file: &Path,
        tally: &HashMap<String, usize>,
        port_report_threshold: usize,
        artifacts: &[PathBuf],
    ) -> Self {
        RunSummary {
            generated_at: Local::now(),
            source_file: source_file.display().to_string(),
            ports_seen: tally.len(),
            port_report_threshold,
            artifacts: artifacts.iter().map(|p| p.display().to_string()).collect(),
        }
    }
}

/// Export the run summary as pretty-printed JSON to the given path
pub fn export_summary_json(summary: &RunSummary, path: &Path) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(summary).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("serialization failed: {}", e),
        )
    })?;
    std::fs::write(path, json)
}

/// Print a fully formatted run report to stdout
pub fn print_report(
    tally: &HashMap<String, usize>,
    min_count: usize,
    artifacts: &[PathBuf],
    source_file: &Path,
) {
    println!("\n{}", SEPARATOR.cyan().bold());
    println!("{}", "  📋  GATEWAY LOG REPORT".white().bold());
    println!("{}", SEPARATOR.cyan().bold());
    println!("  Source : {}", source_file.display().to_string().yellow());
    println!();

    // ── Port traffic ──────────────────────────────────────────────────────────
    section_header("DESTINATION PORT TRAFFIC");
    if tally.is_empty() {
        println!("  (no destination ports found)");
    } else {
        let total: usize = tally.values().sum();

        println!("  {:<8}  {:>8}  {:>8}", "Port", "Records", "Share");
        // ─ is 3 bytes wide; slice only at multiples of 3
        println!("  {}", &THIN_SEP[..51]);
        for (port, count) in ranked_ports(tally) {
            let pct = (*count as f64 / total as f64) * 100.0;
            let bar = mini_bar(pct, 20);
            let port_label = if *count >= min_count {
                port.red().bold()
            } else {
                port.cyan()
            };
            println!("  {:<8}  {:>8}  {:>7.2}%  {}", port_label, count, pct, bar);
        }
        println!();
        let reported = tally.values().filter(|&&c| c >= min_count).count();
        println!(
            "  {} port(s) at or above the {}-record report threshold",
            reported.to_string().bold(),
            min_count
        );
    }
    println!();

    // ── Artifacts ─────────────────────────────────────────────────────────────
    section_header("GENERATED ARTIFACTS");
    if artifacts.is_empty() {
        println!("  (none)");
    } else {
        for path in artifacts {
            println!("  {} {}", "✓".green(), path.display().to_string().yellow());
        }
    }

    println!("\n{}\n", SEPARATOR.cyan());
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Tally entries sorted by record count descending, then port ascending
fn ranked_ports(tally: &HashMap<String, usize>) -> Vec<(&String, &usize)> {
    let mut ports: Vec<(&String, &usize)> = tally.iter().collect();
    ports.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    ports
}

fn section_header(title: &str) {
    println!("  {} {}", "▶".cyan(), title.white().bold());
    println!("  {}", THIN_SEP);
}

/// Renders a compact ASCII progress bar of the given width
fn mini_bar(pct: f64, width: usize) -> String {
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    let empty = width - filled;
    format!(
        "{}{}",
        "█".repeat(filled).green(),
        "░".repeat(empty).dimmed()
    )
}

// ─── Unit Tests ──────────────────────────────────────────────────────────────
