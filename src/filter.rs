use regex::RegexBuilder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// One captured group set from a matched record: one entry per parenthesized
/// group in the pattern, `None` when an optional group did not participate.
pub type CaptureTuple = Vec<Option<String>>;

/// The output of one filter pass over a log file.
///
/// `records` holds every matching line (trailing newline stripped) in file
/// order. `captures` holds one tuple per matching line in which at least one
/// capture group participated, so `records.len() >= captures.len()` always.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MatchResult {
    pub records: Vec<String>,
    pub captures: Vec<CaptureTuple>,
}

/// Configuration for a filter pass
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Match without regard to letter case (the default)
    pub case_insensitive: bool,
    /// Echo every matched record to stdout
    pub print_records: bool,
    /// Print a one-line summary of the pass to stdout
    pub print_summary: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            case_insensitive: true,
            print_records: false,
            print_summary: false,
        }
    }
}

/// Errors that can occur during a filter pass
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid filter pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Scan a log file line by line, collecting every record that matches
/// `pattern` along with the capture groups of the first match in each record.
///
/// Records keep their file order. I/O failures and malformed patterns
/// propagate to the caller; the CLI layer owns the user-facing message.
pub fn scan(
    path: &Path,
    pattern: &str,
    options: &FilterOptions,
) -> Result<MatchResult, FilterError> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(options.case_insensitive)
        .build()
        .map_err(|e| FilterError::Pattern {
            pattern: pattern.to_string(),
            source: e,
        })?;

    let file = File::open(path).map_err(|e| FilterError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let has_groups = re.captures_len() > 1;
    let mut result = MatchResult::default();

    for line_result in reader.lines() {
        // lines() strips the trailing terminator for us
        let line = line_result.map_err(|e| FilterError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let Some(caps) = re.captures(&line) else {
            continue;
        };

        if has_groups {
            let tuple: CaptureTuple = caps
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect();
            // A line whose optional groups are all absent yields a record
            // but no tuple
            if tuple.iter().any(Option::is_some) {
                result.captures.push(tuple);
            }
        }

        result.records.push(line);
    }

    if options.print_records {
        for record in &result.records {
            println!("{record}");
        }
    }

    if options.print_summary {
        println!(
            "{} records match pattern \"{}\" (case-{}sensitive)",
            result.records.len(),
            pattern,
            if options.case_insensitive { "in" } else { "" }
        );
    }

    Ok(result)
}

// ─── Unit Tests ──────────────────────────────────────────────────────────────
