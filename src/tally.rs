use crate::filter::{self, FilterError, FilterOptions};
use std::collections::HashMap;
use std::path::Path;

/// Captures the destination-port field of a gateway log record
const DPT_PATTERN: &str = r"DPT=(\d+)";

/// Count how many records in the log mention each destination port.
///
/// Scans the entire file; every `DPT=` occurrence increments its port's
/// count. Ports are keyed by their captured string form.
pub fn tally_port_traffic(
    path: &Path,
    options: &FilterOptions,
) -> Result<HashMap<String, usize>, FilterError> {
    let result = filter::scan(path, DPT_PATTERN, options)?;

    let mut tally: HashMap<String, usize> = HashMap::new();
    for tuple in &result.captures {
        if let Some(Some(port)) = tuple.first() {
            *tally.entry(port.clone()).or_insert(0) += 1;
        }
    }

    Ok(tally)
}
