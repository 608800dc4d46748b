//! NDJSON line codec
//!
//! One record per line, compact JSON, newline-terminated.
//!
//! Decoding is lenient: blank lines are ignored and lines that are not a
//! JSON object are skipped and counted rather than failing the read.

use serde_json::Value;

use super::Record;

/// Records decoded from a table file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableScan {
    /// Records in file (insertion) order
    pub records: Vec<Record>,

    /// Non-blank lines that did not decode as a JSON object
    pub skipped_lines: u64,
}

/// Encode a record as a single NDJSON line (trailing `\n` included)
pub fn encode_record(record: &Record) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    Ok(line)
}

/// Decode every line of a table file
pub fn decode_records(contents: &[u8]) -> TableScan {
    let mut scan = TableScan::default();

    for (index, line) in contents.split(|&b| b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match decode_line(line) {
            Some(record) => scan.records.push(record),
            None => {
                tracing::debug!("Skipping undecodable line {}", index + 1);
                scan.skipped_lines += 1;
            }
        }
    }

    scan
}

/// Decode one line; `None` unless it is exactly one JSON object
fn decode_line(line: &[u8]) -> Option<Record> {
    match serde_json::from_slice::<Value>(line) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
