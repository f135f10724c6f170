use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bus::Publisher;
use super::error::ReplayError;

/// One recorded message: the channel it was published on and its JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub channel: String,
    pub payload: Value,
}

/// Load a JSON-lines message log. Blank lines and `#` comments are skipped.
pub fn load_replay(path: &Path) -> Result<Vec<ReplayRecord>, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(trimmed).map_err(|source| ReplayError::Record {
            line: i + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Publish every record in order. Returns how many were sent.
pub fn replay(records: &[ReplayRecord], publisher: &Publisher) -> Result<usize, ReplayError> {
    for record in records {
        publisher.publish(&record.channel, record.payload.to_string().into_bytes())?;
    }
    Ok(records.len())
}
