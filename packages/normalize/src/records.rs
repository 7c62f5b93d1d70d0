//! CSV reader producing loosely-typed records.
//!
//! Every row is returned as a [`serde_json::Value`] object keyed by the
//! trimmed column headers of the first row. Values are kept as trimmed
//! strings; typing happens later in the normalizer. Bytes that are not
//! valid UTF-8 are replaced with U+FFFD rather than failing the record.

use std::io::Read;
use std::path::Path;

use crate::NormalizeError;

/// Parses CSV text from `reader` into record objects.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the input has no header row or the CSV
/// is malformed.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<serde_json::Value>, NormalizeError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| lossy_field(h).trim_start_matches('\u{feff}').trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(NormalizeError::Parse(
            "CSV file contains no header row".to_owned(),
        ));
    }

    let mut records = Vec::new();

    for result in reader.byte_records() {
        let record = result?;

        let mut map = serde_json::Map::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = record.get(i).map_or_else(String::new, |v| {
                lossy_field(v).trim().to_owned()
            });
            map.insert(header.clone(), serde_json::Value::String(value));
        }
        records.push(serde_json::Value::Object(map));
    }

    log::debug!("Parsed {} CSV records", records.len());

    Ok(records)
}

fn lossy_field(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    let text = String::from_utf8_lossy(bytes);
    if matches!(text, std::borrow::Cow::Owned(_)) {
        log::debug!("Replaced invalid UTF-8 in CSV field {text:?}");
    }
    text
}

/// Reads and parses the CSV file at `path`.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the file cannot be opened or parsed.
pub fn read_csv_file(path: &Path) -> Result<Vec<serde_json::Value>, NormalizeError> {
    let file = std::fs::File::open(path)?;
    let records = read_records(std::io::BufReader::new(file))?;
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}
