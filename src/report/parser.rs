//! Report payload parsing
//!
//! Downloaded reports are single-entry zip archives holding a UTF-8 CSV.
//! The vendor prefixes the header line with a control byte that must be
//! stripped before the header can be split, and some CSV headers drifted
//! from the documented column names, so each header goes through the alias
//! table before rows are typed.

use crate::catalog::{column_alias, report_field_type};
use crate::error::{Error, Result};
use crate::types::{FieldType, JsonObject, JsonValue};
use std::io::{Cursor, Read};

/// Extract the CSV payload from a downloaded report archive
pub fn extract_csv(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::archive(format!("not a valid zip archive: {e}")))?;

    if archive.is_empty() {
        return Err(Error::archive("archive contains no entries"));
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| Error::archive(format!("cannot read archive entry: {e}")))?;

    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| Error::archive(format!("entry is not valid UTF-8: {e}")))?;

    Ok(contents)
}

/// Parse report CSV into typed records for a report stream
///
/// Field names come from the header line; each cell is coerced using the
/// stream's static field-type table, defaulting to string.
pub fn parse_report_csv(stream: &str, csv: &str) -> Result<Vec<JsonValue>> {
    let mut lines = csv.lines();

    let Some(header_line) = lines.next() else {
        return Ok(Vec::new());
    };

    // Vendor quirk: the header line starts with a control byte
    let header_line = header_line.trim_start_matches(char::is_control);

    let headers: Vec<String> = parse_csv_line(header_line)
        .into_iter()
        .map(|h| column_alias(&h).to_string())
        .collect();

    if headers.is_empty() {
        return Err(Error::csv("report CSV has an empty header line"));
    }

    let mut records = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_csv_line(line);
        let mut record = JsonObject::new();
        for (i, header) in headers.iter().enumerate() {
            let raw = fields.get(i).map(String::as_str).unwrap_or_default();
            let field_type = report_field_type(stream, header);
            record.insert(header.clone(), coerce(field_type, raw));
        }
        records.push(JsonValue::Object(record));
    }

    Ok(records)
}

/// Coerce one CSV cell per its declared field type
fn coerce(field_type: FieldType, raw: &str) -> JsonValue {
    if raw.is_empty() {
        return JsonValue::Null;
    }

    match field_type {
        FieldType::Integer => raw
            .parse::<i64>()
            .map(|n| JsonValue::Number(n.into()))
            .unwrap_or_else(|_| JsonValue::String(raw.to_string())),
        FieldType::Number => raw
            // Percent cells like "1.25%" come back from Ctr columns
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(raw.to_string())),
        FieldType::Boolean => match raw.to_lowercase().as_str() {
            "true" => JsonValue::Bool(true),
            "false" => JsonValue::Bool(false),
            _ => JsonValue::String(raw.to_string()),
        },
        _ => JsonValue::String(raw.to_string()),
    }
}

/// Split one CSV line into fields, honoring quoting and escaped quotes
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                in_quotes = true;
            }
        } else if c == ',' && !in_quotes {
            fields.push(current.trim().to_string());
            current = String::new();
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
pub(crate) fn zip_csv(csv: &str) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        writer
            .start_file("report.csv", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(csv.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    buf.into_inner()
}
