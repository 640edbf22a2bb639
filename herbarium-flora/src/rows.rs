//! Row decoding for the curated CSV exports
//!
//! The source spreadsheets are produced on Windows and sometimes re-saved
//! on a Mac, so every field is transcoded from Windows-1252 individually
//! and the reader tolerates either line-ending convention. Column names
//! come from the first record and are lowercased for case-insensitive
//! lookup unless the caller asks for exact names (the character matrices
//! carry meaningful case in their suffixes).

use std::fs::File;
use std::path::Path;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use indexmap::IndexMap;

use herbarium_core::{HerbariumError, HerbariumResult};

// A UTF-8 byte-order mark decoded as Windows-1252 comes out as "ï»¿".
const BOM_AS_1252: &str = "\u{ef}\u{bb}\u{bf}";

/// One decoded record, field name to text value
#[derive(Debug, Clone)]
pub struct Row {
    fields: IndexMap<String, String>,
}

impl Row {
    /// Value of a column, if the file has it
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Value of a column, empty when the file lacks it
    pub fn field(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// All (column, value) pairs in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Lazy row sequence over one CSV file; re-open the file to restart
pub struct CsvRows {
    reader: csv::Reader<File>,
    headers: Vec<String>,
    record: ByteRecord,
    line: u64,
}

impl CsvRows {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvRows {
    type Item = HerbariumResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.line += 1;
                if self.record.len() != self.headers.len() {
                    return Some(Err(HerbariumError::Decode(format!(
                        "record {} has {} fields, expected {}",
                        self.line,
                        self.record.len(),
                        self.headers.len()
                    ))));
                }
                let fields = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(self.record.iter().map(decode_field))
                    .collect();
                Some(Ok(Row { fields }))
            }
            Err(e) => Some(Err(HerbariumError::Decode(e.to_string()))),
        }
    }
}

/// Open a CSV file with lowercased, trimmed column names
pub fn open_csv(path: &Path) -> HerbariumResult<CsvRows> {
    open_with(path, true)
}

/// Open a CSV file preserving column-name case
pub fn open_csv_exact(path: &Path) -> HerbariumResult<CsvRows> {
    open_with(path, false)
}

/// Just the (lowercased) header row, for column-presence checks
pub fn csv_headers(path: &Path) -> HerbariumResult<Vec<String>> {
    Ok(open_csv(path)?.headers.clone())
}

fn open_with(path: &Path, lower: bool) -> HerbariumResult<CsvRows> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let raw = reader
        .byte_headers()
        .map_err(|e| HerbariumError::Decode(e.to_string()))?;

    let mut headers = Vec::with_capacity(raw.len());
    for (i, field) in raw.iter().enumerate() {
        let mut name = decode_field(field);
        if i == 0 {
            name = name
                .trim_start_matches('\u{feff}')
                .trim_start_matches(BOM_AS_1252)
                .to_string();
        }
        let name = name.trim();
        headers.push(if lower {
            name.to_lowercase()
        } else {
            name.to_string()
        });
    }

    Ok(CsvRows {
        reader,
        headers,
        record: ByteRecord::new(),
        line: 1,
    })
}

fn decode_field(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}
