use csv::ReaderBuilder;
use std::fs;
use std::path::Path;

use crate::error::InputError;
use crate::models::{BoundColumns, ColumnMapping, Row, Table};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const SNIFF_LINES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &str) -> Result<Self, InputError> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(InputFormat::Csv),
            "dta" => Err(InputError::UnsupportedFormat {
                path: path.to_string(),
                reason: "Stata .dta is not read directly; export it to CSV first".into(),
            }),
            "" => Err(InputError::UnsupportedFormat {
                path: path.to_string(),
                reason: "file has no extension".into(),
            }),
            other => Err(InputError::UnsupportedFormat {
                path: path.to_string(),
                reason: format!("unknown extension .{}", other),
            }),
        }
    }
}

/// Count delimiter occurrences outside double-quoted sections.
fn count_unquoted(line: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            n += 1;
        }
    }
    n
}

/// Guess the field delimiter from the first lines of a file.
///
/// A candidate that appears on the header and the same number of times on
/// every sampled line wins over one that does not; among equals the higher
/// header count wins, then the earlier candidate. Defaults to `,`.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    let Some(header) = lines.first() else {
        return b',';
    };
    let mut best: Option<(bool, usize, u8)> = None;
    for &d in &CANDIDATE_DELIMITERS {
        let head_count = count_unquoted(header, d);
        if head_count == 0 {
            continue;
        }
        let consistent = lines.iter().all(|l| count_unquoted(l, d) == head_count);
        let better = match best {
            None => true,
            Some((bc, bn, _)) => (consistent, head_count) > (bc, bn),
        };
        if better {
            best = Some((consistent, head_count, d));
        }
    }
    best.map(|(_, _, d)| d).unwrap_or(b',')
}

/// Load a delimited UTF-8 file with a header row.
pub fn read_table(path: &str, delimiter: Option<u8>) -> Result<Table, InputError> {
    InputFormat::from_path(path)?;
    let bytes = fs::read(path).map_err(|e| InputError::Unreadable {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    let content = String::from_utf8(bytes).map_err(|e| InputError::Unreadable {
        path: path.to_string(),
        reason: format!("not valid UTF-8 ({})", e.utf8_error()),
    })?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let delim = delimiter.unwrap_or_else(|| sniff_delimiter(content));
    log::debug!("Reading {} with delimiter {:?}", path, delim as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(true)
        .from_reader(content.as_bytes());
    let malformed = |e: csv::Error| InputError::Malformed {
        path: path.to_string(),
        line: e.position().map(|p| p.line()).unwrap_or(0),
        reason: e.to_string(),
    };
    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(InputError::Unreadable {
            path: path.to_string(),
            reason: "file has no header row".into(),
        });
    }

    let mut rows = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(malformed)?;
        rows.push(Row {
            values: rec.iter().map(str::to_string).collect(),
        });
    }
    Ok(Table { headers, rows })
}

fn find_column(table: &Table, column: &str, side: &'static str) -> Result<usize, InputError> {
    table
        .column_index(column)
        .ok_or_else(|| InputError::MissingColumn {
            table: side,
            column: column.to_string(),
        })
}

/// Resolve every configured column name to its position in `table`.
pub fn bind_columns(
    table: &Table,
    mapping: &ColumnMapping,
    side: &'static str,
) -> Result<BoundColumns, InputError> {
    let id = find_column(table, &mapping.id, side)?;
    let name = find_column(table, &mapping.name, side)?;
    let year = mapping
        .year
        .as_deref()
        .map(|c| find_column(table, c, side))
        .transpose()?;
    let quarter = mapping
        .quarter
        .as_deref()
        .map(|c| find_column(table, c, side))
        .transpose()?;
    Ok(BoundColumns {
        id,
        name,
        year,
        quarter,
    })
}
