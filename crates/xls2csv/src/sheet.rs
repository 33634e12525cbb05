//! Per-sheet conversion: header parse, then row-by-row formatting until the
//! terminating blank row.

use std::path::Path;

use calamine::{Data, Range};

use crate::cell::{cell_at, format_field, is_blank};
use crate::header::parse_header;
use crate::Error;

/// Cache key / output file name for one converted sheet:
/// `<lowercased file stem>_<lowercased sheet name>.csv`.
pub fn artifact_key(path: &Path, sheet: &str) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    format!("{}_{}.csv", stem.to_lowercase(), sheet.to_lowercase())
}

/// Convert one decoded sheet into CSV text.
///
/// Row 0 is the header; every later row is formatted until the first row
/// whose cells in `[0, effective_columns)` are all blank. That row and
/// everything after it are discarded. A sheet with no such row converts in
/// full.
pub fn convert_sheet(sheet: &str, range: &Range<Data>) -> Result<String, Error> {
    // An empty range still has a (vacuously blank) header row.
    let (last_row, last_col) = match range.end() {
        Some((row, col)) => (row as usize, col as usize),
        None => (0, 0),
    };

    let header = parse_header(sheet, range, last_col)?;
    let effective = header.effective_columns();
    let mut csv = header.header_line();

    for row in 1..=last_row {
        let terminator = (0..effective).all(|col| is_blank(cell_at(range, row, col)));
        if terminator {
            break;
        }

        let fields: Vec<String> = (0..effective)
            .filter_map(|col| format_field(header.column_type(col), cell_at(range, row, col)))
            .collect();
        csv.push_str(&fields.join(","));
        csv.push('\n');
    }

    Ok(csv)
}
