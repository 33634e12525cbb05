//! Typed header inference.
//!
//! Row 0 of every sheet declares the output schema. Each header cell is
//! `<type-keyword>_<display-name>`, where the keyword is one of `int`,
//! `float`, `str`, `table` (case-insensitive). Cells without a recognized
//! keyword become [`ColumnType::Comment`] and the whole column is dropped
//! from the output.

use std::collections::BTreeMap;

use calamine::{Data, Range};

use crate::cell::{cell_at, is_blank, CellKind};
use crate::Error;

/// Output type of one column, inferred from its header prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnType {
    /// Not part of the output. Both the explicit fallback for unrecognized
    /// keywords and the type of columns with blank header cells.
    #[default]
    Comment,
    Int,
    Float,
    Str,
    Table,
}

impl ColumnType {
    /// Map a header prefix keyword to a column type.
    ///
    /// Unrecognized or empty keywords map to [`ColumnType::Comment`].
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "int" => Self::Int,
            "float" => Self::Float,
            "str" => Self::Str,
            "table" => Self::Table,
            _ => Self::Comment,
        }
    }
}

/// Display name and inferred type of one declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnDescriptor {
    /// Build a descriptor from the raw header cell text.
    ///
    /// Only a recognized keyword before the first `_` is stripped from the
    /// name; `_foo` and `id` keep their full text and stay `Comment`.
    fn from_header_text(text: &str) -> Self {
        if let Some(pos) = text.find('_') {
            let ty = ColumnType::from_keyword(&text[..pos]);
            if ty != ColumnType::Comment {
                return Self {
                    name: text[pos + 1..].to_owned(),
                    ty,
                };
            }
        }
        Self {
            name: text.to_owned(),
            ty: ColumnType::Comment,
        }
    }
}

/// Parsed header row: descriptors keyed by absolute column index, plus the
/// number of declared columns considered for every subsequent data row.
#[derive(Debug, Clone)]
pub struct Header {
    columns: BTreeMap<usize, ColumnDescriptor>,
    effective_columns: usize,
}

impl Header {
    /// Number of columns before the first run of trailing blank header
    /// cells. Frozen once at parse time and reused for every data row.
    pub fn effective_columns(&self) -> usize {
        self.effective_columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(&index)
    }

    /// Type of a column; columns with no descriptor (blank header cells
    /// mid-row) are `Comment`.
    pub fn column_type(&self, index: usize) -> ColumnType {
        self.columns.get(&index).map(|c| c.ty).unwrap_or_default()
    }

    /// The CSV header line: non-Comment column names in ascending column
    /// order, comma-separated, newline-terminated.
    pub fn header_line(&self) -> String {
        let names: Vec<&str> = (0..self.effective_columns)
            .filter_map(|idx| self.columns.get(&idx))
            .filter(|c| c.ty != ColumnType::Comment)
            .map(|c| c.name.as_str())
            .collect();
        let mut line = names.join(",");
        line.push('\n');
        line
    }
}

/// Parse row 0 of a sheet into a [`Header`].
///
/// Scans columns left to right up to `last_col` (inclusive). A blank cell
/// whose remainder-of-row is entirely blank ends the declared columns; a
/// blank cell followed by more content is skipped and its column stays
/// `Comment`. A numeric cell makes the header invalid and aborts this sheet.
pub fn parse_header(sheet: &str, range: &Range<Data>, last_col: usize) -> Result<Header, Error> {
    let mut columns = BTreeMap::new();
    let mut effective_columns = last_col + 1;

    for col in 0..=last_col {
        match cell_at(range, 0, col).map_or(CellKind::Blank, CellKind::classify) {
            CellKind::Blank => {
                let rest_blank = (col..=last_col).all(|c| is_blank(cell_at(range, 0, c)));
                if rest_blank {
                    effective_columns = col;
                    break;
                }
            }
            CellKind::Number(_) => {
                return Err(Error::InvalidHeader {
                    sheet: sheet.to_owned(),
                    col,
                });
            }
            CellKind::Text(text) => {
                columns.insert(col, ColumnDescriptor::from_header_text(text));
            }
        }
    }

    Ok(Header {
        columns,
        effective_columns,
    })
}
