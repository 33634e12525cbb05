//! Per-cell CSV field formatting.
//!
//! Cells arrive as [`calamine::Data`] and are classified into three source
//! kinds — blank, numeric, string — before the owning column's
//! [`ColumnType`] decides the rendering. Str and Table fields are
//! double-quoted with no escaping of embedded quotes or delimiters; that is
//! a documented limitation of the output format, not something this module
//! repairs.

use calamine::{Data, Range};

use crate::header::ColumnType;

/// Source kind of a decoded cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CellKind<'a> {
    Blank,
    Number(f64),
    Text(&'a str),
}

impl<'a> CellKind<'a> {
    /// Classify a calamine cell value.
    ///
    /// Numeric covers every numeric sub-encoding calamine surfaces,
    /// including formula results (which arrive as plain values) and date
    /// serials. Booleans count as numeric (0/1). Error values carry neither
    /// usable text nor a number and are treated as blank.
    pub(crate) fn classify(data: &'a Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Blank,
            Data::Int(v) => Self::Number(*v as f64),
            Data::Float(v) => Self::Number(*v),
            Data::DateTime(v) => Self::Number(v.as_f64()),
            Data::Bool(v) => Self::Number(if *v { 1.0 } else { 0.0 }),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s),
        }
    }
}

/// Cell at an absolute `(row, col)` position; `None` outside the used range.
pub(crate) fn cell_at(range: &Range<Data>, row: usize, col: usize) -> Option<&Data> {
    range.get_value((row as u32, col as u32))
}

/// Whether a cell position is blank. Positions outside the decoded range
/// count as blank.
pub(crate) fn is_blank(data: Option<&Data>) -> bool {
    data.map_or(true, |d| CellKind::classify(d) == CellKind::Blank)
}

/// Render a numeric value: integer text when exactly integral, `f64`
/// Display otherwise.
fn number_to_string(value: f64) -> String {
    if value.round() == value && value.abs() <= i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Normalize a string that is entirely a numeric literal.
///
/// The whole input must be consumed by the parse; `"007"` becomes `"7"`,
/// `"1.50"` becomes `"1.5"`, and anything that is not purely a number
/// (`"abc"`, `"7x"`, `""`) returns `None`.
pub fn try_normalize_numeric_string(text: &str) -> Option<String> {
    let value: f64 = text.parse().ok()?;
    Some(number_to_string(value))
}

/// Format one cell as a CSV field for a column of type `ty`.
///
/// Returns `None` for Comment columns: they emit no field and do not take
/// part in comma separation at all.
pub fn format_field(ty: ColumnType, cell: Option<&Data>) -> Option<String> {
    let kind = cell.map_or(CellKind::Blank, CellKind::classify);
    match ty {
        ColumnType::Comment => None,
        ColumnType::Int => {
            let value = match kind {
                CellKind::Number(v) => v,
                _ => 0.0,
            };
            Some(format!("{}", value.round() as i64))
        }
        ColumnType::Float => {
            let value = match kind {
                CellKind::Number(v) => v,
                _ => 0.0,
            };
            // Exactly-zero floats keep an explicit decimal point.
            Some(if value == 0.0 {
                "0.0".to_owned()
            } else {
                format!("{value}")
            })
        }
        ColumnType::Str => {
            let content = match kind {
                CellKind::Text(s) => {
                    try_normalize_numeric_string(s).unwrap_or_else(|| s.to_owned())
                }
                CellKind::Number(v) => number_to_string(v),
                CellKind::Blank => String::new(),
            };
            Some(format!("\"{content}\""))
        }
        ColumnType::Table => {
            let content = match kind {
                CellKind::Text(s) => s,
                _ => "",
            };
            Some(format!("\"{content}\""))
        }
    }
}
