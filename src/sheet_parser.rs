//! Workbook reading for Excel (.xlsx/.xls/.xlsb) and OpenDocument (.ods) files.
//!
//! Cells are stringified deterministically, independent of host locale.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{Duration, NaiveDate};
use std::io::Cursor;
use tracing::warn;

use crate::engines::SpreadsheetReader;
use crate::error::{EngineError, EngineResult};

/// One worksheet as rows of cell text.
///
/// Rows start at column A; trailing blank cells of a row are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Every worksheet, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<SheetGrid>,
}

/// Workbook reader backed by calamine.
pub struct CalamineReader;

impl SpreadsheetReader for CalamineReader {
    fn read(&self, data: &[u8]) -> EngineResult<Workbook> {
        parse_workbook(data)
    }
}

/// Parse any workbook format calamine recognises.
///
/// A sheet that fails to load is kept with no rows, so the sheet count still
/// reflects the workbook.
pub fn parse_workbook(data: &[u8]) -> EngineResult<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| EngineError::decode("spreadsheet", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in sheet_names {
        let rows = match workbook.worksheet_range(&name) {
            Ok(range) => range_to_rows(&range),
            Err(e) => {
                warn!("Unreadable sheet '{}': {}", name, e);
                Vec::new()
            }
        };
        sheets.push(SheetGrid { name, rows });
    }

    Ok(Workbook { sheets })
}

/// Convert a calamine Range into rows anchored at column A.
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .map(|row| {
            let mut values: Vec<String> = std::iter::repeat(String::new())
                .take(leading)
                .chain(row.iter().map(cell_to_string))
                .collect();
            while values.last().is_some_and(|v| v.trim().is_empty()) {
                values.pop();
            }
            values
        })
        .collect()
}

/// Convert a calamine cell to a string representation.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Avoid trailing ".0" for whole numbers
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_string(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}

/// Serial of 10000-01-01, one past the last date Excel can represent.
const MAX_EXCEL_SERIAL: f64 = 2_958_466.0;

/// Convert an Excel serial date number to `YYYY-MM-DD[ HH:MM:SS]`.
///
/// Uses the 1900 date system, including its phantom 1900-02-29 (serial 60).
/// Serials outside 0..=9999-12-31 are printed as numbers.
pub fn excel_serial_to_string(serial: f64) -> String {
    if !serial.is_finite() || !(0.0..MAX_EXCEL_SERIAL).contains(&serial) {
        return serial.to_string();
    }

    let days = serial.trunc() as i64;
    let seconds = ((serial - days as f64) * 86_400.0).round() as i64;

    // Serials below 60 predate the phantom leap day.
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };

    let instant = epoch
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.checked_add_signed(Duration::days(days)))
        .and_then(|date| date.checked_add_signed(Duration::seconds(seconds)));

    match instant {
        Some(dt) if seconds == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => serial.to_string(),
    }
}
