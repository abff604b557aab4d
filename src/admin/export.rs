//! Spreadsheet export of selected change-list rows.

use crate::admin::registry::{ColumnKind, ModelAdmin};
use crate::db::JsonRow;
use crate::error::AdminResult;
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use serde_json::Value as JsonValue;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel limit on worksheet names.
const MAX_SHEET_NAME_CHARS: usize = 31;
/// Widths are measured over sheet rows 1..=500, header included.
const WIDTH_SAMPLE_ROWS: usize = 499;
const MAX_COLUMN_WIDTH: usize = 50;
const HEADER_FILL: u32 = 0x366092;

const DATETIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A cell as it is written to the sheet.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64, String),
    Bool(bool),
    Text(String),
}

impl Cell {
    fn from_json(value: &JsonValue, kind: ColumnKind) -> Self {
        match value {
            JsonValue::Null => Cell::Empty,
            JsonValue::Bool(b) => Cell::Bool(*b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => Cell::Number(f, n.to_string()),
                None => Cell::Text(n.to_string()),
            },
            JsonValue::String(s) => match kind {
                ColumnKind::Text => Cell::Text(s.clone()),
                ColumnKind::Date => Cell::Text(render_date(s)),
                // Decimals arrive as exact text.
                ColumnKind::Number => match s.trim().parse::<f64>() {
                    Ok(f) if f.is_finite() => Cell::Number(f, s.trim().to_string()),
                    _ => Cell::Text(s.clone()),
                },
            },
            other => Cell::Text(other.to_string()),
        }
    }

    /// Rendered length, capped, used to size the column.
    fn width(&self) -> usize {
        let len = match self {
            Cell::Empty => 0,
            Cell::Number(_, shown) => shown.chars().count(),
            Cell::Bool(true) => 4,
            Cell::Bool(false) => 5,
            Cell::Text(s) => s.chars().count(),
        };
        len.min(MAX_COLUMN_WIDTH)
    }
}

/// Render ISO dates as `dd/mm/YYYY` and datetimes as `dd/mm/YYYY HH:MM`.
pub fn render_date(value: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    // Timestamps with an offset or a trailing `Z`.
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(value) {
        return ts.naive_local().format("%d/%m/%Y %H:%M").to_string();
    }
    for input in DATETIME_INPUTS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, input) {
            return ts.format("%d/%m/%Y %H:%M").to_string();
        }
    }
    value.to_string()
}

/// Worksheet name: the plural display name, truncated to Excel's limit.
pub fn sheet_name(admin: &ModelAdmin) -> String {
    admin
        .verbose_name_plural
        .chars()
        .take(MAX_SHEET_NAME_CHARS)
        .collect()
}

pub fn content_disposition(admin: &ModelAdmin) -> String {
    format!(
        "attachment; filename=\"{}.xlsx\"",
        admin.verbose_name_plural
    )
}

/// Column widths: longest rendered value over the header and the first
/// rows, plus padding, capped.
fn column_widths(admin: &ModelAdmin, cells: &[Vec<Cell>]) -> Vec<f64> {
    let mut widths: Vec<usize> = admin
        .headers()
        .map(|h| h.chars().count().min(MAX_COLUMN_WIDTH))
        .collect();
    for row in cells.iter().take(WIDTH_SAMPLE_ROWS) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }
    widths
        .into_iter()
        .map(|w| (w + 2).min(MAX_COLUMN_WIDTH) as f64)
        .collect()
}

/// Build an `.xlsx` workbook of `rows` using the admin's list columns.
pub fn export_workbook(admin: &ModelAdmin, rows: &[JsonRow]) -> AdminResult<Vec<u8>> {
    let cells: Vec<Vec<Cell>> = rows
        .iter()
        .map(|row| {
            admin
                .columns
                .iter()
                .map(|c| {
                    row.get(c.field)
                        .map(|v| Cell::from_json(v, c.kind))
                        .unwrap_or(Cell::Empty)
                })
                .collect()
        })
        .collect();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(admin))?;

    for (col, header) in admin.headers().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (idx, row) in cells.iter().enumerate() {
        let row_num = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(n, _) => {
                    sheet.write_number(row_num, col, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row_num, col, *b)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s)?;
                }
            }
        }
    }

    for (col, width) in column_widths(admin, &cells).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width)?;
    }

    Ok(workbook.save_to_buffer()?)
}
