//! Spreadsheet loading.
//!
//! Workbooks (`.xlsx`, `.xls`, `.xlsm`, `.ods`) are read with calamine, `.csv`
//! files with the csv crate. Only the first worksheet is used and its first
//! row holds the column headers.

use calamine::{Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Builds a cell from raw text, treating blank strings as empty.
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Number(n) => n.is_nan(),
            Cell::Text(s) => s.trim().is_empty(),
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed after trimming.
    /// Anything else (including non-finite values) is null.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Cell::Empty => return None,
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Text rendering of the cell; integral numbers print without a fraction.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) if n.is_nan() => None,
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::from_text(s)
    }
}

/// Formats a number the way it reads in a spreadsheet: `3550308`, `12.5`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

static EMPTY: Cell = Cell::Empty;

/// A loaded table: ordered headers and rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell lookup by header name. Short rows and unknown headers read as empty.
    pub fn get(&self, row: usize, header: &str) -> &Cell {
        self.column_index(header)
            .and_then(|idx| self.rows.get(row)?.get(idx))
            .unwrap_or(&EMPTY)
    }
}

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("unsupported file type '{0}'; use .xlsx, .xls or .csv")]
    UnsupportedFormat(String),

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("spreadsheet has no header row")]
    NoHeaders,

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Workbook,
    Csv,
}

fn detect_format(file_name: &str) -> Result<Format, SheetError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(Format::Workbook),
        "csv" => Ok(Format::Csv),
        _ => Err(SheetError::UnsupportedFormat(extension)),
    }
}

/// Whether an uploaded file name has an extension we can read.
pub fn is_supported_file(file_name: &str) -> bool {
    detect_format(file_name).is_ok()
}

pub fn load_sheet(path: &Path) -> Result<Sheet, SheetError> {
    info!("Loading spreadsheet {:?}", path);
    let name = path.to_string_lossy();
    let bytes = std::fs::read(path)?;
    load_sheet_from_bytes(&name, bytes)
}

/// Loads an in-memory file, picking the reader from the file name's extension.
pub fn load_sheet_from_bytes(file_name: &str, bytes: Vec<u8>) -> Result<Sheet, SheetError> {
    let sheet = match detect_format(file_name)? {
        Format::Workbook => load_workbook(bytes)?,
        Format::Csv => load_csv(&bytes)?,
    };
    debug!(
        "Read {} rows with columns {:?}",
        sheet.rows.len(),
        sheet.headers
    );
    Ok(sheet)
}

fn load_workbook(bytes: Vec<u8>) -> Result<Sheet, SheetError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::NoWorksheet)??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(SheetError::NoHeaders)?
        .iter()
        .map(|c| data_to_cell(c).as_text().unwrap_or_default())
        .collect();

    let rows = rows
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    Ok(Sheet::new(headers, rows))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::from_text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Empty | Data::Error(_) => Cell::Empty,
        other => Cell::from_text(&other.to_string()),
    }
}

fn load_csv(bytes: &[u8]) -> Result<Sheet, SheetError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(SheetError::NoHeaders);
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(Sheet::new(headers, rows))
}
