//! Spreadsheet loading: turns an `.xlsx`/`.xls`/`.csv` file into an ordered,
//! name-addressed grid of strings. Upload/storage mechanics live with the caller.

use crate::core::error::{AppError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// A parsed tabular file. Column order is preserved from the source; every row
/// has exactly `columns.len()` cells (short rows are padded with empty strings).
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// The sample used for column detection: at most the first `n` rows.
    pub fn sample(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(n)]
    }
}

/// Loads a tabular file, dispatching on extension: `.csv` goes through the CSV
/// reader, everything else through the spreadsheet reader.
pub fn load_sheet(path: &Path) -> Result<Sheet> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    tracing::debug!("Loading sheet from {} (csv: {})", path.display(), is_csv);
    if is_csv {
        let file = std::fs::File::open(path)
            .map_err(|e| AppError::MalformedInput(format!("Cannot open {}: {}", path.display(), e)))?;
        sheet_from_csv(file)
    } else {
        sheet_from_workbook(path)
    }
}

fn sheet_from_workbook(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::MalformedInput(format!("Cannot read workbook {}: {}", path.display(), e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::MalformedInput("Workbook contains no sheets".to_string()))?
        .map_err(|e| AppError::MalformedInput(format!("Cannot read first worksheet: {}", e)))?;

    let mut row_iter = range.rows();
    let header = row_iter
        .next()
        .ok_or_else(|| AppError::MalformedInput("Worksheet is empty".to_string()))?;
    let columns: Vec<String> = header.iter().map(cell_to_string).collect();
    if columns.is_empty() {
        return Err(AppError::MalformedInput(
            "Worksheet header row is empty".to_string(),
        ));
    }

    let rows = row_iter
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(cell_to_string).collect();
            cells.resize(columns.len(), String::new());
            cells.truncate(columns.len());
            cells
        })
        .collect();

    Ok(Sheet { columns, rows })
}

/// Excel stores numbers as floats; an integral float must round-trip as a plain
/// digit string, not `3.3e10` or `1234.0`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("{:?}", e),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Parses CSV content from any reader. The first record is the header.
pub(crate) fn sheet_from_csv(reader: impl std::io::Read) -> Result<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| AppError::MalformedInput(format!("Cannot read CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(AppError::MalformedInput("CSV header row is empty".to_string()));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record =
            record.map_err(|e| AppError::MalformedInput(format!("Cannot read CSV row: {}", e)))?;
        let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        cells.resize(columns.len(), String::new());
        cells.truncate(columns.len());
        rows.push(cells);
    }

    Ok(Sheet { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_from_csv_basic() {
        let data = "name,phone\nAlice,+33612345678\nBob,0712345678\n";
        let sheet = sheet_from_csv(data.as_bytes()).unwrap();
        assert_eq!(sheet.columns, vec!["name", "phone"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0], vec!["Alice", "+33612345678"]);
    }

    #[test]
    fn test_sheet_from_csv_pads_short_rows() {
        let data = "a,b,c\n1,2\n";
        let sheet = sheet_from_csv(data.as_bytes()).unwrap();
        assert_eq!(sheet.rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_sheet_from_csv_rejects_empty() {
        assert!(sheet_from_csv(&b""[..]).is_err());
    }

    #[test]
    fn test_sample_clamps_to_available_rows() {
        let sheet = Sheet {
            columns: vec!["phone".into()],
            rows: vec![vec!["+331".into()], vec!["+332".into()]],
        };
        assert_eq!(sheet.sample(3).len(), 2);
        assert_eq!(sheet.sample(1).len(), 1);
    }

    #[test]
    fn test_cell_to_string_integral_float() {
        assert_eq!(cell_to_string(&Data::Float(33612345678.0)), "33612345678");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
