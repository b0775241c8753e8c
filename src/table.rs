//! Writing a sales table to a styled spreadsheet, and loading one back from
//! xlsx or CSV.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{Error, Result},
    record::{Table, Transaction, COLUMNS},
    sheet::{save_workbook, Cell, ReportSheet},
    usd::Usd,
};

/// Sheet name used for raw sales data.
pub const DEFAULT_SHEET: &str = "Sales_Data";

static EMPTY: Data = Data::Empty;

const WIDTHS: [f64; 7] = [12.0, 15.0, 15.0, 15.0, 8.0, 12.0, 12.0];

/// Lays out `table` as a sheet: one header row, then one row per transaction
/// in table order.
#[must_use]
pub fn to_sheet(table: &Table, sheet_name: &str) -> ReportSheet {
    let mut sheet = ReportSheet::new(sheet_name, &COLUMNS);
    sheet.widths = WIDTHS.to_vec();
    sheet.autofilter = true;
    sheet.rows = table
        .rows()
        .iter()
        .map(|tx| {
            vec![
                Cell::Date(tx.date),
                Cell::Text(tx.product.clone()),
                Cell::Text(tx.region.clone()),
                Cell::Text(tx.channel.clone()),
                Cell::Integer(u64::from(tx.units)),
                Cell::Money(tx.unit_price),
                Cell::Money(tx.total()),
            ]
        })
        .collect();
    sheet
}

/// Writes `table` to a workbook at `path` with a single sheet named
/// `sheet_name`, replacing any existing file.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for a bad sheet name, and
/// [`Error::IoFailure`] if the directory or file cannot be written.
pub fn write(table: &Table, path: impl AsRef<Path>, sheet_name: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    info!("Writing data to {}", path.display());
    let created = table
        .rows()
        .iter()
        .map(|tx| tx.date)
        .max()
        .unwrap_or_default();
    let written = save_workbook(&[to_sheet(table, sheet_name)], created, path)?;
    info!("Data successfully written to {}", written.display());
    Ok(written)
}

/// Reads a sales table from the sheet `sheet` (or the first sheet) of the
/// workbook at `path`.
///
/// Columns are found by header name, so their order does not matter.
///
/// # Errors
///
/// Returns [`Error::IoFailure`] if the workbook cannot be opened, and
/// [`Error::SchemaMismatch`] if the sheet or a column is missing or a row
/// holds an invalid transaction.
pub fn read_xlsx(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    info!("Loading data from {}", path.display());
    let mut workbook = open_workbook_auto(path).map_err(|e| Error::io(path, e.to_string()))?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(name) if names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => {
            return Err(Error::SchemaMismatch(format!(
                "{}: no sheet named {name:?}",
                path.display()
            )))
        }
        None => names.first().cloned().ok_or_else(|| {
            Error::SchemaMismatch(format!("{}: workbook has no sheets", path.display()))
        })?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| Error::io(path, e.to_string()))?;
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(Error::SchemaMismatch(format!(
            "{}: sheet {name:?} is empty",
            path.display()
        )));
    };
    let headers: Vec<String> = header.iter().map(ToString::to_string).collect();
    let index = column_index(&headers)?;

    let mut table = Vec::new();
    for (n, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let line = n + 2;
        let cell = |i: usize| row.get(index[i]).unwrap_or(&EMPTY);
        let bad = |what: &str| {
            Error::SchemaMismatch(format!("{} row {line}: bad {what}", path.display()))
        };
        let date = cell_date(cell(0)).ok_or_else(|| bad(COLUMNS[0]))?;
        let product = cell_text(cell(1)).ok_or_else(|| bad(COLUMNS[1]))?;
        let region = cell_text(cell(2)).ok_or_else(|| bad(COLUMNS[2]))?;
        let channel = cell_text(cell(3)).ok_or_else(|| bad(COLUMNS[3]))?;
        let units = cell(4)
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| bad(COLUMNS[4]))?;
        let unit_price = cell(5).as_f64().map(Usd::from_dollars).ok_or_else(|| bad(COLUMNS[5]))?;
        let total = cell(6).as_f64().map(Usd::from_dollars).ok_or_else(|| bad(COLUMNS[6]))?;
        let tx = Transaction::new(date, &product, &region, &channel, units, unit_price)?;
        table.push(check_total(tx, total, line)?);
    }
    Table::new(table)
}

/// Defines the CSV format for sales data.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Product")]
    product: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Channel")]
    channel: String,
    #[serde(rename = "Units")]
    units: u32,
    #[serde(rename = "Unit_Price")]
    unit_price: Usd,
    #[serde(rename = "Total_Sale")]
    total: Usd,
}

/// Reads a sales table from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`Error::IoFailure`] if the file cannot be opened or read, and
/// [`Error::SchemaMismatch`] if a column is missing or a row is invalid.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    info!("Loading data from {}", path.display());
    let mut rdr = csv::Reader::from_path(path).map_err(|e| Error::io(path, e))?;
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| Error::io(path, e))?
        .iter()
        .map(ToString::to_string)
        .collect();
    column_index(&headers)?;

    let mut table = Vec::new();
    for (n, result) in rdr.deserialize().enumerate() {
        let line = n + 2;
        let record: CsvRecord = result.map_err(|e| {
            Error::SchemaMismatch(format!("{} row {line}: {e}", path.display()))
        })?;
        let tx = Transaction::new(
            record.date,
            &record.product,
            &record.region,
            &record.channel,
            record.units,
            record.unit_price,
        )?;
        table.push(check_total(tx, record.total, line)?);
    }
    Table::new(table)
}

/// Finds the position of every required column in `headers`.
fn column_index(headers: &[String]) -> Result<[usize; 7]> {
    let mut index = [0; 7];
    let mut missing = Vec::new();
    for (slot, column) in index.iter_mut().zip(COLUMNS) {
        match headers.iter().position(|h| h.trim() == column) {
            Some(pos) => *slot = pos,
            None => missing.push(column),
        }
    }
    if missing.is_empty() {
        Ok(index)
    } else {
        Err(Error::SchemaMismatch(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

fn check_total(tx: Transaction, recorded: Usd, line: usize) -> Result<Transaction> {
    if tx.total() == recorded {
        Ok(tx)
    } else {
        Err(Error::SchemaMismatch(format!(
            "row {line}: Total_Sale {recorded} does not equal {} × {}",
            tx.units, tx.unit_price
        )))
    }
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        other => other.as_date(),
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    cell.as_string()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{analysis::analyze, config::AnalyzerConfig, config::Catalog, generate::Generator};

    use super::*;

    fn sample() -> Table {
        let end = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        Generator::new(&Catalog::default())
            .ending_on(end)
            .generate(40, 30, Some(3))
            .unwrap()
    }

    #[test]
    fn write_fn_round_trips_through_read_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample();
        let path = write(&table, dir.path().join("out/sales.xlsx"), DEFAULT_SHEET).unwrap();
        let loaded = read_xlsx(&path, Some(DEFAULT_SHEET)).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(read_xlsx(&path, None).unwrap().len(), 40);
    }

    #[test]
    fn write_fn_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.xlsx");
        fs::write(&path, b"stale").unwrap();
        write(&sample(), &path, DEFAULT_SHEET).unwrap();
        assert_eq!(read_xlsx(&path, None).unwrap().len(), 40);
    }

    #[test]
    fn write_fn_rejects_bad_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            write(&sample(), dir.path().join("x.xlsx"), "a:b"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn read_xlsx_fn_reports_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&sample(), dir.path().join("s.xlsx"), DEFAULT_SHEET).unwrap();
        assert!(matches!(
            read_xlsx(&path, Some("Nope")),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn read_xlsx_fn_reports_missing_file() {
        assert!(matches!(
            read_xlsx("testdata/does-not-exist.xlsx", None),
            Err(Error::IoFailure { .. })
        ));
    }

    #[test]
    fn read_csv_fn_correctly_parses_sales_data() {
        let table = read_csv("testdata/sales.csv").unwrap();
        assert_eq!(table.len(), 6);
        assert_eq!(table.total(), Usd::from_cents(631_180));
        assert_eq!(table.rows()[0].product, "Laptop");
        assert_eq!(table.rows()[0].units, 2);
    }

    #[test]
    fn read_csv_fn_reports_missing_column() {
        let err = read_csv("testdata/missing_channel.csv").unwrap_err();
        match err {
            Error::SchemaMismatch(msg) => assert!(msg.contains("Channel"), "{msg}"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn read_csv_fn_rejects_inconsistent_total() {
        assert!(matches!(
            read_csv("testdata/bad_total.csv"),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn read_csv_fn_rejects_price_too_large_for_cents() {
        assert!(matches!(
            read_csv("testdata/huge_price.csv"),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn read_csv_fn_accepts_bulk_units_that_analyze_can_sum() {
        let table = read_csv("testdata/bulk_units.csv").unwrap();
        let analysis = analyze(&table, &AnalyzerConfig::default());
        assert_eq!(analysis.totals.units, 6_000_000_000);
        assert_eq!(analysis.totals.revenue, Usd::from_cents(6_000_000_000));
    }
}
