//! Derives a "Last Name" column from a full-name column of a spreadsheet.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Reader};
use tracing::info;

use crate::{
    error::{Error, Result},
    sheet::{save_workbook, Cell, ReportSheet},
};

/// Header of the column that holds the derived last names.
pub const LAST_NAME: &str = "Last Name";

static EMPTY: Data = Data::Empty;

/// Returns the final whitespace-delimited word of `full_name`, or `""` if
/// there is none.
#[must_use]
pub fn last_name(full_name: &str) -> &str {
    full_name.split_whitespace().last().unwrap_or("")
}

/// Copies sheet `sheet` (or the first sheet) of the workbook at `input` to a
/// new workbook at `output`, with a [`LAST_NAME`] column derived from
/// column `column`.
///
/// An existing [`LAST_NAME`] column is overwritten in place; otherwise one
/// is appended. Cells keep their positions, including any blank leading rows
/// and columns.
///
/// # Errors
///
/// Returns [`Error::IoFailure`] if either workbook cannot be read or
/// written, and [`Error::SchemaMismatch`] if the sheet or column is missing.
pub fn split_names(
    input: impl AsRef<Path>,
    sheet: Option<&str>,
    column: &str,
    output: impl AsRef<Path>,
) -> Result<PathBuf> {
    let input = input.as_ref();
    let mut workbook = open_workbook_auto(input).map_err(|e| Error::io(input, e.to_string()))?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook.sheet_names().first().cloned().ok_or_else(|| {
            Error::SchemaMismatch(format!("{}: workbook has no sheets", input.display()))
        })?,
    };
    if !workbook.sheet_names().contains(&sheet_name) {
        return Err(Error::SchemaMismatch(format!(
            "{}: no sheet named {sheet_name:?}",
            input.display()
        )));
    }
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::io(input, e.to_string()))?;
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    let Some(name_col) = headers.iter().position(|h| h.trim() == column) else {
        return Err(Error::SchemaMismatch(format!(
            "{}: sheet {sheet_name:?} has no {column:?} column",
            input.display()
        )));
    };

    let mut out = ReportSheet::new(&sheet_name, &[]);
    let (top, left) = range.start().unwrap_or_default();
    let left = u16::try_from(left).map_err(|_| {
        Error::SchemaMismatch(format!("{}: column {left} is out of range", input.display()))
    })?;
    out.origin = (top, left);
    out.headers = headers;
    let last_col = match out.headers.iter().position(|h| h.trim() == LAST_NAME) {
        Some(col) => col,
        None => {
            out.headers.push(LAST_NAME.to_string());
            out.headers.len() - 1
        }
    };
    for row in rows {
        let full_name = row
            .get(name_col)
            .and_then(|cell| cell.as_string())
            .unwrap_or_default();
        let cells = (0..out.headers.len())
            .map(|i| {
                if i == last_col {
                    match last_name(&full_name) {
                        "" => Cell::Empty,
                        last => Cell::Text(last.to_string()),
                    }
                } else {
                    to_cell(row.get(i).unwrap_or(&EMPTY))
                }
            })
            .collect();
        out.rows.push(cells);
    }

    let count = out.rows.len();
    let written = save_workbook(&[out], chrono::NaiveDate::default(), output.as_ref())?;
    info!(
        "Last names extracted for {count} rows and saved to {}",
        written.display()
    );
    Ok(written)
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        #[allow(clippy::cast_precision_loss)]
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(_) | Data::DateTimeIso(_) => {
            data.as_date().map_or(Cell::Empty, Cell::Date)
        }
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_name_fn_takes_final_word() {
        assert_eq!(last_name("Ada Lovelace"), "Lovelace");
        assert_eq!(last_name("Ada  King "), "King");
        assert_eq!(last_name("Cher"), "Cher");
        assert_eq!(last_name("   "), "");
    }

    fn people_workbook(dir: &Path) -> PathBuf {
        let mut sheet = ReportSheet::new("People", &["Id", "Full Name"]);
        sheet.rows = vec![
            vec![Cell::Integer(1), Cell::from("Grace Brewster Hopper")],
            vec![Cell::Integer(2), Cell::Empty],
            vec![Cell::Integer(3), Cell::from("Alan Turing")],
        ];
        save_workbook(&[sheet], chrono::NaiveDate::default(), &dir.join("people.xlsx")).unwrap()
    }

    fn header_row(range: &calamine::Range<Data>) -> Vec<String> {
        range
            .rows()
            .next()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn split_names_fn_overwrites_existing_last_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = ReportSheet::new("People", &["Full Name", "Last Name", "Team"]);
        sheet.rows = vec![vec![
            Cell::from("Alan Mathison Turing"),
            Cell::from("stale"),
            Cell::from("Hut 8"),
        ]];
        let input = dir.path().join("people.xlsx");
        save_workbook(&[sheet], chrono::NaiveDate::default(), &input).unwrap();
        let output = split_names(&input, None, "Full Name", dir.path().join("out.xlsx")).unwrap();

        let mut workbook = open_workbook_auto(&output).unwrap();
        let range = workbook.worksheet_range("People").unwrap();
        assert_eq!(header_row(&range), ["Full Name", "Last Name", "Team"]);
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("Turing".into())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::String("Hut 8".into())));
    }

    #[test]
    fn split_names_fn_keeps_cell_positions_of_offset_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheet = ReportSheet::new("People", &["Full Name"]);
        sheet.origin = (2, 1);
        sheet.rows = vec![vec![Cell::from("Ada Lovelace")]];
        let input = dir.path().join("people.xlsx");
        save_workbook(&[sheet], chrono::NaiveDate::default(), &input).unwrap();
        let output = split_names(&input, None, "Full Name", dir.path().join("out.xlsx")).unwrap();

        let mut workbook = open_workbook_auto(&output).unwrap();
        let range = workbook.worksheet_range("People").unwrap();
        assert_eq!(range.start(), Some((2, 1)));
        assert_eq!(
            range.get_value((2, 1)),
            Some(&Data::String("Full Name".into()))
        );
        assert_eq!(range.get_value((2, 2)), Some(&Data::String(LAST_NAME.into())));
        assert_eq!(range.get_value((3, 2)), Some(&Data::String("Lovelace".into())));
    }

    #[test]
    fn split_names_fn_appends_last_name_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = people_workbook(dir.path());
        let output = split_names(&input, None, "Full Name", dir.path().join("out.xlsx")).unwrap();

        let mut workbook = open_workbook_auto(&output).unwrap();
        let range = workbook.worksheet_range("People").unwrap();
        assert_eq!(range.get_value((0, 2)), Some(&Data::String(LAST_NAME.into())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::String("Hopper".into())));
        assert!(matches!(range.get_value((2, 2)), None | Some(Data::Empty)));
        assert_eq!(range.get_value((3, 2)), Some(&Data::String("Turing".into())));
        assert_eq!(range.get_value((3, 1)), Some(&Data::String("Alan Turing".into())));
        assert_eq!(range.get_value((3, 0)), Some(&Data::Float(3.0)));
    }

    #[test]
    fn split_names_fn_reports_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let input = people_workbook(dir.path());
        assert!(matches!(
            split_names(&input, Some("People"), "Name", dir.path().join("out.xlsx")),
            Err(Error::SchemaMismatch(_))
        ));
        assert!(matches!(
            split_names(&input, Some("Staff"), "Full Name", dir.path().join("out.xlsx")),
            Err(Error::SchemaMismatch(_))
        ));
    }
}
