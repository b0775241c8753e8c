//! Library-neutral sheet and chart descriptions, and the adapter that turns
//! them into an xlsx workbook with `rust_xlsxwriter`.
//!
//! Every chart is bound to a column range of the sheet it sits on, so a
//! [`ReportSheet`] can never describe a chart without its source data.

use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{
    Chart, ChartDataLabel, ChartFormat, ChartLine, ChartMarker, ChartMarkerType, ChartType,
    DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
    XlsxError,
};
use tracing::debug;

use crate::{
    error::{Error, Result},
    usd::Usd,
};

/// Excel sheet name maximum length.
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// Characters not allowed in sheet names.
const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(u64),
    /// A number in the general format.
    Number(f64),
    Money(Usd),
    /// A fraction, displayed as a percentage.
    Percent(f64),
    Date(NaiveDate),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Usd> for Cell {
    fn from(usd: Usd) -> Self {
        Self::Money(usd)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Vertical bars.
    Column,
    /// Horizontal bars.
    Bar,
    Line,
}

/// A one-series chart over two columns of the sheet it is placed on.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    /// Column holding the category labels.
    pub categories: u16,
    /// Column holding the plotted values.
    pub values: u16,
    pub value_labels: bool,
    pub style: u8,
    pub width: u32,
    pub height: u32,
}

impl ChartSpec {
    /// A chart plotting column 1 against the labels in column 0.
    #[must_use]
    pub fn new(kind: ChartKind, title: &str, x_axis: &str, y_axis: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_axis: x_axis.to_string(),
            y_axis: y_axis.to_string(),
            categories: 0,
            values: 1,
            value_labels: false,
            style: 11,
            width: 720,
            height: 400,
        }
    }
}

/// One worksheet: a header row, data rows and an optional chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Column widths, by position. Missing entries keep the default width.
    pub widths: Vec<f64>,
    /// Header fill, as `0xRRGGBB`.
    pub header_color: u32,
    pub autofilter: bool,
    pub chart: Option<ChartSpec>,
    /// Row and column of the first header cell. Everything else on the
    /// sheet, widths included, is placed relative to it.
    pub origin: (u32, u16),
}

impl ReportSheet {
    #[must_use]
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
            widths: Vec::new(),
            header_color: 0xD7E4BC,
            autofilter: false,
            chart: None,
            origin: (0, 0),
        }
    }
}

/// Checks a sheet name against Excel's naming rules.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for empty, overlong or ill-formed names.
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let problem = if name.trim().is_empty() {
        Some("must not be blank")
    } else if name.chars().count() > SHEET_NAME_MAX_LEN {
        Some("is longer than 31 characters")
    } else if name.contains(SHEET_NAME_ILLEGAL) {
        Some("contains one of * : ? / \\ [ ]")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("must not start or end with an apostrophe")
    } else {
        None
    };
    match problem {
        Some(problem) => Err(Error::InvalidParameter(format!(
            "sheet name {name:?} {problem}"
        ))),
        None => Ok(()),
    }
}

/// Writes `sheets`, in order, to a workbook at `path`.
///
/// Parent directories are created as needed and an existing file is
/// replaced. The workbook's creation date is set to `created`, so the same
/// input always produces the same bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for bad or duplicate sheet names, and
/// [`Error::IoFailure`] if the workbook cannot be serialized or written.
pub fn save_workbook(
    sheets: &[ReportSheet],
    created: NaiveDate,
    path: &Path,
) -> Result<PathBuf> {
    let mut seen = BTreeSet::new();
    for sheet in sheets {
        validate_sheet_name(&sheet.name)?;
        if !seen.insert(sheet.name.to_lowercase()) {
            return Err(Error::InvalidParameter(format!(
                "duplicate sheet name {:?}",
                sheet.name
            )));
        }
    }
    let bytes = render_workbook(sheets, created).map_err(|e| Error::io(path, e.to_string()))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), sheets = sheets.len(), "workbook written");
    Ok(path.to_path_buf())
}

struct Formats {
    text: Format,
    integer: Format,
    money: Format,
    percent: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        let text = Format::new().set_border(FormatBorder::Thin);
        Self {
            integer: text.clone().set_num_format("0"),
            money: text.clone().set_num_format("$#,##0.00"),
            percent: text.clone().set_num_format("0.00%"),
            date: text.clone().set_num_format("yyyy-mm-dd"),
            text,
        }
    }
}

fn render_workbook(
    sheets: &[ReportSheet],
    created: NaiveDate,
) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&excel_date(created)?));
    let formats = Formats::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &formats)?;
    }
    workbook.save_to_buffer()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &ReportSheet,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(sheet.header_color)
        .set_border(FormatBorder::Thin);
    let (top, left) = sheet.origin;
    for (col, name) in (left..).zip(&sheet.headers) {
        worksheet.write_string_with_format(top, col, name, &header)?;
    }
    for (col, width) in (left..).zip(&sheet.widths) {
        worksheet.set_column_width(col, *width)?;
    }
    for (row, cells) in (top + 1..).zip(&sheet.rows) {
        for (col, cell) in (left..).zip(cells) {
            write_cell(worksheet, row, col, cell, formats)?;
        }
    }
    worksheet.set_freeze_panes(top + 1, 0)?;

    let rows = u32::try_from(sheet.rows.len()).unwrap_or(u32::MAX);
    let cols = u16::try_from(sheet.headers.len()).unwrap_or(u16::MAX);
    if rows == 0 {
        return Ok(());
    }
    let last_row = top.saturating_add(rows);
    if sheet.autofilter && cols > 0 {
        worksheet.autofilter(top, left, last_row, left + cols - 1)?;
    }
    if let Some(spec) = &sheet.chart {
        let chart = build_chart(spec, sheet, last_row);
        worksheet.insert_chart(top + 1, left.saturating_add(cols).saturating_add(1), &chart)?;
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &Formats,
) -> std::result::Result<(), XlsxError> {
    match cell {
        Cell::Empty => worksheet.write_blank(row, col, &formats.text)?,
        Cell::Text(s) => worksheet.write_string_with_format(row, col, s, &formats.text)?,
        Cell::Integer(n) => {
            worksheet.write_number_with_format(row, col, *n as f64, &formats.integer)?
        }
        Cell::Number(n) => worksheet.write_number_with_format(row, col, *n, &formats.text)?,
        Cell::Money(usd) => {
            worksheet.write_number_with_format(row, col, usd.dollars(), &formats.money)?
        }
        Cell::Percent(p) => worksheet.write_number_with_format(row, col, *p, &formats.percent)?,
        Cell::Date(date) => {
            worksheet.write_datetime_with_format(row, col, &excel_date(*date)?, &formats.date)?
        }
    };
    Ok(())
}

fn build_chart(spec: &ChartSpec, sheet: &ReportSheet, last_row: u32) -> Chart {
    let (top, left) = sheet.origin;
    let (categories, values) = (left + spec.categories, left + spec.values);
    let mut chart = Chart::new(match spec.kind {
        ChartKind::Column => ChartType::Column,
        ChartKind::Bar => ChartType::Bar,
        ChartKind::Line => ChartType::Line,
    });
    let series = chart.add_series();
    series
        .set_name(spec.title.as_str())
        .set_categories((sheet.name.as_str(), top + 1, categories, last_row, categories))
        .set_values((sheet.name.as_str(), top + 1, values, last_row, values));
    if spec.value_labels {
        series.set_data_label(ChartDataLabel::new().show_value());
    }
    if spec.kind == ChartKind::Line {
        series
            .set_marker(ChartMarker::new().set_type(ChartMarkerType::Circle))
            .set_format(ChartFormat::new().set_line(ChartLine::new().set_width(2.5)));
    }
    chart.title().set_name(spec.title.as_str());
    chart.x_axis().set_name(spec.x_axis.as_str());
    chart.y_axis().set_name(spec.y_axis.as_str());
    chart.set_style(spec.style);
    chart.set_width(spec.width).set_height(spec.height);
    chart
}

#[allow(clippy::cast_possible_truncation)]
fn excel_date(date: NaiveDate) -> std::result::Result<ExcelDateTime, XlsxError> {
    // Years outside u16 are rejected by from_ymd as out of range.
    let year = u16::try_from(date.year()).unwrap_or(0);
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
}
