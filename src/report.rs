use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    analysis::{Analysis, CategoryView, Stats},
    config::Bucket,
    error::Result,
    sheet::{save_workbook, Cell, ChartKind, ChartSpec, ReportSheet},
};

/// Sheet names, in the order they appear in the report.
pub const SHEETS: [&str; 5] = [
    "Summary",
    "Product_Sales",
    "Regional_Sales",
    "Channel_Sales",
    "Sales_Trend",
];

/// Writes the summary report for `analysis` to `path`, replacing any
/// existing file.
///
/// The workbook's creation date is pinned to the analysis' last date, so
/// building the same analysis twice gives identical files.
///
/// # Errors
///
/// Returns [`crate::Error::IoFailure`] if the directory or file cannot be
/// written.
pub fn build(analysis: &Analysis, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    info!("Creating summary report at {}", path.display());
    let created = analysis.last_date().unwrap_or_default();
    let written = save_workbook(&sheets(analysis), created, path)?;
    info!("Summary report successfully created at {}", written.display());
    Ok(written)
}

/// Lays out the report: an overview sheet, then one sheet with a chart per
/// aggregate view.
#[must_use]
pub fn sheets(analysis: &Analysis) -> Vec<ReportSheet> {
    vec![
        summary_sheet(analysis),
        product_sheet(&analysis.by_product),
        region_sheet(&analysis.by_region),
        channel_sheet(&analysis.by_channel),
        trend_sheet(analysis),
    ]
}

fn summary_sheet(analysis: &Analysis) -> ReportSheet {
    let totals = &analysis.totals;
    let mut sheet = ReportSheet::new(SHEETS[0], &["Metric", "Value", "Revenue"]);
    sheet.header_color = 0xB8CCE4;
    sheet.widths = vec![30.0, 20.0, 16.0];
    sheet.rows = vec![
        vec!["Total Sales".into(), totals.revenue.into(), Cell::Empty],
        vec![
            "Transactions".into(),
            Cell::Integer(totals.count),
            Cell::Empty,
        ],
        vec![
            "Average Sale per Transaction".into(),
            totals.average().into(),
            Cell::Empty,
        ],
        vec![
            "Maximum Sale".into(),
            analysis.max_sale.unwrap_or_default().into(),
            Cell::Empty,
        ],
        vec![
            "Units Sold".into(),
            Cell::Integer(totals.units),
            Cell::Empty,
        ],
    ];
    for (label, view) in [
        ("Top Region", &analysis.by_region),
        ("Top Channel", &analysis.by_channel),
    ] {
        if let Some((name, stats)) = view.leader() {
            sheet.rows.push(ranking_row(label, name, stats));
        }
    }
    for (rank, (name, stats)) in (1..).zip(&analysis.top_products) {
        sheet
            .rows
            .push(ranking_row(&format!("Top Product {rank}"), name, stats));
    }
    sheet
}

fn ranking_row(label: &str, name: &str, stats: &Stats) -> Vec<Cell> {
    vec![label.into(), name.into(), stats.revenue.into()]
}

fn category_rows(view: &CategoryView) -> Vec<Vec<Cell>> {
    view.groups
        .iter()
        .map(|(name, stats)| {
            vec![
                name.as_str().into(),
                stats.revenue.into(),
                Cell::Integer(stats.count),
                stats.average().into(),
            ]
        })
        .collect()
}

fn product_sheet(view: &CategoryView) -> ReportSheet {
    let mut sheet = ReportSheet::new(
        SHEETS[1],
        &["Product", "Total Sales", "Transactions", "Average Sale", "Units Sold"],
    );
    sheet.header_color = 0xE6B8B7;
    sheet.widths = vec![15.0, 14.0, 13.0, 14.0, 11.0];
    sheet.rows = category_rows(view);
    for (row, (_, stats)) in sheet.rows.iter_mut().zip(&view.groups) {
        row.push(Cell::Integer(stats.units));
    }
    let mut chart = ChartSpec::new(ChartKind::Column, "Sales by Product", "Product", "Sales ($)");
    chart.value_labels = true;
    sheet.chart = Some(chart);
    sheet
}

fn region_sheet(view: &CategoryView) -> ReportSheet {
    let mut sheet = ReportSheet::new(
        SHEETS[2],
        &["Region", "Total Sales", "Transactions", "Average Sale", "Percentage"],
    );
    sheet.header_color = 0xB7DEE8;
    sheet.widths = vec![15.0, 14.0, 13.0, 14.0, 12.0];
    sheet.rows = category_rows(view);
    let total = view.total().cents();
    for (row, (_, stats)) in sheet.rows.iter_mut().zip(&view.groups) {
        #[allow(clippy::cast_precision_loss)]
        let share = if total == 0 {
            0.0
        } else {
            stats.revenue.cents() as f64 / total as f64
        };
        row.push(Cell::Percent(share));
    }
    let mut chart = ChartSpec::new(ChartKind::Column, "Sales by Region", "Region", "Sales ($)");
    chart.style = 10;
    chart.width = 600;
    sheet.chart = Some(chart);
    sheet
}

fn channel_sheet(view: &CategoryView) -> ReportSheet {
    let mut sheet = ReportSheet::new(
        SHEETS[3],
        &["Channel", "Total Sales", "Transactions", "Average Sale"],
    );
    sheet.header_color = 0xD8E4BC;
    sheet.widths = vec![15.0, 14.0, 13.0, 14.0];
    sheet.rows = category_rows(view);
    let mut chart = ChartSpec::new(ChartKind::Bar, "Sales by Channel", "Channel", "Sales ($)");
    chart.value_labels = true;
    chart.width = 600;
    sheet.chart = Some(chart);
    sheet
}

fn trend_sheet(analysis: &Analysis) -> ReportSheet {
    let (first_column, title) = match analysis.trend.bucket {
        Bucket::Day => ("Date", "Daily Sales Trend"),
        Bucket::Week => ("Week Starting", "Weekly Sales Trend"),
    };
    let mut sheet = ReportSheet::new(
        SHEETS[4],
        &[first_column, "Total Sales", "Transactions", "Average Sale"],
    );
    sheet.header_color = 0xCCC0DA;
    sheet.widths = vec![14.0, 14.0, 13.0, 14.0];
    sheet.rows = analysis
        .trend
        .points
        .iter()
        .map(|(date, stats)| {
            vec![
                Cell::Date(*date),
                stats.revenue.into(),
                Cell::Integer(stats.count),
                stats.average().into(),
            ]
        })
        .collect();
    let mut chart = ChartSpec::new(ChartKind::Line, title, first_column, "Total Sales ($)");
    chart.style = 12;
    sheet.chart = Some(chart);
    sheet
}
