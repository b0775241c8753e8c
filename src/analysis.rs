use std::{collections::BTreeMap, fmt::Display};

use chrono::{Datelike, Days, NaiveDate};
use tracing::{debug, info};

use crate::{
    config::{AnalyzerConfig, Bucket},
    record::{Table, Transaction},
    usd::Usd,
};

/// Summary statistics for a group of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub revenue: Usd,
    pub count: u64,
    pub units: u64,
}

impl Stats {
    // Revenue cannot overflow: `Table::new` bounds the sum of all totals.
    fn add(&mut self, tx: &Transaction) {
        self.revenue += tx.total();
        self.count += 1;
        self.units += u64::from(tx.units);
    }

    /// Average transaction value, or zero for an empty group.
    #[must_use]
    pub fn average(&self) -> Usd {
        self.revenue.average(self.count).unwrap_or_default()
    }
}

/// A categorical field of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Product,
    Region,
    Channel,
}

impl Dimension {
    fn key(self, tx: &Transaction) -> &str {
        match self {
            Self::Product => &tx.product,
            Self::Region => &tx.region,
            Self::Channel => &tx.channel,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Product => "Product",
            Self::Region => "Region",
            Self::Channel => "Channel",
        })
    }
}

/// Revenue, count and units per value of one [`Dimension`].
///
/// Groups are sorted by revenue, descending; groups with identical revenue
/// are sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    pub dimension: Dimension,
    pub groups: Vec<(String, Stats)>,
}

impl CategoryView {
    fn new(table: &Table, dimension: Dimension) -> Self {
        let mut by_key: BTreeMap<&str, Stats> = BTreeMap::new();
        for tx in table {
            by_key.entry(dimension.key(tx)).or_default().add(tx);
        }
        // BTreeMap order is by name, and the sort is stable.
        let mut groups: Vec<_> = by_key
            .into_iter()
            .map(|(key, stats)| (key.to_string(), stats))
            .collect();
        groups.sort_by(|a, b| b.1.revenue.cmp(&a.1.revenue));
        Self { dimension, groups }
    }

    /// The `n` highest-revenue groups.
    #[must_use]
    pub fn top(&self, n: usize) -> &[(String, Stats)] {
        &self.groups[..n.min(self.groups.len())]
    }

    /// The highest-revenue group, if any.
    #[must_use]
    pub fn leader(&self) -> Option<&(String, Stats)> {
        self.groups.first()
    }

    #[must_use]
    pub fn total(&self) -> Usd {
        self.groups.iter().map(|(_, stats)| stats.revenue).sum()
    }
}

/// Revenue over time, one point per bucket, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendView {
    pub bucket: Bucket,
    pub points: Vec<(NaiveDate, Stats)>,
}

impl TrendView {
    fn new(table: &Table, bucket: Bucket) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Stats> = BTreeMap::new();
        for tx in table {
            by_date.entry(bucket_start(tx.date, bucket)).or_default().add(tx);
        }
        Self {
            bucket,
            points: by_date.into_iter().collect(),
        }
    }
}

/// The first day of the bucket containing `date`.
#[must_use]
pub fn bucket_start(date: NaiveDate, bucket: Bucket) -> NaiveDate {
    match bucket {
        Bucket::Day => date,
        Bucket::Week => {
            let back = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(back)).unwrap_or(date)
        }
    }
}

/// Everything the report is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Totals over the whole table.
    pub totals: Stats,
    /// Largest single transaction total.
    pub max_sale: Option<Usd>,
    pub by_product: CategoryView,
    pub by_region: CategoryView,
    pub by_channel: CategoryView,
    pub trend: TrendView,
    /// The top products by revenue, at most `top_n` of them.
    pub top_products: Vec<(String, Stats)>,
}

impl Analysis {
    /// The latest bucket with any sales.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.trend.points.last().map(|(date, _)| *date)
    }
}

/// Computes the aggregate views of `table`.
///
/// An empty table gives empty views and zero totals.
#[must_use]
pub fn analyze(table: &Table, config: &AnalyzerConfig) -> Analysis {
    info!("Performing sales data analysis");
    let mut totals = Stats::default();
    for tx in table {
        totals.add(tx);
    }
    let by_product = CategoryView::new(table, Dimension::Product);
    let top_products = by_product.top(config.top_n).to_vec();
    let analysis = Analysis {
        totals,
        max_sale: table.rows().iter().map(Transaction::total).max(),
        by_region: CategoryView::new(table, Dimension::Region),
        by_channel: CategoryView::new(table, Dimension::Channel),
        trend: TrendView::new(table, config.bucket),
        by_product,
        top_products,
    };
    debug!(
        products = analysis.by_product.groups.len(),
        regions = analysis.by_region.groups.len(),
        channels = analysis.by_channel.groups.len(),
        buckets = analysis.trend.points.len(),
        "analysis complete"
    );
    analysis
}
