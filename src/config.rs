//! Fixed catalogs and knobs for generation and analysis.
//!
//! Nothing here is process-wide: callers build a [`Catalog`] and an
//! [`AnalyzerConfig`] (usually via `Default`) and pass them in explicitly.

use std::ops::RangeInclusive;

use rand::Rng;

use crate::{
    error::{Error, Result},
    usd::Usd,
};

/// A finite set of choices, each with an integer weight.
///
/// Equal weights give a uniform distribution; a zero weight excludes the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weighted<T> {
    entries: Vec<(T, u32)>,
}

impl<T> Weighted<T> {
    /// Every item gets weight 1.
    pub fn uniform(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            entries: items.into_iter().map(|item| (item, 1)).collect(),
        }
    }

    pub fn new(entries: impl IntoIterator<Item = (T, u32)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(item, _)| item)
    }

    fn total_weight(&self) -> u64 {
        self.entries.iter().map(|(_, w)| u64::from(*w)).sum()
    }

    fn validate(&self, what: &str) -> Result<()> {
        if self.total_weight() == 0 {
            return Err(Error::InvalidParameter(format!(
                "{what} catalog has no entry with a positive weight"
            )));
        }
        Ok(())
    }

    /// Picks an entry by walking the cumulative weights.
    ///
    /// Returns `None` only when no entry has a positive weight.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&T> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let mut target = rng.random_range(0..total);
        for (item, weight) in &self.entries {
            let weight = u64::from(*weight);
            if target < weight {
                return Some(item);
            }
            target -= weight;
        }
        None
    }
}

/// A product line and the range its unit price is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSpec {
    pub name: String,
    pub price: RangeInclusive<Usd>,
}

impl ProductSpec {
    /// Price bounds are given in whole dollars.
    #[must_use]
    pub fn new(name: &str, min_dollars: i64, max_dollars: i64) -> Self {
        Self {
            name: name.to_string(),
            price: Usd::from_cents(min_dollars.saturating_mul(100))
                ..=Usd::from_cents(max_dollars.saturating_mul(100)),
        }
    }
}

/// What the data generator may produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub products: Weighted<ProductSpec>,
    pub regions: Weighted<String>,
    pub channels: Weighted<String>,
    pub quantity: RangeInclusive<u32>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            products: Weighted::uniform([
                ProductSpec::new("Laptop", 800, 2000),
                ProductSpec::new("Desktop", 600, 1800),
                ProductSpec::new("Monitor", 150, 500),
                ProductSpec::new("Keyboard", 20, 150),
                ProductSpec::new("Mouse", 10, 80),
                ProductSpec::new("Headphones", 30, 300),
                ProductSpec::new("Printer", 100, 400),
            ]),
            regions: Weighted::uniform(
                ["North", "South", "East", "West", "Central"].map(String::from),
            ),
            channels: Weighted::uniform(["Online", "Retail", "Distributor"].map(String::from)),
            quantity: 1..=10,
        }
    }
}

impl Catalog {
    /// Checks that every catalog can be drawn from, every range is
    /// non-empty and strictly positive, and the largest possible sale total
    /// fits in a [`Usd`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.products.validate("product")?;
        self.regions.validate("region")?;
        self.channels.validate("channel")?;
        if *self.quantity.start() == 0 || self.quantity.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "quantity range {:?} must be non-empty and start at 1 or more",
                self.quantity
            )));
        }
        for product in self.products.items() {
            let (min, max) = (*product.price.start(), *product.price.end());
            if min.cents() <= 0 || min > max {
                return Err(Error::InvalidParameter(format!(
                    "price range {min}..={max} for {} must be positive and non-empty",
                    product.name
                )));
            }
            if max.checked_mul(*self.quantity.end()).is_none() {
                return Err(Error::InvalidParameter(format!(
                    "{} at {max} × {} overflows",
                    product.name,
                    self.quantity.end()
                )));
            }
        }
        Ok(())
    }
}

/// Time granularity of the trend view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Bucket {
    #[default]
    Day,
    /// ISO week, keyed by its Monday.
    Week,
}

/// Knobs for [`crate::analysis::analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Length of the top-products ranking.
    pub top_n: usize,
    pub bucket: Bucket,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            bucket: Bucket::Day,
        }
    }
}
