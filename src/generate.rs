use chrono::{Days, Local, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    config::Catalog,
    error::{Error, Result},
    record::{Table, Transaction},
    usd::Usd,
};

/// Earliest date a spreadsheet cell can hold.
const EARLIEST_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};

/// Fabricates sales transactions from a [`Catalog`].
///
/// Dates are drawn from the inclusive window ending on [`Self::ending_on`]
/// (today, by default).
#[derive(Debug, Clone)]
pub struct Generator<'a> {
    catalog: &'a Catalog,
    end: NaiveDate,
}

impl<'a> Generator<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            end: Local::now().date_naive(),
        }
    }

    /// Sets the last day of the generation window.
    #[must_use]
    pub fn ending_on(mut self, end: NaiveDate) -> Self {
        self.end = end;
        self
    }

    /// Generates exactly `record_count` transactions dated within
    /// `[end - day_span, end]`.
    ///
    /// With a `seed` the output depends only on the arguments and the catalog;
    /// without one, a fresh seed is drawn from the thread RNG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `record_count` or `day_span` is
    /// zero, the catalog is invalid, or the window starts before 1900-01-01.
    pub fn generate(
        &self,
        record_count: usize,
        day_span: u32,
        seed: Option<u64>,
    ) -> Result<Table> {
        if record_count == 0 {
            return Err(Error::InvalidParameter(
                "record count must be positive".to_string(),
            ));
        }
        if day_span == 0 {
            return Err(Error::InvalidParameter("day span must be positive".to_string()));
        }
        self.catalog.validate()?;
        let start = self
            .end
            .checked_sub_days(Days::new(u64::from(day_span)))
            .filter(|start| *start >= EARLIEST_DATE)
            .ok_or_else(|| {
                Error::InvalidParameter(format!(
                    "day span {day_span} before {} reaches before {EARLIEST_DATE}",
                    self.end
                ))
            })?;

        let seed = seed.unwrap_or_else(|| rand::rng().random());
        debug!(seed, %start, end = %self.end, "seeding generator");
        info!("Generating {record_count} sample sales records");

        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..record_count)
            .map(|_| self.transaction(&mut rng, start, day_span))
            .collect::<Result<Vec<_>>>()?;
        Table::new(rows).map_err(|e| Error::InvalidParameter(e.to_string()))
    }

    fn transaction(
        &self,
        rng: &mut StdRng,
        start: NaiveDate,
        day_span: u32,
    ) -> Result<Transaction> {
        let exhausted = || Error::InvalidParameter("catalog has no selectable entry".to_string());
        let product = self.catalog.products.pick(rng).ok_or_else(exhausted)?;
        let unit_price = Usd::from_cents(
            rng.random_range(product.price.start().cents()..=product.price.end().cents()),
        );
        let units = rng.random_range(self.catalog.quantity.clone());
        let offset = rng.random_range(0..=day_span);
        let date = start
            .checked_add_days(Days::new(u64::from(offset)))
            .ok_or_else(|| Error::InvalidParameter(format!("date offset {offset} overflows")))?;
        let region = self.catalog.regions.pick(rng).ok_or_else(exhausted)?;
        let channel = self.catalog.channels.pick(rng).ok_or_else(exhausted)?;
        Transaction::new(date, &product.name, region, channel, units, unit_price)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ProductSpec, Weighted};

    use super::*;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn generate_fn_returns_requested_number_of_valid_rows() {
        let catalog = Catalog::default();
        let table = Generator::new(&catalog)
            .ending_on(end())
            .generate(150, 90, Some(42))
            .unwrap();
        assert_eq!(table.len(), 150);
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        for tx in &table {
            assert!(tx.date >= start && tx.date <= end(), "{} out of window", tx.date);
            assert!((1..=10).contains(&tx.units));
            assert!(tx.unit_price.cents() > 0);
            assert_eq!(tx.total(), tx.unit_price * tx.units);
            let spec = catalog
                .products
                .items()
                .find(|p| p.name == tx.product)
                .expect("product from catalog");
            assert!(spec.price.contains(&tx.unit_price));
            assert!(catalog.regions.items().any(|r| *r == tx.region));
            assert!(catalog.channels.items().any(|c| *c == tx.channel));
        }
    }

    #[test]
    fn generate_fn_is_deterministic_for_a_seed() {
        let catalog = Catalog::default();
        let generator = Generator::new(&catalog).ending_on(end());
        let a = generator.generate(50, 30, Some(9)).unwrap();
        let b = generator.generate(50, 30, Some(9)).unwrap();
        assert_eq!(a, b);
        let c = generator.generate(50, 30, Some(10)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn generate_fn_rejects_zero_count_or_span() {
        let catalog = Catalog::default();
        let generator = Generator::new(&catalog);
        assert!(matches!(
            generator.generate(0, 90, None),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            generator.generate(10, 0, None),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn generate_fn_honours_catalog_weights() {
        let catalog = Catalog {
            products: Weighted::new([
                (ProductSpec::new("Laptop", 800, 2000), 0),
                (ProductSpec::new("Mouse", 10, 80), 1),
            ]),
            ..Catalog::default()
        };
        let table = Generator::new(&catalog).generate(40, 10, Some(1)).unwrap();
        assert!(table.rows().iter().all(|tx| tx.product == "Mouse"));
    }

    #[test]
    fn generate_fn_rejects_invalid_catalog() {
        let catalog = Catalog {
            channels: Weighted::uniform(Vec::new()),
            ..Catalog::default()
        };
        assert!(matches!(
            Generator::new(&catalog).generate(5, 5, Some(1)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn generate_fn_rejects_window_before_1900() {
        let catalog = Catalog::default();
        let generator = Generator::new(&catalog).ending_on(end());
        let days_since_1900 = u32::try_from((end() - EARLIEST_DATE).num_days()).unwrap();
        assert!(generator.generate(10, days_since_1900, Some(1)).is_ok());
        assert!(matches!(
            generator.generate(10, days_since_1900 + 1, Some(1)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn generate_fn_rejects_catalog_whose_totals_overflow() {
        let catalog = Catalog {
            products: Weighted::uniform([ProductSpec::new(
                "Yacht",
                i64::MAX / 200,
                i64::MAX / 100,
            )]),
            ..Catalog::default()
        };
        assert!(matches!(
            Generator::new(&catalog).generate(5, 5, Some(1)),
            Err(Error::InvalidParameter(_))
        ));
    }
}
