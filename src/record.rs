use chrono::NaiveDate;

use crate::{
    error::{Error, Result},
    usd::Usd,
};

/// Column headers of a sales table, in the fixed order they are written.
pub const COLUMNS: [&str; 7] = [
    "Date",
    "Product",
    "Region",
    "Channel",
    "Units",
    "Unit_Price",
    "Total_Sale",
];

/// One sale.
///
/// The sale total is not stored: [`Transaction::total`] always derives it
/// from the quantity and unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub product: String,
    pub region: String,
    pub channel: String,
    pub units: u32,
    pub unit_price: Usd,
}

impl Transaction {
    /// Creates a transaction, checking that quantity and price are positive
    /// and that their product fits in a [`Usd`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if `units` is zero, `unit_price`
    /// is not positive, or the total overflows.
    pub fn new(
        date: NaiveDate,
        product: &str,
        region: &str,
        channel: &str,
        units: u32,
        unit_price: Usd,
    ) -> Result<Self> {
        if units == 0 || unit_price.cents() <= 0 {
            return Err(Error::SchemaMismatch(format!(
                "{product} on {date}: units ({units}) and unit price ({unit_price}) \
                 must be positive"
            )));
        }
        if unit_price.checked_mul(units).is_none() {
            return Err(Error::SchemaMismatch(format!(
                "{product} on {date}: {units} × {unit_price} overflows"
            )));
        }
        Ok(Self {
            date,
            product: product.to_string(),
            region: region.to_string(),
            channel: channel.to_string(),
            units,
            unit_price,
        })
    }

    #[must_use]
    pub fn total(&self) -> Usd {
        self.unit_price * self.units
    }
}

/// Sales transactions in the order they were generated or read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Transaction>,
}

impl Table {
    /// Wraps `rows`, checking that their combined total fits in a [`Usd`].
    ///
    /// Every row total is positive, so any sum over a subset of the rows fits
    /// as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the combined total overflows.
    pub fn new(rows: Vec<Transaction>) -> Result<Self> {
        rows.iter()
            .try_fold(Usd::default(), |acc, tx| acc.checked_add(tx.total()))
            .ok_or_else(|| {
                Error::SchemaMismatch(format!(
                    "combined total of {} transactions overflows",
                    rows.len()
                ))
            })?;
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of every row's total.
    #[must_use]
    pub fn total(&self) -> Usd {
        self.rows.iter().map(Transaction::total).sum()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
