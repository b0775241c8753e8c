#![doc = include_str!("../README.md")]
pub mod analysis;
pub mod config;
pub mod error;
pub mod generate;
pub mod names;
pub mod record;
pub mod report;
pub mod sheet;
pub mod table;
pub mod usd;

pub use analysis::{analyze, Analysis, CategoryView, Dimension, Stats, TrendView};
pub use config::{AnalyzerConfig, Bucket, Catalog, ProductSpec, Weighted};
pub use error::{Error, Result};
pub use generate::Generator;
pub use record::{Table, Transaction, COLUMNS};
pub use usd::Usd;
