pub mod banded;
pub mod tables;

pub use banded::{Band, BandedTable, Fallback};
pub use tables::{rate_sheet, FixedFees, InsuranceRateTable, RateSheet, RateTables};
