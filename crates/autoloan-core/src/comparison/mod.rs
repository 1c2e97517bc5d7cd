pub mod tenor;

pub use tenor::{compare_tenors, ComparisonInput, TenorComparison, TenorRow};
