//! Canonical rate sheet: interest by tenor, insurance by price band / plan /
//! tenor, admin fee by tenor band, and the fixed fees.
//!
//! The tables are process-wide and read-only; [`RateTables::canonical`]
//! builds them once on first use.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Instant;

use crate::error::AutoLoanError;
use crate::rates::banded::{Band, BandedTable, Fallback};
use crate::types::{
    with_metadata, ComputationOutput, InsuranceType, Money, Percent, Tenor, MAX_AMOUNT,
    MAX_TENOR_YEARS, MIN_TENOR_YEARS,
};
use crate::AutoLoanResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Interest rate used for a tenor missing from the interest table.
pub const DEFAULT_INTEREST_RATE_PCT: Percent = dec!(4.88);
pub const DEFAULT_PROVISION_RATE_PCT: Percent = dec!(5.0);
/// Third-party-insurance fee, charged once with the upfront payment.
pub const TPI_FEE: Money = dec!(500_000);
pub const CREDIT_PROTECTION_RATE_PCT: Percent = dec!(0);

/// Upper bound for any rate on a custom sheet.
pub const MAX_RATE_PCT: Percent = dec!(100);

/// Number of per-tenor columns in an insurance band.
pub const TENOR_COLUMNS: usize = (MAX_TENOR_YEARS - MIN_TENOR_YEARS + 1) as usize;

pub type TenorRates = [Percent; TENOR_COLUMNS];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fees that do not depend on price or tenor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedFees {
    pub default_provision_rate_pct: Percent,
    pub tpi_fee: Money,
    /// Zero on the current sheet; kept so a non-zero rate needs no code change.
    pub credit_protection_rate_pct: Percent,
}

impl Default for FixedFees {
    fn default() -> Self {
        FixedFees {
            default_provision_rate_pct: DEFAULT_PROVISION_RATE_PCT,
            tpi_fee: TPI_FEE,
            credit_protection_rate_pct: CREDIT_PROTECTION_RATE_PCT,
        }
    }
}

/// Insurance rates keyed by OTR price band, one table per plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceRateTable {
    pub combined: BandedTable<TenorRates>,
    pub all_risk: BandedTable<TenorRates>,
    pub all_risk_extended: BandedTable<TenorRates>,
}

impl InsuranceRateTable {
    pub fn for_plan(&self, plan: InsuranceType) -> &BandedTable<TenorRates> {
        match plan {
            InsuranceType::Combined => &self.combined,
            InsuranceType::AllRisk => &self.all_risk,
            InsuranceType::AllRiskExtended => &self.all_risk_extended,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTables {
    interest: BandedTable<Percent>,
    insurance: InsuranceRateTable,
    admin_fees: BandedTable<Money>,
    fixed_fees: FixedFees,
}

static CANONICAL: OnceLock<RateTables> = OnceLock::new();

impl RateTables {
    /// Assemble a custom rate sheet. Insurance tables must cover every price
    /// from zero upwards and the admin fee table every supported tenor.
    pub fn new(
        interest: BandedTable<Percent>,
        insurance: InsuranceRateTable,
        admin_fees: BandedTable<Money>,
        fixed_fees: FixedFees,
    ) -> AutoLoanResult<Self> {
        for plan in InsuranceType::ALL {
            let table = insurance.for_plan(plan);
            if table.floor() > Decimal::ZERO || !table.covers_to_infinity() {
                return Err(AutoLoanError::InvalidInput {
                    field: format!("insurance.{plan}"),
                    reason: "Price bands must cover [0, +inf) without gaps".into(),
                });
            }
        }
        for tenor in Tenor::all() {
            if admin_fees.band_index(Decimal::from(tenor.years())).is_none() {
                return Err(AutoLoanError::InvalidInput {
                    field: "admin_fees".into(),
                    reason: format!("No admin fee band covers a tenor of {tenor}"),
                });
            }
        }
        check_rates("interest", interest.values().copied())?;
        for plan in InsuranceType::ALL {
            let rates = insurance.for_plan(plan).values().flat_map(|row| row.iter().copied());
            check_rates(&format!("insurance.{plan}"), rates)?;
        }
        check_amounts("admin_fees", admin_fees.values().copied())?;
        check_amounts("fixed_fees.tpi_fee", [fixed_fees.tpi_fee])?;
        check_rates(
            "fixed_fees",
            [fixed_fees.credit_protection_rate_pct, fixed_fees.default_provision_rate_pct],
        )?;
        Ok(RateTables {
            interest,
            insurance,
            admin_fees,
            fixed_fees,
        })
    }

    /// The published rate sheet, built once per process.
    pub fn canonical() -> &'static RateTables {
        CANONICAL.get_or_init(canonical_tables)
    }

    /// Annual flat interest rate for a tenor.
    pub fn interest_rate(&self, tenor: Tenor) -> Percent {
        *self.interest.lookup(Decimal::from(tenor.years()))
    }

    /// First-year insurance rate for a vehicle price, plan and tenor.
    pub fn insurance_rate(&self, otr_price: Money, plan: InsuranceType, tenor: Tenor) -> Percent {
        self.insurance.for_plan(plan).lookup(otr_price)[tenor.index()]
    }

    /// Base admin fee for a tenor, before any additional fee from settings.
    pub fn admin_fee(&self, tenor: Tenor) -> Money {
        *self.admin_fees.lookup(Decimal::from(tenor.years()))
    }

    pub fn fixed_fees(&self) -> &FixedFees {
        &self.fixed_fees
    }

    pub fn interest_table(&self) -> &BandedTable<Percent> {
        &self.interest
    }

    pub fn insurance_table(&self) -> &InsuranceRateTable {
        &self.insurance
    }

    pub fn admin_fee_table(&self) -> &BandedTable<Money> {
        &self.admin_fees
    }
}

fn check_rates(field: &str, rates: impl IntoIterator<Item = Percent>) -> AutoLoanResult<()> {
    if rates.into_iter().any(|r| r < Decimal::ZERO || r > MAX_RATE_PCT) {
        return Err(AutoLoanError::InvalidInput {
            field: field.into(),
            reason: format!("Rates must be between 0 and {MAX_RATE_PCT}%"),
        });
    }
    Ok(())
}

fn check_amounts(field: &str, amounts: impl IntoIterator<Item = Money>) -> AutoLoanResult<()> {
    if amounts.into_iter().any(|a| a < Decimal::ZERO || a > MAX_AMOUNT) {
        return Err(AutoLoanError::InvalidInput {
            field: field.into(),
            reason: format!("Fees must be between 0 and {MAX_AMOUNT}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Canonical data
// ---------------------------------------------------------------------------

fn canonical_tables() -> RateTables {
    let interest = BandedTable::from_sorted(
        Decimal::from(MIN_TENOR_YEARS),
        vec![
            Band::upto(dec!(1), dec!(2.88)),
            Band::upto(dec!(2), dec!(2.88)),
            Band::upto(dec!(3), dec!(2.88)),
            Band::upto(dec!(4), dec!(3.88)),
            Band::upto(dec!(5), dec!(4.88)),
            Band::upto(dec!(6), dec!(5.88)),
            Band::upto(dec!(7), dec!(6.88)),
        ],
        Fallback::Value(DEFAULT_INTEREST_RATE_PCT),
    );

    let combined = BandedTable::from_sorted(
        Decimal::ZERO,
        vec![
            Band::upto(
                dec!(125_000_000),
                [dec!(3.258), dec!(3.91), dec!(4.56), dec!(5.21), dec!(5.86), dec!(6.51), dec!(7.18)],
            ),
            Band::upto(
                dec!(200_000_000),
                [dec!(2.47), dec!(2.91), dec!(3.35), dec!(3.79), dec!(4.23), dec!(4.67), dec!(5.11)],
            ),
            Band::upto(
                dec!(400_000_000),
                [dec!(2.08), dec!(2.45), dec!(2.84), dec!(3.22), dec!(3.60), dec!(3.98), dec!(4.36)],
            ),
            Band::upto(
                dec!(800_000_000),
                [dec!(1.20), dec!(1.45), dec!(1.70), dec!(1.95), dec!(2.20), dec!(2.45), dec!(2.70)],
            ),
            Band::unbounded(
                [dec!(1.16), dec!(1.40), dec!(1.64), dec!(1.88), dec!(2.12), dec!(2.05), dec!(2.25)],
            ),
        ],
        Fallback::LastBand,
    );

    let all_risk = BandedTable::from_sorted(
        Decimal::ZERO,
        vec![
            Band::upto(
                dec!(125_000_000),
                [dec!(3.26), dec!(6.52), dec!(9.78), dec!(13.04), dec!(16.30), dec!(19.56), dec!(22.82)],
            ),
            Band::upto(
                dec!(200_000_000),
                [dec!(2.47), dec!(4.94), dec!(7.41), dec!(9.88), dec!(12.35), dec!(14.82), dec!(17.29)],
            ),
            Band::upto(
                dec!(400_000_000),
                [dec!(2.08), dec!(4.16), dec!(6.24), dec!(8.32), dec!(10.40), dec!(12.48), dec!(14.56)],
            ),
            Band::upto(
                dec!(800_000_000),
                [dec!(1.20), dec!(2.40), dec!(3.60), dec!(4.80), dec!(6.00), dec!(7.20), dec!(8.40)],
            ),
            Band::unbounded(
                [dec!(1.16), dec!(2.32), dec!(3.48), dec!(4.64), dec!(5.80), dec!(6.96), dec!(8.12)],
            ),
        ],
        Fallback::LastBand,
    );

    let all_risk_extended = BandedTable::from_sorted(
        Decimal::ZERO,
        vec![
            Band::upto(
                dec!(125_000_000),
                [dec!(4.00), dec!(7.40), dec!(10.40), dec!(13.20), dec!(15.80), dec!(18.20), dec!(20.40)],
            ),
            Band::upto(
                dec!(200_000_000),
                [dec!(3.00), dec!(6.00), dec!(9.00), dec!(12.00), dec!(15.00), dec!(18.00), dec!(21.00)],
            ),
            Band::unbounded(
                [dec!(3.00), dec!(5.70), dec!(8.10), dec!(10.35), dec!(12.45), dec!(14.55), dec!(16.65)],
            ),
        ],
        Fallback::LastBand,
    );

    let admin_fees = BandedTable::from_sorted(
        Decimal::from(MIN_TENOR_YEARS),
        vec![
            Band::upto(dec!(3), dec!(3_000_000)),
            Band::upto(dec!(4), dec!(3_250_000)),
            Band::upto(dec!(7), dec!(3_500_000)),
        ],
        Fallback::LastBand,
    );

    RateTables {
        interest,
        insurance: InsuranceRateTable {
            combined,
            all_risk,
            all_risk_extended,
        },
        admin_fees,
        fixed_fees: FixedFees::default(),
    }
}

// ---------------------------------------------------------------------------
// Rate sheet export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestRateRow {
    pub tenor_years: u32,
    pub annual_rate_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceBandRow {
    pub insurance_type: InsuranceType,
    /// Exclusive lower edge; `None` for the first band, which starts at zero inclusive.
    pub price_above: Option<Money>,
    /// Inclusive upper edge; `None` for the open-ended top band.
    pub price_up_to: Option<Money>,
    pub rates_by_tenor_pct: TenorRates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminFeeRow {
    pub min_tenor: u32,
    pub max_tenor: u32,
    pub fee: Money,
}

/// Flattened view of a rate sheet for display or export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSheet {
    pub interest_rates: Vec<InterestRateRow>,
    pub insurance_bands: Vec<InsuranceBandRow>,
    pub admin_fees: Vec<AdminFeeRow>,
    pub fixed_fees: FixedFees,
}

/// Export the canonical rate sheet.
pub fn rate_sheet() -> ComputationOutput<RateSheet> {
    rate_sheet_for(RateTables::canonical())
}

pub fn rate_sheet_for(tables: &RateTables) -> ComputationOutput<RateSheet> {
    let start = Instant::now();

    let interest_rates = Tenor::all()
        .map(|tenor| InterestRateRow {
            tenor_years: tenor.years(),
            annual_rate_pct: tables.interest_rate(tenor),
        })
        .collect();

    let mut insurance_bands = Vec::new();
    for plan in InsuranceType::ALL {
        let table = tables.insurance.for_plan(plan);
        for (i, band) in table.bands().iter().enumerate() {
            insurance_bands.push(InsuranceBandRow {
                insurance_type: plan,
                price_above: if i == 0 { None } else { table.lower_bound(i) },
                price_up_to: band.upper,
                rates_by_tenor_pct: band.value,
            });
        }
    }

    let mut admin_fees = Vec::new();
    let mut next_min = MIN_TENOR_YEARS;
    for band in tables.admin_fees.bands() {
        let max_tenor = band
            .upper
            .and_then(|u| u.trunc().to_u32())
            .map(|u| u.min(MAX_TENOR_YEARS))
            .unwrap_or(MAX_TENOR_YEARS);
        admin_fees.push(AdminFeeRow {
            min_tenor: next_min,
            max_tenor,
            fee: band.value,
        });
        next_min = max_tenor + 1;
    }

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Published rate sheet: flat interest by tenor, first-year insurance by price band, admin fee by tenor band",
        &serde_json::json!({
            "band_boundaries": "upper-inclusive: (previous max, max]",
            "default_interest_rate_pct": DEFAULT_INTEREST_RATE_PCT.to_string(),
        }),
        Vec::new(),
        elapsed,
        RateSheet {
            interest_rates,
            insurance_bands,
            admin_fees,
            fixed_fees: tables.fixed_fees.clone(),
        },
    )
}
