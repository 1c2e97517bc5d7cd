use autoloan_core::comparison::{compare_tenors, ComparisonInput};
use autoloan_core::quote::{calculate_quote, quote_with_tables, LoanInput, QuoteSettings};
use autoloan_core::rates::{rate_sheet, Band, BandedTable, Fallback, RateTables};
use autoloan_core::{AutoLoanError, InsuranceType, Tenor};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Quote tests
// ===========================================================================

fn showroom_loan() -> LoanInput {
    LoanInput {
        otr_price: dec!(300_000_000),
        dp_percent: dec!(20),
        tenor_years: 4,
        insurance_type: InsuranceType::Combined,
        provision_rate_pct: dec!(5),
        additional_admin_fee: dec!(5_000_000),
    }
}

#[test]
fn test_reference_loan_breakdown() {
    let q = calculate_quote(&showroom_loan()).unwrap().result;

    assert_eq!(q.dp_amount, dec!(60_000_000));
    assert_eq!(q.loan_principal, dec!(240_000_000));
    assert_eq!(q.provision_fee, dec!(12_000_000));
    assert_eq!(q.loan_principal_with_provision, dec!(252_000_000));
    assert_eq!(q.interest_rate_pct, dec!(3.88));
    assert_eq!(q.interest_amount, dec!(39_110_400));
    assert_eq!(q.total_loan_amount, dec!(291_110_400));
    assert_eq!(q.monthly_installment, dec!(6_064_800));
    assert_eq!(q.tenor_months, 48);
}

#[test]
fn test_upfront_payment_is_sum_of_components() {
    let plans = InsuranceType::ALL;
    let prices = [dec!(95_000_000), dec!(200_000_000), dec!(455_500_000), dec!(1_250_000_000)];
    for plan in plans {
        for price in prices {
            for tenor in Tenor::all() {
                let input = LoanInput {
                    otr_price: price,
                    insurance_type: plan,
                    tenor_years: tenor.years(),
                    ..showroom_loan()
                };
                let q = calculate_quote(&input).unwrap().result;
                let diff = (q.total_upfront_payment - q.upfront_components_sum()).abs();
                assert!(diff <= dec!(0.5), "{plan} {price} {tenor}: off by {diff}");
                assert_eq!(q.total_upfront_payment.scale(), 0);
            }
        }
    }
}

#[test]
fn test_insurance_band_edges_are_inclusive_above() {
    let at_edge = LoanInput {
        otr_price: dec!(125_000_000),
        ..showroom_loan()
    };
    let past_edge = LoanInput {
        otr_price: dec!(125_000_000.5),
        ..showroom_loan()
    };
    assert_eq!(calculate_quote(&at_edge).unwrap().result.insurance_rate_pct, dec!(5.21));
    assert_eq!(calculate_quote(&past_edge).unwrap().result.insurance_rate_pct, dec!(3.79));
}

#[test]
fn test_tenor_outside_range_is_an_error() {
    for years in [0, 8, 30] {
        let input = LoanInput {
            tenor_years: years,
            ..showroom_loan()
        };
        match calculate_quote(&input) {
            Err(AutoLoanError::UnsupportedTenor(y)) => assert_eq!(y, years),
            other => panic!("expected UnsupportedTenor, got {other:?}"),
        }
    }
}

#[test]
fn test_quote_from_json_with_legacy_plan_name() {
    let input: LoanInput = serde_json::from_str(
        r#"{"otr_price": "300000000", "dp_percent": 20, "tenor_years": 4, "insurance_type": "kombinasi"}"#,
    )
    .unwrap();
    assert_eq!(input, showroom_loan());
}

#[test]
fn test_settings_change_admin_and_provision() {
    let settings = QuoteSettings {
        provision_rate_pct: dec!(0),
        additional_admin_fee: dec!(0),
    };
    let input = LoanInput::new(dec!(300_000_000), dec!(20), 4, InsuranceType::Combined, &settings);
    let q = calculate_quote(&input).unwrap().result;
    assert_eq!(q.provision_fee, Decimal::ZERO);
    assert_eq!(q.total_admin_fee, dec!(3_250_000));
}

#[test]
fn test_custom_tables_feed_the_same_formula() {
    let flat = |v: Decimal| [v; 7];
    let tables = RateTables::new(
        BandedTable::new(
            dec!(1),
            vec![Band::upto(dec!(7), dec!(10))],
            Fallback::LastBand,
        )
        .unwrap(),
        autoloan_core::rates::InsuranceRateTable {
            combined: BandedTable::new(dec!(0), vec![Band::unbounded(flat(dec!(1)))], Fallback::LastBand).unwrap(),
            all_risk: BandedTable::new(dec!(0), vec![Band::unbounded(flat(dec!(2)))], Fallback::LastBand).unwrap(),
            all_risk_extended: BandedTable::new(dec!(0), vec![Band::unbounded(flat(dec!(3)))], Fallback::LastBand)
                .unwrap(),
        },
        BandedTable::new(dec!(1), vec![Band::upto(dec!(7), dec!(1_000_000))], Fallback::LastBand).unwrap(),
        autoloan_core::rates::FixedFees::default(),
    )
    .unwrap();

    let q = quote_with_tables(&tables, &showroom_loan()).unwrap();
    assert_eq!(q.interest_rate_pct, dec!(10));
    assert_eq!(q.insurance_rate_pct, dec!(1));
    assert_eq!(q.admin_fee, dec!(1_000_000));
    // 252M * 10% * 4
    assert_eq!(q.interest_amount, dec!(100_800_000));
}

// ===========================================================================
// Comparison tests
// ===========================================================================

#[test]
fn test_comparison_row_matches_single_quote() {
    let input = ComparisonInput {
        otr_price: dec!(300_000_000),
        dp_percent: dec!(20),
        insurance_type: InsuranceType::Combined,
        settings: QuoteSettings::default(),
    };
    let table = compare_tenors(&input).unwrap().result;
    assert_eq!(table.rows.len(), 7);

    let single = calculate_quote(&showroom_loan()).unwrap().result;
    assert_eq!(table.quotes[3], single);
    assert_eq!(table.rows[3].total_upfront_payment, dec!(84_474_800));
    assert_eq!(table.lowest_installment_tenor, 7);
}

#[test]
fn test_comparison_rejects_price_beyond_supported_range() {
    let input = ComparisonInput {
        otr_price: dec!(1_000_000_000_000_000_000_000_000_000),
        dp_percent: dec!(90),
        insurance_type: InsuranceType::Combined,
        settings: QuoteSettings::default(),
    };
    assert!(matches!(
        compare_tenors(&input),
        Err(AutoLoanError::InvalidInput { ref field, .. }) if field == "otr_price"
    ));
}

// ===========================================================================
// Rate sheet tests
// ===========================================================================

#[test]
fn test_rate_sheet_lists_every_band() {
    let sheet = rate_sheet().result;
    assert_eq!(sheet.interest_rates.len(), 7);
    // 5 + 5 + 3 insurance bands
    assert_eq!(sheet.insurance_bands.len(), 13);
    assert_eq!(sheet.admin_fees.len(), 3);
    assert_eq!(sheet.fixed_fees.tpi_fee, dec!(500_000));
}

#[test]
fn test_solver_domain_edges_quote_cleanly() {
    for dp in [dec!(20), dec!(90)] {
        for plan in InsuranceType::ALL {
            let input = LoanInput {
                dp_percent: dp,
                insurance_type: plan,
                ..showroom_loan()
            };
            let out = calculate_quote(&input).unwrap();
            assert!(out.warnings.is_empty(), "{dp} {plan}: {:?}", out.warnings);
            let q = out.result;
            for v in [q.dp_amount, q.loan_principal, q.monthly_installment, q.insurance_amount, q.total_upfront_payment] {
                assert!(v >= Decimal::ZERO);
            }
            assert!(q.total_upfront_payment >= q.dp_amount);
        }
    }
}
