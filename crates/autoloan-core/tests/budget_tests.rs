use autoloan_core::budget::{solve_budget, BudgetInput, SearchStrategy, SolverConfig, TargetKind};
use autoloan_core::quote::{calculate_quote, LoanInput, QuoteSettings};
use autoloan_core::{InsuranceType, Money, Percent, Tenor};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn loan(price: Money, dp: Percent, tenor: u32, plan: InsuranceType, settings: &QuoteSettings) -> LoanInput {
    LoanInput::new(price, dp, tenor, plan, settings)
}

fn pick(kind: TargetKind, input: &LoanInput) -> Money {
    let q = calculate_quote(input).unwrap().result;
    match kind {
        TargetKind::TotalUpfrontPayment => q.total_upfront_payment,
        TargetKind::MonthlyInstallment => q.monthly_installment,
    }
}

// ===========================================================================
// Monotonicity: bisection is only sound if each target moves one way in dp
// ===========================================================================

#[test]
fn test_targets_are_monotone_in_down_payment() {
    let prices = [dec!(80_000_000), dec!(150_000_000), dec!(300_000_000), dec!(650_000_000), dec!(2_000_000_000)];
    let settings = [
        QuoteSettings::default(),
        QuoteSettings {
            provision_rate_pct: dec!(10),
            additional_admin_fee: dec!(0),
        },
    ];
    for plan in InsuranceType::ALL {
        for tenor in Tenor::all() {
            for price in prices {
                for s in &settings {
                    let mut prev_tdp: Option<Money> = None;
                    let mut prev_inst: Option<Money> = None;
                    let mut dp = dec!(20);
                    while dp <= dec!(90) {
                        let input = loan(price, dp, tenor.years(), plan, s);
                        let tdp = pick(TargetKind::TotalUpfrontPayment, &input);
                        let inst = pick(TargetKind::MonthlyInstallment, &input);
                        if let Some(p) = prev_tdp {
                            assert!(tdp >= p, "upfront fell at {plan} {tenor} {price} dp {dp}");
                        }
                        if let Some(p) = prev_inst {
                            assert!(inst <= p, "installment rose at {plan} {tenor} {price} dp {dp}");
                        }
                        prev_tdp = Some(tdp);
                        prev_inst = Some(inst);
                        dp += dec!(2.5);
                    }
                }
            }
        }
    }
}

// ===========================================================================
// Round trip: quote at dp, solve for its value, land back on dp
// ===========================================================================

#[test]
fn test_round_trip_recovers_down_payment() {
    let settings = QuoteSettings::default();
    let cases = [
        (dec!(300_000_000), dec!(27.5), 4, InsuranceType::Combined),
        (dec!(180_000_000), dec!(63.125), 2, InsuranceType::AllRisk),
        (dec!(720_000_000), dec!(41.3), 7, InsuranceType::AllRiskExtended),
        (dec!(95_000_000), dec!(88.8), 1, InsuranceType::Combined),
    ];
    for (price, dp, tenor, plan) in cases {
        for kind in [TargetKind::TotalUpfrontPayment, TargetKind::MonthlyInstallment] {
            let target = pick(kind, &loan(price, dp, tenor, plan, &settings));
            let input = BudgetInput {
                otr_price: price,
                tenor_years: tenor,
                insurance_type: plan,
                settings,
                target,
                target_kind: kind,
            };
            let out = solve_budget(&input, &SolverConfig::default()).unwrap().result;
            assert!(
                (out.dp_percent - dp).abs() < dec!(0.0001),
                "{kind:?} {price} {tenor}: expected {dp}, got {}",
                out.dp_percent
            );
            assert!(out.target_attainable);
            // Quote shown for the solution is the calculator's own
            let again = calculate_quote(&loan(price, out.dp_percent, tenor, plan, &settings))
                .unwrap()
                .result;
            assert_eq!(again, out.quote);
        }
    }
}

#[test]
fn test_strategies_agree_on_installment_target() {
    let input = BudgetInput {
        otr_price: dec!(450_000_000),
        tenor_years: 5,
        insurance_type: InsuranceType::AllRisk,
        settings: QuoteSettings::default(),
        target: dec!(5_000_000),
        target_kind: TargetKind::MonthlyInstallment,
    };
    let fast = solve_budget(&input, &SolverConfig::default()).unwrap().result;
    let slow = solve_budget(
        &input,
        &SolverConfig {
            strategy: SearchStrategy::Exhaustive,
            step: dec!(0.001),
            tolerance: dec!(100),
            ..SolverConfig::default()
        },
    )
    .unwrap()
    .result;
    assert!((fast.dp_percent - slow.dp_percent).abs() < dec!(0.01));
    assert!(fast.difference < dec!(1));
}

#[test]
fn test_budget_input_from_json() {
    let input: BudgetInput = serde_json::from_str(
        r#"{"otr_price": "300000000", "tenor_years": 4, "target": "84474800", "target_kind": "tdp"}"#,
    )
    .unwrap();
    assert_eq!(input.insurance_type, InsuranceType::Combined);
    assert_eq!(input.settings, QuoteSettings::default());
    let out = solve_budget(&input, &SolverConfig::default()).unwrap().result;
    assert_eq!(out.dp_percent, dec!(20));
    assert_eq!(out.difference, Decimal::ZERO);
}
