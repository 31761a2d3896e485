use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::applicability::{ApplicableMethods, DevelopmentPhase};
use super::catalog::{CostRange, FinancingCatalog, FinancingMethod};
use crate::error::DevFinError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::DevFinResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What to do with a leverage or interest-rate value outside its permitted bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundPolicy {
    /// Fail with `DevFinError::OutOfRange`.
    #[default]
    Reject,
    /// Pull the value back to the nearest bound and record a warning.
    Clamp,
}

/// Inputs for one financing scenario evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Total development cost to be financed
    pub total_investment: Money,
    /// Total revenue expected from the development
    pub total_revenue: Money,
    /// Leverage fraction chosen per external financing method
    #[serde(default)]
    pub selections: BTreeMap<FinancingMethod, Rate>,
    /// Interest rate chosen per method, replacing the midpoint of its cost range
    #[serde(default)]
    pub rate_overrides: BTreeMap<FinancingMethod, Rate>,
    #[serde(default)]
    pub bound_policy: BoundPolicy,
}

/// Return on the developer's own capital.
///
/// Undefined when the developer deploys no capital of their own; that case is
/// a distinct variant rather than an infinite or NaN value. A positive but
/// vanishingly small own stake can push the quotient past the decimal range,
/// which is reported as `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum EquityMultiplier {
    Finite(Multiple),
    NoOwnCapital,
    Unbounded,
}

impl EquityMultiplier {
    /// `numerator / own_stake`, or `Unbounded` when the quotient does not fit.
    fn ratio(numerator: Decimal, own_stake: Decimal) -> Self {
        match numerator.checked_div(own_stake) {
            Some(m) => EquityMultiplier::Finite(m),
            None => EquityMultiplier::Unbounded,
        }
    }

    pub fn value(&self) -> Option<Multiple> {
        match self {
            EquityMultiplier::Finite(m) => Some(*m),
            EquityMultiplier::NoOwnCapital | EquityMultiplier::Unbounded => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.value().is_some()
    }
}

/// Cost, revenue and profit attributable to one external financing method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodBreakdown {
    pub method: FinancingMethod,
    /// Share of total investment funded by this method
    pub leverage: Rate,
    /// Rate applied (override if supplied, otherwise the midpoint)
    pub interest_rate: Rate,
    /// Midpoint of the method's cost-of-capital range
    pub default_rate: Rate,
    /// leverage * total investment
    pub principal: Money,
    /// principal * interest rate, a single-period charge
    pub interest_payment: Money,
    /// principal + interest
    pub total_cost: Money,
    /// leverage * total revenue
    pub revenue_share: Money,
    /// revenue share - total cost
    pub profit: Money,
}

/// The developer's residual equity position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeveloperBreakdown {
    /// 1 - sum of external leverage
    pub equity_fraction: Rate,
    /// equity fraction * total investment
    pub investment: Money,
    pub revenue_share: Money,
    /// revenue share - own investment
    pub profit: Money,
}

/// Output of a financing scenario evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub phase: DevelopmentPhase,
    /// Developer's own-equity fraction
    pub own_equity_fraction: Rate,
    /// Weighted average cost of capital using the effective rates
    pub wacc: Rate,
    /// WACC at midpoint rates, before any override
    pub default_wacc: Rate,
    /// Selected methods with non-zero leverage, in table order
    pub methods: Vec<MethodBreakdown>,
    pub developer: DeveloperBreakdown,
    /// Sum of method costs plus the developer's own principal
    pub total_financing_cost: Money,
    /// total revenue - total financing cost
    pub developer_profit: Money,
    /// (developer profit + own principal) / own principal
    pub equity_multiplier: EquityMultiplier,
    /// 1 / own-equity fraction
    pub leverage_multiplier: EquityMultiplier,
}

/// Leverage and effective rate settled for one offered method.
#[derive(Debug, Clone, Copy)]
struct ResolvedMethod {
    method: FinancingMethod,
    leverage: Rate,
    rate: Rate,
    default_rate: Rate,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate a development financing scenario.
///
/// External methods each fund `leverage * total_investment` and cost that
/// principal plus one period of interest at the effective rate. The developer
/// funds the remainder at zero cost:
///
/// own = 1 - sum(leverage)
/// WACC = sum(leverage_i * rate_i) + own * 0
/// total financing cost = sum(principal_i + interest_i) + own * investment
/// developer profit = total revenue - total financing cost
/// multiplier = (developer profit + own principal) / own principal
///
/// Selections totalling more than 100% fail with `OverAllocation` before any
/// other check on the selections.
pub fn evaluate_scenario(
    applicable: &ApplicableMethods,
    catalog: &FinancingCatalog,
    input: &ScenarioInput,
) -> DevFinResult<ComputationOutput<ScenarioResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validation ---
    validate_amounts(input)?;
    check_allocation(input)?;

    let resolved = resolve_methods(applicable, catalog, input, &mut warnings)?;

    // --- Equity split ---
    let external_leverage: Rate = resolved.iter().map(|r| r.leverage).sum();
    // Non-negative: resolved leverage never exceeds the allocation checked above.
    let own_equity_fraction = Decimal::ONE - external_leverage;

    // --- WACC (dot product; own capital contributes own * 0) ---
    let wacc: Rate = resolved.iter().map(|r| r.leverage * r.rate).sum();
    let default_wacc: Rate = resolved.iter().map(|r| r.leverage * r.default_rate).sum();

    // --- Per-method cost, revenue and profit ---
    let methods: Vec<MethodBreakdown> = resolved
        .iter()
        .map(|r| method_breakdown(r, input))
        .collect::<DevFinResult<_>>()?;
    for m in &methods {
        log::trace!(
            "{}: leverage {} at {} -> cost {}",
            m.method,
            m.leverage,
            m.interest_rate,
            m.total_cost
        );
    }

    // --- Developer's own position ---
    let own_principal = checked_mul(own_equity_fraction, input.total_investment, "own principal")?;
    let own_revenue = checked_mul(own_equity_fraction, input.total_revenue, "own revenue share")?;
    let developer = DeveloperBreakdown {
        equity_fraction: own_equity_fraction,
        investment: own_principal,
        revenue_share: own_revenue,
        profit: own_revenue - own_principal,
    };

    // --- Totals ---
    let total_financing_cost = methods
        .iter()
        .map(|m| m.total_cost)
        .try_fold(own_principal, |acc, cost| acc.checked_add(cost))
        .ok_or_else(|| overflow("total financing cost"))?;
    let developer_profit = input.total_revenue - total_financing_cost;

    let (equity_multiplier, leverage_multiplier) = if own_equity_fraction.is_zero() {
        warnings.push(
            "No own capital deployed: equity multiplier is undefined (100% external financing)"
                .into(),
        );
        (EquityMultiplier::NoOwnCapital, EquityMultiplier::NoOwnCapital)
    } else {
        let returned = developer_profit
            .checked_add(own_principal)
            .ok_or_else(|| overflow("developer return"))?;
        let multipliers = (
            EquityMultiplier::ratio(returned, own_principal),
            EquityMultiplier::ratio(Decimal::ONE, own_equity_fraction),
        );
        if multipliers.0 == EquityMultiplier::Unbounded {
            warnings.push(format!(
                "Own equity fraction {own_equity_fraction} is too small for a representable equity multiplier"
            ));
        }
        multipliers
    };

    // --- Reasonableness warnings ---
    if developer_profit < Decimal::ZERO {
        warnings.push(format!(
            "Developer profit is negative ({developer_profit}): financing cost exceeds revenue"
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; capital stack relies heavily on expensive financing"
        ));
    }

    log::debug!(
        "scenario {}: own equity {}, WACC {}, financing cost {}, developer profit {}",
        applicable.phase,
        own_equity_fraction,
        wacc,
        total_financing_cost,
        developer_profit
    );

    let output = ScenarioResult {
        phase: applicable.phase,
        own_equity_fraction,
        wacc,
        default_wacc,
        methods,
        developer,
        total_financing_cost,
        developer_profit,
        equity_multiplier,
        leverage_multiplier,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Development financing scenario (single-period cost of capital)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_amounts(input: &ScenarioInput) -> DevFinResult<()> {
    if input.total_investment <= Decimal::ZERO {
        return Err(DevFinError::InvalidInput {
            field: "total_investment".into(),
            reason: "Total investment must be positive".into(),
        });
    }
    if input.total_revenue < Decimal::ZERO {
        return Err(DevFinError::InvalidInput {
            field: "total_revenue".into(),
            reason: "Total revenue cannot be negative".into(),
        });
    }
    Ok(())
}

/// Selections above 100% in total are rejected outright, before clamping.
fn check_allocation(input: &ScenarioInput) -> DevFinResult<()> {
    let total: Rate = input
        .selections
        .values()
        .filter(|v| **v > Decimal::ZERO)
        .copied()
        .sum();
    if total > Decimal::ONE {
        return Err(DevFinError::OverAllocation { total });
    }
    Ok(())
}

/// Settle leverage and effective rate for every selected, offered method,
/// in applicability-table order. Methods left at zero leverage are dropped.
fn resolve_methods(
    applicable: &ApplicableMethods,
    catalog: &FinancingCatalog,
    input: &ScenarioInput,
    warnings: &mut Vec<String>,
) -> DevFinResult<Vec<ResolvedMethod>> {
    for method in input.selections.keys() {
        if !applicable.is_offered(*method) {
            return Err(DevFinError::MethodNotOffered {
                method: method.to_string(),
                phase: applicable.phase.to_string(),
            });
        }
    }

    let mut resolved = Vec::new();
    for limit in applicable.offered() {
        let Some(&requested) = input.selections.get(&limit.method) else {
            continue;
        };
        let leverage = bounded(
            &format!("leverage:{}", limit.method),
            requested,
            CostRange::new(Decimal::ZERO, limit.max_leverage),
            input.bound_policy,
            warnings,
        )?;
        if leverage.is_zero() {
            continue;
        }

        let range = catalog
            .cost_range(limit.method)
            .ok_or_else(|| DevFinError::InvalidInput {
                field: format!("catalog:{}", limit.method),
                reason: "No cost-of-capital range for selected financing method".into(),
            })?;
        let default_rate = range.midpoint();
        let rate = match input.rate_overrides.get(&limit.method) {
            Some(&r) => bounded(
                &format!("interest_rate:{}", limit.method),
                r,
                range,
                input.bound_policy,
                warnings,
            )?,
            None => default_rate,
        };

        resolved.push(ResolvedMethod {
            method: limit.method,
            leverage,
            rate,
            default_rate,
        });
    }

    for method in input.rate_overrides.keys() {
        if !resolved.iter().any(|r| r.method == *method) {
            warnings.push(format!(
                "Interest rate override for {method} ignored: method has no leverage selected"
            ));
        }
    }

    Ok(resolved)
}

/// Apply the bound policy to a value that must lie within `range` (inclusive).
/// Leverage is checked against the band [0, max leverage].
fn bounded(
    field: &str,
    value: Decimal,
    range: CostRange,
    policy: BoundPolicy,
    warnings: &mut Vec<String>,
) -> DevFinResult<Decimal> {
    if range.contains(value) {
        return Ok(value);
    }
    let CostRange { min, max } = range;
    match policy {
        BoundPolicy::Reject => Err(DevFinError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        }),
        BoundPolicy::Clamp => {
            let clamped = range.clamp(value);
            warnings.push(format!(
                "{field} = {value} clamped to {clamped} (permitted range [{min}, {max}])"
            ));
            Ok(clamped)
        }
    }
}

fn overflow(context: &str) -> DevFinError {
    DevFinError::ArithmeticOverflow {
        context: context.to_string(),
    }
}

fn checked_mul(a: Decimal, b: Decimal, context: &str) -> DevFinResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

fn method_breakdown(
    resolved: &ResolvedMethod,
    input: &ScenarioInput,
) -> DevFinResult<MethodBreakdown> {
    let context = |what: &str| format!("{what} for {}", resolved.method);
    let principal = checked_mul(resolved.leverage, input.total_investment, &context("principal"))?;
    let interest_payment = checked_mul(principal, resolved.rate, &context("interest"))?;
    let total_cost = principal
        .checked_add(interest_payment)
        .ok_or_else(|| overflow(&context("total cost")))?;
    let revenue_share = checked_mul(resolved.leverage, input.total_revenue, &context("revenue share"))?;
    Ok(MethodBreakdown {
        method: resolved.method,
        leverage: resolved.leverage,
        interest_rate: resolved.rate,
        default_rate: resolved.default_rate,
        principal,
        interest_payment,
        total_cost,
        revenue_share,
        profit: revenue_share - total_cost,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financing::applicability::{get_applicable_methods, DevelopmentType};
    use crate::financing::catalog::CatalogEntry;
    use rust_decimal_macros::dec;

    fn construction_bts() -> ApplicableMethods {
        get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::BuildToSell)
    }

    fn sample_input(selections: &[(FinancingMethod, Decimal)]) -> ScenarioInput {
        ScenarioInput {
            total_investment: dec!(500000),
            total_revenue: dec!(1000000),
            selections: selections.iter().copied().collect(),
            rate_overrides: BTreeMap::new(),
            bound_policy: BoundPolicy::Reject,
        }
    }

    fn evaluate(input: &ScenarioInput) -> ComputationOutput<ScenarioResult> {
        evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), input).unwrap()
    }

    #[test]
    fn test_bank_loan_half_leverage() {
        let out = evaluate(&sample_input(&[(FinancingMethod::BankLoan, dec!(0.5))]));
        let r = &out.result;

        assert_eq!(r.own_equity_fraction, dec!(0.5));
        assert_eq!(r.wacc, dec!(0.0225));
        assert_eq!(r.methods.len(), 1);

        let bank = &r.methods[0];
        assert_eq!(bank.principal, dec!(250000));
        assert_eq!(bank.interest_rate, dec!(0.045));
        assert_eq!(bank.interest_payment, dec!(11250));
        assert_eq!(bank.total_cost, dec!(261250));
        assert_eq!(bank.revenue_share, dec!(500000));
        assert_eq!(bank.profit, dec!(238750));

        assert_eq!(r.developer.investment, dec!(250000));
        assert_eq!(r.developer.profit, dec!(250000));
        assert_eq!(r.total_financing_cost, dec!(511250));
        assert_eq!(r.developer_profit, dec!(488750));
        assert_eq!(r.equity_multiplier, EquityMultiplier::Finite(dec!(2.955)));
        assert_eq!(r.leverage_multiplier, EquityMultiplier::Finite(dec!(2)));
    }

    #[test]
    fn test_no_selection_is_all_own_capital() {
        let out = evaluate(&sample_input(&[]));
        let r = &out.result;
        assert_eq!(r.own_equity_fraction, Decimal::ONE);
        assert_eq!(r.wacc, Decimal::ZERO);
        assert!(r.methods.is_empty());
        assert_eq!(r.total_financing_cost, dec!(500000));
        assert_eq!(r.developer_profit, dec!(500000));
        assert_eq!(r.equity_multiplier, EquityMultiplier::Finite(dec!(2)));
    }

    #[test]
    fn test_rate_override_changes_cost_and_wacc() {
        let mut input = sample_input(&[(FinancingMethod::BankLoan, dec!(0.5))]);
        input
            .rate_overrides
            .insert(FinancingMethod::BankLoan, dec!(0.06));
        let r = evaluate(&input).result;

        assert_eq!(r.methods[0].interest_rate, dec!(0.06));
        assert_eq!(r.methods[0].default_rate, dec!(0.045));
        assert_eq!(r.methods[0].total_cost, dec!(265000));
        assert_eq!(r.wacc, dec!(0.03));
        assert_eq!(r.default_wacc, dec!(0.0225));
        assert_eq!(r.developer_profit, dec!(485000));
    }

    #[test]
    fn test_override_outside_cost_range_rejected() {
        let mut input = sample_input(&[(FinancingMethod::BankLoan, dec!(0.5))]);
        input
            .rate_overrides
            .insert(FinancingMethod::BankLoan, dec!(0.07));
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        match result.unwrap_err() {
            DevFinError::OutOfRange { field, max, .. } => {
                assert!(field.contains("interest_rate"));
                assert_eq!(max, dec!(0.06));
            }
            e => panic!("Expected OutOfRange, got {e:?}"),
        }
    }

    #[test]
    fn test_override_clamped_under_clamp_policy() {
        let mut input = sample_input(&[(FinancingMethod::BankLoan, dec!(0.5))]);
        input.bound_policy = BoundPolicy::Clamp;
        input
            .rate_overrides
            .insert(FinancingMethod::BankLoan, dec!(0.01));
        let out = evaluate(&input);
        assert_eq!(out.result.methods[0].interest_rate, dec!(0.03));
        assert!(out.warnings.iter().any(|w| w.contains("clamped")));
    }

    #[test]
    fn test_leverage_above_cap_rejected() {
        let input = sample_input(&[(FinancingMethod::MezzanineDebt, dec!(0.35))]);
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        match result.unwrap_err() {
            DevFinError::OutOfRange { field, max, .. } => {
                assert_eq!(field, "leverage:Mezzanine Debt");
                assert_eq!(max, dec!(0.3));
            }
            e => panic!("Expected OutOfRange, got {e:?}"),
        }
    }

    #[test]
    fn test_leverage_clamped_to_cap() {
        let mut input = sample_input(&[(FinancingMethod::MezzanineDebt, dec!(0.35))]);
        input.bound_policy = BoundPolicy::Clamp;
        let out = evaluate(&input);
        assert_eq!(out.result.methods[0].leverage, dec!(0.3));
        assert_eq!(out.result.own_equity_fraction, dec!(0.7));
    }

    #[test]
    fn test_negative_leverage_clamped_to_zero_drops_method() {
        let mut input = sample_input(&[
            (FinancingMethod::BankLoan, dec!(-0.1)),
            (FinancingMethod::SeniorDebt, dec!(0.2)),
        ]);
        input.bound_policy = BoundPolicy::Clamp;
        let r = evaluate(&input).result;
        assert_eq!(r.methods.len(), 1);
        assert_eq!(r.methods[0].method, FinancingMethod::SeniorDebt);
    }

    #[test]
    fn test_over_allocation() {
        let input = sample_input(&[
            (FinancingMethod::BankLoan, dec!(0.5)),
            (FinancingMethod::SeniorDebt, dec!(0.6)),
        ]);
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        match result.unwrap_err() {
            DevFinError::OverAllocation { total } => assert_eq!(total, dec!(1.1)),
            e => panic!("Expected OverAllocation, got {e:?}"),
        }
    }

    #[test]
    fn test_full_external_financing_has_no_multiplier() {
        let input = sample_input(&[
            (FinancingMethod::BankLoan, dec!(0.4)),
            (FinancingMethod::SeniorDebt, dec!(0.6)),
        ]);
        let out = evaluate(&input);
        let r = &out.result;
        assert_eq!(r.own_equity_fraction, Decimal::ZERO);
        assert_eq!(r.equity_multiplier, EquityMultiplier::NoOwnCapital);
        assert_eq!(r.leverage_multiplier, EquityMultiplier::NoOwnCapital);
        assert!(!r.equity_multiplier.is_defined());
        assert!(out.warnings.iter().any(|w| w.contains("No own capital")));
    }

    #[test]
    fn test_excluded_method_not_offered() {
        let input = sample_input(&[(FinancingMethod::PrivateEquity, dec!(0.2))]);
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        match result.unwrap_err() {
            DevFinError::MethodNotOffered { method, phase } => {
                assert_eq!(method, "Private Equity");
                assert_eq!(phase, "Construction");
            }
            e => panic!("Expected MethodNotOffered, got {e:?}"),
        }
    }

    #[test]
    fn test_own_capital_not_selectable() {
        let input = sample_input(&[(FinancingMethod::DevelopersOwnCapital, dec!(0.5))]);
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        assert!(matches!(
            result,
            Err(DevFinError::MethodNotOffered { .. })
        ));
    }

    #[test]
    fn test_override_without_leverage_ignored() {
        let mut input = sample_input(&[(FinancingMethod::BankLoan, dec!(0.5))]);
        input
            .rate_overrides
            .insert(FinancingMethod::SeniorDebt, dec!(0.18));
        let out = evaluate(&input);
        assert_eq!(out.result.methods.len(), 1);
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("Senior Debt ignored")));
    }

    #[test]
    fn test_non_positive_investment_rejected() {
        let mut input = sample_input(&[]);
        input.total_investment = Decimal::ZERO;
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        match result.unwrap_err() {
            DevFinError::InvalidInput { field, .. } => assert_eq!(field, "total_investment"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_negative_revenue_rejected() {
        let mut input = sample_input(&[]);
        input.total_revenue = dec!(-1);
        assert!(
            evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input).is_err()
        );
    }

    #[test]
    fn test_selected_method_missing_from_catalog() {
        let catalog = FinancingCatalog::new(vec![]).unwrap();
        let input = sample_input(&[(FinancingMethod::BankLoan, dec!(0.5))]);
        let result = evaluate_scenario(&construction_bts(), &catalog, &input);
        match result.unwrap_err() {
            DevFinError::InvalidInput { field, .. } => assert_eq!(field, "catalog:Bank Loan"),
            e => panic!("Expected InvalidInput, got {e:?}"),
        }
    }

    #[test]
    fn test_loss_making_scenario_warns() {
        let mut input = sample_input(&[(FinancingMethod::SeniorDebt, dec!(0.6))]);
        input.total_revenue = dec!(400000);
        let out = evaluate(&input);
        assert!(out.result.developer_profit < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
    }

    #[test]
    fn test_multiplier_serialization() {
        let finite = serde_json::to_value(EquityMultiplier::Finite(dec!(2.955))).unwrap();
        assert_eq!(finite["status"], "finite");
        assert_eq!(finite["value"], "2.955");
        let undefined = serde_json::to_value(EquityMultiplier::NoOwnCapital).unwrap();
        assert_eq!(undefined["status"], "no_own_capital");
    }

    #[test]
    fn test_vanishing_own_equity_is_unbounded() {
        // own = 1e-28, own principal = 1e-21; the return multiple exceeds Decimal::MAX.
        let applicable =
            get_applicable_methods(DevelopmentPhase::Construction, DevelopmentType::BuildToRent);
        let input = ScenarioInput {
            total_investment: dec!(10000000),
            total_revenue: dec!(1000000000),
            ..sample_input(&[
                (FinancingMethod::BankLoan, dec!(0.5)),
                (FinancingMethod::SeniorDebt, dec!(0.4999999999999999999999999999)),
            ])
        };
        let out = evaluate_scenario(&applicable, FinancingCatalog::standard(), &input).unwrap();
        let r = &out.result;
        assert_eq!(r.own_equity_fraction, dec!(0.0000000000000000000000000001));
        assert_eq!(r.equity_multiplier, EquityMultiplier::Unbounded);
        assert!(!r.equity_multiplier.is_defined());
        assert_eq!(
            r.leverage_multiplier,
            EquityMultiplier::Finite(dec!(10000000000000000000000000000))
        );
        assert!(out.warnings.iter().any(|w| w.contains("too small")));

        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json["equity_multiplier"]["status"], "unbounded");
    }

    #[test]
    fn test_investment_near_decimal_max_overflows() {
        let input = ScenarioInput {
            total_investment: dec!(70000000000000000000000000000),
            total_revenue: Decimal::ZERO,
            ..sample_input(&[
                (FinancingMethod::SeniorDebt, dec!(0.6)),
                (FinancingMethod::MezzanineDebt, dec!(0.3)),
            ])
        };
        let result = evaluate_scenario(&construction_bts(), FinancingCatalog::standard(), &input);
        match result.unwrap_err() {
            DevFinError::ArithmeticOverflow { context } => {
                assert_eq!(context, "total financing cost")
            }
            e => panic!("Expected ArithmeticOverflow, got {e:?}"),
        }
    }

    #[test]
    fn test_method_cost_overflow_names_method() {
        // 0.6 * MAX fits as principal; adding 95% interest does not.
        let catalog = FinancingCatalog::new(vec![CatalogEntry {
            method: FinancingMethod::SeniorDebt,
            cost_range: CostRange::new(dec!(0.9), dec!(1)),
        }])
        .unwrap();
        let input = ScenarioInput {
            total_investment: Decimal::MAX,
            ..sample_input(&[(FinancingMethod::SeniorDebt, dec!(0.6))])
        };
        let result = evaluate_scenario(&construction_bts(), &catalog, &input);
        match result.unwrap_err() {
            DevFinError::ArithmeticOverflow { context } => {
                assert_eq!(context, "total cost for Senior Debt")
            }
            e => panic!("Expected ArithmeticOverflow, got {e:?}"),
        }
    }
}
