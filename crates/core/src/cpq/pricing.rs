use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::aggregate;
use crate::domain::quote::{FinancialSummary, Item};

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub summary: FinancialSummary,
    pub steps: Vec<PricingTraceStep>,
}

/// Rebuilds every derived figure from the items and the two user inputs.
/// Pure: the same inputs always produce the same summary. Neither the
/// discount percent nor the surcharge is range-checked, so a discount above
/// 100% yields a negative total.
pub fn recompute(items: &[Item], discount_percent: Decimal, surcharge: Decimal) -> FinancialSummary {
    apply_adjustments(aggregate::subtotal(items), discount_percent, surcharge)
}

/// The discount applies to the subtotal before the surcharge is added.
/// Results past the `Decimal` range saturate at its bounds.
pub fn apply_adjustments(
    subtotal: Decimal,
    discount_percent: Decimal,
    surcharge: Decimal,
) -> FinancialSummary {
    let discount_value = subtotal.saturating_mul(discount_percent / ONE_HUNDRED);
    FinancialSummary {
        subtotal,
        discount_percent,
        discount_value,
        surcharge,
        total: subtotal.saturating_sub(discount_value).saturating_add(surcharge),
    }
}

pub fn recompute_with_trace(
    items: &[Item],
    discount_percent: Decimal,
    surcharge: Decimal,
) -> PricingResult {
    let summary = recompute(items, discount_percent, surcharge);

    let steps = vec![
        PricingTraceStep {
            stage: "subtotal".to_string(),
            detail: "sum(max(quantity, 0) * max(unit_price, 0))".to_string(),
            amount: summary.subtotal,
        },
        PricingTraceStep {
            stage: "discount".to_string(),
            detail: format!("subtotal * {discount_percent} / 100"),
            amount: summary.discount_value,
        },
        PricingTraceStep {
            stage: "surcharge".to_string(),
            detail: "added after discount".to_string(),
            amount: summary.surcharge,
        },
        PricingTraceStep {
            stage: "total".to_string(),
            detail: "subtotal - discount + surcharge".to_string(),
            amount: summary.total,
        },
    ];

    PricingResult { summary, steps }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{apply_adjustments, recompute, recompute_with_trace};
    use crate::domain::quote::Item;
    use crate::format::{format_currency, parse_currency};

    fn items() -> Vec<Item> {
        vec![
            Item { quantity: Decimal::from(2), unit_price: Decimal::new(1000, 2), ..Item::default() },
            Item { quantity: Decimal::ONE, unit_price: Decimal::new(550, 2), ..Item::default() },
            Item { quantity: Decimal::ZERO, unit_price: Decimal::from(99), ..Item::default() },
        ]
    }

    #[test]
    fn worked_example_totals() {
        let summary = recompute(&items(), Decimal::from(10), Decimal::new(445, 2));

        assert_eq!(summary.subtotal, Decimal::new(2550, 2));
        assert_eq!(summary.discount_value, Decimal::new(255, 2));
        assert_eq!(summary.total, Decimal::new(2740, 2));
        assert_eq!(format_currency(summary.total), "R$ 27,40");
    }

    #[test]
    fn recompute_is_idempotent() {
        let first = recompute(&items(), Decimal::new(125, 1), Decimal::from(3));
        let second = recompute(&items(), Decimal::new(125, 1), Decimal::from(3));
        assert_eq!(first, second);
    }

    #[test]
    fn total_identity_holds_for_odd_inputs() {
        for (percent, surcharge) in [
            (Decimal::ZERO, Decimal::ZERO),
            (Decimal::new(333, 1), Decimal::new(1, 2)),
            (Decimal::from(150), Decimal::ZERO),
            (Decimal::from(-5), Decimal::from(-2)),
        ] {
            let summary = recompute(&items(), percent, surcharge);
            assert_eq!(summary.discount_value, summary.subtotal * percent / Decimal::ONE_HUNDRED);
            assert_eq!(summary.total, summary.subtotal - summary.discount_value + summary.surcharge);
        }
    }

    #[test]
    fn discount_above_one_hundred_percent_goes_negative() {
        let summary = apply_adjustments(Decimal::from(100), Decimal::from(150), Decimal::ZERO);
        assert_eq!(summary.total, Decimal::from(-50));
        assert_eq!(format_currency(summary.total), "-R$ 50,00");
    }

    #[test]
    fn extreme_adjustments_saturate_instead_of_overflowing() {
        let summary = apply_adjustments(Decimal::MAX, Decimal::from(-200), Decimal::MAX);
        assert_eq!(summary.discount_value, Decimal::MIN);
        assert_eq!(summary.total, Decimal::MAX);

        let oversized = Item {
            quantity: Decimal::MAX,
            unit_price: Decimal::MAX,
            ..Item::default()
        };
        let summary = recompute(&[oversized], Decimal::from(10), Decimal::ZERO);
        assert_eq!(summary.subtotal, Decimal::MAX);
        assert!(summary.total < Decimal::MAX);
        assert!(summary.total > Decimal::MAX / Decimal::from(2));
    }

    #[test]
    fn displayed_total_round_trips_through_parser() {
        let summary = recompute(&items(), Decimal::new(75, 1), Decimal::new(199, 2));
        let shown = format_currency(summary.total);
        let parsed = parse_currency(&shown);
        assert!((parsed - summary.total).abs() <= Decimal::new(5, 3));
    }

    #[test]
    fn trace_ends_with_total() {
        let result = recompute_with_trace(&items(), Decimal::from(10), Decimal::new(445, 2));
        let last = result.steps.last().expect("trace has steps");
        assert_eq!(last.stage, "total");
        assert_eq!(last.amount, result.summary.total);
    }
}
