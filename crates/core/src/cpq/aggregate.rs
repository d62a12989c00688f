//! Line item aggregation. The only place a line total is computed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::non_negative;
use crate::domain::quote::Item;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemsSummary {
    pub count: usize,
    pub total_quantity: Decimal,
    pub subtotal: Decimal,
    pub average_line_total: Decimal,
    pub has_items: bool,
}

/// Negative quantities and prices count as zero. Products past the `Decimal`
/// range saturate at [`Decimal::MAX`].
pub fn line_total(item: &Item) -> Decimal {
    non_negative(item.quantity).saturating_mul(non_negative(item.unit_price))
}

pub fn subtotal(items: &[Item]) -> Decimal {
    saturating_sum(items.iter().map(line_total))
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn summarize(items: &[Item]) -> LineItemsSummary {
    let subtotal = subtotal(items);
    let count = items.len();
    let average_line_total =
        if count == 0 { Decimal::ZERO } else { subtotal / Decimal::from(count) };

    LineItemsSummary {
        count,
        total_quantity: saturating_sum(items.iter().map(|item| non_negative(item.quantity))),
        subtotal,
        average_line_total,
        has_items: count > 0,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{line_total, subtotal, summarize};
    use crate::domain::quote::Item;

    fn item(quantity: Decimal, unit_price: Decimal) -> Item {
        Item { quantity, unit_price, ..Item::default() }
    }

    #[test]
    fn line_total_clamps_negative_inputs_to_zero() {
        assert_eq!(line_total(&item(Decimal::from(2), Decimal::new(1050, 2))), Decimal::from(21));
        assert_eq!(line_total(&item(Decimal::from(-2), Decimal::from(10))), Decimal::ZERO);
        assert_eq!(line_total(&item(Decimal::from(3), Decimal::from(-1))), Decimal::ZERO);
    }

    #[test]
    fn oversized_amounts_saturate_instead_of_overflowing() {
        let huge = Decimal::from_str_exact("100000000000000000000").expect("valid decimal");
        let row = item(huge, huge);
        assert_eq!(line_total(&row), Decimal::MAX);

        let items = vec![row.clone(), row, item(Decimal::ONE, Decimal::ONE)];
        let summary = summarize(&items);
        assert_eq!(summary.subtotal, Decimal::MAX);
        assert_eq!(summary.total_quantity, huge * Decimal::from(2) + Decimal::ONE);
        assert!(summary.average_line_total > Decimal::ZERO);
    }

    #[test]
    fn dimensions_never_affect_money() {
        let mut measured = item(Decimal::from(2), Decimal::from(5));
        measured.height = Decimal::new(25, 1);
        measured.width = Decimal::from(4);
        assert_eq!(line_total(&measured), Decimal::from(10));
    }

    #[test]
    fn summary_over_mixed_rows() {
        let items = vec![
            item(Decimal::from(2), Decimal::new(1000, 2)),
            item(Decimal::ONE, Decimal::new(550, 2)),
            item(Decimal::ZERO, Decimal::from(99)),
        ];

        let summary = summarize(&items);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.subtotal, Decimal::new(2550, 2));
        assert_eq!(summary.total_quantity, Decimal::from(3));
        assert_eq!(summary.average_line_total, Decimal::new(85, 1));
        assert!(summary.has_items);
    }

    #[test]
    fn empty_list_sums_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.subtotal, Decimal::ZERO);
        assert_eq!(summary.average_line_total, Decimal::ZERO);
        assert!(!summary.has_items);
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }
}
