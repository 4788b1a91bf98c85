//! Variable and fixed cost aggregation.

use hpp_core::{CostBasis, FixedCostItem, VariableCostItem};
use rust_decimal::Decimal;

/// Per-product cost of one variable cost line. Never negative.
pub fn variable_item_cost(item: &VariableCostItem) -> Decimal {
    let cost = match &item.basis {
        CostBasis::Direct { cost } => *cost,
        CostBasis::Derived(usage) => usage.cost_per_use(),
    };
    cost.max(Decimal::ZERO)
}

/// Variable cost per unit: the sum of all lines.
pub fn sum_variable_costs(items: &[VariableCostItem]) -> Decimal {
    items
        .iter()
        .map(variable_item_cost)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Total fixed cost per month.
pub fn sum_fixed_costs(items: &[FixedCostItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.total_cost)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Share of a monthly cost carried by one unit at the given sales target.
/// Zero when the target is not positive.
pub fn suggested_allocation(total_cost: Decimal, target_sales: Decimal) -> Decimal {
    if target_sales <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    total_cost.checked_div(target_sales).unwrap_or(Decimal::ZERO)
}

/// Allocation used for one line: the manual override when present,
/// otherwise the suggested share.
pub fn effective_allocation(item: &FixedCostItem, target_sales: Decimal) -> Decimal {
    item.allocation_per_unit
        .unwrap_or_else(|| suggested_allocation(item.total_cost, target_sales))
}

/// Fixed cost per unit, mixing manual and derived allocations line by line.
pub fn allocated_fixed_cost_per_unit(items: &[FixedCostItem], target_sales: Decimal) -> Decimal {
    items
        .iter()
        .map(|item| effective_allocation(item, target_sales))
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpp_core::UsageBasis;

    fn flour() -> VariableCostItem {
        VariableCostItem::derived(
            "Tepung",
            UsageBasis {
                usage_amount: Decimal::from(250),
                usage_unit: "g".into(),
                purchase_price: Decimal::from(50_000),
                purchase_quantity: Decimal::ONE,
                purchase_unit: "kg".into(),
            },
        )
    }

    #[test]
    fn mixes_direct_and_derived_lines() {
        let items = vec![
            VariableCostItem::direct("Cup", Decimal::from(700)),
            flour(),
            VariableCostItem::direct("Kosong", Decimal::ZERO),
        ];
        assert_eq!(sum_variable_costs(&items), Decimal::from(13_200));
    }

    #[test]
    fn negative_direct_cost_counts_as_zero() {
        let items = vec![
            VariableCostItem::direct("Diskon", Decimal::from(-500)),
            VariableCostItem::direct("Cup", Decimal::from(700)),
        ];
        assert_eq!(sum_variable_costs(&items), Decimal::from(700));
    }

    #[test]
    fn incompatible_derived_line_adds_nothing() {
        let mut item = flour();
        if let CostBasis::Derived(usage) = &mut item.basis {
            usage.purchase_unit = "pcs".into();
        }
        assert_eq!(variable_item_cost(&item), Decimal::ZERO);
    }

    #[test]
    fn sums_fixed_costs() {
        let items = vec![
            FixedCostItem::monthly("Sewa", Decimal::from(2_000_000)),
            FixedCostItem::monthly("Gaji", Decimal::from(1_000_000)),
        ];
        assert_eq!(sum_fixed_costs(&items), Decimal::from(3_000_000));
        assert_eq!(sum_fixed_costs(&[]), Decimal::ZERO);
    }

    #[test]
    fn allocation_follows_target_sales() {
        let items = vec![
            FixedCostItem::monthly("Sewa", Decimal::from(2_000_000)),
            FixedCostItem::monthly("Gaji", Decimal::from(1_000_000)),
        ];
        assert_eq!(
            allocated_fixed_cost_per_unit(&items, Decimal::from(1000)),
            Decimal::from(3000)
        );
        assert_eq!(allocated_fixed_cost_per_unit(&items, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            allocated_fixed_cost_per_unit(&items, Decimal::from(-10)),
            Decimal::ZERO
        );
    }

    #[test]
    fn manual_allocation_shadows_one_line() {
        let items = vec![
            FixedCostItem::monthly("Sewa", Decimal::from(2_000_000)).with_allocation(Decimal::from(500)),
            FixedCostItem::monthly("Gaji", Decimal::from(1_000_000)),
        ];
        assert_eq!(
            allocated_fixed_cost_per_unit(&items, Decimal::from(1000)),
            Decimal::from(1500)
        );
        // override still applies without a sales target
        assert_eq!(
            allocated_fixed_cost_per_unit(&items, Decimal::ZERO),
            Decimal::from(500)
        );
    }
}
