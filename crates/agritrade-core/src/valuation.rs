use std::fmt;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::period::MonthSlot;
use crate::types::{DateRange, Money, Quantity};
use crate::EngineResult;

/// Averaging window over which inflow records price the stock on hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowPolicy {
    /// Weighted average over inflow records dated within the target
    /// calendar month.
    #[serde(rename = "month")]
    Month,
    /// Weighted average over the 7 days up to the reference date,
    /// independent of calendar-month boundaries.
    #[serde(rename = "trailing-7")]
    Trailing7,
    /// Weighted average over the 30 days up to the reference date.
    #[serde(rename = "trailing-30")]
    Trailing30,
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowPolicy::Month => "month",
            WindowPolicy::Trailing7 => "trailing-7",
            WindowPolicy::Trailing30 => "trailing-30",
        };
        f.write_str(name)
    }
}

/// Which record kind sources inventory additions. Either/or, never
/// merged: a processing step consumes raw material and yields a
/// differently-costed finished item, so mixing the two bases would
/// double-count stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflowBasis {
    FinishedGoods,
    Purchases,
}

/// Moving unit cost and quantity of on-hand inventory for one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub window_policy: WindowPolicy,
    pub inflow_basis: InflowBasis,
    pub unit_cost: Money,
    pub inventory_quantity: Quantity,
    /// `round(unit_cost * inventory_quantity)` to whole currency units.
    pub inventory_value: Money,
}

/// Price the inventory on hand at the end of `period`.
///
/// The window policy selects which inflow records feed the weighted
/// average; the inflow basis is detected from the window contents: any
/// finished-goods entry switches the whole valuation to finished-goods
/// data, otherwise purchases are used. Opening stock and period inflows
/// follow the same basis.
pub fn value_inventory(
    ledger: &impl Ledger,
    slot: MonthSlot,
    period: &DateRange,
    policy: WindowPolicy,
    reference: NaiveDate,
    warnings: &mut Vec<String>,
) -> EngineResult<ValuationSnapshot> {
    let window = valuation_window(slot, policy, reference)?;

    let window_finished = ledger.finished_goods(Some(&window))?;
    let basis = if window_finished.is_empty() {
        InflowBasis::Purchases
    } else {
        InflowBasis::FinishedGoods
    };

    let window_pairs: Vec<(Money, Quantity)> = match basis {
        InflowBasis::FinishedGoods => window_finished
            .iter()
            .map(|e| (e.unit_cost, e.quantity))
            .collect(),
        InflowBasis::Purchases => ledger
            .purchases(Some(&window))?
            .iter()
            .map(|p| (p.unit_price, p.net_quantity()))
            .collect(),
    };
    let (unit_cost, window_quantity) = weighted_average(&window_pairs);
    if window_quantity.is_zero() {
        warnings.push(format!(
            "No inflow quantity in the {policy} valuation window; unit cost set to 0."
        ));
    }

    // Inflow quantities over the period and over all history before it,
    // from the chosen basis only.
    let (period_inflow, inflow_before) = match basis {
        InflowBasis::FinishedGoods => {
            let all = ledger.finished_goods(None)?;
            split_quantities(all.iter().map(|e| (e.date, e.quantity)), period)
        }
        InflowBasis::Purchases => {
            let all = ledger.purchases(None)?;
            split_quantities(all.iter().map(|p| (p.date, p.net_quantity())), period)
        }
    };

    let all_sales = ledger.sales(None)?;
    let (period_outflow, outflow_before) =
        split_quantities(all_sales.iter().map(|s| (s.date, s.quantity)), period);

    let opening_stock = (inflow_before - outflow_before).max(Decimal::ZERO);
    let inventory_quantity = (opening_stock + period_inflow - period_outflow).max(Decimal::ZERO);
    let inventory_value = (unit_cost * inventory_quantity).round();

    Ok(ValuationSnapshot {
        window_policy: policy,
        inflow_basis: basis,
        unit_cost,
        inventory_quantity,
        inventory_value,
    })
}

/// `sum(cost_i * qty_i) / sum(qty_i)`, with the quantity total returned
/// alongside. A zero denominator yields a zero unit cost.
fn weighted_average(pairs: &[(Money, Quantity)]) -> (Money, Quantity) {
    let total_quantity: Quantity = pairs.iter().map(|(_, q)| *q).sum();
    if total_quantity.is_zero() {
        return (Decimal::ZERO, total_quantity);
    }
    let weighted: Money = pairs.iter().map(|(cost, qty)| *cost * *qty).sum();
    (weighted / total_quantity, total_quantity)
}

/// Quantity totals inside the period and strictly before its start.
fn split_quantities(
    records: impl Iterator<Item = (NaiveDate, Quantity)>,
    period: &DateRange,
) -> (Quantity, Quantity) {
    let mut inside = Decimal::ZERO;
    let mut before = Decimal::ZERO;
    for (date, quantity) in records {
        if period.contains(date) {
            inside += quantity;
        } else if date < period.start {
            before += quantity;
        }
    }
    (inside, before)
}

fn valuation_window(
    slot: MonthSlot,
    policy: WindowPolicy,
    reference: NaiveDate,
) -> EngineResult<DateRange> {
    match policy {
        WindowPolicy::Month => slot.range(),
        WindowPolicy::Trailing7 => Ok(trailing(reference, 7)),
        WindowPolicy::Trailing30 => Ok(trailing(reference, 30)),
    }
}

fn trailing(reference: NaiveDate, days: i64) -> DateRange {
    DateRange::new(reference - Duration::days(days), reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::types::{FinishedGoodsEntry, PaymentStatus, Purchase, Sale};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn april() -> MonthSlot {
        MonthSlot { month: 4, year: 2025 }
    }

    fn april_range() -> DateRange {
        DateRange::new(date(2025, 4, 1), date(2025, 4, 30))
    }

    fn purchase(day: u32, gross: Decimal, price: Decimal) -> Purchase {
        Purchase {
            date: date(2025, 4, day),
            supplier: "Valley Farms".to_string(),
            gross_quantity: gross,
            moisture_pct: None,
            unit_price: price,
            payment_status: PaymentStatus::Paid,
        }
    }

    fn finished(day: u32, quantity: Decimal, cost: Decimal) -> FinishedGoodsEntry {
        FinishedGoodsEntry {
            date: date(2025, 4, day),
            quantity,
            unit_cost: cost,
        }
    }

    #[test]
    fn test_weighted_average_weights_by_quantity() {
        let pairs = vec![(dec!(10), dec!(30)), (dec!(20), dec!(10))];
        let (cost, quantity) = weighted_average(&pairs);
        // (10*30 + 20*10) / 40 = 500 / 40 = 12.5
        assert_eq!(cost, dec!(12.5));
        assert_eq!(quantity, dec!(40));
    }

    #[test]
    fn test_weighted_average_zero_denominator_yields_zero() {
        let (cost, quantity) = weighted_average(&[]);
        assert_eq!(cost, Decimal::ZERO);
        assert_eq!(quantity, Decimal::ZERO);
    }

    #[test]
    fn test_empty_window_prices_at_zero_without_error() {
        let ledger = MemoryLedger::new();
        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Month,
            date(2025, 4, 30),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(snapshot.unit_cost, Decimal::ZERO);
        assert_eq!(snapshot.inventory_value, Decimal::ZERO);
        assert_eq!(snapshot.inflow_basis, InflowBasis::Purchases);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_purchases_price_inventory_when_no_finished_goods_exist() {
        let mut ledger = MemoryLedger::new();
        ledger.push_purchase(purchase(5, dec!(30), dec!(10)));
        ledger.push_purchase(purchase(20, dec!(10), dec!(20)));

        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Month,
            date(2025, 4, 30),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(snapshot.inflow_basis, InflowBasis::Purchases);
        assert_eq!(snapshot.unit_cost, dec!(12.5));
        assert_eq!(snapshot.inventory_quantity, dec!(40));
        assert_eq!(snapshot.inventory_value, dec!(500));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_any_finished_goods_entry_switches_the_basis_entirely() {
        let mut ledger = MemoryLedger::new();
        ledger.push_purchase(purchase(5, dec!(100), dec!(10)));
        ledger.push_finished_goods(finished(12, dec!(25), dec!(16)));

        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Month,
            date(2025, 4, 30),
            &mut warnings,
        )
        .unwrap();
        // Purchases are ignored for both cost and quantity.
        assert_eq!(snapshot.inflow_basis, InflowBasis::FinishedGoods);
        assert_eq!(snapshot.unit_cost, dec!(16));
        assert_eq!(snapshot.inventory_quantity, dec!(25));
        assert_eq!(snapshot.inventory_value, dec!(400));
    }

    #[test]
    fn test_trailing_window_crosses_month_boundaries() {
        let mut ledger = MemoryLedger::new();
        // Late March purchase, inside a trailing-7 window anchored on Apr 2.
        ledger.push_purchase(Purchase {
            date: date(2025, 3, 29),
            supplier: "Valley Farms".to_string(),
            gross_quantity: dec!(50),
            moisture_pct: None,
            unit_price: dec!(8),
            payment_status: PaymentStatus::Paid,
        });

        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Trailing7,
            date(2025, 4, 2),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(snapshot.unit_cost, dec!(8));
        // The March purchase is opening stock for April.
        assert_eq!(snapshot.inventory_quantity, dec!(50));
    }

    #[test]
    fn test_inventory_quantity_is_floored_at_zero() {
        let mut ledger = MemoryLedger::new();
        ledger.push_purchase(purchase(5, dec!(10), dec!(10)));
        ledger.push_sale(Sale {
            date: date(2025, 4, 20),
            customer: "Meridian Mills".to_string(),
            quantity: dec!(40),
            unit_price: dec!(15),
            payment_status: PaymentStatus::Paid,
        });

        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Month,
            date(2025, 4, 30),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(snapshot.inventory_quantity, Decimal::ZERO);
        assert_eq!(snapshot.inventory_value, Decimal::ZERO);
    }

    #[test]
    fn test_opening_stock_carries_prior_months_net_position() {
        let mut ledger = MemoryLedger::new();
        // 80kg bought in March, 30kg sold in March: 50kg opening stock.
        ledger.push_purchase(Purchase {
            date: date(2025, 3, 10),
            supplier: "Valley Farms".to_string(),
            gross_quantity: dec!(80),
            moisture_pct: None,
            unit_price: dec!(9),
            payment_status: PaymentStatus::Paid,
        });
        ledger.push_sale(Sale {
            date: date(2025, 3, 20),
            customer: "Meridian Mills".to_string(),
            quantity: dec!(30),
            unit_price: dec!(14),
            payment_status: PaymentStatus::Paid,
        });
        ledger.push_purchase(purchase(5, dec!(20), dec!(10)));

        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Month,
            date(2025, 4, 30),
            &mut warnings,
        )
        .unwrap();
        // 50 opening + 20 April inflow, no April sales.
        assert_eq!(snapshot.inventory_quantity, dec!(70));
        assert_eq!(snapshot.unit_cost, dec!(10));
        assert_eq!(snapshot.inventory_value, dec!(700));
    }

    #[test]
    fn test_inventory_value_rounds_to_whole_currency_units() {
        let mut ledger = MemoryLedger::new();
        ledger.push_purchase(purchase(5, dec!(3), dec!(10.55)));

        let mut warnings = Vec::new();
        let snapshot = value_inventory(
            &ledger,
            april(),
            &april_range(),
            WindowPolicy::Month,
            date(2025, 4, 30),
            &mut warnings,
        )
        .unwrap();
        // 10.55 * 3 = 31.65 rounds to 32.
        assert_eq!(snapshot.inventory_value, dec!(32));
    }
}
