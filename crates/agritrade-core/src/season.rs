use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flows::{compute_period_totals, sum_totals, PeriodTotals};
use crate::ledger::{read_slice, Ledger};
use crate::period::MonthSlot;
use crate::types::{Money, Quantity};
use crate::EngineResult;

/// One month of the season window. The change fields are
/// month-over-month deltas against the previous row, zero for the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonMonthRow {
    pub month: u32,
    pub year: i32,
    pub label: String,
    pub totals: PeriodTotals,
    pub sales_change: Money,
    pub net_profit_change: Money,
}

/// Aggregated position of one counterparty across the window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyRank {
    pub name: String,
    pub total_amount: Money,
    pub total_quantity: Quantity,
    pub records: u32,
}

/// Paid-vs-pending split for one counterparty over the whole window.
/// No day-based aging here; the single-period aging engine owns that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyDebt {
    pub name: String,
    pub invoiced: Money,
    pub paid: Money,
    pub pending: Money,
}

/// Customers ranked by sale amount and suppliers by purchase cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRankings {
    pub customers: Vec<CounterpartyRank>,
    pub suppliers: Vec<CounterpartyRank>,
}

/// Window-wide debt view, one row per distinct name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonDebts {
    pub customers: Vec<CounterpartyDebt>,
    pub suppliers: Vec<CounterpartyDebt>,
}

/// Multi-month rollup: per-month totals with trends, window totals,
/// counterparty rankings, and the paid-vs-pending debt view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonReport {
    pub months: Vec<SeasonMonthRow>,
    pub totals: PeriodTotals,
    pub counterparty_rankings: SeasonRankings,
    pub per_counterparty_debt: SeasonDebts,
}

/// Run the ledger reader and period calculator once per month slot and
/// aggregate across the window.
pub fn build_season_report(
    ledger: &impl Ledger,
    slots: &[MonthSlot],
    top_n: Option<usize>,
) -> EngineResult<SeasonReport> {
    let mut months = Vec::with_capacity(slots.len());
    let mut month_totals: Vec<PeriodTotals> = Vec::with_capacity(slots.len());
    let mut window_sales = Vec::new();
    let mut window_purchases = Vec::new();

    for slot in slots {
        let range = slot.range()?;
        let slice = read_slice(ledger, &range)?;
        let totals = compute_period_totals(&slice);

        let (sales_change, net_profit_change) = match month_totals.last() {
            None => (Decimal::ZERO, Decimal::ZERO),
            Some(prev) => (
                totals.total_sales - prev.total_sales,
                totals.net_profit - prev.net_profit,
            ),
        };

        months.push(SeasonMonthRow {
            month: slot.month,
            year: slot.year,
            label: slot.label(),
            totals: totals.clone(),
            sales_change,
            net_profit_change,
        });
        month_totals.push(totals);
        window_sales.extend(slice.sales);
        window_purchases.extend(slice.purchases);
    }

    debug!(
        months = months.len(),
        sales = window_sales.len(),
        purchases = window_purchases.len(),
        "season window read"
    );

    let totals = sum_totals(&month_totals);

    let customers = rank(
        window_sales
            .iter()
            .map(|s| (s.customer.as_str(), s.line_amount(), s.quantity)),
        top_n,
    );
    let suppliers = rank(
        window_purchases
            .iter()
            .map(|p| (p.supplier.as_str(), p.line_cost(), p.net_quantity())),
        top_n,
    );

    let customer_debts = debts(
        window_sales
            .iter()
            .map(|s| (s.customer.as_str(), s.line_amount(), s.payment_status.is_paid())),
    );
    let supplier_debts = debts(
        window_purchases
            .iter()
            .map(|p| (p.supplier.as_str(), p.line_cost(), p.payment_status.is_paid())),
    );

    Ok(SeasonReport {
        months,
        totals,
        counterparty_rankings: SeasonRankings {
            customers,
            suppliers,
        },
        per_counterparty_debt: SeasonDebts {
            customers: customer_debts,
            suppliers: supplier_debts,
        },
    })
}

fn rank<'a>(
    records: impl Iterator<Item = (&'a str, Money, Quantity)>,
    top_n: Option<usize>,
) -> Vec<CounterpartyRank> {
    let mut map: BTreeMap<String, (Money, Quantity, u32)> = BTreeMap::new();
    for (name, amount, quantity) in records {
        let entry = map
            .entry(name.to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO, 0));
        entry.0 += amount;
        entry.1 += quantity;
        entry.2 += 1;
    }

    let mut rows: Vec<CounterpartyRank> = map
        .into_iter()
        .map(|(name, (total_amount, total_quantity, records))| CounterpartyRank {
            name,
            total_amount,
            total_quantity,
            records,
        })
        .collect();
    // Amount descending; names break ties so identical inputs rank
    // identically.
    rows.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.name.cmp(&b.name))
    });
    if let Some(n) = top_n {
        rows.truncate(n);
    }
    rows
}

fn debts<'a>(records: impl Iterator<Item = (&'a str, Money, bool)>) -> Vec<CounterpartyDebt> {
    let mut map: BTreeMap<String, (Money, Money, Money)> = BTreeMap::new();
    for (name, amount, is_paid) in records {
        let entry = map
            .entry(name.to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
        entry.0 += amount;
        if is_paid {
            entry.1 += amount;
        } else {
            entry.2 += amount;
        }
    }

    map.into_iter()
        .map(|(name, (invoiced, paid, pending))| CounterpartyDebt {
            name,
            invoiced,
            paid,
            pending,
        })
        .collect()
}
