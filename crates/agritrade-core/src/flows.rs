use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerSlice;
use crate::types::{CostClass, Expense, Money};

/// Cash-basis and accrual totals for one resolved period.
///
/// The absolute cost fields exist alongside the percentage fields so a
/// season rollup can sum months and recompute the ratios from the sums.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub total_sales: Money,
    pub total_purchases: Money,
    pub total_expenses: Money,
    /// Accrual result: all sales minus all purchases minus all expenses,
    /// regardless of payment status.
    pub net_profit: Money,
    /// Paid-only realized flow: paid sales minus paid purchases minus
    /// receipted expenses.
    pub cash_realized: Money,
    pub variable_cost: Money,
    pub fixed_cost: Money,
    pub variable_pct: Decimal,
    pub fixed_pct: Decimal,
    pub margin_pct: Decimal,
}

/// Derive the period totals from one ledger slice.
pub fn compute_period_totals(slice: &LedgerSlice) -> PeriodTotals {
    let total_sales: Money = slice.sales.iter().map(|s| s.line_amount()).sum();
    let total_purchases: Money = slice.purchases.iter().map(|p| p.line_cost()).sum();
    let total_expenses: Money = slice.expenses.iter().map(|e| e.amount).sum();
    let net_profit = total_sales - total_purchases - total_expenses;

    let paid_sales: Money = slice
        .sales
        .iter()
        .filter(|s| s.payment_status.is_paid())
        .map(|s| s.line_amount())
        .sum();
    let paid_purchases: Money = slice
        .purchases
        .iter()
        .filter(|p| p.payment_status.is_paid())
        .map(|p| p.line_cost())
        .sum();
    let receipted_expenses: Money = slice
        .expenses
        .iter()
        .filter(|e| e.has_receipt)
        .map(|e| e.amount)
        .sum();
    let cash_realized = paid_sales - paid_purchases - receipted_expenses;

    let variable_cost = total_purchases + class_total(&slice.expenses, CostClass::Variable);
    let fixed_cost = class_total(&slice.expenses, CostClass::Fixed);

    PeriodTotals {
        total_sales,
        total_purchases,
        total_expenses,
        net_profit,
        cash_realized,
        variable_cost,
        fixed_cost,
        variable_pct: pct_of(variable_cost, total_sales),
        fixed_pct: pct_of(fixed_cost, total_sales),
        margin_pct: pct_of(net_profit, total_sales),
    }
}

/// Expense total with no receipt attached; the balance assembler reports
/// these as accrued costs.
pub fn accrued_costs(expenses: &[Expense]) -> Money {
    expenses
        .iter()
        .filter(|e| !e.has_receipt)
        .map(|e| e.amount)
        .sum()
}

/// Sum monthly totals into one window-wide row. Absolute fields add;
/// percentage fields are recomputed from the sums rather than averaged.
pub fn sum_totals(rows: &[PeriodTotals]) -> PeriodTotals {
    let mut total = PeriodTotals::default();
    for row in rows {
        total.total_sales += row.total_sales;
        total.total_purchases += row.total_purchases;
        total.total_expenses += row.total_expenses;
        total.net_profit += row.net_profit;
        total.cash_realized += row.cash_realized;
        total.variable_cost += row.variable_cost;
        total.fixed_cost += row.fixed_cost;
    }
    total.variable_pct = pct_of(total.variable_cost, total.total_sales);
    total.fixed_pct = pct_of(total.fixed_cost, total.total_sales);
    total.margin_pct = pct_of(total.net_profit, total.total_sales);
    total
}

fn class_total(expenses: &[Expense], class: CostClass) -> Money {
    expenses
        .iter()
        .filter(|e| e.cost_class() == class)
        .map(|e| e.amount)
        .sum()
}

/// `value / total_sales * 100`, 0 when there are no sales.
fn pct_of(value: Money, total_sales: Money) -> Decimal {
    if total_sales.is_zero() {
        Decimal::ZERO
    } else {
        value / total_sales * dec!(100)
    }
}
