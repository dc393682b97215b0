use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aging::AgingSummary;
use crate::flows::PeriodTotals;
use crate::types::Money;
use crate::valuation::ValuationSnapshot;

/// Absolute difference under which the two sides count as reconciled:
/// one whole currency unit of rounding slack.
pub const RECONCILE_TOLERANCE: Decimal = dec!(1);

/// Asset side of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assets {
    /// Clamped cash estimate: a negative realized flow reports as zero.
    pub cash: Money,
    pub receivables: Money,
    pub inventory_value: Money,
    /// Reserved; always zero today.
    pub prepaid: Money,
    pub total: Money,
}

/// Liability side of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Liabilities {
    pub payables: Money,
    /// Expenses with no receipt attached.
    pub accrued_costs: Money,
    pub total: Money,
}

/// Equity side of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equity {
    /// Caller-supplied; not ledger-derived.
    pub initial_capital: Money,
    pub retained_earnings: Money,
    pub period_profit: Money,
    pub total: Money,
}

/// Two-sided balance snapshot for one period. `reconciled = false` is a
/// normal output flag ("this estimate did not balance"), never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub assets: Assets,
    pub liabilities: Liabilities,
    pub equity: Equity,
    pub reconciled: bool,
}

/// The accounting equation within rounding tolerance.
pub fn reconcile(assets_total: Money, liabilities_total: Money, equity_total: Money) -> bool {
    (assets_total - (liabilities_total + equity_total)).abs() < RECONCILE_TOLERANCE
}

/// Combine the period computations into a two-sided balance sheet.
pub fn assemble_balance_sheet(
    totals: &PeriodTotals,
    receivables: &AgingSummary,
    payables: &AgingSummary,
    valuation: &ValuationSnapshot,
    accrued_costs: Money,
    initial_capital: Money,
) -> BalanceSheet {
    let cash = totals.cash_realized.max(Decimal::ZERO);
    let prepaid = Decimal::ZERO;
    let assets_total = cash + receivables.total + valuation.inventory_value + prepaid;
    let assets = Assets {
        cash,
        receivables: receivables.total,
        inventory_value: valuation.inventory_value,
        prepaid,
        total: assets_total,
    };

    let liabilities_total = payables.total + accrued_costs;
    let liabilities = Liabilities {
        payables: payables.total,
        accrued_costs,
        total: liabilities_total,
    };

    // Retained earnings are solved backward from the other two sides, so
    // the reconciliation check is a gross-error indicator, not proof of
    // ledger correctness.
    let retained_earnings = (assets_total - liabilities_total - initial_capital).max(Decimal::ZERO);
    let period_profit = totals.net_profit;
    let equity_total = initial_capital + retained_earnings + period_profit;
    let equity = Equity {
        initial_capital,
        retained_earnings,
        period_profit,
        total: equity_total,
    };

    let reconciled = reconcile(assets_total, liabilities_total, equity_total);
    if !reconciled {
        warn!(
            gap = %(assets_total - (liabilities_total + equity_total)),
            "balance sheet did not reconcile"
        );
    }

    BalanceSheet {
        assets,
        liabilities,
        equity,
        reconciled,
    }
}
