use chrono::NaiveDate;
use tracing::debug;

use crate::types::{DateRange, Expense, FinishedGoodsEntry, Purchase, Sale};
use crate::EngineResult;

/// Read-only contract to the surrounding application's record store.
///
/// A `None` range means unrestricted full history, used by the
/// opening-balance and trailing-window valuation reads. Implementations
/// report failures as `EngineError::LedgerReadFailure`; the engine never
/// retries and never computes over partial reads.
pub trait Ledger {
    fn sales(&self, range: Option<&DateRange>) -> EngineResult<Vec<Sale>>;
    fn purchases(&self, range: Option<&DateRange>) -> EngineResult<Vec<Purchase>>;
    fn expenses(&self, range: Option<&DateRange>) -> EngineResult<Vec<Expense>>;
    fn finished_goods(&self, range: Option<&DateRange>) -> EngineResult<Vec<FinishedGoodsEntry>>;
}

/// The four per-period reads bundled for one computation.
#[derive(Debug, Clone)]
pub struct LedgerSlice {
    pub range: DateRange,
    pub sales: Vec<Sale>,
    pub purchases: Vec<Purchase>,
    pub expenses: Vec<Expense>,
    pub finished_goods: Vec<FinishedGoodsEntry>,
}

/// Fetch all four record kinds for one period. The reads are independent
/// of each other; the first failure aborts the whole computation.
pub fn read_slice(ledger: &impl Ledger, range: &DateRange) -> EngineResult<LedgerSlice> {
    let slice = LedgerSlice {
        range: *range,
        sales: ledger.sales(Some(range))?,
        purchases: ledger.purchases(Some(range))?,
        expenses: ledger.expenses(Some(range))?,
        finished_goods: ledger.finished_goods(Some(range))?,
    };
    debug!(
        range = %slice.range,
        sales = slice.sales.len(),
        purchases = slice.purchases.len(),
        expenses = slice.expenses.len(),
        finished_goods = slice.finished_goods.len(),
        "ledger slice read"
    );
    Ok(slice)
}

/// Vec-backed ledger for tests and for callers that already hold records
/// in memory. Reads never fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    sales: Vec<Sale>,
    purchases: Vec<Purchase>,
    expenses: Vec<Expense>,
    finished_goods: Vec<FinishedGoodsEntry>,
}

impl MemoryLedger {
    pub fn new() -> MemoryLedger {
        MemoryLedger::default()
    }

    pub fn push_sale(&mut self, sale: Sale) {
        self.sales.push(sale);
    }

    pub fn push_purchase(&mut self, purchase: Purchase) {
        self.purchases.push(purchase);
    }

    pub fn push_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    pub fn push_finished_goods(&mut self, entry: FinishedGoodsEntry) {
        self.finished_goods.push(entry);
    }
}

fn filter_by_range<T, F>(records: &[T], range: Option<&DateRange>, date_fn: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> NaiveDate,
{
    records
        .iter()
        .filter(|r| range.map_or(true, |w| w.contains(date_fn(r))))
        .cloned()
        .collect()
}

impl Ledger for MemoryLedger {
    fn sales(&self, range: Option<&DateRange>) -> EngineResult<Vec<Sale>> {
        Ok(filter_by_range(&self.sales, range, |s| s.date))
    }

    fn purchases(&self, range: Option<&DateRange>) -> EngineResult<Vec<Purchase>> {
        Ok(filter_by_range(&self.purchases, range, |p| p.date))
    }

    fn expenses(&self, range: Option<&DateRange>) -> EngineResult<Vec<Expense>> {
        Ok(filter_by_range(&self.expenses, range, |e| e.date))
    }

    fn finished_goods(&self, range: Option<&DateRange>) -> EngineResult<Vec<FinishedGoodsEntry>> {
        Ok(filter_by_range(&self.finished_goods, range, |e| e.date))
    }
}
