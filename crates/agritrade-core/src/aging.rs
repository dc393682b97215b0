use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Purchase, Sale};

/// Mutually exclusive age classes for unpaid records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBucket {
    /// Age of 7 days or less, including future-dated records.
    InDue,
    /// Between 8 and 30 days old.
    Due7To30,
    /// More than 30 days old.
    Overdue30,
}

/// Bucket by integer day-age. A future-dated record (negative age) is
/// treated as not yet due rather than an error.
pub fn bucket_for_age(age_days: i64) -> AgeBucket {
    if age_days <= 7 {
        AgeBucket::InDue
    } else if age_days <= 30 {
        AgeBucket::Due7To30
    } else {
        AgeBucket::Overdue30
    }
}

/// Outstanding total for one counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyAging {
    pub name: String,
    pub total: Money,
}

/// Three-bucket aging of unpaid records against a reference date. The
/// bucket amounts always sum to `total`; `by_counterparty` holds one row
/// per distinct name, sorted by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgingSummary {
    pub in_due: Money,
    pub due_7_30: Money,
    pub overdue_30: Money,
    pub total: Money,
    pub by_counterparty: Vec<CounterpartyAging>,
}

/// Age the pending sales into receivable buckets per customer.
pub fn age_receivables(sales: &[Sale], reference: NaiveDate) -> AgingSummary {
    accumulate(
        sales
            .iter()
            .filter(|s| !s.payment_status.is_paid())
            .map(|s| (s.customer.as_str(), s.date, s.line_amount())),
        reference,
    )
}

/// Age the pending purchases into payable buckets per supplier.
pub fn age_payables(purchases: &[Purchase], reference: NaiveDate) -> AgingSummary {
    accumulate(
        purchases
            .iter()
            .filter(|p| !p.payment_status.is_paid())
            .map(|p| (p.supplier.as_str(), p.date, p.line_cost())),
        reference,
    )
}

fn accumulate<'a>(
    records: impl Iterator<Item = (&'a str, NaiveDate, Money)>,
    reference: NaiveDate,
) -> AgingSummary {
    let mut summary = AgingSummary::default();
    let mut per_name: BTreeMap<String, Money> = BTreeMap::new();

    for (name, date, amount) in records {
        let age_days = (reference - date).num_days();
        match bucket_for_age(age_days) {
            AgeBucket::InDue => summary.in_due += amount,
            AgeBucket::Due7To30 => summary.due_7_30 += amount,
            AgeBucket::Overdue30 => summary.overdue_30 += amount,
        }
        summary.total += amount;
        *per_name.entry(name.to_string()).or_insert(Decimal::ZERO) += amount;
    }

    summary.by_counterparty = per_name
        .into_iter()
        .map(|(name, total)| CounterpartyAging { name, total })
        .collect();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentStatus;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pending_sale(date_: NaiveDate, customer: &str, amount: Decimal) -> Sale {
        Sale {
            date: date_,
            customer: customer.to_string(),
            quantity: dec!(1),
            unit_price: amount,
            payment_status: PaymentStatus::Pending,
        }
    }

    #[test]
    fn test_bucket_boundaries_are_inclusive_at_7_and_30() {
        assert_eq!(bucket_for_age(0), AgeBucket::InDue);
        assert_eq!(bucket_for_age(7), AgeBucket::InDue);
        assert_eq!(bucket_for_age(8), AgeBucket::Due7To30);
        assert_eq!(bucket_for_age(30), AgeBucket::Due7To30);
        assert_eq!(bucket_for_age(31), AgeBucket::Overdue30);
    }

    #[test]
    fn test_future_dated_record_counts_as_in_due() {
        assert_eq!(bucket_for_age(-3), AgeBucket::InDue);

        let reference = date(2025, 4, 10);
        let sales = vec![pending_sale(date(2025, 4, 13), "Meridian Mills", dec!(200))];
        let summary = age_receivables(&sales, reference);
        assert_eq!(summary.in_due, dec!(200));
        assert_eq!(summary.total, dec!(200));
    }

    #[test]
    fn test_ten_day_old_pending_sale_lands_in_middle_bucket() {
        let reference = date(2025, 4, 20);
        let sales = vec![pending_sale(date(2025, 4, 10), "Meridian Mills", dec!(1000))];
        let summary = age_receivables(&sales, reference);
        assert_eq!(summary.in_due, Decimal::ZERO);
        assert_eq!(summary.due_7_30, dec!(1000));
        assert_eq!(summary.overdue_30, Decimal::ZERO);
    }

    #[test]
    fn test_paid_records_are_excluded() {
        let reference = date(2025, 4, 20);
        let mut sales = vec![pending_sale(date(2025, 4, 10), "Meridian Mills", dec!(1000))];
        sales.push(Sale {
            payment_status: PaymentStatus::Paid,
            ..pending_sale(date(2025, 4, 10), "Meridian Mills", dec!(500))
        });
        let summary = age_receivables(&sales, reference);
        assert_eq!(summary.total, dec!(1000));
    }

    #[test]
    fn test_buckets_sum_to_total_across_all_classes() {
        let reference = date(2025, 5, 15);
        let sales = vec![
            pending_sale(date(2025, 5, 12), "Meridian Mills", dec!(100)),
            pending_sale(date(2025, 4, 30), "Harbor Traders", dec!(250)),
            pending_sale(date(2025, 3, 1), "Meridian Mills", dec!(400)),
        ];
        let summary = age_receivables(&sales, reference);
        assert_eq!(summary.in_due, dec!(100));
        assert_eq!(summary.due_7_30, dec!(250));
        assert_eq!(summary.overdue_30, dec!(400));
        assert_eq!(
            summary.in_due + summary.due_7_30 + summary.overdue_30,
            summary.total
        );
    }

    #[test]
    fn test_counterparty_rows_group_by_name_sorted() {
        let reference = date(2025, 5, 15);
        let sales = vec![
            pending_sale(date(2025, 5, 12), "Meridian Mills", dec!(100)),
            pending_sale(date(2025, 4, 30), "Harbor Traders", dec!(250)),
            pending_sale(date(2025, 3, 1), "Meridian Mills", dec!(400)),
        ];
        let summary = age_receivables(&sales, reference);
        assert_eq!(summary.by_counterparty.len(), 2);
        assert_eq!(summary.by_counterparty[0].name, "Harbor Traders");
        assert_eq!(summary.by_counterparty[0].total, dec!(250));
        assert_eq!(summary.by_counterparty[1].name, "Meridian Mills");
        assert_eq!(summary.by_counterparty[1].total, dec!(500));
    }

    #[test]
    fn test_payables_age_symmetrically_from_purchases() {
        let reference = date(2025, 4, 20);
        let purchases = vec![Purchase {
            date: date(2025, 4, 10),
            supplier: "Valley Farms".to_string(),
            gross_quantity: dec!(100),
            moisture_pct: Some(dec!(20)),
            unit_price: dec!(10),
            payment_status: PaymentStatus::Pending,
        }];
        let summary = age_payables(&purchases, reference);
        // 80kg net at 10 = 800, ten days old.
        assert_eq!(summary.due_7_30, dec!(800));
        assert_eq!(summary.by_counterparty[0].name, "Valley Farms");
    }
}
