// 📊 Aggregation - totals, budget delta, category and monthly buckets
//
// Every function is pure over a record snapshot. Dates are assumed valid:
// anything unparseable was rejected when the record was ingested.

use crate::db::ExpenseRecord;
use crate::money::Money;
use chrono::Datelike;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Calendar month bucket key, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of<D: Datelike>(date: &D) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following calendar month
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            MonthKey {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthKey {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub month: MonthKey,
    pub total: Money,
}

impl MonthTotal {
    /// "YYYY-MM"
    pub fn label(&self) -> String {
        self.month.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: Money,
    /// Share of the grand total, 0.0-100.0
    pub percent: f64,
}

pub fn total_amount(records: &[ExpenseRecord]) -> Money {
    records.iter().map(|r| r.amount).sum()
}

/// Budget minus spending. Negative means overspent.
pub fn remaining_budget(records: &[ExpenseRecord], budget: Money) -> Money {
    budget - total_amount(records)
}

pub fn is_over_budget(records: &[ExpenseRecord], budget: Money) -> bool {
    total_amount(records) > budget
}

/// Sum per category, keyed by exact category string.
///
/// Only categories present in the data appear; there is no zero-filling
/// for unused suggested categories.
pub fn sum_by_category(records: &[ExpenseRecord]) -> BTreeMap<String, Money> {
    let mut totals: BTreeMap<String, Money> = BTreeMap::new();

    for record in records {
        *totals.entry(record.category.clone()).or_default() += record.amount;
    }

    totals
}

/// Category totals with their percentage of all spending
pub fn category_shares(records: &[ExpenseRecord]) -> Vec<CategoryShare> {
    let grand_total = total_amount(records);

    sum_by_category(records)
        .into_iter()
        .map(|(category, total)| {
            let percent = if grand_total.cents() == 0 {
                0.0
            } else {
                total.cents() as f64 / grand_total.cents() as f64 * 100.0
            };
            CategoryShare {
                category,
                total,
                percent,
            }
        })
        .collect()
}

/// Sum per calendar month, oldest first.
///
/// Months without expenses are omitted, even between two active months.
/// Use [`sum_by_month_filled`] for a continuous series.
pub fn sum_by_month(records: &[ExpenseRecord]) -> Vec<MonthTotal> {
    let mut buckets: BTreeMap<MonthKey, Money> = BTreeMap::new();

    for record in records {
        *buckets.entry(MonthKey::of(&record.date)).or_default() += record.amount;
    }

    buckets
        .into_iter()
        .map(|(month, total)| MonthTotal { month, total })
        .collect()
}

/// Like [`sum_by_month`], but every month between the first and the last
/// active month is present, with zero for months that had no expenses.
pub fn sum_by_month_filled(records: &[ExpenseRecord]) -> Vec<MonthTotal> {
    let sparse = sum_by_month(records);

    let (first, last) = match (sparse.first(), sparse.last()) {
        (Some(first), Some(last)) => (first.month, last.month),
        _ => return Vec::new(),
    };

    let mut filled = Vec::with_capacity(sparse.len());
    let mut active = sparse.into_iter().peekable();
    let mut cursor = first;

    while cursor <= last {
        let total = match active.peek() {
            Some(bucket) if bucket.month == cursor => {
                let total = bucket.total;
                active.next();
                total
            }
            _ => Money::zero(),
        };
        filled.push(MonthTotal {
            month: cursor,
            total,
        });
        cursor = cursor.succ();
    }

    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewExpense;
    use chrono::NaiveDate;

    fn record(id: i64, date: &str, category: &str, cents: i64, description: &str) -> ExpenseRecord {
        NewExpense::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category,
            Money::from_cents(cents),
            description,
        )
        .into_record(id)
    }

    fn scenario() -> Vec<ExpenseRecord> {
        vec![
            record(1, "2024-01-05", "Food", 2000, "Lunch"),
            record(2, "2024-01-20", "Transport", 1500, "Bus"),
            record(3, "2024-02-01", "Food", 3000, "Dinner"),
        ]
    }

    #[test]
    fn test_scenario_totals() {
        let records = scenario();

        assert_eq!(total_amount(&records), Money::from_cents(6500));
        assert_eq!(remaining_budget(&records, Money::from_cents(10000)), Money::from_cents(3500));
        assert!(!is_over_budget(&records, Money::from_cents(10000)));
    }

    #[test]
    fn test_scenario_by_category() {
        let by_category = sum_by_category(&scenario());

        assert_eq!(by_category.len(), 2);
        assert_eq!(by_category["Food"], Money::from_cents(5000));
        assert_eq!(by_category["Transport"], Money::from_cents(1500));
    }

    #[test]
    fn test_scenario_by_month() {
        let by_month = sum_by_month(&scenario());
        let labelled: Vec<(String, Money)> = by_month.iter().map(|m| (m.label(), m.total)).collect();

        assert_eq!(
            labelled,
            vec![
                ("2024-01".to_string(), Money::from_cents(3500)),
                ("2024-02".to_string(), Money::from_cents(3000)),
            ]
        );
    }

    #[test]
    fn test_empty_snapshot() {
        let records: Vec<ExpenseRecord> = Vec::new();

        assert_eq!(total_amount(&records), Money::zero());
        assert!(sum_by_category(&records).is_empty());
        assert!(sum_by_month(&records).is_empty());
        assert!(sum_by_month_filled(&records).is_empty());
        assert!(category_shares(&records).is_empty());
        assert_eq!(remaining_budget(&records, Money::from_cents(500)), Money::from_cents(500));
    }

    #[test]
    fn test_overspend_goes_negative() {
        let records = scenario();
        let budget = Money::from_cents(5000);

        assert_eq!(remaining_budget(&records, budget), Money::from_cents(-1500));
        assert!(is_over_budget(&records, budget));
    }

    #[test]
    fn test_total_ignores_order() {
        let mut records = scenario();
        let forward = total_amount(&records);
        records.reverse();
        assert_eq!(total_amount(&records), forward);
    }

    #[test]
    fn test_buckets_partition_total() {
        let records = vec![
            record(1, "2023-11-30", "Food", 1234, ""),
            record(2, "2023-12-01", "Utilities", 8999, ""),
            record(3, "2024-03-15", "food", 1, "lower-case is its own bucket"),
            record(4, "2023-11-02", "Other", 50, ""),
            record(5, "2024-03-31", "Food", 777, ""),
        ];
        let total = total_amount(&records);

        let by_category = sum_by_category(&records);
        assert_eq!(by_category.values().sum::<Money>(), total);
        assert_eq!(by_category["food"], Money::from_cents(1));

        let by_month = sum_by_month(&records);
        assert_eq!(by_month.iter().map(|m| m.total).sum::<Money>(), total);
        assert!(by_month.windows(2).all(|w| w[0].month < w[1].month), "months strictly ascending");
        assert_eq!(by_month.len(), 3, "empty Jan/Feb 2024 are omitted");
    }

    #[test]
    fn test_filled_months_span_gaps() {
        let records = vec![
            record(1, "2023-11-30", "Food", 1000, ""),
            record(2, "2024-02-10", "Food", 2500, ""),
        ];

        let filled = sum_by_month_filled(&records);
        let labels: Vec<String> = filled.iter().map(|m| m.label()).collect();

        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
        assert_eq!(filled[1].total, Money::zero());
        assert_eq!(filled[2].total, Money::zero());
        assert_eq!(filled[3].total, Money::from_cents(2500));
        assert_eq!(filled.iter().map(|m| m.total).sum::<Money>(), total_amount(&records));
    }

    #[test]
    fn test_category_shares_percentages() {
        let shares = category_shares(&scenario());

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].category, "Food");
        assert!((shares[0].percent - 76.923).abs() < 0.01);
        assert!((shares.iter().map(|s| s.percent).sum::<f64>() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_shares_zero_total() {
        let records = vec![record(1, "2024-01-01", "Food", 0, "free sample")];
        let shares = category_shares(&records);
        assert_eq!(shares[0].percent, 0.0);
    }

    #[test]
    fn test_month_key_rollover() {
        let dec = MonthKey { year: 2023, month: 12 };
        assert_eq!(dec.succ(), MonthKey { year: 2024, month: 1 });
        assert_eq!(dec.to_string(), "2023-12");
        assert_eq!(serde_json::to_value(dec).unwrap(), "2023-12");
    }
}
