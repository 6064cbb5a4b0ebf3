// Report bundle - one read of the store, every dashboard metric derived from it

use crate::aggregate::{self, CategoryShare, MonthTotal};
use crate::db::ExpenseRecord;
use crate::error::Result;
use crate::money::Money;
use crate::store::ExpenseStore;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Include zero-valued months between the first and last active month
    pub fill_month_gaps: bool,
}

/// Everything the dashboard shows, computed from a single snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub budget: Money,
    pub total: Money,
    pub remaining: Money,
    pub over_budget: bool,
    pub by_category: BTreeMap<String, Money>,
    pub shares: Vec<CategoryShare>,
    pub by_month: Vec<MonthTotal>,
    pub records: Vec<ExpenseRecord>,
}

impl Report {
    pub fn from_records(records: Vec<ExpenseRecord>, budget: Money, options: ReportOptions) -> Self {
        let total = aggregate::total_amount(&records);
        let by_month = if options.fill_month_gaps {
            aggregate::sum_by_month_filled(&records)
        } else {
            aggregate::sum_by_month(&records)
        };

        Report {
            budget,
            total,
            remaining: aggregate::remaining_budget(&records, budget),
            over_budget: aggregate::is_over_budget(&records, budget),
            by_category: aggregate::sum_by_category(&records),
            shares: aggregate::category_shares(&records),
            by_month,
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read the store once and build the full report
pub fn request_report(store: &dyn ExpenseStore, budget: Money, options: ReportOptions) -> Result<Report> {
    let records = store.all_records()?;
    let report = Report::from_records(records, budget, options);

    if report.over_budget {
        tracing::warn!(total = %report.total, budget = %budget, "spending exceeds budget");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{submit_expense, ExpenseInput};
    use crate::store::MemoryStore;

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        for (date, category, amount, description) in [
            ("2024-01-05", "Food", "20.00", "Lunch"),
            ("2024-01-20", "Transport", "15.00", "Bus"),
            ("2024-02-01", "Food", "30.00", "Dinner"),
        ] {
            submit_expense(&store, &ExpenseInput::new(date, category, amount, description)).unwrap();
        }
        store
    }

    #[test]
    fn test_report_scenario() {
        let store = seeded_store();
        let report = request_report(&store, Money::from_cents(10000), ReportOptions::default()).unwrap();

        assert_eq!(report.total, Money::from_cents(6500));
        assert_eq!(report.remaining, Money::from_cents(3500));
        assert!(!report.over_budget);
        assert_eq!(report.by_category["Food"], Money::from_cents(5000));
        assert_eq!(report.by_category["Transport"], Money::from_cents(1500));
        assert_eq!(report.by_month.len(), 2);
        assert_eq!(report.by_month[0].label(), "2024-01");
        assert_eq!(report.records.len(), 3);
    }

    #[test]
    fn test_report_empty_store() {
        let store = MemoryStore::new();
        let report = request_report(&store, Money::from_cents(100000), ReportOptions::default()).unwrap();

        assert!(report.is_empty());
        assert_eq!(report.total, Money::zero());
        assert_eq!(report.remaining, Money::from_cents(100000));
        assert!(report.by_category.is_empty());
        assert!(report.by_month.is_empty());
    }

    #[test]
    fn test_report_fill_gaps_option() {
        let store = MemoryStore::new();
        submit_expense(&store, &ExpenseInput::new("2024-01-05", "Food", "5", "")).unwrap();
        submit_expense(&store, &ExpenseInput::new("2024-04-05", "Food", "5", "")).unwrap();

        let sparse = request_report(&store, Money::zero(), ReportOptions::default()).unwrap();
        let filled = request_report(&store, Money::zero(), ReportOptions { fill_month_gaps: true }).unwrap();

        assert_eq!(sparse.by_month.len(), 2);
        assert_eq!(filled.by_month.len(), 4);
        assert!(filled.over_budget);
    }

    #[test]
    fn test_report_serializes() {
        let report = request_report(&seeded_store(), Money::from_cents(5000), ReportOptions::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["total"], 6500);
        assert_eq!(json["remaining"], -1500);
        assert_eq!(json["over_budget"], true);
        assert_eq!(json["by_category"]["Food"], 5000);
        assert_eq!(json["by_month"][1]["month"], "2024-02");
        assert_eq!(json["records"][0]["description"], "Lunch");
    }
}
