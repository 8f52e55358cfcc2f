use crate::error::{AppError, Result};
use crate::models::{DateSpan, ReportKind, Transaction, TxnCategory, TxnStatus};

/// Criteria are ANDed together; fields left at `None` impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub category: Option<TxnCategory>,
    pub status: Option<TxnStatus>,
    pub search: Option<String>,
    pub date_span: Option<DateSpan>,
}

impl FilterCriteria {
    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(category) = self.category {
            if txn.category != category {
                return false;
            }
        }
        if let Some(status) = self.status {
            if txn.status != status {
                return false;
            }
        }
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let id = txn.id.to_lowercase();
            let label = txn.category.to_string().to_lowercase();
            if !id.contains(&needle) && !label.contains(&needle) {
                return false;
            }
        }
        if let Some(span) = &self.date_span {
            if !span.contains(txn.date) {
                return false;
            }
        }
        true
    }
}

/// Holds the full in-memory record list and derives display-ready views from
/// it. Knows nothing about rendering.
#[derive(Debug, Default)]
pub struct FilterEngine {
    records: Vec<Transaction>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the record list. Filter state lives with the caller and is
    /// untouched.
    pub fn set_records(&mut self, records: Vec<Transaction>) {
        self.records = records;
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    /// Matching records in their original insertion order.
    pub fn apply(&self, criteria: &FilterCriteria) -> Vec<&Transaction> {
        self.records.iter().filter(|t| criteria.matches(t)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTotals {
    pub upcoming: usize,
    pub scheduled: usize,
    pub paid: usize,
    pub failed: usize,
    pub completed: usize,
    pub pending: usize,
    pub total_amount: i64,
}

impl StatusTotals {
    pub fn count(&self, status: TxnStatus) -> usize {
        match status {
            TxnStatus::Upcoming => self.upcoming,
            TxnStatus::Scheduled => self.scheduled,
            TxnStatus::Paid => self.paid,
            TxnStatus::Failed => self.failed,
            TxnStatus::Completed => self.completed,
            TxnStatus::Pending => self.pending,
        }
    }

    pub fn record_count(&self) -> usize {
        self.upcoming + self.scheduled + self.paid + self.failed + self.completed + self.pending
    }
}

/// Per-status counts and the amount total over any record sequence. Pure and
/// order-independent.
pub fn aggregate<'a, I>(records: I) -> StatusTotals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals = StatusTotals::default();
    for txn in records {
        match txn.status {
            TxnStatus::Upcoming => totals.upcoming += 1,
            TxnStatus::Scheduled => totals.scheduled += 1,
            TxnStatus::Paid => totals.paid += 1,
            TxnStatus::Failed => totals.failed += 1,
            TxnStatus::Completed => totals.completed += 1,
            TxnStatus::Pending => totals.pending += 1,
        }
        totals.total_amount += txn.amount;
    }
    totals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnColumn {
    Id,
    Category,
    Amount,
    Date,
    Status,
}

impl TxnColumn {
    pub const ALL: [TxnColumn; 5] = [
        TxnColumn::Id,
        TxnColumn::Category,
        TxnColumn::Amount,
        TxnColumn::Date,
        TxnColumn::Status,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Category => "category",
            Self::Amount => "amount",
            Self::Date => "date",
            Self::Status => "status",
        }
    }

    fn field(&self, txn: &Transaction) -> String {
        match self {
            Self::Id => txn.id.clone(),
            Self::Category => txn.category.to_string(),
            Self::Amount => txn.amount.to_string(),
            Self::Date => txn.date.to_string(),
            Self::Status => txn.status.to_string(),
        }
    }
}

/// Header row plus one data row per record, in input order. Fields containing
/// commas, quotes or newlines are quoted; plain fields stay bare. No trailing
/// newline.
pub fn export_csv(records: &[&Transaction], columns: &[TxnColumn]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|c| c.header()))?;
    for txn in records {
        writer.write_record(columns.iter().map(|c| c.field(txn)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Export(e.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| AppError::Export(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

pub fn report_filename(kind: ReportKind, span: &DateSpan) -> String {
    format!("{}_{}_{}.csv", kind.slug(), span.start, span.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn txn(id: &str, category: TxnCategory, amount: i64, date: &str, status: TxnStatus) -> Transaction {
        Transaction {
            id: id.into(),
            category,
            amount,
            date: d(date),
            status,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn("RG-1", TxnCategory::Rent, 14000, "2024-11-14", TxnStatus::Upcoming),
            txn("RG-2", TxnCategory::Maintenance, 18000, "2024-12-12", TxnStatus::Failed),
            txn("RG-3", TxnCategory::Rent, 14000, "2024-12-14", TxnStatus::Paid),
            txn("RG-4", TxnCategory::EducationFee, 52000, "2025-01-05", TxnStatus::Completed),
            txn("RG-5", TxnCategory::Rent, 15000, "2025-01-14", TxnStatus::Scheduled),
        ]
    }

    fn engine() -> FilterEngine {
        let mut engine = FilterEngine::new();
        engine.set_records(sample());
        engine
    }

    #[test]
    fn apply_returns_a_subset_in_insertion_order() {
        let engine = engine();
        let criteria = FilterCriteria {
            category: Some(TxnCategory::Rent),
            ..FilterCriteria::default()
        };
        let ids: Vec<&str> = engine.apply(&criteria).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["RG-1", "RG-3", "RG-5"]);
    }

    #[test]
    fn empty_criteria_pass_everything_through() {
        let engine = engine();
        assert_eq!(engine.apply(&FilterCriteria::default()).len(), sample().len());
    }

    #[test]
    fn sequential_filters_equal_the_combined_criteria() {
        let engine = engine();
        let by_category = FilterCriteria {
            category: Some(TxnCategory::Rent),
            ..FilterCriteria::default()
        };
        let by_status = FilterCriteria {
            status: Some(TxnStatus::Paid),
            ..FilterCriteria::default()
        };
        let combined = FilterCriteria {
            category: Some(TxnCategory::Rent),
            status: Some(TxnStatus::Paid),
            ..FilterCriteria::default()
        };

        let sequential: Vec<&Transaction> = engine
            .apply(&by_category)
            .into_iter()
            .filter(|t| by_status.matches(t))
            .collect();
        assert_eq!(sequential, engine.apply(&combined));
    }

    #[test]
    fn search_is_case_insensitive_and_matches_category_labels() {
        let engine = engine();
        let by_id = FilterCriteria {
            search: Some("rg-2".into()),
            ..FilterCriteria::default()
        };
        let ids: Vec<&str> = engine.apply(&by_id).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["RG-2"]);

        let by_label = FilterCriteria {
            search: Some("education".into()),
            ..FilterCriteria::default()
        };
        let ids: Vec<&str> = engine.apply(&by_label).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["RG-4"]);
    }

    #[test]
    fn date_span_filter_keeps_records_on_the_bounds() {
        let engine = engine();
        let criteria = FilterCriteria {
            date_span: Some(DateSpan {
                start: d("2024-12-12"),
                end: d("2024-12-14"),
            }),
            ..FilterCriteria::default()
        };
        let ids: Vec<&str> = engine.apply(&criteria).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["RG-2", "RG-3"]);
    }

    #[test]
    fn aggregate_over_nothing_is_all_zero() {
        let none: [&Transaction; 0] = [];
        assert_eq!(aggregate(none), StatusTotals::default());
    }

    #[test]
    fn aggregate_counts_are_exhaustive() {
        let records = sample();
        let totals = aggregate(&records);
        assert_eq!(totals.record_count(), records.len());
    }

    #[test]
    fn aggregate_matches_the_two_record_scenario() {
        let records = vec![
            txn("RG-1", TxnCategory::Rent, 14000, "2024-11-14", TxnStatus::Upcoming),
            txn("RG-2", TxnCategory::Maintenance, 18000, "2024-12-12", TxnStatus::Failed),
        ];
        let totals = aggregate(&records);
        assert_eq!(totals.upcoming, 1);
        assert_eq!(totals.failed, 1);
        assert_eq!(totals.total_amount, 32000);

        let mut engine = FilterEngine::new();
        engine.set_records(records);
        let criteria = FilterCriteria {
            category: Some(TxnCategory::Rent),
            ..FilterCriteria::default()
        };
        let ids: Vec<&str> = engine.apply(&criteria).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["RG-1"]);
    }

    #[test]
    fn csv_export_produces_the_exact_two_line_text() {
        let record = txn("RG-1", TxnCategory::Rent, 14000, "2024-11-14", TxnStatus::Upcoming);
        let text = export_csv(&[&record], &[TxnColumn::Id, TxnColumn::Amount]).unwrap();
        assert_eq!(text, "id,amount\nRG-1,14000");
    }

    #[test]
    fn csv_export_quotes_fields_containing_commas() {
        let record = txn("RG-1,PRIMARY", TxnCategory::Rent, 14000, "2024-11-14", TxnStatus::Upcoming);
        let text = export_csv(&[&record], &[TxnColumn::Id, TxnColumn::Amount]).unwrap();
        assert_eq!(text, "id,amount\n\"RG-1,PRIMARY\",14000");
    }

    #[test]
    fn csv_export_keeps_input_order() {
        let records = sample();
        let refs: Vec<&Transaction> = records.iter().collect();
        let text = export_csv(&refs, &[TxnColumn::Id]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["id", "RG-1", "RG-2", "RG-3", "RG-4", "RG-5"]);
    }

    #[test]
    fn report_filename_embeds_kind_and_range() {
        let span = DateSpan {
            start: d("2025-08-01"),
            end: d("2025-08-31"),
        };
        assert_eq!(
            report_filename(ReportKind::TransactionHistory, &span),
            "transaction_history_2025-08-01_2025-08-31.csv"
        );
    }
}
