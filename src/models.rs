use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
pub enum TxnCategory {
    Rent,
    #[strum(serialize = "Education Fee")]
    EducationFee,
    Maintenance,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
pub enum TxnStatus {
    Upcoming,
    Scheduled,
    Paid,
    Failed,
    Completed,
    Pending,
}

impl TxnStatus {
    /// Statuses that still await settlement.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Upcoming | Self::Scheduled | Self::Pending)
    }
}

/// A single payment event tied to a registration. Amounts are whole-rupee
/// integers; fractional amounts never occur in this data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: String,
    pub category: TxnCategory,
    pub amount: i64,
    pub date: NaiveDate,
    pub status: TxnStatus,
}

/// Derived placement of a record, computed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Bucket {
    Upcoming,
    History,
}

impl Transaction {
    /// A record is upcoming only while its status is still open and its date
    /// has not passed; everything else is history.
    pub fn bucket(&self, today: NaiveDate) -> Bucket {
        if self.status.is_open() && self.date >= today {
            Bucket::Upcoming
        } else {
            Bucket::History
        }
    }
}

/// A recurring-payment obligation (rent, education fee, society dues).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    pub id: String,
    pub category: TxnCategory,
    pub payee: String,
    pub amount: i64,
    pub frequency: String,
    pub next_due: NaiveDate,
    pub status: TxnStatus,
    pub tenant_email: String,
    pub tenant_phone: String,
}

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub active_registrations: usize,
    pub monthly_outflow: i64,
    pub cash_points: i64,
    pub next_due: Option<(NaiveDate, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub points: i64,
    pub note: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsAccount {
    pub balance: i64,
    pub lifetime_earned: i64,
    pub history: Vec<Redemption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralStats {
    pub code: String,
    pub invited: u32,
    pub points_per_referral: i64,
    pub share_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct SupportTicket {
    pub reference: String,
    pub subject: String,
    pub message: String,
}

/// Inclusive calendar-date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum ReportKind {
    #[default]
    #[strum(serialize = "Transaction History")]
    TransactionHistory,
    #[strum(serialize = "Upcoming Payments")]
    UpcomingPayments,
}

impl ReportKind {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::TransactionHistory => "transaction_history",
            Self::UpcomingPayments => "upcoming_payments",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::TransactionHistory => Self::UpcomingPayments,
            Self::UpcomingPayments => Self::TransactionHistory,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum ReportRange {
    #[default]
    #[strum(serialize = "This Month")]
    ThisMonth,
    #[strum(serialize = "Last Month")]
    LastMonth,
    #[strum(serialize = "Last 90 Days")]
    Last90Days,
    #[strum(serialize = "Year to Date")]
    YearToDate,
}

impl ReportRange {
    pub fn next(&self) -> Self {
        match self {
            Self::ThisMonth => Self::LastMonth,
            Self::LastMonth => Self::Last90Days,
            Self::Last90Days => Self::YearToDate,
            Self::YearToDate => Self::ThisMonth,
        }
    }

    /// Resolve the preset against a concrete `today` so callers decide where
    /// the clock comes from.
    pub fn span(&self, today: NaiveDate) -> DateSpan {
        match self {
            Self::ThisMonth => DateSpan {
                start: month_start(today),
                end: month_end(today),
            },
            Self::LastMonth => {
                let prev_end = month_start(today).pred_opt().unwrap();
                DateSpan {
                    start: month_start(prev_end),
                    end: prev_end,
                }
            }
            Self::Last90Days => DateSpan {
                start: today - chrono::Duration::days(90),
                end: today,
            },
            Self::YearToDate => DateSpan {
                start: NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap(),
                end: today,
            },
        }
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap()
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month.unwrap().pred_opt().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn txn(status: TxnStatus, date: &str) -> Transaction {
        Transaction {
            id: "RG-1".into(),
            category: TxnCategory::Rent,
            amount: 14000,
            date: d(date),
            status,
        }
    }

    #[test]
    fn open_future_records_are_upcoming() {
        let today = d("2025-08-04");
        assert_eq!(txn(TxnStatus::Upcoming, "2025-09-01").bucket(today), Bucket::Upcoming);
        assert_eq!(txn(TxnStatus::Scheduled, "2025-08-04").bucket(today), Bucket::Upcoming);
        assert_eq!(txn(TxnStatus::Pending, "2025-08-05").bucket(today), Bucket::Upcoming);
    }

    #[test]
    fn settled_or_past_records_are_history() {
        let today = d("2025-08-04");
        // settled status wins even with a future date
        assert_eq!(txn(TxnStatus::Paid, "2025-09-01").bucket(today), Bucket::History);
        assert_eq!(txn(TxnStatus::Failed, "2025-09-01").bucket(today), Bucket::History);
        // open status with a past date has lapsed into history
        assert_eq!(txn(TxnStatus::Upcoming, "2025-07-01").bucket(today), Bucket::History);
    }

    #[test]
    fn this_month_span_covers_the_calendar_month() {
        let span = ReportRange::ThisMonth.span(d("2025-08-15"));
        assert_eq!(span.start, d("2025-08-01"));
        assert_eq!(span.end, d("2025-08-31"));
    }

    #[test]
    fn december_span_ends_on_the_31st() {
        let span = ReportRange::ThisMonth.span(d("2025-12-10"));
        assert_eq!(span.end, d("2025-12-31"));
    }

    #[test]
    fn last_month_span_is_the_previous_calendar_month() {
        let span = ReportRange::LastMonth.span(d("2025-03-15"));
        assert_eq!(span.start, d("2025-02-01"));
        assert_eq!(span.end, d("2025-02-28"));
    }

    #[test]
    fn year_to_date_starts_on_january_first() {
        let span = ReportRange::YearToDate.span(d("2025-08-15"));
        assert_eq!(span.start, d("2025-01-01"));
        assert_eq!(span.end, d("2025-08-15"));
    }

    #[test]
    fn date_span_bounds_are_inclusive() {
        let span = DateSpan {
            start: d("2025-08-01"),
            end: d("2025-08-31"),
        };
        assert!(span.contains(d("2025-08-01")));
        assert!(span.contains(d("2025-08-31")));
        assert!(!span.contains(d("2025-07-31")));
        assert!(!span.contains(d("2025-09-01")));
    }
}
