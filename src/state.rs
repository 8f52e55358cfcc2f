use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::filter::FilterCriteria;
use crate::models::{
    Bucket, DashboardSummary, Profile, Registration, ReferralStats, ReportKind, ReportRange,
    RewardsAccount, TxnCategory, TxnStatus,
};
use crate::router::Section;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Insert,
}

/// Active input field identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveField {
    #[default]
    None,
    Search,
    RgLookup,
    TenantEmail,
    TenantPhone,
    RedeemPoints,
    TicketSubject,
    TicketMessage,
    ProfileName,
    ProfileEmail,
    ProfilePhone,
}

/// Per-section load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Transient toast message shown in the footer until its deadline passes.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    pub expires_at: Instant,
}

pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Shared application state
#[derive(Debug, Default)]
pub struct State {
    // Cached per-section data
    pub dashboard: Option<DashboardSummary>,
    pub registrations: Vec<Registration>,
    pub rewards: Option<RewardsAccount>,
    pub referrals: Option<ReferralStats>,
    pub profile: Option<Profile>,

    // Transaction filter controls
    pub category_tab: Option<TxnCategory>,
    pub bucket_filter: Option<Bucket>,
    pub status_filter: Option<TxnStatus>,
    pub search_input: String,

    phases: HashMap<Section, LoadPhase>,

    // Input machinery
    pub input_mode: InputMode,
    pub active_field: ActiveField,
    pub selected_row: usize,

    // Edit records flow
    pub rg_lookup_input: String,
    pub edit_target: Option<Registration>,
    pub tenant_email_input: String,
    pub tenant_phone_input: String,

    // Rewards
    pub redeem_input: String,

    // Contact
    pub ticket_subject_input: String,
    pub ticket_message_input: String,

    // Profile
    pub profile_editing: bool,
    pub name_input: String,
    pub email_input: String,
    pub phone_input: String,

    // Reports
    pub report_kind: ReportKind,
    pub report_range: ReportRange,

    pub notice: Option<Notice>,
    pub show_help: bool,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, section: Section) -> LoadPhase {
        self.phases.get(&section).copied().unwrap_or_default()
    }

    pub fn set_phase(&mut self, section: Section, phase: LoadPhase) {
        self.phases.insert(section, phase);
    }

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>, now: Instant) {
        self.notice = Some(Notice {
            text: text.into(),
            level,
            expires_at: now + NOTICE_TTL,
        });
    }

    pub fn tick_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notice = None;
        }
    }

    /// The criteria the filter engine reads; an empty search imposes no
    /// constraint.
    pub fn criteria(&self) -> FilterCriteria {
        let term = self.search_input.trim();
        FilterCriteria {
            category: self.category_tab,
            status: self.status_filter,
            search: if term.is_empty() {
                None
            } else {
                Some(term.to_string())
            },
            date_span: None,
        }
    }

    pub fn cycle_category_tab(&mut self) {
        self.category_tab = match self.category_tab {
            None => Some(TxnCategory::Rent),
            Some(TxnCategory::Rent) => Some(TxnCategory::EducationFee),
            Some(TxnCategory::EducationFee) => Some(TxnCategory::Maintenance),
            Some(TxnCategory::Maintenance) => Some(TxnCategory::Other),
            Some(TxnCategory::Other) => None,
        };
        self.selected_row = 0;
    }

    pub fn cycle_bucket(&mut self) {
        self.bucket_filter = match self.bucket_filter {
            None => Some(Bucket::Upcoming),
            Some(Bucket::Upcoming) => Some(Bucket::History),
            Some(Bucket::History) => None,
        };
        self.selected_row = 0;
    }

    pub fn cycle_status_filter(&mut self) {
        self.status_filter = match self.status_filter {
            None => Some(TxnStatus::Upcoming),
            Some(TxnStatus::Upcoming) => Some(TxnStatus::Scheduled),
            Some(TxnStatus::Scheduled) => Some(TxnStatus::Paid),
            Some(TxnStatus::Paid) => Some(TxnStatus::Failed),
            Some(TxnStatus::Failed) => Some(TxnStatus::Completed),
            Some(TxnStatus::Completed) => Some(TxnStatus::Pending),
            Some(TxnStatus::Pending) => None,
        };
        self.selected_row = 0;
    }

    /// Back to the default view; runs whenever the transactions section is
    /// (re)loaded.
    pub fn reset_filters(&mut self) {
        self.category_tab = None;
        self.bucket_filter = None;
        self.status_filter = None;
        self.search_input.clear();
        self.selected_row = 0;
    }

    pub fn clear_inputs(&mut self) {
        self.search_input.clear();
        self.rg_lookup_input.clear();
        self.tenant_email_input.clear();
        self.tenant_phone_input.clear();
        self.redeem_input.clear();
        self.ticket_subject_input.clear();
        self.ticket_message_input.clear();
        self.name_input.clear();
        self.email_input.clear();
        self.phone_input.clear();
        self.edit_target = None;
        self.profile_editing = false;
        self.active_field = ActiveField::None;
        self.input_mode = InputMode::Normal;
    }

    /// Tab cycles through the fields a section's form actually has.
    pub fn cycle_field(&mut self, section: Section) {
        self.active_field = match (section, self.active_field) {
            (Section::EditRecords, ActiveField::TenantEmail) => ActiveField::TenantPhone,
            (Section::EditRecords, ActiveField::TenantPhone) => ActiveField::TenantEmail,
            (Section::Contact, ActiveField::TicketSubject) => ActiveField::TicketMessage,
            (Section::Contact, ActiveField::TicketMessage) => ActiveField::TicketSubject,
            (Section::Profile, ActiveField::ProfileName) => ActiveField::ProfileEmail,
            (Section::Profile, ActiveField::ProfileEmail) => ActiveField::ProfilePhone,
            (Section::Profile, ActiveField::ProfilePhone) => ActiveField::ProfileName,
            (_, field) => field,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_survives_until_its_deadline() {
        let mut state = State::new();
        let t0 = Instant::now();
        state.notify(NoticeLevel::Info, "saved", t0);

        state.tick_notice(t0 + Duration::from_secs(1));
        assert!(state.notice.is_some());

        state.tick_notice(t0 + NOTICE_TTL);
        assert!(state.notice.is_none());
    }

    #[test]
    fn a_newer_notice_replaces_the_old_one() {
        let mut state = State::new();
        let t0 = Instant::now();
        state.notify(NoticeLevel::Info, "first", t0);
        state.notify(NoticeLevel::Error, "second", t0 + Duration::from_secs(1));

        let notice = state.notice.as_ref().unwrap();
        assert_eq!(notice.text, "second");
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[test]
    fn reset_filters_returns_the_controls_to_defaults() {
        let mut state = State::new();
        state.cycle_category_tab();
        state.cycle_bucket();
        state.cycle_status_filter();
        state.search_input.push_str("rg-1");
        state.selected_row = 3;

        state.reset_filters();

        assert_eq!(state.category_tab, None);
        assert_eq!(state.bucket_filter, None);
        assert_eq!(state.status_filter, None);
        assert!(state.search_input.is_empty());
        assert_eq!(state.selected_row, 0);
        assert_eq!(state.criteria(), FilterCriteria::default());
    }

    #[test]
    fn category_tab_cycles_through_every_category_and_back() {
        let mut state = State::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            state.cycle_category_tab();
            seen.push(state.category_tab);
        }
        assert_eq!(
            seen,
            [
                Some(TxnCategory::Rent),
                Some(TxnCategory::EducationFee),
                Some(TxnCategory::Maintenance),
                Some(TxnCategory::Other),
                None,
            ]
        );
    }

    #[test]
    fn blank_search_imposes_no_constraint() {
        let mut state = State::new();
        state.search_input.push_str("   ");
        assert_eq!(state.criteria().search, None);
    }

    #[test]
    fn phases_default_to_idle() {
        let mut state = State::new();
        assert_eq!(state.phase(Section::Transactions), LoadPhase::Idle);
        state.set_phase(Section::Transactions, LoadPhase::Loaded);
        assert_eq!(state.phase(Section::Transactions), LoadPhase::Loaded);
    }
}
