use std::collections::HashSet;
use std::time::{Duration, Instant};

use strum::{Display, EnumIter, IntoEnumIterator};

/// Visual settle time between deactivating one section and loading the next.
pub const SETTLE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
pub enum Section {
    #[default]
    Dashboard,
    Registrations,
    Transactions,
    #[strum(serialize = "Edit Records")]
    EditRecords,
    Rewards,
    Reports,
    Referrals,
    Profile,
    Contact,
}

impl Section {
    pub fn next(&self) -> Self {
        match self {
            Self::Dashboard => Self::Registrations,
            Self::Registrations => Self::Transactions,
            Self::Transactions => Self::EditRecords,
            Self::EditRecords => Self::Rewards,
            Self::Rewards => Self::Reports,
            Self::Reports => Self::Referrals,
            Self::Referrals => Self::Profile,
            Self::Profile => Self::Contact,
            Self::Contact => Self::Dashboard,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Self::Dashboard => Self::Contact,
            Self::Registrations => Self::Dashboard,
            Self::Transactions => Self::Registrations,
            Self::EditRecords => Self::Transactions,
            Self::Rewards => Self::EditRecords,
            Self::Reports => Self::Rewards,
            Self::Referrals => Self::Reports,
            Self::Profile => Self::Referrals,
            Self::Contact => Self::Profile,
        }
    }

    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    section: Section,
    due_at: Instant,
}

/// Tracks the single active section and schedules at most one load dispatch
/// per transition. Clocked by the event loop's tick; it owns no timers.
#[derive(Debug)]
pub struct SectionRouter {
    current: Section,
    loaders: HashSet<Section>,
    pending: Option<PendingLoad>,
    settle: Duration,
}

impl SectionRouter {
    pub fn new(settle: Duration) -> Self {
        Self {
            current: Section::Dashboard,
            loaders: HashSet::new(),
            pending: None,
            settle,
        }
    }

    pub fn current(&self) -> Section {
        self.current
    }

    /// Marks a section as having a data loader behind it.
    pub fn register(&mut self, section: Section) {
        self.loaders.insert(section);
    }

    pub fn has_loader(&self, section: Section) -> bool {
        self.loaders.contains(&section)
    }

    /// Switches the active section. Activating the already-active section is
    /// a no-op and never re-triggers an in-flight transition. Any pending load
    /// is replaced, so the last activation wins. Navigation to a section with
    /// no loader still succeeds; nothing is scheduled.
    pub fn activate(&mut self, section: Section, now: Instant) -> bool {
        if section == self.current {
            return false;
        }
        self.current = section;
        self.pending = if self.loaders.contains(&section) {
            Some(PendingLoad {
                section,
                due_at: now + self.settle,
            })
        } else {
            log::debug!("no loader registered for {section}, navigation only");
            None
        };
        true
    }

    /// Returns the pending section once its settle deadline has passed,
    /// clearing it so each activation dispatches at most once.
    pub fn poll(&mut self, now: Instant) -> Option<Section> {
        if self.pending.is_some_and(|p| now >= p.due_at) {
            return self.pending.take().map(|p| p.section);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(250);

    fn router() -> SectionRouter {
        let mut router = SectionRouter::new(SETTLE);
        router.register(Section::Transactions);
        router.register(Section::Reports);
        router
    }

    #[test]
    fn repeated_activation_dispatches_exactly_once() {
        let mut router = router();
        let t0 = Instant::now();

        assert!(router.activate(Section::Reports, t0));
        assert!(!router.activate(Section::Reports, t0));

        assert_eq!(router.poll(t0 + SETTLE), Some(Section::Reports));
        assert_eq!(router.poll(t0 + SETTLE * 4), None);
    }

    #[test]
    fn nothing_dispatches_before_the_settle_deadline() {
        let mut router = router();
        let t0 = Instant::now();

        router.activate(Section::Transactions, t0);
        assert_eq!(router.poll(t0), None);
        assert_eq!(router.poll(t0 + SETTLE / 2), None);
        assert_eq!(router.poll(t0 + SETTLE), Some(Section::Transactions));
    }

    #[test]
    fn sections_without_a_loader_navigate_silently() {
        let mut router = router();
        let t0 = Instant::now();

        assert!(router.activate(Section::Contact, t0));
        assert_eq!(router.current(), Section::Contact);
        assert_eq!(router.poll(t0 + SETTLE * 4), None);
    }

    #[test]
    fn a_newer_activation_supersedes_the_pending_load() {
        let mut router = router();
        let t0 = Instant::now();

        router.activate(Section::Transactions, t0);
        router.activate(Section::Reports, t0 + Duration::from_millis(10));

        assert_eq!(router.poll(t0 + SETTLE * 4), Some(Section::Reports));
        assert_eq!(router.poll(t0 + SETTLE * 8), None);
    }

    #[test]
    fn navigating_to_an_unloaded_section_clears_the_pending_load() {
        let mut router = router();
        let t0 = Instant::now();

        router.activate(Section::Transactions, t0);
        router.activate(Section::Contact, t0 + Duration::from_millis(10));

        assert_eq!(router.poll(t0 + SETTLE * 4), None);
    }

    #[test]
    fn next_and_prev_walk_the_full_cycle() {
        let mut section = Section::Dashboard;
        for _ in 0..Section::all().len() {
            section = section.next();
        }
        assert_eq!(section, Section::Dashboard);
        assert_eq!(Section::Dashboard.prev(), Section::Contact);
    }
}
