use crate::router::Section;

/// Application actions representing all possible state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    ToggleTheme,

    // Navigation
    NextSection,
    PrevSection,
    GoToSection(Section),
    Up,
    Down,

    // Input modes
    EnterInsert,
    EnterNormal,
    CancelInput,
    InputChar(char),
    InputBackspace,

    // Transaction filters
    CycleCategoryTab,
    CycleBucket,
    CycleStatusFilter,
    StartSearch,

    // Reports
    CycleReportKind,
    CycleReportRange,
    ExportReport,

    // Section submits
    LookupRegistration,
    SaveTenant,
    RedeemPoints,
    SubmitTicket,
    StartProfileEdit,
    SaveProfile,
}
