use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::*;
use strum::IntoEnumIterator;

use crate::action::Action;
use crate::config::{self, UiConfig};
use crate::error::{AppError, Result};
use crate::filter::{self, FilterCriteria, FilterEngine, TxnColumn, export_csv, report_filename};
use crate::models::{Bucket, Profile, ReportKind, Transaction, TxnStatus};
use crate::router::{SETTLE_DELAY, Section, SectionRouter};
use crate::state::{ActiveField, InputMode, LoadPhase, NoticeLevel, State};
use crate::store::DataStore;
use crate::tui::{self, Tui};

/// Format a whole-rupee amount with Indian digit grouping
/// (e.g., 1234567 -> "12,34,567")
fn format_inr(amount: i64) -> String {
    let num = amount.to_string();
    let (sign, digits) = match num.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", num.as_str()),
    };
    if digits.len() <= 3 {
        return format!("{sign}{digits}");
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{sign}{},{tail}", groups.join(","))
}

/// Main application struct
pub struct App {
    store: DataStore,
    state: State,
    router: SectionRouter,
    engine: FilterEngine,
    config: UiConfig,
    should_quit: bool,
}

impl App {
    pub async fn new() -> Result<Self> {
        let store = DataStore::new()?;
        let config = UiConfig::load(Path::new(config::CONFIG_PATH));

        let mut router = SectionRouter::new(SETTLE_DELAY);
        for section in [
            Section::Dashboard,
            Section::Registrations,
            Section::Transactions,
            Section::Rewards,
            Section::Reports,
            Section::Referrals,
            Section::Profile,
        ] {
            router.register(section);
        }

        let mut app = Self {
            store,
            state: State::new(),
            router,
            engine: FilterEngine::new(),
            config,
            should_quit: false,
        };

        // The opening section loads without a transition
        app.load_section(Section::Dashboard).await?;
        app.state.set_phase(Section::Dashboard, LoadPhase::Loaded);

        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = tui::restore();
            original_hook(panic_info);
        }));

        let mut terminal = tui::init()?;
        let result = self.run_loop(&mut terminal).await;
        tui::restore()?;
        result
    }

    async fn run_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            self.draw(terminal)?;
            if let Some(action) = self.handle_events()? {
                self.update(action).await?;
            }
            self.tick().await;
        }
        Ok(())
    }

    async fn tick(&mut self) {
        let now = Instant::now();
        self.state.tick_notice(now);
        if let Some(section) = self.router.poll(now) {
            self.dispatch_load(section).await;
        }
    }

    async fn dispatch_load(&mut self, section: Section) {
        self.state.set_phase(section, LoadPhase::Loading);
        match self.load_section(section).await {
            Ok(()) => self.state.set_phase(section, LoadPhase::Loaded),
            Err(e) => {
                log::error!("loading {section} failed: {e}");
                self.notify(NoticeLevel::Error, format!("Could not load {section}: {e}"));
                self.state.set_phase(section, LoadPhase::Idle);
            }
        }
    }

    async fn load_section(&mut self, section: Section) -> Result<()> {
        match section {
            Section::Dashboard => {
                self.state.dashboard = Some(self.store.load_dashboard().await?);
            }
            Section::Registrations => {
                self.state.registrations = self.store.load_registrations().await?;
            }
            Section::Transactions => {
                self.engine.set_records(self.store.load_transactions().await?);
                self.state.reset_filters();
            }
            Section::Rewards => {
                self.state.rewards = Some(self.store.load_rewards().await?);
            }
            Section::Reports => {
                self.engine.set_records(self.store.load_transactions().await?);
            }
            Section::Referrals => {
                self.state.referrals = Some(self.store.load_referrals().await?);
            }
            Section::Profile => {
                self.state.profile = Some(self.store.load_profile().await?);
            }
            Section::EditRecords | Section::Contact => {}
        }
        Ok(())
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.state.notify(level, text, Instant::now());
    }

    fn navigate(&mut self, section: Section) {
        if self.router.activate(section, Instant::now()) {
            self.state.clear_inputs();
            self.state.selected_row = 0;
            if self.router.has_loader(section) {
                self.state.set_phase(section, LoadPhase::Loading);
            }
        }
    }

    /// The transaction rows the current filter controls let through.
    fn visible_transactions(&self, today: NaiveDate) -> Vec<&Transaction> {
        let criteria = self.state.criteria();
        let mut rows = self.engine.apply(&criteria);
        if let Some(bucket) = self.state.bucket_filter {
            rows.retain(|t| t.bucket(today) == bucket);
        }
        rows
    }

    fn report_rows(&self, today: NaiveDate) -> Vec<&Transaction> {
        let span = self.state.report_range.span(today);
        let criteria = FilterCriteria {
            date_span: Some(span),
            ..FilterCriteria::default()
        };
        let rows = self.engine.apply(&criteria);
        match self.state.report_kind {
            ReportKind::TransactionHistory => rows,
            ReportKind::UpcomingPayments => rows
                .into_iter()
                .filter(|t| t.bucket(today) == Bucket::Upcoming)
                .collect(),
        }
    }

    fn visible_rows_len(&self) -> usize {
        match self.router.current() {
            Section::Registrations => self.state.registrations.len(),
            Section::Transactions => {
                self.visible_transactions(Local::now().date_naive()).len()
            }
            Section::Rewards => self
                .state
                .rewards
                .as_ref()
                .map(|r| r.history.len())
                .unwrap_or(0),
            _ => 0,
        }
    }

    async fn export_report(&mut self) {
        if self.engine.records().is_empty() {
            match self.store.load_transactions().await {
                Ok(records) => self.engine.set_records(records),
                Err(e) => {
                    log::error!("could not load transactions for export: {e}");
                    self.notify(NoticeLevel::Error, format!("Export failed: {e}"));
                    return;
                }
            }
        }

        let today = Local::now().date_naive();
        let span = self.state.report_range.span(today);
        let rows = self.report_rows(today);
        let row_count = rows.len();
        let filename = report_filename(self.state.report_kind, &span);
        let outcome = export_csv(&rows, &TxnColumn::ALL)
            .and_then(|text| std::fs::write(&filename, text).map_err(AppError::from));

        match outcome {
            Ok(()) => self.notify(
                NoticeLevel::Success,
                format!("Exported {row_count} rows to {filename}"),
            ),
            Err(e) => {
                log::error!("report export failed: {e}");
                self.notify(NoticeLevel::Error, format!("Export failed: {e}"));
            }
        }
    }

    fn handle_events(&mut self) -> Result<Option<Action>> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(None);
                }

                if key.code == KeyCode::Char('q') && self.state.input_mode == InputMode::Normal {
                    return Ok(Some(Action::Quit));
                }

                if key.code == KeyCode::Char('?') && self.state.input_mode == InputMode::Normal {
                    return Ok(Some(Action::ToggleHelp));
                }

                match self.state.input_mode {
                    InputMode::Normal => return self.handle_normal_mode(key),
                    InputMode::Insert => return self.handle_insert_mode(key),
                }
            }
        }
        Ok(None)
    }

    fn handle_normal_mode(&mut self, key: event::KeyEvent) -> Result<Option<Action>> {
        let section = self.router.current();
        match key.code {
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    Ok(Some(Action::PrevSection))
                } else {
                    Ok(Some(Action::NextSection))
                }
            }
            KeyCode::BackTab => Ok(Some(Action::PrevSection)),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                Ok(Some(Action::GoToSection(Section::all()[index])))
            }
            KeyCode::Char('t') => Ok(Some(Action::ToggleTheme)),
            KeyCode::Up | KeyCode::Char('k') => Ok(Some(Action::Up)),
            KeyCode::Down | KeyCode::Char('j') => Ok(Some(Action::Down)),
            KeyCode::Esc => Ok(Some(Action::CancelInput)),
            KeyCode::Char('i') => {
                if section == Section::Profile && !self.state.profile_editing {
                    Ok(Some(Action::StartProfileEdit))
                } else {
                    Ok(Some(Action::EnterInsert))
                }
            }
            KeyCode::Char('/') if section == Section::Transactions => {
                Ok(Some(Action::StartSearch))
            }
            KeyCode::Char('c') if section == Section::Transactions => {
                Ok(Some(Action::CycleCategoryTab))
            }
            KeyCode::Char('b') if section == Section::Transactions => {
                Ok(Some(Action::CycleBucket))
            }
            KeyCode::Char('s') if section == Section::Transactions => {
                Ok(Some(Action::CycleStatusFilter))
            }
            KeyCode::Char('r') if section == Section::Reports => {
                Ok(Some(Action::CycleReportKind))
            }
            KeyCode::Char('d') if section == Section::Reports => {
                Ok(Some(Action::CycleReportRange))
            }
            KeyCode::Char('e') if section == Section::Reports => Ok(Some(Action::ExportReport)),
            KeyCode::Enter => Ok(self.submit_action()),
            _ => Ok(None),
        }
    }

    fn handle_insert_mode(&mut self, key: event::KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => Ok(Some(Action::EnterNormal)),
            KeyCode::Enter => Ok(self.submit_action().or(Some(Action::EnterNormal))),
            KeyCode::Tab => {
                self.state.cycle_field(self.router.current());
                Ok(None)
            }
            KeyCode::Char(c) => Ok(Some(Action::InputChar(c))),
            KeyCode::Backspace => Ok(Some(Action::InputBackspace)),
            _ => Ok(None),
        }
    }

    /// What Enter means on the current section.
    fn submit_action(&self) -> Option<Action> {
        match self.router.current() {
            Section::EditRecords => Some(if self.state.edit_target.is_none() {
                Action::LookupRegistration
            } else {
                Action::SaveTenant
            }),
            Section::Rewards => Some(Action::RedeemPoints),
            Section::Contact => Some(Action::SubmitTicket),
            Section::Profile => Some(if self.state.profile_editing {
                Action::SaveProfile
            } else {
                Action::StartProfileEdit
            }),
            Section::Reports => Some(Action::ExportReport),
            _ => None,
        }
    }

    async fn update(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ToggleHelp => {
                self.state.show_help = !self.state.show_help;
            }
            Action::ToggleTheme => {
                self.config.theme = self.config.theme.toggle();
                match self.config.save(Path::new(config::CONFIG_PATH)) {
                    Ok(()) => {
                        self.notify(
                            NoticeLevel::Info,
                            format!("Switched to the {} theme", self.config.theme),
                        );
                    }
                    Err(e) => {
                        log::error!("could not persist theme preference: {e}");
                        self.notify(NoticeLevel::Error, "Theme preference could not be saved");
                    }
                }
            }
            Action::NextSection => self.navigate(self.router.current().next()),
            Action::PrevSection => self.navigate(self.router.current().prev()),
            Action::GoToSection(section) => self.navigate(section),
            Action::Up => {
                if self.state.selected_row > 0 {
                    self.state.selected_row -= 1;
                }
            }
            Action::Down => {
                let max = self.visible_rows_len().saturating_sub(1);
                if self.state.selected_row < max {
                    self.state.selected_row += 1;
                }
            }
            Action::EnterInsert => {
                let field = match self.router.current() {
                    Section::Transactions => Some(ActiveField::Search),
                    Section::EditRecords => Some(if self.state.edit_target.is_none() {
                        ActiveField::RgLookup
                    } else {
                        ActiveField::TenantEmail
                    }),
                    Section::Rewards => Some(ActiveField::RedeemPoints),
                    Section::Contact => Some(ActiveField::TicketSubject),
                    Section::Profile if self.state.profile_editing => {
                        Some(ActiveField::ProfileName)
                    }
                    _ => None,
                };
                if let Some(field) = field {
                    self.state.input_mode = InputMode::Insert;
                    self.state.active_field = field;
                }
            }
            Action::EnterNormal => {
                self.state.input_mode = InputMode::Normal;
            }
            Action::CancelInput => {
                self.state.clear_inputs();
                if self.router.current() == Section::Transactions {
                    self.state.reset_filters();
                }
            }
            Action::InputChar(c) => match self.state.active_field {
                ActiveField::Search => {
                    self.state.search_input.push(c);
                    self.state.selected_row = 0;
                }
                ActiveField::RgLookup => self.state.rg_lookup_input.push(c),
                ActiveField::TenantEmail => self.state.tenant_email_input.push(c),
                ActiveField::TenantPhone => {
                    if c.is_ascii_digit() {
                        self.state.tenant_phone_input.push(c);
                    }
                }
                ActiveField::RedeemPoints => {
                    if c.is_ascii_digit() {
                        self.state.redeem_input.push(c);
                    }
                }
                ActiveField::TicketSubject => self.state.ticket_subject_input.push(c),
                ActiveField::TicketMessage => self.state.ticket_message_input.push(c),
                ActiveField::ProfileName => self.state.name_input.push(c),
                ActiveField::ProfileEmail => self.state.email_input.push(c),
                ActiveField::ProfilePhone => {
                    if c.is_ascii_digit() {
                        self.state.phone_input.push(c);
                    }
                }
                ActiveField::None => {}
            },
            Action::InputBackspace => match self.state.active_field {
                ActiveField::Search => {
                    self.state.search_input.pop();
                    self.state.selected_row = 0;
                }
                ActiveField::RgLookup => {
                    self.state.rg_lookup_input.pop();
                }
                ActiveField::TenantEmail => {
                    self.state.tenant_email_input.pop();
                }
                ActiveField::TenantPhone => {
                    self.state.tenant_phone_input.pop();
                }
                ActiveField::RedeemPoints => {
                    self.state.redeem_input.pop();
                }
                ActiveField::TicketSubject => {
                    self.state.ticket_subject_input.pop();
                }
                ActiveField::TicketMessage => {
                    self.state.ticket_message_input.pop();
                }
                ActiveField::ProfileName => {
                    self.state.name_input.pop();
                }
                ActiveField::ProfileEmail => {
                    self.state.email_input.pop();
                }
                ActiveField::ProfilePhone => {
                    self.state.phone_input.pop();
                }
                ActiveField::None => {}
            },
            Action::CycleCategoryTab => self.state.cycle_category_tab(),
            Action::CycleBucket => self.state.cycle_bucket(),
            Action::CycleStatusFilter => self.state.cycle_status_filter(),
            Action::StartSearch => {
                self.state.input_mode = InputMode::Insert;
                self.state.active_field = ActiveField::Search;
            }
            Action::CycleReportKind => {
                self.state.report_kind = self.state.report_kind.next();
            }
            Action::CycleReportRange => {
                self.state.report_range = self.state.report_range.next();
            }
            Action::ExportReport => self.export_report().await,
            Action::LookupRegistration => {
                let rg_id = self.state.rg_lookup_input.trim().to_string();
                if rg_id.is_empty() {
                    self.notify(NoticeLevel::Error, "Enter a registration id to edit");
                } else {
                    match self.store.find_registration(&rg_id).await {
                        Ok(registration) => {
                            self.state.tenant_email_input = registration.tenant_email.clone();
                            self.state.tenant_phone_input = registration.tenant_phone.clone();
                            self.notify(
                                NoticeLevel::Info,
                                format!("Editing tenant contact for {}", registration.id),
                            );
                            self.state.edit_target = Some(registration);
                            self.state.input_mode = InputMode::Insert;
                            self.state.active_field = ActiveField::TenantEmail;
                        }
                        Err(e) => {
                            log::warn!("registration lookup failed: {e}");
                            self.notify(NoticeLevel::Error, e.to_string());
                            self.state.edit_target = None;
                        }
                    }
                }
            }
            Action::SaveTenant => {
                if let Some(registration) = self.state.edit_target.clone() {
                    let email = self.state.tenant_email_input.trim().to_string();
                    let phone = self.state.tenant_phone_input.trim().to_string();
                    match self.store.update_tenant(&registration.id, &email, &phone).await {
                        Ok(()) => {
                            self.notify(
                                NoticeLevel::Success,
                                format!("Updated tenant contact for {}", registration.id),
                            );
                            self.state.clear_inputs();
                            // Keep the cached table in sync with the patch
                            self.state.registrations = self.store.load_registrations().await?;
                        }
                        Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
                    }
                }
            }
            Action::RedeemPoints => {
                match self.state.redeem_input.trim().parse::<i64>() {
                    Ok(points) => {
                        let today = Local::now().date_naive();
                        match self.store.redeem_points(points, today).await {
                            Ok(balance) => {
                                self.state.rewards = Some(self.store.load_rewards().await?);
                                self.notify(
                                    NoticeLevel::Success,
                                    format!("Redeemed {points} points, {balance} remaining"),
                                );
                                self.state.clear_inputs();
                            }
                            Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
                        }
                    }
                    Err(_) => {
                        self.notify(NoticeLevel::Error, "Enter how many points to redeem");
                    }
                }
            }
            Action::SubmitTicket => {
                let subject = self.state.ticket_subject_input.trim().to_string();
                let message = self.state.ticket_message_input.trim().to_string();
                match self.store.submit_ticket(&subject, &message).await {
                    Ok(reference) => {
                        self.notify(
                            NoticeLevel::Success,
                            format!("Ticket {reference} submitted, we will get back to you"),
                        );
                        self.state.clear_inputs();
                    }
                    Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
                }
            }
            Action::StartProfileEdit => {
                if let Some(profile) = &self.state.profile {
                    self.state.name_input = profile.name.clone();
                    self.state.email_input = profile.email.clone();
                    self.state.phone_input = profile.phone.clone();
                    self.state.profile_editing = true;
                    self.state.input_mode = InputMode::Insert;
                    self.state.active_field = ActiveField::ProfileName;
                }
            }
            Action::SaveProfile => {
                let profile = Profile {
                    name: self.state.name_input.trim().to_string(),
                    email: self.state.email_input.trim().to_string(),
                    phone: self.state.phone_input.trim().to_string(),
                };
                match self.store.save_profile(profile).await {
                    Ok(()) => {
                        self.state.profile = Some(self.store.load_profile().await?);
                        self.notify(NoticeLevel::Success, "Profile saved");
                        self.state.clear_inputs();
                    }
                    Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
                }
            }
        }
        Ok(())
    }

    fn draw(&mut self, terminal: &mut Tui) -> Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(0),
                    Constraint::Length(3),
                ])
                .split(area);

            self.draw_header(frame, layout[0]);
            self.draw_content(frame, layout[1]);
            self.draw_footer(frame, layout[2]);

            if self.state.show_help {
                self.draw_help_overlay(frame, area);
            }
        })?;
        Ok(())
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let current = self.router.current();
        let tabs: Vec<Line> = Section::all()
            .iter()
            .map(|s| {
                if *s == current {
                    Line::from(format!(" {s} ")).style(
                        Style::default()
                            .fg(pal.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Line::from(format!(" {s} "))
                }
            })
            .collect();

        let tabs_widget = Tabs::new(tabs)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" PayDash - Payments & Registrations "),
            )
            .select(current as usize)
            .highlight_style(Style::default().fg(pal.accent));

        frame.render_widget(tabs_widget, area);
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect) {
        let section = self.router.current();
        if self.router.has_loader(section) {
            match self.state.phase(section) {
                LoadPhase::Loading => {
                    let placeholder = Paragraph::new("Loading...").block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(format!(" {section} ")),
                    );
                    frame.render_widget(placeholder, area);
                    return;
                }
                LoadPhase::Idle => {
                    let placeholder = Paragraph::new("Nothing loaded for this view yet.").block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(format!(" {section} ")),
                    );
                    frame.render_widget(placeholder, area);
                    return;
                }
                LoadPhase::Loaded => {}
            }
        }

        match section {
            Section::Dashboard => self.draw_dashboard(frame, area),
            Section::Registrations => self.draw_registrations(frame, area),
            Section::Transactions => self.draw_transactions(frame, area),
            Section::EditRecords => self.draw_edit_records(frame, area),
            Section::Rewards => self.draw_rewards(frame, area),
            Section::Reports => self.draw_reports(frame, area),
            Section::Referrals => self.draw_referrals(frame, area),
            Section::Profile => self.draw_profile(frame, area),
            Section::Contact => self.draw_contact(frame, area),
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let Some(summary) = &self.state.dashboard else {
            log::debug!("dashboard drawn before its summary was loaded");
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let next_due = match &summary.next_due {
            Some((date, payee)) => format!("{date}  {payee}"),
            None => "nothing scheduled".to_string(),
        };
        let stats = vec![
            Line::from(vec![
                Span::styled("Active registrations: ", Style::default().fg(pal.muted)),
                Span::styled(
                    summary.active_registrations.to_string(),
                    Style::default().fg(pal.text).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Monthly outflow:      ", Style::default().fg(pal.muted)),
                Span::styled(
                    format!("INR {}", format_inr(summary.monthly_outflow)),
                    Style::default().fg(pal.negative),
                ),
            ]),
            Line::from(vec![
                Span::styled("Cash points:          ", Style::default().fg(pal.muted)),
                Span::styled(
                    format_inr(summary.cash_points),
                    Style::default().fg(pal.positive),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Next due:             ", Style::default().fg(pal.muted)),
                Span::styled(
                    next_due,
                    Style::default().fg(pal.accent).add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        let overview = Paragraph::new(stats)
            .block(Block::default().borders(Borders::ALL).title(" Overview "));
        frame.render_widget(overview, layout[0]);

        let hints = vec![
            Line::from("Tab / Shift+Tab  switch sections"),
            Line::from("1-9              jump to a section"),
            Line::from("t                light/dark theme"),
            Line::from("?                all key bindings"),
        ];
        let help = Paragraph::new(hints)
            .style(Style::default().fg(pal.muted))
            .block(Block::default().borders(Borders::ALL).title(" Getting Around "));
        frame.render_widget(help, layout[1]);
    }

    fn draw_registrations(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let header = Row::new(vec![
            "Id", "Category", "Payee", "Amount", "Frequency", "Next Due", "Status",
        ])
        .style(Style::default().fg(pal.muted).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .state
            .registrations
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let style = if i == self.state.selected_row {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    r.id.clone(),
                    r.category.to_string(),
                    r.payee.clone(),
                    format!("INR {:>9}", format_inr(r.amount)),
                    r.frequency.clone(),
                    r.next_due.to_string(),
                    r.status.to_string(),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Min(18),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths).header(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Registrations "),
        );
        frame.render_widget(table, area);
    }

    fn draw_transactions(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let today = Local::now().date_naive();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let option_label = |value: Option<String>| value.unwrap_or_else(|| "All".to_string());
        let search_display = if self.state.active_field == ActiveField::Search {
            format!("{}_", self.state.search_input)
        } else if self.state.search_input.is_empty() {
            "-".to_string()
        } else {
            self.state.search_input.clone()
        };
        let key_style = Style::default().fg(pal.accent);
        let filter_line = Line::from(vec![
            Span::styled("[c]ategory ", key_style),
            Span::raw(option_label(self.state.category_tab.map(|c| c.to_string()))),
            Span::raw("   "),
            Span::styled("[b]ucket ", key_style),
            Span::raw(option_label(self.state.bucket_filter.map(|b| b.to_string()))),
            Span::raw("   "),
            Span::styled("[s]tatus ", key_style),
            Span::raw(option_label(self.state.status_filter.map(|s| s.to_string()))),
            Span::raw("   "),
            Span::styled("[/] search ", key_style),
            Span::raw(search_display),
        ]);
        let filters = Paragraph::new(filter_line)
            .block(Block::default().borders(Borders::ALL).title(" Filters "));
        frame.render_widget(filters, layout[0]);

        let visible = self.visible_transactions(today);
        let totals = filter::aggregate(visible.iter().copied());
        let counts: Vec<String> = TxnStatus::iter()
            .filter_map(|s| {
                let count = totals.count(s);
                (count > 0).then(|| format!("{s} {count}"))
            })
            .collect();
        let summary_line = Line::from(vec![
            Span::styled(
                format!("{} records", visible.len()),
                Style::default().fg(pal.text).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(counts.join("  "), Style::default().fg(pal.muted)),
            Span::raw("   "),
            Span::styled(
                format!("Total INR {}", format_inr(totals.total_amount)),
                Style::default().fg(pal.accent),
            ),
        ]);
        let summary = Paragraph::new(summary_line)
            .block(Block::default().borders(Borders::ALL).title(" Totals "));
        frame.render_widget(summary, layout[1]);

        let header = Row::new(vec!["Id", "Category", "Amount", "Date", "Status"])
            .style(Style::default().fg(pal.muted).add_modifier(Modifier::BOLD));
        let rows: Vec<Row> = visible
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let status_style = match t.status {
                    TxnStatus::Failed => Style::default().fg(pal.negative),
                    TxnStatus::Paid | TxnStatus::Completed => Style::default().fg(pal.positive),
                    _ => Style::default().fg(pal.accent),
                };
                let row = Row::new(vec![
                    Cell::from(t.id.clone()),
                    Cell::from(t.category.to_string()),
                    Cell::from(format!("INR {:>9}", format_inr(t.amount))),
                    Cell::from(t.date.to_string()),
                    Cell::from(t.status.to_string()).style(status_style),
                ]);
                if i == self.state.selected_row {
                    row.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    row
                }
            })
            .collect();

        let widths = [
            Constraint::Length(9),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(11),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths).header(header).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Transactions "),
        );
        frame.render_widget(table, layout[2]);
    }

    fn draw_edit_records(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        match &self.state.edit_target {
            None => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(" Edit Records ");
                let inner = block.inner(area);
                frame.render_widget(block, area);

                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([Constraint::Length(3), Constraint::Min(0)])
                    .split(inner);

                let input_style = if self.state.active_field == ActiveField::RgLookup {
                    Style::default().fg(pal.accent)
                } else {
                    Style::default()
                };
                let lookup = Paragraph::new(self.state.rg_lookup_input.as_str())
                    .style(input_style)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(" Registration Id "),
                    );
                frame.render_widget(lookup, layout[0]);

                let instructions =
                    Paragraph::new("Press i to type an id (e.g. RG-2041), Enter to look it up")
                        .style(Style::default().fg(pal.muted));
                frame.render_widget(instructions, layout[1]);
            }
            Some(registration) => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Edit {} ({}) ", registration.id, registration.payee));
                let inner = block.inner(area);
                frame.render_widget(block, area);

                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Length(3),
                        Constraint::Min(0),
                    ])
                    .split(inner);

                let email_style = if self.state.active_field == ActiveField::TenantEmail {
                    Style::default().fg(pal.accent)
                } else {
                    Style::default()
                };
                let email = Paragraph::new(self.state.tenant_email_input.as_str())
                    .style(email_style)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(" Tenant Email "),
                    );
                frame.render_widget(email, layout[0]);

                let phone_style = if self.state.active_field == ActiveField::TenantPhone {
                    Style::default().fg(pal.accent)
                } else {
                    Style::default()
                };
                let phone = Paragraph::new(self.state.tenant_phone_input.as_str())
                    .style(phone_style)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title(" Tenant Phone "),
                    );
                frame.render_widget(phone, layout[1]);

                let instructions =
                    Paragraph::new("Tab: switch fields | Enter: save | Esc: back to lookup")
                        .style(Style::default().fg(pal.muted));
                frame.render_widget(instructions, layout[2]);
            }
        }
    }

    fn draw_rewards(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let Some(rewards) = &self.state.rewards else {
            log::debug!("rewards drawn before the account was loaded");
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let stats = vec![
            Line::from(vec![
                Span::styled("Cash points balance: ", Style::default().fg(pal.muted)),
                Span::styled(
                    format_inr(rewards.balance),
                    Style::default().fg(pal.accent).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Lifetime earned:     ", Style::default().fg(pal.muted)),
                Span::styled(
                    format_inr(rewards.lifetime_earned),
                    Style::default().fg(pal.positive),
                ),
            ]),
        ];
        let balance = Paragraph::new(stats)
            .block(Block::default().borders(Borders::ALL).title(" Rewards "));
        frame.render_widget(balance, layout[0]);

        let input_style = if self.state.active_field == ActiveField::RedeemPoints {
            Style::default().fg(pal.accent)
        } else {
            Style::default()
        };
        let redeem = Paragraph::new(self.state.redeem_input.as_str())
            .style(input_style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Redeem Points (multiples of 100) "),
            );
        frame.render_widget(redeem, layout[1]);

        let items: Vec<ListItem> = rewards
            .history
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if i == self.state.selected_row {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:>6} pts", format_inr(entry.points)),
                        Style::default().fg(pal.accent),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<32}", entry.note),
                        Style::default().fg(pal.text),
                    ),
                    Span::styled(entry.date.to_string(), Style::default().fg(pal.muted)),
                ]))
                .style(style)
            })
            .collect();
        let history = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Redemption History "),
        );
        frame.render_widget(history, layout[2]);
    }

    fn draw_reports(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let today = Local::now().date_naive();
        let span = self.state.report_range.span(today);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let controls = vec![
            Line::from(vec![
                Span::styled("[r]eport ", Style::default().fg(pal.accent)),
                Span::raw(self.state.report_kind.to_string()),
            ]),
            Line::from(vec![
                Span::styled("[d]ate range ", Style::default().fg(pal.accent)),
                Span::raw(format!(
                    "{}  ({} to {})",
                    self.state.report_range, span.start, span.end
                )),
            ]),
        ];
        let controls_widget = Paragraph::new(controls)
            .block(Block::default().borders(Borders::ALL).title(" Reports "));
        frame.render_widget(controls_widget, layout[0]);

        let rows = self.report_rows(today);
        let totals = filter::aggregate(rows.iter().copied());
        let preview = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} records", rows.len()),
                Style::default().fg(pal.text).add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("Total INR {}", format_inr(totals.total_amount)),
                Style::default().fg(pal.accent),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL).title(" Preview "));
        frame.render_widget(preview, layout[1]);

        let instructions = Paragraph::new("Press e to export the CSV next to the binary")
            .style(Style::default().fg(pal.muted));
        frame.render_widget(instructions, layout[2]);
    }

    fn draw_referrals(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let Some(stats) = &self.state.referrals else {
            log::debug!("referrals drawn before the stats were loaded");
            return;
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Referral code:       ", Style::default().fg(pal.muted)),
                Span::styled(
                    stats.code.clone(),
                    Style::default().fg(pal.accent).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Friends invited:     ", Style::default().fg(pal.muted)),
                Span::styled(stats.invited.to_string(), Style::default().fg(pal.text)),
            ]),
            Line::from(vec![
                Span::styled("Points per referral: ", Style::default().fg(pal.muted)),
                Span::styled(
                    format_inr(stats.points_per_referral),
                    Style::default().fg(pal.positive),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Share message:",
                Style::default().fg(pal.muted),
            )),
            Line::from(Span::styled(
                stats.share_message.clone(),
                Style::default().fg(pal.text),
            )),
        ];
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Referrals "));
        frame.render_widget(widget, area);
    }

    fn draw_profile(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();

        if !self.state.profile_editing {
            let Some(profile) = &self.state.profile else {
                log::debug!("profile drawn before it was loaded");
                return;
            };
            let lines = vec![
                Line::from(vec![
                    Span::styled("Name:  ", Style::default().fg(pal.muted)),
                    Span::styled(profile.name.clone(), Style::default().fg(pal.text)),
                ]),
                Line::from(vec![
                    Span::styled("Email: ", Style::default().fg(pal.muted)),
                    Span::styled(profile.email.clone(), Style::default().fg(pal.text)),
                ]),
                Line::from(vec![
                    Span::styled("Phone: ", Style::default().fg(pal.muted)),
                    Span::styled(profile.phone.clone(), Style::default().fg(pal.text)),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    "Press i to edit",
                    Style::default().fg(pal.muted),
                )),
            ];
            let widget = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(" Profile "));
            frame.render_widget(widget, area);
            return;
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Edit Profile ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(inner);

        let field_style = |field: ActiveField| {
            if self.state.active_field == field {
                Style::default().fg(pal.accent)
            } else {
                Style::default()
            }
        };
        let name = Paragraph::new(self.state.name_input.as_str())
            .style(field_style(ActiveField::ProfileName))
            .block(Block::default().borders(Borders::ALL).title(" Name "));
        frame.render_widget(name, layout[0]);

        let email = Paragraph::new(self.state.email_input.as_str())
            .style(field_style(ActiveField::ProfileEmail))
            .block(Block::default().borders(Borders::ALL).title(" Email "));
        frame.render_widget(email, layout[1]);

        let phone = Paragraph::new(self.state.phone_input.as_str())
            .style(field_style(ActiveField::ProfilePhone))
            .block(Block::default().borders(Borders::ALL).title(" Phone "));
        frame.render_widget(phone, layout[2]);

        let instructions = Paragraph::new("Tab: switch fields | Enter: save | Esc: discard")
            .style(Style::default().fg(pal.muted));
        frame.render_widget(instructions, layout[3]);
    }

    fn draw_contact(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Contact Support ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(0),
            ])
            .split(inner);

        let subject_style = if self.state.active_field == ActiveField::TicketSubject {
            Style::default().fg(pal.accent)
        } else {
            Style::default()
        };
        let subject = Paragraph::new(self.state.ticket_subject_input.as_str())
            .style(subject_style)
            .block(Block::default().borders(Borders::ALL).title(" Subject "));
        frame.render_widget(subject, layout[0]);

        let message_style = if self.state.active_field == ActiveField::TicketMessage {
            Style::default().fg(pal.accent)
        } else {
            Style::default()
        };
        let message = Paragraph::new(self.state.ticket_message_input.as_str())
            .style(message_style)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Message "));
        frame.render_widget(message, layout[1]);

        let instructions = Paragraph::new("i: type | Tab: switch fields | Enter: submit ticket")
            .style(Style::default().fg(pal.muted));
        frame.render_widget(instructions, layout[2]);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let mode_str = match self.state.input_mode {
            InputMode::Normal => "NORMAL",
            InputMode::Insert => "INSERT",
        };

        let (notice_text, notice_style) = match &self.state.notice {
            Some(notice) => (
                notice.text.clone(),
                Style::default().fg(match notice.level {
                    NoticeLevel::Info => pal.text,
                    NoticeLevel::Success => pal.positive,
                    NoticeLevel::Error => pal.negative,
                }),
            ),
            None => ("Ready".to_string(), Style::default().fg(pal.muted)),
        };

        let footer_text = Line::from(vec![
            Span::styled(
                format!(" {} ", mode_str),
                Style::default()
                    .bg(pal.badge_bg)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(notice_text, notice_style),
            Span::raw(" | "),
            Span::styled("? for Help", Style::default().fg(pal.muted)),
        ]);

        let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, area);
    }

    fn draw_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let pal = self.config.theme.palette();
        let help_text = vec![
            Line::from("Navigation:"),
            Line::from("  Tab/Shift+Tab  Switch sections"),
            Line::from("  1-9            Jump to a section"),
            Line::from("  Up/Down        Navigate lists"),
            Line::from(""),
            Line::from("Transactions:"),
            Line::from("  c / b / s      Cycle category, bucket, status"),
            Line::from("  /              Search by id or category"),
            Line::from("  Esc            Reset filters"),
            Line::from(""),
            Line::from("Reports:"),
            Line::from("  r / d          Cycle report kind, date range"),
            Line::from("  e              Export CSV"),
            Line::from(""),
            Line::from("Forms:"),
            Line::from("  i              Enter insert mode"),
            Line::from("  Tab            Switch fields"),
            Line::from("  Enter          Submit"),
            Line::from("  Esc            Exit insert mode"),
            Line::from(""),
            Line::from("General:"),
            Line::from("  t              Toggle light/dark theme"),
            Line::from("  ?              Toggle help"),
            Line::from("  q              Quit application"),
        ];

        let help_block = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Help ")
                    .style(Style::default().bg(pal.overlay_bg)),
            )
            .alignment(Alignment::Left);

        let popup_area = centered_rect(50, 70, area);
        frame.render_widget(Clear, popup_area);
        frame.render_widget(help_block, popup_area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inr_grouping_is_three_then_two() {
        assert_eq!(format_inr(0), "0");
        assert_eq!(format_inr(999), "999");
        assert_eq!(format_inr(14000), "14,000");
        assert_eq!(format_inr(123456), "1,23,456");
        assert_eq!(format_inr(1234567), "12,34,567");
        assert_eq!(format_inr(-52000), "-52,000");
    }

    #[tokio::test]
    async fn filter_state_resets_when_transactions_reload() {
        let mut app = App::new().await.unwrap();

        app.load_section(Section::Transactions).await.unwrap();
        app.state.cycle_category_tab();
        app.state.search_input.push_str("rg-2041");
        assert_ne!(app.state.criteria(), FilterCriteria::default());

        app.load_section(Section::Transactions).await.unwrap();
        assert_eq!(app.state.criteria(), FilterCriteria::default());
        assert!(!app.engine.records().is_empty());
    }

    #[tokio::test]
    async fn report_rows_respect_kind_and_range() {
        let mut app = App::new().await.unwrap();
        app.load_section(Section::Reports).await.unwrap();

        let today: NaiveDate = "2025-08-04".parse().unwrap();
        app.state.report_range = crate::models::ReportRange::YearToDate;

        app.state.report_kind = ReportKind::TransactionHistory;
        let history = app.report_rows(today);
        assert!(!history.is_empty());
        assert!(history.iter().all(|t| t.date <= today));

        app.state.report_kind = ReportKind::UpcomingPayments;
        let upcoming = app.report_rows(today);
        assert!(upcoming.iter().all(|t| t.bucket(today) == Bucket::Upcoming));
    }
}
