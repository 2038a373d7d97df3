use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use garrison_gate::api::{
    ApiCall, ApiError, ApiReply, Completion, Dispatch, Dispatcher, Ticket, WorkflowKind,
};
use garrison_gate::cnic;
use garrison_gate::config::GateConfig;
use garrison_gate::entities::{GuestVisit, MasterEntry, Operator, Person};
use garrison_gate::form::Form;
use garrison_gate::modal::{
    CheckoutModal, CheckoutTarget, Effects, FamilyMemberModal, GuestCheckoutModal,
    GuestRegistrationModal, KeyInput, MasterCheckoutModal, MasterEntryModal, Modal, ModalCore,
    OperatorModal, OperatorMode, PersonRegistrationModal, Phase, RefreshHook, RefreshTarget,
};
use garrison_gate::notify::{Level, Notification, Toasts};

/// How long the loop waits for input before checking replies and timers
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const DASHBOARD_TICKET: Ticket = Ticket {
    workflow: WorkflowKind::Dashboard,
    generation: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Guests,
    MasterEntries,
    People,
    Operators,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Guests => Page::MasterEntries,
            Page::MasterEntries => Page::People,
            Page::People => Page::Operators,
            Page::Operators => Page::Guests,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Guests => Page::Operators,
            Page::MasterEntries => Page::Guests,
            Page::People => Page::MasterEntries,
            Page::Operators => Page::People,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Guests => "Guests",
            Page::MasterEntries => "Master Entries",
            Page::People => "People",
            Page::Operators => "Operators",
        }
    }
}

fn refresh_call(target: RefreshTarget) -> ApiCall {
    match target {
        RefreshTarget::Guests => ApiCall::CheckedInGuests,
        RefreshTarget::MasterEntries => ApiCall::CheckedInMasterEntries,
        RefreshTarget::People => ApiCall::People,
        RefreshTarget::Operators => ApiCall::Operators,
    }
}

const ALL_TARGETS: [RefreshTarget; 4] = [
    RefreshTarget::Guests,
    RefreshTarget::MasterEntries,
    RefreshTarget::People,
    RefreshTarget::Operators,
];

pub struct App {
    pub current_page: Page,
    pub guests: Vec<GuestVisit>,
    pub guests_state: TableState,
    pub entries: Vec<MasterEntry>,
    pub entries_state: TableState,
    pub people: Vec<Person>,
    pub people_state: TableState,
    pub operators: Vec<Operator>,
    pub operators_state: TableState,
    pub operator_selection: BTreeSet<i64>,
    /// Last dashboard load failure, shown in the status bar
    pub load_error: Option<String>,

    pub guest_checkout: GuestCheckoutModal,
    pub master_checkout: MasterCheckoutModal,
    pub family_member: FamilyMemberModal,
    pub operator: OperatorModal,
    pub guest_registration: GuestRegistrationModal,
    pub master_entry: MasterEntryModal,
    pub person_registration: PersonRegistrationModal,
    active: Option<WorkflowKind>,

    pub toasts: Toasts,
    /// Views the refresh hooks asked for, drained after every event
    refresh_queue: Rc<RefCell<Vec<RefreshTarget>>>,
    /// Fallback full reload, when no hook is wired
    reload_at: Option<Instant>,
    /// Where the open modal was last drawn, for outside-click detection
    modal_area: Option<Rect>,
}

impl App {
    pub fn new(config: &GateConfig) -> Self {
        let refresh_queue: Rc<RefCell<Vec<RefreshTarget>>> = Rc::new(RefCell::new(Vec::new()));

        let core = |kind: WorkflowKind| {
            let core = ModalCore::new(kind).with_reload_delay(config.reload_delay);
            if config.partial_refresh {
                let queue = Rc::clone(&refresh_queue);
                let hook: RefreshHook = Box::new(move |target| queue.borrow_mut().push(target));
                core.with_refresh(hook)
            } else {
                core
            }
        };

        App {
            current_page: Page::Guests,
            guests: Vec::new(),
            guests_state: TableState::default(),
            entries: Vec::new(),
            entries_state: TableState::default(),
            people: Vec::new(),
            people_state: TableState::default(),
            operators: Vec::new(),
            operators_state: TableState::default(),
            operator_selection: BTreeSet::new(),
            load_error: None,
            guest_checkout: CheckoutModal::new(core(WorkflowKind::GuestCheckout)),
            master_checkout: CheckoutModal::new(core(WorkflowKind::MasterCheckout)),
            family_member: FamilyMemberModal::new(core(WorkflowKind::FamilyMember)),
            operator: OperatorModal::new(core(WorkflowKind::Operator)),
            guest_registration: GuestRegistrationModal::new(core(WorkflowKind::GuestRegistration)),
            master_entry: MasterEntryModal::new(core(WorkflowKind::MasterEntry)),
            person_registration: PersonRegistrationModal::new(core(WorkflowKind::PersonRegistration)),
            active: None,
            toasts: Toasts::default(),
            refresh_queue,
            reload_at: None,
            modal_area: None,
        }
    }

    /// Fetch every dashboard list
    pub fn reload_all(&self) -> Vec<Dispatch> {
        ALL_TARGETS
            .iter()
            .map(|&target| Dispatch {
                ticket: DASHBOARD_TICKET,
                call: refresh_call(target),
            })
            .collect()
    }

    pub fn active(&self) -> Option<WorkflowKind> {
        self.active
    }

    fn modal(&self, kind: WorkflowKind) -> Option<&dyn Modal> {
        let modal: &dyn Modal = match kind {
            WorkflowKind::Dashboard => return None,
            WorkflowKind::GuestCheckout => &self.guest_checkout,
            WorkflowKind::MasterCheckout => &self.master_checkout,
            WorkflowKind::FamilyMember => &self.family_member,
            WorkflowKind::Operator => &self.operator,
            WorkflowKind::GuestRegistration => &self.guest_registration,
            WorkflowKind::MasterEntry => &self.master_entry,
            WorkflowKind::PersonRegistration => &self.person_registration,
        };
        Some(modal)
    }

    fn modal_mut(&mut self, kind: WorkflowKind) -> Option<&mut dyn Modal> {
        let modal: &mut dyn Modal = match kind {
            WorkflowKind::Dashboard => return None,
            WorkflowKind::GuestCheckout => &mut self.guest_checkout,
            WorkflowKind::MasterCheckout => &mut self.master_checkout,
            WorkflowKind::FamilyMember => &mut self.family_member,
            WorkflowKind::Operator => &mut self.operator,
            WorkflowKind::GuestRegistration => &mut self.guest_registration,
            WorkflowKind::MasterEntry => &mut self.master_entry,
            WorkflowKind::PersonRegistration => &mut self.person_registration,
        };
        Some(modal)
    }

    /// Turn controller effects into dispatches, toasts and refreshes
    fn apply(&mut self, effects: Effects) -> Vec<Dispatch> {
        let Effects {
            mut dispatches,
            notices,
            reload_after,
        } = effects;

        self.toasts.extend(notices, Instant::now());
        if let Some(delay) = reload_after {
            self.reload_at = Some(Instant::now() + delay);
        }

        let targets: Vec<RefreshTarget> = self.refresh_queue.borrow_mut().drain(..).collect();
        dispatches.extend(targets.into_iter().map(|target| Dispatch {
            ticket: DASHBOARD_TICKET,
            call: refresh_call(target),
        }));

        // A modal that closed itself is no longer active
        if let Some(kind) = self.active {
            if !self.modal(kind).map_or(false, |m| m.is_open()) {
                self.active = None;
                self.modal_area = None;
            }
        }
        dispatches
    }

    fn open(&mut self, kind: WorkflowKind, effects: Effects) -> Vec<Dispatch> {
        self.active = Some(kind);
        self.apply(effects)
    }

    pub fn notify(&mut self, notification: Notification) {
        self.toasts.push(notification, Instant::now());
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    /// Handle one key. Returns the calls to send and whether to quit.
    pub fn handle_key(&mut self, key: KeyInput) -> (Vec<Dispatch>, bool) {
        if let Some(kind) = self.active {
            let effects = match self.modal_mut(kind) {
                Some(modal) => modal.handle_key(key),
                None => Effects::none(),
            };
            return (self.apply(effects), false);
        }

        let dispatches = match key {
            KeyInput::Char('q') | KeyInput::Esc => return (Vec::new(), true),
            KeyInput::Tab => {
                self.current_page = self.current_page.next();
                Vec::new()
            }
            KeyInput::BackTab => {
                self.current_page = self.current_page.previous();
                Vec::new()
            }
            KeyInput::Down | KeyInput::Char('j') => {
                self.move_selection(true);
                Vec::new()
            }
            KeyInput::Up | KeyInput::Char('k') => {
                self.move_selection(false);
                Vec::new()
            }
            KeyInput::Char('r') => self.reload_all(),
            KeyInput::Char('x') => {
                self.toasts.dismiss();
                Vec::new()
            }
            key => self.page_action(key),
        };
        (dispatches, false)
    }

    fn page_action(&mut self, key: KeyInput) -> Vec<Dispatch> {
        match (self.current_page, key) {
            (Page::Guests, KeyInput::Char('a')) => {
                let effects = self.guest_registration.open();
                self.open(WorkflowKind::GuestRegistration, effects)
            }
            (Page::Guests, KeyInput::Char('c')) => {
                let effects = self.guest_checkout.open();
                self.open(WorkflowKind::GuestCheckout, effects)
            }
            (Page::MasterEntries, KeyInput::Char('a')) => {
                let effects = self.master_entry.open();
                self.open(WorkflowKind::MasterEntry, effects)
            }
            (Page::MasterEntries, KeyInput::Char('c')) => {
                let effects = self.master_checkout.open();
                self.open(WorkflowKind::MasterCheckout, effects)
            }
            (Page::People, KeyInput::Char('a')) => {
                let effects = self.person_registration.open();
                self.open(WorkflowKind::PersonRegistration, effects)
            }
            (Page::People, KeyInput::Char('f')) => {
                let host = self
                    .people_state
                    .selected()
                    .and_then(|i| self.people.get(i))
                    .map(|p| p.id);
                match host {
                    Some(id) => {
                        let effects = self.family_member.open(id);
                        self.open(WorkflowKind::FamilyMember, effects)
                    }
                    None => {
                        self.notify(Notification::info("Select a host person first"));
                        Vec::new()
                    }
                }
            }
            (Page::Operators, KeyInput::Char('e')) => {
                let selected = self
                    .operators_state
                    .selected()
                    .and_then(|i| self.operators.get(i))
                    .cloned();
                match selected {
                    Some(op) => {
                        let effects = self.operator.open_edit(&op);
                        self.open(WorkflowKind::Operator, effects)
                    }
                    None => Vec::new(),
                }
            }
            (Page::Operators, KeyInput::Char(' ')) => {
                if let Some(op) = self.operators_state.selected().and_then(|i| self.operators.get(i)) {
                    if !self.operator_selection.remove(&op.id) {
                        self.operator_selection.insert(op.id);
                    }
                }
                Vec::new()
            }
            (Page::Operators, KeyInput::Char('d')) => {
                let ids: Vec<i64> = self.operator_selection.iter().copied().collect();
                let effects = self.operator.open_delete(ids);
                self.open(WorkflowKind::Operator, effects)
            }
            _ => Vec::new(),
        }
    }

    fn current_table(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Guests => (&mut self.guests_state, self.guests.len()),
            Page::MasterEntries => (&mut self.entries_state, self.entries.len()),
            Page::People => (&mut self.people_state, self.people.len()),
            Page::Operators => (&mut self.operators_state, self.operators.len()),
        }
    }

    fn move_selection(&mut self, down: bool) {
        let (state, len) = self.current_table();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if down => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    /// A click outside the open modal closes it
    pub fn handle_click(&mut self, column: u16, row: u16) {
        let (Some(kind), Some(area)) = (self.active, self.modal_area) else {
            return;
        };
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        if !inside {
            if let Some(modal) = self.modal_mut(kind) {
                modal.close();
            }
            self.active = None;
            self.modal_area = None;
        }
    }

    // ========================================================================
    // REPLIES AND TIMERS
    // ========================================================================

    pub fn on_completion(&mut self, completion: Completion) -> Vec<Dispatch> {
        let Completion { ticket, result } = completion;
        if ticket.workflow == WorkflowKind::Dashboard {
            self.on_dashboard_reply(result);
            return Vec::new();
        }
        let effects = match self.modal_mut(ticket.workflow) {
            Some(modal) => modal.on_reply(ticket, result),
            None => Effects::none(),
        };
        self.apply(effects)
    }

    fn on_dashboard_reply(&mut self, result: Result<ApiReply, ApiError>) {
        match result {
            Ok(ApiReply::CheckedInGuests(guests)) => {
                self.guests = guests;
                clamp(&mut self.guests_state, self.guests.len());
            }
            Ok(ApiReply::CheckedInMasterEntries(entries)) => {
                self.entries = entries;
                clamp(&mut self.entries_state, self.entries.len());
            }
            Ok(ApiReply::People(people)) => {
                self.people = people;
                clamp(&mut self.people_state, self.people.len());
            }
            Ok(ApiReply::Operators(operators)) => {
                let ids: BTreeSet<i64> = operators.iter().map(|o| o.id).collect();
                self.operator_selection.retain(|id| ids.contains(id));
                self.operators = operators;
                clamp(&mut self.operators_state, self.operators.len());
            }
            Ok(other) => warn!("dashboard ignored reply {:?}", other),
            Err(e) => {
                self.load_error = Some(e.user_message("Could not load dashboard data"));
                return;
            }
        }
        self.load_error = None;
    }

    /// Expire toasts and run the fallback reload once it is due
    pub fn tick(&mut self, now: Instant) -> Vec<Dispatch> {
        self.toasts.expire(now);
        match self.reload_at {
            Some(due) if now >= due => {
                info!("running scheduled full reload");
                self.reload_at = None;
                if let Some(kind) = self.active.take() {
                    if let Some(modal) = self.modal_mut(kind) {
                        modal.close();
                    }
                }
                self.reload_all()
            }
            _ => Vec::new(),
        }
    }

    pub fn reload_pending(&self) -> bool {
        self.reload_at.is_some()
    }
}

fn clamp(state: &mut TableState, len: usize) {
    state.select(match (state.selected(), len) {
        (_, 0) => None,
        (Some(i), len) if i >= len => Some(len - 1),
        (Some(i), _) => Some(i),
        (None, _) => Some(0),
    });
}

/// Map a terminal key event onto the modal key set
pub fn to_key_input(key: KeyEvent) -> Option<KeyInput> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    Some(match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyInput::Ctrl(c.to_ascii_lowercase())
        }
        KeyCode::Char(c) => KeyInput::Char(c),
        KeyCode::Backspace => KeyInput::Backspace,
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => KeyInput::BackTab,
        KeyCode::Tab => KeyInput::Tab,
        KeyCode::BackTab => KeyInput::BackTab,
        KeyCode::Up => KeyInput::Up,
        KeyCode::Down => KeyInput::Down,
        KeyCode::Left => KeyInput::Left,
        KeyCode::Right => KeyInput::Right,
        KeyCode::Enter => KeyInput::Enter,
        KeyCode::Esc => KeyInput::Esc,
        _ => return None,
    })
}

pub fn run_ui(
    app: &mut App,
    dispatcher: &Dispatcher,
    completions: &mut UnboundedReceiver<Completion>,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, dispatcher, completions);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    dispatcher: &Dispatcher,
    completions: &mut UnboundedReceiver<Completion>,
) -> io::Result<()> {
    dispatcher.send_all(app.reload_all());

    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(input) = to_key_input(key) {
                        let (dispatches, quit) = app.handle_key(input);
                        dispatcher.send_all(dispatches);
                        if quit {
                            return Ok(());
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    if let MouseEventKind::Down(_) = mouse.kind {
                        app.handle_click(mouse.column, mouse.row);
                    }
                }
                _ => {}
            }
        }

        while let Ok(completion) = completions.try_recv() {
            let dispatches = app.on_completion(completion);
            dispatcher.send_all(dispatches);
        }

        dispatcher.send_all(app.tick(Instant::now()));
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Guests => render_guests(f, chunks[1], app),
        Page::MasterEntries => render_entries(f, chunks[1], app),
        Page::People => render_people(f, chunks[1], app),
        Page::Operators => render_operators(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    let modal_area = app.active.map(|kind| {
        let area = centered_rect(70, 70, f.size());
        render_modal(f, area, app, kind);
        area
    });
    app.modal_area = modal_area;

    render_toasts(f, f.size(), app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Guests, Page::MasterEntries, Page::People, Page::Operators];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let inside: i64 = app.guests.len() as i64 + app.entries.iter().map(|e| e.people_count).sum::<i64>();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Inside: {}", inside),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Guests {}", app.guests.len()),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Groups {}", app.entries.len()),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Garrison Gate "),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn page_table<'a>(rows: Vec<Row<'a>>, widths: &[Constraint], header: Row<'a>, title: &'a str) -> Table<'a> {
    Table::new(rows, widths.to_vec())
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ")
}

fn render_guests(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app
        .guests
        .iter()
        .map(|g| {
            Row::new(vec![
                Cell::from(truncate(&g.guest_name, 28)),
                Cell::from(cnic::display(&g.guest_cnic)),
                Cell::from(truncate(&g.host_name, 24)),
                Cell::from(g.check_in_time.clone()).style(Style::default().fg(Color::Green)),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(30),
            Constraint::Length(17),
            Constraint::Length(26),
            Constraint::Length(18),
        ],
        header_row(&["Guest", "CNIC", "Host", "Checked in"]),
        " Checked-in Guests ",
    );
    f.render_stateful_widget(table, area, &mut app.guests_state);
}

fn render_entries(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app
        .entries
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(truncate(&e.description, 40)),
                Cell::from(e.people_count.to_string()).style(Style::default().fg(Color::Cyan)),
                Cell::from(e.check_in_time.clone()),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(42),
            Constraint::Length(8),
            Constraint::Length(18),
        ],
        header_row(&["Description", "People", "Checked in"]),
        " Master Entries ",
    );
    f.render_stateful_widget(table, area, &mut app.entries_state);
}

fn render_people(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app
        .people
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(p.id.to_string()),
                Cell::from(truncate(&p.name, 30)),
                Cell::from(p.display_cnic()),
                Cell::from(p.card_number.clone().unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(6),
            Constraint::Length(32),
            Constraint::Length(17),
            Constraint::Length(12),
        ],
        header_row(&["ID", "Name", "CNIC", "Card"]),
        " People ",
    );
    f.render_stateful_widget(table, area, &mut app.people_state);
}

fn render_operators(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app
        .operators
        .iter()
        .map(|o| {
            let mark = if app.operator_selection.contains(&o.id) {
                "[x]"
            } else {
                "[ ]"
            };
            Row::new(vec![
                Cell::from(mark).style(Style::default().fg(Color::Yellow)),
                Cell::from(truncate(&o.name, 30)),
                Cell::from(cnic::display(&o.cnic)),
            ])
        })
        .collect();

    let table = page_table(
        rows,
        &[
            Constraint::Length(4),
            Constraint::Length(32),
            Constraint::Length(17),
        ],
        header_row(&["", "Name", "CNIC"]),
        " Operators ",
    );
    f.render_stateful_widget(table, area, &mut app.operators_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(err) = &app.load_error {
        status_spans.push(Span::styled(format!(" {} ", err), Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" | "));
    }
    if app.reload_pending() {
        status_spans.push(Span::styled(" Reloading… ", Style::default().fg(Color::Cyan)));
        status_spans.push(Span::raw(" | "));
    }

    let keys: &[(&str, &str)] = match app.current_page {
        Page::Guests => &[("a", "Add guest"), ("c", "Checkout")],
        Page::MasterEntries => &[("a", "New entry"), ("c", "Checkout")],
        Page::People => &[("a", "Register"), ("f", "Family member")],
        Page::Operators => &[("e", "Edit"), ("Space", "Select"), ("d", "Delete")],
    };
    for (key, label) in keys
        .iter()
        .chain([("r", "Reload"), ("Tab", "Page"), ("x", "Dismiss")].iter())
    {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(format!(" {} | ", label)));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &App, kind: WorkflowKind) {
    let Some(modal) = app.modal(kind) else {
        return;
    };
    let core = modal.core();

    let mut lines: Vec<Line> = vec![Line::from("")];

    match kind {
        WorkflowKind::GuestCheckout => checkout_lines(&mut lines, &app.guest_checkout),
        WorkflowKind::MasterCheckout => checkout_lines(&mut lines, &app.master_checkout),
        WorkflowKind::FamilyMember => {
            if let Some(host) = app.family_member.host() {
                lines.push(Line::from(vec![
                    Span::styled("  Host: ", label_style()),
                    Span::raw(format!("{} ({})", host.name, cnic::display(&host.cnic))),
                ]));
                lines.push(Line::from(""));
            }
        }
        WorkflowKind::Operator => {
            if let Some(OperatorMode::ConfirmDelete { ids }) = app.operator.mode() {
                lines.push(Line::from(Span::styled(
                    format!("  Delete {} selected operator(s)?  y / n", ids.len()),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )));
            }
        }
        _ => {}
    }

    if let Some(form) = modal.form() {
        form_lines(&mut lines, form, core.phase() == Phase::Open);
    }

    lines.push(Line::from(""));
    if let Some(err) = core.inline_error() {
        lines.push(Line::from(Span::styled(
            format!("  ⚠ {}  (Enter to retry)", err),
            Style::default().fg(Color::Red),
        )));
    }
    if core.is_busy() {
        lines.push(Line::from(Span::styled(
            "  ⏳ Working…",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        )));
    }

    let hint = match kind {
        WorkflowKind::GuestCheckout | WorkflowKind::MasterCheckout => {
            "  Type to search · ↑/↓ select · Enter checkout · Esc close"
        }
        WorkflowKind::PersonRegistration => {
            "  Tab next field · ←/→ category · Ctrl+G generate card · Enter submit · Esc close"
        }
        _ => "  Tab next field · Enter submit · Esc close",
    };
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let panel = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {} ", kind.title())),
    );

    f.render_widget(Clear, area);
    f.render_widget(panel, area);
}

fn label_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn form_lines(lines: &mut Vec<Line<'static>>, form: &Form, editable: bool) {
    for (i, field) in form.fields().iter().enumerate() {
        let focused = editable && i == form.focus();
        let marker = if focused { "▸ " } else { "  " };
        let mut value = field.display_value();
        if focused {
            value.push('▏');
        }
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Yellow)),
            Span::styled(format!("{:<18}", field.label), label_style()),
            Span::styled(
                value,
                if focused {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                },
            ),
        ]));
    }
}

fn checkout_lines<T: CheckoutTarget>(lines: &mut Vec<Line<'static>>, modal: &CheckoutModal<T>) {
    let list = modal.list();
    lines.push(Line::from(vec![
        Span::styled("  Search: ", label_style()),
        Span::raw(format!("{}▏", list.query())),
    ]));
    lines.push(Line::from(""));

    if list.shows_no_results() {
        lines.push(Line::from(Span::styled(
            "  No results found",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else if list.is_empty() && modal.core().phase() == Phase::Open {
        lines.push(Line::from(Span::styled(
            "  Nobody is checked in",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for (i, item) in list.visible().enumerate() {
        let selected = i == modal.selected();
        let text = item
            .columns()
            .iter()
            .map(|c| format!("{:<22}", truncate(c, 20)))
            .collect::<String>();
        lines.push(Line::from(vec![
            Span::styled(if selected { "→ " } else { "  " }, Style::default().fg(Color::Yellow)),
            Span::styled(
                text,
                if selected {
                    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            ),
        ]));
    }

    if let Some(target) = modal.confirming() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  Check out {}?  y / n", target.label()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
}

fn render_toasts(f: &mut Frame, screen: Rect, app: &App) {
    let width = screen.width.min(50);
    for (i, toast) in app.toasts.current().enumerate() {
        let y = screen.y + 1 + (i as u16) * 3;
        if y + 3 > screen.height {
            break;
        }
        let area = Rect::new(screen.x + screen.width - width, y, width, 3);
        let color = match toast.level {
            Level::Success => Color::Green,
            Level::Error => Color::Red,
            Level::Info => Color::Cyan,
        };
        let paragraph = Paragraph::new(truncate(&toast.message, (width as usize).saturating_sub(4))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
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
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn config(partial_refresh: bool) -> GateConfig {
        GateConfig {
            partial_refresh,
            ..GateConfig::default()
        }
    }

    fn guest(id: &str, name: &str) -> GuestVisit {
        GuestVisit {
            transaction_id: id.to_string(),
            guest_name: name.to_string(),
            guest_cnic: "6110112345679".to_string(),
            host_name: "Maj. Tariq".to_string(),
            host_cnic: "3520212345671".to_string(),
            check_in_time: "09:12".to_string(),
        }
    }

    /// Open guest checkout, load two guests, confirm the first
    fn checkout_in_flight(app: &mut App) -> Ticket {
        let (dispatches, _) = app.handle_key(KeyInput::Char('c'));
        let ticket = dispatches[0].ticket;
        app.on_completion(Completion {
            ticket,
            result: Ok(ApiReply::CheckedInGuests(vec![guest("t1", "Bilal"), guest("t2", "Sana")])),
        });
        app.handle_key(KeyInput::Enter);
        let (dispatches, _) = app.handle_key(KeyInput::Char('y'));
        dispatches[0].ticket
    }

    #[test]
    fn test_reload_all_fetches_every_list() {
        let mut app = App::new(&config(true));
        let calls: Vec<ApiCall> = app.reload_all().into_iter().map(|d| d.call).collect();
        assert_eq!(
            calls,
            vec![
                ApiCall::CheckedInGuests,
                ApiCall::CheckedInMasterEntries,
                ApiCall::People,
                ApiCall::Operators,
            ]
        );
    }

    #[test]
    fn test_keys_route_to_open_modal() {
        let mut app = App::new(&config(true));
        app.handle_key(KeyInput::Char('a'));
        assert_eq!(app.active(), Some(WorkflowKind::GuestRegistration));

        // 'q' is typed into the form, not treated as quit
        let (_, quit) = app.handle_key(KeyInput::Char('q'));
        assert!(!quit);

        app.handle_key(KeyInput::Esc);
        assert_eq!(app.active(), None);
    }

    #[test]
    fn test_success_refreshes_through_hook() {
        let mut app = App::new(&config(true));
        let ticket = checkout_in_flight(&mut app);

        let dispatches = app.on_completion(Completion {
            ticket,
            result: Ok(ApiReply::Ack { message: None }),
        });

        assert_eq!(app.active(), None);
        assert_eq!(dispatches.len(), 1);
        assert_eq!(dispatches[0].call, ApiCall::CheckedInGuests);
        assert!(!app.reload_pending());
        assert_eq!(
            app.toasts.current().next().unwrap().message,
            "Guest checked out successfully"
        );
    }

    #[test]
    fn test_success_without_hook_reloads_after_delay() {
        let mut app = App::new(&config(false));
        let ticket = checkout_in_flight(&mut app);

        let dispatches = app.on_completion(Completion {
            ticket,
            result: Ok(ApiReply::Ack { message: None }),
        });
        assert!(dispatches.is_empty());
        assert!(app.reload_pending());

        assert!(app.tick(Instant::now()).is_empty());
        let reloads = app.tick(Instant::now() + Duration::from_secs(2));
        assert_eq!(reloads.len(), 4);
        assert!(!app.reload_pending());
    }

    #[test]
    fn test_late_reply_after_close_changes_nothing() {
        let mut app = App::new(&config(true));
        let ticket = checkout_in_flight(&mut app);
        app.handle_key(KeyInput::Esc);

        let dispatches = app.on_completion(Completion {
            ticket,
            result: Ok(ApiReply::Ack { message: None }),
        });

        assert!(dispatches.is_empty());
        assert!(app.toasts.is_empty());
        assert!(app.guest_checkout.list().is_empty());
    }

    #[test]
    fn test_click_outside_modal_closes_it() {
        let mut app = App::new(&config(true));
        app.handle_key(KeyInput::Char('a'));
        app.modal_area = Some(Rect::new(10, 5, 40, 10));

        app.handle_click(20, 8);
        assert_eq!(app.active(), Some(WorkflowKind::GuestRegistration));

        app.handle_click(2, 2);
        assert_eq!(app.active(), None);
        assert!(!app.guest_registration.is_open());
    }

    #[test]
    fn test_family_member_needs_selected_host() {
        let mut app = App::new(&config(true));
        app.current_page = Page::People;

        let (dispatches, _) = app.handle_key(KeyInput::Char('f'));
        assert!(dispatches.is_empty());
        assert_eq!(app.active(), None);

        app.on_completion(Completion {
            ticket: DASHBOARD_TICKET,
            result: Ok(ApiReply::People(vec![Person {
                id: 7,
                name: "Maj. Tariq".to_string(),
                cnic: "3520212345671".to_string(),
                card_number: None,
                category_id: None,
            }])),
        });
        let (dispatches, _) = app.handle_key(KeyInput::Char('f'));
        assert_eq!(dispatches[0].call, ApiCall::PersonDetails { person_id: 7 });
    }

    #[test]
    fn test_operator_selection_and_delete() {
        let mut app = App::new(&config(true));
        app.current_page = Page::Operators;
        app.on_completion(Completion {
            ticket: DASHBOARD_TICKET,
            result: Ok(ApiReply::Operators(vec![
                Operator {
                    id: 3,
                    name: "Naik Imran".to_string(),
                    cnic: "3740512345671".to_string(),
                },
                Operator {
                    id: 4,
                    name: "Hav. Saleem".to_string(),
                    cnic: "6110198765432".to_string(),
                },
            ])),
        });

        app.handle_key(KeyInput::Char(' '));
        app.handle_key(KeyInput::Down);
        app.handle_key(KeyInput::Char(' '));
        app.handle_key(KeyInput::Char('d'));
        let (dispatches, _) = app.handle_key(KeyInput::Char('y'));

        assert_eq!(dispatches[0].call, ApiCall::DeleteOperators { ids: vec![3, 4] });
    }

    #[test]
    fn test_dashboard_failure_shown_in_status() {
        let mut app = App::new(&config(true));
        app.on_completion(Completion {
            ticket: DASHBOARD_TICKET,
            result: Err(ApiError::transport("refused")),
        });
        assert!(app.load_error.is_some());
    }

    #[test]
    fn test_renders_modal_over_dashboard() {
        let mut app = App::new(&config(true));
        app.handle_key(KeyInput::Char('c'));

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        assert!(app.modal_area.is_some());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Muhammad Ali Jinnah", 10), "Muhamma...");
        assert_eq!(truncate("Ali", 10), "Ali");
    }
}
