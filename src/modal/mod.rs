// 🪟 Modal Controller - the state machine every workflow runs on
//
// Closed → Loading/Open → Submitting → Closed (success) or Open (failure).
// Controllers never perform I/O themselves: they hand back Effects (calls to
// dispatch, notifications, a scheduled reload) and receive replies through
// `on_reply`. That keeps them synchronous and testable without a server.

pub mod checkout;
pub mod family_member;
pub mod guest_registration;
pub mod master_entry;
pub mod operator;
pub mod person_registration;

pub use checkout::{CheckoutModal, CheckoutTarget, GuestCheckoutModal, MasterCheckoutModal};
pub use family_member::FamilyMemberModal;
pub use guest_registration::GuestRegistrationModal;
pub use master_entry::MasterEntryModal;
pub use operator::{OperatorMode, OperatorModal};
pub use person_registration::PersonRegistrationModal;

use std::time::Duration;
use tracing::{debug, info};

use crate::api::{ApiCall, ApiError, ApiReply, Dispatch, Ticket, WorkflowKind};
use crate::form::Form;
use crate::notify::Notification;
use crate::validation::{first_message, ValidationError};

/// Delay before the fallback full reload, long enough to read the toast
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_millis(1500);

// ============================================================================
// PHASES, KEYS, EFFECTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    /// Reference data in flight
    Loading,
    /// Reference fetch failed; only retry or close are possible
    LoadFailed,
    Open,
    /// Submit in flight; submit is disabled
    Submitting,
}

/// Keyboard input routed to the open modal, independent of the terminal
/// library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Ctrl(char),
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Esc,
}

/// View to refresh after a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTarget {
    Guests,
    MasterEntries,
    People,
    Operators,
}

/// Called after a successful mutation with the view that changed.
/// When a controller has none, it falls back to a delayed full reload.
pub type RefreshHook = Box<dyn FnMut(RefreshTarget)>;

/// What the owner of a controller must do next
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Effects {
    pub dispatches: Vec<Dispatch>,
    pub notices: Vec<Notification>,
    /// Reload everything once this delay has passed
    pub reload_after: Option<Duration>,
}

impl Effects {
    pub fn none() -> Self {
        Effects::default()
    }

    pub fn dispatch(ticket: Ticket, call: ApiCall) -> Self {
        Effects {
            dispatches: vec![Dispatch { ticket, call }],
            ..Effects::default()
        }
    }

    pub fn notify(notification: Notification) -> Self {
        Effects {
            notices: vec![notification],
            ..Effects::default()
        }
    }

    pub fn has_error(&self) -> bool {
        self.notices.iter().any(Notification::is_error)
    }
}

// ============================================================================
// MODAL CORE
// ============================================================================

/// Lifecycle shared by every workflow
pub struct ModalCore {
    kind: WorkflowKind,
    phase: Phase,
    generation: u64,
    inline_error: Option<String>,
    refresh: Option<RefreshHook>,
    reload_delay: Duration,
}

impl ModalCore {
    pub fn new(kind: WorkflowKind) -> Self {
        ModalCore {
            kind,
            phase: Phase::Closed,
            generation: 0,
            inline_error: None,
            refresh: None,
            reload_delay: DEFAULT_RELOAD_DELAY,
        }
    }

    pub fn with_refresh(mut self, hook: RefreshHook) -> Self {
        self.refresh = Some(hook);
        self
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != Phase::Closed
    }

    /// Spinner state
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::Submitting)
    }

    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn ticket(&self) -> Ticket {
        Ticket {
            workflow: self.kind,
            generation: self.generation,
        }
    }

    /// Enter Open (or Loading when reference data must be fetched first)
    pub fn open(&mut self, loading: bool) -> Ticket {
        self.generation += 1;
        self.inline_error = None;
        self.phase = if loading { Phase::Loading } else { Phase::Open };
        self.ticket()
    }

    /// Close and invalidate every request issued so far
    pub fn close(&mut self) {
        if self.phase != Phase::Closed {
            debug!(workflow = ?self.kind, "modal closed");
        }
        self.generation += 1;
        self.inline_error = None;
        self.phase = Phase::Closed;
    }

    /// Open → Submitting. None while closed, loading, or already submitting.
    pub fn begin_submit(&mut self) -> Option<Ticket> {
        if self.phase != Phase::Open {
            return None;
        }
        self.phase = Phase::Submitting;
        Some(self.ticket())
    }

    /// LoadFailed → Loading
    pub fn begin_retry(&mut self) -> Option<Ticket> {
        if self.phase != Phase::LoadFailed {
            return None;
        }
        self.inline_error = None;
        self.phase = Phase::Loading;
        Some(self.ticket())
    }

    /// Accept a reply if it belongs to the current generation of an open
    /// modal. Returns the phase the reply settles (Loading or Submitting)
    /// and clears the busy state; stale replies return None and change
    /// nothing.
    pub fn accept(&mut self, ticket: Ticket) -> Option<Phase> {
        if ticket != self.ticket() || !self.is_busy() {
            debug!(
                workflow = ?self.kind,
                generation = ticket.generation,
                current = self.generation,
                "dropping stale reply"
            );
            return None;
        }
        let settled = self.phase;
        self.phase = Phase::Open;
        Some(settled)
    }

    /// Reference fetch failed: show the error inline and stay unusable
    pub fn load_failed(&mut self, err: &ApiError, fallback: &str) -> Effects {
        self.phase = Phase::LoadFailed;
        self.inline_error = Some(err.user_message(fallback));
        Effects::none()
    }

    /// Submit failed: notify, submit re-enabled, modal stays open
    pub fn submit_failed(&mut self, err: &ApiError, fallback: &str) -> Effects {
        self.phase = Phase::Open;
        Effects::notify(Notification::error(err.user_message(fallback)))
    }

    /// Validation blocked the submit; no call is made
    pub fn invalid(&self, errors: &[ValidationError]) -> Effects {
        Effects::notify(Notification::error(first_message(errors)))
    }

    /// Submit succeeded: close, notify, then refresh through the hook or
    /// schedule the fallback reload.
    pub fn succeeded(&mut self, message: String, target: RefreshTarget) -> Effects {
        info!(workflow = ?self.kind, "{}", message);
        self.close();

        let mut effects = Effects::notify(Notification::success(message));
        match self.refresh.as_mut() {
            Some(hook) => hook(target),
            None => effects.reload_after = Some(self.reload_delay),
        }
        effects
    }
}

/// A reply variant the workflow did not ask for
pub(crate) fn unexpected(reply: &ApiReply) -> ApiError {
    ApiError::Transport(format!("unexpected reply: {:?}", reply))
}

// ============================================================================
// MODAL TRAIT
// ============================================================================

/// Uniform surface the dashboard drives every open modal through
pub trait Modal {
    fn core(&self) -> &ModalCore;
    fn core_mut(&mut self) -> &mut ModalCore;

    /// Clear workflow state back to what a fresh open expects
    fn reset(&mut self);

    fn handle_key(&mut self, key: KeyInput) -> Effects;

    fn on_reply(&mut self, ticket: Ticket, result: Result<ApiReply, ApiError>) -> Effects;

    /// The form, for workflows that have one
    fn form(&self) -> Option<&Form> {
        None
    }

    /// Cancel, Escape, or a click outside the modal
    fn close(&mut self) {
        self.core_mut().close();
        self.reset();
    }

    fn kind(&self) -> WorkflowKind {
        self.core().kind()
    }

    fn is_open(&self) -> bool {
        self.core().is_open()
    }
}

/// Keys every form modal handles the same way. Returns true when consumed.
pub(crate) fn edit_form(form: &mut Form, key: KeyInput) -> bool {
    match key {
        KeyInput::Char(c) => form.input_char(c),
        KeyInput::Backspace => form.backspace(),
        KeyInput::Tab | KeyInput::Down => form.focus_next(),
        KeyInput::BackTab | KeyInput::Up => form.focus_previous(),
        KeyInput::Right => form.cycle_choice(1),
        KeyInput::Left => form.cycle_choice(-1),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn core() -> ModalCore {
        ModalCore::new(WorkflowKind::GuestRegistration)
    }

    #[test]
    fn test_starts_closed() {
        let core = core();
        assert_eq!(core.phase(), Phase::Closed);
        assert!(!core.is_open());
    }

    #[test]
    fn test_submit_only_from_open() {
        let mut core = core();
        assert!(core.begin_submit().is_none());

        core.open(true);
        assert!(core.begin_submit().is_none());

        let ticket = core.ticket();
        core.accept(ticket);
        assert!(core.begin_submit().is_some());
        assert!(core.begin_submit().is_none());
    }

    #[test]
    fn test_close_invalidates_ticket() {
        let mut core = core();
        core.open(false);
        let ticket = core.begin_submit().unwrap();
        core.close();

        assert_eq!(core.accept(ticket), None);
        assert_eq!(core.phase(), Phase::Closed);
    }

    #[test]
    fn test_reopen_invalidates_old_ticket() {
        let mut core = core();
        let first = core.open(true);
        core.close();
        core.open(true);

        assert_eq!(core.accept(first), None);
        assert_eq!(core.phase(), Phase::Loading);
    }

    #[test]
    fn test_accept_clears_busy() {
        let mut core = core();
        core.open(false);
        let ticket = core.begin_submit().unwrap();
        assert!(core.is_busy());

        assert_eq!(core.accept(ticket), Some(Phase::Submitting));
        assert!(!core.is_busy());
    }

    #[test]
    fn test_load_failed_then_retry() {
        let mut core = core();
        let ticket = core.open(true);
        core.accept(ticket);
        core.load_failed(&ApiError::transport("refused"), "unused");

        assert_eq!(core.phase(), Phase::LoadFailed);
        assert!(core.inline_error().is_some());
        assert!(core.begin_submit().is_none());

        assert!(core.begin_retry().is_some());
        assert_eq!(core.phase(), Phase::Loading);
        assert!(core.inline_error().is_none());
    }

    #[test]
    fn test_success_without_hook_schedules_reload() {
        let mut core = core().with_reload_delay(Duration::from_millis(1000));
        core.open(false);

        let effects = core.succeeded("Guest registered".to_string(), RefreshTarget::Guests);
        assert_eq!(effects.reload_after, Some(Duration::from_millis(1000)));
        assert!(!core.is_open());
    }

    #[test]
    fn test_success_with_hook_refreshes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut core = core().with_refresh(Box::new(move |t| sink.borrow_mut().push(t)));
        core.open(false);

        let effects = core.succeeded("ok".to_string(), RefreshTarget::Guests);
        assert_eq!(effects.reload_after, None);
        assert_eq!(*seen.borrow(), vec![RefreshTarget::Guests]);
    }
}
