// ✅ Checkout modals - search the checked-in list, confirm, check out
//
// Guests and master entries share one controller; CheckoutTarget supplies
// the per-list calls and texts.

use super::{unexpected, Effects, KeyInput, Modal, ModalCore, Phase, RefreshTarget};
use crate::api::{ApiCall, ApiError, ApiReply, Ticket, WorkflowKind};
use crate::cnic;
use crate::entities::{GuestVisit, MasterEntry};
use crate::search::{SearchList, Searchable};

/// A checked-in row that can be checked out
pub trait CheckoutTarget: Searchable + Clone {
    const KIND: WorkflowKind;
    const REFRESH: RefreshTarget;
    const LOAD_FAILED: &'static str;
    const CHECKOUT_FAILED: &'static str;
    const CHECKED_OUT: &'static str;

    fn list_call() -> ApiCall;
    fn unpack(reply: ApiReply) -> Result<Vec<Self>, ApiReply>;
    fn checkout_call(&self) -> ApiCall;

    /// Short name used in the confirmation prompt
    fn label(&self) -> String;

    /// Cells of one list row
    fn columns(&self) -> Vec<String>;
}

impl CheckoutTarget for GuestVisit {
    const KIND: WorkflowKind = WorkflowKind::GuestCheckout;
    const REFRESH: RefreshTarget = RefreshTarget::Guests;
    const LOAD_FAILED: &'static str = "Could not load checked-in guests";
    const CHECKOUT_FAILED: &'static str = "Failed to check out guest";
    const CHECKED_OUT: &'static str = "Guest checked out successfully";

    fn list_call() -> ApiCall {
        ApiCall::CheckedInGuests
    }

    fn unpack(reply: ApiReply) -> Result<Vec<Self>, ApiReply> {
        match reply {
            ApiReply::CheckedInGuests(guests) => Ok(guests),
            other => Err(other),
        }
    }

    fn checkout_call(&self) -> ApiCall {
        ApiCall::CheckoutGuest {
            transaction_id: self.transaction_id.clone(),
        }
    }

    fn label(&self) -> String {
        self.guest_name.clone()
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.guest_name.clone(),
            cnic::display(&self.guest_cnic),
            self.host_name.clone(),
            self.check_in_time.clone(),
        ]
    }
}

impl CheckoutTarget for MasterEntry {
    const KIND: WorkflowKind = WorkflowKind::MasterCheckout;
    const REFRESH: RefreshTarget = RefreshTarget::MasterEntries;
    const LOAD_FAILED: &'static str = "Could not load checked-in master entries";
    const CHECKOUT_FAILED: &'static str = "Failed to check out master entry";
    const CHECKED_OUT: &'static str = "Master entry checked out successfully";

    fn list_call() -> ApiCall {
        ApiCall::CheckedInMasterEntries
    }

    fn unpack(reply: ApiReply) -> Result<Vec<Self>, ApiReply> {
        match reply {
            ApiReply::CheckedInMasterEntries(entries) => Ok(entries),
            other => Err(other),
        }
    }

    fn checkout_call(&self) -> ApiCall {
        ApiCall::CheckoutMasterEntry { id: self.id }
    }

    fn label(&self) -> String {
        format!("{} ({} people)", self.description, self.people_count)
    }

    fn columns(&self) -> Vec<String> {
        vec![
            self.description.clone(),
            self.people_count.to_string(),
            self.check_in_time.clone(),
        ]
    }
}

pub type GuestCheckoutModal = CheckoutModal<GuestVisit>;
pub type MasterCheckoutModal = CheckoutModal<MasterEntry>;

pub struct CheckoutModal<T: CheckoutTarget> {
    core: ModalCore,
    list: SearchList<T>,
    /// Position within the visible rows
    selected: usize,
    /// Row awaiting y/n
    confirming: Option<T>,
}

impl<T: CheckoutTarget> CheckoutModal<T> {
    pub fn new(core: ModalCore) -> Self {
        CheckoutModal {
            core,
            list: SearchList::new(),
            selected: 0,
            confirming: None,
        }
    }

    /// Clear the previous search and fetch the checked-in list
    pub fn open(&mut self) -> Effects {
        self.reset();
        let ticket = self.core.open(true);
        Effects::dispatch(ticket, T::list_call())
    }

    pub fn list(&self) -> &SearchList<T> {
        &self.list
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn confirming(&self) -> Option<&T> {
        self.confirming.as_ref()
    }

    pub fn search(&mut self, query: &str) {
        self.list.apply(query);
        self.selected = 0;
    }

    fn move_selection(&mut self, down: bool) {
        let count = self.list.visible_count();
        if count == 0 {
            return;
        }
        self.selected = if down {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
    }

    /// Ask for confirmation on the selected row
    pub fn request_checkout(&mut self) {
        if self.core.phase() != Phase::Open {
            return;
        }
        self.confirming = self.list.visible_at(self.selected).cloned();
    }

    /// Confirmation given: issue the checkout call
    pub fn confirm(&mut self) -> Effects {
        let Some(target) = self.confirming.take() else {
            return Effects::none();
        };
        match self.core.begin_submit() {
            Some(ticket) => Effects::dispatch(ticket, target.checkout_call()),
            None => Effects::none(),
        }
    }

    fn retry(&mut self) -> Effects {
        match self.core.begin_retry() {
            Some(ticket) => Effects::dispatch(ticket, T::list_call()),
            None => Effects::none(),
        }
    }
}

impl<T: CheckoutTarget> Modal for CheckoutModal<T> {
    fn core(&self) -> &ModalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModalCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.list.clear();
        self.selected = 0;
        self.confirming = None;
    }

    fn handle_key(&mut self, key: KeyInput) -> Effects {
        if self.confirming.is_some() {
            match key {
                KeyInput::Char('y') | KeyInput::Char('Y') | KeyInput::Enter => return self.confirm(),
                KeyInput::Char('n') | KeyInput::Char('N') | KeyInput::Esc => self.confirming = None,
                _ => {}
            }
            return Effects::none();
        }

        match key {
            KeyInput::Esc => self.close(),
            KeyInput::Enter if self.core.phase() == Phase::LoadFailed => return self.retry(),
            KeyInput::Enter => self.request_checkout(),
            KeyInput::Up => self.move_selection(false),
            KeyInput::Down => self.move_selection(true),
            KeyInput::Char(c) if self.core.phase() == Phase::Open => {
                self.list.push_char(c);
                self.selected = 0;
            }
            KeyInput::Backspace if self.core.phase() == Phase::Open => {
                self.list.pop_char();
                self.selected = 0;
            }
            _ => {}
        }
        Effects::none()
    }

    fn on_reply(&mut self, ticket: Ticket, result: Result<ApiReply, ApiError>) -> Effects {
        match self.core.accept(ticket) {
            Some(Phase::Loading) => match result.and_then(|r| T::unpack(r).map_err(|r| unexpected(&r))) {
                Ok(items) => {
                    self.list.replace(items);
                    self.selected = 0;
                    Effects::none()
                }
                Err(e) => self.core.load_failed(&e, T::LOAD_FAILED),
            },
            Some(Phase::Submitting) => match result {
                Ok(ApiReply::Ack { message }) => {
                    let message = message.unwrap_or_else(|| T::CHECKED_OUT.to_string());
                    let effects = self.core.succeeded(message, T::REFRESH);
                    self.reset();
                    effects
                }
                Ok(other) => self.core.submit_failed(&unexpected(&other), T::CHECKOUT_FAILED),
                Err(e) => self.core.submit_failed(&e, T::CHECKOUT_FAILED),
            },
            _ => Effects::none(),
        }
    }
}
