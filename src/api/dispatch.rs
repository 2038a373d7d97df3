// 📬 Request dispatch - runs API calls off the UI thread
//
// The UI loop is single-threaded. Calls run as tokio tasks and their
// results come back over a channel tagged with the ticket they were issued
// under, so the owner can drop replies that arrive too late.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::{ApiCall, ApiError, ApiReply, GateApi};

/// Which part of the front end issued a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowKind {
    /// Page lists, not tied to any modal
    Dashboard,
    GuestCheckout,
    MasterCheckout,
    FamilyMember,
    Operator,
    GuestRegistration,
    MasterEntry,
    PersonRegistration,
}

impl WorkflowKind {
    pub fn title(&self) -> &'static str {
        match self {
            WorkflowKind::Dashboard => "Dashboard",
            WorkflowKind::GuestCheckout => "Guest Checkout",
            WorkflowKind::MasterCheckout => "Master Entry Checkout",
            WorkflowKind::FamilyMember => "Add Family Member",
            WorkflowKind::Operator => "Operator",
            WorkflowKind::GuestRegistration => "Register Guest",
            WorkflowKind::MasterEntry => "New Master Entry",
            WorkflowKind::PersonRegistration => "Register Person",
        }
    }
}

/// Issuer + generation. A modal bumps its generation on every open and
/// close; replies carrying an older generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub workflow: WorkflowKind,
    pub generation: u64,
}

/// A call waiting to be sent
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub call: ApiCall,
}

/// A finished call
#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<ApiReply, ApiError>,
}

pub struct Dispatcher {
    runtime: Handle,
    api: Arc<dyn GateApi>,
    tx: UnboundedSender<Completion>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiving end the UI loop drains
    pub fn new(runtime: Handle, api: Arc<dyn GateApi>) -> (Self, UnboundedReceiver<Completion>) {
        let (tx, rx) = unbounded_channel();
        (Dispatcher { runtime, api, tx }, rx)
    }

    /// Fire off a call. No cancellation: a reply always comes back, even
    /// for a modal that has since closed.
    pub fn send(&self, dispatch: Dispatch) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let Dispatch { ticket, call } = dispatch;

        debug!(workflow = ?ticket.workflow, generation = ticket.generation, "→ {}", call.describe());

        self.runtime.spawn(async move {
            let description = call.describe();
            let result = api.execute(call).await;
            if let Err(e) = &result {
                warn!(workflow = ?ticket.workflow, "{} failed: {}", description, e);
            }
            // Receiver gone means the UI already exited
            let _ = tx.send(Completion { ticket, result });
        });
    }

    pub fn send_all(&self, dispatches: impl IntoIterator<Item = Dispatch>) {
        for dispatch in dispatches {
            self.send(dispatch);
        }
    }
}
