// Garrison Gate - Core Library
// Exposes the API client, modal workflows and dev server to the binaries and tests

pub mod api;
pub mod cnic;
pub mod config;
pub mod entities;
pub mod form;
pub mod modal;
pub mod notify;
pub mod search;
pub mod validation;

#[cfg(feature = "server")]
pub mod dev_server;

// Re-export commonly used types
pub use api::{
    ApiCall, ApiError, ApiReply, Completion, Dispatch, Dispatcher, GateApi, HttpGateApi, Ticket,
    WorkflowKind, NETWORK_ERROR_MESSAGE,
};
pub use config::{Command, GateConfig};
pub use entities::{
    Category, FamilyMember, GuestRegistration, GuestVisit, MasterEntry, NewMasterEntry, Operator,
    Person, PersonRegistration,
};
pub use modal::{Effects, KeyInput, Modal, ModalCore, Phase, RefreshHook, RefreshTarget};
pub use notify::{Notification, Toasts};
pub use search::{SearchList, Searchable};
pub use validation::{ValidationError, ValidationResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
