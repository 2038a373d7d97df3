// 🛂 Operator management - edit one operator or delete a selection

use super::{edit_form, unexpected, Effects, KeyInput, Modal, ModalCore, Phase, RefreshTarget};
use crate::api::{ApiCall, ApiError, ApiReply, Ticket};
use crate::entities::{Operator, OperatorUpdate};
use crate::form::{Field, FieldKind, Form};
use crate::notify::Notification;
use crate::validation::{FormValidator, ValidationResult, MIN_NAME_LEN};

const UPDATE_FAILED: &str = "Failed to update operator";
const DELETE_FAILED: &str = "Failed to delete operators";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorMode {
    Edit { id: i64 },
    ConfirmDelete { ids: Vec<i64> },
}

pub struct OperatorModal {
    core: ModalCore,
    form: Form,
    mode: Option<OperatorMode>,
}

impl OperatorModal {
    pub fn new(core: ModalCore) -> Self {
        OperatorModal {
            core,
            form: Form::new(vec![
                Field::new("name", "Name", FieldKind::Text),
                Field::new("cnic", "CNIC", FieldKind::Cnic),
            ]),
            mode: None,
        }
    }

    pub fn mode(&self) -> Option<&OperatorMode> {
        self.mode.as_ref()
    }

    /// Open the edit form prefilled with `operator`
    pub fn open_edit(&mut self, operator: &Operator) -> Effects {
        self.reset();
        self.form.set_value("name", &operator.name);
        self.form.set_value("cnic", &operator.cnic);
        self.mode = Some(OperatorMode::Edit { id: operator.id });
        self.core.open(false);
        Effects::none()
    }

    /// Ask for confirmation before deleting `ids`
    pub fn open_delete(&mut self, ids: Vec<i64>) -> Effects {
        if ids.is_empty() {
            return Effects::notify(Notification::error("Select at least one operator to delete"));
        }
        self.reset();
        self.mode = Some(OperatorMode::ConfirmDelete { ids });
        self.core.open(false);
        Effects::none()
    }

    pub fn validate(&self) -> ValidationResult {
        let mut v = FormValidator::new("Operator");
        v.min_len("name", "Name", &self.form.value("name"), MIN_NAME_LEN)
            .cnic("cnic", "CNIC", &self.form.value("cnic"));
        v.finish()
    }

    pub fn submit(&mut self) -> Effects {
        if self.core.phase() != Phase::Open {
            return Effects::none();
        }
        let call = match &self.mode {
            Some(OperatorMode::Edit { id }) => {
                if let Err(errors) = self.validate() {
                    return self.core.invalid(&errors);
                }
                ApiCall::UpdateOperator {
                    id: *id,
                    update: OperatorUpdate {
                        name: self.form.value("name"),
                        cnic: self.form.value("cnic"),
                    },
                }
            }
            Some(OperatorMode::ConfirmDelete { ids }) => ApiCall::DeleteOperators { ids: ids.clone() },
            None => return Effects::none(),
        };
        match self.core.begin_submit() {
            Some(ticket) => Effects::dispatch(ticket, call),
            None => Effects::none(),
        }
    }

    fn success_text(&self) -> String {
        match &self.mode {
            Some(OperatorMode::ConfirmDelete { ids }) if ids.len() == 1 => "Operator deleted".to_string(),
            Some(OperatorMode::ConfirmDelete { ids }) => format!("{} operators deleted", ids.len()),
            _ => "Operator updated successfully".to_string(),
        }
    }

    fn failure_text(&self) -> &'static str {
        match self.mode {
            Some(OperatorMode::ConfirmDelete { .. }) => DELETE_FAILED,
            _ => UPDATE_FAILED,
        }
    }
}

impl Modal for OperatorModal {
    fn core(&self) -> &ModalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModalCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.form.reset();
        self.mode = None;
    }

    fn form(&self) -> Option<&Form> {
        match self.mode {
            Some(OperatorMode::Edit { .. }) => Some(&self.form),
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Effects {
        let deleting = matches!(self.mode, Some(OperatorMode::ConfirmDelete { .. }));
        match key {
            KeyInput::Esc => self.close(),
            KeyInput::Char('n') | KeyInput::Char('N') if deleting => self.close(),
            KeyInput::Char('y') | KeyInput::Char('Y') if deleting => return self.submit(),
            KeyInput::Enter => return self.submit(),
            key if !deleting && self.core.phase() == Phase::Open => {
                edit_form(&mut self.form, key);
            }
            _ => {}
        }
        Effects::none()
    }

    fn on_reply(&mut self, ticket: Ticket, result: Result<ApiReply, ApiError>) -> Effects {
        if self.core.accept(ticket) != Some(Phase::Submitting) {
            return Effects::none();
        }
        let failed = self.failure_text();
        match result {
            Ok(ApiReply::Ack { message }) => {
                let message = message.unwrap_or_else(|| self.success_text());
                let effects = self.core.succeeded(message, RefreshTarget::Operators);
                self.reset();
                effects
            }
            Ok(other) => self.core.submit_failed(&unexpected(&other), failed),
            Err(e) => self.core.submit_failed(&e, failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WorkflowKind;

    fn operator() -> Operator {
        Operator {
            id: 5,
            name: "Naik Imran".to_string(),
            cnic: "3740512345671".to_string(),
        }
    }

    #[test]
    fn test_edit_prefills_and_submits_form_post() {
        let mut modal = OperatorModal::new(ModalCore::new(WorkflowKind::Operator));
        modal.open_edit(&operator());
        assert_eq!(modal.form().unwrap().value("name"), "Naik Imran");

        modal.handle_key(KeyInput::Char('!'));
        let effects = modal.handle_key(KeyInput::Enter);
        assert_eq!(
            effects.dispatches[0].call,
            ApiCall::UpdateOperator {
                id: 5,
                update: OperatorUpdate {
                    name: "Naik Imran!".to_string(),
                    cnic: "3740512345671".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_delete_needs_selection() {
        let mut modal = OperatorModal::new(ModalCore::new(WorkflowKind::Operator));
        let effects = modal.open_delete(Vec::new());
        assert!(effects.has_error());
        assert!(!modal.is_open());
    }

    #[test]
    fn test_delete_confirmed_with_y() {
        let mut modal = OperatorModal::new(ModalCore::new(WorkflowKind::Operator));
        modal.open_delete(vec![5, 8]);

        let effects = modal.handle_key(KeyInput::Char('y'));
        assert_eq!(effects.dispatches[0].call, ApiCall::DeleteOperators { ids: vec![5, 8] });

        let done = modal.on_reply(effects.dispatches[0].ticket, Ok(ApiReply::Ack { message: None }));
        assert_eq!(done.notices[0].message, "2 operators deleted");
        assert!(modal.mode().is_none());
    }

    #[test]
    fn test_delete_declined_with_n() {
        let mut modal = OperatorModal::new(ModalCore::new(WorkflowKind::Operator));
        modal.open_delete(vec![5]);
        let effects = modal.handle_key(KeyInput::Char('n'));

        assert!(effects.dispatches.is_empty());
        assert!(!modal.is_open());
    }

    #[test]
    fn test_close_clears_prefill() {
        let mut modal = OperatorModal::new(ModalCore::new(WorkflowKind::Operator));
        modal.open_edit(&operator());
        modal.handle_key(KeyInput::Esc);

        assert!(modal.mode().is_none());
        assert_eq!(modal.form.value("name"), "");
    }
}
