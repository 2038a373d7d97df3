// 👥 New Master Entry - log a group under one description and head count

use super::{edit_form, unexpected, Effects, KeyInput, Modal, ModalCore, Phase, RefreshTarget};
use crate::api::{ApiCall, ApiError, ApiReply, Ticket};
use crate::entities::NewMasterEntry;
use crate::form::{Field, FieldKind, Form};
use crate::validation::{FormValidator, ValidationResult};

const SUBMIT_FAILED: &str = "Failed to create master entry";
const CREATED: &str = "Master entry created successfully";

pub struct MasterEntryModal {
    core: ModalCore,
    form: Form,
}

impl MasterEntryModal {
    pub fn new(core: ModalCore) -> Self {
        MasterEntryModal {
            core,
            form: Form::new(vec![
                Field::new("description", "Description", FieldKind::Text),
                Field::new("people_count", "People count", FieldKind::Number),
            ]),
        }
    }

    pub fn open(&mut self) -> Effects {
        self.reset();
        self.core.open(false);
        Effects::none()
    }

    pub fn validate(&self) -> ValidationResult {
        let mut v = FormValidator::new("Master entry");
        v.required("description", "Description", &self.form.value("description"))
            .positive_count(
                "people_count",
                "People count",
                &self.form.value("people_count"),
            );
        v.finish()
    }

    pub fn submit(&mut self) -> Effects {
        if self.core.phase() != Phase::Open {
            return Effects::none();
        }
        if let Err(errors) = self.validate() {
            return self.core.invalid(&errors);
        }
        let Ok(people_count) = self.form.value("people_count").parse::<u32>() else {
            return Effects::none();
        };

        let entry = NewMasterEntry {
            description: self.form.value("description"),
            people_count,
        };
        match self.core.begin_submit() {
            Some(ticket) => Effects::dispatch(ticket, ApiCall::CreateMasterEntry(entry)),
            None => Effects::none(),
        }
    }
}

impl Modal for MasterEntryModal {
    fn core(&self) -> &ModalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModalCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.form.reset();
    }

    fn form(&self) -> Option<&Form> {
        Some(&self.form)
    }

    fn handle_key(&mut self, key: KeyInput) -> Effects {
        match key {
            KeyInput::Esc => self.close(),
            KeyInput::Enter => return self.submit(),
            key if self.core.phase() == Phase::Open => {
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
        match result {
            Ok(ApiReply::Ack { message }) => {
                let message = message.unwrap_or_else(|| CREATED.to_string());
                let effects = self.core.succeeded(message, RefreshTarget::MasterEntries);
                self.reset();
                effects
            }
            Ok(other) => self.core.submit_failed(&unexpected(&other), SUBMIT_FAILED),
            Err(e) => self.core.submit_failed(&e, SUBMIT_FAILED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WorkflowKind;

    #[test]
    fn test_zero_people_rejected() {
        let mut modal = MasterEntryModal::new(ModalCore::new(WorkflowKind::MasterEntry));
        modal.open();
        for c in "Band".chars() {
            modal.handle_key(KeyInput::Char(c));
        }
        modal.handle_key(KeyInput::Tab);
        modal.handle_key(KeyInput::Char('0'));

        let effects = modal.handle_key(KeyInput::Enter);
        assert!(effects.dispatches.is_empty());
        assert!(effects.has_error());
    }

    #[test]
    fn test_submit_and_succeed() {
        let mut modal = MasterEntryModal::new(ModalCore::new(WorkflowKind::MasterEntry));
        modal.open();
        for c in "Cadet batch 42".chars() {
            modal.handle_key(KeyInput::Char(c));
        }
        modal.handle_key(KeyInput::Tab);
        for c in "30".chars() {
            modal.handle_key(KeyInput::Char(c));
        }

        let effects = modal.handle_key(KeyInput::Enter);
        assert_eq!(
            effects.dispatches[0].call,
            ApiCall::CreateMasterEntry(NewMasterEntry {
                description: "Cadet batch 42".to_string(),
                people_count: 30,
            })
        );

        let ticket = effects.dispatches[0].ticket;
        let done = modal.on_reply(
            ticket,
            Ok(ApiReply::Ack {
                message: Some("Entry logged".to_string()),
            }),
        );
        assert_eq!(done.notices[0].message, "Entry logged");
        assert!(!modal.is_open());
        assert!(modal.form().unwrap().is_pristine());
    }
}
