// 👪 Add Family Member - register a dependant under a host person

use super::{edit_form, unexpected, Effects, KeyInput, Modal, ModalCore, Phase, RefreshTarget};
use crate::api::{ApiCall, ApiError, ApiReply, Ticket};
use crate::entities::{FamilyMember, PersonSummary};
use crate::form::{Field, FieldKind, Form};
use crate::validation::{FormValidator, ValidationResult, MIN_NAME_LEN};

const LOAD_FAILED: &str = "Could not load host details";
const SUBMIT_FAILED: &str = "Failed to add family member";
const ADDED: &str = "Family member added successfully";

pub struct FamilyMemberModal {
    core: ModalCore,
    form: Form,
    host_id: Option<i64>,
    host: Option<PersonSummary>,
}

impl FamilyMemberModal {
    pub fn new(core: ModalCore) -> Self {
        FamilyMemberModal {
            core,
            form: Self::blank_form(),
            host_id: None,
            host: None,
        }
    }

    fn blank_form() -> Form {
        Form::new(vec![
            Field::new("name", "Name", FieldKind::Text),
            Field::new("cnic", "CNIC", FieldKind::Cnic),
            Field::new("relation", "Relation", FieldKind::Text),
            Field::new("phone", "Phone", FieldKind::Text),
            Field::new("emergency_contact", "Emergency contact", FieldKind::Text),
        ])
    }

    /// Open for `host_person_id` and fetch the host banner
    pub fn open(&mut self, host_person_id: i64) -> Effects {
        self.reset();
        self.host_id = Some(host_person_id);
        let ticket = self.core.open(true);
        Effects::dispatch(ticket, ApiCall::PersonDetails { person_id: host_person_id })
    }

    pub fn host(&self) -> Option<&PersonSummary> {
        self.host.as_ref()
    }

    pub fn validate(&self) -> ValidationResult {
        let mut v = FormValidator::new("Family member");
        v.min_len("name", "Name", &self.form.value("name"), MIN_NAME_LEN)
            .cnic("cnic", "CNIC", &self.form.value("cnic"))
            .required("relation", "Relation", &self.form.value("relation"))
            .phone("phone", "Phone", &self.form.value("phone"))
            .phone(
                "emergency_contact",
                "Emergency contact",
                &self.form.value("emergency_contact"),
            );
        v.finish()
    }

    pub fn submit(&mut self) -> Effects {
        if self.core.phase() != Phase::Open {
            return Effects::none();
        }
        let Some(host_person_id) = self.host_id else {
            return Effects::none();
        };
        if let Err(errors) = self.validate() {
            return self.core.invalid(&errors);
        }

        let member = FamilyMember {
            host_person_id,
            name: self.form.value("name"),
            cnic: self.form.value("cnic"),
            phone: self.form.value("phone"),
            emergency_contact: self.form.value("emergency_contact"),
            relation: self.form.value("relation"),
        };
        match self.core.begin_submit() {
            Some(ticket) => Effects::dispatch(ticket, ApiCall::AddFamilyMember(member)),
            None => Effects::none(),
        }
    }

    fn retry(&mut self) -> Effects {
        match (self.core.begin_retry(), self.host_id) {
            (Some(ticket), Some(person_id)) => {
                Effects::dispatch(ticket, ApiCall::PersonDetails { person_id })
            }
            _ => Effects::none(),
        }
    }
}

impl Modal for FamilyMemberModal {
    fn core(&self) -> &ModalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModalCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.form.reset();
        self.host_id = None;
        self.host = None;
    }

    fn form(&self) -> Option<&Form> {
        Some(&self.form)
    }

    fn handle_key(&mut self, key: KeyInput) -> Effects {
        match (key, self.core.phase()) {
            (KeyInput::Esc, _) => self.close(),
            (KeyInput::Enter, Phase::LoadFailed) => return self.retry(),
            (KeyInput::Enter, _) => return self.submit(),
            (key, Phase::Open) => {
                edit_form(&mut self.form, key);
            }
            _ => {}
        }
        Effects::none()
    }

    fn on_reply(&mut self, ticket: Ticket, result: Result<ApiReply, ApiError>) -> Effects {
        match self.core.accept(ticket) {
            Some(Phase::Loading) => match result {
                Ok(ApiReply::PersonDetails(person)) => {
                    self.host = Some(person);
                    Effects::none()
                }
                Ok(other) => self.core.load_failed(&unexpected(&other), LOAD_FAILED),
                Err(e) => self.core.load_failed(&e, LOAD_FAILED),
            },
            Some(Phase::Submitting) => match result {
                Ok(ApiReply::Ack { message }) => {
                    let message = message.unwrap_or_else(|| ADDED.to_string());
                    let effects = self.core.succeeded(message, RefreshTarget::People);
                    self.reset();
                    effects
                }
                Ok(other) => self.core.submit_failed(&unexpected(&other), SUBMIT_FAILED),
                Err(e) => self.core.submit_failed(&e, SUBMIT_FAILED),
            },
            _ => Effects::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WorkflowKind;

    fn opened() -> FamilyMemberModal {
        let mut modal = FamilyMemberModal::new(ModalCore::new(WorkflowKind::FamilyMember));
        let ticket = modal.open(12).dispatches[0].ticket;
        modal.on_reply(
            ticket,
            Ok(ApiReply::PersonDetails(PersonSummary {
                name: "Maj. Tariq".to_string(),
                cnic: "3520212345671".to_string(),
            })),
        );
        modal
    }

    fn type_text(modal: &mut FamilyMemberModal, text: &str) {
        for c in text.chars() {
            modal.handle_key(KeyInput::Char(c));
        }
    }

    #[test]
    fn test_open_requests_host_details() {
        let mut modal = FamilyMemberModal::new(ModalCore::new(WorkflowKind::FamilyMember));
        let effects = modal.open(12);
        assert_eq!(effects.dispatches[0].call, ApiCall::PersonDetails { person_id: 12 });
    }

    #[test]
    fn test_host_banner_loaded() {
        let modal = opened();
        assert_eq!(modal.host().unwrap().name, "Maj. Tariq");
        assert_eq!(modal.core().phase(), Phase::Open);
    }

    #[test]
    fn test_invalid_cnic_blocks_submit() {
        let mut modal = opened();
        type_text(&mut modal, "Ayesha");
        modal.handle_key(KeyInput::Tab);
        type_text(&mut modal, "12345");

        let effects = modal.handle_key(KeyInput::Enter);
        assert!(effects.dispatches.is_empty());
        assert_eq!(effects.notices[0].message, "CNIC must be exactly 13 digits");
        assert_eq!(modal.core().phase(), Phase::Open);
    }

    #[test]
    fn test_submit_sends_host_id() {
        let mut modal = opened();
        type_text(&mut modal, "Ayesha Tariq");
        modal.handle_key(KeyInput::Tab);
        type_text(&mut modal, "35202-9876543-2");
        modal.handle_key(KeyInput::Tab);
        type_text(&mut modal, "Daughter");

        let effects = modal.handle_key(KeyInput::Enter);
        match &effects.dispatches[0].call {
            ApiCall::AddFamilyMember(member) => {
                assert_eq!(member.host_person_id, 12);
                assert_eq!(member.cnic, "3520298765432");
                assert_eq!(member.relation, "Daughter");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_open_close_round_trip_resets_form() {
        let mut modal = opened();
        type_text(&mut modal, "Half typed");
        modal.handle_key(KeyInput::Esc);

        assert!(modal.form().unwrap().is_pristine());
        assert!(modal.host().is_none());
    }
}
