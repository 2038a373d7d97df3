// 🪪 Register Person - category lookup, card generation, registration
//
// Two actions share the Submitting phase: Ctrl+G asks the backend for a card
// number and keeps the modal open; Enter registers the person and closes.

use super::{edit_form, unexpected, Effects, KeyInput, Modal, ModalCore, Phase, RefreshTarget};
use crate::api::{ApiCall, ApiError, ApiReply, Ticket};
use crate::entities::{CardRequest, PersonRegistration};
use crate::form::{Field, FieldKind, Form};
use crate::notify::Notification;
use crate::validation::{FormValidator, ValidationResult, MIN_NAME_LEN};

const LOAD_FAILED: &str = "Could not load categories";
const CARD_FAILED: &str = "Failed to generate card";
const SUBMIT_FAILED: &str = "Failed to register person";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Card,
    Register,
}

pub struct PersonRegistrationModal {
    core: ModalCore,
    form: Form,
    pending: Option<Pending>,
}

impl PersonRegistrationModal {
    pub fn new(core: ModalCore) -> Self {
        PersonRegistrationModal {
            core,
            form: Form::new(vec![
                Field::new("name", "Name", FieldKind::Text),
                Field::new("cnic", "CNIC", FieldKind::Cnic),
                Field::new("phone", "Phone", FieldKind::Text),
                Field::new("address", "Address", FieldKind::Text),
                Field::new("category_id", "Category", FieldKind::Choice(Vec::new())),
                Field::new("card_number", "Card number", FieldKind::ReadOnly),
            ]),
            pending: None,
        }
    }

    /// Clear the form and load the category choices
    pub fn open(&mut self) -> Effects {
        self.reset();
        let ticket = self.core.open(true);
        Effects::dispatch(ticket, ApiCall::Categories)
    }

    pub fn card_number(&self) -> String {
        self.form.value("card_number")
    }

    fn validate_identity(&self, v: &mut FormValidator) {
        v.min_len("name", "Name", &self.form.value("name"), MIN_NAME_LEN)
            .cnic("cnic", "CNIC", &self.form.value("cnic"));
    }

    pub fn validate(&self) -> ValidationResult {
        let mut v = FormValidator::new("Person");
        self.validate_identity(&mut v);
        v.phone("phone", "Phone", &self.form.value("phone"));
        if self.form.selected_id("category_id").is_none() {
            v.required("category_id", "Category", "");
        }
        v.finish()
    }

    /// Ask the backend for a card number for the typed name and CNIC
    pub fn generate_card(&mut self) -> Effects {
        if self.core.phase() != Phase::Open {
            return Effects::none();
        }
        let mut v = FormValidator::new("Card");
        self.validate_identity(&mut v);
        if let Err(errors) = v.finish() {
            return self.core.invalid(&errors);
        }

        let request = CardRequest {
            cnic: self.form.value("cnic"),
            name: self.form.value("name"),
        };
        match self.core.begin_submit() {
            Some(ticket) => {
                self.pending = Some(Pending::Card);
                Effects::dispatch(ticket, ApiCall::GenerateCard(request))
            }
            None => Effects::none(),
        }
    }

    pub fn submit(&mut self) -> Effects {
        if self.core.phase() != Phase::Open {
            return Effects::none();
        }
        if let Err(errors) = self.validate() {
            return self.core.invalid(&errors);
        }
        let Some(category_id) = self.form.selected_id("category_id") else {
            return Effects::none();
        };

        let registration = PersonRegistration {
            name: self.form.value("name"),
            cnic: self.form.value("cnic"),
            phone: self.form.optional("phone"),
            address: self.form.optional("address"),
            category_id,
            card_number: self.form.optional("card_number"),
        };
        match self.core.begin_submit() {
            Some(ticket) => {
                self.pending = Some(Pending::Register);
                Effects::dispatch(ticket, ApiCall::RegisterPerson(registration))
            }
            None => Effects::none(),
        }
    }

    fn retry(&mut self) -> Effects {
        match self.core.begin_retry() {
            Some(ticket) => Effects::dispatch(ticket, ApiCall::Categories),
            None => Effects::none(),
        }
    }

    fn on_card(&mut self, result: Result<ApiReply, ApiError>) -> Effects {
        match result {
            Ok(ApiReply::CardIssued(card)) => {
                self.form.set_value("card_number", &card.card_number);
                let mut text = card
                    .message
                    .unwrap_or_else(|| format!("Card {} generated", card.card_number));
                if let Some(date) = card.card_issued_date {
                    text = format!("{} (issued {})", text, date);
                }
                Effects::notify(Notification::success(text))
            }
            Ok(other) => self.core.submit_failed(&unexpected(&other), CARD_FAILED),
            Err(e) => self.core.submit_failed(&e, CARD_FAILED),
        }
    }

    fn on_registered(&mut self, result: Result<ApiReply, ApiError>) -> Effects {
        match result {
            Ok(ApiReply::PersonRegistered {
                card_number,
                message,
            }) => {
                let message = message.unwrap_or_else(|| match card_number {
                    Some(card) => format!("Person registered with card {}", card),
                    None => "Person registered successfully".to_string(),
                });
                let effects = self.core.succeeded(message, RefreshTarget::People);
                self.reset();
                effects
            }
            Ok(other) => self.core.submit_failed(&unexpected(&other), SUBMIT_FAILED),
            Err(e) => self.core.submit_failed(&e, SUBMIT_FAILED),
        }
    }
}

impl Modal for PersonRegistrationModal {
    fn core(&self) -> &ModalCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ModalCore {
        &mut self.core
    }

    fn reset(&mut self) {
        self.form.reset();
        self.pending = None;
    }

    fn form(&self) -> Option<&Form> {
        Some(&self.form)
    }

    fn handle_key(&mut self, key: KeyInput) -> Effects {
        match (key, self.core.phase()) {
            (KeyInput::Esc, _) => self.close(),
            (KeyInput::Enter, Phase::LoadFailed) => return self.retry(),
            (KeyInput::Enter, _) => return self.submit(),
            (KeyInput::Ctrl('g'), _) => return self.generate_card(),
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
                Ok(ApiReply::Categories(categories)) => {
                    let choices = categories.into_iter().map(|c| (c.id, c.name)).collect();
                    self.form.set_choices("category_id", choices);
                    Effects::none()
                }
                Ok(other) => self.core.load_failed(&unexpected(&other), LOAD_FAILED),
                Err(e) => self.core.load_failed(&e, LOAD_FAILED),
            },
            Some(Phase::Submitting) => match self.pending.take() {
                Some(Pending::Card) => self.on_card(result),
                Some(Pending::Register) => self.on_registered(result),
                None => Effects::none(),
            },
            _ => Effects::none(),
        }
    }
}
