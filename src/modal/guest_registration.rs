// 🧾 Register Guest - check a walk-in guest in

use super::{edit_form, unexpected, Effects, KeyInput, Modal, ModalCore, Phase, RefreshTarget};
use crate::api::{ApiCall, ApiError, ApiReply, Ticket};
use crate::entities::GuestRegistration;
use crate::form::{Field, FieldKind, Form};
use crate::validation::{FormValidator, ValidationResult, MIN_PART_NAME_LEN};

const SUBMIT_FAILED: &str = "Failed to register guest";
const REGISTERED: &str = "Guest registered successfully";

pub struct GuestRegistrationModal {
    core: ModalCore,
    form: Form,
}

impl GuestRegistrationModal {
    pub fn new(core: ModalCore) -> Self {
        GuestRegistrationModal {
            core,
            form: Form::new(vec![
                Field::new("first_name", "First name", FieldKind::Text),
                Field::new("last_name", "Last name", FieldKind::Text),
                Field::new("cnic_number", "CNIC", FieldKind::Cnic),
            ]),
        }
    }

    pub fn open(&mut self) -> Effects {
        self.reset();
        self.core.open(false);
        Effects::none()
    }

    pub fn validate(&self) -> ValidationResult {
        let mut v = FormValidator::new("Guest");
        v.min_len(
            "first_name",
            "First name",
            &self.form.value("first_name"),
            MIN_PART_NAME_LEN,
        )
        .min_len(
            "last_name",
            "Last name",
            &self.form.value("last_name"),
            MIN_PART_NAME_LEN,
        )
        .cnic("cnic_number", "CNIC", &self.form.value("cnic_number"));
        v.finish()
    }

    pub fn submit(&mut self) -> Effects {
        if self.core.phase() != Phase::Open {
            return Effects::none();
        }
        if let Err(errors) = self.validate() {
            return self.core.invalid(&errors);
        }

        let guest = GuestRegistration {
            first_name: self.form.value("first_name"),
            last_name: self.form.value("last_name"),
            cnic_number: self.form.value("cnic_number"),
        };
        match self.core.begin_submit() {
            Some(ticket) => Effects::dispatch(ticket, ApiCall::RegisterGuest(guest)),
            None => Effects::none(),
        }
    }
}

impl Modal for GuestRegistrationModal {
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
                let message = message.unwrap_or_else(|| REGISTERED.to_string());
                let effects = self.core.succeeded(message, RefreshTarget::Guests);
                self.reset();
                effects
            }
            Ok(other) => self.core.submit_failed(&unexpected(&other), SUBMIT_FAILED),
            Err(e) => self.core.submit_failed(&e, SUBMIT_FAILED),
        }
    }
}
