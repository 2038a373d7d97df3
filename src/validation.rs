// 📐 Form Validation - guards the Open → Submitting transition
// A failed check aborts the submit with a message and no network call.

use regex::Regex;
use std::sync::OnceLock;

use crate::cnic;

/// Minimum length of a full name (person, family member, operator)
pub const MIN_NAME_LEN: usize = 3;

/// Minimum length of a guest's first or last name
pub const MIN_PART_NAME_LEN: usize = 2;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// FORM VALIDATOR
// ============================================================================

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9+\- ]{7,15}$").expect("phone pattern compiles"))
}

/// Collects at most one error per field, in the order checks are made.
pub struct FormValidator {
    context: String,
    errors: Vec<ValidationError>,
}

impl FormValidator {
    pub fn new(context: &str) -> Self {
        FormValidator {
            context: context.to_string(),
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &str, message: String) {
        if self.errors.iter().any(|e| e.field == field) {
            return;
        }
        self.errors.push(ValidationError {
            field: field.to_string(),
            message,
            context: self.context.clone(),
        });
    }

    pub fn required(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, format!("{} is required", label));
        }
        self
    }

    pub fn min_len(&mut self, field: &str, label: &str, value: &str, min: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            self.fail(field, format!("{} is required", label));
        } else if len < min {
            self.fail(
                field,
                format!("{} must be at least {} characters", label, min),
            );
        }
        self
    }

    pub fn cnic(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.fail(field, format!("{} is required", label));
        } else if !cnic::is_valid(value) {
            self.fail(
                field,
                format!("{} must be exactly {} digits", label, cnic::CNIC_LEN),
            );
        }
        self
    }

    /// Optional phone number: empty passes, anything else must look like one
    pub fn phone(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        let value = value.trim();
        if !value.is_empty() && !phone_pattern().is_match(value) {
            self.fail(field, format!("{} is not a valid phone number", label));
        }
        self
    }

    pub fn positive_count(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        match value.trim().parse::<u32>() {
            Ok(n) if n > 0 => {}
            _ => self.fail(field, format!("{} must be a whole number above zero", label)),
        }
        self
    }

    pub fn finish(self) -> ValidationResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Message shown to the operator for a failed validation (first error wins)
pub fn first_message(errors: &[ValidationError]) -> String {
    errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "Please check the form".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_form_passes() {
        let mut v = FormValidator::new("Guest");
        v.min_len("first_name", "First name", "Ali", MIN_PART_NAME_LEN)
            .cnic("cnic_number", "CNIC", "3520212345671");
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_short_cnic_rejected() {
        let mut v = FormValidator::new("Guest");
        v.cnic("cnic_number", "CNIC", "35202");
        let errors = v.finish().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "cnic_number");
        assert_eq!(errors[0].message, "CNIC must be exactly 13 digits");
    }

    #[test]
    fn test_one_error_per_field() {
        let mut v = FormValidator::new("Person");
        v.required("name", "Name", "")
            .min_len("name", "Name", "", MIN_NAME_LEN);
        assert_eq!(v.finish().unwrap_err().len(), 1);
    }

    #[test]
    fn test_min_len_counts_trimmed_chars() {
        let mut v = FormValidator::new("Person");
        v.min_len("name", "Name", "  Al  ", MIN_NAME_LEN);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors[0].message, "Name must be at least 3 characters");
    }

    #[test]
    fn test_phone_optional_but_checked() {
        let mut ok = FormValidator::new("Family");
        ok.phone("phone", "Phone", "").phone("emergency_contact", "Emergency contact", "+92 300-1234567");
        assert!(ok.finish().is_ok());

        let mut bad = FormValidator::new("Family");
        bad.phone("phone", "Phone", "call me");
        assert!(bad.finish().is_err());
    }

    #[test]
    fn test_positive_count() {
        let mut v = FormValidator::new("Master entry");
        v.positive_count("people_count", "People count", "0");
        assert!(v.finish().is_err());

        let mut v = FormValidator::new("Master entry");
        v.positive_count("people_count", "People count", "12");
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_first_message() {
        let mut v = FormValidator::new("Guest");
        v.required("first_name", "First name", "")
            .cnic("cnic_number", "CNIC", "1");
        let errors = v.finish().unwrap_err();
        assert_eq!(first_message(&errors), "First name is required");
    }
}
