// 🪪 Person Entity - registered residents/staff and their access cards

use serde::{Deserialize, Serialize};

use super::number_or_string;
use crate::cnic;

// ============================================================================
// PERSON
// ============================================================================

/// A registered person, as listed by `GET /api/people`.
///
/// The listing only guarantees `id`, `name` and `cnic`; the card and
/// category are filled in when the backend sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(deserialize_with = "number_or_string")]
    pub id: i64,
    pub name: String,
    pub cnic: String,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl Person {
    /// CNIC in `XXXXX-XXXXXXX-X` grouping for display
    pub fn display_cnic(&self) -> String {
        cnic::display(&self.cnic)
    }
}

/// Host banner shown above the family-member form
/// (`GET /api/person-details/:id` → `person`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub name: String,
    pub cnic: String,
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Person category (staff, resident, contractor, ...), reference data for
/// the registration form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "number_or_string")]
    pub id: i64,
    pub name: String,
}

// ============================================================================
// REQUEST / RESPONSE PAYLOADS
// ============================================================================

/// Body of `POST /api/register-person`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRegistration {
    pub name: String,
    pub cnic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
}

/// Body of `POST /api/generate-card`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRequest {
    pub cnic: String,
    pub name: String,
}

/// Card issued by `POST /api/generate-card`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedCard {
    pub card_number: String,
    #[serde(default)]
    pub card_issued_date: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_accepts_quoted_id_and_missing_card() {
        let person: Person =
            serde_json::from_str(r#"{"id":"42","name":"Asad Khan","cnic":"3520212345671"}"#)
                .unwrap();

        assert_eq!(person.id, 42);
        assert_eq!(person.card_number, None);
        assert_eq!(person.display_cnic(), "35202-1234567-1");
    }

    #[test]
    fn test_registration_omits_empty_optionals() {
        let registration = PersonRegistration {
            name: "Asad Khan".to_string(),
            cnic: "3520212345671".to_string(),
            phone: None,
            address: None,
            category_id: 2,
            card_number: None,
        };

        let json = serde_json::to_value(&registration).unwrap();
        assert!(json.get("phone").is_none());
        assert!(json.get("card_number").is_none());
        assert_eq!(json["category_id"], 2);
    }
}
