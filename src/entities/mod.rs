// Entity Models - transport shapes exchanged with the gate backend
//
// The client holds no authoritative state: every entity here is read from or
// written to the JSON contract and thrown away after the next reload.

pub mod family;
pub mod master_entry;
pub mod operator;
pub mod person;
pub mod visit;

pub use family::FamilyMember;
pub use master_entry::{MasterEntry, NewMasterEntry};
pub use operator::{Operator, OperatorDeletion, OperatorUpdate};
pub use person::{CardRequest, Category, IssuedCard, Person, PersonRegistration, PersonSummary};
pub use visit::{GuestRegistration, GuestVisit};

use serde::{Deserialize, Deserializer};

/// Accept an identifier sent either as a JSON string or as a number.
///
/// The backend is not consistent about this (`transaction_id` comes back as
/// an integer from some deployments and a string from others).
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

/// Same as [`string_or_number`], but for integer identifiers that may arrive
/// quoted.
pub(crate) fn number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
