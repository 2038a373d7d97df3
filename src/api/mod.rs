// 🌐 Gate API - the JSON-over-HTTP contract the front end talks to
//
// Every response carries a boolean `success`; a missing or false flag is a
// failure whatever the HTTP status. Failures come in exactly two kinds,
// transport and application, and both are rendered as one notification.

pub mod dispatch;
pub mod http;

pub use dispatch::{Completion, Dispatch, Dispatcher, Ticket, WorkflowKind};
pub use http::HttpGateApi;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::entities::{
    CardRequest, Category, FamilyMember, GuestRegistration, GuestVisit, IssuedCard, MasterEntry,
    NewMasterEntry, Operator, OperatorUpdate, Person, PersonRegistration, PersonSummary,
};

/// Generic text for transport failures
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check the connection and try again.";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Request rejected, timed out, network down, or body unreadable
    #[error("transport failure: {0}")]
    Transport(String),

    /// Well-formed response with `success` false or absent
    #[error("{}", .message.as_deref().unwrap_or("request rejected by server"))]
    Application { message: Option<String> },
}

impl ApiError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        ApiError::Transport(err.to_string())
    }

    /// Text for the operator.
    ///
    /// Transport failures always use [`NETWORK_ERROR_MESSAGE`]; application
    /// failures use the server's message or `fallback` when it sent none.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Transport(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Application { message: Some(m) } if !m.trim().is_empty() => m.clone(),
            ApiError::Application { .. } => fallback.to_string(),
        }
    }
}

// ============================================================================
// ENVELOPE
// ============================================================================

/// Accept `body` if any of `flags` is `true`, otherwise turn it into an
/// application failure carrying the server's `message`.
pub fn check_envelope(body: Value, flags: &[&str]) -> Result<Value, ApiError> {
    let ok = flags
        .iter()
        .any(|flag| body.get(*flag).and_then(Value::as_bool) == Some(true));

    if ok {
        Ok(body)
    } else {
        Err(ApiError::Application {
            message: message_of(&body),
        })
    }
}

/// `message` (or `error`) string of a response body
pub fn message_of(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Deserialize one field of a successful response
pub fn field<T: DeserializeOwned>(body: &Value, key: &str) -> Result<T, ApiError> {
    let raw = body
        .get(key)
        .ok_or_else(|| ApiError::Transport(format!("response is missing `{}`", key)))?;
    serde_json::from_value(raw.clone())
        .map_err(|e| ApiError::Transport(format!("malformed `{}`: {}", key, e)))
}

// ============================================================================
// CALLS AND REPLIES
// ============================================================================

/// One request against the contract
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    GenerateCard(CardRequest),
    PersonDetails { person_id: i64 },
    AddFamilyMember(FamilyMember),
    CheckedInGuests,
    CheckoutGuest { transaction_id: String },
    RegisterGuest(GuestRegistration),
    CreateMasterEntry(NewMasterEntry),
    CheckedInMasterEntries,
    CheckoutMasterEntry { id: i64 },
    Categories,
    People,
    RegisterPerson(PersonRegistration),
    Operators,
    UpdateOperator { id: i64, update: OperatorUpdate },
    DeleteOperators { ids: Vec<i64> },
}

impl ApiCall {
    /// Method and path, for logs
    pub fn describe(&self) -> String {
        match self {
            ApiCall::GenerateCard(_) => "POST /api/generate-card".to_string(),
            ApiCall::PersonDetails { person_id } => format!("GET /api/person-details/{}", person_id),
            ApiCall::AddFamilyMember(_) => "POST /api/add-family-member".to_string(),
            ApiCall::CheckedInGuests => "GET /api/guests/checked-in".to_string(),
            ApiCall::CheckoutGuest { .. } => "POST /api/guests/checkout".to_string(),
            ApiCall::RegisterGuest(_) => "POST /api/guests/register".to_string(),
            ApiCall::CreateMasterEntry(_) => "POST /api/master-entries".to_string(),
            ApiCall::CheckedInMasterEntries => "GET /api/master-entries/checked-in".to_string(),
            ApiCall::CheckoutMasterEntry { id } => {
                format!("PUT /api/master-entries/{}/checkout", id)
            }
            ApiCall::Categories => "GET /api/categories".to_string(),
            ApiCall::People => "GET /api/people".to_string(),
            ApiCall::RegisterPerson(_) => "POST /api/register-person".to_string(),
            ApiCall::Operators => "GET /api/operators".to_string(),
            ApiCall::UpdateOperator { id, .. } => format!("POST /dashboard/operator/update/{}", id),
            ApiCall::DeleteOperators { .. } => "POST /dashboard/operator/delete".to_string(),
        }
    }
}

/// Successful result of an [`ApiCall`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiReply {
    CardIssued(IssuedCard),
    PersonDetails(PersonSummary),
    CheckedInGuests(Vec<GuestVisit>),
    CheckedInMasterEntries(Vec<MasterEntry>),
    Categories(Vec<Category>),
    People(Vec<Person>),
    PersonRegistered {
        card_number: Option<String>,
        message: Option<String>,
    },
    Operators(Vec<Operator>),
    /// Mutations that only report success and an optional message
    Ack { message: Option<String> },
}

/// Anything that can carry out [`ApiCall`]s.
///
/// `HttpGateApi` is the real implementation; tests substitute scripted ones.
#[async_trait]
pub trait GateApi: Send + Sync {
    async fn execute(&self, call: ApiCall) -> Result<ApiReply, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let body = check_envelope(json!({"success": true, "data": []}), &["success"]).unwrap();
        assert_eq!(body["data"], json!([]));
    }

    #[test]
    fn test_envelope_false_carries_message() {
        let err = check_envelope(json!({"success": false, "message": "X"}), &["success"]).unwrap_err();
        assert_eq!(err, ApiError::Application { message: Some("X".to_string()) });
        assert_eq!(err.user_message("fallback"), "X");
    }

    #[test]
    fn test_envelope_missing_flag_is_failure() {
        let err = check_envelope(json!({"data": []}), &["success"]).unwrap_err();
        assert_eq!(err.user_message("Could not load guests"), "Could not load guests");
    }

    #[test]
    fn test_envelope_non_bool_flag_is_failure() {
        assert!(check_envelope(json!({"success": "true"}), &["success"]).is_err());
    }

    #[test]
    fn test_envelope_alternate_flag() {
        assert!(check_envelope(json!({"ok": true}), &["success", "ok"]).is_ok());
    }

    #[test]
    fn test_transport_uses_generic_text() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.user_message("ignored"), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn test_field_missing_is_transport() {
        let result: Result<Vec<GuestVisit>, _> = field(&json!({"success": true}), "data");
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }
}
