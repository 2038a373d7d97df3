//! HTTP implementation of [`GateApi`] on top of reqwest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{check_envelope, field, message_of, ApiCall, ApiError, ApiReply, GateApi};
use crate::config::GateConfig;
use crate::entities::{
    CardRequest, Category, FamilyMember, GuestRegistration, GuestVisit, IssuedCard, MasterEntry,
    NewMasterEntry, Operator, OperatorDeletion, OperatorUpdate, Person, PersonRegistration,
    PersonSummary,
};

pub struct HttpGateApi {
    http: Client,
    base_url: String,
}

impl HttpGateApi {
    /// Create a client for `base_url`. `timeout` of None sends untimed requests.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &GateConfig) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send, read the body as JSON, and check the success flag(s)
    async fn send_json(&self, request: RequestBuilder, flags: &[&str]) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(ApiError::transport)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::transport)?;

        let body: Value = serde_json::from_str(&text).map_err(|_| {
            ApiError::Transport(format!(
                "HTTP {}: unreadable response body ({})",
                status,
                text.chars().take(80).collect::<String>()
            ))
        })?;

        check_envelope(body, flags)
    }

    async fn ack(&self, request: RequestBuilder) -> Result<ApiReply, ApiError> {
        let body = self.send_json(request, &["success"]).await?;
        Ok(ApiReply::Ack {
            message: message_of(&body),
        })
    }

    // ========================================================================
    // PEOPLE & CARDS
    // ========================================================================

    pub async fn generate_card(&self, card: &CardRequest) -> Result<IssuedCard, ApiError> {
        let body = self
            .send_json(self.http.post(self.url("/api/generate-card")).json(card), &["success"])
            .await?;

        Ok(IssuedCard {
            card_number: field(&body, "card_number")?,
            card_issued_date: body
                .get("card_issued_date")
                .and_then(Value::as_str)
                .map(str::to_string),
            message: message_of(&body),
        })
    }

    pub async fn person_details(&self, person_id: i64) -> Result<PersonSummary, ApiError> {
        let path = format!("/api/person-details/{}", person_id);
        let body = self.send_json(self.http.get(self.url(&path)), &["success"]).await?;
        field(&body, "person")
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let body = self
            .send_json(self.http.get(self.url("/api/categories")), &["success"])
            .await?;
        field(&body, "categories")
    }

    pub async fn people(&self) -> Result<Vec<Person>, ApiError> {
        let body = self
            .send_json(self.http.get(self.url("/api/people")), &["success"])
            .await?;
        field(&body, "people")
    }

    pub async fn register_person(
        &self,
        registration: &PersonRegistration,
    ) -> Result<(Option<String>, Option<String>), ApiError> {
        let body = self
            .send_json(
                self.http.post(self.url("/api/register-person")).json(registration),
                &["success"],
            )
            .await?;

        let card_number = body.get("card_number").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Ok((card_number, message_of(&body)))
    }

    pub async fn add_family_member(&self, member: &FamilyMember) -> Result<ApiReply, ApiError> {
        self.ack(self.http.post(self.url("/api/add-family-member")).json(member))
            .await
    }

    // ========================================================================
    // GUESTS
    // ========================================================================

    pub async fn checked_in_guests(&self) -> Result<Vec<GuestVisit>, ApiError> {
        let body = self
            .send_json(self.http.get(self.url("/api/guests/checked-in")), &["success"])
            .await?;
        field(&body, "data")
    }

    pub async fn checkout_guest(&self, transaction_id: &str) -> Result<ApiReply, ApiError> {
        let payload = serde_json::json!({ "transaction_id": transaction_id });
        self.ack(self.http.post(self.url("/api/guests/checkout")).json(&payload))
            .await
    }

    pub async fn register_guest(&self, guest: &GuestRegistration) -> Result<ApiReply, ApiError> {
        self.ack(self.http.post(self.url("/api/guests/register")).json(guest))
            .await
    }

    // ========================================================================
    // MASTER ENTRIES
    // ========================================================================

    pub async fn create_master_entry(&self, entry: &NewMasterEntry) -> Result<ApiReply, ApiError> {
        self.ack(self.http.post(self.url("/api/master-entries")).json(entry))
            .await
    }

    pub async fn checked_in_master_entries(&self) -> Result<Vec<MasterEntry>, ApiError> {
        let body = self
            .send_json(
                self.http.get(self.url("/api/master-entries/checked-in")),
                &["success"],
            )
            .await?;
        field(&body, "entries")
    }

    pub async fn checkout_master_entry(&self, id: i64) -> Result<ApiReply, ApiError> {
        let path = format!("/api/master-entries/{}/checkout", id);
        self.ack(self.http.put(self.url(&path))).await
    }

    // ========================================================================
    // OPERATORS
    // ========================================================================

    pub async fn operators(&self) -> Result<Vec<Operator>, ApiError> {
        let body = self
            .send_json(self.http.get(self.url("/api/operators")), &["success"])
            .await?;
        field(&body, "operators")
    }

    /// Plain form POST; the server answers with a redirect, which reqwest
    /// follows. Success is a 2xx status on the final response.
    pub async fn update_operator(&self, id: i64, update: &OperatorUpdate) -> Result<ApiReply, ApiError> {
        let path = format!("/dashboard/operator/update/{}", id);
        let response = self
            .http
            .post(self.url(&path))
            .form(update)
            .send()
            .await
            .map_err(ApiError::transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(ApiReply::Ack { message: None });
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| message_of(&body));
        debug!("operator update answered {}", status);
        Err(ApiError::Application { message })
    }

    pub async fn delete_operators(&self, ids: &[i64]) -> Result<ApiReply, ApiError> {
        let payload = OperatorDeletion {
            selected_ids: ids.to_vec(),
        };
        let body = self
            .send_json(
                self.http.post(self.url("/dashboard/operator/delete")).json(&payload),
                &["success", "ok"],
            )
            .await?;
        Ok(ApiReply::Ack {
            message: message_of(&body),
        })
    }
}

#[async_trait]
impl GateApi for HttpGateApi {
    async fn execute(&self, call: ApiCall) -> Result<ApiReply, ApiError> {
        match call {
            ApiCall::GenerateCard(card) => self.generate_card(&card).await.map(ApiReply::CardIssued),
            ApiCall::PersonDetails { person_id } => self
                .person_details(person_id)
                .await
                .map(ApiReply::PersonDetails),
            ApiCall::AddFamilyMember(member) => self.add_family_member(&member).await,
            ApiCall::CheckedInGuests => self.checked_in_guests().await.map(ApiReply::CheckedInGuests),
            ApiCall::CheckoutGuest { transaction_id } => self.checkout_guest(&transaction_id).await,
            ApiCall::RegisterGuest(guest) => self.register_guest(&guest).await,
            ApiCall::CreateMasterEntry(entry) => self.create_master_entry(&entry).await,
            ApiCall::CheckedInMasterEntries => self
                .checked_in_master_entries()
                .await
                .map(ApiReply::CheckedInMasterEntries),
            ApiCall::CheckoutMasterEntry { id } => self.checkout_master_entry(id).await,
            ApiCall::Categories => self.categories().await.map(ApiReply::Categories),
            ApiCall::People => self.people().await.map(ApiReply::People),
            ApiCall::RegisterPerson(registration) => self
                .register_person(&registration)
                .await
                .map(|(card_number, message)| ApiReply::PersonRegistered { card_number, message }),
            ApiCall::Operators => self.operators().await.map(ApiReply::Operators),
            ApiCall::UpdateOperator { id, update } => self.update_operator(id, &update).await,
            ApiCall::DeleteOperators { ids } => self.delete_operators(&ids).await,
        }
    }
}
