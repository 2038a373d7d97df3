// 🧪 Development server - the gate JSON contract served from memory
//
// Lets the dashboard and the HTTP client be exercised without the real
// backend. Nothing is persisted; state lives for the life of the process.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post, put},
    Form, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cnic;
use crate::entities::{
    CardRequest, Category, FamilyMember, GuestRegistration, GuestVisit, MasterEntry,
    NewMasterEntry, Operator, OperatorDeletion, OperatorUpdate, Person, PersonRegistration,
};

/// First card number handed out
const FIRST_CARD: u64 = 10001;

#[derive(Default)]
struct DevStore {
    people: Vec<Person>,
    categories: Vec<Category>,
    visits: Vec<GuestVisit>,
    entries: Vec<MasterEntry>,
    family: Vec<FamilyMember>,
    operators: Vec<Operator>,
    next_id: i64,
    next_card: u64,
}

impl DevStore {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn card(&mut self) -> String {
        let card = self.next_card;
        self.next_card += 1;
        card.to_string()
    }
}

/// Shared state behind the router
#[derive(Clone)]
pub struct DevState {
    store: Arc<Mutex<DevStore>>,
}

impl DevState {
    pub fn empty() -> Self {
        DevState {
            store: Arc::new(Mutex::new(DevStore {
                next_card: FIRST_CARD,
                ..DevStore::default()
            })),
        }
    }

    /// A few categories, one host and two operators to click around with
    pub fn seeded() -> Self {
        let state = DevState::empty();
        {
            let mut store = state.store.lock().unwrap();
            for name in ["Staff", "Resident", "Contractor"] {
                let id = store.id();
                store.categories.push(Category {
                    id,
                    name: name.to_string(),
                });
            }
            let id = store.id();
            let card = store.card();
            store.people.push(Person {
                id,
                name: "Maj. Tariq Mehmood".to_string(),
                cnic: "3520212345671".to_string(),
                card_number: Some(card),
                category_id: Some(1),
            });
            for (name, cnic) in [("Naik Imran", "3740512345671"), ("Hav. Saleem", "6110198765432")] {
                let id = store.id();
                store.operators.push(Operator {
                    id,
                    name: name.to_string(),
                    cnic: cnic.to_string(),
                });
            }
        }
        state
    }

    /// Number of family members registered so far
    pub fn family_count(&self) -> usize {
        self.store.lock().unwrap().family.len()
    }
}

// ============================================================================
// RESPONSE HELPERS
// ============================================================================

fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
        .into_response()
}

fn ack(message: impl Into<String>) -> Response {
    Json(json!({ "success": true, "message": message.into() })).into_response()
}

fn check_cnic(value: &str) -> Result<(), Response> {
    if cnic::is_valid(value) {
        Ok(())
    } else {
        Err(fail(StatusCode::BAD_REQUEST, "CNIC must be exactly 13 digits"))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

// ============================================================================
// PEOPLE & CARDS
// ============================================================================

/// POST /api/generate-card
async fn generate_card(State(state): State<DevState>, Json(req): Json<CardRequest>) -> Response {
    if let Err(resp) = check_cnic(&req.cnic) {
        return resp;
    }
    let mut store = state.store.lock().unwrap();
    let card_number = store.card();
    info!("issued card {} to {}", card_number, req.name);

    Json(json!({
        "success": true,
        "card_number": card_number,
        "card_issued_date": Local::now().format("%Y-%m-%d").to_string(),
        "message": format!("Card {} generated", card_number),
    }))
    .into_response()
}

/// GET /api/person-details/:id
async fn person_details(State(state): State<DevState>, Path(id): Path<i64>) -> Response {
    let store = state.store.lock().unwrap();
    match store.people.iter().find(|p| p.id == id) {
        Some(person) => Json(json!({
            "success": true,
            "person": { "name": person.name, "cnic": person.cnic },
        }))
        .into_response(),
        None => fail(StatusCode::NOT_FOUND, "Person not found"),
    }
}

/// GET /api/categories
async fn categories(State(state): State<DevState>) -> Response {
    let store = state.store.lock().unwrap();
    Json(json!({ "success": true, "categories": store.categories })).into_response()
}

/// GET /api/people
async fn people(State(state): State<DevState>) -> Response {
    let store = state.store.lock().unwrap();
    Json(json!({ "success": true, "people": store.people })).into_response()
}

/// POST /api/register-person
async fn register_person(
    State(state): State<DevState>,
    Json(req): Json<PersonRegistration>,
) -> Response {
    if let Err(resp) = check_cnic(&req.cnic) {
        return resp;
    }
    let mut store = state.store.lock().unwrap();
    if store.people.iter().any(|p| p.cnic == req.cnic) {
        return fail(StatusCode::CONFLICT, "A person with this CNIC is already registered");
    }
    if !store.categories.iter().any(|c| c.id == req.category_id) {
        return fail(StatusCode::BAD_REQUEST, "Unknown category");
    }

    let card_number = match req.card_number {
        Some(card) => card,
        None => store.card(),
    };
    let id = store.id();
    store.people.push(Person {
        id,
        name: req.name,
        cnic: req.cnic,
        card_number: Some(card_number.clone()),
        category_id: Some(req.category_id),
    });

    Json(json!({
        "success": true,
        "card_number": card_number,
        "message": format!("Person registered with card {}", card_number),
    }))
    .into_response()
}

/// POST /api/add-family-member
async fn add_family_member(State(state): State<DevState>, Json(req): Json<FamilyMember>) -> Response {
    if let Err(resp) = check_cnic(&req.cnic) {
        return resp;
    }
    let mut store = state.store.lock().unwrap();
    if !store.people.iter().any(|p| p.id == req.host_person_id) {
        return fail(StatusCode::NOT_FOUND, "Host person not found");
    }
    store.family.push(req);
    ack("Family member added successfully")
}

// ============================================================================
// GUESTS
// ============================================================================

/// GET /api/guests/checked-in
async fn checked_in_guests(State(state): State<DevState>) -> Response {
    let store = state.store.lock().unwrap();
    Json(json!({ "success": true, "data": store.visits })).into_response()
}

/// POST /api/guests/register
async fn register_guest(
    State(state): State<DevState>,
    Json(req): Json<GuestRegistration>,
) -> Response {
    if let Err(resp) = check_cnic(&req.cnic_number) {
        return resp;
    }
    let mut store = state.store.lock().unwrap();
    if store.visits.iter().any(|v| v.guest_cnic == req.cnic_number) {
        return fail(StatusCode::CONFLICT, "Guest is already checked in");
    }
    store.visits.push(GuestVisit {
        transaction_id: uuid::Uuid::new_v4().to_string(),
        guest_name: format!("{} {}", req.first_name, req.last_name),
        guest_cnic: req.cnic_number,
        host_name: String::new(),
        host_cnic: String::new(),
        check_in_time: now(),
    });
    ack("Guest registered successfully")
}

#[derive(Deserialize)]
struct CheckoutRequest {
    transaction_id: String,
}

/// POST /api/guests/checkout
async fn checkout_guest(State(state): State<DevState>, Json(req): Json<CheckoutRequest>) -> Response {
    let mut store = state.store.lock().unwrap();
    let before = store.visits.len();
    store.visits.retain(|v| v.transaction_id != req.transaction_id);

    if store.visits.len() == before {
        fail(StatusCode::NOT_FOUND, "Guest visit not found")
    } else {
        ack("Guest checked out successfully")
    }
}

// ============================================================================
// MASTER ENTRIES
// ============================================================================

/// POST /api/master-entries
async fn create_master_entry(
    State(state): State<DevState>,
    Json(req): Json<NewMasterEntry>,
) -> Response {
    if req.description.trim().is_empty() || req.people_count == 0 {
        return fail(StatusCode::BAD_REQUEST, "Description and people count are required");
    }
    let mut store = state.store.lock().unwrap();
    let id = store.id();
    store.entries.push(MasterEntry {
        id,
        description: req.description,
        people_count: i64::from(req.people_count),
        check_in_time: now(),
    });
    ack("Master entry created successfully")
}

/// GET /api/master-entries/checked-in
async fn checked_in_master_entries(State(state): State<DevState>) -> Response {
    let store = state.store.lock().unwrap();
    Json(json!({ "success": true, "entries": store.entries })).into_response()
}

/// PUT /api/master-entries/:id/checkout
async fn checkout_master_entry(State(state): State<DevState>, Path(id): Path<i64>) -> Response {
    let mut store = state.store.lock().unwrap();
    let before = store.entries.len();
    store.entries.retain(|e| e.id != id);

    if store.entries.len() == before {
        fail(StatusCode::NOT_FOUND, "Master entry not found")
    } else {
        ack("Master entry checked out successfully")
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

/// GET /api/operators
async fn operators(State(state): State<DevState>) -> Response {
    let store = state.store.lock().unwrap();
    Json(json!({ "success": true, "operators": store.operators })).into_response()
}

/// GET /dashboard/operators - where the update form redirects to
async fn operators_page(State(state): State<DevState>) -> impl IntoResponse {
    let store = state.store.lock().unwrap();
    let rows: String = store
        .operators
        .iter()
        .map(|o| {
            format!(
                "<li>{} ({})</li>",
                escape_html(&o.name),
                escape_html(&cnic::display(&o.cnic))
            )
        })
        .collect();
    Html(format!("<h1>Operators</h1><ul>{}</ul>", rows))
}

/// POST /dashboard/operator/update/:id (urlencoded form)
async fn update_operator(
    State(state): State<DevState>,
    Path(id): Path<i64>,
    Form(update): Form<OperatorUpdate>,
) -> Response {
    if let Err(resp) = check_cnic(&update.cnic) {
        return resp;
    }
    let mut store = state.store.lock().unwrap();
    match store.operators.iter_mut().find(|o| o.id == id) {
        Some(operator) => {
            operator.name = update.name;
            operator.cnic = update.cnic;
            Redirect::to("/dashboard/operators").into_response()
        }
        None => fail(StatusCode::NOT_FOUND, "Operator not found"),
    }
}

/// POST /dashboard/operator/delete - answers with `ok`, not `success`
async fn delete_operators(
    State(state): State<DevState>,
    Json(req): Json<OperatorDeletion>,
) -> Response {
    if req.selected_ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "message": "No operators selected" })),
        )
            .into_response();
    }
    let mut store = state.store.lock().unwrap();
    let before = store.operators.len();
    store.operators.retain(|o| !req.selected_ids.contains(&o.id));
    let removed = before - store.operators.len();

    Json(json!({ "ok": true, "message": format!("{} operator(s) deleted", removed) })).into_response()
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(state: DevState) -> Router {
    let api_routes = Router::new()
        .route("/generate-card", post(generate_card))
        .route("/person-details/:id", get(person_details))
        .route("/add-family-member", post(add_family_member))
        .route("/guests/checked-in", get(checked_in_guests))
        .route("/guests/checkout", post(checkout_guest))
        .route("/guests/register", post(register_guest))
        .route("/master-entries", post(create_master_entry))
        .route("/master-entries/checked-in", get(checked_in_master_entries))
        .route("/master-entries/:id/checkout", put(checkout_master_entry))
        .route("/categories", get(categories))
        .route("/people", get(people))
        .route("/register-person", post(register_person))
        .route("/operators", get(operators));

    let dashboard_routes = Router::new()
        .route("/operators", get(operators_page))
        .route("/operator/update/:id", post(update_operator))
        .route("/operator/delete", post(delete_operators));

    Router::new()
        .nest("/api", api_routes)
        .nest("/dashboard", dashboard_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
