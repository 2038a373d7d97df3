// End-to-end checks of the HTTP client against the in-memory dev server
#![cfg(feature = "server")]

use std::sync::Arc;
use std::time::Duration;

use garrison_gate::api::{ApiCall, ApiError, ApiReply, GateApi, HttpGateApi, NETWORK_ERROR_MESSAGE};
use garrison_gate::dev_server::{router, DevState};
use garrison_gate::entities::{
    CardRequest, FamilyMember, GuestRegistration, NewMasterEntry, OperatorUpdate,
    PersonRegistration,
};
use garrison_gate::modal::{GuestRegistrationModal, KeyInput, Modal, ModalCore};
use garrison_gate::{Dispatcher, WorkflowKind};

const HOST_CNIC: &str = "3520212345671";

async fn spawn_server(state: DevState) -> HttpGateApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    HttpGateApi::new(&format!("http://{}", addr), Some(Duration::from_secs(5))).unwrap()
}

fn guest(first: &str, last: &str, cnic: &str) -> GuestRegistration {
    GuestRegistration {
        first_name: first.to_string(),
        last_name: last.to_string(),
        cnic_number: cnic.to_string(),
    }
}

#[tokio::test]
async fn test_guest_register_list_checkout() {
    let api = spawn_server(DevState::seeded()).await;

    api.register_guest(&guest("Bilal", "Ahmed", "6110112345679")).await.unwrap();
    let guests = api.checked_in_guests().await.unwrap();
    assert_eq!(guests.len(), 1);
    assert_eq!(guests[0].guest_name, "Bilal Ahmed");

    let reply = api.checkout_guest(&guests[0].transaction_id).await.unwrap();
    assert_eq!(
        reply,
        ApiReply::Ack {
            message: Some("Guest checked out successfully".to_string())
        }
    );
    assert!(api.checked_in_guests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_guest_reports_server_message() {
    let api = spawn_server(DevState::seeded()).await;

    api.register_guest(&guest("Sana", "Khan", "6110112345679")).await.unwrap();
    let err = api
        .register_guest(&guest("Sana", "Khan", "6110112345679"))
        .await
        .unwrap_err();

    assert_eq!(err.user_message("fallback"), "Guest is already checked in");
}

#[tokio::test]
async fn test_unknown_checkout_is_application_error() {
    let api = spawn_server(DevState::seeded()).await;

    let err = api.checkout_guest("no-such-visit").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Application {
            message: Some("Guest visit not found".to_string())
        }
    );
}

#[tokio::test]
async fn test_closed_port_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpGateApi::new(&format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();
    let err = api.checked_in_guests().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.user_message("Could not load"), NETWORK_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_card_generation_and_person_registration() {
    let api = spawn_server(DevState::seeded()).await;

    let card = api
        .generate_card(&CardRequest {
            cnic: "4210187654321".to_string(),
            name: "Capt. Usman".to_string(),
        })
        .await
        .unwrap();
    assert!(!card.card_number.is_empty());
    assert!(card.card_issued_date.is_some());

    let categories = api.categories().await.unwrap();
    assert_eq!(categories.len(), 3);

    let (card_number, _) = api
        .register_person(&PersonRegistration {
            name: "Capt. Usman".to_string(),
            cnic: "4210187654321".to_string(),
            phone: Some("0300-1234567".to_string()),
            address: None,
            category_id: categories[0].id,
            card_number: Some(card.card_number.clone()),
        })
        .await
        .unwrap();
    assert_eq!(card_number, Some(card.card_number));

    let people = api.people().await.unwrap();
    assert!(people.iter().any(|p| p.name == "Capt. Usman"));
}

#[tokio::test]
async fn test_family_member_under_host() {
    let state = DevState::seeded();
    let api = spawn_server(state.clone()).await;

    let host = api
        .people()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.cnic == HOST_CNIC)
        .unwrap();
    let details = api.person_details(host.id).await.unwrap();
    assert_eq!(details.cnic, HOST_CNIC);

    api.add_family_member(&FamilyMember {
        host_person_id: host.id,
        name: "Ayesha Tariq".to_string(),
        cnic: "3520298765432".to_string(),
        phone: String::new(),
        emergency_contact: String::new(),
        relation: "Daughter".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(state.family_count(), 1);

    let err = api.person_details(9999).await.unwrap_err();
    assert_eq!(err.user_message("fallback"), "Person not found");
}

#[tokio::test]
async fn test_master_entry_create_and_checkout() {
    let api = spawn_server(DevState::seeded()).await;

    api.create_master_entry(&NewMasterEntry {
        description: "Wedding party bus".to_string(),
        people_count: 42,
    })
    .await
    .unwrap();

    let entries = api.checked_in_master_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].people_count, 42);

    api.checkout_master_entry(entries[0].id).await.unwrap();
    assert!(api.checked_in_master_entries().await.unwrap().is_empty());
    assert!(api.checkout_master_entry(entries[0].id).await.is_err());
}

#[tokio::test]
async fn test_operator_update_follows_redirect() {
    let api = spawn_server(DevState::seeded()).await;

    let operator = api.operators().await.unwrap().remove(0);
    api.update_operator(
        operator.id,
        &OperatorUpdate {
            name: "Naik Imran Ali".to_string(),
            cnic: operator.cnic.clone(),
        },
    )
    .await
    .unwrap();

    let updated = api.operators().await.unwrap();
    assert_eq!(updated[0].name, "Naik Imran Ali");

    let err = api
        .update_operator(
            9999,
            &OperatorUpdate {
                name: "Nobody".to_string(),
                cnic: operator.cnic,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.user_message("fallback"), "Operator not found");
}

#[tokio::test]
async fn test_operator_delete_accepts_ok_flag() {
    let api = spawn_server(DevState::seeded()).await;

    let ids: Vec<i64> = api.operators().await.unwrap().iter().map(|o| o.id).collect();
    let reply = api.delete_operators(&ids).await.unwrap();

    assert_eq!(
        reply,
        ApiReply::Ack {
            message: Some("2 operator(s) deleted".to_string())
        }
    );
    assert!(api.operators().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_execute_maps_calls() {
    let api = spawn_server(DevState::seeded()).await;

    match api.execute(ApiCall::Categories).await.unwrap() {
        ApiReply::Categories(categories) => assert_eq!(categories[0].name, "Staff"),
        other => panic!("unexpected reply {:?}", other),
    }
}

/// A modal driven through the dispatcher against the dev server
#[test]
fn test_guest_registration_modal_end_to_end() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let api = runtime.block_on(spawn_server(DevState::seeded()));
    let (dispatcher, mut completions) = Dispatcher::new(runtime.handle().clone(), Arc::new(api));

    let mut modal = GuestRegistrationModal::new(ModalCore::new(WorkflowKind::GuestRegistration));
    modal.open();
    for c in "Hamza".chars() {
        modal.handle_key(KeyInput::Char(c));
    }
    modal.handle_key(KeyInput::Tab);
    for c in "Iqbal".chars() {
        modal.handle_key(KeyInput::Char(c));
    }
    modal.handle_key(KeyInput::Tab);
    for c in "61101-1234567-9".chars() {
        modal.handle_key(KeyInput::Char(c));
    }

    let effects = modal.handle_key(KeyInput::Enter);
    assert_eq!(effects.dispatches.len(), 1);
    dispatcher.send_all(effects.dispatches);

    let completion = runtime.block_on(completions.recv()).unwrap();
    let effects = modal.on_reply(completion.ticket, completion.result);

    assert!(!modal.is_open());
    assert!(!effects.has_error());
    assert_eq!(effects.notices[0].message, "Guest registered successfully");
}
