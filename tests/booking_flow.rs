//! End-to-end booking session tests against the public API

use frete::domain::catalog::GenderOption;
use frete::domain::BookingStatus;
use frete::infra::{Config, Key, Metrics};
use frete::io::deep_link::decode_message;
use frete::io::{HeadlessMap, LocalIdentityProvider, RecordingOpener};
use frete::services::{AuthBridge, AuthModal, AuthMode, BookingSession, Credentials};
use std::sync::Arc;
use std::time::Duration;

fn create_session() -> (BookingSession, Arc<RecordingOpener>, Arc<Metrics>) {
    let opener = Arc::new(RecordingOpener::new());
    let metrics = Arc::new(Metrics::new());
    let config = Config::default().with_tracker_seed(11);
    let session = BookingSession::new(&config, Box::new(HeadlessMap::new()), opener.clone(), metrics.clone());
    (session, opener, metrics)
}

#[tokio::test(start_paused = true)]
async fn test_varsity_unisex_25_booking() {
    let (mut session, opener, metrics) = create_session();

    session.pick_category("varsity").unwrap();
    assert!(session.panels().gender_sheet);
    session.pick_gender(GenderOption::Unisex).unwrap();
    assert!(session.panels().quantity_prompt);
    session.set_quantity_raw("25").unwrap();
    session.confirm_quantity().unwrap();

    assert_eq!(session.flow().status(), BookingStatus::Confirmed);
    assert!(session.panels().confirmation_banner);
    assert_eq!(opener.count(), 1);
    let link = &opener.opened()[0];
    assert!(link.starts_with("https://wa.me/916388194021?text="));
    assert_eq!(
        decode_message(link).unwrap(),
        "Hi Frete! Category: Varsity Jacket | For: Unisex | Quantity: 25\n"
    );

    let mut positions = session.positions();
    tokio::time::sleep(Duration::from_millis(3010)).await;
    assert!(session.tracker().is_running());
    assert_eq!(session.tracker().active_timers(), 1);
    assert!(positions.has_changed().unwrap());
    assert!(metrics.tracker_ticks() >= 1);

    session.shutdown().await;
    assert_eq!(session.tracker().active_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_second_booking_reopens_prompt_with_last_quantity() {
    let (mut session, opener, _) = create_session();

    session.pick_category("hoodie").unwrap();
    session.pick_gender(GenderOption::Female).unwrap();
    session.increment_quantity().unwrap();
    session.confirm_quantity().unwrap();
    let first_id = session.last_booking().unwrap().booking_id.clone();

    session.pick_category("jersey").unwrap();
    assert_eq!(session.flow().status(), BookingStatus::AwaitingGender);
    session.pick_gender(GenderOption::Male).unwrap();
    assert_eq!(session.prompt_quantity().unwrap().get(), 15);
    session.confirm_quantity().unwrap();

    assert_eq!(opener.count(), 2);
    assert_ne!(session.last_booking().unwrap().booking_id, first_id);
    // Still a single tracker loop
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.tracker().active_timers(), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn test_escape_closes_prompt_without_booking() {
    let (mut session, opener, _) = create_session();
    session.pick_category("polo").unwrap();
    session.pick_gender(GenderOption::Male).unwrap();
    assert_eq!(session.keys().listener_count(), 1);

    assert!(session.handle_key(Key::Escape));
    assert_eq!(session.keys().listener_count(), 0);
    assert_eq!(session.flow().status(), BookingStatus::AwaitingQuantity);
    assert!(!session.panels().quantity_prompt);
    assert_eq!(opener.count(), 0);
    assert!(!session.tracker().is_running());
}

#[tokio::test]
async fn test_contact_enquiry() {
    let (mut session, opener, _) = create_session();
    let form = session.contact_mut();
    form.name = "Jane".to_string();
    form.phone = "98765 43210".to_string();
    form.message = "40 team jerseys".to_string();

    let link = session.submit_contact().unwrap();
    assert_eq!(opener.opened(), vec![link.clone()]);
    assert_eq!(
        decode_message(&link).unwrap(),
        "Enquiry via Frete website\nName: Jane\nPhone: 98765 43210\nMessage: 40 team jerseys\n"
    );
}

#[tokio::test]
async fn test_auth_round_trip_with_local_provider() {
    let metrics = Arc::new(Metrics::new());
    let bridge = AuthBridge::init(Arc::new(LocalIdentityProvider::new()), metrics.clone());
    let mut changes = bridge.subscribe();

    let mut modal = AuthModal::new();
    modal.open(AuthMode::SignUp);
    modal.email = "team@frete.example".to_string();
    modal.password = "short".to_string();
    assert!(modal.submit(&bridge).await.is_none());
    assert!(modal.error().unwrap().starts_with("WEAK_PASSWORD"));

    modal.password = "longenough".to_string();
    let user = modal.submit(&bridge).await.unwrap();
    assert!(changes.has_changed().unwrap());
    assert_eq!(changes.borrow_and_update().as_ref().map(|u| u.uid.clone()), Some(user.uid.clone()));

    bridge.sign_out().await.unwrap();
    assert!(bridge.current_user().is_none());
    let again = bridge
        .sign_in(&Credentials::email_password("team@frete.example", "longenough"))
        .await
        .unwrap();
    assert_eq!(again.uid, user.uid);
    assert_eq!(metrics.auth_failures(), 1);
}
