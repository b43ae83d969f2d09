//! Unpaid bookings expire and release their table

mod common;

use std::time::Duration;

use booking_server::ServerState;
use booking_server::auth::CurrentUser;
use shared::models::{
    BookingRequest, BookingStatus, DiningTableCreate, FeeSchedule, PaymentStatus, RateCard,
    VenueCreate, VenueKind,
};
use shared::types::Role;

fn user(id: &str, role: Role) -> CurrentUser {
    CurrentUser {
        id: id.into(),
        username: id.into(),
        role,
        permissions: vec![],
    }
}

fn one_table(state: &ServerState) -> i64 {
    state
        .venues
        .create(
            VenueKind::Restaurant,
            VenueCreate {
                name: "Night Owl".into(),
                owner_id: None,
                currency: None,
                rates: RateCard { unit_rate: 80.0 },
                fees: FeeSchedule::default(),
                tables: vec![DiningTableCreate {
                    name: "T1".into(),
                    capacity: 2,
                }],
                rooms: vec![],
                hall: None,
                opening: None,
            },
            &user("owner-1", Role::Owner),
        )
        .expect("venue")
        .id
}

fn dinner() -> BookingRequest {
    BookingRequest {
        date: Some("2030-03-05".into()),
        start_time: Some("18:00".into()),
        end_time: Some("20:00".into()),
        guests: Some(2),
        ..Default::default()
    }
}

async fn wait_for_status(state: &ServerState, booking_id: i64, status: BookingStatus) -> bool {
    for _ in 0..50 {
        let booking = state.storage.get_booking(booking_id).unwrap().unwrap();
        if booking.status == status {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test]
async fn test_unpaid_booking_expires() {
    let mut config = common::config();
    config.payment_timeout_secs = 1;
    let app = common::app_with(config);
    let tasks = app.state.start_background_tasks();

    let venue_id = one_table(&app.state);
    let booking = app
        .state
        .bookings
        .create(
            VenueKind::Restaurant,
            venue_id,
            dinner(),
            &user("guest-1", Role::User),
        )
        .expect("create")
        .booking;
    assert_eq!(booking.status, BookingStatus::Pending);

    assert!(wait_for_status(&app.state, booking.id, BookingStatus::Cancelled).await);
    let expired = app.state.storage.get_booking(booking.id).unwrap().unwrap();
    assert_eq!(expired.payment.status, PaymentStatus::Cancelled);
    assert!(app.state.storage.list_expirations().unwrap().is_empty());

    let venue = app.state.storage.get_venue(venue_id).unwrap().unwrap();
    assert!(!venue.tables[0].is_booked);

    // The freed table can be booked again
    assert!(
        app.state
            .bookings
            .create(
                VenueKind::Restaurant,
                venue_id,
                dinner(),
                &user("guest-2", Role::User),
            )
            .is_ok()
    );

    tasks.shutdown().await;
}

#[tokio::test]
async fn test_deadlines_survive_restart() {
    let mut config = common::config();
    config.payment_timeout_secs = 1;
    let first = common::app_with(config.clone());

    let venue_id = one_table(&first.state);
    let booking = first
        .state
        .bookings
        .create(
            VenueKind::Restaurant,
            venue_id,
            dinner(),
            &user("guest-1", Role::User),
        )
        .expect("create")
        .booking;
    // No worker ever ran for the first instance
    first.state.expiry().shutdown();

    let restarted = ServerState::with_storage(config, first.state.storage.clone());
    let tasks = restarted.start_background_tasks();

    assert!(wait_for_status(&restarted, booking.id, BookingStatus::Cancelled).await);
    let venue = restarted.storage.get_venue(venue_id).unwrap().unwrap();
    assert!(!venue.tables[0].is_booked);

    tasks.shutdown().await;
}

#[tokio::test]
async fn test_paid_booking_is_not_expired() {
    let mut config = common::config();
    config.payment_timeout_secs = 1;
    let app = common::app_with(config);
    let tasks = app.state.start_background_tasks();

    let venue_id = one_table(&app.state);
    let guest = user("guest-1", Role::User);
    let booking = app
        .state
        .bookings
        .create(VenueKind::Restaurant, venue_id, dinner(), &guest)
        .expect("create")
        .booking;
    app.state
        .bookings
        .confirm_payment(
            booking.id,
            &guest,
            shared::models::PaymentConfirm {
                transaction_id: "tx-1".into(),
                method: Some("card".into()),
            },
        )
        .expect("pay");

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let stored = app.state.storage.get_booking(booking.id).unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);

    tasks.shutdown().await;
}
