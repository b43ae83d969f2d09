mod common;

use common::{app, dinner, money_eq, restaurant_payload};
use http::{Method, StatusCode};
use serde_json::json;
use shared::types::Role;

#[tokio::test]
async fn test_health_is_public() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/health/detailed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = app();
    let (status, body) = app
        .send(Method::GET, "/api/bookings/mine", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    let (status, _) = app
        .send(Method::GET, "/api/bookings/mine", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_restaurant_booking_lifecycle() {
    let app = app();
    let owner = app.token("owner-1", Role::Owner);
    let guest = app.token("guest-1", Role::User);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/venues/restaurant",
            Some(&owner),
            Some(restaurant_payload(&[2, 4, 6])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let venue_id = body["data"]["id"].as_i64().expect("venue id");

    // Preview claims nothing
    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings/preview"),
            Some(&guest),
            Some(dinner(6)),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(money_eq(&body["data"]["total"], 1246.48), "{body}");

    // Pending booking without a transaction id
    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings"),
            Some(&guest),
            Some(dinner(6)),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let booking = &body["data"]["booking"];
    let booking_id = booking["id"].as_i64().expect("booking id");
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["sub_resource_ids"], json!([3]));
    assert!(money_eq(&body["data"]["breakdown"]["total"], 1246.48));

    // The only six-seat table is held, so a second party of six is refused
    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings"),
            Some(&app.token("guest-2", Role::User)),
            Some(dinner(6)),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/venues/restaurant/{venue_id}/availability?date=2030-03-05&partySize=6"),
            Some(&guest),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let slots = body["data"]["slots"].as_array().expect("slots");
    assert_eq!(slots.len(), 6);
    assert!(slots.iter().all(|s| s["available"] == 0));

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/payment"),
            Some(&guest),
            Some(json!({ "transaction_id": "tx-42", "method": "card" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "confirmed");
    assert_eq!(body["data"]["payment"]["status"], "paid");

    // Guests cannot seat themselves
    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/check-in"),
            Some(&guest),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/check-in"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "checked_in");

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/check-out"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "completed");

    // Completed booking freed the table
    let (_, body) = app
        .send(
            Method::GET,
            &format!("/api/venues/restaurant/{venue_id}"),
            Some(&guest),
            None,
        )
        .await;
    let tables = body["data"]["tables"].as_array().expect("tables");
    assert!(tables.iter().all(|t| t["is_booked"] == false));

    let (status, body) = app
        .send(Method::GET, "/api/bookings/mine", Some(&guest), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["restaurant"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["hotel"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_cancel_twice_and_outsider_access() {
    let app = app();
    let owner = app.token("owner-1", Role::Owner);
    let guest = app.token("guest-1", Role::User);
    let stranger = app.token("stranger", Role::User);

    let (_, body) = app
        .send(
            Method::POST,
            "/api/venues/restaurant",
            Some(&owner),
            Some(restaurant_payload(&[4])),
        )
        .await;
    let venue_id = body["data"]["id"].as_i64().expect("venue id");

    let (_, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings"),
            Some(&guest),
            Some(dinner(2)),
        )
        .await;
    let booking_id = body["data"]["booking"]["id"].as_i64().expect("booking id");

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/bookings/{booking_id}"),
            Some(&stranger),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&stranger),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&guest),
            Some(json!({ "reason": "plans changed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["cancel_reason"], "plans changed");

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/api/bookings/{booking_id}/cancel"),
            Some(&guest),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn test_status_override_is_admin_only() {
    let app = app();
    let owner = app.token("owner-1", Role::Owner);
    let guest = app.token("guest-1", Role::User);
    let admin = app.token("admin-1", Role::Admin);

    let (_, body) = app
        .send(
            Method::POST,
            "/api/venues/restaurant",
            Some(&owner),
            Some(restaurant_payload(&[4])),
        )
        .await;
    let venue_id = body["data"]["id"].as_i64().expect("venue id");
    let (_, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings"),
            Some(&guest),
            Some(dinner(2)),
        )
        .await;
    let booking_id = body["data"]["booking"]["id"].as_i64().expect("booking id");
    let uri = format!("/api/bookings/{booking_id}/status");

    let (status, _) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&owner),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // An unpaid restaurant booking cannot jump to completed
    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&admin),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app
        .send(
            Method::PATCH,
            &uri,
            Some(&admin),
            Some(json!({ "status": "confirmed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "confirmed");
}

#[tokio::test]
async fn test_venue_type_and_input_errors() {
    let app = app();
    let owner = app.token("owner-1", Role::Owner);
    let guest = app.token("guest-1", Role::User);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/venues/spaceship",
            Some(&owner),
            Some(restaurant_payload(&[4])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/venues/restaurant",
            Some(&guest),
            Some(restaurant_payload(&[4])),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .send(
            Method::POST,
            "/api/venues/restaurant",
            Some(&owner),
            Some(restaurant_payload(&[4])),
        )
        .await;
    let venue_id = body["data"]["id"].as_i64().expect("venue id");

    // Venue exists but is not a hotel
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/venues/hotel/{venue_id}"),
            Some(&guest),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, "/api/venues/restaurant/1", Some(&guest), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut past = dinner(2);
    past["date"] = json!("2001-01-02");
    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings"),
            Some(&guest),
            Some(past),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/venues/restaurant/{venue_id}/availability?date=2030-03-05&partySize=0"),
            Some(&guest),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_coupon_admin_and_discount() {
    let app = app();
    let owner = app.token("owner-1", Role::Owner);
    let guest = app.token("guest-1", Role::User);
    let admin = app.token("admin-1", Role::Admin);
    let expires_at = shared::util::now_millis() + 86_400_000;
    let coupon = json!({
        "code": "save10",
        "kind": "percentage",
        "value": 10.0,
        "expires_at": expires_at
    });

    let (status, _) = app
        .send(Method::POST, "/api/coupons", Some(&owner), Some(coupon.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, "/api/coupons", Some(&admin), Some(coupon))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["code"], "SAVE10");

    let (status, body) = app
        .send(Method::GET, "/api/coupons/save10", Some(&guest), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);

    let (status, _) = app
        .send(Method::GET, "/api/coupons/NOPE", Some(&guest), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send(
            Method::POST,
            "/api/venues/restaurant",
            Some(&owner),
            Some(restaurant_payload(&[6])),
        )
        .await;
    let venue_id = body["data"]["id"].as_i64().expect("venue id");

    let mut req = dinner(6);
    req["coupon_code"] = json!("SAVE10");
    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/venues/restaurant/{venue_id}/bookings/preview"),
            Some(&guest),
            Some(req),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let total = body["data"]["total"].as_f64().expect("total");
    assert!(total < 1246.48, "coupon should lower the total, got {total}");
    assert!(body["data"]["discount_total"].as_f64().expect("discount") > 0.0);
}
