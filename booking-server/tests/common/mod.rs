//! Shared setup for integration tests: in-memory state, router, tokens

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use booking_server::api::build_app;
use booking_server::{BookingStorage, Config, ServerState};
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::types::Role;
use tower::ServiceExt;

pub struct TestApp {
    pub state: ServerState,
    pub router: Router,
}

pub fn config() -> Config {
    let mut config = Config::with_overrides("/tmp/booking-server-it", 0);
    config.business_tz = chrono_tz::UTC;
    config.payment_timeout_secs = 300;
    config.notification_webhook_url = None;
    config.jwt.secret = "integration-test-secret-0123456789abcdef".into();
    config
}

pub fn app() -> TestApp {
    app_with(config())
}

pub fn app_with(config: Config) -> TestApp {
    let storage = BookingStorage::open_in_memory().expect("storage");
    let state = ServerState::with_storage(config, storage);
    let router = build_app(&state).with_state(state.clone());
    TestApp { state, router }
}

impl TestApp {
    pub fn token(&self, user_id: &str, role: Role) -> String {
        self.state
            .jwt_service
            .generate_token(user_id, user_id, role, &[])
            .expect("token")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

/// Restaurant with tables of the given capacities, 12% tax, 10 service fee
pub fn restaurant_payload(capacities: &[i32]) -> Value {
    let tables: Vec<Value> = capacities
        .iter()
        .enumerate()
        .map(|(i, c)| json!({ "name": format!("T{}", i + 1), "capacity": c }))
        .collect();
    json!({
        "name": "Harbor Bistro",
        "rates": { "unit_rate": 200.0 },
        "fees": { "tax_percentage": 12.0, "service_fee": 10.0 },
        "tables": tables,
        "opening": { "open": "11:00", "close": "23:00", "slot_minutes": 120 }
    })
}

/// Tuesday dinner that runs into the 19:00 peak
pub fn dinner(guests: i32) -> Value {
    json!({
        "date": "2030-03-05",
        "start_time": "18:00",
        "end_time": "20:00",
        "guests": guests
    })
}

pub fn money_eq(a: &Value, expected: f64) -> bool {
    a.as_f64().is_some_and(|v| (v - expected).abs() < 0.01)
}
