//! HTTP surface tests: routing, auth extraction and error mapping.

#![allow(clippy::unwrap_used)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use pusara::auth::{MemorySessionStore, Principal, SessionStore};
use pusara::config::BookingConfig;
use pusara::server::{build_router, AppState};
use pusara::storage::{MemoryObjectStorage, ObjectStorage};
use pusara::store::{CemeteryStore, MemoryStore};
use pusara::types::{
    Booking, FuneralKit, KitId, KitType, Money, Package, PackageId, Plot, PlotId, Staff, StaffId,
    StaffRole, UserId,
};
use serde_json::{json, Value};
use std::sync::Arc;

struct Fixture {
    server: TestServer,
    member_token: String,
    admin_token: String,
    plot: PlotId,
    digger: StaffId,
    washer: StaffId,
    package: PackageId,
    kit: KitId,
}

async fn fixture() -> Fixture {
    let store: Arc<dyn CemeteryStore> = Arc::new(MemoryStore::new());

    let plot = PlotId::new();
    store
        .insert_plot(&Plot::new(plot, "A1-1".to_string(), 1, 1))
        .await
        .unwrap();

    let digger = StaffId::new();
    let washer = StaffId::new();
    store
        .insert_staff(&Staff {
            id: digger,
            name: "Ahmad".to_string(),
            phone: "012-3456789".to_string(),
            role: StaffRole::GraveDigger,
            active: true,
        })
        .await
        .unwrap();
    store
        .insert_staff(&Staff {
            id: washer,
            name: "Siti".to_string(),
            phone: "013-9876543".to_string(),
            role: StaffRole::BodyWasher,
            active: true,
        })
        .await
        .unwrap();

    let kit = KitId::new();
    store
        .insert_kit(&FuneralKit {
            id: kit,
            kit_type: KitType::Male,
            available: 3,
            total_used: 0,
        })
        .await
        .unwrap();

    let package = PackageId::new();
    store
        .insert_package(&Package {
            id: package,
            name: "Standard burial".to_string(),
            description: String::new(),
            price: Money::from_cents(150_000),
            active: true,
        })
        .await
        .unwrap();

    let sessions = MemorySessionStore::new();
    let member_token = sessions.issue(Principal::member(UserId::new()));
    let admin_token = sessions.issue(Principal::admin(UserId::new()));

    let sessions: Arc<dyn SessionStore> = Arc::new(sessions);
    let storage: Arc<dyn ObjectStorage> = Arc::new(MemoryObjectStorage::new());
    let state = AppState::new(store, sessions, storage, BookingConfig::default());
    let server = TestServer::new(build_router(state)).unwrap();

    Fixture {
        server,
        member_token,
        admin_token,
        plot,
        digger,
        washer,
        package,
        kit,
    }
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

fn booking_body(fx: &Fixture) -> Value {
    json!({
        "plot_id": fx.plot,
        "deceased": {
            "name": "Abdullah bin Osman",
            "ic_number": "501231-10-5555",
            "gender": "male"
        },
        "scheduled_at": "2025-03-10T02:00:00Z",
        "package_ids": [fx.package],
        "kits": [{ "kit_type": "male", "quantity": 1 }],
        "staff": [
            { "role": "grave_digger", "staff_id": fx.digger },
            { "role": "body_washer", "staff_id": null }
        ]
    })
}

#[tokio::test]
async fn health_and_ready_are_public() {
    let fx = fixture().await;
    fx.server.get("/health").await.assert_status_ok();
    fx.server.get("/ready").await.assert_status_ok();
}

#[tokio::test]
async fn public_reads_need_no_token() {
    let fx = fixture().await;

    let plots: Vec<Plot> = fx
        .server
        .get("/api/plots")
        .add_query_param("status", "available")
        .await
        .json();
    assert_eq!(plots.len(), 1);

    let kits: Vec<FuneralKit> = fx.server.get("/api/kits").await.json();
    assert_eq!(kits[0].available, 3);

    let staff: Vec<Staff> = fx
        .server
        .get("/api/staff/availability")
        .add_query_param("role", "grave_digger")
        .add_query_param("date", "2025-03-10T02:00:00Z")
        .await
        .json();
    assert_eq!(staff.len(), 1);
}

#[tokio::test]
async fn booking_endpoints_require_a_session() {
    let fx = fixture().await;

    let response = fx.server.get("/api/bookings").await;
    response.assert_status_unauthorized();

    let (name, value) = bearer("not-a-real-token");
    let response = fx
        .server
        .get("/api/bookings")
        .add_header(name, value)
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn create_booking_round_trip() {
    let fx = fixture().await;
    let (name, value) = bearer(&fx.member_token);

    let response = fx
        .server
        .post("/api/bookings")
        .add_header(name.clone(), value.clone())
        .json(&booking_body(&fx))
        .await;
    assert_eq!(response.status_code(), 201);
    let booking: Booking = response.json();
    assert_eq!(booking.total, Money::from_cents(150_000));

    let mine: Vec<Booking> = fx
        .server
        .get("/api/bookings")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(mine.len(), 1);

    let response = fx
        .server
        .get(&format!("/api/bookings/{}", booking.id))
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    // The reserved plot is no longer listed as available.
    let plots: Vec<Plot> = fx
        .server
        .get("/api/plots")
        .add_query_param("status", "available")
        .await
        .json();
    assert!(plots.is_empty());
}

#[tokio::test]
async fn conflicts_map_to_409_and_validation_to_422() {
    let fx = fixture().await;
    let (name, value) = bearer(&fx.member_token);

    fx.server
        .post("/api/bookings")
        .add_header(name.clone(), value.clone())
        .json(&booking_body(&fx))
        .await
        .assert_status_success();

    // Same plot again: conflict.
    let response = fx
        .server
        .post("/api/bookings")
        .add_header(name.clone(), value.clone())
        .json(&booking_body(&fx))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT");

    // Missing mandatory role: validation.
    let mut body = booking_body(&fx);
    body["staff"] = json!([{ "role": "grave_digger", "staff_id": null }]);
    let response = fx
        .server
        .post("/api/bookings")
        .add_header(name, value)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), 422);
}

#[tokio::test]
async fn admin_endpoints_reject_members() {
    let fx = fixture().await;
    let (name, value) = bearer(&fx.member_token);

    let response = fx
        .server
        .get("/api/admin/bookings")
        .add_header(name, value)
        .await;
    response.assert_status_forbidden();
}

#[tokio::test]
async fn admin_workflow_over_http() {
    let fx = fixture().await;
    let (member_name, member_value) = bearer(&fx.member_token);
    let (admin_name, admin_value) = bearer(&fx.admin_token);

    let booking: Booking = fx
        .server
        .post("/api/bookings")
        .add_header(member_name.clone(), member_value.clone())
        .json(&booking_body(&fx))
        .await
        .json();

    fx.server
        .post(&format!("/api/admin/bookings/{}/approve", booking.id))
        .add_header(admin_name.clone(), admin_value.clone())
        .await
        .assert_status_ok();

    // Paying before approval was the member's job; now submit a receipt.
    fx.server
        .post(&format!("/api/bookings/{}/payment", booking.id))
        .add_header(member_name, member_value)
        .json(&json!({ "receipt_base64": "cGFpZA==" }))
        .await
        .assert_status_ok();

    fx.server
        .post(&format!("/api/admin/bookings/{}/verify-payment", booking.id))
        .add_header(admin_name.clone(), admin_value.clone())
        .await
        .assert_status_ok();

    fx.server
        .post(&format!("/api/admin/bookings/{}/complete", booking.id))
        .add_header(admin_name.clone(), admin_value.clone())
        .await
        .assert_status_ok();

    let occupied: Vec<Plot> = fx
        .server
        .get("/api/plots")
        .add_query_param("status", "occupied")
        .await
        .json();
    assert_eq!(occupied.len(), 1);

    // Completing again is a no-op, still 200.
    fx.server
        .post(&format!("/api/admin/bookings/{}/complete", booking.id))
        .add_header(admin_name.clone(), admin_value.clone())
        .await
        .assert_status_ok();

    // The dashboard sees the completed booking.
    let stats: Value = fx
        .server
        .get("/api/admin/stats")
        .add_header(admin_name, admin_value)
        .await
        .json();
    assert_eq!(stats["bookings"]["completed"], 1);
    assert_eq!(stats["plots"]["occupied"], 1);
}

#[tokio::test]
async fn kit_adjustment_and_usage_ledger_over_http() {
    let fx = fixture().await;
    let (name, value) = bearer(&fx.admin_token);

    let kit: FuneralKit = fx
        .server
        .post(&format!("/api/admin/kits/{}/adjust", fx.kit))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "delta": 5, "reason": "admin_add", "note": "restock" }))
        .await
        .json();
    assert_eq!(kit.available, 8);

    let response = fx
        .server
        .post(&format!("/api/admin/kits/{}/adjust", fx.kit))
        .add_header(name.clone(), value.clone())
        .json(&json!({ "delta": -100, "reason": "admin_remove" }))
        .await;
    assert_eq!(response.status_code(), 409);
    let body: Value = response.json();
    assert_eq!(body["code"], "NEGATIVE_STOCK");

    let ledger: Value = fx
        .server
        .get(&format!("/api/admin/kits/{}/usage", fx.kit))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(ledger.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn waqaf_records_round_trip() {
    let fx = fixture().await;
    let (name, value) = bearer(&fx.admin_token);

    let response = fx
        .server
        .post("/api/admin/waqaf")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "donor_name": "Hajjah Aminah",
            "amount_cents": 500_000,
            "purpose": "land expansion"
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let stats: Value = fx
        .server
        .get("/api/admin/stats")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(stats["waqaf"]["count"], 1);
}
