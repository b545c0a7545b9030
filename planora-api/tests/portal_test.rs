/// Bookings, contact messages and admin stats behind the authorization gate

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{booking_body, TestApp, TestRequest};
use planora_shared::{
    models::booking::{BookingStatus, CreateBooking},
    store::BookingStore,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn days_from_today(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

async fn create_booking(ctx: &TestApp, token: &str, name: &str, days: i64, budget: i64) -> Value {
    let response = ctx
        .send(
            TestRequest::post("/v1/bookings")
                .bearer(token)
                .json(booking_body(name, &days_from_today(days), budget)),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

fn booking_id(booking: &Value) -> String {
    booking["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_is_pending_and_owned_by_caller() {
    let ctx = TestApp::new();
    let token = ctx.user_token("a@x.com", "alice").await;

    let mut body = booking_body("Spring Gala", &days_from_today(30), 5000);
    body["status"] = json!("Approved");
    body["userEmail"] = json!("someone-else@x.com");

    let response = ctx
        .send(TestRequest::post("/v1/bookings").bearer(&token).json(body))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["status"], "Pending");
    assert_eq!(response.body["userEmail"], "a@x.com");
    assert_eq!(response.body["eventName"], "Spring Gala");
    assert!(response.body["updatedAt"].is_null());
}

#[tokio::test]
async fn test_create_validation() {
    let ctx = TestApp::new();
    let token = ctx.user_token("a@x.com", "alice").await;

    let mut body = booking_body("", &days_from_today(3), -1);
    body["guestCount"] = json!(0);

    let response = ctx
        .send(TestRequest::post("/v1/bookings").bearer(&token).json(body))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let bad_date = ctx
        .send(
            TestRequest::post("/v1/bookings")
                .bearer(&token)
                .json(booking_body("Party", "next tuesday", 10)),
        )
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);

    let huge_budget = ctx
        .send(
            TestRequest::post("/v1/bookings")
                .bearer(&token)
                .json(booking_body("Party", &days_from_today(3), i64::MAX)),
        )
        .await;
    assert_eq!(huge_budget.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_listing_scoped_by_role() {
    let ctx = TestApp::new();
    let alice = ctx.user_token("a@x.com", "alice").await;
    let bob = ctx.user_token("b@x.com", "bob").await;
    let admin = ctx.admin_token("ops@x.com", "ops").await;

    create_booking(&ctx, &alice, "Alice 1", 10, 100).await;
    create_booking(&ctx, &alice, "Alice 2", 20, 200).await;
    create_booking(&ctx, &bob, "Bob 1", 10, 300).await;

    let mine = ctx.send(TestRequest::get("/v1/bookings").bearer(&alice)).await;
    assert_eq!(mine.status, StatusCode::OK);
    let mine = mine.body.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|b| b["userEmail"] == "a@x.com"));

    let all = ctx.send(TestRequest::get("/v1/bookings").bearer(&admin)).await;
    assert_eq!(all.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_upcoming_and_past_scopes() {
    let ctx = TestApp::new();
    let token = ctx.user_token("a@x.com", "alice").await;

    create_booking(&ctx, &token, "Last year", -365, 100).await;
    create_booking(&ctx, &token, "Today", 0, 100).await;
    create_booking(&ctx, &token, "Next month", 30, 100).await;

    let upcoming = ctx
        .send(TestRequest::get("/v1/bookings?scope=upcoming").bearer(&token))
        .await;
    let names: Vec<&str> = upcoming
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["eventName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Next month"]);

    let past = ctx
        .send(TestRequest::get("/v1/bookings?scope=past").bearer(&token))
        .await;
    assert_eq!(past.body.as_array().unwrap().len(), 2);

    let bad = ctx
        .send(TestRequest::get("/v1/bookings?scope=someday").bearer(&token))
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_owner_only() {
    let ctx = TestApp::new();
    let alice = ctx.user_token("a@x.com", "alice").await;
    let bob = ctx.user_token("b@x.com", "bob").await;
    let admin = ctx.admin_token("ops@x.com", "ops").await;

    let booking = create_booking(&ctx, &alice, "Alice party", 10, 100).await;
    let id = booking_id(&booking);

    let by_bob = ctx
        .send(TestRequest::delete(&format!("/v1/bookings/{}", id)).bearer(&bob))
        .await;
    assert_eq!(by_bob.status, StatusCode::FORBIDDEN);

    // Admins have no ownership bypass
    let by_admin = ctx
        .send(TestRequest::delete(&format!("/v1/bookings?id={}", id)).bearer(&admin))
        .await;
    assert_eq!(by_admin.status, StatusCode::FORBIDDEN);

    let uuid: Uuid = id.parse().unwrap();
    assert!(ctx.store.find_booking(uuid).await.unwrap().is_some());

    let by_alice = ctx
        .send(TestRequest::delete(&format!("/v1/bookings?id={}", id)).bearer(&alice))
        .await;
    assert_eq!(by_alice.status, StatusCode::NO_CONTENT);
    assert!(ctx.store.find_booking(uuid).await.unwrap().is_none());

    let again = ctx
        .send(TestRequest::delete(&format!("/v1/bookings/{}", id)).bearer(&alice))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let malformed = ctx
        .send(TestRequest::delete("/v1/bookings/not-a-uuid").bearer(&alice))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_status_update_changes_only_status() {
    let ctx = TestApp::new();
    let alice = ctx.user_token("a@x.com", "alice").await;
    let admin = ctx.admin_token("ops@x.com", "ops").await;

    let booking = create_booking(&ctx, &alice, "Spring Gala", 30, 5000).await;
    let id = booking_id(&booking);

    let by_owner = ctx
        .send(
            TestRequest::put("/v1/bookings")
                .bearer(&alice)
                .json(json!({ "bookingId": id, "status": "Approved" })),
        )
        .await;
    assert_eq!(by_owner.status, StatusCode::FORBIDDEN);

    let updated = ctx
        .send(
            TestRequest::put("/v1/bookings")
                .bearer(&admin)
                .json(json!({ "bookingId": id, "status": "approved" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["status"], "Approved");
    assert!(updated.body["updatedAt"].is_string());

    for field in [
        "id",
        "userEmail",
        "eventType",
        "eventName",
        "guestCount",
        "date",
        "time",
        "budget",
        "notes",
        "organizerPreference",
        "createdAt",
    ] {
        assert_eq!(updated.body[field], booking[field], "{} changed", field);
    }

    let by_path = ctx
        .send(
            TestRequest::put(&format!("/v1/bookings/{}", id))
                .bearer(&admin)
                .json(json!({ "status": "Rejected" })),
        )
        .await;
    assert_eq!(by_path.body["status"], "Rejected");

    let unknown_status = ctx
        .send(
            TestRequest::put(&format!("/v1/bookings/{}", id))
                .bearer(&admin)
                .json(json!({ "status": "Cancelled" })),
        )
        .await;
    assert_eq!(unknown_status.status, StatusCode::BAD_REQUEST);

    let missing = ctx
        .send(
            TestRequest::put("/v1/bookings")
                .bearer(&admin)
                .json(json!({ "bookingId": Uuid::new_v4(), "status": "Approved" })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_messages() {
    let ctx = TestApp::new();
    let alice = ctx.user_token("a@x.com", "alice").await;
    let admin = ctx.admin_token("ops@x.com", "ops").await;

    let submitted = ctx
        .send(TestRequest::post("/v1/messages").json(json!({
            "name": "Visitor",
            "email": "Visitor@Example.com",
            "message": "Do you cater weddings?",
        })))
        .await;
    assert_eq!(submitted.status, StatusCode::CREATED);
    assert_eq!(submitted.body["status"], "unread");
    assert_eq!(submitted.body["email"], "visitor@example.com");
    let id = submitted.body["id"].as_str().unwrap().to_string();

    let invalid = ctx
        .send(TestRequest::post("/v1/messages").json(json!({
            "name": "",
            "email": "nope",
            "message": "",
        })))
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);

    let as_user = ctx.send(TestRequest::get("/v1/messages").bearer(&alice)).await;
    assert_eq!(as_user.status, StatusCode::FORBIDDEN);

    let as_admin = ctx.send(TestRequest::get("/v1/messages").bearer(&admin)).await;
    assert_eq!(as_admin.status, StatusCode::OK);
    assert_eq!(as_admin.body.as_array().unwrap().len(), 1);

    let read = ctx
        .send(
            TestRequest::put(&format!("/v1/messages/{}", id))
                .bearer(&admin)
                .json(json!({ "status": "read" })),
        )
        .await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["status"], "read");

    let by_user = ctx
        .send(
            TestRequest::put(&format!("/v1/messages/{}", id))
                .bearer(&alice)
                .json(json!({ "status": "unread" })),
        )
        .await;
    assert_eq!(by_user.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_stats() {
    let ctx = TestApp::new();
    let alice = ctx.user_token("a@x.com", "alice").await;
    let admin = ctx.admin_token("ops@x.com", "ops").await;

    let approved = create_booking(&ctx, &alice, "Approved 1", 5, 1200).await;
    let approved_too = create_booking(&ctx, &alice, "Approved 2", 6, 800).await;
    let rejected = create_booking(&ctx, &alice, "Rejected", 7, 9999).await;
    create_booking(&ctx, &alice, "Pending", 8, 50).await;

    for (booking, status) in [
        (&approved, "Approved"),
        (&approved_too, "Approved"),
        (&rejected, "Rejected"),
    ] {
        let response = ctx
            .send(
                TestRequest::put(&format!("/v1/bookings/{}", booking_id(booking)))
                    .bearer(&admin)
                    .json(json!({ "status": status })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    ctx.send(TestRequest::post("/v1/messages").json(json!({
        "name": "V",
        "email": "v@x.com",
        "message": "hello",
    })))
    .await;

    let stats = ctx.send(TestRequest::get("/v1/admin/stats").bearer(&admin)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(
        stats.body,
        json!({
            "totalBookings": 4,
            "pendingBookings": 1,
            "approvedBookings": 2,
            "rejectedBookings": 1,
            "unreadMessages": 1,
            "totalRevenue": 2000,
        })
    );

    let as_user = ctx.send(TestRequest::get("/v1/admin/stats").bearer(&alice)).await;
    assert_eq!(as_user.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_stats_with_huge_stored_budgets() {
    let ctx = TestApp::new();
    let admin = ctx.admin_token("ops@x.com", "ops").await;

    for budget in [i64::MAX, i64::MAX - 7] {
        let booking = ctx
            .store
            .insert_booking(CreateBooking {
                user_email: "legacy@x.com".to_string(),
                event_type: "gala".to_string(),
                event_name: "Imported".to_string(),
                guest_count: 500,
                date: Utc::now().date_naive() + Duration::days(90),
                time: "19:00".to_string(),
                budget,
                notes: String::new(),
                organizer_preference: String::new(),
            })
            .await
            .unwrap();
        ctx.store
            .update_booking_status(booking.id, BookingStatus::Approved)
            .await
            .unwrap();
    }

    let stats = ctx.send(TestRequest::get("/v1/admin/stats").bearer(&admin)).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["approvedBookings"], 2);
    assert_eq!(stats.body["totalRevenue"], i64::MAX);
}

#[tokio::test]
async fn test_health() {
    let ctx = TestApp::new();

    let response = ctx.send(TestRequest::get("/health")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["store"], "memory");
    assert_eq!(response.body["database"], "connected");
}
