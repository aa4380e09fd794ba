use anyhow::{anyhow, Result};
use e2e_tests::test_harness::{unique_email, TestEnv};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn id_of(body: &Value) -> Result<i64> {
    body["data"]["id"]
        .as_i64()
        .ok_or_else(|| anyhow!("response has no data.id: {}", body))
}

async fn register_host(env: &TestEnv) -> Result<i64> {
    let (status, body) = env
        .post(
            "/api/hosts",
            &json!({
                "name": "E2E Productions",
                "email": unique_email("host"),
                "password": "host-secret",
                "phone_number": "01800000000",
                "division": "Dhaka",
                "district": "Dhaka",
                "upazila_thana": "Gulshan",
                "address": "Road 11"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "host registration: {}", body);
    assert_eq!(body["data"]["verification"], "unverified");
    id_of(&body)
}

async fn publish_event(env: &TestEnv, host_id: i64, seats: i32) -> Result<i64> {
    let (status, body) = env
        .post(
            "/api/events",
            &json!({
                "host_id": host_id,
                "title": "E2E Open Air",
                "location": "Hatirjheel",
                "event_date": "2099-12-31",
                "event_time": "6:00 PM",
                "price": 250.0,
                "total_seat": seats,
                "category": "E2E"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "event submission: {}", body);
    let event_id = id_of(&body)?;

    let (status, body) = env
        .post(&format!("/api/events/{}/approve", event_id), &json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK, "approval: {}", body);
    assert_eq!(body["data"]["approval_status"], "approved");
    Ok(event_id)
}

#[tokio::test]
#[ignore = "requires a running api server (API_URL)"]
async fn test_booking_and_gate_scan() -> Result<()> {
    let env = TestEnv::new();
    env.wait_for_services().await?;

    let host_id = register_host(&env).await?;
    let event_id = publish_event(&env, host_id, 3).await?;

    let email = unique_email("fan");
    let (status, body) = env
        .post(
            "/api/users",
            &json!({
                "name": "E2E Fan",
                "email": email,
                "password": "fan-secret",
                "phone_number": "01700000000"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "user registration: {}", body);
    let user_id = id_of(&body)?;

    let (status, body) = env
        .post("/api/users/login", &json!({ "email": email, "password": "fan-secret" }))
        .await?;
    assert_eq!(status, StatusCode::OK, "login: {}", body);

    let (status, booking) = env
        .post(
            "/api/participants/book",
            &json!({ "user_id": user_id, "event_id": event_id, "total_booked": 2 }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "booking: {}", booking);
    let tickets = booking["data"]["tickets"]
        .as_array()
        .ok_or_else(|| anyhow!("booking returned no tickets: {}", booking))?;
    assert_eq!(tickets.len(), 2);

    let (status, body) = env
        .post(
            "/api/participants/book",
            &json!({ "user_id": user_id, "event_id": event_id, "total_booked": 2 }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "overbooking: {}", body);
    assert_eq!(body["data"]["seats_left"], 1);

    let payload = tickets[0]["payload"].clone();
    let (_, scan) = env.post("/api/tickets/verify", &json!({ "payload": payload })).await?;
    assert_eq!(scan["data"]["status"], "valid", "first scan: {}", scan);

    let (_, scan) = env.post("/api/tickets/verify", &json!({ "payload": payload })).await?;
    assert_eq!(scan["data"]["status"], "reused", "second scan: {}", scan);

    let (_, totals) = env.get(&format!("/api/events/{}/totals", event_id)).await?;
    assert_eq!(totals["data"]["total_participants"], 2);
    assert_eq!(totals["data"]["total_sale"], 500.0);

    let (status, _) = env.delete(&format!("/api/events/{}", event_id)).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running api server (API_URL)"]
async fn test_guest_booking_and_event_edits() -> Result<()> {
    let env = TestEnv::new();
    env.wait_for_services().await?;

    let host_id = register_host(&env).await?;
    let event_id = publish_event(&env, host_id, 5).await?;

    let guest = unique_email("guest");
    let (status, booking) = env
        .post(
            "/api/participants/guest",
            &json!({ "email": guest, "event_id": event_id, "total_booked": 1 }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "guest booking: {}", booking);

    let (status, body) = env
        .put(&format!("/api/events/{}", event_id), &json!({ "total_seat": 0 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "shrink below filled: {}", body);

    let (_, seats) = env.get(&format!("/api/events/{}/seats", event_id)).await?;
    assert_eq!(seats["data"]["filled_seat"], 1);

    let (status, _) = env.delete(&format!("/api/events/{}", event_id)).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}
