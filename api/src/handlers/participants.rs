use crate::extract::{ApiJson, ApiPath};
use crate::models::{respond, respond_created};
use crate::AppState;
use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use common::services::bookings::{BookingRequest, GuestBookingRequest};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_participants))
        .route("/book", post(book))
        .route("/guest", post(guest_booking))
        .route("/by/:field/:value", get(participants_by))
}

async fn book(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BookingRequest>,
) -> Response {
    respond_created(state.services.booking_service.book(req).await)
}

async fn guest_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<GuestBookingRequest>,
) -> Response {
    respond_created(state.services.booking_service.guest_booking(req).await)
}

async fn list_participants(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.booking_service.list_participants().await)
}

async fn participants_by(
    State(state): State<Arc<AppState>>,
    ApiPath((field, value)): ApiPath<(String, i32)>,
) -> Response {
    respond(
        state
            .services
            .booking_service
            .participants_by(&field, value)
            .await,
    )
}
