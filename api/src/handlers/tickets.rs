use crate::extract::{ApiJson, ApiPath};
use crate::models::{respond, ApiResponse};
use crate::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::services::tickets::TicketVerification;
use serde::Deserialize;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify", post(verify_ticket))
        .route("/participant/:id", get(tickets_for_participant))
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    payload: String,
}

fn outcome_message(outcome: &TicketVerification) -> &'static str {
    match outcome {
        TicketVerification::Valid(_) => "Ticket verified",
        TicketVerification::Reused { .. } => "Ticket already used",
        TicketVerification::Expired { .. } => "Ticket expired",
        TicketVerification::Invalid { .. } => "Invalid ticket",
    }
}

/// Every scan outcome is a 200; the envelope's `data.status` carries the verdict.
async fn verify_ticket(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyRequest>,
) -> Response {
    match state.services.ticket_service.verify_ticket(&req.payload).await {
        Ok(outcome) => {
            tracing::info!(status = outcome.status(), "ticket scanned");
            let message = outcome_message(&outcome);
            Json(ApiResponse::with_message(200, message, outcome)).into_response()
        }
        Err(err) => crate::models::error_response(err),
    }
}

async fn tickets_for_participant(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(
        state
            .services
            .ticket_service
            .tickets_for_participant(id)
            .await,
    )
}
