use super::{ChangePasswordRequest, EmailRequest, LoginRequest, OtpRequest, ResetPasswordRequest};
use crate::extract::{ApiJson, ApiPath};
use crate::models::{respond, respond_created, respond_message};
use crate::AppState;
use axum::{
    extract::State,
    response::Response,
    routing::{get, post, put},
    Router,
};
use common::services::hosts::{HostPatch, RegisterHost};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(add_host).get(list_hosts))
        .route("/search/:value", get(search_host))
        .route("/:email", put(update_host).delete(delete_host))
        .route("/verify", post(verify_host))
        .route("/resend-verification", post(resend_verification))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(send_reset_otp))
        .route("/verify-otp", post(verify_reset_otp))
        .route("/reset-password", post(reset_password))
}

async fn add_host(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterHost>,
) -> Response {
    respond_created(state.services.host_service.add_host(req).await)
}

async fn list_hosts(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.host_service.list_hosts().await)
}

async fn search_host(
    State(state): State<Arc<AppState>>,
    ApiPath(value): ApiPath<String>,
) -> Response {
    respond(state.services.host_service.search_host(&value).await)
}

async fn update_host(
    State(state): State<Arc<AppState>>,
    ApiPath(email): ApiPath<String>,
    ApiJson(patch): ApiJson<HostPatch>,
) -> Response {
    respond(state.services.host_service.update_host(&email, patch).await)
}

async fn delete_host(
    State(state): State<Arc<AppState>>,
    ApiPath(email): ApiPath<String>,
) -> Response {
    respond_message(
        state.services.host_service.delete_host(&email).await,
        "Host deleted",
    )
}

async fn verify_host(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<OtpRequest>,
) -> Response {
    respond(
        state
            .services
            .host_service
            .verify_host(&req.email, &req.otp)
            .await,
    )
}

async fn resend_verification(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<EmailRequest>,
) -> Response {
    respond_message(
        state
            .services
            .host_service
            .resend_verification(&req.email)
            .await,
        "Verification code sent",
    )
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Response {
    respond(
        state
            .services
            .host_service
            .login(&req.email, &req.password)
            .await,
    )
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Response {
    respond_message(
        state
            .services
            .host_service
            .change_password(req.id, &req.current_password, &req.new_password)
            .await,
        "Password changed",
    )
}

async fn send_reset_otp(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<EmailRequest>,
) -> Response {
    respond_message(
        state.services.host_service.send_reset_otp(&req.email).await,
        "OTP sent",
    )
}

async fn verify_reset_otp(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<OtpRequest>,
) -> Response {
    respond_message(
        state
            .services
            .host_service
            .verify_reset_otp(&req.email, &req.otp)
            .await,
        "OTP verified",
    )
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Response {
    respond_message(
        state
            .services
            .host_service
            .reset_password(&req.email, &req.otp, &req.new_password)
            .await,
        "Password reset",
    )
}
