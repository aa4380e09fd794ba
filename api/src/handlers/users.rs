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
use common::services::users::{RegisterUser, UserPatch};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(add_user).get(list_users))
        .route("/search/:value", get(search_user))
        .route("/:email", put(update_user).delete(delete_user))
        .route("/login", post(login))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(send_reset_otp))
        .route("/verify-otp", post(verify_reset_otp))
        .route("/reset-password", post(reset_password))
}

async fn add_user(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterUser>,
) -> Response {
    respond_created(state.services.user_service.add_user(req).await)
}

async fn list_users(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.user_service.list_users().await)
}

async fn search_user(
    State(state): State<Arc<AppState>>,
    ApiPath(value): ApiPath<String>,
) -> Response {
    respond(state.services.user_service.search_user(&value).await)
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    ApiPath(email): ApiPath<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Response {
    respond(state.services.user_service.update_user(&email, patch).await)
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiPath(email): ApiPath<String>,
) -> Response {
    respond_message(
        state.services.user_service.delete_user(&email).await,
        "User deleted",
    )
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Response {
    respond(
        state
            .services
            .user_service
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
            .user_service
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
        state.services.user_service.send_reset_otp(&req.email).await,
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
            .user_service
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
            .user_service
            .reset_password(&req.email, &req.otp, &req.new_password)
            .await,
        "Password reset",
    )
}
