use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::models::{respond, respond_created, respond_message};
use crate::AppState;
use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use common::repositories::SalesScope;
use common::services::events::{CreateEvent, EventPatch};
use serde::Deserialize;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(add_event).get(list_events))
        .route("/pending", get(list_pending))
        .route("/upcoming", get(upcoming_events))
        .route("/archived", get(archived_events))
        .route("/filter", get(filter_events))
        .route("/search/:value", get(search_event))
        .route("/host/:host_id", get(events_by_host))
        .route("/sales/daily", get(overall_daily_sales))
        .route("/sales/monthly", get(overall_monthly_sales))
        .route("/category/:category/daily-sales", get(category_daily_sales))
        .route("/category/:category/monthly-sales", get(category_monthly_sales))
        .route("/category/:category/totals", get(category_totals))
        .route(
            "/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/:id/approve", post(approve_event))
        .route("/:id/reject", post(reject_event))
        .route("/:id/seats", get(seat_availability))
        .route("/:id/target", get(target_earning))
        .route("/:id/sale", get(total_sale))
        .route("/:id/daily-sales", get(event_daily_sales))
        .route("/:id/daily-participants", get(event_daily_participants))
        .route("/:id/monthly-sales", get(event_monthly_sales))
        .route("/:id/totals", get(event_totals))
}

#[derive(Debug, Deserialize)]
struct FilterQuery {
    keyword: String,
}

async fn add_event(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateEvent>,
) -> Response {
    respond_created(state.services.event_service.add_event(req).await)
}

async fn list_events(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.event_service.list_events().await)
}

async fn list_pending(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.event_service.list_pending().await)
}

async fn upcoming_events(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.event_service.upcoming_events().await)
}

async fn archived_events(State(state): State<Arc<AppState>>) -> Response {
    respond(state.services.event_service.archived_events().await)
}

async fn filter_events(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Response {
    respond(
        state
            .services
            .event_service
            .filter_events(&query.keyword)
            .await,
    )
}

async fn search_event(
    State(state): State<Arc<AppState>>,
    ApiPath(value): ApiPath<String>,
) -> Response {
    respond(state.services.event_service.search_event(&value).await)
}

async fn events_by_host(
    State(state): State<Arc<AppState>>,
    ApiPath(host_id): ApiPath<i32>,
) -> Response {
    respond(state.services.event_service.events_by_host(host_id).await)
}

async fn get_event(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i32>) -> Response {
    respond(state.services.event_service.get_event(id).await)
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<EventPatch>,
) -> Response {
    respond(state.services.event_service.update_event(id, patch).await)
}

async fn delete_event(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i32>) -> Response {
    respond_message(
        state.services.event_service.delete_event(id).await,
        "Event deleted",
    )
}

async fn approve_event(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(state.services.event_service.approve_event(id).await)
}

async fn reject_event(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i32>) -> Response {
    respond(state.services.event_service.reject_event(id).await)
}

async fn seat_availability(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(state.services.event_service.seat_availability(id).await)
}

async fn target_earning(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(state.services.event_service.target_earning(id).await)
}

async fn total_sale(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i32>) -> Response {
    respond(state.services.event_service.total_sale(id).await)
}

async fn event_daily_sales(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(
        state
            .services
            .analytics_service
            .daily_sales(SalesScope::Event(id))
            .await,
    )
}

async fn event_daily_participants(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(
        state
            .services
            .analytics_service
            .daily_participants(id)
            .await,
    )
}

async fn event_monthly_sales(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    respond(
        state
            .services
            .analytics_service
            .monthly_sales(SalesScope::Event(id))
            .await,
    )
}

async fn event_totals(State(state): State<Arc<AppState>>, ApiPath(id): ApiPath<i32>) -> Response {
    respond(
        state
            .services
            .analytics_service
            .totals(SalesScope::Event(id))
            .await,
    )
}

async fn category_daily_sales(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> Response {
    respond(
        state
            .services
            .analytics_service
            .daily_sales(SalesScope::Category(category))
            .await,
    )
}

async fn category_monthly_sales(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> Response {
    respond(
        state
            .services
            .analytics_service
            .monthly_sales(SalesScope::Category(category))
            .await,
    )
}

async fn category_totals(
    State(state): State<Arc<AppState>>,
    ApiPath(category): ApiPath<String>,
) -> Response {
    respond(
        state
            .services
            .analytics_service
            .totals(SalesScope::Category(category))
            .await,
    )
}

async fn overall_daily_sales(State(state): State<Arc<AppState>>) -> Response {
    respond(
        state
            .services
            .analytics_service
            .daily_sales(SalesScope::All)
            .await,
    )
}

async fn overall_monthly_sales(State(state): State<Arc<AppState>>) -> Response {
    respond(
        state
            .services
            .analytics_service
            .monthly_sales(SalesScope::All)
            .await,
    )
}
