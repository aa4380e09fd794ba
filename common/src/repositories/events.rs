use crate::entities::events::ApprovalStatus;
use crate::entities::{events, hosts, prelude::*};
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, Func, IntoCondition, LikeExpr};
use sea_orm::*;
use std::sync::Arc;

pub struct NewEvent {
    pub host_id: i32,
    pub title: String,
    pub banner_url: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub price: f64,
    pub total_seat: i32,
    pub category: String,
}

/// Single-column lookups tried in order by event search.
#[derive(Debug, Clone, PartialEq)]
pub enum EventLookup {
    Title(String),
    Location(String),
    Date(NaiveDate),
    HostId(i32),
}

#[async_trait::async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: NewEvent) -> Result<events::Model, DbErr>;

    async fn find_by_id(&self, id: i32) -> Result<Option<events::Model>, DbErr>;

    async fn find_first(&self, lookup: EventLookup) -> Result<Option<events::Model>, DbErr>;

    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<events::Model>, DbErr>;

    async fn list_with_host(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<(events::Model, Option<hosts::Model>)>, DbErr>;

    async fn list_by_host(&self, host_id: i32) -> Result<Vec<events::Model>, DbErr>;

    async fn list_upcoming(&self, today: NaiveDate) -> Result<Vec<events::Model>, DbErr>;

    async fn list_archived(&self, today: NaiveDate) -> Result<Vec<events::Model>, DbErr>;

    async fn search_keyword(&self, keyword: &str) -> Result<Vec<events::Model>, DbErr>;

    async fn set_status(
        &self,
        id: i32,
        status: ApprovalStatus,
    ) -> Result<Option<events::Model>, DbErr>;

    /// Flips every event in `from` to `to`, returning how many changed.
    async fn set_status_all(&self, from: ApprovalStatus, to: ApprovalStatus)
        -> Result<u64, DbErr>;

    async fn update(&self, event: events::ActiveModel) -> Result<events::Model, DbErr>;

    /// Sets `total_seat` unless more seats are already filled. Returns whether
    /// the row changed.
    async fn resize(&self, id: i32, total_seat: i32) -> Result<bool, DbErr>;

    async fn delete(&self, id: i32) -> Result<u64, DbErr>;
}

pub struct EventRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl EventRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn lower_like(column: events::Column, pattern: &str) -> impl IntoCondition {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

/// `%keyword%` with the LIKE wildcards in the keyword matched literally.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.trim().to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait::async_trait]
impl EventRepository for EventRepositoryImpl {
    async fn create(&self, event: NewEvent) -> Result<events::Model, DbErr> {
        events::ActiveModel {
            host_id: Set(event.host_id),
            title: Set(event.title),
            banner_url: Set(event.banner_url),
            location: Set(event.location),
            description: Set(event.description),
            event_date: Set(event.event_date),
            event_time: Set(event.event_time),
            price: Set(event.price),
            total_seat: Set(event.total_seat),
            filled_seat: Set(0),
            category: Set(event.category),
            approval_status: Set(ApprovalStatus::Pending),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<events::Model>, DbErr> {
        Events::find_by_id(id).one(self.db.as_ref()).await
    }

    async fn find_first(&self, lookup: EventLookup) -> Result<Option<events::Model>, DbErr> {
        let condition = match lookup {
            EventLookup::Title(title) => events::Column::Title.eq(title),
            EventLookup::Location(location) => events::Column::Location.eq(location),
            EventLookup::Date(date) => events::Column::EventDate.eq(date),
            EventLookup::HostId(host_id) => events::Column::HostId.eq(host_id),
        };

        Events::find()
            .filter(condition)
            .order_by_asc(events::Column::Id)
            .one(self.db.as_ref())
            .await
    }

    async fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<events::Model>, DbErr> {
        Events::find()
            .filter(events::Column::ApprovalStatus.eq(status))
            .order_by_asc(events::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn list_with_host(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<(events::Model, Option<hosts::Model>)>, DbErr> {
        Events::find()
            .filter(events::Column::ApprovalStatus.eq(status))
            .find_also_related(Hosts)
            .order_by_asc(events::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn list_by_host(&self, host_id: i32) -> Result<Vec<events::Model>, DbErr> {
        Events::find()
            .filter(events::Column::HostId.eq(host_id))
            .order_by_asc(events::Column::EventDate)
            .all(self.db.as_ref())
            .await
    }

    async fn list_upcoming(&self, today: NaiveDate) -> Result<Vec<events::Model>, DbErr> {
        Events::find()
            .filter(events::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
            .filter(events::Column::EventDate.gte(today))
            .order_by_asc(events::Column::EventDate)
            .all(self.db.as_ref())
            .await
    }

    async fn list_archived(&self, today: NaiveDate) -> Result<Vec<events::Model>, DbErr> {
        Events::find()
            .filter(events::Column::ApprovalStatus.eq(ApprovalStatus::Approved))
            .filter(events::Column::EventDate.lt(today))
            .order_by_desc(events::Column::EventDate)
            .all(self.db.as_ref())
            .await
    }

    async fn search_keyword(&self, keyword: &str) -> Result<Vec<events::Model>, DbErr> {
        let pattern = contains_pattern(keyword);

        Events::find()
            .filter(
                Condition::any()
                    .add(lower_like(events::Column::Title, &pattern))
                    .add(lower_like(events::Column::Location, &pattern))
                    .add(lower_like(events::Column::Category, &pattern)),
            )
            .order_by_asc(events::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn set_status(
        &self,
        id: i32,
        status: ApprovalStatus,
    ) -> Result<Option<events::Model>, DbErr> {
        let result = Events::update_many()
            .set(events::ActiveModel {
                approval_status: Set(status),
                ..Default::default()
            })
            .filter(events::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn set_status_all(
        &self,
        from: ApprovalStatus,
        to: ApprovalStatus,
    ) -> Result<u64, DbErr> {
        let result = Events::update_many()
            .set(events::ActiveModel {
                approval_status: Set(to),
                ..Default::default()
            })
            .filter(events::Column::ApprovalStatus.eq(from))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn update(&self, event: events::ActiveModel) -> Result<events::Model, DbErr> {
        event.update(self.db.as_ref()).await
    }

    async fn resize(&self, id: i32, total_seat: i32) -> Result<bool, DbErr> {
        let result = Events::update_many()
            .col_expr(events::Column::TotalSeat, Expr::value(total_seat))
            .filter(events::Column::Id.eq(id))
            .filter(events::Column::FilledSeat.lte(total_seat))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: i32) -> Result<u64, DbErr> {
        let result = Events::delete_by_id(id).exec(self.db.as_ref()).await?;
        Ok(result.rows_affected)
    }
}
