use crate::domain::analytics::{DaySales, SalesTotals};
use crate::entities::{events, participants, prelude::*, tickets, users};
use chrono::NaiveDate;
use sea_orm::sea_query::{Alias, Expr, Func, FunctionCall, SimpleExpr};
use sea_orm::*;
use std::sync::Arc;

/// Columns participants may be listed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantField {
    HostId,
    EventId,
    UserId,
}

impl ParticipantField {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "host_id" => Some(Self::HostId),
            "event_id" => Some(Self::EventId),
            "user_id" => Some(Self::UserId),
            _ => None,
        }
    }

    fn column(self) -> participants::Column {
        match self {
            Self::HostId => participants::Column::HostId,
            Self::EventId => participants::Column::EventId,
            Self::UserId => participants::Column::UserId,
        }
    }
}

/// Which bookings a sales figure is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalesScope {
    All,
    Event(i32),
    Category(String),
}

#[derive(Debug)]
pub enum BookingOutcome {
    Booked(participants::Model),
    NotEnoughSeats,
}

#[async_trait::async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Reserves `total_booked` seats on `event` and records the participant in
    /// one transaction. The seat counter never exceeds `total_seat`.
    async fn book(
        &self,
        event: &events::Model,
        user_id: i32,
        total_booked: i32,
    ) -> Result<BookingOutcome, DbErr>;

    /// Undoes `book`: drops the participant with any tickets already minted
    /// for it and gives its seats back.
    async fn release(&self, participant: &participants::Model) -> Result<(), DbErr>;

    async fn list_with_user(
        &self,
    ) -> Result<Vec<(participants::Model, Option<users::Model>)>, DbErr>;

    async fn list_by_field(
        &self,
        field: ParticipantField,
        value: i32,
    ) -> Result<Vec<participants::Model>, DbErr>;

    /// Payment and seat sums per payment day, oldest first. Unpaid rows are
    /// left out.
    async fn sales_by_day(&self, scope: SalesScope) -> Result<Vec<DaySales>, DbErr>;

    /// Payment and seat sums over the whole scope, unpaid rows included.
    async fn sales_totals(&self, scope: SalesScope) -> Result<SalesTotals, DbErr>;
}

pub struct ParticipantRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ParticipantRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromQueryResult)]
struct DaySalesRow {
    day: NaiveDate,
    payment: f64,
    booked: i64,
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    payment: Option<f64>,
    booked: Option<i64>,
}

fn in_scope(query: Select<Participants>, scope: SalesScope) -> Select<Participants> {
    match scope {
        SalesScope::All => query,
        SalesScope::Event(event_id) => query.filter(participants::Column::EventId.eq(event_id)),
        SalesScope::Category(category) => query
            .inner_join(Events)
            .filter(events::Column::Category.eq(category)),
    }
}

fn payment_day() -> FunctionCall {
    Func::cust(Alias::new("DATE")).arg(Expr::col((Participants, participants::Column::PaymentDate)))
}

fn summed(query: Select<Participants>) -> Select<Participants> {
    query
        .select_only()
        .column_as(
            Expr::col((Participants, participants::Column::Payment)).sum(),
            "payment",
        )
        .column_as(
            Expr::col((Participants, participants::Column::TotalBooked)).sum(),
            "booked",
        )
}

#[async_trait::async_trait]
impl ParticipantRepository for ParticipantRepositoryImpl {
    async fn book(
        &self,
        event: &events::Model,
        user_id: i32,
        total_booked: i32,
    ) -> Result<BookingOutcome, DbErr> {
        let txn = self.db.begin().await?;

        let reserved = Events::update_many()
            .col_expr(
                events::Column::FilledSeat,
                Expr::col(events::Column::FilledSeat).add(total_booked),
            )
            .filter(events::Column::Id.eq(event.id))
            .filter(
                Expr::col(events::Column::FilledSeat)
                    .add(total_booked)
                    .lte(Expr::col(events::Column::TotalSeat)),
            )
            .exec(&txn)
            .await?;

        if reserved.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(BookingOutcome::NotEnoughSeats);
        }

        let participant = participants::ActiveModel {
            host_id: Set(event.host_id),
            event_id: Set(event.id),
            user_id: Set(user_id),
            total_booked: Set(total_booked),
            payment: Set(event.price * f64::from(total_booked)),
            due: Set(0.0),
            payment_date: Set(Some(chrono::Utc::now().naive_utc())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(BookingOutcome::Booked(participant))
    }

    async fn release(&self, participant: &participants::Model) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        Tickets::delete_many()
            .filter(tickets::Column::ParticipantId.eq(participant.id))
            .exec(&txn)
            .await?;
        let removed = Participants::delete_by_id(participant.id).exec(&txn).await?;

        if removed.rows_affected > 0 {
            Events::update_many()
                .col_expr(
                    events::Column::FilledSeat,
                    Expr::col(events::Column::FilledSeat).sub(participant.total_booked),
                )
                .filter(events::Column::Id.eq(participant.event_id))
                .filter(events::Column::FilledSeat.gte(participant.total_booked))
                .exec(&txn)
                .await?;
        }

        txn.commit().await
    }

    async fn list_with_user(
        &self,
    ) -> Result<Vec<(participants::Model, Option<users::Model>)>, DbErr> {
        Participants::find()
            .find_also_related(Users)
            .order_by_asc(participants::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn list_by_field(
        &self,
        field: ParticipantField,
        value: i32,
    ) -> Result<Vec<participants::Model>, DbErr> {
        Participants::find()
            .filter(field.column().eq(value))
            .order_by_asc(participants::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn sales_by_day(&self, scope: SalesScope) -> Result<Vec<DaySales>, DbErr> {
        let rows = summed(in_scope(Participants::find(), scope))
            .column_as(SimpleExpr::from(payment_day()), "day")
            .filter(participants::Column::PaymentDate.is_not_null())
            .group_by(payment_day())
            .order_by_asc(payment_day())
            .into_model::<DaySalesRow>()
            .all(self.db.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| DaySales {
                day: row.day,
                payment: row.payment,
                booked: row.booked,
            })
            .collect())
    }

    async fn sales_totals(&self, scope: SalesScope) -> Result<SalesTotals, DbErr> {
        let row = summed(in_scope(Participants::find(), scope))
            .into_model::<TotalsRow>()
            .one(self.db.as_ref())
            .await?;

        Ok(row
            .map(|row| SalesTotals {
                total_sale: row.payment.unwrap_or_default(),
                total_participants: row.booked.unwrap_or_default(),
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::events::ApprovalStatus;
    use crate::persistence::db::{file_db, memory_db};
    use crate::testing::{far_future, seed_event, seed_host, seed_participant, seed_user};

    #[test]
    fn participant_field_parsing() {
        assert_eq!(ParticipantField::parse("event_id"), Some(ParticipantField::EventId));
        assert_eq!(ParticipantField::parse("email"), None);
    }

    #[tokio::test]
    async fn booking_fills_seats_and_records_payment() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 5, ApprovalStatus::Approved).await;
        let repo = ParticipantRepositoryImpl::new(db.clone());

        let BookingOutcome::Booked(participant) = repo.book(&event, user.id, 3).await.unwrap() else {
            panic!("expected booking to succeed");
        };
        assert_eq!(participant.total_booked, 3);
        assert_eq!(participant.payment, 1500.0);
        assert_eq!(participant.due, 0.0);
        assert!(participant.payment_date.is_some());

        let reloaded = Events::find_by_id(event.id).one(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(reloaded.filled_seat, 3);
    }

    #[tokio::test]
    async fn overbooking_is_refused_without_side_effects() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 2, ApprovalStatus::Approved).await;
        let repo = ParticipantRepositoryImpl::new(db.clone());

        assert!(matches!(
            repo.book(&event, user.id, 2).await.unwrap(),
            BookingOutcome::Booked(_)
        ));
        assert!(matches!(
            repo.book(&event, user.id, 1).await.unwrap(),
            BookingOutcome::NotEnoughSeats
        ));

        let reloaded = Events::find_by_id(event.id).one(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(reloaded.filled_seat, 2);
        assert_eq!(repo.list_with_user().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_never_exceed_capacity() {
        let (db, _file) = file_db("concurrent-booking").await;
        let db = Arc::new(db);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 3, ApprovalStatus::Approved).await;
        let repo = Arc::new(ParticipantRepositoryImpl::new(db.clone()));

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                let event = event.clone();
                tokio::spawn(async move { repo.book(&event, user.id, 1).await })
            })
            .collect();

        let mut booked = 0;
        let mut refused = 0;
        for attempt in attempts {
            match attempt.await.unwrap().unwrap() {
                BookingOutcome::Booked(_) => booked += 1,
                BookingOutcome::NotEnoughSeats => refused += 1,
            }
        }
        assert_eq!(booked, 3);
        assert_eq!(refused, 5);

        let reloaded = Events::find_by_id(event.id).one(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(reloaded.filled_seat, 3);
        assert_eq!(repo.list_with_user().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn release_returns_seats_and_drops_tickets() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 4, ApprovalStatus::Approved).await;
        let repo = ParticipantRepositoryImpl::new(db.clone());

        let BookingOutcome::Booked(participant) = repo.book(&event, user.id, 3).await.unwrap() else {
            panic!("expected booking to succeed");
        };
        tickets::ActiveModel {
            host_id: Set(event.host_id),
            event_id: Set(event.id),
            user_id: Set(user.id),
            participant_id: Set(participant.id),
            ticket_code: Set(format!("{}.1", participant.id)),
            user_email: Set(user.email.clone()),
            user_name: Set(user.name.clone()),
            payload: Set(String::new()),
            qr_image: Set(String::new()),
            state: Set(tickets::TicketState::Unverified),
            created_at: Set(chrono::Utc::now().naive_utc()),
            scanned_at: Set(None),
            ..Default::default()
        }
        .insert(db.as_ref())
        .await
        .unwrap();

        repo.release(&participant).await.unwrap();

        let reloaded = Events::find_by_id(event.id).one(db.as_ref()).await.unwrap().unwrap();
        assert_eq!(reloaded.filled_seat, 0);
        assert!(repo.list_with_user().await.unwrap().is_empty());
        assert_eq!(Tickets::find().count(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sales_are_summed_per_day_in_the_database() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let gig = seed_event(&db, host.id, "Gig", far_future(), 50, ApprovalStatus::Approved).await;
        let other = seed_event(&db, host.id, "Other", far_future(), 50, ApprovalStatus::Approved).await;
        let morning = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0);
        let evening = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(21, 30, 0);
        let later = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap().and_hms_opt(12, 0, 0);
        seed_participant(&db, &gig, user.id, 2, morning).await;
        seed_participant(&db, &gig, user.id, 1, evening).await;
        seed_participant(&db, &gig, user.id, 3, later).await;
        seed_participant(&db, &gig, user.id, 4, None).await;
        seed_participant(&db, &other, user.id, 1, later).await;
        let repo = ParticipantRepositoryImpl::new(db);

        let days = repo.sales_by_day(SalesScope::Event(gig.id)).await.unwrap();
        assert_eq!(
            days,
            vec![
                DaySales {
                    day: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    payment: 1500.0,
                    booked: 3
                },
                DaySales {
                    day: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                    payment: 1500.0,
                    booked: 3
                },
            ]
        );

        let all = repo.sales_by_day(SalesScope::All).await.unwrap();
        assert_eq!(all[1].booked, 4);

        let totals = repo.sales_totals(SalesScope::Event(gig.id)).await.unwrap();
        assert_eq!(totals.total_participants, 10);
        assert_eq!(totals.total_sale, 5000.0);

        let music = repo
            .sales_totals(SalesScope::Category("Music".to_string()))
            .await
            .unwrap();
        assert_eq!(music.total_participants, 11);
        assert_eq!(
            repo.sales_totals(SalesScope::Category("Sports".to_string()))
                .await
                .unwrap(),
            SalesTotals::default()
        );
        assert!(repo
            .sales_by_day(SalesScope::Category("Sports".to_string()))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.list_by_field(ParticipantField::UserId, user.id)
                .await
                .unwrap()
                .len(),
            5
        );
    }
}
