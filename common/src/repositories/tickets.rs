use crate::entities::{prelude::*, tickets};
use chrono::NaiveDateTime;
use sea_orm::*;
use std::sync::Arc;

pub struct NewTicket {
    pub host_id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub participant_id: i32,
    pub ticket_code: String,
    pub user_email: String,
    pub user_name: String,
    pub payload: String,
    pub qr_image: String,
}

#[async_trait::async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create(&self, ticket: NewTicket) -> Result<tickets::Model, DbErr>;

    async fn find_by_code(&self, ticket_code: &str) -> Result<Option<tickets::Model>, DbErr>;

    async fn list_by_participant(
        &self,
        participant_id: i32,
    ) -> Result<Vec<tickets::Model>, DbErr>;

    /// Flips an unverified ticket to verified. False when it was already
    /// verified, including when a concurrent scan got there first.
    async fn redeem(&self, id: i32, scanned_at: NaiveDateTime) -> Result<bool, DbErr>;
}

pub struct TicketRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl TicketRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl TicketRepository for TicketRepositoryImpl {
    async fn create(&self, ticket: NewTicket) -> Result<tickets::Model, DbErr> {
        tickets::ActiveModel {
            host_id: Set(ticket.host_id),
            event_id: Set(ticket.event_id),
            user_id: Set(ticket.user_id),
            participant_id: Set(ticket.participant_id),
            ticket_code: Set(ticket.ticket_code),
            user_email: Set(ticket.user_email),
            user_name: Set(ticket.user_name),
            payload: Set(ticket.payload),
            qr_image: Set(ticket.qr_image),
            state: Set(tickets::TicketState::Unverified),
            created_at: Set(chrono::Utc::now().naive_utc()),
            scanned_at: Set(None),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    async fn find_by_code(&self, ticket_code: &str) -> Result<Option<tickets::Model>, DbErr> {
        Tickets::find()
            .filter(tickets::Column::TicketCode.eq(ticket_code))
            .one(self.db.as_ref())
            .await
    }

    async fn list_by_participant(
        &self,
        participant_id: i32,
    ) -> Result<Vec<tickets::Model>, DbErr> {
        Tickets::find()
            .filter(tickets::Column::ParticipantId.eq(participant_id))
            .order_by_asc(tickets::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn redeem(&self, id: i32, scanned_at: NaiveDateTime) -> Result<bool, DbErr> {
        let result = Tickets::update_many()
            .set(tickets::ActiveModel {
                state: Set(tickets::TicketState::Verified),
                scanned_at: Set(Some(scanned_at)),
                ..Default::default()
            })
            .filter(tickets::Column::Id.eq(id))
            .filter(tickets::Column::State.eq(tickets::TicketState::Unverified))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }
}
