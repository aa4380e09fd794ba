use super::{
    conflict_on_unique, hash_new_password, normalize_email, require_text_max, ServiceError,
    MAX_NAME_LEN,
};
use crate::domain::password::random_password;
use crate::entities::events::ApprovalStatus;
use crate::entities::{participants, tickets, users};
use crate::infra::broadcast::{Broadcaster, Channel};
use crate::repositories::events::EventRepository;
use crate::repositories::participants::{BookingOutcome, ParticipantField, ParticipantRepository};
use crate::repositories::users::{NewUser, UserRepository};
use crate::services::tickets::TicketService;
use async_trait::async_trait;
use sea_orm::{IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const GUEST_NAME: &str = "Guest User";
const GUEST_PHONE: &str = "00000000000";

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub user_id: i32,
    pub event_id: i32,
    pub total_booked: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuestBookingRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub event_id: i32,
    pub total_booked: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub participant: participants::Model,
    pub tickets: Vec<tickets::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantWithUser {
    #[serde(flatten)]
    pub participant: participants::Model,
    pub user: Option<users::Model>,
}

#[async_trait]
pub trait BookingService: Send + Sync {
    async fn book(&self, request: BookingRequest) -> Result<Booking, ServiceError>;

    /// Books on behalf of a visitor, creating an account for the email when needed.
    async fn guest_booking(&self, request: GuestBookingRequest) -> Result<Booking, ServiceError>;

    async fn list_participants(&self) -> Result<Vec<ParticipantWithUser>, ServiceError>;

    async fn participants_by(
        &self,
        field: &str,
        value: i32,
    ) -> Result<Vec<participants::Model>, ServiceError>;
}

pub struct BookingServiceImpl {
    repo: Arc<dyn ParticipantRepository>,
    events: Arc<dyn EventRepository>,
    users: Arc<dyn UserRepository>,
    tickets: Arc<dyn TicketService>,
    broadcaster: Arc<Broadcaster>,
}

impl BookingServiceImpl {
    pub fn new(
        repo: Arc<dyn ParticipantRepository>,
        events: Arc<dyn EventRepository>,
        users: Arc<dyn UserRepository>,
        tickets: Arc<dyn TicketService>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repo,
            events,
            users,
            tickets,
            broadcaster,
        }
    }

    async fn guest_user(&self, request: &GuestBookingRequest) -> Result<users::Model, ServiceError> {
        let email = normalize_email(&request.email)?;
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(name) = name {
            require_text_max(name, "name", MAX_NAME_LEN)?;
        }
        let phone = request
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let Some(existing) = self.users.find_by_email(&email).await? else {
            let user = self
                .users
                .create(NewUser {
                    name: name.unwrap_or(GUEST_NAME).to_string(),
                    email,
                    password_hash: hash_new_password(&random_password())?,
                    phone_number: phone.unwrap_or(GUEST_PHONE).to_string(),
                    image_url: None,
                })
                .await
                .map_err(|e| conflict_on_unique(e, "Email already registered"))?;
            tracing::info!(user_id = user.id, "guest account created");
            self.broadcaster.publish(Channel::Users, "new_user", &user);
            return Ok(user);
        };

        let rename = name.filter(|n| *n != existing.name).map(str::to_string);
        let rephone = phone
            .filter(|p| *p != existing.phone_number)
            .map(str::to_string);
        if rename.is_none() && rephone.is_none() {
            return Ok(existing);
        }

        let mut active = existing.into_active_model();
        if let Some(name) = rename {
            active.name = Set(name);
        }
        if let Some(phone) = rephone {
            active.phone_number = Set(phone);
        }
        Ok(self.users.update(active).await?)
    }
}

#[async_trait]
impl BookingService for BookingServiceImpl {
    async fn book(&self, request: BookingRequest) -> Result<Booking, ServiceError> {
        if request.total_booked < 1 {
            return Err(ServiceError::new(400, "total_booked must be at least 1"));
        }

        let event = self
            .events
            .find_by_id(request.event_id)
            .await?
            .ok_or_else(|| ServiceError::new(404, "Event not found"))?;
        if event.approval_status != ApprovalStatus::Approved {
            return Err(ServiceError::new(400, "Event is not open for booking"));
        }

        let user = self
            .users
            .find_by_id(request.user_id)
            .await?
            .ok_or_else(|| ServiceError::new(404, "User not found"))?;

        let participant = match self.repo.book(&event, user.id, request.total_booked).await? {
            BookingOutcome::Booked(participant) => participant,
            BookingOutcome::NotEnoughSeats => {
                return Err(ServiceError::new(409, "Not enough seats available").with_data(
                    serde_json::json!({ "seats_left": event.seats_left() }),
                ));
            }
        };

        let tickets = match self.tickets.issue_tickets(&participant, &user, &event).await {
            Ok(tickets) => tickets,
            Err(err) => {
                tracing::error!(
                    participant_id = participant.id,
                    event_id = event.id,
                    "ticket issuance failed, releasing seats: {}",
                    err.message
                );
                if let Err(e) = self.repo.release(&participant).await {
                    tracing::error!(participant_id = participant.id, "failed to release seats: {}", e);
                }
                return Err(err);
            }
        };

        tracing::info!(
            participant_id = participant.id,
            event_id = event.id,
            seats = participant.total_booked,
            "booking confirmed"
        );
        self.broadcaster
            .publish(Channel::Participants, "new_participant", &participant);

        Ok(Booking {
            participant,
            tickets,
        })
    }

    async fn guest_booking(&self, request: GuestBookingRequest) -> Result<Booking, ServiceError> {
        if request.total_booked < 1 {
            return Err(ServiceError::new(400, "total_booked must be at least 1"));
        }
        let user = self.guest_user(&request).await?;

        self.book(BookingRequest {
            user_id: user.id,
            event_id: request.event_id,
            total_booked: request.total_booked,
        })
        .await
    }

    async fn list_participants(&self) -> Result<Vec<ParticipantWithUser>, ServiceError> {
        let rows = self.repo.list_with_user().await?;
        Ok(rows
            .into_iter()
            .map(|(participant, user)| ParticipantWithUser { participant, user })
            .collect())
    }

    async fn participants_by(
        &self,
        field: &str,
        value: i32,
    ) -> Result<Vec<participants::Model>, ServiceError> {
        let field = ParticipantField::parse(field).ok_or_else(|| {
            ServiceError::new(400, "field must be one of host_id, event_id, user_id")
        })?;
        Ok(self.repo.list_by_field(field, value).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mailer::MockMailer;
    use crate::persistence::db::memory_db;
    use crate::repositories::events::EventRepositoryImpl;
    use crate::repositories::participants::ParticipantRepositoryImpl;
    use crate::repositories::tickets::TicketRepositoryImpl;
    use crate::repositories::users::UserRepositoryImpl;
    use crate::services::tickets::TicketServiceImpl;
    use crate::testing::{far_future, seed_event, seed_host, seed_user};
    use sea_orm::DatabaseConnection;

    fn service(db: Arc<DatabaseConnection>) -> (BookingServiceImpl, Arc<Broadcaster>) {
        let mut mailer = MockMailer::new();
        mailer.expect_send_ticket().returning(|_| Ok(()));

        let broadcaster = Arc::new(Broadcaster::new(16));
        let users = Arc::new(UserRepositoryImpl::new(db.clone()));
        let events = Arc::new(EventRepositoryImpl::new(db.clone()));
        let tickets = Arc::new(TicketServiceImpl::new(
            Arc::new(TicketRepositoryImpl::new(db.clone())),
            users.clone(),
            events.clone(),
            Arc::new(mailer),
            broadcaster.clone(),
        ));
        let service = BookingServiceImpl::new(
            Arc::new(ParticipantRepositoryImpl::new(db)),
            events,
            users,
            tickets,
            broadcaster.clone(),
        );
        (service, broadcaster)
    }

    #[tokio::test]
    async fn booking_returns_participant_and_tickets() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 5, ApprovalStatus::Approved).await;
        let (service, broadcaster) = service(db);
        let mut participants_rx = broadcaster.subscribe(Channel::Participants).unwrap();

        let booking = service
            .book(BookingRequest {
                user_id: user.id,
                event_id: event.id,
                total_booked: 3,
            })
            .await
            .unwrap();

        assert_eq!(booking.participant.payment, 1500.0);
        assert_eq!(booking.tickets.len(), 3);
        assert_eq!(participants_rx.recv().await.unwrap().event, "new_participant");

        let err = service
            .book(BookingRequest {
                user_id: user.id,
                event_id: event.id,
                total_booked: 3,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, 409);
    }

    #[tokio::test]
    async fn failed_issuance_releases_seats() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let title = "X".repeat(4000);
        let event = seed_event(&db, host.id, &title, far_future(), 5, ApprovalStatus::Approved).await;
        let (service, broadcaster) = service(db.clone());
        let mut participants_rx = broadcaster.subscribe(Channel::Participants).unwrap();

        let err = service
            .book(BookingRequest {
                user_id: user.id,
                event_id: event.id,
                total_booked: 2,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, 500);

        let reloaded = EventRepositoryImpl::new(db)
            .find_by_id(event.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.filled_seat, 0);
        assert!(service.list_participants().await.unwrap().is_empty());
        assert!(participants_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn booking_preconditions() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let pending = seed_event(&db, host.id, "Soon", far_future(), 5, ApprovalStatus::Pending).await;
        let open = seed_event(&db, host.id, "Open", far_future(), 5, ApprovalStatus::Approved).await;
        let (service, _) = service(db);

        let attempt = |user_id, event_id, total_booked| BookingRequest {
            user_id,
            event_id,
            total_booked,
        };
        assert_eq!(service.book(attempt(user.id, open.id, 0)).await.unwrap_err().code, 400);
        assert_eq!(service.book(attempt(user.id, 999, 1)).await.unwrap_err().code, 404);
        assert_eq!(service.book(attempt(user.id, pending.id, 1)).await.unwrap_err().code, 400);
        assert_eq!(service.book(attempt(999, open.id, 1)).await.unwrap_err().code, 404);
    }

    #[tokio::test]
    async fn guest_booking_creates_then_reuses_account() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 10, ApprovalStatus::Approved).await;
        let (service, _) = service(db.clone());

        let first = service
            .guest_booking(GuestBookingRequest {
                name: None,
                email: "Walkin@Example.com".to_string(),
                phone_number: None,
                event_id: event.id,
                total_booked: 1,
            })
            .await
            .unwrap();

        let users = UserRepositoryImpl::new(db);
        let guest = users.find_by_email("walkin@example.com").await.unwrap().unwrap();
        assert_eq!(guest.name, GUEST_NAME);
        assert_eq!(guest.phone_number, GUEST_PHONE);
        assert_eq!(first.participant.user_id, guest.id);

        service
            .guest_booking(GuestBookingRequest {
                name: Some("Tanvir".to_string()),
                email: "walkin@example.com".to_string(),
                phone_number: None,
                event_id: event.id,
                total_booked: 2,
            })
            .await
            .unwrap();

        let renamed = users.find_by_email("walkin@example.com").await.unwrap().unwrap();
        assert_eq!(renamed.id, guest.id);
        assert_eq!(renamed.name, "Tanvir");
        assert_eq!(renamed.phone_number, GUEST_PHONE);
    }

    #[tokio::test]
    async fn participants_by_rejects_unknown_field() {
        let db = Arc::new(memory_db().await);
        let host = seed_host(&db, "h@example.com").await;
        let user = seed_user(&db, "u@example.com").await;
        let event = seed_event(&db, host.id, "Gig", far_future(), 10, ApprovalStatus::Approved).await;
        let (service, _) = service(db);
        service
            .book(BookingRequest {
                user_id: user.id,
                event_id: event.id,
                total_booked: 1,
            })
            .await
            .unwrap();

        assert_eq!(service.participants_by("host_id", host.id).await.unwrap().len(), 1);
        assert_eq!(service.participants_by("email", 1).await.unwrap_err().code, 400);

        let listed = service.list_participants().await.unwrap();
        assert_eq!(listed[0].user.as_ref().map(|u| u.id), Some(user.id));
    }
}
