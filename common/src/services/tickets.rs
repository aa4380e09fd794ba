use super::{today, ServiceError};
use crate::domain::ticket_payload::{ticket_code, TicketPayload};
use crate::entities::tickets::{self, TicketState};
use crate::entities::{events, participants, users};
use crate::infra::broadcast::{Broadcaster, Channel};
use crate::infra::mailer::{Mailer, TicketEmail};
use crate::infra::qr;
use crate::repositories::events::EventRepository;
use crate::repositories::tickets::{NewTicket, TicketRepository};
use crate::repositories::users::UserRepository;
use async_trait::async_trait;
use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedTicket {
    pub user: users::Model,
    pub event: events::Model,
    pub ticket_code: String,
    pub verified_at: NaiveDateTime,
}

/// Result of scanning a ticket QR code at the gate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TicketVerification {
    Invalid {
        reason: String,
    },
    Expired {
        ticket_code: String,
        event_date: chrono::NaiveDate,
    },
    Reused {
        ticket_code: String,
        scanned_at: Option<NaiveDateTime>,
    },
    Valid(VerifiedTicket),
}

impl TicketVerification {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Invalid { .. } => "invalid",
            Self::Expired { .. } => "expired",
            Self::Reused { .. } => "reused",
            Self::Valid(_) => "valid",
        }
    }
}

#[async_trait]
pub trait TicketService: Send + Sync {
    /// Mints one QR ticket per booked seat and emails each of them.
    async fn issue_tickets(
        &self,
        participant: &participants::Model,
        user: &users::Model,
        event: &events::Model,
    ) -> Result<Vec<tickets::Model>, ServiceError>;

    async fn verify_ticket(&self, payload: &str) -> Result<TicketVerification, ServiceError>;

    async fn tickets_for_participant(
        &self,
        participant_id: i32,
    ) -> Result<Vec<tickets::Model>, ServiceError>;
}

pub struct TicketServiceImpl {
    repo: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
    mailer: Arc<dyn Mailer>,
    broadcaster: Arc<Broadcaster>,
}

impl TicketServiceImpl {
    pub fn new(
        repo: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        mailer: Arc<dyn Mailer>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repo,
            users,
            events,
            mailer,
            broadcaster,
        }
    }
}

fn qr_failure(err: qr::QrError) -> ServiceError {
    ServiceError::new(500, format!("Failed to render ticket QR code: {}", err))
}

#[async_trait]
impl TicketService for TicketServiceImpl {
    async fn issue_tickets(
        &self,
        participant: &participants::Model,
        user: &users::Model,
        event: &events::Model,
    ) -> Result<Vec<tickets::Model>, ServiceError> {
        // Render every code before writing anything so a bad payload leaves no rows behind.
        let mut rendered = Vec::with_capacity(participant.total_booked.max(0) as usize);
        for unit in 1..=participant.total_booked {
            let code = ticket_code(participant.id, unit);
            let payload = TicketPayload {
                user_id: user.id,
                user_name: user.name.clone(),
                event_id: event.id,
                event_name: event.title.clone(),
                ticket_code: code.clone(),
                user_email: user.email.clone(),
            }
            .encode();
            let png = qr::render_png(&payload).map_err(qr_failure)?;
            rendered.push((unit, code, payload, png));
        }

        let mut issued = Vec::with_capacity(rendered.len());
        let mut emails = Vec::with_capacity(rendered.len());
        for (unit, code, payload, png) in rendered {
            let ticket = self
                .repo
                .create(NewTicket {
                    host_id: event.host_id,
                    event_id: event.id,
                    user_id: user.id,
                    participant_id: participant.id,
                    ticket_code: code.clone(),
                    user_email: user.email.clone(),
                    user_name: user.name.clone(),
                    payload,
                    qr_image: base64::engine::general_purpose::STANDARD.encode(&png),
                })
                .await?;

            emails.push((
                ticket.id,
                TicketEmail {
                    to: user.email.clone(),
                    user_name: user.name.clone(),
                    event_title: event.title.clone(),
                    event_location: event.location.clone(),
                    event_date: event.event_date,
                    event_time: event.event_time.clone(),
                    ticket_no: unit,
                    ticket_code: code,
                    qr_png: png,
                },
            ));
            issued.push(ticket);
        }

        for (ticket_id, email) in emails {
            if let Err(e) = self.mailer.send_ticket(email).await {
                tracing::warn!(
                    ticket_id,
                    participant_id = participant.id,
                    "failed to email ticket: {}",
                    e
                );
            }
        }

        tracing::info!(
            participant_id = participant.id,
            count = issued.len(),
            "tickets issued"
        );
        Ok(issued)
    }

    async fn verify_ticket(&self, payload: &str) -> Result<TicketVerification, ServiceError> {
        let parsed = match TicketPayload::parse(payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("rejected ticket payload: {}", e);
                return Ok(TicketVerification::invalid(e.to_string()));
            }
        };

        let Some(user) = self.users.find_by_id(parsed.user_id).await? else {
            return Ok(TicketVerification::invalid("unknown user"));
        };
        let Some(event) = self.events.find_by_id(parsed.event_id).await? else {
            return Ok(TicketVerification::invalid("unknown event"));
        };
        let Some(ticket) = self.repo.find_by_code(&parsed.ticket_code).await? else {
            return Ok(TicketVerification::invalid("unknown ticket"));
        };
        if ticket.user_id != user.id
            || ticket.event_id != event.id
            || !ticket.user_email.eq_ignore_ascii_case(&parsed.user_email)
        {
            return Ok(TicketVerification::invalid("ticket does not match holder"));
        }

        if event.event_date < today() {
            return Ok(TicketVerification::Expired {
                ticket_code: ticket.ticket_code,
                event_date: event.event_date,
            });
        }

        if ticket.state == TicketState::Verified {
            return Ok(TicketVerification::Reused {
                ticket_code: ticket.ticket_code,
                scanned_at: ticket.scanned_at,
            });
        }

        let verified_at = chrono::Utc::now().naive_utc();
        if !self.repo.redeem(ticket.id, verified_at).await? {
            let scanned_at = self
                .repo
                .find_by_code(&ticket.ticket_code)
                .await?
                .and_then(|t| t.scanned_at);
            return Ok(TicketVerification::Reused {
                ticket_code: ticket.ticket_code,
                scanned_at,
            });
        }

        let verified = VerifiedTicket {
            user,
            event,
            ticket_code: ticket.ticket_code,
            verified_at,
        };
        tracing::info!(ticket_code = %verified.ticket_code, "ticket verified");
        self.broadcaster
            .publish(Channel::Tickets, "ticket_verified", &verified);
        Ok(TicketVerification::Valid(verified))
    }

    async fn tickets_for_participant(
        &self,
        participant_id: i32,
    ) -> Result<Vec<tickets::Model>, ServiceError> {
        Ok(self.repo.list_by_participant(participant_id).await?)
    }
}
