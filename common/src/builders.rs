use crate::config::{MailSettings, Settings};
use crate::infra::broadcast::Broadcaster;
use crate::infra::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::repositories::{
    events::EventRepositoryImpl, hosts::HostRepositoryImpl, otp::OtpRepositoryImpl,
    participants::ParticipantRepositoryImpl, tickets::TicketRepositoryImpl,
    users::UserRepositoryImpl,
};
use crate::services::{
    analytics::AnalyticsServiceImpl, bookings::BookingServiceImpl, events::EventServiceImpl,
    hosts::HostServiceImpl, otp::OtpServiceImpl, tickets::TicketServiceImpl,
    users::UserServiceImpl,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repositories {
    pub user_repo: Arc<dyn crate::repositories::users::UserRepository>,
    pub host_repo: Arc<dyn crate::repositories::hosts::HostRepository>,
    pub event_repo: Arc<dyn crate::repositories::events::EventRepository>,
    pub participant_repo: Arc<dyn crate::repositories::participants::ParticipantRepository>,
    pub ticket_repo: Arc<dyn crate::repositories::tickets::TicketRepository>,
    pub otp_repo: Arc<dyn crate::repositories::otp::OtpRepository>,
}

#[derive(Clone)]
pub struct Services {
    pub user_service: Arc<dyn crate::services::users::UserService>,
    pub host_service: Arc<dyn crate::services::hosts::HostService>,
    pub event_service: Arc<dyn crate::services::events::EventService>,
    pub booking_service: Arc<dyn crate::services::bookings::BookingService>,
    pub ticket_service: Arc<dyn crate::services::tickets::TicketService>,
    pub analytics_service: Arc<dyn crate::services::analytics::AnalyticsService>,
    pub broadcaster: Arc<Broadcaster>,
}

pub fn build_repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        user_repo: Arc::new(UserRepositoryImpl::new(db.clone())),
        host_repo: Arc::new(HostRepositoryImpl::new(db.clone())),
        event_repo: Arc::new(EventRepositoryImpl::new(db.clone())),
        participant_repo: Arc::new(ParticipantRepositoryImpl::new(db.clone())),
        ticket_repo: Arc::new(TicketRepositoryImpl::new(db.clone())),
        otp_repo: Arc::new(OtpRepositoryImpl::new(db)),
    }
}

/// SMTP when mail is enabled and the transport can be built, log-only otherwise.
pub fn build_mailer(settings: &MailSettings) -> Arc<dyn Mailer> {
    if !settings.enabled {
        tracing::info!("mail disabled, outgoing emails will only be logged");
        return Arc::new(LogMailer);
    }

    match SmtpMailer::from_settings(settings) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            tracing::error!("failed to configure smtp transport, falling back to log mailer: {}", e);
            Arc::new(LogMailer)
        }
    }
}

pub fn build_services(repos: &Repositories, settings: &Settings) -> Services {
    let mailer = build_mailer(&settings.mail);
    let broadcaster = Arc::new(Broadcaster::new(settings.realtime.channel_capacity));
    let otp_service = Arc::new(OtpServiceImpl::new(
        repos.otp_repo.clone(),
        settings.otp.ttl_seconds,
    ));

    let user_service = Arc::new(UserServiceImpl::new(
        repos.user_repo.clone(),
        otp_service.clone(),
        mailer.clone(),
        broadcaster.clone(),
    ));

    let host_service = Arc::new(HostServiceImpl::new(
        repos.host_repo.clone(),
        otp_service,
        mailer.clone(),
        broadcaster.clone(),
    ));

    let event_service = Arc::new(EventServiceImpl::new(
        repos.event_repo.clone(),
        repos.host_repo.clone(),
        mailer.clone(),
        broadcaster.clone(),
    ));

    let ticket_service = Arc::new(TicketServiceImpl::new(
        repos.ticket_repo.clone(),
        repos.user_repo.clone(),
        repos.event_repo.clone(),
        mailer,
        broadcaster.clone(),
    ));

    let booking_service = Arc::new(BookingServiceImpl::new(
        repos.participant_repo.clone(),
        repos.event_repo.clone(),
        repos.user_repo.clone(),
        ticket_service.clone(),
        broadcaster.clone(),
    ));

    let analytics_service = Arc::new(AnalyticsServiceImpl::new(repos.participant_repo.clone()));

    Services {
        user_service,
        host_service,
        event_service,
        booking_service,
        ticket_service,
        analytics_service,
        broadcaster,
    }
}

pub async fn build_all(
    db: Arc<DatabaseConnection>,
    settings: &Settings,
) -> (Repositories, Services) {
    let repos = build_repositories(db);
    let services = build_services(&repos, settings);
    (repos, services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::db::memory_db;

    #[tokio::test]
    async fn build_all_wires_log_mailer_by_default() {
        let db = Arc::new(memory_db().await);
        let settings = Settings::default();
        assert!(!settings.mail.enabled);

        let (_repos, services) = build_all(db, &settings).await;
        assert!(services.user_service.list_users().await.unwrap().is_empty());
        assert!(services
            .broadcaster
            .subscribe(crate::infra::broadcast::Channel::Events)
            .is_some());
    }
}
