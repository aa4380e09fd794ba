use super::{require_text, require_text_max, today, ServiceError, MAX_TITLE_LEN};
use crate::entities::events::{self, ApprovalStatus};
use crate::entities::hosts;
use crate::infra::broadcast::{Broadcaster, Channel};
use crate::infra::mailer::Mailer;
use crate::repositories::events::{EventLookup, EventRepository, NewEvent};
use crate::repositories::hosts::HostRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub host_id: i32,
    pub title: String,
    #[serde(default)]
    pub banner_url: Option<String>,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub price: f64,
    pub total_seat: i32,
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub banner_url: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<String>,
    pub price: Option<f64>,
    pub total_seat: Option<i32>,
    pub category: Option<String>,
}

impl EventPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.banner_url.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.event_date.is_none()
            && self.event_time.is_none()
            && self.price.is_none()
            && self.total_seat.is_none()
            && self.category.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventWithHost {
    #[serde(flatten)]
    pub event: events::Model,
    pub host: Option<hosts::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatAvailability {
    pub total_seat: i32,
    pub filled_seat: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetEarning {
    pub target: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSale {
    pub sale: f64,
}

#[async_trait]
pub trait EventService: Send + Sync {
    async fn add_event(&self, input: CreateEvent) -> Result<events::Model, ServiceError>;

    async fn list_events(&self) -> Result<Vec<events::Model>, ServiceError>;

    async fn list_pending(&self) -> Result<Vec<EventWithHost>, ServiceError>;

    async fn get_event(&self, id: i32) -> Result<events::Model, ServiceError>;

    /// Approves the event and mails its host in the background.
    async fn approve_event(&self, id: i32) -> Result<events::Model, ServiceError>;

    async fn reject_event(&self, id: i32) -> Result<events::Model, ServiceError>;

    /// Approves every pending event, returning how many changed.
    async fn approve_existing(&self) -> Result<u64, ServiceError>;

    /// First match of id, title, location, date (`YYYY-MM-DD`) and host id.
    async fn search_event(&self, value: &str) -> Result<events::Model, ServiceError>;

    async fn filter_events(&self, keyword: &str) -> Result<Vec<events::Model>, ServiceError>;

    async fn update_event(&self, id: i32, patch: EventPatch)
        -> Result<events::Model, ServiceError>;

    async fn delete_event(&self, id: i32) -> Result<(), ServiceError>;

    async fn upcoming_events(&self) -> Result<Vec<events::Model>, ServiceError>;

    async fn archived_events(&self) -> Result<Vec<events::Model>, ServiceError>;

    async fn events_by_host(&self, host_id: i32) -> Result<Vec<events::Model>, ServiceError>;

    async fn seat_availability(&self, id: i32) -> Result<SeatAvailability, ServiceError>;

    async fn target_earning(&self, id: i32) -> Result<TargetEarning, ServiceError>;

    async fn total_sale(&self, id: i32) -> Result<EventSale, ServiceError>;
}

pub struct EventServiceImpl {
    repo: Arc<dyn EventRepository>,
    hosts: Arc<dyn HostRepository>,
    mailer: Arc<dyn Mailer>,
    broadcaster: Arc<Broadcaster>,
}

impl EventServiceImpl {
    pub fn new(
        repo: Arc<dyn EventRepository>,
        hosts: Arc<dyn HostRepository>,
        mailer: Arc<dyn Mailer>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repo,
            hosts,
            mailer,
            broadcaster,
        }
    }

    fn notify_host_of_approval(&self, event: &events::Model) {
        let hosts = self.hosts.clone();
        let mailer = self.mailer.clone();
        let event = event.clone();

        tokio::spawn(async move {
            let host = match hosts.find_by_id(event.host_id).await {
                Ok(Some(host)) => host,
                Ok(None) => {
                    tracing::warn!(event_id = event.id, "approved event has no host");
                    return;
                }
                Err(e) => {
                    tracing::error!(event_id = event.id, "failed to load host: {}", e);
                    return;
                }
            };

            if let Err(e) = mailer
                .send_event_approved(&host.email, &host.name, &event.title, event.event_date)
                .await
            {
                tracing::error!(event_id = event.id, "failed to send approval email: {}", e);
            }
        });
    }
}

fn not_found() -> ServiceError {
    ServiceError::new(404, "Event not found")
}

fn check_price(price: f64) -> Result<f64, ServiceError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ServiceError::new(400, "price must not be negative"));
    }
    Ok(price)
}

#[async_trait]
impl EventService for EventServiceImpl {
    async fn add_event(&self, input: CreateEvent) -> Result<events::Model, ServiceError> {
        if self.hosts.find_by_id(input.host_id).await?.is_none() {
            return Err(ServiceError::new(404, "Host not found"));
        }
        if input.total_seat < 1 {
            return Err(ServiceError::new(400, "total_seat must be at least 1"));
        }

        let event = self
            .repo
            .create(NewEvent {
                host_id: input.host_id,
                title: require_text_max(&input.title, "title", MAX_TITLE_LEN)?,
                banner_url: input.banner_url,
                location: require_text(&input.location, "location")?,
                description: input.description,
                event_date: input.event_date,
                event_time: input.event_time.trim().to_string(),
                price: check_price(input.price)?,
                total_seat: input.total_seat,
                category: require_text(&input.category, "category")?,
            })
            .await?;

        tracing::info!(event_id = event.id, host_id = event.host_id, "event submitted");
        self.broadcaster.publish(Channel::Events, "new_event", &event);
        Ok(event)
    }

    async fn list_events(&self) -> Result<Vec<events::Model>, ServiceError> {
        Ok(self.repo.list_by_status(ApprovalStatus::Approved).await?)
    }

    async fn list_pending(&self) -> Result<Vec<EventWithHost>, ServiceError> {
        let rows = self.repo.list_with_host(ApprovalStatus::Pending).await?;
        Ok(rows
            .into_iter()
            .map(|(event, host)| EventWithHost { event, host })
            .collect())
    }

    async fn get_event(&self, id: i32) -> Result<events::Model, ServiceError> {
        self.repo.find_by_id(id).await?.ok_or_else(not_found)
    }

    async fn approve_event(&self, id: i32) -> Result<events::Model, ServiceError> {
        let event = self
            .repo
            .set_status(id, ApprovalStatus::Approved)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(event_id = id, "event approved");
        self.broadcaster.publish(Channel::Events, "event_approved", &event);
        self.notify_host_of_approval(&event);
        Ok(event)
    }

    async fn reject_event(&self, id: i32) -> Result<events::Model, ServiceError> {
        let event = self
            .repo
            .set_status(id, ApprovalStatus::Rejected)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(event_id = id, "event rejected");
        Ok(event)
    }

    async fn approve_existing(&self) -> Result<u64, ServiceError> {
        let changed = self
            .repo
            .set_status_all(ApprovalStatus::Pending, ApprovalStatus::Approved)
            .await?;
        tracing::info!(changed, "approved pending events");
        Ok(changed)
    }

    async fn search_event(&self, value: &str) -> Result<events::Model, ServiceError> {
        let value = value.trim();
        let numeric = value.parse::<i32>().ok();

        if let Some(id) = numeric {
            if let Some(event) = self.repo.find_by_id(id).await? {
                return Ok(event);
            }
        }

        let mut lookups = vec![
            EventLookup::Title(value.to_string()),
            EventLookup::Location(value.to_string()),
        ];
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            lookups.push(EventLookup::Date(date));
        }
        if let Some(host_id) = numeric {
            lookups.push(EventLookup::HostId(host_id));
        }

        for lookup in lookups {
            if let Some(event) = self.repo.find_first(lookup).await? {
                return Ok(event);
            }
        }
        Err(not_found())
    }

    async fn filter_events(&self, keyword: &str) -> Result<Vec<events::Model>, ServiceError> {
        if keyword.trim().is_empty() {
            return Err(ServiceError::new(400, "keyword is required"));
        }
        Ok(self.repo.search_keyword(keyword).await?)
    }

    async fn update_event(
        &self,
        id: i32,
        patch: EventPatch,
    ) -> Result<events::Model, ServiceError> {
        let event = self.get_event(id).await?;
        if patch.is_empty() {
            return Err(ServiceError::new(400, "Nothing to update"));
        }

        if matches!(patch.total_seat, Some(total_seat) if total_seat < 1) {
            return Err(ServiceError::new(400, "total_seat must be at least 1"));
        }

        let mut active = event.into_active_model();
        if let Some(title) = patch.title {
            active.title = Set(require_text_max(&title, "title", MAX_TITLE_LEN)?);
        }
        if let Some(banner_url) = patch.banner_url {
            active.banner_url = Set(Some(banner_url));
        }
        if let Some(location) = patch.location {
            active.location = Set(require_text(&location, "location")?);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(event_date) = patch.event_date {
            active.event_date = Set(event_date);
        }
        if let Some(event_time) = patch.event_time {
            active.event_time = Set(event_time);
        }
        if let Some(price) = patch.price {
            active.price = Set(check_price(price)?);
        }
        if let Some(category) = patch.category {
            active.category = Set(require_text(&category, "category")?);
        }

        // Capacity is checked against filled_seat in the same statement so a
        // booking landing in between cannot leave the event oversold.
        if let Some(total_seat) = patch.total_seat {
            if !self.repo.resize(id, total_seat).await? {
                let filled = self.get_event(id).await?.filled_seat;
                return Err(ServiceError::new(
                    400,
                    format!("total_seat must be at least {}", filled.max(1)),
                ));
            }
        }

        if active.is_changed() {
            Ok(self.repo.update(active).await?)
        } else {
            self.get_event(id).await
        }
    }

    async fn delete_event(&self, id: i32) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? == 0 {
            return Err(not_found());
        }
        tracing::info!(event_id = id, "event deleted");
        Ok(())
    }

    async fn upcoming_events(&self) -> Result<Vec<events::Model>, ServiceError> {
        Ok(self.repo.list_upcoming(today()).await?)
    }

    async fn archived_events(&self) -> Result<Vec<events::Model>, ServiceError> {
        Ok(self.repo.list_archived(today()).await?)
    }

    async fn events_by_host(&self, host_id: i32) -> Result<Vec<events::Model>, ServiceError> {
        let events = self.repo.list_by_host(host_id).await?;
        if events.is_empty() {
            return Err(ServiceError::new(404, "No events found for this host"));
        }
        Ok(events)
    }

    async fn seat_availability(&self, id: i32) -> Result<SeatAvailability, ServiceError> {
        let event = self.get_event(id).await?;
        Ok(SeatAvailability {
            total_seat: event.total_seat,
            filled_seat: event.filled_seat,
        })
    }

    async fn target_earning(&self, id: i32) -> Result<TargetEarning, ServiceError> {
        let event = self.get_event(id).await?;
        Ok(TargetEarning {
            target: event.price * f64::from(event.total_seat),
        })
    }

    async fn total_sale(&self, id: i32) -> Result<EventSale, ServiceError> {
        let event = self.get_event(id).await?;
        Ok(EventSale {
            sale: event.price * f64::from(event.filled_seat),
        })
    }
}
