use super::ServiceError;
use crate::domain::analytics::{
    self, DailyParticipants, DailySales, DaySales, MonthlySales, SalesTotals,
};
use crate::repositories::participants::{ParticipantRepository, SalesScope};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AnalyticsService: Send + Sync {
    async fn daily_sales(&self, scope: SalesScope) -> Result<Vec<DailySales>, ServiceError>;

    async fn daily_participants(
        &self,
        event_id: i32,
    ) -> Result<Vec<DailyParticipants>, ServiceError>;

    async fn monthly_sales(&self, scope: SalesScope) -> Result<Vec<MonthlySales>, ServiceError>;

    async fn totals(&self, scope: SalesScope) -> Result<SalesTotals, ServiceError>;
}

pub struct AnalyticsServiceImpl {
    participants: Arc<dyn ParticipantRepository>,
}

fn check_scope(scope: &SalesScope) -> Result<(), ServiceError> {
    match scope {
        SalesScope::Category(category) if category.trim().is_empty() => {
            Err(ServiceError::new(400, "category is required"))
        }
        _ => Ok(()),
    }
}

impl AnalyticsServiceImpl {
    pub fn new(participants: Arc<dyn ParticipantRepository>) -> Self {
        Self { participants }
    }

    async fn days(&self, scope: SalesScope) -> Result<Vec<DaySales>, ServiceError> {
        check_scope(&scope)?;
        Ok(self.participants.sales_by_day(scope).await?)
    }
}

#[async_trait]
impl AnalyticsService for AnalyticsServiceImpl {
    async fn daily_sales(&self, scope: SalesScope) -> Result<Vec<DailySales>, ServiceError> {
        Ok(analytics::daily_sales(&self.days(scope).await?))
    }

    async fn daily_participants(
        &self,
        event_id: i32,
    ) -> Result<Vec<DailyParticipants>, ServiceError> {
        let days = self.days(SalesScope::Event(event_id)).await?;
        Ok(analytics::daily_participants(&days))
    }

    async fn monthly_sales(&self, scope: SalesScope) -> Result<Vec<MonthlySales>, ServiceError> {
        Ok(analytics::monthly_sales(&self.days(scope).await?))
    }

    async fn totals(&self, scope: SalesScope) -> Result<SalesTotals, ServiceError> {
        check_scope(&scope)?;
        Ok(self.participants.sales_totals(scope).await?)
    }
}
