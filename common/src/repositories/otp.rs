use crate::entities::otp_records::{OtpPurpose, OwnerType};
use crate::entities::{otp_records, prelude::*};
use chrono::NaiveDateTime;
use sea_orm::*;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait OtpRepository: Send + Sync {
    async fn find(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
    ) -> Result<Option<otp_records::Model>, DbErr>;

    /// Inserts the record or overwrites code and expiry of the existing one.
    async fn save(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
        otp: &str,
        expires_at: NaiveDateTime,
    ) -> Result<otp_records::Model, DbErr>;

    async fn delete(&self, id: i32) -> Result<(), DbErr>;
}

pub struct OtpRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl OtpRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl OtpRepository for OtpRepositoryImpl {
    async fn find(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
    ) -> Result<Option<otp_records::Model>, DbErr> {
        OtpRecords::find()
            .filter(otp_records::Column::OwnerId.eq(owner_id))
            .filter(otp_records::Column::OwnerType.eq(owner_type))
            .filter(otp_records::Column::Purpose.eq(purpose))
            .order_by_desc(otp_records::Column::Id)
            .one(self.db.as_ref())
            .await
    }

    async fn save(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
        otp: &str,
        expires_at: NaiveDateTime,
    ) -> Result<otp_records::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();

        if let Some(existing) = self.find(owner_id, owner_type, purpose).await? {
            let mut active: otp_records::ActiveModel = existing.into();
            active.otp = Set(otp.to_string());
            active.expires_at = Set(expires_at);
            active.created_at = Set(now);
            return active.update(self.db.as_ref()).await;
        }

        otp_records::ActiveModel {
            owner_id: Set(owner_id),
            owner_type: Set(owner_type),
            purpose: Set(purpose),
            otp: Set(otp.to_string()),
            expires_at: Set(expires_at),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    async fn delete(&self, id: i32) -> Result<(), DbErr> {
        OtpRecords::delete_by_id(id).exec(self.db.as_ref()).await?;
        Ok(())
    }
}
