use crate::entities::{hosts, prelude::*};
use sea_orm::*;
use std::sync::Arc;

pub struct NewHost {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub division: String,
    pub district: String,
    pub upazila_thana: String,
    pub address: String,
    pub image_url: Option<String>,
}

#[async_trait::async_trait]
pub trait HostRepository: Send + Sync {
    async fn create(&self, host: NewHost) -> Result<hosts::Model, DbErr>;

    async fn list(&self) -> Result<Vec<hosts::Model>, DbErr>;

    async fn find_by_id(&self, id: i32) -> Result<Option<hosts::Model>, DbErr>;

    async fn find_by_email(&self, email: &str) -> Result<Option<hosts::Model>, DbErr>;

    async fn find_by_name(&self, name: &str) -> Result<Option<hosts::Model>, DbErr>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<hosts::Model>, DbErr>;

    async fn update(&self, host: hosts::ActiveModel) -> Result<hosts::Model, DbErr>;

    async fn mark_verified(&self, id: i32) -> Result<(), DbErr>;

    async fn delete_by_email(&self, email: &str) -> Result<u64, DbErr>;
}

pub struct HostRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl HostRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl HostRepository for HostRepositoryImpl {
    async fn create(&self, host: NewHost) -> Result<hosts::Model, DbErr> {
        hosts::ActiveModel {
            name: Set(host.name),
            email: Set(host.email),
            password_hash: Set(host.password_hash),
            phone_number: Set(host.phone_number),
            division: Set(host.division),
            district: Set(host.district),
            upazila_thana: Set(host.upazila_thana),
            address: Set(host.address),
            image_url: Set(host.image_url),
            verification: Set(hosts::HostVerification::Unverified),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    async fn list(&self) -> Result<Vec<hosts::Model>, DbErr> {
        Hosts::find()
            .order_by_asc(hosts::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<hosts::Model>, DbErr> {
        Hosts::find_by_id(id).one(self.db.as_ref()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<hosts::Model>, DbErr> {
        Hosts::find()
            .filter(hosts::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<hosts::Model>, DbErr> {
        Hosts::find()
            .filter(hosts::Column::Name.eq(name))
            .order_by_asc(hosts::Column::Id)
            .one(self.db.as_ref())
            .await
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<hosts::Model>, DbErr> {
        Hosts::find()
            .filter(hosts::Column::PhoneNumber.eq(phone_number))
            .order_by_asc(hosts::Column::Id)
            .one(self.db.as_ref())
            .await
    }

    async fn update(&self, host: hosts::ActiveModel) -> Result<hosts::Model, DbErr> {
        host.update(self.db.as_ref()).await
    }

    async fn mark_verified(&self, id: i32) -> Result<(), DbErr> {
        let result = Hosts::update_many()
            .set(hosts::ActiveModel {
                verification: Set(hosts::HostVerification::Verified),
                ..Default::default()
            })
            .filter(hosts::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("host id {} not found", id)));
        }

        Ok(())
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, DbErr> {
        let result = Hosts::delete_many()
            .filter(hosts::Column::Email.eq(email))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
