use crate::entities::{prelude::*, users};
use sea_orm::*;
use std::sync::Arc;

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub image_url: Option<String>,
}

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<users::Model, DbErr>;

    async fn list(&self) -> Result<Vec<users::Model>, DbErr>;

    async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr>;

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr>;

    async fn find_by_name(&self, name: &str) -> Result<Option<users::Model>, DbErr>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<users::Model>, DbErr>;

    async fn update(&self, user: users::ActiveModel) -> Result<users::Model, DbErr>;

    async fn delete_by_email(&self, email: &str) -> Result<u64, DbErr>;
}

pub struct UserRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl UserRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, user: NewUser) -> Result<users::Model, DbErr> {
        users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            phone_number: Set(user.phone_number),
            image_url: Set(user.image_url),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    async fn list(&self) -> Result<Vec<users::Model>, DbErr> {
        Users::find()
            .order_by_asc(users::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr> {
        Users::find_by_id(id).one(self.db.as_ref()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::Name.eq(name))
            .order_by_asc(users::Column::Id)
            .one(self.db.as_ref())
            .await
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<users::Model>, DbErr> {
        Users::find()
            .filter(users::Column::PhoneNumber.eq(phone_number))
            .order_by_asc(users::Column::Id)
            .one(self.db.as_ref())
            .await
    }

    async fn update(&self, user: users::ActiveModel) -> Result<users::Model, DbErr> {
        user.update(self.db.as_ref()).await
    }

    async fn delete_by_email(&self, email: &str) -> Result<u64, DbErr> {
        let result = Users::delete_many()
            .filter(users::Column::Email.eq(email))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
