use super::{
    conflict_on_unique, hash_new_password, normalize_email, require_text, require_text_max,
    ServiceError, MAX_NAME_LEN,
};
use crate::domain::password::verify_password;
use crate::entities::otp_records::{OtpPurpose, OwnerType};
use crate::entities::users;
use crate::infra::broadcast::{Broadcaster, Channel};
use crate::infra::mailer::Mailer;
use crate::repositories::users::{NewUser, UserRepository};
use crate::services::otp::OtpService;
use async_trait::async_trait;
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Partial profile update. `email` is only accepted when unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub image_url: Option<String>,
    pub password: Option<String>,
}

impl UserPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_number.is_none()
            && self.image_url.is_none()
            && self.password.is_none()
    }
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn add_user(&self, input: RegisterUser) -> Result<users::Model, ServiceError>;

    async fn list_users(&self) -> Result<Vec<users::Model>, ServiceError>;

    /// Matches id, then email, name and phone number.
    async fn search_user(&self, value: &str) -> Result<users::Model, ServiceError>;

    async fn update_user(&self, email: &str, patch: UserPatch)
        -> Result<users::Model, ServiceError>;

    async fn delete_user(&self, email: &str) -> Result<(), ServiceError>;

    async fn login(&self, email: &str, password: &str) -> Result<users::Model, ServiceError>;

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError>;

    async fn send_reset_otp(&self, email: &str) -> Result<(), ServiceError>;

    async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<(), ServiceError>;

    async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), ServiceError>;
}

pub struct UserServiceImpl {
    repo: Arc<dyn UserRepository>,
    otp: Arc<dyn OtpService>,
    mailer: Arc<dyn Mailer>,
    broadcaster: Arc<Broadcaster>,
}

impl UserServiceImpl {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        otp: Arc<dyn OtpService>,
        mailer: Arc<dyn Mailer>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repo,
            otp,
            mailer,
            broadcaster,
        }
    }

    async fn require_by_email(&self, email: &str) -> Result<users::Model, ServiceError> {
        let email = normalize_email(email)?;
        self.repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::new(404, "User not found"))
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn add_user(&self, input: RegisterUser) -> Result<users::Model, ServiceError> {
        let email = normalize_email(&input.email)?;
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::new(409, "Email already registered"));
        }

        let user = self
            .repo
            .create(NewUser {
                name: require_text_max(&input.name, "name", MAX_NAME_LEN)?,
                email,
                password_hash: hash_new_password(&input.password)?,
                phone_number: require_text(&input.phone_number, "phone_number")?,
                image_url: input.image_url,
            })
            .await
            .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

        tracing::info!(user_id = user.id, "user registered");
        self.broadcaster.publish(Channel::Users, "new_user", &user);
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<users::Model>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    async fn search_user(&self, value: &str) -> Result<users::Model, ServiceError> {
        let value = value.trim();

        if let Ok(id) = value.parse::<i32>() {
            if let Some(user) = self.repo.find_by_id(id).await? {
                return Ok(user);
            }
        }
        if let Some(user) = self.repo.find_by_email(&value.to_lowercase()).await? {
            return Ok(user);
        }
        if let Some(user) = self.repo.find_by_name(value).await? {
            return Ok(user);
        }
        self.repo
            .find_by_phone(value)
            .await?
            .ok_or_else(|| ServiceError::new(404, "User not found"))
    }

    async fn update_user(
        &self,
        email: &str,
        patch: UserPatch,
    ) -> Result<users::Model, ServiceError> {
        let user = self.require_by_email(email).await?;

        if let Some(requested) = patch.email.as_deref() {
            if normalize_email(requested)? != user.email {
                return Err(ServiceError::new(400, "Changing email is not allowed"));
            }
        }
        if patch.is_empty() {
            return Err(ServiceError::new(400, "Nothing to update"));
        }

        let mut active = user.into_active_model();
        if let Some(name) = patch.name {
            active.name = Set(require_text_max(&name, "name", MAX_NAME_LEN)?);
        }
        if let Some(phone_number) = patch.phone_number {
            active.phone_number = Set(require_text(&phone_number, "phone_number")?);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(password) = patch.password {
            active.password_hash = Set(hash_new_password(&password)?);
        }

        Ok(self.repo.update(active).await?)
    }

    async fn delete_user(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)?;
        if self.repo.delete_by_email(&email).await? == 0 {
            return Err(ServiceError::new(404, "User not found"));
        }
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<users::Model, ServiceError> {
        let user = self
            .require_by_email(email)
            .await
            .map_err(|e| match e.code {
                404 => ServiceError::new(404, "Email not found"),
                _ => e,
            })?;

        if !verify_password(password, &user.password_hash) {
            return Err(ServiceError::new(401, "Wrong password"));
        }
        Ok(user)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::new(404, "User not found"))?;

        if !verify_password(current_password, &user.password_hash) {
            return Err(ServiceError::new(401, "Current password is incorrect"));
        }

        let mut active = user.into_active_model();
        active.password_hash = Set(hash_new_password(new_password)?);
        self.repo.update(active).await?;
        Ok(())
    }

    async fn send_reset_otp(&self, email: &str) -> Result<(), ServiceError> {
        let user = self.require_by_email(email).await?;
        let otp = self
            .otp
            .issue(user.id, OwnerType::User, OtpPurpose::PasswordReset)
            .await?;

        self.mailer
            .send_otp(&user.email, &user.name, &otp, OtpPurpose::PasswordReset)
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, "failed to send reset otp: {}", e);
                ServiceError::new(500, "Failed to send OTP email")
            })
    }

    async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<(), ServiceError> {
        let user = self.require_by_email(email).await?;
        self.otp
            .check(user.id, OwnerType::User, OtpPurpose::PasswordReset, otp)
            .await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let user = self.require_by_email(email).await?;
        let record = self
            .otp
            .check(user.id, OwnerType::User, OtpPurpose::PasswordReset, otp)
            .await?;

        let mut active = user.into_active_model();
        active.password_hash = Set(hash_new_password(new_password)?);
        self.repo.update(active).await?;
        self.otp.consume(&record).await
    }
}
