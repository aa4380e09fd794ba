use super::{
    conflict_on_unique, hash_new_password, normalize_email, require_text, require_text_max,
    ServiceError, MAX_NAME_LEN,
};
use crate::domain::password::verify_password;
use crate::entities::hosts::{self, HostVerification};
use crate::entities::otp_records::{OtpPurpose, OwnerType};
use crate::infra::broadcast::{Broadcaster, Channel};
use crate::infra::mailer::Mailer;
use crate::repositories::hosts::{HostRepository, NewHost};
use crate::services::otp::OtpService;
use async_trait::async_trait;
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterHost {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub division: String,
    pub district: String,
    pub upazila_thana: String,
    pub address: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub division: Option<String>,
    pub district: Option<String>,
    pub upazila_thana: Option<String>,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub password: Option<String>,
}

impl HostPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_number.is_none()
            && self.division.is_none()
            && self.district.is_none()
            && self.upazila_thana.is_none()
            && self.address.is_none()
            && self.image_url.is_none()
            && self.password.is_none()
    }
}

#[async_trait]
pub trait HostService: Send + Sync {
    /// Registers an unverified host and mails a verification code.
    async fn add_host(&self, input: RegisterHost) -> Result<hosts::Model, ServiceError>;

    async fn list_hosts(&self) -> Result<Vec<hosts::Model>, ServiceError>;

    async fn search_host(&self, value: &str) -> Result<hosts::Model, ServiceError>;

    async fn update_host(&self, email: &str, patch: HostPatch)
        -> Result<hosts::Model, ServiceError>;

    async fn delete_host(&self, email: &str) -> Result<(), ServiceError>;

    async fn verify_host(&self, email: &str, otp: &str) -> Result<hosts::Model, ServiceError>;

    async fn resend_verification(&self, email: &str) -> Result<(), ServiceError>;

    async fn login(&self, email: &str, password: &str) -> Result<hosts::Model, ServiceError>;

    async fn change_password(
        &self,
        host_id: i32,
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

pub struct HostServiceImpl {
    repo: Arc<dyn HostRepository>,
    otp: Arc<dyn OtpService>,
    mailer: Arc<dyn Mailer>,
    broadcaster: Arc<Broadcaster>,
}

impl HostServiceImpl {
    pub fn new(
        repo: Arc<dyn HostRepository>,
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

    async fn require_by_email(&self, email: &str) -> Result<hosts::Model, ServiceError> {
        let email = normalize_email(email)?;
        self.repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::new(404, "Host not found"))
    }

    async fn send_code(&self, host: &hosts::Model, purpose: OtpPurpose) -> Result<(), ServiceError> {
        let otp = self.otp.issue(host.id, OwnerType::Host, purpose).await?;
        self.mailer
            .send_otp(&host.email, &host.name, &otp, purpose)
            .await
            .map_err(|e| {
                tracing::error!(host_id = host.id, ?purpose, "failed to send otp: {}", e);
                ServiceError::new(500, "Failed to send OTP email")
            })
    }
}

#[async_trait]
impl HostService for HostServiceImpl {
    async fn add_host(&self, input: RegisterHost) -> Result<hosts::Model, ServiceError> {
        let email = normalize_email(&input.email)?;
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::new(409, "Email already registered"));
        }

        let host = self
            .repo
            .create(NewHost {
                name: require_text_max(&input.name, "name", MAX_NAME_LEN)?,
                email,
                password_hash: hash_new_password(&input.password)?,
                phone_number: require_text(&input.phone_number, "phone_number")?,
                division: input.division.trim().to_string(),
                district: input.district.trim().to_string(),
                upazila_thana: input.upazila_thana.trim().to_string(),
                address: input.address.trim().to_string(),
                image_url: input.image_url,
            })
            .await
            .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

        tracing::info!(host_id = host.id, "host registered");
        self.broadcaster.publish(Channel::Hosts, "new_host", &host);

        // Registration stands even if the code cannot be mailed; it can be resent.
        if let Err(e) = self.send_code(&host, OtpPurpose::Verification).await {
            tracing::warn!(host_id = host.id, "verification code not delivered: {}", e);
        }

        Ok(host)
    }

    async fn list_hosts(&self) -> Result<Vec<hosts::Model>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    async fn search_host(&self, value: &str) -> Result<hosts::Model, ServiceError> {
        let value = value.trim();

        if let Ok(id) = value.parse::<i32>() {
            if let Some(host) = self.repo.find_by_id(id).await? {
                return Ok(host);
            }
        }
        if let Some(host) = self.repo.find_by_email(&value.to_lowercase()).await? {
            return Ok(host);
        }
        if let Some(host) = self.repo.find_by_name(value).await? {
            return Ok(host);
        }
        self.repo
            .find_by_phone(value)
            .await?
            .ok_or_else(|| ServiceError::new(404, "Host not found"))
    }

    async fn update_host(
        &self,
        email: &str,
        patch: HostPatch,
    ) -> Result<hosts::Model, ServiceError> {
        let host = self.require_by_email(email).await?;

        if let Some(requested) = patch.email.as_deref() {
            if normalize_email(requested)? != host.email {
                return Err(ServiceError::new(400, "Changing email is not allowed"));
            }
        }
        if patch.is_empty() {
            return Err(ServiceError::new(400, "Nothing to update"));
        }

        let mut active = host.into_active_model();
        if let Some(name) = patch.name {
            active.name = Set(require_text_max(&name, "name", MAX_NAME_LEN)?);
        }
        if let Some(phone_number) = patch.phone_number {
            active.phone_number = Set(require_text(&phone_number, "phone_number")?);
        }
        if let Some(division) = patch.division {
            active.division = Set(division);
        }
        if let Some(district) = patch.district {
            active.district = Set(district);
        }
        if let Some(upazila_thana) = patch.upazila_thana {
            active.upazila_thana = Set(upazila_thana);
        }
        if let Some(address) = patch.address {
            active.address = Set(address);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(password) = patch.password {
            active.password_hash = Set(hash_new_password(&password)?);
        }

        Ok(self.repo.update(active).await?)
    }

    async fn delete_host(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)?;
        if self.repo.delete_by_email(&email).await? == 0 {
            return Err(ServiceError::new(404, "Host not found"));
        }
        Ok(())
    }

    async fn verify_host(&self, email: &str, otp: &str) -> Result<hosts::Model, ServiceError> {
        let host = self.require_by_email(email).await?;
        if host.verification == HostVerification::Verified {
            return Ok(host);
        }

        let record = self
            .otp
            .check(host.id, OwnerType::Host, OtpPurpose::Verification, otp)
            .await?;
        self.repo.mark_verified(host.id).await?;
        self.otp.consume(&record).await?;

        tracing::info!(host_id = host.id, "host verified");
        self.repo
            .find_by_id(host.id)
            .await?
            .ok_or_else(|| ServiceError::new(404, "Host not found"))
    }

    async fn resend_verification(&self, email: &str) -> Result<(), ServiceError> {
        let host = self.require_by_email(email).await?;
        if host.verification == HostVerification::Verified {
            return Err(ServiceError::new(400, "Host is already verified"));
        }
        self.send_code(&host, OtpPurpose::Verification).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<hosts::Model, ServiceError> {
        let host = self
            .require_by_email(email)
            .await
            .map_err(|e| match e.code {
                404 => ServiceError::new(404, "Email not found"),
                _ => e,
            })?;

        if !verify_password(password, &host.password_hash) {
            return Err(ServiceError::new(401, "Wrong password"));
        }
        if host.verification != HostVerification::Verified {
            return Err(ServiceError::new(403, "Host email is not verified"));
        }
        Ok(host)
    }

    async fn change_password(
        &self,
        host_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let host = self
            .repo
            .find_by_id(host_id)
            .await?
            .ok_or_else(|| ServiceError::new(404, "Host not found"))?;

        if !verify_password(current_password, &host.password_hash) {
            return Err(ServiceError::new(401, "Current password is incorrect"));
        }

        let mut active = host.into_active_model();
        active.password_hash = Set(hash_new_password(new_password)?);
        self.repo.update(active).await?;
        Ok(())
    }

    async fn send_reset_otp(&self, email: &str) -> Result<(), ServiceError> {
        let host = self.require_by_email(email).await?;
        self.send_code(&host, OtpPurpose::PasswordReset).await
    }

    async fn verify_reset_otp(&self, email: &str, otp: &str) -> Result<(), ServiceError> {
        let host = self.require_by_email(email).await?;
        self.otp
            .check(host.id, OwnerType::Host, OtpPurpose::PasswordReset, otp)
            .await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let host = self.require_by_email(email).await?;
        let record = self
            .otp
            .check(host.id, OwnerType::Host, OtpPurpose::PasswordReset, otp)
            .await?;

        let mut active = host.into_active_model();
        active.password_hash = Set(hash_new_password(new_password)?);
        self.repo.update(active).await?;
        self.otp.consume(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mailer::{MailError, MockMailer};
    use crate::persistence::db::memory_db;
    use crate::repositories::hosts::HostRepositoryImpl;
    use crate::repositories::otp::OtpRepositoryImpl;
    use crate::services::otp::OtpServiceImpl;
    use std::sync::Mutex;

    async fn service_with(mailer: MockMailer) -> HostServiceImpl {
        let db = Arc::new(memory_db().await);
        let otp = Arc::new(OtpServiceImpl::new(
            Arc::new(OtpRepositoryImpl::new(db.clone())),
            300,
        ));
        HostServiceImpl::new(
            Arc::new(HostRepositoryImpl::new(db)),
            otp,
            Arc::new(mailer),
            Arc::new(Broadcaster::new(16)),
        )
    }

    fn register(email: &str) -> RegisterHost {
        RegisterHost {
            name: "Dhaka Events Ltd".to_string(),
            email: email.to_string(),
            password: "host-secret".to_string(),
            phone_number: "01800000000".to_string(),
            division: "Dhaka".to_string(),
            district: "Dhaka".to_string(),
            upazila_thana: "Gulshan".to_string(),
            address: "Road 11".to_string(),
            image_url: None,
        }
    }

    fn capturing_mailer(codes: Arc<Mutex<Vec<(OtpPurpose, String)>>>) -> MockMailer {
        let mut mailer = MockMailer::new();
        mailer.expect_send_otp().returning(move |_, _, otp, purpose| {
            codes.lock().unwrap().push((purpose, otp.to_string()));
            Ok(())
        });
        mailer
    }

    #[tokio::test]
    async fn verification_unlocks_login() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(capturing_mailer(codes.clone())).await;

        let host = service.add_host(register("Host@Example.com")).await.unwrap();
        assert_eq!(host.email, "host@example.com");
        assert_eq!(host.verification, HostVerification::Unverified);

        assert_eq!(
            service
                .login("host@example.com", "host-secret")
                .await
                .unwrap_err()
                .code,
            403
        );

        let (purpose, otp) = codes.lock().unwrap()[0].clone();
        assert_eq!(purpose, OtpPurpose::Verification);

        let verified = service.verify_host("host@example.com", &otp).await.unwrap();
        assert_eq!(verified.verification, HostVerification::Verified);
        assert!(service.login("host@example.com", "host-secret").await.is_ok());

        assert_eq!(
            service
                .resend_verification("host@example.com")
                .await
                .unwrap_err()
                .code,
            400
        );
    }

    #[tokio::test]
    async fn registration_survives_mail_failure() {
        let mut mailer = MockMailer::new();
        mailer.expect_send_otp().returning(|_, _, _, _| {
            Err(MailError::ContentType("smtp unavailable".to_string()))
        });
        let service = service_with(mailer).await;

        assert!(service.add_host(register("h@example.com")).await.is_ok());
        assert_eq!(
            service
                .resend_verification("h@example.com")
                .await
                .unwrap_err()
                .code,
            500
        );
    }

    #[tokio::test]
    async fn wrong_verification_code_is_rejected() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(capturing_mailer(codes.clone())).await;
        service.add_host(register("h@example.com")).await.unwrap();

        let otp = codes.lock().unwrap()[0].1.clone();
        let wrong = if otp == "000000" { "111111" } else { "000000" };
        assert_eq!(
            service
                .verify_host("h@example.com", wrong)
                .await
                .unwrap_err()
                .code,
            400
        );
    }

    #[tokio::test]
    async fn update_host_keeps_email_fixed() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(capturing_mailer(codes)).await;
        service.add_host(register("h@example.com")).await.unwrap();

        let updated = service
            .update_host(
                "h@example.com",
                HostPatch {
                    address: Some("Road 27".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.address, "Road 27");

        let err = service
            .update_host(
                "h@example.com",
                HostPatch {
                    email: Some("new@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, 400);
    }

    #[tokio::test]
    async fn host_password_reset_uses_reset_purpose() {
        let codes = Arc::new(Mutex::new(Vec::new()));
        let service = service_with(capturing_mailer(codes.clone())).await;
        service.add_host(register("h@example.com")).await.unwrap();

        service.send_reset_otp("h@example.com").await.unwrap();
        let (purpose, otp) = codes.lock().unwrap()[1].clone();
        assert_eq!(purpose, OtpPurpose::PasswordReset);

        service
            .reset_password("h@example.com", &otp, "new-host-pass")
            .await
            .unwrap();
        assert_eq!(
            service
                .verify_reset_otp("h@example.com", &otp)
                .await
                .unwrap_err()
                .code,
            404
        );
    }
}
