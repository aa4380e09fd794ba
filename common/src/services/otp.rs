use super::ServiceError;
use crate::domain::otp::{expiry_from, generate_otp, is_expired};
use crate::entities::otp_records::{self, OtpPurpose, OwnerType};
use crate::repositories::otp::OtpRepository;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait OtpService: Send + Sync {
    /// Returns the still valid code for this owner and purpose, or stores a
    /// fresh one.
    async fn issue(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
    ) -> Result<String, ServiceError>;

    /// Validates without consuming. An expired record is removed.
    async fn check(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
        otp: &str,
    ) -> Result<otp_records::Model, ServiceError>;

    async fn consume(&self, record: &otp_records::Model) -> Result<(), ServiceError>;
}

pub struct OtpServiceImpl {
    repo: Arc<dyn OtpRepository>,
    ttl_seconds: i64,
}

impl OtpServiceImpl {
    pub fn new(repo: Arc<dyn OtpRepository>, ttl_seconds: i64) -> Self {
        Self { repo, ttl_seconds }
    }
}

#[async_trait]
impl OtpService for OtpServiceImpl {
    async fn issue(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
    ) -> Result<String, ServiceError> {
        let now = chrono::Utc::now().naive_utc();

        if let Some(existing) = self.repo.find(owner_id, owner_type, purpose).await? {
            if !is_expired(existing.expires_at, now) {
                return Ok(existing.otp);
            }
        }

        let otp = generate_otp();
        self.repo
            .save(
                owner_id,
                owner_type,
                purpose,
                &otp,
                expiry_from(now, self.ttl_seconds),
            )
            .await?;
        Ok(otp)
    }

    async fn check(
        &self,
        owner_id: i32,
        owner_type: OwnerType,
        purpose: OtpPurpose,
        otp: &str,
    ) -> Result<otp_records::Model, ServiceError> {
        let record = self
            .repo
            .find(owner_id, owner_type, purpose)
            .await?
            .ok_or_else(|| ServiceError::new(404, "OTP not found"))?;

        if record.otp != otp.trim() {
            return Err(ServiceError::new(400, "Invalid OTP"));
        }

        if is_expired(record.expires_at, chrono::Utc::now().naive_utc()) {
            self.repo.delete(record.id).await?;
            return Err(ServiceError::new(400, "OTP has expired"));
        }

        Ok(record)
    }

    async fn consume(&self, record: &otp_records::Model) -> Result<(), ServiceError> {
        self.repo.delete(record.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::db::memory_db;
    use crate::repositories::otp::OtpRepositoryImpl;

    async fn service(ttl_seconds: i64) -> (OtpServiceImpl, Arc<OtpRepositoryImpl>) {
        let repo = Arc::new(OtpRepositoryImpl::new(Arc::new(memory_db().await)));
        (OtpServiceImpl::new(repo.clone(), ttl_seconds), repo)
    }

    #[tokio::test]
    async fn issue_reuses_a_live_code() {
        let (service, _) = service(300).await;
        let first = service
            .issue(1, OwnerType::User, OtpPurpose::PasswordReset)
            .await
            .unwrap();
        let second = service
            .issue(1, OwnerType::User, OtpPurpose::PasswordReset)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 6);
    }

    #[tokio::test]
    async fn check_reports_missing_and_wrong_codes() {
        let (service, _) = service(300).await;
        let err = service
            .check(1, OwnerType::User, OtpPurpose::PasswordReset, "123456")
            .await
            .unwrap_err();
        assert_eq!(err.code, 404);

        let otp = service
            .issue(1, OwnerType::User, OtpPurpose::PasswordReset)
            .await
            .unwrap();
        let wrong = if otp == "000000" { "111111" } else { "000000" };
        let err = service
            .check(1, OwnerType::User, OtpPurpose::PasswordReset, wrong)
            .await
            .unwrap_err();
        assert_eq!(err.code, 400);

        let record = service
            .check(1, OwnerType::User, OtpPurpose::PasswordReset, &otp)
            .await
            .unwrap();
        // checking does not consume
        assert!(service
            .check(1, OwnerType::User, OtpPurpose::PasswordReset, &otp)
            .await
            .is_ok());

        service.consume(&record).await.unwrap();
        assert_eq!(
            service
                .check(1, OwnerType::User, OtpPurpose::PasswordReset, &otp)
                .await
                .unwrap_err()
                .code,
            404
        );
    }

    #[tokio::test]
    async fn expired_codes_are_rejected_and_removed() {
        let (service, repo) = service(300).await;
        let past = chrono::Utc::now().naive_utc() - chrono::Duration::seconds(1);
        repo.save(5, OwnerType::Host, OtpPurpose::Verification, "654321", past)
            .await
            .unwrap();

        let err = service
            .check(5, OwnerType::Host, OtpPurpose::Verification, "654321")
            .await
            .unwrap_err();
        assert_eq!(err.code, 400);
        assert!(repo
            .find(5, OwnerType::Host, OtpPurpose::Verification)
            .await
            .unwrap()
            .is_none());

        // an expired record is replaced on the next issue
        repo.save(5, OwnerType::Host, OtpPurpose::Verification, "654321", past)
            .await
            .unwrap();
        let fresh = service
            .issue(5, OwnerType::Host, OtpPurpose::Verification)
            .await
            .unwrap();
        let stored = repo
            .find(5, OwnerType::Host, OtpPurpose::Verification)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.otp, fresh);
        assert!(stored.expires_at > chrono::Utc::now().naive_utc());
    }
}
