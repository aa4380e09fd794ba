pub mod analytics;
pub mod bookings;
pub mod events;
pub mod hosts;
pub mod otp;
pub mod tickets;
pub mod users;

use sea_orm::{DbErr, SqlErr};

#[derive(Debug)]
pub struct ServiceError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        Self::new(500, format!("Database error: {}", err))
    }
}

/// Free text that ends up inside a ticket QR code is capped so every payload
/// stays within QR capacity.
pub(crate) const MAX_EMAIL_LEN: usize = 254;
pub(crate) const MAX_NAME_LEN: usize = 100;
pub(crate) const MAX_TITLE_LEN: usize = 120;

/// Trimmed, lower-cased and minimally shaped like an address.
pub(crate) fn normalize_email(raw: &str) -> Result<String, ServiceError> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN {
        return Err(ServiceError::new(
            400,
            format!("email must be at most {} characters", MAX_EMAIL_LEN),
        ));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ServiceError::new(400, "A valid email is required")),
    }
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::new(400, format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require_text_max(
    value: &str,
    field: &str,
    max: usize,
) -> Result<String, ServiceError> {
    let text = require_text(value, field)?;
    if text.chars().count() > max {
        return Err(ServiceError::new(
            400,
            format!("{} must be at most {} characters", field, max),
        ));
    }
    Ok(text)
}

/// Maps a unique-index violation to 409, everything else to the usual 500.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::new(409, message),
        _ => err.into(),
    }
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

pub(crate) const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn hash_new_password(password: &str) -> Result<String, ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::new(
            400,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    crate::domain::password::hash_password(password)
        .map_err(|e| ServiceError::new(500, format!("Failed to hash password: {}", e)))
}
