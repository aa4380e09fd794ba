pub mod analytics;
pub mod otp;
pub mod password;
pub mod ticket_payload;
