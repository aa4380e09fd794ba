pub mod broadcast;
pub mod mailer;
pub mod qr;
