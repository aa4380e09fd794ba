pub mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, MailSettings, OtpSettings, RealtimeSettings, Settings,
};
