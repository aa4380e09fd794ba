use chrono::{Duration, NaiveDateTime};
use rand::Rng;

pub const OTP_LENGTH: usize = 6;

pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", code, width = OTP_LENGTH)
}

pub fn expiry_from(now: NaiveDateTime, ttl_seconds: i64) -> NaiveDateTime {
    now + Duration::seconds(ttl_seconds)
}

pub fn is_expired(expires_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    now >= expires_at
}
