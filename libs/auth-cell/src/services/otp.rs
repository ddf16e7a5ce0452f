use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const OTP_LENGTH: usize = 4;

pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn otp_expiry(now: DateTime<Utc>, ttl_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(ttl_minutes)
}

/// A code is accepted only while it is stored, unexpired and equal to `candidate`.
pub fn otp_matches(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    candidate: &str,
    now: DateTime<Utc>,
) -> bool {
    match (stored, expires_at) {
        (Some(code), Some(expiry)) => expiry > now && code == candidate.trim(),
        _ => false,
    }
}
