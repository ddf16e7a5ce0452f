use chrono::{DateTime, Utc};
use rand::Rng;

pub const BOOKING_PREFIX: &str = "BK";
pub const BOOKING_SUFFIX_LENGTH: usize = 6;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Human-readable booking code, e.g. `BK-20250314-7KQ2ZD`.
pub fn generate_booking_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..BOOKING_SUFFIX_LENGTH)
        .map(|_| char::from(SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())]))
        .collect();

    format!("{}-{}-{}", BOOKING_PREFIX, now.format("%Y%m%d"), suffix)
}
