//! One-time-passcode policy: code generation, keyed hashing, and the pure
//! decision rules for TTL, attempt, and resend limits.
//!
//! Codes are never stored or compared in plaintext. The stored value is an
//! HMAC-SHA256 digest keyed by a server secret and bound to the owning
//! `(user, channel)` pair, and comparison goes through [`Mac::verify_slice`]
//! so it runs in constant time.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

type HmacSha256 = Hmac<Sha256>;

/// Delivery channel an OTP challenge is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sms,
    Email,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            other => Err(CoreError::Validation(format!(
                "Unknown OTP channel: {other}"
            ))),
        }
    }
}

/// Tunable OTP limits. Defaults match production values; tests inject
/// tighter ones.
#[derive(Debug, Clone)]
pub struct OtpPolicy {
    pub code_length: usize,
    pub ttl_secs: i64,
    pub max_attempts: i32,
    pub resend_cooldown_secs: i64,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl_secs: 300,
            max_attempts: 5,
            resend_cooldown_secs: 60,
        }
    }
}

/// Generate a random numeric code of the given length.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// HMAC-SHA256 digest of a code, keyed by the server secret and bound to the
/// owning user and channel so a digest can never be replayed across
/// challenges. Returned as lowercase hex.
pub fn hash_code(secret: &str, user_id: DbId, channel: Channel, code: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(user_id.to_le_bytes().as_slice());
    mac.update(channel.as_str().as_bytes());
    mac.update(code.as_bytes());
    let bytes = mac.finalize().into_bytes();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Constant-time comparison of a submitted code against a stored digest.
pub fn verify_code(
    secret: &str,
    user_id: DbId,
    channel: Channel,
    code: &str,
    stored_hex: &str,
) -> bool {
    let Some(expected) = decode_hex(stored_hex) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(user_id.to_le_bytes().as_slice());
    mac.update(channel.as_str().as_bytes());
    mac.update(code.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Whether a challenge's TTL has elapsed at `now`.
pub fn is_expired(expires_at: Timestamp, now: Timestamp) -> bool {
    now > expires_at
}

/// Seconds the caller must still wait before a re-issue, if any.
pub fn resend_wait_remaining(
    last_issued_at: Timestamp,
    now: Timestamp,
    policy: &OtpPolicy,
) -> Option<i64> {
    let elapsed = (now - last_issued_at).num_seconds();
    let remaining = policy.resend_cooldown_secs - elapsed;
    (remaining > 0).then_some(remaining)
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 6, 8, 0, 0).unwrap()
    }

    #[test]
    fn generated_codes_are_numeric_and_sized() {
        for _ in 0..50 {
            let code = generate_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn hash_round_trip_verifies() {
        let hash = hash_code("secret", 7, Channel::Sms, "482910");
        assert!(verify_code("secret", 7, Channel::Sms, "482910", &hash));
        assert!(!verify_code("secret", 7, Channel::Sms, "482911", &hash));
    }

    #[test]
    fn digest_is_bound_to_user_and_channel() {
        let hash = hash_code("secret", 7, Channel::Sms, "482910");
        assert!(!verify_code("secret", 8, Channel::Sms, "482910", &hash));
        assert!(!verify_code("secret", 7, Channel::Email, "482910", &hash));
        assert!(!verify_code("other", 7, Channel::Sms, "482910", &hash));
    }

    #[test]
    fn corrupt_stored_digest_never_verifies() {
        assert!(!verify_code("secret", 7, Channel::Sms, "482910", "zz-not-hex"));
        assert!(!verify_code("secret", 7, Channel::Sms, "482910", "abc"));
    }

    #[test]
    fn ttl_boundary() {
        let policy = OtpPolicy::default();
        let expires = t0() + Duration::seconds(policy.ttl_secs);
        // Valid one second before expiry, expired one second after.
        assert!(!is_expired(expires, t0() + Duration::seconds(299)));
        assert!(!is_expired(expires, expires));
        assert!(is_expired(expires, t0() + Duration::seconds(301)));
    }

    #[test]
    fn resend_cooldown_window() {
        let policy = OtpPolicy::default();
        assert_eq!(
            resend_wait_remaining(t0(), t0() + Duration::seconds(10), &policy),
            Some(50)
        );
        assert_eq!(
            resend_wait_remaining(t0(), t0() + Duration::seconds(60), &policy),
            None
        );
        assert_eq!(
            resend_wait_remaining(t0(), t0() + Duration::seconds(600), &policy),
            None
        );
    }

    #[test]
    fn channel_string_round_trip() {
        assert_eq!(Channel::parse("sms").unwrap(), Channel::Sms);
        assert_eq!(Channel::parse("email").unwrap(), Channel::Email);
        assert!(Channel::parse("carrier-pigeon").is_err());
    }
}
