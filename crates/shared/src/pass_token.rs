//! Signed door-pass tokens.
//!
//! A pass token binds `(registration_id, event_id, attendee_id)` so that a
//! door scanner can trust it without a database lookup:
//!
//! ```text
//! v1.<base64url(json payload)>.<hex(hmac_sha256(secret, "v1.<payload>"))>
//! ```
//!
//! The tag is checked before any other part of the token is interpreted, so
//! a token that was altered anywhere fails with
//! [`PassTokenError::SignatureMismatch`] rather than decoding to some other
//! triple.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Version prefix of the current token layout.
pub const TOKEN_VERSION: &str = "v1";

/// Tokens longer than this are rejected before any work is done.
pub const MAX_TOKEN_LEN: usize = 1024;

/// Minimum accepted length of the signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted pass lifetime, one leap year.
pub const MAX_TTL_SECS: i64 = 366 * 24 * 60 * 60;

const NONCE_BYTES: usize = 8;

/// Reasons a pass token fails verification.
///
/// All three currently produce the same HTTP response; they are kept apart
/// so logs can tell garbage, tampering and staleness from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassTokenError {
    #[error("Malformed pass token")]
    Malformed,

    #[error("Pass token signature mismatch")]
    SignatureMismatch,

    #[error("Pass token has expired")]
    Expired,
}

impl PassTokenError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            PassTokenError::Malformed => "malformed",
            PassTokenError::SignatureMismatch => "signature_mismatch",
            PassTokenError::Expired => "expired",
        }
    }
}

/// Rejected codec settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassCodecError {
    #[error("pass signing secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("pass ttl of {0}s is outside 0..={MAX_TTL_SECS}")]
    TtlOutOfRange(i64),
}

/// Verified contents of a pass token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassClaims {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub attendee_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    rid: Uuid,
    eid: Uuid,
    aid: Uuid,
    iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    nonce: String,
}

/// Generates and verifies pass tokens with a server-held secret.
#[derive(Clone)]
pub struct PassTokenCodec {
    mac: HmacSha256,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for PassTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassTokenCodec")
            .field("ttl", &self.ttl)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl PassTokenCodec {
    /// Creates a codec. `ttl_secs` of `None` issues tokens without expiry.
    pub fn new(secret: &str, ttl_secs: Option<i64>) -> Result<Self, PassCodecError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(PassCodecError::WeakSecret);
        }
        if let Some(ttl) = ttl_secs.filter(|ttl| !(0..=MAX_TTL_SECS).contains(ttl)) {
            return Err(PassCodecError::TtlOutOfRange(ttl));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| PassCodecError::WeakSecret)?;

        Ok(Self {
            mac,
            ttl: ttl_secs.map(Duration::seconds),
        })
    }

    /// Generates a token for the registration triple.
    pub fn generate(&self, registration_id: Uuid, event_id: Uuid, attendee_id: Uuid) -> String {
        self.generate_at(registration_id, event_id, attendee_id, Utc::now())
    }

    /// Generates a token as if issued at `now`.
    pub fn generate_at(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
        attendee_id: Uuid,
        now: DateTime<Utc>,
    ) -> String {
        let mut nonce = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);

        let payload = Payload {
            rid: registration_id,
            eid: event_id,
            aid: attendee_id,
            iat: now.timestamp(),
            exp: self.ttl.map(|ttl| {
                now.checked_add_signed(ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
                    .timestamp()
            }),
            nonce: hex::encode(nonce),
        };
        // Serializing a struct of uuids, integers and a string cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();

        let signed = format!("{}.{}", TOKEN_VERSION, URL_SAFE_NO_PAD.encode(json));
        let tag = self.sign(&signed);
        format!("{}.{}", signed, tag)
    }

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> Result<PassClaims, PassTokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as of `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<PassClaims, PassTokenError> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(PassTokenError::Malformed);
        }

        let (signed, tag) = token.rsplit_once('.').ok_or(PassTokenError::Malformed)?;
        if signed.is_empty() {
            return Err(PassTokenError::Malformed);
        }

        let tag_bytes = hex::decode(tag).map_err(|_| PassTokenError::SignatureMismatch)?;
        if hex::encode(&tag_bytes) != tag {
            return Err(PassTokenError::SignatureMismatch);
        }
        let mut mac = self.mac.clone();
        mac.update(signed.as_bytes());
        mac.verify_slice(&tag_bytes)
            .map_err(|_| PassTokenError::SignatureMismatch)?;

        let (version, encoded) = signed.split_once('.').ok_or(PassTokenError::Malformed)?;
        if version != TOKEN_VERSION {
            return Err(PassTokenError::Malformed);
        }
        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| PassTokenError::Malformed)?;
        let payload: Payload =
            serde_json::from_slice(&json).map_err(|_| PassTokenError::Malformed)?;

        let issued_at =
            DateTime::from_timestamp(payload.iat, 0).ok_or(PassTokenError::Malformed)?;
        let expires_at = payload
            .exp
            .map(|exp| DateTime::from_timestamp(exp, 0).ok_or(PassTokenError::Malformed))
            .transpose()?;

        if let Some(expires_at) = expires_at {
            if now >= expires_at {
                return Err(PassTokenError::Expired);
            }
        }

        Ok(PassClaims {
            registration_id: payload.rid,
            event_id: payload.eid,
            attendee_id: payload.aid,
            issued_at,
            expires_at,
        })
    }

    fn sign(&self, signed: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(signed.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "door-pass-signing-secret-for-tests-0001";

    fn codec() -> PassTokenCodec {
        PassTokenCodec::new(SECRET, Some(3600)).unwrap()
    }

    fn triple() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        for _ in 0..50 {
            let (r, e, a) = triple();
            let claims = codec.verify(&codec.generate(r, e, a)).unwrap();
            assert_eq!(claims.registration_id, r);
            assert_eq!(claims.event_id, e);
            assert_eq!(claims.attendee_id, a);
        }
    }

    #[test]
    fn test_token_shape() {
        let (r, e, a) = triple();
        let token = codec().generate(r, e, a);

        assert!(token.starts_with("v1."));
        assert_eq!(token.matches('.').count(), 2);
        let tag = token.rsplit('.').next().unwrap();
        assert_eq!(tag.len(), 64);
    }

    #[test]
    fn test_regenerated_tokens_differ_but_both_verify() {
        let codec = codec();
        let (r, e, a) = triple();

        let first = codec.generate(r, e, a);
        let second = codec.generate(r, e, a);

        assert_ne!(first, second);
        assert_eq!(codec.verify(&first).unwrap().registration_id, r);
        assert_eq!(codec.verify(&second).unwrap().registration_id, r);
    }

    #[test]
    fn test_any_single_byte_change_is_signature_mismatch() {
        let codec = codec();
        let (r, e, a) = triple();
        let token = codec.generate(r, e, a);

        for (i, c) in token.char_indices() {
            let replacement = if c == 'a' { 'b' } else { 'a' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert_eq!(
                codec.verify(&tampered),
                Err(PassTokenError::SignatureMismatch),
                "position {} ({:?}) was not detected",
                i,
                c
            );
        }
    }

    #[test]
    fn test_uppercased_tag_is_signature_mismatch() {
        let codec = codec();
        let (r, e, a) = triple();
        let token = codec.generate(r, e, a);
        let (signed, tag) = token.rsplit_once('.').unwrap();
        let tampered = format!("{}.{}", signed, tag.to_uppercase());

        assert_eq!(
            codec.verify(&tampered),
            Err(PassTokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_wrong_secret_is_signature_mismatch() {
        let other = PassTokenCodec::new("another-door-pass-secret-for-tests-002", None).unwrap();
        let (r, e, a) = triple();
        let token = other.generate(r, e, a);

        assert_eq!(
            codec().verify(&token),
            Err(PassTokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_malformed_inputs() {
        let codec = codec();
        assert_eq!(codec.verify(""), Err(PassTokenError::Malformed));
        assert_eq!(codec.verify("garbage"), Err(PassTokenError::Malformed));
        assert_eq!(codec.verify(".abcdef"), Err(PassTokenError::Malformed));
        assert_eq!(
            codec.verify(&"x".repeat(MAX_TOKEN_LEN + 1)),
            Err(PassTokenError::Malformed)
        );
    }

    #[test]
    fn test_forged_token_with_valid_structure_is_rejected() {
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "rid": Uuid::new_v4(),
                "eid": Uuid::new_v4(),
                "aid": Uuid::new_v4(),
                "iat": Utc::now().timestamp(),
                "nonce": "00"
            })
            .to_string(),
        );
        let forged = format!("v1.{}.{}", payload, "0".repeat(64));

        assert_eq!(
            codec().verify(&forged),
            Err(PassTokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_signed_garbage_payload_is_malformed() {
        let codec = codec();
        let signed = "v1.not-json";
        let token = format!("{}.{}", signed, codec.sign(signed));

        assert_eq!(codec.verify(&token), Err(PassTokenError::Malformed));
    }

    #[test]
    fn test_signed_unknown_version_is_malformed() {
        let codec = codec();
        let signed = "v0.e30";
        let token = format!("{}.{}", signed, codec.sign(signed));

        assert_eq!(codec.verify(&token), Err(PassTokenError::Malformed));
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let (r, e, a) = triple();
        let issued = Utc::now() - Duration::hours(2);
        let token = codec.generate_at(r, e, a, issued);

        assert_eq!(codec.verify(&token), Err(PassTokenError::Expired));
        assert!(codec
            .verify_at(&token, issued + Duration::minutes(59))
            .is_ok());
        assert_eq!(
            codec.verify_at(&token, issued + Duration::hours(1)),
            Err(PassTokenError::Expired)
        );
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let codec = PassTokenCodec::new(SECRET, None).unwrap();
        let (r, e, a) = triple();
        let token = codec.generate_at(r, e, a, Utc::now() - Duration::days(3650));

        let claims = codec.verify(&token).unwrap();
        assert!(claims.expires_at.is_none());
    }

    #[test]
    fn test_weak_secret_rejected() {
        assert_eq!(
            PassTokenCodec::new("short", None).unwrap_err(),
            PassCodecError::WeakSecret
        );
    }

    #[test]
    fn test_ttl_bounds() {
        assert!(PassTokenCodec::new(SECRET, Some(MAX_TTL_SECS)).is_ok());
        assert_eq!(
            PassTokenCodec::new(SECRET, Some(i64::MAX)).unwrap_err(),
            PassCodecError::TtlOutOfRange(i64::MAX)
        );
        assert_eq!(
            PassTokenCodec::new(SECRET, Some(MAX_TTL_SECS + 1)).unwrap_err(),
            PassCodecError::TtlOutOfRange(MAX_TTL_SECS + 1)
        );
        assert_eq!(
            PassTokenCodec::new(SECRET, Some(-1)).unwrap_err(),
            PassCodecError::TtlOutOfRange(-1)
        );
    }

    #[test]
    fn test_max_ttl_near_end_of_time_does_not_overflow() {
        let codec = PassTokenCodec::new(SECRET, Some(MAX_TTL_SECS)).unwrap();
        let (r, e, a) = triple();
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(1);

        let token = codec.generate_at(r, e, a, late);
        let claims = codec.verify_at(&token, late).unwrap();
        assert_eq!(
            claims.expires_at.unwrap().timestamp(),
            DateTime::<Utc>::MAX_UTC.timestamp()
        );
    }

    #[test]
    fn test_error_reasons_are_distinct() {
        assert_eq!(PassTokenError::Malformed.reason(), "malformed");
        assert_eq!(
            PassTokenError::SignatureMismatch.reason(),
            "signature_mismatch"
        );
        assert_eq!(PassTokenError::Expired.reason(), "expired");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug_str = format!("{:?}", codec());
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains(SECRET));
    }
}
