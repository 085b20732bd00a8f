//! Event-scoped invite codes with a usage cap and expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::event::PublicEventInfo;

/// An invite code distributed as a scannable QR code for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteQrCode {
    pub id: Uuid,
    pub invite_code: String,
    pub event_id: Uuid,
    pub created_by: Uuid,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InviteQrCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses
            .map(|max| self.used_count >= max)
            .unwrap_or(false)
    }
}

/// Values needed to insert a new invite-QR code.
#[derive(Debug, Clone)]
pub struct NewInviteQrCode {
    pub invite_code: String,
    pub event_id: Uuid,
    pub created_by: Uuid,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request to create an invite-QR code for an event.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteQrRequest {
    /// Maximum redemptions (1-10000). Omit for unlimited.
    #[validate(range(min = 1, max = 10000, message = "max_uses must be between 1 and 10000"))]
    pub max_uses: Option<i32>,

    pub expires_at: Option<DateTime<Utc>>,
}

/// Response after creating an invite-QR code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteQrResponse {
    pub invite_qr: InviteQrCode,
    pub invite_url: String,
}

/// Invite-QR fields safe to return to anonymous callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteQrInfo {
    pub invite_code: String,
    pub event_id: Uuid,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<InviteQrCode> for InviteQrInfo {
    fn from(qr: InviteQrCode) -> Self {
        Self {
            invite_code: qr.invite_code,
            event_id: qr.event_id,
            max_uses: qr.max_uses,
            used_count: qr.used_count,
            expires_at: qr.expires_at,
        }
    }
}

/// Response after redeeming an invite-QR code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RedeemInviteQrResponse {
    pub invite: InviteQrInfo,
    pub event: PublicEventInfo,
}

lazy_static::lazy_static! {
    static ref INVITE_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-HJ-NP-Z2-9]{4}-[A-HJ-NP-Z2-9]{4}-[A-HJ-NP-Z2-9]{4}$").unwrap();
}

/// Returns true if `code` has the XXXX-XXXX-XXXX shape produced by
/// [`generate_invite_code`]. Lookups for anything else can be skipped.
pub fn is_valid_invite_code(code: &str) -> bool {
    INVITE_CODE_REGEX.is_match(code)
}

/// Generate a random invite code in XXXX-XXXX-XXXX format.
pub fn generate_invite_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let chars: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789"; // Avoiding confusing chars: 0, O, I, 1

    let mut generate_segment = || -> String {
        (0..4)
            .map(|_| {
                let idx = rng.gen_range(0..chars.len());
                chars[idx] as char
            })
            .collect()
    };

    format!(
        "{}-{}-{}",
        generate_segment(),
        generate_segment(),
        generate_segment()
    )
}
