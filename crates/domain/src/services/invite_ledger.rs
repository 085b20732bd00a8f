//! Invite ledger: single-use role invites and event invite-QR codes.

use chrono::{DateTime, Utc};
use shared::crypto::{generate_token, token_fingerprint, INVITE_TOKEN_BYTES};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::store::{EventStore, InviteQrStore, InviteTokenStore, StoreError};
use crate::models::invite::find_non_scalar_key;
use crate::models::invite_qr_code::generate_invite_code;
use crate::models::{
    Event, InviteMetadata, InviteQrCode, InviteToken, NewInviteQrCode, NewInviteToken,
    RedeemedInvite, Role,
};

/// Attempts at drawing a fresh token or code before giving up.
const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Failures of invite operations.
#[derive(Debug, Error)]
pub enum InviteError {
    #[error("Invite not found")]
    NotFound,

    #[error("Invite has already been used")]
    AlreadyUsed,

    #[error("Invite has expired")]
    Expired,

    #[error("Invite has reached its maximum number of uses")]
    CapacityExceeded,

    #[error("Event not found")]
    EventNotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Metadata value for '{0}' must be a string, number, boolean or null")]
    InvalidMetadata(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl InviteError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            InviteError::NotFound => "not_found",
            InviteError::AlreadyUsed => "already_used",
            InviteError::Expired => "expired",
            InviteError::CapacityExceeded => "capacity_exceeded",
            InviteError::EventNotFound => "event_not_found",
            InviteError::Forbidden(_) => "forbidden",
            InviteError::InvalidMetadata(_) => "invalid_metadata",
            InviteError::Store(_) => "store_error",
        }
    }
}

/// Creates, previews and redeems invites.
#[derive(Clone)]
pub struct InviteLedger {
    tokens: Arc<dyn InviteTokenStore>,
    qr_codes: Arc<dyn InviteQrStore>,
    events: Arc<dyn EventStore>,
}

impl InviteLedger {
    pub fn new(
        tokens: Arc<dyn InviteTokenStore>,
        qr_codes: Arc<dyn InviteQrStore>,
        events: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            tokens,
            qr_codes,
            events,
        }
    }

    /// Create an unused invite for `role` with a fresh random token.
    pub async fn create(
        &self,
        role: Role,
        metadata: InviteMetadata,
        created_by: Option<Uuid>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<InviteToken, InviteError> {
        if let Some(key) = find_non_scalar_key(&metadata) {
            return Err(InviteError::InvalidMetadata(key.to_string()));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let new_invite = NewInviteToken {
                token: generate_token(INVITE_TOKEN_BYTES),
                role,
                metadata: metadata.clone(),
                created_by,
                expires_at,
            };

            match self.tokens.insert_invite(new_invite).await {
                Ok(invite) => {
                    info!(
                        role = %role,
                        token = %token_fingerprint(&invite.token),
                        created_by = ?created_by,
                        "Invite created"
                    );
                    return Ok(invite);
                }
                Err(StoreError::Conflict(_)) if attempts < MAX_GENERATION_ATTEMPTS => {
                    warn!(attempt = attempts, "Invite token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Look up an invite without changing it.
    pub async fn fetch(&self, token: &str) -> Result<InviteToken, InviteError> {
        self.tokens
            .find_invite(token)
            .await?
            .ok_or(InviteError::NotFound)
    }

    /// Consume an invite for `user_id`. Under concurrent attempts exactly one
    /// caller succeeds; the rest see [`InviteError::AlreadyUsed`].
    pub async fn redeem(&self, token: &str, user_id: Uuid) -> Result<RedeemedInvite, InviteError> {
        if let Some(invite) = self.tokens.mark_invite_used(token, user_id).await? {
            info!(
                role = %invite.role,
                token = %token_fingerprint(token),
                user_id = %user_id,
                "Invite redeemed"
            );
            return Ok(RedeemedInvite {
                role: invite.role,
                metadata: invite.metadata,
            });
        }

        // The conditional update matched nothing; find out why. A row that
        // looks redeemable now was claimed and released in between.
        let error = match self.tokens.find_invite(token).await? {
            None => InviteError::NotFound,
            Some(invite) if invite.is_used() => InviteError::AlreadyUsed,
            Some(invite) if invite.is_expired_at(Utc::now()) => InviteError::Expired,
            Some(_) => InviteError::AlreadyUsed,
        };
        debug!(
            token = %token_fingerprint(token),
            reason = error.reason(),
            "Invite redemption rejected"
        );
        Err(error)
    }

    /// Undo a redemption by `user_id` whose follow-up work failed.
    pub async fn release(&self, token: &str, user_id: Uuid) -> Result<bool, InviteError> {
        let released = self.tokens.release_invite(token, user_id).await?;
        if released {
            warn!(
                token = %token_fingerprint(token),
                user_id = %user_id,
                "Invite redemption released"
            );
        }
        Ok(released)
    }

    /// Create an invite-QR code for an event owned by `requester`.
    pub async fn create_event_code(
        &self,
        event_id: Uuid,
        requester: Uuid,
        max_uses: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<InviteQrCode, InviteError> {
        let event = self
            .events
            .find_event(event_id)
            .await?
            .ok_or(InviteError::EventNotFound)?;

        if !event.is_owned_by(requester) {
            return Err(InviteError::Forbidden(
                "Only the event owner can create invite codes".to_string(),
            ));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let new_code = NewInviteQrCode {
                invite_code: generate_invite_code(),
                event_id,
                created_by: requester,
                max_uses,
                expires_at,
            };

            match self.qr_codes.insert_invite_qr(new_code).await {
                Ok(code) => {
                    info!(
                        event_id = %event_id,
                        invite_qr_id = %code.id,
                        max_uses = ?max_uses,
                        "Invite QR code created"
                    );
                    return Ok(code);
                }
                Err(StoreError::Conflict(_)) if attempts < MAX_GENERATION_ATTEMPTS => {
                    warn!(attempt = attempts, "Invite code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Count one use of an invite-QR code and return it with its event.
    pub async fn redeem_event_code(
        &self,
        invite_code: &str,
    ) -> Result<(InviteQrCode, Event), InviteError> {
        let Some(code) = self.qr_codes.consume_invite_qr(invite_code).await? else {
            let error = match self.qr_codes.find_invite_qr(invite_code).await? {
                None => InviteError::NotFound,
                Some(code) if code.is_expired_at(Utc::now()) => InviteError::Expired,
                Some(code) if code.is_exhausted() => InviteError::CapacityExceeded,
                // The store's clock saw it expire before ours did.
                Some(code) if code.expires_at.is_some() => InviteError::Expired,
                Some(_) => InviteError::CapacityExceeded,
            };
            debug!(reason = error.reason(), "Invite code redemption rejected");
            return Err(error);
        };

        let event = self
            .events
            .find_event(code.event_id)
            .await?
            .ok_or(InviteError::EventNotFound)?;

        info!(
            event_id = %event.id,
            invite_qr_id = %code.id,
            used_count = code.used_count,
            "Invite QR code redeemed"
        );
        Ok((code, event))
    }
}
