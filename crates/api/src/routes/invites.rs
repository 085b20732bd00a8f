//! Invite routes: create, preview and redeem role invites.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use domain::models::invite::{
    CreateInviteRequest, CreateInviteResponse, InvitePreview, RedeemInviteResponse,
};
use domain::services::InviteError;
use shared::crypto::token_fingerprint;
use tracing::{error, info};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_redemption;

/// Create a new invite.
///
/// POST /api/v1/invites
///
/// Venue admins may invite any role; event organizers may invite promoters
/// and door staff.
pub async fn create_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<CreateInviteResponse>), ApiError> {
    request.validate()?;

    let grants = state.roles.roles_for_user(user_auth.user_id).await?;
    if !grants.iter().any(|grant| grant.role.can_invite(request.role)) {
        return Err(ApiError::Forbidden(format!(
            "You cannot create {} invites",
            request.role
        )));
    }

    let expires_at = request
        .expires_in_hours
        .map(|hours| Utc::now() + Duration::hours(hours));

    let invite = state
        .invites
        .create(
            request.role,
            request.metadata,
            Some(user_auth.user_id),
            expires_at,
        )
        .await?;

    let invite_url = state
        .config
        .invites
        .url_for(&format!("/invite/{}", invite.token));

    Ok((
        StatusCode::CREATED,
        Json(CreateInviteResponse {
            token: invite.token,
            role: invite.role,
            metadata: invite.metadata,
            expires_at: invite.expires_at,
            invite_url,
        }),
    ))
}

/// Preview an invite without consuming it.
///
/// GET /api/v1/invites/:token
pub async fn preview_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitePreview>, ApiError> {
    let invite = state.invites.fetch(&token).await?;

    if invite.is_used() {
        return Err(InviteError::AlreadyUsed.into());
    }
    if invite.is_expired_at(Utc::now()) {
        return Err(InviteError::Expired.into());
    }

    Ok(Json(InvitePreview {
        valid: true,
        role: invite.role,
        metadata: invite.metadata,
    }))
}

/// Redeem an invite for the signed-in user and grant its role.
///
/// POST /api/v1/invites/:token/redeem
pub async fn redeem_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(token): Path<String>,
) -> Result<Json<RedeemInviteResponse>, ApiError> {
    let redeemed = match state.invites.redeem(&token, user_auth.user_id).await {
        Ok(redeemed) => redeemed,
        Err(e) => {
            record_redemption("invite", e.reason());
            return Err(match e {
                InviteError::NotFound => ApiError::InvalidToken("Invalid invite".to_string()),
                other => other.into(),
            });
        }
    };

    let path = match state
        .roles
        .assign(user_auth.user_id, redeemed.role, &redeemed.metadata)
        .await
    {
        Ok(path) => path,
        Err(e) => {
            // Give the invite back so the user can retry cleanly.
            if let Err(release_err) = state.invites.release(&token, user_auth.user_id).await {
                error!(
                    token = %token_fingerprint(&token),
                    error = %release_err,
                    "Failed to release invite after role grant failure"
                );
            }
            record_redemption("invite", "grant_failed");
            return Err(e.into());
        }
    };

    record_redemption("invite", "success");
    info!(
        user_id = %user_auth.user_id,
        role = %redeemed.role,
        "Invite redeemed and role granted"
    );

    Ok(Json(RedeemInviteResponse {
        role: redeemed.role,
        redirect_url: state.config.invites.url_for(path),
    }))
}
