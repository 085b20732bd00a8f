//! Event invite-QR routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::invite_qr_code::{
    is_valid_invite_code, CreateInviteQrRequest, InviteQrResponse, RedeemInviteQrResponse,
};
use domain::services::InviteError;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_redemption;

/// Create an invite-QR code for an event.
///
/// POST /api/v1/events/:event_id/invite-qr
///
/// Only the event owner may create codes.
pub async fn create_invite_qr(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateInviteQrRequest>,
) -> Result<(StatusCode, Json<InviteQrResponse>), ApiError> {
    request.validate()?;

    let invite_qr = state
        .invites
        .create_event_code(
            event_id,
            user_auth.user_id,
            request.max_uses,
            request.expires_at,
        )
        .await?;

    let invite_url = state
        .config
        .invites
        .url_for(&format!("/i/{}", invite_qr.invite_code));

    Ok((
        StatusCode::CREATED,
        Json(InviteQrResponse {
            invite_qr,
            invite_url,
        }),
    ))
}

/// Redeem an invite-QR code, counting one use.
///
/// GET /api/v1/invite-qr/:code
pub async fn redeem_invite_qr(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RedeemInviteQrResponse>, ApiError> {
    let code = code.trim().to_uppercase();
    if !is_valid_invite_code(&code) {
        record_redemption("invite_qr", InviteError::NotFound.reason());
        return Err(InviteError::NotFound.into());
    }

    match state.invites.redeem_event_code(&code).await {
        Ok((invite, event)) => {
            record_redemption("invite_qr", "success");
            Ok(Json(RedeemInviteQrResponse {
                invite: invite.into(),
                event: event.into(),
            }))
        }
        Err(e) => {
            record_redemption("invite_qr", e.reason());
            Err(e.into())
        }
    }
}
