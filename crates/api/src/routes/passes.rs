//! Door-pass issuance.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use domain::models::registration::PassResponse;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_pass_issued;

/// Issue a pass token for the caller's own registration.
///
/// GET /api/v1/registrations/:registration_id/pass
pub async fn get_pass(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(registration_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let qr_token = state
        .door_pass
        .issue_pass(registration_id, user_auth.user_id)
        .await?;

    record_pass_issued();

    Ok((
        [(header::CACHE_CONTROL, "private, no-store")],
        Json(PassResponse { qr_token }),
    ))
}
