//! Routes about the signed-in user.

use axum::{extract::State, Json};
use domain::models::user_role::DestinationResponse;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Where the signed-in user should land.
///
/// GET /api/v1/me/destination
pub async fn get_destination(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<DestinationResponse>, ApiError> {
    let path = state.roles.landing_for_user(user_auth.user_id).await?;
    Ok(Json(DestinationResponse {
        redirect_url: state.config.invites.url_for(path),
    }))
}
