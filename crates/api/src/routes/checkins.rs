//! Door check-in routes for staff scanners.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::check_in::{CheckInRequest, CheckInResponse};
use domain::services::DoorPassError;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_check_in;

fn outcome_label(error: &DoorPassError) -> &'static str {
    match error {
        DoorPassError::NotFound => "not_found",
        DoorPassError::Forbidden(_) => "forbidden",
        DoorPassError::InvalidPass(e) => e.reason(),
        DoorPassError::WrongEvent => "wrong_event",
        DoorPassError::AlreadyCheckedIn => "already_checked_in",
        DoorPassError::Store(_) => "store_error",
    }
}

/// Verify a scanned pass and record the check-in.
///
/// POST /api/v1/events/:event_id/checkins
pub async fn check_in(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    request.validate()?;

    let policy = state.config.door_pass.check_in_policy;
    let outcome = match state
        .door_pass
        .check_in(&request.qr_token, event_id, user_auth.user_id, policy)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            record_check_in(outcome_label(&e));
            return Err(e.into());
        }
    };

    record_check_in("success");
    Ok(Json(CheckInResponse {
        registration_id: outcome.registration.id,
        attendee_id: outcome.registration.attendee.id,
        attendee_name: outcome.registration.attendee.name,
        checked_in_at: outcome.check_in.checked_in_at,
    }))
}

/// Undo a check-in under the active policy.
///
/// DELETE /api/v1/events/:event_id/checkins/:registration_id
pub async fn reset_check_in(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((event_id, registration_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .door_pass
        .reset_check_in(
            registration_id,
            event_id,
            user_auth.user_id,
            state.config.door_pass.check_in_policy,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::pass_token::PassTokenError;

    #[test]
    fn test_outcome_labels_distinguish_codec_failures() {
        assert_eq!(
            outcome_label(&DoorPassError::InvalidPass(PassTokenError::Expired)),
            "expired"
        );
        assert_eq!(
            outcome_label(&DoorPassError::InvalidPass(PassTokenError::SignatureMismatch)),
            "signature_mismatch"
        );
        assert_eq!(outcome_label(&DoorPassError::WrongEvent), "wrong_event");
    }
}
