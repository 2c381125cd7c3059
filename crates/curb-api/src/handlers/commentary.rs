//! Commentary endpoint handler.

use axum::extract::State;
use axum::Json;
use tracing::warn;

use curb_inference::{CommentaryOutcome, PipelineError};
use curb_models::{CommentaryRequest, CommentaryResponse, EncodedFrame};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Run the commentary pipeline for one sampled frame.
///
/// A terminal inference failure answers 502 so the watcher can tell a failed
/// tick apart from a low-confidence commentary. A persistence failure still
/// answers 200 with the commentary — the row is lost, the user is not told.
pub async fn generate_commentary(
    State(state): State<AppState>,
    Json(request): Json<CommentaryRequest>,
) -> ApiResult<Json<CommentaryResponse>> {
    let frame = EncodedFrame::new(request.image_data, request.width, request.height);
    frame
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    match state.pipeline.generate(&frame).await {
        Ok(CommentaryOutcome::Generated(observation)) => Ok(Json(CommentaryResponse {
            text: observation.commentary,
            timestamp: Some(observation.timestamp),
            likeliness_of_homelessness: observation.homelessness_probability,
        })),
        Ok(CommentaryOutcome::Exhausted { attempts, message }) => {
            warn!("commentary tick failed after {} attempts", attempts);
            Err(ApiError::upstream(message))
        }
        Err(PipelineError::Persistence {
            observation,
            source,
        }) => {
            warn!("observation lost, returning commentary anyway: {}", source);
            Ok(Json(CommentaryResponse {
                text: observation.commentary,
                timestamp: Some(observation.timestamp),
                likeliness_of_homelessness: observation.homelessness_probability,
            }))
        }
    }
}
