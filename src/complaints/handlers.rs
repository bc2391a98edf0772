// HTTP handlers for complaint endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::complaints::{
    ComplaintError, ComplaintQuery, ComplaintReply, ComplaintResponse, CreateComplaintRequest,
    CreateReplyRequest, UpdateComplaintStatusRequest,
};

/// Handler for POST /api/complaints
/// Files a new complaint with optional attachments
pub async fn create_complaint_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateComplaintRequest>,
) -> Result<(StatusCode, Json<ComplaintResponse>), ComplaintError> {
    request
        .validate()
        .map_err(|e| ComplaintError::ValidationError(e.to_string()))?;

    let complaint = state.complaints_repo.create(&request).await?;
    let attachments = state.complaints_repo.attachments(complaint.id).await?;

    let response = ComplaintResponse {
        complaint,
        replies: Vec::new(),
        attachments,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /api/complaints
/// Lists complaints filtered by user, status, category, priority, search
pub async fn list_complaints_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ComplaintQuery>,
) -> Result<Json<Vec<ComplaintResponse>>, ComplaintError> {
    let complaints = state.complaints_repo.list(&query).await?;

    let mut responses = Vec::with_capacity(complaints.len());
    for complaint in complaints {
        let replies = state.complaints_repo.replies(complaint.id).await?;
        let attachments = state.complaints_repo.attachments(complaint.id).await?;
        responses.push(ComplaintResponse {
            complaint,
            replies,
            attachments,
        });
    }

    Ok(Json(responses))
}

/// Handler for GET /api/complaints/{complaint_id}
/// Retrieves a complaint with its reply thread and attachments
pub async fn get_complaint_handler(
    State(state): State<crate::AppState>,
    Path(complaint_id): Path<i32>,
) -> Result<Json<ComplaintResponse>, ComplaintError> {
    let complaint = state
        .complaints_repo
        .find_by_id(complaint_id)
        .await?
        .ok_or(ComplaintError::NotFound)?;

    let replies = state.complaints_repo.replies(complaint.id).await?;
    let attachments = state.complaints_repo.attachments(complaint.id).await?;

    Ok(Json(ComplaintResponse {
        complaint,
        replies,
        attachments,
    }))
}

/// Handler for POST /api/complaints/{complaint_id}/replies
/// Appends a reply to a complaint thread; closed complaints refuse replies
pub async fn create_reply_handler(
    State(state): State<crate::AppState>,
    Path(complaint_id): Path<i32>,
    Json(request): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ComplaintReply>), ComplaintError> {
    request
        .validate()
        .map_err(|e| ComplaintError::ValidationError(e.to_string()))?;

    let complaint = state
        .complaints_repo
        .find_by_id(complaint_id)
        .await?
        .ok_or(ComplaintError::NotFound)?;

    if !complaint.status.accepts_replies() {
        return Err(ComplaintError::Closed);
    }

    let reply = state
        .complaints_repo
        .create_reply(complaint_id, &request)
        .await?;

    Ok((StatusCode::CREATED, Json(reply)))
}

/// Handler for PATCH /api/complaints/{complaint_id}/status
/// Moves a complaint through its workflow
pub async fn update_complaint_status_handler(
    State(state): State<crate::AppState>,
    Path(complaint_id): Path<i32>,
    Json(request): Json<UpdateComplaintStatusRequest>,
) -> Result<Json<ComplaintResponse>, ComplaintError> {
    // Confirm existence first so a missing id maps to 404, not a silent update
    state
        .complaints_repo
        .find_by_id(complaint_id)
        .await?
        .ok_or(ComplaintError::NotFound)?;

    let complaint = state
        .complaints_repo
        .update_status(complaint_id, request.status)
        .await?;

    let replies = state.complaints_repo.replies(complaint.id).await?;
    let attachments = state.complaints_repo.attachments(complaint.id).await?;

    Ok(Json(ComplaintResponse {
        complaint,
        replies,
        attachments,
    }))
}
