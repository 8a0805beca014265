//! Comment routes.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use helpdesk::NewComment;
use helpdesk_db::Comment;

use crate::error::{done, Result};
use crate::state::AppState;

/// Comment on a ticket.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ticket_id): Path<i64>,
    Json(req): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>)> {
    let principal = state.principal(&headers).await?;
    let comment = done(state.helpdesk.add_comment(&principal, ticket_id, req).await?)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Replace a comment's content.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<NewComment>,
) -> Result<Json<Comment>> {
    let principal = state.principal(&headers).await?;
    let comment = done(state.helpdesk.edit_comment(&principal, id, req).await?)?;
    Ok(Json(comment))
}

/// Delete a comment.
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let principal = state.principal(&headers).await?;
    done(state.helpdesk.delete_comment(&principal, id).await?)?;
    Ok(StatusCode::NO_CONTENT)
}
