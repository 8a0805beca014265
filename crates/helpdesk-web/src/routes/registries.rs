//! Status, priority and category routes.
//!
//! The three registries share handlers; the router for each one fixes the
//! [`RegistryKind`].

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use helpdesk::EntryInput;
use helpdesk_db::{RegistryEntry, RegistryKind, StaffUser};
use serde::Deserialize;

use crate::error::{done, Result};
use crate::state::AppState;

/// Request to set the agents of a category.
#[derive(Debug, Deserialize)]
pub struct AgentsRequest {
    pub agent_ids: Vec<i64>,
}

/// Routes for one registry, to be nested under its plural path.
pub fn router(kind: RegistryKind) -> Router<AppState> {
    let router = Router::new()
        .route(
            "/",
            get(move |State(state): State<AppState>| list(state, kind)).post(
                move |State(state): State<AppState>, headers: HeaderMap, Json(req): Json<EntryInput>| {
                    create(state, headers, kind, req)
                },
            ),
        )
        .route(
            "/:id",
            put(
                move |State(state): State<AppState>,
                      headers: HeaderMap,
                      Path(id): Path<i64>,
                      Json(req): Json<EntryInput>| { update(state, headers, kind, id, req) },
            )
            .delete(
                move |State(state): State<AppState>, headers: HeaderMap, Path(id): Path<i64>| {
                    delete(state, headers, kind, id)
                },
            ),
        );

    match kind {
        RegistryKind::Category => router.route("/:id/agents", put(set_agents)),
        _ => router,
    }
}

async fn list(state: AppState, kind: RegistryKind) -> Result<Json<Vec<RegistryEntry>>> {
    Ok(Json(state.helpdesk.list_entries(kind).await?))
}

async fn create(
    state: AppState,
    headers: HeaderMap,
    kind: RegistryKind,
    req: EntryInput,
) -> Result<(StatusCode, Json<RegistryEntry>)> {
    let principal = state.principal(&headers).await?;
    let entry = done(state.helpdesk.create_entry(&principal, kind, req).await?)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update(
    state: AppState,
    headers: HeaderMap,
    kind: RegistryKind,
    id: i64,
    req: EntryInput,
) -> Result<Json<RegistryEntry>> {
    let principal = state.principal(&headers).await?;
    let entry = done(state.helpdesk.update_entry(&principal, kind, id, req).await?)?;
    Ok(Json(entry))
}

async fn delete(
    state: AppState,
    headers: HeaderMap,
    kind: RegistryKind,
    id: i64,
) -> Result<StatusCode> {
    let principal = state.principal(&headers).await?;
    done(state.helpdesk.delete_entry(&principal, kind, id).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the agents a category auto-assigns to.
pub async fn set_agents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<AgentsRequest>,
) -> Result<Json<Vec<StaffUser>>> {
    let principal = state.principal(&headers).await?;
    let agents = done(
        state
            .helpdesk
            .set_category_agents(&principal, id, &req.agent_ids)
            .await?,
    )?;
    Ok(Json(agents))
}
