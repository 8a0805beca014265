//! Settings routes. Admin only.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{done, Result};
use crate::state::AppState;

/// A setting as returned to clients.
#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub slug: String,
    pub value: Value,
}

/// Request to write a setting.
#[derive(Debug, Deserialize)]
pub struct SettingRequest {
    pub value: Value,
}

/// Read a setting.
pub async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<SettingResponse>> {
    let principal = state.principal(&headers).await?;
    let value = done(state.helpdesk.read_setting(&principal, &slug).await?)?;
    Ok(Json(SettingResponse { slug, value }))
}

/// Write a setting.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(req): Json<SettingRequest>,
) -> Result<Json<SettingResponse>> {
    let principal = state.principal(&headers).await?;
    let value = done(
        state
            .helpdesk
            .write_setting(&principal, &slug, req.value)
            .await?,
    )?;
    Ok(Json(SettingResponse { slug, value }))
}
