//! Ticket routes.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use helpdesk::{AgentSelector, NewTicket, Page, TicketDetails, TicketFilter, TicketUpdate};
use helpdesk_db::Ticket;
use serde::Deserialize;

use crate::error::{done, ApiError, Result};
use crate::state::AppState;

/// Query string for the ticket listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: TicketFilter,
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

/// Agent field of an update: an id, or `"auto"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AgentField {
    Id(i64),
    Keyword(String),
}

/// Request to edit a ticket.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub html: Option<String>,
    pub category_id: i64,
    pub priority_id: i64,
    pub status_id: i64,
    /// Missing means `"auto"`.
    #[serde(default)]
    pub agent: Option<AgentField>,
}

impl UpdateRequest {
    fn into_update(self) -> Result<TicketUpdate> {
        let agent = match self.agent {
            None => AgentSelector::Auto,
            Some(AgentField::Id(id)) => AgentSelector::Explicit(id),
            Some(AgentField::Keyword(word)) if word.eq_ignore_ascii_case("auto") => {
                AgentSelector::Auto
            }
            Some(AgentField::Keyword(word)) => {
                return Err(ApiError::BadRequest(format!(
                    "agent must be an id or \"auto\", got \"{}\"",
                    word
                )))
            }
        };

        Ok(TicketUpdate {
            subject: self.subject,
            content: self.content,
            html: self.html,
            category_id: self.category_id,
            priority_id: self.priority_id,
            status_id: self.status_id,
            agent,
        })
    }
}

/// List tickets visible to the caller.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Ticket>>> {
    let principal = state.principal(&headers).await?;
    let page = done(
        state
            .helpdesk
            .list_tickets(&principal, query.filter, query.page)
            .await?,
    )?;
    Ok(Json(page))
}

/// Open a ticket.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>)> {
    let principal = state.principal(&headers).await?;
    let ticket = done(state.helpdesk.create_ticket(&principal, req).await?)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// A ticket with its comments.
pub async fn show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<TicketDetails>> {
    let principal = state.principal(&headers).await?;
    let details = done(state.helpdesk.show_ticket(&principal, id).await?)?;
    Ok(Json(details))
}

/// Edit a ticket's fields.
pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Ticket>> {
    let principal = state.principal(&headers).await?;
    let update = req.into_update()?;
    let ticket = done(state.helpdesk.update_ticket(&principal, id, update).await?)?;
    Ok(Json(ticket))
}

/// Delete a ticket.
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let principal = state.principal(&headers).await?;
    done(state.helpdesk.delete_ticket(&principal, id).await?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a ticket complete.
pub async fn close(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>> {
    let principal = state.principal(&headers).await?;
    let ticket = done(state.helpdesk.close_ticket(&principal, id).await?)?;
    Ok(Json(ticket))
}

/// Reopen a completed ticket.
pub async fn reopen(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>> {
    let principal = state.principal(&headers).await?;
    let ticket = done(state.helpdesk.reopen_ticket(&principal, id).await?)?;
    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(agent: serde_json::Value) -> UpdateRequest {
        serde_json::from_value(serde_json::json!({
            "subject": "Subject",
            "content": "Some content",
            "category_id": 1,
            "priority_id": 1,
            "status_id": 1,
            "agent": agent,
        }))
        .unwrap()
    }

    #[test]
    fn test_agent_field() {
        let update = request(serde_json::json!(7)).into_update().unwrap();
        assert_eq!(update.agent, AgentSelector::Explicit(7));

        let update = request(serde_json::json!("auto")).into_update().unwrap();
        assert_eq!(update.agent, AgentSelector::Auto);

        let update = request(serde_json::Value::Null).into_update().unwrap();
        assert_eq!(update.agent, AgentSelector::Auto);

        assert!(request(serde_json::json!("bob")).into_update().is_err());
    }
}
