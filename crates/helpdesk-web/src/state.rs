//! Application state shared across handlers.

use std::sync::Arc;

use axum::http::HeaderMap;
use helpdesk::{Helpdesk, Principal};

use crate::error::{ApiError, Result};

/// Header carrying the signed-in customer id.
pub const CUSTOMER_HEADER: &str = "x-customer-id";

/// Header carrying the signed-in staff id.
pub const STAFF_HEADER: &str = "x-staff-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub helpdesk: Arc<Helpdesk>,
}

impl AppState {
    /// Create new application state.
    pub fn new(helpdesk: Helpdesk) -> Self {
        Self {
            helpdesk: Arc::new(helpdesk),
        }
    }

    /// Resolve the principal from the session headers.
    pub async fn principal(&self, headers: &HeaderMap) -> Result<Principal> {
        let customer = session_id(headers, CUSTOMER_HEADER)?;
        let staff = session_id(headers, STAFF_HEADER)?;
        Ok(self.helpdesk.resolve_principal(&customer, &staff).await?)
    }
}

fn session_id(headers: &HeaderMap, name: &str) -> Result<Option<i64>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest(format!("{} must be a numeric id", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers, STAFF_HEADER).unwrap(), None);

        headers.insert(STAFF_HEADER, HeaderValue::from_static("12"));
        assert_eq!(session_id(&headers, STAFF_HEADER).unwrap(), Some(12));

        headers.insert(CUSTOMER_HEADER, HeaderValue::from_static("abc"));
        assert!(session_id(&headers, CUSTOMER_HEADER).is_err());
    }
}
