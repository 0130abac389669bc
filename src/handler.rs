//! Invocation adapter
//!
//! Turns a JSON job body into a status code and JSON response body. The
//! transport that delivers the body (queue message, HTTP call, CLI) lives
//! outside the core.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::error::DubError;
use crate::export::{ExportCoordinator, ExportLocations, ExportRequest};

/// Response returned to the invoking transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    fn failure(err: &DubError) -> Self {
        error!("Export failed ({}): {}", err.error_code(), err);
        Self {
            status_code: err.status_code(),
            body: json!({
                "error": err.to_string(),
                "code": err.error_code(),
            })
            .to_string(),
        }
    }
}

/// Run one export job described by `body`
pub fn handle_request(body: &str, coordinator: &ExportCoordinator<'_>) -> HandlerResponse {
    let request = match ExportRequest::from_json(body) {
        Ok(request) => request,
        Err(e) => return HandlerResponse::failure(&e),
    };

    let outcome = match coordinator.export(&request) {
        Ok(outcome) => outcome,
        Err(e) => return HandlerResponse::failure(&e),
    };

    let locations = ExportLocations::new(coordinator.config(), &request, outcome.key());
    match serde_json::to_string(&locations) {
        Ok(body) => HandlerResponse {
            status_code: 200,
            body,
        },
        Err(e) => HandlerResponse::failure(&DubError::from(e)),
    }
}
