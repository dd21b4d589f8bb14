//! Response construction and error-to-status mapping.

use crate::error::{ErrorKind, MarketplaceError, MarketplaceResult};
use lambda_http::http::StatusCode;
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::{Body, Error, Response};
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

const OPAQUE_MESSAGE: &str = "internal server error";
const UPSTREAM_MESSAGE: &str = "payment processing failed";

/// A JSON reply awaiting conversion into a transport response.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Reply {
    status: StatusCode,
    body: serde_json::Value,
}

impl Reply {
    pub fn ok(value: &impl Serialize) -> MarketplaceResult<Self> {
        Self::with_status(StatusCode::OK, value)
    }

    pub fn created(value: &impl Serialize) -> MarketplaceResult<Self> {
        Self::with_status(StatusCode::CREATED, value)
    }

    fn with_status(status: StatusCode, value: &impl Serialize) -> MarketplaceResult<Self> {
        let body = serde_json::to_value(value)
            .map_err(|err| MarketplaceError::Internal(format!("response encoding failed: {err}")))?;
        Ok(Self { status, body })
    }

    pub fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn from_error(err: &MarketplaceError) -> Self {
        let status = status_for(err);
        if status.is_server_error() {
            error!(error = %err, kind = ?err.kind(), "request failed");
        } else {
            warn!(error = %err, kind = ?err.kind(), status = status.as_u16(), "request rejected");
        }
        let message = if err.kind() == ErrorKind::Internal {
            OPAQUE_MESSAGE.to_owned()
        } else if err.is_upstream_failure() {
            UPSTREAM_MESSAGE.to_owned()
        } else {
            err.to_string()
        };
        Self::message(status, &message)
    }

    pub fn into_response(self) -> Result<Response<Body>, Error> {
        Ok(Response::builder()
            .status(self.status)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(self.body.to_string()))
            .map_err(Box::new)?)
    }
}

/// Transport status for an error.
#[must_use]
pub fn status_for(err: &MarketplaceError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::InvalidState | ErrorKind::WebhookSignature => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::PayeeSetup if err.is_upstream_failure() => StatusCode::BAD_GATEWAY,
        ErrorKind::PayeeSetup => StatusCode::BAD_REQUEST,
        ErrorKind::Payment => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
