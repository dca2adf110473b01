//! HTTP surface: routes requests to the dispatch gateway and maps outcomes to
//! the JSON envelope.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::{debug, warn};

use crate::client::{DispatchError, DispatchGateway};
use crate::domain::{DispatchRequest, DispatchResult, PhoneNumber, ValidationError};
use crate::transport::{ApiResponse, decode_send_message_request};

mod run;

pub use run::{run, serve_until};

pub const SEND_MESSAGE_ENDPOINT: &str = "/api/send-message";
pub const PING_ENDPOINT: &str = "/ping";

const MSG_REQUIRED: &str = "Number and message are required";
const MSG_INVALID_NUMBER: &str = "Invalid Indonesian phone number";
const MSG_NOT_READY: &str = "WhatsApp client is not ready. Try again later.";
const MSG_TIMED_OUT: &str = "Message sending timed out";
const MSG_SEND_FAILED: &str = "Failed to send message";
const MSG_SENT: &str = "Message sent successfully";

/// State shared by every request handler.
pub struct AppState {
    gateway: DispatchGateway,
}

impl AppState {
    pub fn new(gateway: DispatchGateway) -> Self {
        Self { gateway }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(PING_ENDPOINT, get(handle_ping))
        .route(SEND_MESSAGE_ENDPOINT, post(handle_send_message))
        .with_state(state)
}

async fn handle_ping() -> &'static str {
    "pong"
}

async fn handle_send_message(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let fields = match decode_send_message_request(&body) {
        Ok(fields) => fields,
        Err(err) => {
            // Wrongly typed fields land here too; they are treated as missing.
            warn!(error = %err, "rejecting send-message body without string number and message");
            return failure(StatusCode::BAD_REQUEST, MSG_REQUIRED);
        }
    };
    let Some((number, message)) = fields.required() else {
        return failure(StatusCode::BAD_REQUEST, MSG_REQUIRED);
    };
    if !PhoneNumber::is_valid(number) {
        return failure(StatusCode::BAD_REQUEST, MSG_INVALID_NUMBER);
    }

    let request = match DispatchRequest::new(number, message) {
        Ok(request) => request,
        Err(err) => {
            debug!(field = err.field(), error = %err, "rejecting send-message request");
            let message = match err {
                ValidationError::InvalidPhoneNumber { .. } => MSG_INVALID_NUMBER,
                ValidationError::Empty { .. } => MSG_REQUIRED,
            };
            return failure(StatusCode::BAD_REQUEST, message);
        }
    };

    if !state.gateway.is_ready() {
        return failure(StatusCode::SERVICE_UNAVAILABLE, MSG_NOT_READY);
    }

    match state.gateway.dispatch(request).await {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(MSG_SENT, result))).into_response(),
        Err(DispatchError::NotReady) => failure(StatusCode::SERVICE_UNAVAILABLE, MSG_NOT_READY),
        Err(err @ DispatchError::Timeout { .. }) => envelope(
            StatusCode::GATEWAY_TIMEOUT,
            ApiResponse::failure(MSG_TIMED_OUT).with_error(err.to_string()),
        ),
        Err(err @ DispatchError::Send(_)) => envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse::failure(MSG_SEND_FAILED).with_error(err.to_string()),
        ),
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    envelope(status, ApiResponse::failure(message))
}

fn envelope(status: StatusCode, body: ApiResponse<DispatchResult>) -> Response {
    (status, Json(body)).into_response()
}
