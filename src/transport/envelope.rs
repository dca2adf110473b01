use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON envelope wrapping every API response.
///
/// `data` and `error` are omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SendMessageJsonRequest {
    #[serde(default)]
    number: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Fields of a `send-message` request body, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageFields {
    pub number: Option<String>,
    pub message: Option<String>,
}

impl SendMessageFields {
    /// Both fields, when present and non-empty.
    pub fn required(&self) -> Option<(&str, &str)> {
        let number = self.number.as_deref().filter(|value| !value.is_empty())?;
        let message = self.message.as_deref().filter(|value| !value.is_empty())?;
        Some((number, message))
    }
}

pub fn decode_send_message_request(body: &[u8]) -> Result<SendMessageFields, TransportError> {
    let parsed: SendMessageJsonRequest = serde_json::from_slice(body)?;
    Ok(SendMessageFields {
        number: parsed.number,
        message: parsed.message,
    })
}
