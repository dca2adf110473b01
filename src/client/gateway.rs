use std::time::Duration;

use tracing::{error, info, warn};

use super::{ClientError, ClientLifecycle};
use crate::domain::{DispatchRequest, DispatchResult, MessageText, PhoneNumber};

/// How long a caller waits for the messaging client to accept a message.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`DispatchGateway::send`].
pub enum DispatchError {
    /// The messaging client is not paired/connected; retry later.
    #[error("WhatsApp client is not ready")]
    NotReady,

    /// The client did not accept the message in time. The send itself was not
    /// cancelled and may still complete.
    #[error("send_timeout")]
    Timeout { after: Duration },

    /// The client rejected the message.
    #[error("{0}")]
    Send(#[source] ClientError),
}

#[derive(Clone)]
/// Sends messages through the current client handle of a [`ClientLifecycle`].
///
/// Each call is a single attempt raced against a timeout; nothing is retried.
pub struct DispatchGateway {
    lifecycle: ClientLifecycle,
    timeout: Duration,
}

impl DispatchGateway {
    /// Create a gateway with [`DEFAULT_SEND_TIMEOUT`].
    pub fn new(lifecycle: ClientLifecycle) -> Self {
        Self {
            lifecycle,
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the send timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn lifecycle(&self) -> &ClientLifecycle {
        &self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    /// Send a validated request. See [`DispatchGateway::send`].
    pub async fn dispatch(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchResult, DispatchError> {
        let (number, message) = request.into_parts();
        self.send(&number, &message).await
    }

    /// Send `message` to `number`.
    ///
    /// Errors:
    /// - [`DispatchError::NotReady`] when the client is not ready; the client is not touched,
    /// - [`DispatchError::Timeout`] when the send outlasts the timeout,
    /// - [`DispatchError::Send`] when the client fails the send.
    pub async fn send(
        &self,
        number: &PhoneNumber,
        message: &MessageText,
    ) -> Result<DispatchResult, DispatchError> {
        if !self.lifecycle.is_ready() {
            return Err(DispatchError::NotReady);
        }

        let client = self.lifecycle.client();
        let chat_id = number.chat_id();
        let body = message.as_str().to_owned();

        // Detached so that losing the race abandons the send instead of dropping it.
        let send = tokio::spawn(async move { client.send_message(&chat_id, &body).await });

        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(Ok(()))) => {
                info!(
                    number = %number,
                    message_length = message.char_len(),
                    "message sent successfully"
                );
                Ok(DispatchResult {
                    number: number.clone(),
                    message: message.clone(),
                })
            }
            Ok(Ok(Err(err))) => {
                error!(number = %number, error = %err, "error sending message");
                Err(DispatchError::Send(err))
            }
            Ok(Err(join_err)) => {
                error!(number = %number, error = %join_err, "send task failed");
                Err(DispatchError::Send(Box::new(join_err)))
            }
            Err(_) => {
                warn!(number = %number, timeout = ?self.timeout, "message sending timed out");
                Err(DispatchError::Timeout {
                    after: self.timeout,
                })
            }
        }
    }
}
