//! Transport layer: HTTP wire formats and outbound HTTP calls.

mod envelope;
mod keepalive;

pub use envelope::{ApiResponse, SendMessageFields, TransportError, decode_send_message_request};
pub use keepalive::{
    DEFAULT_KEEPALIVE_INTERVAL, KeepAliveError, KeepAliveHandle, ping_url, start_keepalive_ping,
};
