//! Client layer: owns the external messaging client and dispatches through it.
//!
//! The external client (a browser-driven web messaging session) is reached only
//! through [`MessagingClient`]. A [`ClientFactory`] builds a fresh handle bound to
//! an [`EventSink`]; [`ClientLifecycle`] consumes the events and replaces the
//! handle after a disconnect, and [`DispatchGateway`] sends through whatever
//! handle is current.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::ChatId;

mod gateway;
mod lifecycle;
mod loopback;

#[cfg(test)]
pub(crate) mod fake;

pub use gateway::{DEFAULT_SEND_TIMEOUT, DispatchError, DispatchGateway};
pub use lifecycle::{
    ClientLifecycle, DEFAULT_PRESENCE_INTERVAL, DEFAULT_RECONNECT_DELAY, LifecycleError,
    LifecycleSettings,
};
pub use loopback::{LoopbackClient, LoopbackFactory};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure reported by the external messaging client.
pub type ClientError = Box<dyn StdError + Send + Sync>;

/// Operations of the external messaging client.
///
/// Implementations report connection progress through the [`EventSink`] they
/// were created with rather than through return values: `initialize` resolving
/// does not imply readiness, only the [`ClientEvent::Ready`] event does.
pub trait MessagingClient: Send + Sync {
    /// Start the session (launch the browser, restore or pair the session).
    fn initialize(&self) -> BoxFuture<'_, Result<(), ClientError>>;

    /// Send `body` to `chat_id`.
    fn send_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), ClientError>>;

    /// Mark the session as online; keeps idle sessions from freezing.
    fn send_presence_available(&self) -> BoxFuture<'_, Result<(), ClientError>>;

    /// Tear the session down and release its resources.
    fn destroy(&self) -> BoxFuture<'_, Result<(), ClientError>>;
}

/// Builds messaging client handles.
///
/// A factory carries the client configuration, so every handle it creates
/// (the first one and each replacement after a disconnect) is configured alike.
pub trait ClientFactory: Send + Sync {
    fn create(&self, events: EventSink) -> Arc<dyn MessagingClient>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Message received by the client.
pub struct IncomingMessage {
    pub from: ChatId,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Event emitted by the external messaging client.
pub enum ClientEvent {
    /// A pairing code to be scanned with the phone.
    Qr(String),
    Authenticated,
    Ready,
    Message(IncomingMessage),
    Disconnected(String),
}

#[derive(Debug)]
pub(crate) struct TaggedEvent {
    pub(crate) generation: u64,
    pub(crate) event: ClientEvent,
}

#[derive(Debug, Clone)]
/// Channel through which one client handle reports its events.
///
/// Each sink is tagged with the generation of the handle it was created for, so
/// events from a replaced handle can be told apart from the current one.
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<TaggedEvent>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<TaggedEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation of the handle this sink belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forward `event` to the lifecycle.
    ///
    /// Returns `false` once the lifecycle has shut down.
    pub fn emit(&self, event: ClientEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}
