//! HTTP gateway that sends messages to Indonesian phone numbers through a
//! browser-driven web messaging client.
//!
//! The crate is layered like this:
//! - [`domain`]: phone-number normalization and the validated request/result types,
//! - [`client`]: the messaging client contract, its lifecycle (pairing, presence,
//!   reconnect), and the dispatch gateway with its send timeout,
//! - [`transport`]: the JSON envelope and the outbound keep-alive ping,
//! - [`server`]: the axum router and the process bootstrap,
//! - [`logging`]: console and JSON file logging.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wadispatch::client::{ClientLifecycle, DispatchGateway, LifecycleSettings, LoopbackFactory};
//! use wadispatch::domain::{MessageText, PhoneNumber};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let lifecycle =
//!         ClientLifecycle::start(Arc::new(LoopbackFactory::default()), LifecycleSettings::default())?;
//!     lifecycle.initialize().await?;
//!     lifecycle.subscribe().wait_for(|state| state.is_ready()).await?;
//!
//!     let gateway = DispatchGateway::new(lifecycle.clone());
//!     let number = PhoneNumber::parse("0812-3456-7890")?;
//!     let result = gateway.send(&number, &MessageText::new("halo")?).await?;
//!     assert_eq!(result.number.as_str(), "6281234567890");
//!
//!     lifecycle.destroy().await?;
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod domain;
pub mod logging;
pub mod server;
pub mod transport;

pub use client::{
    ClientEvent, ClientFactory, ClientLifecycle, DispatchError, DispatchGateway, LifecycleError,
    MessagingClient,
};
pub use config::AppConfig;
pub use domain::{
    ChatId, ClientState, DispatchRequest, DispatchResult, MessageText, PhoneNumber,
    ValidationError,
};
pub use transport::{ApiResponse, KeepAliveError, KeepAliveHandle, start_keepalive_ping};
