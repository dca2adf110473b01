use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::{BoxFuture, ClientError, ClientEvent, ClientFactory, EventSink, MessagingClient};
use crate::config::BrowserOptions;
use crate::domain::ChatId;

#[derive(Debug, Clone, Default)]
/// Builds [`LoopbackClient`] handles.
pub struct LoopbackFactory {
    browser: BrowserOptions,
}

impl LoopbackFactory {
    pub fn new(browser: BrowserOptions) -> Self {
        Self { browser }
    }
}

impl ClientFactory for LoopbackFactory {
    fn create(&self, events: EventSink) -> Arc<dyn MessagingClient> {
        debug!(
            generation = events.generation(),
            headless = self.browser.headless,
            args = ?self.browser.args,
            "creating loopback messaging client"
        );
        Arc::new(LoopbackClient::new(events))
    }
}

/// In-process messaging client that pairs instantly and logs deliveries.
///
/// Stands in for the browser-driven client when none is wired in; messages are
/// accepted and logged, never transmitted.
pub struct LoopbackClient {
    events: EventSink,
    destroyed: AtomicBool,
}

impl LoopbackClient {
    pub fn new(events: EventSink) -> Self {
        Self {
            events,
            destroyed: AtomicBool::new(false),
        }
    }

    fn ensure_alive(&self) -> Result<(), ClientError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err("loopback client has been destroyed".into());
        }
        Ok(())
    }
}

impl MessagingClient for LoopbackClient {
    fn initialize(&self) -> BoxFuture<'_, Result<(), ClientError>> {
        Box::pin(async move {
            self.ensure_alive()?;
            self.events.emit(ClientEvent::Authenticated);
            self.events.emit(ClientEvent::Ready);
            Ok(())
        })
    }

    fn send_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(async move {
            self.ensure_alive()?;
            info!(%chat_id, body_length = body.chars().count(), "loopback delivery");
            Ok(())
        })
    }

    fn send_presence_available(&self) -> BoxFuture<'_, Result<(), ClientError>> {
        Box::pin(async move { self.ensure_alive() })
    }

    fn destroy(&self) -> BoxFuture<'_, Result<(), ClientError>> {
        Box::pin(async move {
            self.destroyed.store(true, Ordering::Release);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::{ClientLifecycle, DispatchGateway, LifecycleSettings};
    use crate::domain::{ClientState, MessageText, PhoneNumber};

    #[tokio::test]
    async fn loopback_pairs_on_initialize_and_accepts_sends() {
        let lifecycle = ClientLifecycle::start(
            Arc::new(LoopbackFactory::default()),
            LifecycleSettings::default(),
        )
        .unwrap();
        lifecycle.initialize().await.unwrap();

        let mut rx = lifecycle.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| *s == ClientState::Ready))
            .await
            .unwrap()
            .unwrap();

        let gateway = DispatchGateway::new(lifecycle.clone());
        let number = PhoneNumber::parse("081234567890").unwrap();
        let message = MessageText::new("halo").unwrap();
        let result = gateway.send(&number, &message).await.unwrap();
        assert_eq!(result.number, number);

        lifecycle.destroy().await.unwrap();
    }

    #[tokio::test]
    async fn destroyed_loopback_rejects_sends() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let client = LoopbackClient::new(EventSink::new(0, tx));
        client.destroy().await.unwrap();

        let chat_id = ChatId::new("6281234567890@c.us").unwrap();
        assert!(client.send_message(&chat_id, "halo").await.is_err());
        assert!(client.initialize().await.is_err());
    }
}
