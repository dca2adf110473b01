//! Scripted messaging client shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BoxFuture, ClientError, ClientEvent, ClientFactory, EventSink, MessagingClient};
use crate::domain::ChatId;

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBehavior {
    /// Emit `authenticated` + `ready` from `initialize`.
    pub(crate) auto_ready: bool,
    pub(crate) init_error: Option<String>,
    pub(crate) send_delay: Duration,
    pub(crate) send_error: Option<String>,
    pub(crate) presence_error: bool,
    /// `send_presence_available` never resolves.
    pub(crate) presence_hangs: bool,
    pub(crate) destroy_error: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    behavior: FakeBehavior,
    sinks: Vec<EventSink>,
    initialized: usize,
    destroyed: usize,
    presence: usize,
    send_attempts: usize,
    sent: Vec<(ChatId, String)>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeFactory {
    state: Arc<Mutex<FakeState>>,
}

impl FakeFactory {
    pub(crate) fn new(behavior: FakeBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                behavior,
                ..Default::default()
            })),
        }
    }

    pub(crate) fn set_behavior(&self, behavior: FakeBehavior) {
        self.state.lock().unwrap().behavior = behavior;
    }

    /// Emit `event` from the most recently created handle.
    pub(crate) fn emit(&self, event: ClientEvent) {
        let sink = self.state.lock().unwrap().sinks.last().cloned().unwrap();
        assert!(sink.emit(event), "lifecycle stopped listening");
    }

    /// Emit `event` from the handle created for `generation`.
    pub(crate) fn emit_from(&self, generation: u64, event: ClientEvent) {
        let sink = self
            .state
            .lock()
            .unwrap()
            .sinks
            .iter()
            .find(|sink| sink.generation() == generation)
            .cloned()
            .unwrap();
        sink.emit(event);
    }

    pub(crate) fn created(&self) -> usize {
        self.state.lock().unwrap().sinks.len()
    }

    pub(crate) fn initialized(&self) -> usize {
        self.state.lock().unwrap().initialized
    }

    pub(crate) fn destroyed(&self) -> usize {
        self.state.lock().unwrap().destroyed
    }

    pub(crate) fn presence(&self) -> usize {
        self.state.lock().unwrap().presence
    }

    pub(crate) fn send_attempts(&self) -> usize {
        self.state.lock().unwrap().send_attempts
    }

    pub(crate) fn sent(&self) -> Vec<(ChatId, String)> {
        self.state.lock().unwrap().sent.clone()
    }
}

impl ClientFactory for FakeFactory {
    fn create(&self, events: EventSink) -> Arc<dyn MessagingClient> {
        self.state.lock().unwrap().sinks.push(events.clone());
        Arc::new(FakeClient {
            events,
            state: Arc::clone(&self.state),
        })
    }
}

struct FakeClient {
    events: EventSink,
    state: Arc<Mutex<FakeState>>,
}

impl MessagingClient for FakeClient {
    fn initialize(&self) -> BoxFuture<'_, Result<(), ClientError>> {
        Box::pin(async move {
            let behavior = {
                let mut state = self.state.lock().unwrap();
                state.initialized += 1;
                state.behavior.clone()
            };
            if let Some(message) = behavior.init_error {
                return Err(message.into());
            }
            if behavior.auto_ready {
                self.events.emit(ClientEvent::Authenticated);
                self.events.emit(ClientEvent::Ready);
            }
            Ok(())
        })
    }

    fn send_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        body: &'a str,
    ) -> BoxFuture<'a, Result<(), ClientError>> {
        Box::pin(async move {
            let behavior = {
                let mut state = self.state.lock().unwrap();
                state.send_attempts += 1;
                state.behavior.clone()
            };
            if !behavior.send_delay.is_zero() {
                tokio::time::sleep(behavior.send_delay).await;
            }
            if let Some(message) = behavior.send_error {
                return Err(message.into());
            }
            self.state
                .lock()
                .unwrap()
                .sent
                .push((chat_id.clone(), body.to_owned()));
            Ok(())
        })
    }

    fn send_presence_available(&self) -> BoxFuture<'_, Result<(), ClientError>> {
        Box::pin(async move {
            let behavior = {
                let mut state = self.state.lock().unwrap();
                state.presence += 1;
                state.behavior.clone()
            };
            if behavior.presence_hangs {
                std::future::pending::<()>().await;
            }
            if behavior.presence_error {
                return Err("presence rejected".into());
            }
            Ok(())
        })
    }

    fn destroy(&self) -> BoxFuture<'_, Result<(), ClientError>> {
        Box::pin(async move {
            let failing = {
                let mut state = self.state.lock().unwrap();
                state.destroyed += 1;
                state.behavior.destroy_error
            };
            if failing {
                return Err("browser already closed".into());
            }
            Ok(())
        })
    }
}
