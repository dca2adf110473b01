use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{
    ClientError, ClientEvent, ClientFactory, EventSink, IncomingMessage, MessagingClient,
    TaggedEvent,
};
use crate::domain::ClientState;

/// Pause between tearing down a disconnected client and initializing its replacement.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// How often a ready client announces presence.
pub const DEFAULT_PRESENCE_INTERVAL: Duration = Duration::from_secs(2 * 60);

const PING_COMMAND: &str = "!ping";
const PING_REPLY: &str = "pong";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Timing knobs of [`ClientLifecycle`].
pub struct LifecycleSettings {
    pub reconnect_delay: Duration,
    pub presence_interval: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            presence_interval: DEFAULT_PRESENCE_INTERVAL,
        }
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`ClientLifecycle`].
pub enum LifecycleError {
    /// The lifecycle spawns background tasks and must start inside a Tokio runtime.
    #[error("client lifecycle requires an active Tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    /// [`ClientLifecycle::destroy`] already ran.
    #[error("client lifecycle has been destroyed")]
    Destroyed,

    #[error("failed to initialize messaging client: {0}")]
    Initialize(#[source] ClientError),

    #[error("failed to destroy messaging client: {0}")]
    Destroy(#[source] ClientError),
}

#[derive(Clone)]
/// Owner of the external messaging client handle.
///
/// Tracks [`ClientState`] from the client's events and, when the client reports
/// a disconnect, destroys the handle, builds a replacement through the
/// [`ClientFactory`], waits [`LifecycleSettings::reconnect_delay`], and
/// initializes it again. Recovery repeats until an initialize succeeds.
///
/// Cloning is cheap; all clones share the same handle and state.
pub struct ClientLifecycle {
    inner: Arc<LifecycleInner>,
}

struct LifecycleInner {
    factory: Arc<dyn ClientFactory>,
    settings: LifecycleSettings,
    state: watch::Sender<ClientState>,
    shutdown: watch::Sender<bool>,
    current: Mutex<CurrentClient>,
    events: mpsc::UnboundedSender<TaggedEvent>,
    recover: Notify,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Clone)]
struct CurrentClient {
    generation: u64,
    client: Arc<dyn MessagingClient>,
}

impl ClientLifecycle {
    /// Create the first client handle and spawn the event, recovery, and presence tasks.
    ///
    /// The client is not initialized yet; call [`ClientLifecycle::initialize`].
    pub fn start(
        factory: Arc<dyn ClientFactory>,
        settings: LifecycleSettings,
    ) -> Result<Self, LifecycleError> {
        if settings.presence_interval.is_zero() {
            return Err(LifecycleError::ZeroInterval("presence interval"));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(LifecycleError::NoRuntime)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let client = factory.create(EventSink::new(0, events_tx.clone()));
        let (state, _) = watch::channel(ClientState::Uninitialized);
        let (shutdown, _) = watch::channel(false);

        let inner = Arc::new(LifecycleInner {
            factory,
            settings,
            state,
            shutdown,
            current: Mutex::new(CurrentClient {
                generation: 0,
                client,
            }),
            events: events_tx,
            recover: Notify::new(),
            tasks: Mutex::new(Vec::new()),
        });

        let tasks = vec![
            runtime.spawn(run_event_loop(Arc::clone(&inner), events_rx)),
            runtime.spawn(run_recovery_worker(Arc::clone(&inner))),
            runtime.spawn(run_presence_loop(Arc::clone(&inner))),
        ];
        lock(&inner.tasks).extend(tasks);

        Ok(Self { inner })
    }

    /// Initialize the current client handle.
    ///
    /// Moves the state to [`ClientState::Initializing`]; the state becomes
    /// [`ClientState::Ready`] only once the client emits its `ready` event.
    pub async fn initialize(&self) -> Result<(), LifecycleError> {
        self.inner.initialize().await
    }

    /// Stop background tasks and tear down the client handle.
    ///
    /// The lifecycle cannot be initialized again afterwards.
    pub async fn destroy(&self) -> Result<(), LifecycleError> {
        self.inner.shutdown.send_replace(true);
        let tasks = std::mem::take(&mut *lock(&self.inner.tasks));
        for task in tasks {
            let _ = task.await;
        }

        let current = self.inner.current();
        let result = current.client.destroy().await;
        self.inner.set_state(ClientState::Uninitialized);
        info!(generation = current.generation, "messaging client destroyed");
        result.map_err(LifecycleError::Destroy)
    }

    pub fn state(&self) -> ClientState {
        *self.inner.state.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.inner.state.subscribe()
    }

    /// Generation of the current handle; bumped on every replacement.
    pub fn generation(&self) -> u64 {
        self.inner.current().generation
    }

    pub(crate) fn client(&self) -> Arc<dyn MessagingClient> {
        self.inner.current().client
    }
}

impl LifecycleInner {
    fn current(&self) -> CurrentClient {
        lock(&self.current).clone()
    }

    fn set_state(&self, next: ClientState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "client state changed");
        }
    }

    fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    async fn initialize(&self) -> Result<(), LifecycleError> {
        if self.is_shut_down() {
            return Err(LifecycleError::Destroyed);
        }

        let current = self.current();
        self.set_state(ClientState::Initializing);
        info!(generation = current.generation, "initializing messaging client");

        if let Err(err) = current.client.initialize().await {
            self.state.send_if_modified(|state| {
                if *state == ClientState::Initializing {
                    *state = ClientState::Uninitialized;
                    true
                } else {
                    false
                }
            });
            return Err(LifecycleError::Initialize(err));
        }
        Ok(())
    }

    fn handle_event(&self, tagged: TaggedEvent) {
        let current = self.current();
        if tagged.generation != current.generation {
            debug!(
                generation = tagged.generation,
                current = current.generation,
                "ignoring event from replaced client"
            );
            return;
        }

        match tagged.event {
            ClientEvent::Qr(code) => {
                info!(%code, "QR code generated, scan it with your phone");
            }
            ClientEvent::Authenticated => info!("authenticated successfully"),
            ClientEvent::Ready => {
                info!(generation = current.generation, "messaging client is ready");
                self.set_state(ClientState::Ready);
            }
            ClientEvent::Message(message) => handle_incoming(current.client, message),
            ClientEvent::Disconnected(reason) => {
                let previous = self.state.send_replace(ClientState::Disconnected);
                if previous == ClientState::Disconnected {
                    debug!(%reason, "disconnect while already recovering");
                    return;
                }
                warn!(%reason, "messaging client disconnected");
                info!("attempting to auto reconnect");
                self.recover.notify_one();
            }
        }
    }

    /// Replace the client until one initializes. Unbounded; the delay is fixed.
    async fn reconnect_until_initialized(&self) {
        loop {
            let generation = self.replace_client().await;
            tokio::time::sleep(self.settings.reconnect_delay).await;

            info!(generation, "reinitializing messaging client");
            match self.initialize().await {
                Ok(()) => return,
                Err(LifecycleError::Destroyed) => return,
                Err(err) => {
                    error!(error = %err, "reinitialization failed, retrying");
                    self.set_state(ClientState::Disconnected);
                }
            }
        }
    }

    async fn replace_client(&self) -> u64 {
        let old = self.current();
        if let Err(err) = old.client.destroy().await {
            debug!(generation = old.generation, error = %err, "ignoring teardown failure");
        }

        let generation = old.generation + 1;
        let client = self
            .factory
            .create(EventSink::new(generation, self.events.clone()));
        *lock(&self.current) = CurrentClient { generation, client };
        generation
    }
}

fn handle_incoming(client: Arc<dyn MessagingClient>, message: IncomingMessage) {
    if message.body != PING_COMMAND {
        return;
    }

    debug!(from = %message.from, "answering ping");
    tokio::spawn(async move {
        if let Err(err) = client.send_message(&message.from, PING_REPLY).await {
            warn!(from = %message.from, error = %err, "failed to answer ping");
        }
    });
}

async fn run_event_loop(
    inner: Arc<LifecycleInner>,
    mut events: mpsc::UnboundedReceiver<TaggedEvent>,
) {
    let mut shutdown = inner.shutdown.subscribe();
    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            tagged = events.recv() => match tagged {
                Some(tagged) => inner.handle_event(tagged),
                None => break,
            },
        }
    }
}

async fn run_recovery_worker(inner: Arc<LifecycleInner>) {
    let mut shutdown = inner.shutdown.subscribe();
    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            _ = inner.recover.notified() => {}
        }
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            _ = inner.reconnect_until_initialized() => {}
        }
    }
}

async fn run_presence_loop(inner: Arc<LifecycleInner>) {
    let period = inner.settings.presence_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = inner.shutdown.subscribe();

    loop {
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            _ = ticker.tick() => {}
        }
        if !inner.is_ready() {
            continue;
        }

        let current = inner.current();
        tokio::select! {
            _ = stopped(&mut shutdown) => break,
            result = current.client.send_presence_available() => {
                if let Err(err) = result {
                    debug!(error = %err, "presence keep-alive failed");
                }
            }
        }
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopped| *stopped).await;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
