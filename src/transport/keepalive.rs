use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use url::Url;

/// How often the keep-alive ping fires.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(4 * 60);

const PING_PATH: &str = "ping";
const PING_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum KeepAliveError {
    #[error("keep-alive ping requires an active Tokio runtime")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("keep-alive interval must be greater than zero")]
    ZeroInterval,

    #[error("invalid keep-alive url: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build keep-alive http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Handle of the background keep-alive ping task.
#[derive(Debug)]
pub struct KeepAliveHandle {
    target: Option<Url>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl KeepAliveHandle {
    fn disabled() -> Self {
        Self {
            target: None,
            shutdown_tx: None,
            task: None,
        }
    }

    /// URL being pinged, if the ping is enabled.
    pub fn target(&self) -> Option<&Url> {
        self.target.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub async fn shutdown(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// `<base>/ping`, keeping any path already present in `base`.
pub fn ping_url(base: &Url) -> Result<Url, url::ParseError> {
    Url::parse(&format!(
        "{}/{PING_PATH}",
        base.as_str().trim_end_matches('/')
    ))
}

/// Periodically GET `<base>/ping`, ignoring every failure.
///
/// Returns a disabled handle when `base` is `None`. Each ping runs detached so a
/// slow host never delays the next tick.
pub fn start_keepalive_ping(
    base: Option<&Url>,
    interval: Duration,
) -> Result<KeepAliveHandle, KeepAliveError> {
    let Some(base) = base else {
        return Ok(KeepAliveHandle::disabled());
    };
    if interval.is_zero() {
        return Err(KeepAliveError::ZeroInterval);
    }

    let runtime = tokio::runtime::Handle::try_current().map_err(KeepAliveError::NoRuntime)?;
    let target = ping_url(base)?;
    let client = reqwest::Client::builder()
        .timeout(PING_REQUEST_TIMEOUT)
        .build()
        .map_err(KeepAliveError::Client)?;

    info!(url = %target, interval = ?interval, "keep-alive ping enabled");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = runtime.spawn(run_keepalive_loop(
        client,
        target.clone(),
        interval,
        shutdown_rx,
    ));

    Ok(KeepAliveHandle {
        target: Some(target),
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

async fn run_keepalive_loop(
    client: reqwest::Client,
    target: Url,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {}
        }

        let request = client.get(target.clone());
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => debug!(status = %response.status(), "keep-alive ping sent"),
                Err(err) => debug!(error = %err, "keep-alive ping failed"),
            }
        });
    }
}
