use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use super::{AppState, build_router};
use crate::client::{ClientFactory, ClientLifecycle, DispatchGateway};
use crate::config::AppConfig;
use crate::transport::start_keepalive_ping;

/// Serve the HTTP API until SIGINT/SIGTERM, then tear the messaging client down.
///
/// Binds the listener first so requests arriving during pairing get `503`
/// instead of a refused connection. A failed initial `initialize` is fatal;
/// later disconnects are recovered by the lifecycle.
pub async fn run(config: AppConfig, factory: Arc<dyn ClientFactory>) -> Result<()> {
    serve_until(config, factory, shutdown_signal()).await
}

/// [`run`] with the shutdown trigger supplied by the caller.
///
/// A failed teardown of the messaging client is returned as an error even
/// when the server itself stopped cleanly.
pub async fn serve_until<F>(
    config: AppConfig,
    factory: Arc<dyn ClientFactory>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound listener address")?;
    info!(addr = %local_addr, port = local_addr.port(), "server is running");

    let lifecycle = ClientLifecycle::start(factory, config.lifecycle_settings())
        .context("failed to start messaging client lifecycle")?;
    let gateway = DispatchGateway::new(lifecycle.clone()).with_timeout(config.send_timeout());
    let mut keepalive =
        start_keepalive_ping(config.server_url.as_ref(), config.keepalive_interval())
            .context("failed to start keep-alive ping")?;

    let app = build_router(Arc::new(AppState::new(gateway)));
    let mut server = tokio::spawn(async move { axum::serve(listener, app).await });

    if let Err(err) = lifecycle.initialize().await {
        server.abort();
        keepalive.shutdown().await;
        let _ = lifecycle.destroy().await;
        return Err(anyhow::Error::new(err).context("failed to initialize messaging client"));
    }

    let mut outcome = tokio::select! {
        joined = &mut server => match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(anyhow::Error::new(err).context("HTTP server failed")),
            Err(err) => Err(anyhow::Error::new(err).context("HTTP server task failed")),
        },
        signal = shutdown => signal,
    };

    // Stop accepting; in-flight requests are not drained.
    server.abort();
    keepalive.shutdown().await;
    if let Err(err) = lifecycle.destroy().await {
        warn!(error = %err, "messaging client teardown failed");
        if outcome.is_ok() {
            outcome =
                Err(anyhow::Error::new(err).context("failed to tear down messaging client"));
        }
    }
    if let Err(err) = &outcome {
        error!(error = %format!("{err:#}"), "server stopped with an error");
    } else {
        info!("server stopped");
    }
    outcome
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to register Ctrl+C handler")?;
    info!("received Ctrl+C, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::client::fake::{FakeBehavior, FakeFactory};

    #[tokio::test]
    async fn initialize_failure_is_fatal_and_tears_down() {
        let factory = FakeFactory::new(FakeBehavior {
            init_error: Some("Failed to launch the browser process".to_owned()),
            ..Default::default()
        });
        let config = AppConfig::try_parse_from(["wadispatch", "--port", "0"]).unwrap();

        let err = run(config, Arc::new(factory.clone())).await.unwrap_err();
        assert!(
            format!("{err:#}").contains("Failed to launch the browser process"),
            "{err:#}"
        );
        assert_eq!(factory.initialized(), 1);
        assert_eq!(factory.destroyed(), 1);
    }

    #[tokio::test]
    async fn clean_shutdown_tears_down_once() {
        let factory = FakeFactory::new(FakeBehavior {
            auto_ready: true,
            ..Default::default()
        });
        let config = AppConfig::try_parse_from(["wadispatch", "--port", "0"]).unwrap();

        serve_until(config, Arc::new(factory.clone()), async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(factory.initialized(), 1);
        assert_eq!(factory.destroyed(), 1);
    }

    #[tokio::test]
    async fn failed_teardown_at_shutdown_is_an_error() {
        let factory = FakeFactory::new(FakeBehavior {
            auto_ready: true,
            destroy_error: true,
            ..Default::default()
        });
        let config = AppConfig::try_parse_from(["wadispatch", "--port", "0"]).unwrap();

        let err = serve_until(config, Arc::new(factory.clone()), async { Ok(()) })
            .await
            .unwrap_err();
        assert!(
            format!("{err:#}").contains("failed to tear down messaging client"),
            "{err:#}"
        );
        assert_eq!(factory.destroyed(), 1);
    }

    #[tokio::test]
    async fn occupied_port_is_reported() {
        let taken = TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let config =
            AppConfig::try_parse_from(["wadispatch", "--port", &port.to_string()]).unwrap();

        let factory = FakeFactory::new(FakeBehavior::default());
        let err = run(config, Arc::new(factory.clone())).await.unwrap_err();
        assert!(err.to_string().contains("failed to bind"), "{err:#}");
        assert_eq!(factory.created(), 0);
    }
}
