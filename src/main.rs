use std::sync::Arc;

use wadispatch::client::LoopbackFactory;
use wadispatch::config::AppConfig;
use wadispatch::logging::init_tracing;

#[tokio::main]
async fn main() {
    let config = AppConfig::load();
    let guards = match init_tracing(&config.log_level, &config.log_dir) {
        Ok(guards) => guards,
        Err(err) => {
            eprintln!("failed to initialize logging: {err:#}");
            std::process::exit(1);
        }
    };
    install_panic_hook();

    if config.api_key.is_some() {
        tracing::info!("X_API_KEY configured (not enforced)");
    }

    let factory = Arc::new(LoopbackFactory::new(config.browser.clone()));
    if let Err(err) = wadispatch::server::run(config, factory).await {
        tracing::error!(error = %format!("{err:#}"), "server exited with an error");
        drop(guards);
        std::process::exit(1);
    }
}

/// Any panic is fatal: log it and exit with status 1.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(
            panic = %info,
            location = ?info.location(),
            "unhandled panic, terminating"
        );
        std::process::exit(1);
    }));
}
