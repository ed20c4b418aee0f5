use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use eyre::{Result, WrapErr};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use chain_events::chains::create_listener;
use chain_events::config::AppConfig;
use chain_events::handlers::{HandlerChain, LoggingHandler, WebhookHandler};
use chain_events::listener::AnyListener;
use chain_events::pipeline::DiscoverReconnectRange;
use chain_events::state::ChainState;

const PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let file_appender = tracing_appender::rolling::daily("logs", "chain-events.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting chain event listeners");

    let config = AppConfig::new().wrap_err("failed to load config")?;
    info!(
        listeners = config.listeners.len(),
        webhook = !config.handlers.webhook_url.is_empty(),
        "Configuration loaded"
    );

    let state = Arc::new(ChainState::new());
    let mut handlers = HandlerChain::new().with(state.clone());
    if config.handlers.log_events {
        handlers.push(Arc::new(LoggingHandler::new(
            config
                .listeners
                .iter()
                .filter(|l| l.verbose)
                .map(|l| l.chain.clone()),
        )));
    }
    if !config.handlers.webhook_url.is_empty() || config.handlers.telegram_bot_token.is_some() {
        handlers.push(Arc::new(WebhookHandler::new(config.handlers.clone())));
    }

    let discover: Arc<dyn DiscoverReconnectRange> = state.clone();
    let mut listeners: Vec<Box<dyn AnyListener>> = Vec::new();
    for listener_config in &config.listeners {
        let mut listener = match create_listener(listener_config, handlers.clone(), Some(discover.clone())) {
            Ok(listener) => listener,
            Err(e) => {
                error!(chain = %listener_config.chain, "Skipping listener: {e}");
                continue;
            }
        };
        if let Err(e) = listener.init().await {
            error!(chain = %listener_config.chain, "Failed to initialize listener: {e}");
            continue;
        }
        if let Err(e) = listener.subscribe().await {
            error!(chain = %listener_config.chain, "Failed to subscribe: {e}");
            continue;
        }
        info!(chain = %listener_config.chain, network = %listener.network(), "Listener running");
        listeners.push(listener);
    }

    if listeners.is_empty() {
        warn!("No listeners running");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                for listener in &listeners {
                    if let Some(progress) = state.progress(listener.chain()) {
                        info!(
                            chain = listener.chain(),
                            last_block = progress.last_block,
                            events = progress.events,
                            "Progress"
                        );
                    }
                }
            }
        }
    }

    info!("Shutting down");
    for listener in &mut listeners {
        listener.unsubscribe();
    }
    Ok(())
}
