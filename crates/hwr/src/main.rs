use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use hwr_core::{
    config::{check_tokens, load_dotenv, Config},
    poller::Poller,
};
use hwr_practicum::PracticumClient;
use hwr_telegram::TelegramMessenger;

#[tokio::main]
async fn main() -> Result<(), hwr_core::Error> {
    // `.env` may carry RUST_LOG, so it has to land before the subscriber reads it.
    load_dotenv();
    hwr_core::logging::init("hwr")?;

    let cfg = Config::load()?;
    if !check_tokens(&cfg.credentials) {
        return Err(hwr_core::Error::Config(format!(
            "missing required tokens: {}",
            cfg.credentials.missing().join(", ")
        )));
    }
    let chat_id = cfg.chat_id()?;

    let source = Arc::new(PracticumClient::new(
        cfg.endpoint.clone(),
        cfg.credentials.practicum_token.clone(),
        cfg.request_timeout,
    )?);
    let messenger = Arc::new(TelegramMessenger::new(
        cfg.credentials.telegram_token.clone(),
    ));
    messenger.log_identity().await;

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let mut poller = Poller::from_config(&cfg, chat_id, source, messenger);
    poller.run_forever(shutdown).await;

    Ok(())
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown requested");
    shutdown.cancel();
}
