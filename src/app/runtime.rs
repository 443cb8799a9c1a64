use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use tunefetch_core::messenger::TelegramMessenger;
use tunefetch_core::messenger::telegram::LONG_POLL_SECS;
use tunefetch_core::{ConversationController, DownloadOrchestrator, Messenger, SpotifyCatalog};

use crate::config::BotConfig;

const INITIAL_POLL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_POLL_BACKOFF: Duration = Duration::from_secs(30);

/// Wires the adapters together and serves updates until Ctrl-C.
pub(crate) async fn run_bot(config: BotConfig) -> Result<()> {
    let telegram = Arc::new(TelegramMessenger::new(config.bot_token.as_str())?);
    let catalog = Arc::new(SpotifyCatalog::new(
        config.spotify_client_id.as_str(),
        config.spotify_client_secret.as_str(),
    )?);
    let downloader = Arc::new(DownloadOrchestrator::new(config.downloader.clone()));
    let controller = Arc::new(ConversationController::new(
        Arc::clone(&telegram) as Arc<dyn Messenger>,
        catalog,
        downloader,
        config.controller,
    ));

    info!(
        downloader = %config.downloader.program.display(),
        "TuneFetch bot started"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut offset: Option<i64> = None;
    let mut backoff = INITIAL_POLL_BACKOFF;
    loop {
        let polled = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                return Ok(());
            }
            polled = telegram.get_updates(offset, LONG_POLL_SECS) => polled,
        };

        let updates = match polled {
            Ok(updates) => {
                backoff = INITIAL_POLL_BACKOFF;
                updates
            }
            Err(e) => {
                warn!(error = %e, retry_in_secs = backoff.as_secs(), "polling failed");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_POLL_BACKOFF);
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            let Some(event) = update.into_event() else {
                debug!("ignoring unsupported update");
                continue;
            };
            let controller = Arc::clone(&controller);
            tokio::spawn(async move {
                controller.handle(event).await;
            });
        }
    }
}
