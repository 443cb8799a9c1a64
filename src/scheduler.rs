//! Delayed, best-effort deletion of transient UI messages.
//!
//! Result lists and poster photos are only useful for a short while. After
//! rendering them the controller hands their ids to the
//! [`EphemeralMessageScheduler`], which deletes them later from an
//! independent task. A failed deletion (message already gone, bot removed
//! from the chat) is logged and forgotten.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use crate::messenger::Messenger;
use crate::session::{ConversationId, MessageId};

/// How long transient result messages stay visible.
pub const MESSAGE_TTL: Duration = Duration::from_secs(60);

/// Spawns fire-and-forget deletions against a [`Messenger`].
#[derive(Clone)]
pub struct EphemeralMessageScheduler {
    messenger: Arc<dyn Messenger>,
}

impl std::fmt::Debug for EphemeralMessageScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralMessageScheduler").finish_non_exhaustive()
    }
}

impl EphemeralMessageScheduler {
    #[must_use]
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Deletes `message` after `delay` without blocking the caller.
    ///
    /// The returned handle may be dropped; the deletion still runs.
    pub fn schedule_deletion(
        &self,
        conversation: ConversationId,
        message: MessageId,
        delay: Duration,
    ) -> JoinHandle<()> {
        let messenger = Arc::clone(&self.messenger);
        let span = info_span!("scheduled_delete", %conversation, %message);
        tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                match messenger.delete_message(conversation, message).await {
                    Ok(()) => debug!("deleted transient message"),
                    Err(e) => warn!(error = %e, "failed to delete transient message"),
                }
            }
            .instrument(span),
        )
    }
}
