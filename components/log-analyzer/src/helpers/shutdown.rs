// External crates
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Run-wide stop signal.
///
/// - Ingestion loops hold a child token from `.token()` and stop between
///   lines once it is cancelled.
/// - `.listen_for_ctrl_c()` cancels it on SIGINT so a partial report can
///   still be rendered.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Fresh, untriggered shutdown signal.
    #[instrument(
        name = "log_analyzer_shutdown_channel",
        target = "helpers::shutdown",
        level = "trace"
    )]
    pub fn new() -> Self {
        tracing::trace!("Creating new shutdown token");
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Returns a child token for one ingestion task
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger shutdown, every child token is cancelled
    #[instrument(
        name = "log_analyzer_shutdown_trigger",
        target = "helpers::shutdown",
        level = "trace",
        skip(self)
    )]
    pub fn trigger(&self) {
        tracing::trace!("Shutdown triggered, cancelling ingestion");
        self.token.cancel();
    }

    /// Whether shutdown was triggered.
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn a task that triggers shutdown on Ctrl-C. The task exits on
    /// its own once shutdown was triggered some other way.
    pub fn listen_for_ctrl_c(&self) {
        let shutdown = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.token.cancelled() => {}
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::warn!("Interrupted, finishing with the lines read so far");
                        shutdown.trigger();
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                    }
                },
            }
        });
    }
}
