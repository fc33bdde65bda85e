use tracing::warn;

/// Process termination request: Ctrl+C everywhere, SIGTERM on unix.
///
/// Handlers are registered by [`Shutdown::register`] so a signal sent
/// before [`Shutdown::recv`] is awaited is not lost. A handler that cannot
/// be registered never fires; the other one still does.
pub struct Shutdown {
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
}

impl Shutdown {
    pub fn register() -> Self {
        #[cfg(unix)]
        let terminate = {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(sig) => Some(sig),
                Err(e) => {
                    warn!(error = %e, "failed to listen for SIGTERM");
                    None
                }
            }
        };
        Self {
            #[cfg(unix)]
            terminate,
        }
    }

    /// Resolves with the name of the first signal received.
    pub async fn recv(self) -> &'static str {
        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for SIGINT");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match self.terminate {
                Some(mut sig) => {
                    sig.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = interrupt => "SIGINT",
            _ = terminate => "SIGTERM",
        }
    }
}
