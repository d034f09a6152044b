//! Process shutdown signals

use std::fmt;

use tracing::{debug, warn};

/// Signal that ended [`wait_for_shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    CtrlC,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::CtrlC => write!(f, "Ctrl+C"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Resolve on Ctrl+C, or on SIGTERM where supported
pub async fn wait_for_shutdown() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                None
            },
        };

        let received = tokio::select! {
            _ = ctrl_c() => ShutdownSignal::CtrlC,
            _ = async {
                match terminate.as_mut() {
                    Some(sig) => { sig.recv().await; },
                    None => std::future::pending::<()>().await,
                }
            } => ShutdownSignal::Terminate,
        };
        debug!("Shutdown signal: {}", received);
        received
    }
    #[cfg(not(unix))]
    {
        ctrl_c().await;
        ShutdownSignal::CtrlC
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler only SIGTERM can end the wait
        warn!("Ctrl+C handler unavailable: {}", e);
        std::future::pending::<()>().await
    }
}
