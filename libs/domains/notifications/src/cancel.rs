//! Cooperative cancellation for dispatch operations.
//!
//! A [`CancelSignal`] wraps a `watch::Receiver<bool>`, the same channel shape
//! workers use for shutdown. Every awaited collaborator call is raced against
//! it through [`CancelSignal::run`].

use crate::error::{NotificationError, NotifyResult};
use std::future::Future;
use tokio::sync::watch;

/// Create a linked handle/signal pair.
pub fn channel() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal::new(rx))
}

/// Owner side of a cancellation channel.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every clone of the paired signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal::new(self.tx.subscribe())
    }
}

/// Observer side of a cancellation channel.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx: Some(rx) }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is requested.
    ///
    /// A dropped handle that never cancelled leaves this pending forever.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };

        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Await `fut` unless cancellation wins the race.
    pub async fn run<T, E, F>(&self, fut: F) -> NotifyResult<T>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<NotificationError>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(NotificationError::Cancelled),
            result = fut => result.map_err(Into::into),
        }
    }
}
