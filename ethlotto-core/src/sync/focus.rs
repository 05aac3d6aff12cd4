use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Whether the consumer is in the foreground and wants fresh data.
#[async_trait]
pub trait FocusState: Send + Sync {
    fn is_focused(&self) -> bool;

    /// Resolves once the consumer is focused (immediately if it already is).
    async fn focused(&self);
}

/// Focus flag toggled by the front-end.
#[derive(Clone)]
pub struct Focus {
    tx: Arc<watch::Sender<bool>>,
}

impl Focus {
    pub fn new(focused: bool) -> Self {
        let (tx, _rx) = watch::channel(focused);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_focused(&self, focused: bool) {
        let previous = self.tx.send_replace(focused);
        if previous != focused {
            tracing::debug!(focused, "Focus changed");
        }
    }
}

impl Default for Focus {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl FocusState for Focus {
    fn is_focused(&self) -> bool {
        *self.tx.borrow()
    }

    async fn focused(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            // the sender lives as long as `self`
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// For headless consumers that never go to the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFocused;

#[async_trait]
impl FocusState for AlwaysFocused {
    fn is_focused(&self) -> bool {
        true
    }

    async fn focused(&self) {}
}
