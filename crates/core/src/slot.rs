// crates/core/src/slot.rs
//! The single in-flight request slot per panel instance.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// Holds at most one live [`CancellationToken`]. Beginning a new fetch
/// cancels the predecessor before handing out a fresh token, so a panel can
/// never have two outstanding requests.
#[derive(Debug, Default)]
pub struct RequestSlot {
    current: Mutex<Option<CancellationToken>>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any previous token and install a fresh one.
    pub fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut current = self.current.lock().expect("request slot lock");
        if let Some(previous) = current.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Clear the slot when `token`'s fetch settled. A superseded token is
    /// already cancelled by then and must not evict its successor.
    pub fn finish(&self, token: &CancellationToken) {
        let mut current = self.current.lock().expect("request slot lock");
        if !token.is_cancelled() {
            *current = None;
        }
    }

    /// Whether a fetch is currently in flight.
    pub fn has_live(&self) -> bool {
        self.current
            .lock()
            .expect("request slot lock")
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Cancel whatever is in flight (panel removal).
    pub fn abort(&self) {
        let token = self.current.lock().expect("request slot lock").take();
        if let Some(token) = token {
            token.cancel();
        }
    }
}

impl Drop for RequestSlot {
    fn drop(&mut self) {
        if let Ok(mut current) = self.current.lock() {
            if let Some(token) = current.take() {
                token.cancel();
            }
        }
    }
}
