use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::renderer::CancelToken;

/// Render status as seen by observers. `None` on the channel means no pass
/// is running: either it finished or it was cancelled.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub message: String,
    pub is_cancelled: bool,
    pub completed: bool,
}

/// Write side of the progress channel.
///
/// A sink scoped to a pass (see [`ProgressSink::scoped`]) drops every write
/// once that pass is cancelled, so a stale pass can never overwrite the
/// status of the pass that replaced it.
#[derive(Clone, Debug)]
pub struct ProgressSink {
    tx: Arc<watch::Sender<Option<Progress>>>,
    token: Option<CancelToken>,
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            token: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Progress>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Progress> {
        self.tx.borrow().clone()
    }

    /// Same channel, writes gated on `token`.
    pub fn scoped(&self, token: CancelToken) -> Self {
        Self {
            tx: self.tx.clone(),
            token: Some(token),
        }
    }

    fn is_stale(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Apply `f` unless the pass is stale. The staleness check runs under
    /// the channel's write lock, so it cannot interleave with another write.
    fn write(&self, f: impl FnOnce(&mut Option<Progress>) -> bool) {
        self.tx.send_if_modified(|p| !self.is_stale() && f(p));
    }

    /// Fresh record for a new pass.
    pub fn start(&self) {
        self.write(|p| {
            *p = Some(Progress::default());
            true
        });
    }

    /// Update the message of the running pass; no-op when nothing runs.
    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.write(|p| match p {
            Some(p) => {
                p.message = message;
                true
            }
            None => false,
        });
    }

    /// Terminal failure: the record stays visible with the reason.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.write(|p| {
            *p = Some(Progress {
                message: reason,
                is_cancelled: false,
                completed: true,
            });
            true
        });
    }

    /// Drop the record. Used on completion and on cancellation.
    pub fn clear(&self) {
        self.write(|p| {
            *p = None;
            true
        });
    }
}
