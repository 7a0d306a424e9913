//! Debounce timer for the interactive path.
//!
//! A [`DebounceDriver`] owns a background task that coalesces submitted
//! payloads and emits only the most recent one once the window stays
//! quiet. The same primitive drives AST sync (payload: the view document)
//! and auto-save (payload: a save marker).

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

enum DriverMessage<T> {
    Payload(T),
    Cancel,
}

/// Last-write-wins debounce over a background tokio task.
pub struct DebounceDriver<T: Send + 'static> {
    tx: mpsc::UnboundedSender<DriverMessage<T>>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> DebounceDriver<T> {
    /// Spawn the driver. Coalesced payloads are delivered on `commit`
    /// after `delay` of quiet.
    pub fn spawn(delay: Duration, commit: mpsc::UnboundedSender<T>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<DriverMessage<T>>();

        let handle = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            loop {
                match pending.take() {
                    Some(payload) => {
                        tokio::select! {
                            message = rx.recv() => match message {
                                // Newer payload wins; the window resets
                                Some(DriverMessage::Payload(next)) => pending = Some(next),
                                Some(DriverMessage::Cancel) => pending = None,
                                None => break,
                            },
                            _ = tokio::time::sleep(delay) => {
                                if commit.send(payload).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    None => match rx.recv().await {
                        Some(DriverMessage::Payload(payload)) => pending = Some(payload),
                        Some(DriverMessage::Cancel) => {}
                        None => break,
                    },
                }
            }
        });

        Self { tx, handle }
    }

    /// Submit a payload; replaces anything still pending.
    pub fn submit(&self, payload: T) {
        let _ = self.tx.send(DriverMessage::Payload(payload));
    }

    /// Drop the pending payload without committing it.
    pub fn cancel(&self) {
        let _ = self.tx.send(DriverMessage::Cancel);
    }

    /// Stop the driver; anything still pending is discarded.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}
