//! Background task registry
//!
//! Every entity owns one registry. Producer consumption is spawned through it
//! so the owner can wait for streams to finish or tear them down.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::{NachtError, Result};

#[derive(Debug)]
pub(crate) struct TaskRegistry {
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRegistry {
    pub(crate) fn new() -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn `fut` on the current Tokio runtime, racing it against shutdown.
    ///
    /// The handle list stays locked from the shutdown check to the push, so
    /// a concurrent [`shutdown`](Self::shutdown) either rejects the task or
    /// aborts it.
    pub(crate) fn spawn_cancellable<F>(&self, fut: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            NachtError::runtime(format!("cannot consume producers outside a runtime: {e}"))
        })?;

        let mut handles = self.handles.lock();
        if *self.shutdown_tx.borrow() {
            return Err(NachtError::runtime("entity was cancelled"));
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = runtime.spawn(async move {
            tokio::pin!(fut);
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    // Registry dropped without a shutdown: run to completion.
                    if changed.is_err() {
                        fut.await;
                    }
                }
                _ = &mut fut => {}
            }
        });

        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        Ok(())
    }

    /// Number of spawned tasks that have not finished.
    pub(crate) fn pending(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every spawned task, including ones spawned while waiting.
    pub(crate) async fn settle(&self) {
        loop {
            let drained: Vec<_> = self.handles.lock().drain(..).collect();
            if drained.is_empty() {
                return;
            }
            for handle in drained {
                if let Err(err) = handle.await {
                    if err.is_panic() {
                        tracing::error!("producer task panicked: {err}");
                    }
                }
            }
        }
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    pub(crate) fn shutdown(&self) {
        let mut handles = self.handles.lock();
        let _ = self.shutdown_tx.send(true);
        for handle in handles.drain(..) {
            handle.abort();
        }
    }
}
