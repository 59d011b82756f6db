//! Watch progress reporter
//!
//! Every time update is posted as-is: no batching, no retry. Failures are
//! logged and dropped. Closing the reporter discards anything still queued.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::models::WatchProgress;

#[derive(Debug)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<WatchProgress>>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Start the posting task; it stops when `cancel` (or a parent) fires
    pub fn spawn(api: ApiClient, cancel: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WatchProgress>();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                let progress = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(p) => p,
                        None => break,
                    },
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    result = api.save_progress(&progress) => {
                        if let Err(e) = result {
                            tracing::warn!(
                                movie = %progress.movie_id,
                                at = progress.current_time,
                                error = %e,
                                "dropping watch progress"
                            );
                        }
                    }
                }
            }
            tracing::debug!(dropped = rx.len(), "progress reporter stopped");
        });
        Self {
            tx: Some(tx),
            cancel,
            handle: Some(handle),
        }
    }

    /// Queue one record; ignored once closed
    pub fn report(&self, progress: WatchProgress) {
        if self.cancel.is_cancelled() {
            return;
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(progress);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop without flushing the queue
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Close and wait for the task to exit
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Stop accepting records and wait for the queue to drain (CLI one-shots)
    pub async fn finish(mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
