use crate::backend::SharedBackend;
use crate::models::{Journal, Session};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(700);

/// Debounced autosave for one session.
///
/// Every scheduled journal restarts the quiet-period timer; when it expires the
/// newest journal is written in full. Writes run one at a time on the worker
/// task, so a slow save can never land after a newer one.
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Arc<Journal>>,
    last_saved: watch::Receiver<Option<DateTime<Utc>>>,
    worker: JoinHandle<()>,
}

impl SyncHandle {
    pub fn spawn(backend: SharedBackend, session: Session, window: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (saved_tx, last_saved) = watch::channel(None);
        let worker = tokio::spawn(run_worker(backend, session, window, rx, saved_tx));
        Self {
            tx,
            last_saved,
            worker,
        }
    }

    pub fn schedule(&self, journal: Arc<Journal>) {
        if self.tx.send(journal).is_err() {
            error!("autosave worker is gone, change not scheduled");
        }
    }

    /// Time of the last successful save, if any.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        *self.last_saved.borrow()
    }

    /// Writes any pending change immediately and stops the worker.
    pub async fn shutdown(self) {
        let Self { tx, worker, .. } = self;
        drop(tx);
        if let Err(err) = worker.await {
            error!("autosave worker panicked: {err}");
        }
    }
}

async fn run_worker(
    backend: SharedBackend,
    session: Session,
    window: Duration,
    mut rx: mpsc::UnboundedReceiver<Arc<Journal>>,
    saved_tx: watch::Sender<Option<DateTime<Utc>>>,
) {
    while let Some(mut latest) = rx.recv().await {
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(journal) => latest = journal,
                    None => break,
                },
                _ = sleep(window) => break,
            }
        }

        match backend
            .upsert_user_state(&session, &session.user_id, &latest)
            .await
        {
            Ok(()) => {
                debug!(user_id = %session.user_id, "journal saved");
                saved_tx.send_replace(Some(Utc::now()));
            }
            Err(err) => error!(user_id = %session.user_id, "failed to save journal: {err}"),
        }
    }
    info!(user_id = %session.user_id, "autosave stopped");
}
