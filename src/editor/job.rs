//! Handle to a running export.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::editor::notify::{Notification, NotificationKind, Notifications};
use crate::error::{AnimateError, Result};
use crate::export::pipeline::ExportArtifact;

/// Holds the editor's export-in-progress flag; clears it when dropped,
/// whether the export finished, failed or was aborted.
#[derive(Debug)]
pub(crate) struct ExportGuard(Arc<AtomicBool>);

impl ExportGuard {
    pub(crate) fn acquire(flag: &Arc<AtomicBool>) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AnimateError::ExportInProgress)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub(crate) fn post(notifications: &Mutex<Notifications>, message: impl Into<String>, kind: NotificationKind) {
    notifications
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .post(Notification::new(message, kind));
}

#[derive(Debug)]
pub struct ExportJob {
    handle: JoinHandle<Result<ExportArtifact>>,
    notifications: Arc<Mutex<Notifications>>,
}

impl ExportJob {
    pub(crate) fn new(
        handle: JoinHandle<Result<ExportArtifact>>,
        notifications: Arc<Mutex<Notifications>>,
    ) -> Self {
        Self {
            handle,
            notifications,
        }
    }

    /// Abort the export. No effect once the export has finished; `wait`
    /// then still yields the artifact.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the artifact.
    pub async fn wait(self) -> Result<ExportArtifact> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                post(&self.notifications, "Export cancelled", NotificationKind::Info);
                log::info!("[EXPORT] Cancelled");
                Err(AnimateError::ExportCancelled)
            }
            Err(e) => Err(AnimateError::Internal(format!("export task failed: {}", e))),
        }
    }
}
