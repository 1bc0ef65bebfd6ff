//! State shared between the request gateway and the navigation guard:
//! the pending redirect target and the "login redirect issued" latch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::navigation::Location;
use crate::session::SessionPersistence;

/// Something that can report the current view and send the user to login.
///
/// Implemented by the navigator; the gateway only sees this seam.
pub trait LoginRedirector: Send + Sync {
    /// The location currently mounted, if any.
    fn current_location(&self) -> Option<Location>;

    /// Replace the current view with the login view. Returns `false` when
    /// login was already active.
    fn redirect_to_login(&self) -> bool;
}

/// Pending redirect target plus the one-shot session-loss latch.
///
/// The latch lives only in memory. The pending target is mirrored to
/// persistence when one is attached, so it survives until the next
/// sign-in even across process restarts.
#[derive(Default)]
pub struct RedirectState {
    pending: Mutex<Option<Location>>,
    redirect_issued: AtomicBool,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl RedirectState {
    /// Memory-only state.
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// State backed by persistence, starting from any target persisted
    /// earlier. An unreadable target is logged and discarded.
    pub fn restore(persistence: Arc<dyn SessionPersistence>) -> Self {
        let pending = match persistence.load_pending() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable pending redirect target");
                if let Err(e) = persistence.clear_pending() {
                    tracing::warn!(error = %e, "Failed to remove pending redirect target");
                }
                None
            }
        };
        if let Some(target) = &pending {
            tracing::debug!(target = %target, "Restored pending redirect target");
        }

        Self {
            pending: Mutex::new(pending),
            redirect_issued: AtomicBool::new(false),
            persistence: Some(persistence),
        }
    }

    /// Remember where the user was headed. Overwrites any earlier target.
    pub fn record(&self, target: Location) {
        tracing::debug!(target = %target, "Recording pending redirect target");
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save_pending(&target) {
                tracing::warn!(error = %e, "Failed to persist pending redirect target");
            }
        }
        *self.pending.lock() = Some(target);
    }

    pub fn pending(&self) -> Option<Location> {
        self.pending.lock().clone()
    }

    /// Consume the pending target. Subsequent calls return `None`, in
    /// this process and in any later one.
    pub fn take(&self) -> Option<Location> {
        let taken = self.pending.lock().take();
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.clear_pending() {
                tracing::warn!(error = %e, "Failed to clear persisted redirect target");
            }
        }
        taken
    }

    /// Trip the latch. Returns `true` only for the first caller since the
    /// last [`rearm`](Self::rearm).
    pub fn try_trip(&self) -> bool {
        !self.redirect_issued.swap(true, Ordering::AcqRel)
    }

    #[cfg(test)]
    pub fn is_tripped(&self) -> bool {
        self.redirect_issued.load(Ordering::Acquire)
    }

    /// Re-arm the latch once a new session exists.
    pub fn rearm(&self) {
        self.redirect_issued.store(false, Ordering::Release);
    }
}
