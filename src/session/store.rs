//! Process-wide session storage.
//!
//! The session is either fully present (token plus optional cached
//! profile) or fully absent. Every reader goes through [`SessionStore`];
//! nothing keeps a private copy of the token.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
#[cfg(test)]
use parking_lot::Mutex;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConsoleError, ConsoleResult};
use crate::navigation::Location;

/// Cached summary of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub tenant_id: u64,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer credential.
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, profile: Option<UserProfile>) -> Self {
        Self {
            token: token.into(),
            profile,
            established_at: Utc::now(),
        }
    }
}

/// Backing store the session and the pending redirect target survive
/// restarts in. The two are stored and cleared independently.
pub trait SessionPersistence: Send + Sync {
    fn load(&self) -> ConsoleResult<Option<Session>>;
    fn save(&self, session: &Session) -> ConsoleResult<()>;
    fn clear(&self) -> ConsoleResult<()>;

    fn load_pending(&self) -> ConsoleResult<Option<Location>>;
    fn save_pending(&self, target: &Location) -> ConsoleResult<()>;
    fn clear_pending(&self) -> ConsoleResult<()>;
}

/// Persists the session as a JSON file, and the pending redirect target
/// in a sibling `*.pending.json` file.
pub struct FileSessionPersistence {
    path: PathBuf,
    pending_path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let pending_path = path.with_extension("pending.json");
        Self { path, pending_path }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ConsoleResult<Option<T>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ConsoleError::Persistence(format!("corrupt file {}: {}", path.display(), e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ConsoleResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

fn remove(path: &Path) -> ConsoleResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> ConsoleResult<Option<Session>> {
        read_json(&self.path)
    }

    fn save(&self, session: &Session) -> ConsoleResult<()> {
        write_json(&self.path, session)
    }

    fn clear(&self) -> ConsoleResult<()> {
        remove(&self.path)
    }

    fn load_pending(&self) -> ConsoleResult<Option<Location>> {
        read_json(&self.pending_path)
    }

    fn save_pending(&self, target: &Location) -> ConsoleResult<()> {
        write_json(&self.pending_path, target)
    }

    fn clear_pending(&self) -> ConsoleResult<()> {
        remove(&self.pending_path)
    }
}

/// In-memory persistence; survives a [`SessionStore`] being rebuilt but
/// not the process.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySessionPersistence {
    slot: Mutex<Option<Session>>,
    pending: Mutex<Option<Location>>,
}

#[cfg(test)]
impl MemorySessionPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl SessionPersistence for MemorySessionPersistence {
    fn load(&self) -> ConsoleResult<Option<Session>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, session: &Session) -> ConsoleResult<()> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ConsoleResult<()> {
        self.slot.lock().take();
        Ok(())
    }

    fn load_pending(&self) -> ConsoleResult<Option<Location>> {
        Ok(self.pending.lock().clone())
    }

    fn save_pending(&self, target: &Location) -> ConsoleResult<()> {
        *self.pending.lock() = Some(target.clone());
        Ok(())
    }

    fn clear_pending(&self) -> ConsoleResult<()> {
        self.pending.lock().take();
        Ok(())
    }
}

/// Shared handle to the single session of this process.
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    persistence: Arc<dyn SessionPersistence>,
}

impl SessionStore {
    /// Create an empty store backed by the given persistence.
    pub fn new(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            persistence,
        }
    }

    /// Create an empty store that persists nowhere but memory.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionPersistence::new()))
    }

    /// Create a store initialized from whatever was persisted.
    ///
    /// An unreadable session is logged, discarded, and treated as absent.
    pub fn restore(persistence: Arc<dyn SessionPersistence>) -> Self {
        let store = Self::new(persistence);
        match store.persistence.load() {
            Ok(Some(session)) if !session.token.is_empty() => {
                tracing::info!(
                    established_at = %session.established_at,
                    user = session.profile.as_ref().map(|p| p.username.as_str()).unwrap_or("-"),
                    "Restored persisted session"
                );
                *store.current.write() = Some(session);
            }
            Ok(_) => {
                tracing::debug!("No persisted session");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable persisted session");
                if let Err(e) = store.persistence.clear() {
                    tracing::warn!(error = %e, "Failed to remove unreadable session");
                }
            }
        }
        store
    }

    /// Bearer credential, if a session exists.
    pub fn token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.current.read().as_ref().and_then(|s| s.profile.clone())
    }

    /// Install a new session, replacing any existing one.
    pub fn establish(&self, session: Session) -> ConsoleResult<()> {
        if session.token.trim().is_empty() {
            return Err(ConsoleError::InvalidRequest(
                "refusing to establish a session with an empty token".to_string(),
            ));
        }

        self.persistence.save(&session)?;
        *self.current.write() = Some(session);
        Ok(())
    }

    /// Replace the cached profile of the current session. No-op without a session.
    pub fn update_profile(&self, profile: UserProfile) -> ConsoleResult<bool> {
        let mut current = self.current.write();
        let Some(session) = current.as_mut() else {
            return Ok(false);
        };
        session.profile = Some(profile);
        self.persistence.save(session)?;
        Ok(true)
    }

    /// Destroy the session in memory and in persistence.
    ///
    /// Idempotent; returns whether a session was present. Persistence
    /// failures are logged rather than returned so that the in-memory
    /// state is always cleared.
    pub fn clear(&self) -> bool {
        let had_session = self.current.write().take().is_some();
        if let Err(e) = self.persistence.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted session");
        }
        if had_session {
            tracing::info!("Session cleared");
        }
        had_session
    }
}
