// src/session/registry.rs — In-memory map of active work sessions
//
// Shared between the dispatcher (every command) and the periodic updaters
// (auto-stop only). The lock is never held across an await point.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::updater::UpdaterHandle;
use super::{Location, SessionError};

/// An active session. Owns the handle of its periodic updater.
#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub event_id: String,
    pub start_time: DateTime<Utc>,
    pub location: Location,
    updater: Option<UpdaterHandle>,
}

/// Read-only view of a session, safe to hand out of the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user_id: String,
    pub username: String,
    pub event_id: String,
    pub start_time: DateTime<Utc>,
    pub location: Location,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        event_id: impl Into<String>,
        start_time: DateTime<Utc>,
        location: Location,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            event_id: event_id.into(),
            start_time,
            location,
            updater: None,
        }
    }

    /// Builder: attach the running updater.
    pub fn with_updater(mut self, updater: UpdaterHandle) -> Self {
        self.updater = Some(updater);
        self
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            event_id: self.event_id.clone(),
            start_time: self.start_time,
            location: self.location,
        }
    }

    /// Signal the updater to stop and wait until it has exited.
    pub async fn stop_updater(&mut self) {
        if let Some(updater) = self.updater.take() {
            updater.cancel().await;
        }
    }
}

/// Registry of active sessions keyed by user ID.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new session. Fails if the user already has one; the
    /// rejected session is returned so the caller can clean up its updater.
    pub fn create(&self, session: Session) -> Result<SessionInfo, (SessionError, Session)> {
        let mut sessions = self.lock();
        if sessions.contains_key(&session.user_id) {
            return Err((SessionError::AlreadyActive, session));
        }
        let info = session.info();
        sessions.insert(session.user_id.clone(), session);
        Ok(info)
    }

    /// Remove and return the user's session.
    pub fn remove(&self, user_id: &str) -> Result<Session, SessionError> {
        self.lock()
            .remove(user_id)
            .ok_or(SessionError::NoActiveSession)
    }

    /// Remove the user's session only if it still tracks `event_id`.
    pub fn remove_if_event(&self, user_id: &str, event_id: &str) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(user_id) {
            Some(s) if s.event_id == event_id => sessions.remove(user_id),
            _ => None,
        }
    }

    pub fn get(&self, user_id: &str) -> Option<SessionInfo> {
        self.lock().get(user_id).map(Session::info)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.lock().contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of all active sessions, oldest first.
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut all: Vec<SessionInfo> = self.lock().values().map(Session::info).collect();
        all.sort_by_key(|s| s.start_time);
        all
    }

    /// Take every session out of the registry (shutdown).
    pub fn drain(&self) -> Vec<Session> {
        self.lock().drain().map(|(_, s)| s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(user: &str, event: &str) -> Session {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Session::new(user, format!("{user}-name"), event, start, Location::Home)
    }

    #[test]
    fn test_create_and_get() {
        let reg = SessionRegistry::new();
        let info = reg.create(session("u1", "ev1")).unwrap();
        assert_eq!(info.event_id, "ev1");
        assert_eq!(reg.get("u1"), Some(info));
        assert!(reg.get("u2").is_none());
    }

    #[test]
    fn test_create_twice_rejected() {
        let reg = SessionRegistry::new();
        reg.create(session("u1", "ev1")).unwrap();
        let (err, rejected) = reg.create(session("u1", "ev2")).unwrap_err();
        assert_eq!(err, SessionError::AlreadyActive);
        assert_eq!(rejected.event_id, "ev2");
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("u1").unwrap().event_id, "ev1");
    }

    #[test]
    fn test_remove_absent() {
        let reg = SessionRegistry::new();
        assert_eq!(reg.remove("ghost").unwrap_err(), SessionError::NoActiveSession);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_returns_session() {
        let reg = SessionRegistry::new();
        reg.create(session("u1", "ev1")).unwrap();
        let s = reg.remove("u1").unwrap();
        assert_eq!(s.user_id, "u1");
        assert!(!reg.contains("u1"));
    }

    #[test]
    fn test_remove_if_event_matches_only_same_event() {
        let reg = SessionRegistry::new();
        reg.create(session("u1", "ev2")).unwrap();
        assert!(reg.remove_if_event("u1", "ev1").is_none());
        assert!(reg.contains("u1"));
        assert!(reg.remove_if_event("u1", "ev2").is_some());
        assert!(!reg.contains("u1"));
    }

    #[test]
    fn test_list_sorted_and_drain() {
        let reg = SessionRegistry::new();
        let late = Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap();
        reg.create(Session::new("u2", "b", "ev2", late, Location::Ieee))
            .unwrap();
        reg.create(session("u1", "ev1")).unwrap();

        let ids: Vec<_> = reg.list().into_iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec!["u1", "u2"]);

        assert_eq!(reg.drain().len(), 2);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let reg = SessionRegistry::new();
        let other = reg.clone();
        reg.create(session("u1", "ev1")).unwrap();
        assert!(other.contains("u1"));
    }
}
