//! In-memory session store
//!
//! Owns every session exclusively; all mutation goes through the store's
//! operations so lifecycle invariants (monotonic progress, terminal
//! timestamps) hold in one place.

use crate::error::SessionError;
use docflow_domain::{
    CustomColumn, FileOutcome, ResultRow, Session, SessionFile, SessionId, SessionStatus,
    TemplateSnapshot,
};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

/// Thread-safe in-memory store of sessions keyed by id
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store with the given terminal-session TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create a pending session and return its id
    pub fn create_session(
        &self,
        template: TemplateSnapshot,
        files: Vec<SessionFile>,
        custom_columns: Vec<CustomColumn>,
    ) -> SessionId {
        let session = Session::new(template, files, custom_columns);
        let id = session.id;
        self.sessions.write().unwrap().insert(id, session);
        tracing::info!("Created session {}", id);
        id
    }

    /// Fetch a snapshot of a session
    pub fn get_session(&self, id: SessionId) -> Option<Session> {
        self.sessions.read().unwrap().get(&id).cloned()
    }

    /// Advance progress and status in one step
    ///
    /// Progress regressions are clamped so progress never moves backwards.
    pub fn update_progress(
        &self,
        id: SessionId,
        progress: u8,
        status: SessionStatus,
    ) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            let clamped = progress.min(100);
            if clamped > session.progress {
                session.progress = clamped;
            }
            session.status = status;
        })
    }

    /// Append extracted rows to the session's accumulated output
    pub fn add_results(&self, id: SessionId, rows: Vec<ResultRow>) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            session.rows.extend(rows);
        })
    }

    /// Record the outcome for one finished file
    pub fn add_file_outcome(&self, id: SessionId, outcome: FileOutcome) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            session.file_outcomes.push(outcome);
        })
    }

    /// Move a session to Failed with the given error message
    pub fn set_error(&self, id: SessionId, message: &str) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            session.status = SessionStatus::Failed;
            session.error_message = Some(message.to_string());
            session.completed_at = Some(Instant::now());
        })
    }

    /// Move a session to Completed at full progress
    pub fn mark_completed(&self, id: SessionId) -> Result<(), SessionError> {
        self.with_session(id, |session| {
            session.status = SessionStatus::Completed;
            session.progress = 100;
            session.completed_at = Some(Instant::now());
        })
    }

    /// Remove a session outright; true if it existed
    pub fn delete_session(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().unwrap().remove(&id).is_some();
        if removed {
            tracing::info!("Deleted session {}", id);
        }
        removed
    }

    /// Evict sessions whose age exceeds the TTL, returning the swept ids
    ///
    /// Age is measured from creation regardless of status; a swept
    /// session is indistinguishable from one that never existed.
    pub fn sweep_expired(&self) -> Vec<SessionId> {
        let mut sessions = self.sessions.write().unwrap();
        let ttl = self.ttl;

        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, s)| s.created_at.elapsed() > ttl)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            sessions.remove(id);
        }

        if !expired.is_empty() {
            tracing::info!("Swept {} expired session(s)", expired.len());
        }
        expired
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    fn with_session<F>(&self, id: SessionId, mutate: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        mutate(session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_domain::FieldSpec;

    fn template() -> TemplateSnapshot {
        TemplateSnapshot {
            fields: vec![FieldSpec {
                name: "total".to_string(),
                description: "Invoice total".to_string(),
            }],
            prompt: "Extract the fields".to_string(),
        }
    }

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(300))
    }

    fn row(key: &str) -> ResultRow {
        let mut row = ResultRow::new();
        row.insert(key.to_string(), serde_json::json!("v"));
        row
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());

        let session = store.get_session(id).unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.status, SessionStatus::Pending);
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_none() {
        assert!(store().get_session(SessionId::new()).is_none());
    }

    #[tokio::test]
    async fn test_mutation_on_unknown_id_errors() {
        let result = store().update_progress(SessionId::new(), 50, SessionStatus::Processing);
        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());

        store
            .update_progress(id, 40, SessionStatus::Processing)
            .unwrap();
        store
            .update_progress(id, 25, SessionStatus::Processing)
            .unwrap();
        assert_eq!(store.get_session(id).unwrap().progress, 40);

        store
            .update_progress(id, 90, SessionStatus::Processing)
            .unwrap();
        let session = store.get_session(id).unwrap();
        assert_eq!(session.progress, 90);
        assert_eq!(session.status, SessionStatus::Processing);
    }

    #[tokio::test]
    async fn test_progress_clamped_at_100() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());
        store
            .update_progress(id, 250, SessionStatus::Processing)
            .unwrap();
        assert_eq!(store.get_session(id).unwrap().progress, 100);
    }

    #[tokio::test]
    async fn test_rows_append_only() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());

        store.add_results(id, vec![row("a")]).unwrap();
        store.add_results(id, vec![row("b"), row("c")]).unwrap();
        assert_eq!(store.get_session(id).unwrap().rows.len(), 3);
    }

    #[tokio::test]
    async fn test_set_error_is_terminal() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());

        store.set_error(id, "provider unreachable").unwrap();
        let session = store.get_session(id).unwrap();
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(
            session.error_message.as_deref(),
            Some("provider unreachable")
        );
        assert!(session.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_completed_forces_full_progress() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());

        store
            .update_progress(id, 60, SessionStatus::Processing)
            .unwrap();
        store.mark_completed(id).unwrap();

        let session = store.get_session(id).unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.progress, 100);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let store = store();
        let id = store.create_session(template(), Vec::new(), Vec::new());

        assert!(store.delete_session(id));
        assert!(!store.delete_session(id));
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_aged_sessions_only() {
        let store = SessionStore::new(Duration::from_secs(300));

        let old = store.create_session(template(), Vec::new(), Vec::new());
        tokio::time::advance(Duration::from_secs(301)).await;
        let fresh = store.create_session(template(), Vec::new(), Vec::new());

        let swept = store.sweep_expired();
        assert_eq!(swept, vec![old]);
        assert!(store.get_session(old).is_none());
        assert!(store.get_session(fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_age_ignores_status() {
        // Even a still-processing session is swept once its age exceeds
        // the TTL; a swept id looks like one that never existed
        let store = SessionStore::new(Duration::from_secs(300));
        let id = store.create_session(template(), Vec::new(), Vec::new());
        store
            .update_progress(id, 10, SessionStatus::Processing)
            .unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;
        assert_eq!(store.sweep_expired(), vec![id]);
        assert!(store.get_session(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_session_survives_sweep() {
        let store = SessionStore::new(Duration::from_secs(300));
        let id = store.create_session(template(), Vec::new(), Vec::new());
        store.mark_completed(id).unwrap();

        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(store.sweep_expired().is_empty());
        assert!(store.get_session(id).is_some());
    }
}
