//! Keyed in-memory session store.
//!
//! Each session owns its two datasets and the output of its most recent
//! reconciliation. The store is an explicit value owned by the caller;
//! the engine never reaches into it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::info;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::config::ReconRequest;
use crate::engine;
use crate::error::ReconError;
use crate::export::export_csv;
use crate::model::{Dataset, ReconOutput, Status};

pub type SessionId = Uuid;

/// Datasets plus the last result, with the request that produced it.
#[derive(Debug)]
pub struct Session {
    pub a: Arc<Dataset>,
    pub b: Arc<Dataset>,
    pub created_at: DateTime<Utc>,
    pub last: Option<Arc<LastRun>>,
}

#[derive(Debug)]
pub struct LastRun {
    pub request: ReconRequest,
    pub output: ReconOutput,
    pub ran_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register two parsed datasets under a fresh id.
    pub fn create(&self, a: Dataset, b: Dataset) -> SessionId {
        let id = Uuid::new_v4();
        info!("session {id}: created with {} A rows and {} B rows", a.len(), b.len());
        self.sessions.write().insert(
            id,
            Session {
                a: Arc::new(a),
                b: Arc::new(b),
                created_at: Utc::now(),
                last: None,
            },
        );
        id
    }

    pub fn datasets(&self, id: &SessionId) -> Result<(Arc<Dataset>, Arc<Dataset>), ReconError> {
        let sessions = self.sessions.read();
        let session = sessions.get(id).ok_or_else(|| unknown(id))?;
        Ok((Arc::clone(&session.a), Arc::clone(&session.b)))
    }

    /// Run the engine over the session's datasets and keep the output as the
    /// session's last result, replacing any earlier one.
    ///
    /// The request is validated before anything is computed. The store lock
    /// is not held while the engine runs.
    pub fn reconcile(&self, id: &SessionId, request: &ReconRequest) -> Result<Arc<LastRun>, ReconError> {
        request.validate()?;
        let (a, b) = self.datasets(id)?;

        let output = engine::run(&a, &b, request)?;
        let run = Arc::new(LastRun {
            request: request.clone(),
            output,
            ran_at: Utc::now(),
        });

        let mut sessions = self.sessions.write();
        // The session may have been removed while the engine ran
        let session = sessions.get_mut(id).ok_or_else(|| unknown(id))?;
        session.last = Some(Arc::clone(&run));
        info!(
            "session {id}: {} mode run stored ({} records)",
            request.mode,
            run.output.summary.total
        );
        Ok(run)
    }

    pub fn last_result(&self, id: &SessionId) -> Result<Arc<LastRun>, ReconError> {
        let sessions = self.sessions.read();
        let session = sessions.get(id).ok_or_else(|| unknown(id))?;
        session
            .last
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| ReconError::NoResult(id.to_string()))
    }

    /// CSV of the last result, optionally filtered by exact status.
    pub fn export(&self, id: &SessionId, status: Option<Status>) -> Result<String, ReconError> {
        let run = self.last_result(id)?;
        export_csv(&run.output.results, &run.request.mapping, status)
    }

    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            info!("session {id}: removed");
        }
        removed
    }

    /// Drop sessions created more than `max_age` ago. Returns how many went.
    pub fn expire_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.created_at >= cutoff);
        let expired = before - sessions.len();
        if expired > 0 {
            info!("expired {expired} session(s)");
        }
        expired
    }
}

fn unknown(id: &SessionId) -> ReconError {
    ReconError::UnknownSession(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::load_csv;
    use crate::mapping::FieldMapping;

    fn sample() -> (Dataset, Dataset) {
        let a = load_csv(
            "a.csv",
            "transaction_id,amount,date\nT1,10,2024-01-05\nT2,20,2024-01-05\n",
        )
        .unwrap();
        let b = load_csv(
            "b.csv",
            "transaction_id,amount,date\nT1,10,2024-01-05\nT2,25,2024-01-05\nT3,5,2024-01-05\n",
        )
        .unwrap();
        (a, b)
    }

    #[test]
    fn create_reconcile_export() {
        let store = SessionStore::new();
        let (a, b) = sample();
        let id = store.create(a, b);
        assert!(store.datasets(&id).is_ok());

        let run = store.reconcile(&id, &ReconRequest::auto(FieldMapping::default())).unwrap();
        assert_eq!(run.output.summary.total, 3);
        assert_eq!(run.output.summary.matched, 1);

        let csv = store.export(&id, Some(Status::Mismatch)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("MISMATCH,"));
    }

    #[test]
    fn later_run_replaces_last_result() {
        let store = SessionStore::new();
        let (a, b) = sample();
        let id = store.create(a, b);

        store.reconcile(&id, &ReconRequest::auto(FieldMapping::default())).unwrap();
        let first = store.last_result(&id).unwrap();

        let mut mapping = FieldMapping::default();
        mapping.id.a = Some("nope".into());
        store.reconcile(&id, &ReconRequest::auto(mapping)).unwrap();
        let second = store.last_result(&id).unwrap();

        assert_eq!(first.output.summary.matched, 1);
        assert_eq!(second.output.summary.matched, 0);
        assert_eq!(second.output.summary.missing_in_b, 2);
    }

    #[test]
    fn unknown_session_errors() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let err = store.reconcile(&id, &ReconRequest::default()).unwrap_err();
        assert!(matches!(err, ReconError::UnknownSession(_)));
        assert!(matches!(store.export(&id, None), Err(ReconError::UnknownSession(_))));
    }

    #[test]
    fn export_before_run_errors() {
        let store = SessionStore::new();
        let (a, b) = sample();
        let id = store.create(a, b);
        assert!(matches!(store.export(&id, None), Err(ReconError::NoResult(_))));
    }

    #[test]
    fn invalid_request_computes_nothing() {
        let store = SessionStore::new();
        let (a, b) = sample();
        let id = store.create(a, b);
        let request = ReconRequest {
            mode: crate::rules::ModeName::Custom,
            ..Default::default()
        };
        assert!(matches!(store.reconcile(&id, &request), Err(ReconError::InvalidRequest(_))));
        assert!(matches!(store.last_result(&id), Err(ReconError::NoResult(_))));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let (a, b) = sample();
        let first = store.create(a.clone(), b.clone());
        let second = store.create(b, a);

        store.reconcile(&first, &ReconRequest::default()).unwrap();
        assert!(store.last_result(&first).is_ok());
        assert!(matches!(store.last_result(&second), Err(ReconError::NoResult(_))));

        let (sa, _) = store.datasets(&second).unwrap();
        assert_eq!(sa.len(), 3);
    }

    #[test]
    fn remove_and_expire() {
        let store = SessionStore::new();
        let (a, b) = sample();
        let id = store.create(a.clone(), b.clone());
        assert!(store.remove(&id));
        assert!(!store.remove(&id));

        let id = store.create(a, b);
        assert_eq!(store.expire_older_than(Duration::hours(1)), 0);
        assert!(store.datasets(&id).is_ok());
        assert_eq!(store.expire_older_than(Duration::seconds(-1)), 1);
        assert!(matches!(store.datasets(&id), Err(ReconError::UnknownSession(_))));
        assert_eq!(store.expire_older_than(Duration::seconds(-1)), 0);
    }
}
