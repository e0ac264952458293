//! A session shared between threads.
//!
//! Commands are applied one at a time: while one is in flight, callers
//! either wait for it ([`SharedSession::dispatch`]) or are turned away
//! ([`SharedSession::try_dispatch`]).

use std::sync::Arc;

use parking_lot::Mutex;

use super::action::{Action, Outcome};
use super::api::{Session, SessionError, SessionResult};
use crate::storage::RepositorySnapshot;

#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Apply an action, waiting for any command in flight.
    pub fn dispatch(&self, action: Action) -> SessionResult<Outcome> {
        self.inner.lock().dispatch(action)
    }

    /// Apply an action unless another command is in flight.
    pub fn try_dispatch(&self, action: Action) -> SessionResult<Outcome> {
        match self.inner.try_lock() {
            Some(mut session) => session.dispatch(action),
            None => Err(SessionError::Busy),
        }
    }

    /// Read the session.
    pub fn with<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn snapshot(&self) -> SessionResult<RepositorySnapshot> {
        self.inner.lock().snapshot()
    }
}

impl From<Session> for SharedSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::api::SessionConfig;
    use std::thread;

    #[test]
    fn test_concurrent_dispatch_is_serialized() {
        let shared = SharedSession::new(Session::with_config(SessionConfig::new().seed(1)).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        shared.dispatch(Action::AddFile { name: None }).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.with(|s| {
            assert_eq!(s.repository().files().len(), 20);
            assert_eq!(s.journal().len(), 20);
        });
    }

    #[test]
    fn test_try_dispatch_while_busy() {
        let shared = SharedSession::new(Session::new());
        let guard = shared.inner.lock();

        let result = shared.try_dispatch(Action::CreateCommit);
        assert!(matches!(result, Err(SessionError::Busy)));
        drop(guard);

        assert!(shared.try_dispatch(Action::CreateCommit).is_ok());
        assert_eq!(shared.snapshot().unwrap().commits.len(), 1);
    }
}
