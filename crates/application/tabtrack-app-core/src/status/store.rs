use std::sync::{Arc, Mutex, PoisonError};

use super::{events::StatusEvent, reducer::reduce, StatusState, TrackerStatus};

#[derive(Clone, Default)]
pub struct StatusStore {
    inner: Arc<Mutex<StatusState>>,
}

impl StatusStore {
    pub fn state(&self) -> StatusState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn status(&self) -> TrackerStatus {
        self.state().status()
    }

    pub fn apply(&self, ev: StatusEvent) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let next = reduce(guard.clone(), ev);
        *guard = next;
    }
}
