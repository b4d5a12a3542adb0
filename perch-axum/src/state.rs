use std::sync::Arc;

use perch_store::SessionStore;
use perch_switch::SwitchCoordinator;

pub struct PerchState<S: SessionStore + 'static> {
    pub coordinator: Arc<SwitchCoordinator<S>>,
}

impl<S: SessionStore + 'static> Clone for PerchState<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

impl<S: SessionStore + 'static> PerchState<S> {
    pub fn new(coordinator: SwitchCoordinator<S>) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
        }
    }
}
