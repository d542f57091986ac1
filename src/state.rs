use crate::auth::AuthPolicy;
use crate::subjects::SubjectStore;

/// Shared by every web request.
pub struct AdminState {
    pub store: SubjectStore,
    pub auth: Box<dyn AuthPolicy>,
}

impl AdminState {
    pub fn new(store: SubjectStore, auth: Box<dyn AuthPolicy>) -> Self {
        Self { store, auth }
    }
}
