//! Shared handler state.

use std::sync::Arc;

use barbearia_core::OversellPolicy;
use barbearia_db::Database;

use crate::notifier::Notifier;

/// Cloned into every handler. The pool and notifier are shared.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub notifier: Arc<dyn Notifier>,
    pub oversell_policy: OversellPolicy,
}

impl AppState {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, oversell_policy: OversellPolicy) -> Self {
        AppState {
            db,
            notifier,
            oversell_policy,
        }
    }
}
