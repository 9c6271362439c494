use std::sync::Arc;

use projecthub_core::membership::MembershipEngine;
use projecthub_db::PgMembershipStore;
use projecthub_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and everything else is
/// behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: projecthub_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Domain events for the notification dispatcher.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// A membership engine over this state's pool.
    pub fn membership(&self) -> MembershipEngine<PgMembershipStore> {
        MembershipEngine::new(PgMembershipStore::new(self.pool.clone()))
            .with_max_attempts(self.config.membership_max_attempts)
    }
}
