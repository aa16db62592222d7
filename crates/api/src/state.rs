//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::{CalculationStore, PgCalculationStore, PgUserStore, UserStore};
use crate::services::{AuthService, CalculationService, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the stores, the token service and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: Option<PgPool>,
    tokens: TokenService,
    users: Arc<dyn UserStore>,
    calculations: Arc<dyn CalculationStore>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let users = Arc::new(PgUserStore::new(pool.clone()));
        let calculations = Arc::new(PgCalculationStore::new(pool.clone()));
        Self::build(config, Some(pool), users, calculations)
    }

    /// Create application state over arbitrary stores.
    ///
    /// Readiness checks always pass since there is no pool to ping.
    #[must_use]
    pub fn with_stores(
        config: ApiConfig,
        users: Arc<dyn UserStore>,
        calculations: Arc<dyn CalculationStore>,
    ) -> Self {
        Self::build(config, None, users, calculations)
    }

    fn build(
        config: ApiConfig,
        pool: Option<PgPool>,
        users: Arc<dyn UserStore>,
        calculations: Arc<dyn CalculationStore>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                users,
                calculations,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if the state is `PostgreSQL`-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Authentication service over this state's user store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.inner.users.as_ref(), &self.inner.tokens)
    }

    /// Calculation service over this state's calculation store.
    #[must_use]
    pub fn calculations(&self) -> CalculationService<'_> {
        CalculationService::new(self.inner.calculations.as_ref())
    }
}
