//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use sqlgate_core::config::{Config, Target, UsersConfig, STAR};
use sqlgate_core::{TargetId, UserId};
use sqlgate_policy::AclSet;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::error::FacadeError;
use crate::storage;

/// Shared state behind every request handler.
///
/// Configuration and rules are read-only for the process lifetime. The pool
/// map is the only mutable piece and follows a read-many single-writer
/// discipline: pools are created lazily on first use and cached forever.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    acls: AclSet,
    pools: RwLock<HashMap<TargetId, PgPool>>,
    storage: PgPool,
}

impl AppState {
    /// Validate configuration, connect to the internal storage database,
    /// and prepare the pool map.
    pub async fn init(config: Config) -> Result<Self, FacadeError> {
        config.validate()?;

        if matches!(config.users, UsersConfig::Oidc(_)) {
            return Err(FacadeError::Config(
                sqlgate_core::config::ConfigError::Invalid(
                    "the OIDC users provider is not supported by this facade".to_owned(),
                ),
            ));
        }

        let storage = PgPoolOptions::new()
            .max_connections(config.storage.max_pool_size)
            .connect(&config.storage.url())
            .await?;
        storage::ensure_schema(&storage).await?;

        tracing::info!(
            targets = config.targets.len(),
            rules = config.acls.len(),
            "gateway state initialised"
        );

        let acls = AclSet::new(config.acls.clone());
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                acls,
                pools: RwLock::new(HashMap::new()),
                storage,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn acls(&self) -> &AclSet {
        &self.inner.acls
    }

    pub fn storage(&self) -> &PgPool {
        &self.inner.storage
    }

    pub fn cookie_secret(&self) -> &str {
        &self.inner.config.facade.cookie_secret
    }

    /// Authenticate a username/password pair against the static provider.
    pub fn auth_user(&self, username: &str, password: &str) -> Result<UserId, FacadeError> {
        let users = self
            .inner
            .config
            .users
            .static_users()
            .ok_or(FacadeError::InvalidCredentials)?;

        users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .map(|user| user.id.clone())
            .ok_or(FacadeError::InvalidCredentials)
    }

    /// Whether at least one allowing rule mentions this user and target,
    /// wildcards included. Gates target visibility in the UI and the
    /// per-target routes.
    pub fn can_see(&self, user: &UserId, target: &TargetId) -> bool {
        self.inner.acls.rules().iter().any(|rule| {
            rule.allow
                && (rule.user == STAR || rule.user == user.as_str())
                && (rule.target == STAR || rule.target == target.as_str())
        })
    }

    /// Targets visible to this user.
    pub fn visible_targets(&self, user: &UserId) -> Vec<&Target> {
        self.inner
            .config
            .targets
            .iter()
            .filter(|target| self.can_see(user, &target.id))
            .collect()
    }

    /// Resolve a target the user may see, or report not-found. Invisible
    /// and nonexistent targets are indistinguishable on purpose.
    pub fn target_for(&self, user: &UserId, id: &TargetId) -> Result<&Target, FacadeError> {
        let target = self.inner.config.target(id).ok_or(FacadeError::NotFound)?;
        if !self.can_see(user, id) {
            return Err(FacadeError::NotFound);
        }
        Ok(target)
    }

    /// The connection pool for a target, created on first use.
    pub async fn target_pool(&self, target: &Target) -> Result<PgPool, FacadeError> {
        {
            let pools = self.inner.pools.read().await;
            if let Some(pool) = pools.get(&target.id) {
                return Ok(pool.clone());
            }
        }

        tracing::info!(target = %target.id, "connecting to target");
        let pool = PgPoolOptions::new()
            .max_connections(target.connection.max_pool_size)
            .connect(&target.connection.url())
            .await?;

        let mut pools = self.inner.pools.write().await;
        let pool = pools.entry(target.id.clone()).or_insert(pool);
        Ok(pool.clone())
    }
}
