use std::sync::Arc;

use async_trait::async_trait;
use config::{Config, ConfigError};
use db::{DBService, DbErr};
use services::services::{auth::AuthService, issue::IssueService, project::ProjectService};
use thiserror::Error;
use utils_jwt::TokenIssuer;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Everything a request handler needs, shared across requests.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    /// Builds from the environment (see [`config::load_from_env`]).
    async fn new() -> Result<Self, DeploymentError>;

    async fn from_config(config: Config) -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<Config>;

    fn db(&self) -> &DBService;

    fn auth(&self) -> &AuthService;

    fn project(&self) -> &ProjectService;

    fn issue(&self) -> &IssueService;
}

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    auth: AuthService,
    project: ProjectService,
    issue: IssueService,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = config::load_from_env()?;
        Self::from_config(config).await
    }

    async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        config.validate()?;
        let db = DBService::new(&config.database_url).await?;
        let ttl = chrono::Duration::try_seconds(config.auth.token_ttl_secs).ok_or_else(|| {
            ConfigError::ValidationError("auth.token_ttl_secs is out of range".to_string())
        })?;
        let tokens = TokenIssuer::new(config.auth.jwt_secret.as_bytes(), ttl);

        Ok(Self {
            config: Arc::new(config),
            db,
            auth: AuthService::new(tokens),
            project: ProjectService::new(),
            issue: IssueService::new(),
        })
    }

    fn config(&self) -> &Arc<Config> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    fn project(&self) -> &ProjectService {
        &self.project
    }

    fn issue(&self) -> &IssueService {
        &self.issue
    }
}
