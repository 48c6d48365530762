use std::{fmt::Display, future::Future};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use db::{
    DBService,
    models::{comment::Comment, issue::Issue, project::Project},
};
use serde::Deserialize;

use crate::{deployment::Deployment, error::ApiError, extract::PathIds};

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;
}

impl<D> ModelLoaderDeps for D
where
    D: Deployment,
{
    fn db_service(&self) -> &DBService {
        self.db()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectPath {
    pub project_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct IssuePath {
    pub project_id: i64,
    pub issue_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentPath {
    pub issue_id: i64,
    pub comment_id: i64,
}

async fn fetch_model_or_error<M, E, Fut>(
    model_name: &'static str,
    model_id: i64,
    load_future: Fut,
) -> Result<M, ApiError>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::debug!("{model_name} {model_id} not found");
            Err(ApiError::NotFound(format!("{model_name} not found")))
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(ApiError::Internal(format!("Failed to fetch {model_name}")))
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: i64,
    load_future: Fut,
) -> Result<Response, ApiError>
where
    M: Clone + Send + Sync + 'static,
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    let model = fetch_model_or_error(model_name, model_id, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

pub async fn load_project_middleware<S>(
    State(deployment): State<S>,
    PathIds(path): PathIds<ProjectPath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Project",
        path.project_id,
        Project::find_by_id(&deployment.db_service().pool, path.project_id),
    )
    .await
}

/// An issue outside the path's project is reported as missing.
pub async fn load_issue_middleware<S>(
    State(deployment): State<S>,
    PathIds(path): PathIds<IssuePath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Issue",
        path.issue_id,
        Issue::find_in_project(
            &deployment.db_service().pool,
            path.project_id,
            path.issue_id,
        ),
    )
    .await
}

/// A comment outside the path's issue is reported as missing.
pub async fn load_comment_middleware<S>(
    State(deployment): State<S>,
    PathIds(path): PathIds<CommentPath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    load_request_extension(
        request,
        next,
        "Comment",
        path.comment_id,
        Comment::find_in_issue(
            &deployment.db_service().pool,
            path.issue_id,
            path.comment_id,
        ),
    )
    .await
}
