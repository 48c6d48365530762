use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::{
    contributor::{Contributor, CreateContributor},
    project::Project,
};
use serde::Deserialize;
use services::services::access::Actor;
use utils_core::response::ApiResponse;

use crate::{
    DeploymentImpl,
    deployment::Deployment,
    error::ApiError,
    extract::{PathIds, Payload},
    middleware::load_project_middleware,
};

#[derive(Debug, Deserialize)]
pub struct ContributorPath {
    pub user_id: i64,
}

pub async fn get_contributors(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Contributor>>>, ApiError> {
    let contributors = deployment
        .project()
        .list_contributors(&deployment.db().pool, &actor, &project)
        .await?;
    Ok(ResponseJson(ApiResponse::success(
        "Contributors retrieved",
        contributors,
    )))
}

pub async fn add_contributor(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<CreateContributor>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Contributor>>), ApiError> {
    let contributor = deployment
        .project()
        .add_contributor(&deployment.db().pool, &actor, &project, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success("Contributor added", contributor)),
    ))
}

pub async fn remove_contributor(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    PathIds(path): PathIds<ContributorPath>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment
        .project()
        .remove_contributor(&deployment.db().pool, &actor, &project, path.user_id)
        .await?;
    Ok(ResponseJson(ApiResponse::ok("Contributor removed")))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route(
            "/projects/{project_id}/users/",
            get(get_contributors).post(add_contributor),
        )
        .route(
            "/projects/{project_id}/users/{user_id}",
            delete(remove_contributor),
        )
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ))
}
