use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    issue::{CreateIssue, Issue, UpdateIssue},
    project::Project,
};
use services::services::access::Actor;
use utils_core::response::ApiResponse;

use crate::{
    DeploymentImpl,
    deployment::Deployment,
    error::ApiError,
    extract::Payload,
    middleware::{load_issue_middleware, load_project_middleware},
};

pub async fn get_issues(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Issue>>>, ApiError> {
    let issues = deployment
        .issue()
        .list_issues(&deployment.db().pool, &actor, &project)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Issues retrieved", issues)))
}

pub async fn create_issue(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<CreateIssue>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Issue>>), ApiError> {
    tracing::debug!(project_id = project.id, "Creating issue '{}'", payload.title);

    let issue = deployment
        .issue()
        .create_issue(&deployment.db().pool, &actor, &project, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success("Issue created", issue)),
    ))
}

pub async fn update_issue(
    Extension(actor): Extension<Actor>,
    Extension(existing_issue): Extension<Issue>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<UpdateIssue>,
) -> Result<ResponseJson<ApiResponse<Issue>>, ApiError> {
    let issue = deployment
        .issue()
        .update_issue(&deployment.db().pool, &actor, &existing_issue, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Issue updated", issue)))
}

pub async fn delete_issue(
    Extension(actor): Extension<Actor>,
    Extension(issue): Extension<Issue>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = deployment
        .issue()
        .delete_issue(&deployment.db().pool, &actor, &issue)
        .await?;

    if rows_affected == 0 {
        return Err(ApiError::NotFound("Issue not found".to_string()));
    }

    Ok(ResponseJson(ApiResponse::ok("Issue deleted")))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let issue_id_router = Router::new()
        .route(
            "/projects/{project_id}/issues/{issue_id}",
            put(update_issue).delete(delete_issue),
        )
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_issue_middleware::<DeploymentImpl>,
        ));

    Router::new()
        .route(
            "/projects/{project_id}/issues/",
            get(get_issues).post(create_issue),
        )
        .merge(issue_id_router)
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ))
}
