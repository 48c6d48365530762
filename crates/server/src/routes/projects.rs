use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::project::{CreateProject, Project, UpdateProject};
use services::services::access::Actor;
use utils_core::response::ApiResponse;

use crate::{
    DeploymentImpl, deployment::Deployment, error::ApiError, extract::Payload,
    middleware::load_project_middleware,
};

pub async fn get_projects(
    Extension(actor): Extension<Actor>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = deployment
        .project()
        .list_projects(&deployment.db().pool, &actor)
        .await?;
    Ok(ResponseJson(ApiResponse::success(
        "Projects retrieved",
        projects,
    )))
}

pub async fn get_project(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    deployment
        .project()
        .ensure_member(&deployment.db().pool, &actor, &project)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Project retrieved", project)))
}

pub async fn create_project(
    Extension(actor): Extension<Actor>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<CreateProject>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Project>>), ApiError> {
    tracing::debug!("Creating project '{}'", payload.title);

    let project = deployment
        .project()
        .create_project(&deployment.db().pool, &actor, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success("Project created", project)),
    ))
}

pub async fn update_project(
    Extension(actor): Extension<Actor>,
    Extension(existing_project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = deployment
        .project()
        .update_project(&deployment.db().pool, &actor, &existing_project, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Project updated", project)))
}

pub async fn delete_project(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = deployment
        .project()
        .delete_project(&deployment.db().pool, &actor, &project)
        .await?;

    if rows_affected == 0 {
        return Err(ApiError::NotFound("Project not found".to_string()));
    }

    Ok(ResponseJson(ApiResponse::ok("Project deleted")))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let project_id_router = Router::new()
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ));

    Router::new()
        .route("/projects/", get(get_projects).post(create_project))
        .merge(project_id_router)
}
