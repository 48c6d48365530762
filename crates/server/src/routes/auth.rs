use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::post,
};
use db::models::user::{CreateUser, User};
use services::services::auth::{AccessToken, LoginRequest};
use utils_core::response::ApiResponse;

use crate::{DeploymentImpl, deployment::Deployment, error::ApiError, extract::Payload};

pub async fn signup(
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<CreateUser>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    let user = deployment
        .auth()
        .signup(&deployment.db().pool, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success("User created", user)),
    ))
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AccessToken>>, ApiError> {
    let token = deployment
        .auth()
        .login(&deployment.db().pool, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Logged in", token)))
}

/// Public routes; everything else under `/api` sits behind the bearer check.
pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/signup/", post(signup))
        .route("/login/", post(login))
}
