use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{DeploymentImpl, deployment::Deployment, error::ApiError};

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .map(str::to_string)
}

/// Resolves the bearer token to an [`Actor`](services::services::access::Actor)
/// and stores it as a request extension.
pub async fn require_auth(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_request_token(&req) else {
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            reason = "missing_token",
            "Unauthorized API request"
        );
        return ApiError::Unauthorized.into_response();
    };

    match deployment
        .auth()
        .authenticate(&deployment.db().pool, &token)
        .await
    {
        Ok(actor) => {
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                method = %req.method(),
                reason = %err,
                "Unauthorized API request"
            );
            ApiError::from(err).into_response()
        }
    }
}
