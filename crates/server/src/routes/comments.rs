use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    comment::{Comment, CreateComment, UpdateComment},
    issue::Issue,
    project::Project,
};
use services::services::access::Actor;
use utils_core::response::ApiResponse;

use crate::{
    DeploymentImpl,
    deployment::Deployment,
    error::ApiError,
    extract::Payload,
    middleware::{load_comment_middleware, load_issue_middleware, load_project_middleware},
};

pub async fn get_comments(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    Extension(issue): Extension<Issue>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = deployment
        .issue()
        .list_comments(&deployment.db().pool, &actor, &project, &issue)
        .await?;
    Ok(ResponseJson(ApiResponse::success(
        "Comments retrieved",
        comments,
    )))
}

pub async fn get_comment(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    Extension(comment): Extension<Comment>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    deployment
        .issue()
        .ensure_can_read_comment(&deployment.db().pool, &actor, &project)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Comment retrieved", comment)))
}

pub async fn create_comment(
    Extension(actor): Extension<Actor>,
    Extension(project): Extension<Project>,
    Extension(issue): Extension<Issue>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<CreateComment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Comment>>), ApiError> {
    let comment = deployment
        .issue()
        .create_comment(&deployment.db().pool, &actor, &project, &issue, payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success("Comment created", comment)),
    ))
}

pub async fn update_comment(
    Extension(actor): Extension<Actor>,
    Extension(existing_comment): Extension<Comment>,
    State(deployment): State<DeploymentImpl>,
    Payload(payload): Payload<UpdateComment>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    let comment = deployment
        .issue()
        .update_comment(&deployment.db().pool, &actor, &existing_comment, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success("Comment updated", comment)))
}

pub async fn delete_comment(
    Extension(actor): Extension<Actor>,
    Extension(comment): Extension<Comment>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = deployment
        .issue()
        .delete_comment(&deployment.db().pool, &actor, &comment)
        .await?;

    if rows_affected == 0 {
        return Err(ApiError::NotFound("Comment not found".to_string()));
    }

    Ok(ResponseJson(ApiResponse::ok("Comment deleted")))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let comment_id_router = Router::new()
        .route(
            "/projects/{project_id}/issues/{issue_id}/comments/{comment_id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_comment_middleware::<DeploymentImpl>,
        ));

    Router::new()
        .route(
            "/projects/{project_id}/issues/{issue_id}/comments/",
            get(get_comments).post(create_comment),
        )
        .merge(comment_id_router)
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_issue_middleware::<DeploymentImpl>,
        ))
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware::<DeploymentImpl>,
        ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn comment_lifecycle_follows_authorship() {
        let app = TestApp::new().await;
        let alice = app.user("alice@example.com").await;
        let bob = app.user("bob@example.com").await;
        let carol = app.user("carol@example.com").await;
        let project_id = app.create_project(&alice, "Tracker").await;
        app.add_contributor(&alice, project_id, bob.user.id).await;
        let issue_id = app.create_issue(&alice, project_id, "Crash").await;
        let list_uri = format!("/api/projects/{project_id}/issues/{issue_id}/comments/");

        let (status, _) = app
            .send(
                "POST",
                &list_uri,
                Some(&carol.token),
                Some(json!({ "description": "Drive-by" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = app
            .send(
                "POST",
                &list_uri,
                Some(&bob.token),
                Some(json!({ "description": "Reproduced on v2" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["author_user_id"], bob.user.id);
        assert_eq!(json["data"]["issue_id"], issue_id);
        let comment_id = json["data"]["id"].as_i64().unwrap();
        let uri = format!("{list_uri}{comment_id}");

        let (status, json) = app.send("GET", &uri, Some(&alice.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["description"], "Reproduced on v2");
        let (status, _) = app.send("GET", &uri, Some(&carol.token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(
                "PUT",
                &uri,
                Some(&alice.token),
                Some(json!({ "description": "Rewritten by project author" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, json) = app
            .send(
                "PUT",
                &uri,
                Some(&bob.token),
                Some(json!({ "description": "Reproduced on v2 and v3" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["description"], "Reproduced on v2 and v3");

        let (status, _) = app.send("DELETE", &uri, Some(&alice.token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send("DELETE", &uri, Some(&bob.token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = app.send("GET", &list_uri, Some(&bob.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"], json!([]));
    }

    #[tokio::test]
    async fn comment_under_wrong_issue_is_not_found() {
        let app = TestApp::new().await;
        let alice = app.user("alice@example.com").await;
        let project_id = app.create_project(&alice, "Tracker").await;
        let first = app.create_issue(&alice, project_id, "First").await;
        let second = app.create_issue(&alice, project_id, "Second").await;

        let (status, json) = app
            .send(
                "POST",
                &format!("/api/projects/{project_id}/issues/{first}/comments/"),
                Some(&alice.token),
                Some(json!({ "description": "On the first issue" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let comment_id = json["data"]["id"].as_i64().unwrap();

        let (status, json) = app
            .send(
                "GET",
                &format!("/api/projects/{project_id}/issues/{second}/comments/{comment_id}"),
                Some(&alice.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json.get("data").is_none());

        let (status, _) = app
            .send(
                "GET",
                &format!("/api/projects/{project_id}/issues/999/comments/"),
                Some(&alice.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let app = TestApp::new().await;
        let alice = app.user("alice@example.com").await;
        let project_id = app.create_project(&alice, "Tracker").await;
        let issue_id = app.create_issue(&alice, project_id, "Crash").await;

        let (status, json) = app
            .send(
                "POST",
                &format!("/api/projects/{project_id}/issues/{issue_id}/comments/"),
                Some(&alice.token),
                Some(json!({ "description": "   " })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["errors"]["description"].is_array());
    }
}
