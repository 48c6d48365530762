use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use config::{AuthConfig, Config};
use db::models::user::{CreateUser, User};
use serde_json::Value;
use tower::ServiceExt;

use crate::{DeploymentImpl, deployment::Deployment, http};

pub struct TestApp {
    deployment: DeploymentImpl,
}

pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestApp {
    /// Fresh in-memory database with migrations applied.
    pub async fn new() -> Self {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_ttl_secs: 3600,
            },
            ..Config::default()
        };
        let deployment = DeploymentImpl::from_config(config).await.unwrap();
        Self { deployment }
    }

    pub fn deployment(&self) -> &DeploymentImpl {
        &self.deployment
    }

    pub fn router(&self) -> Router {
        http::router(self.deployment.clone())
    }

    /// Inserts a user directly and issues a token for them, skipping the
    /// password hashing done by signup.
    pub async fn user(&self, email: &str) -> TestUser {
        let user = User::create(
            &self.deployment.db().pool,
            &CreateUser {
                email: email.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                password: String::new(),
            },
            "unused-hash",
        )
        .await
        .unwrap();
        let token = self
            .deployment
            .auth()
            .tokens()
            .issue(user.id, &user.email)
            .unwrap();
        TestUser { user, token }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn create_project(&self, author: &TestUser, title: &str) -> i64 {
        let (status, json) = self
            .send(
                "POST",
                "/api/projects/",
                Some(&author.token),
                Some(serde_json::json!({
                    "title": title,
                    "description": "Issue tracker",
                    "type": "back-end"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_i64().unwrap()
    }

    pub async fn add_contributor(&self, author: &TestUser, project_id: i64, user_id: i64) {
        let (status, json) = self
            .send(
                "POST",
                &format!("/api/projects/{project_id}/users/"),
                Some(&author.token),
                Some(serde_json::json!({ "user_id": user_id, "role": "developer" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
    }

    pub async fn create_issue(&self, author: &TestUser, project_id: i64, title: &str) -> i64 {
        let (status, json) = self
            .send(
                "POST",
                &format!("/api/projects/{project_id}/issues/"),
                Some(&author.token),
                Some(serde_json::json!({
                    "title": title,
                    "description": "Steps to reproduce",
                    "tag": "bug",
                    "priority": "high",
                    "assignee_user_id": author.user.id
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["id"].as_i64().unwrap()
    }
}

pub async fn body_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
