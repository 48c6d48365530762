use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;

use crate::{DeploymentImpl, routes};

mod auth;

pub fn router(deployment: DeploymentImpl) -> Router {
    let protected_routes = Router::new()
        .merge(routes::projects::router(&deployment))
        .merge(routes::contributors::router(&deployment))
        .merge(routes::issues::router(&deployment))
        .merge(routes::comments::router(&deployment))
        .layer(from_fn_with_state(deployment.clone(), auth::require_auth));

    let api_routes = Router::new()
        .merge(routes::auth::router())
        .merge(protected_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
