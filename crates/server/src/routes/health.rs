use axum::response::Json;
use utils_core::response::ApiResponse;

pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::success("OK", "ok".to_string()))
}
