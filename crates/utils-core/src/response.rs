use serde::Serialize;

/// JSON envelope shared by every API response.
///
/// `data` is only emitted on success and `errors` only on validation failures,
/// so a 404 body carries nothing but `success` and `message`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T, E = ()> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<E>,
}

impl<T, E> ApiResponse<T, E> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    /// Success without a payload (deletes).
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            errors: None,
        }
    }

    pub fn error_with_details(message: &str, errors: E) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            errors: Some(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ApiResponse;

    #[test]
    fn error_envelope_omits_data_and_errors() {
        let response = ApiResponse::<()>::error("Project not found");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "success": false, "message": "Project not found" })
        );
    }

    #[test]
    fn success_envelope_carries_data() {
        let response = ApiResponse::<_>::success("Project created", json!({ "id": 1 }));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["message"], json!("Project created"));
        assert_eq!(value["data"]["id"], json!(1));
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn validation_envelope_carries_field_errors() {
        let response = ApiResponse::<(), _>::error_with_details(
            "Validation failed",
            json!({ "title": ["This field is required."] }),
        );
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["errors"]["title"][0], json!("This field is required."));
    }
}
