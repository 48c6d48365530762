//! Request payload parsing with per-field error reporting.

use std::collections::BTreeMap;

use db::models::{
    comment::{CreateComment, UpdateComment},
    contributor::CreateContributor,
    issue::{CreateIssue, UpdateIssue},
    project::{CreateProject, UpdateProject},
    user::CreateUser,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";
pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const BLANK_MESSAGE: &str = "This field may not be blank.";

pub const PROJECT_TITLE_MAX: usize = 128;
pub const PROJECT_DESCRIPTION_MAX: usize = 1000;
pub const PROJECT_TYPE_MAX: usize = 128;
pub const CONTRIBUTOR_ROLE_MAX: usize = 128;
pub const ISSUE_TITLE_MAX: usize = 128;
pub const ISSUE_DESCRIPTION_MAX: usize = 1000;
pub const COMMENT_DESCRIPTION_MAX: usize = 1000;
pub const EMAIL_MAX: usize = 60;
pub const NAME_MAX: usize = 30;

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("Invalid payload: {}", self.summary())]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn summary(&self) -> String {
        self.0.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Required text field: present, non-blank, at most `max` characters.
    pub fn check_text(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().is_empty() {
            self.add(field, BLANK_MESSAGE);
        } else {
            self.check_max_len(field, value, max);
        }
    }

    /// Same as [`Self::check_text`] for fields a partial update may omit.
    pub fn check_optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            self.check_text(field, value, max);
        }
    }

    fn check_max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.trim().chars().count() > max {
            self.add(
                field,
                format!("Ensure this field has no more than {max} characters."),
            );
        }
    }
}

/// A request body that can be parsed by [`parse_payload`].
pub trait Validate: DeserializeOwned {
    /// Fields that must be present and non-null.
    const REQUIRED_FIELDS: &'static [&'static str] = &[];

    /// Checks that need the parsed value, such as lengths and blank strings.
    fn validate(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

/// Parses `value` into `T`, reporting problems per field: missing required
/// fields first, then type and enum errors, then [`Validate::validate`].
pub fn parse_payload<T: Validate>(value: Value) -> Result<T, FieldErrors> {
    let Value::Object(map) = &value else {
        return Err(FieldErrors::single(
            NON_FIELD_ERRORS,
            "Invalid data. Expected a JSON object.",
        ));
    };

    let mut errors = FieldErrors::new();
    for field in T::REQUIRED_FIELDS {
        if map.get(*field).is_none_or(Value::is_null) {
            errors.add(field, REQUIRED_MESSAGE);
        }
    }
    errors.into_result()?;

    let parsed: T = serde_path_to_error::deserialize(value).map_err(|err| {
        let field = err
            .path()
            .iter()
            .find_map(|segment| match segment {
                serde_path_to_error::Segment::Map { key } => Some(key.clone()),
                _ => None,
            })
            .unwrap_or_else(|| NON_FIELD_ERRORS.to_string());
        FieldErrors::single(&field, err.into_inner().to_string())
    })?;

    parsed.validate()?;
    Ok(parsed)
}

/// Loose shape check: one `@`, something before it, and a dotted domain.
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

impl Validate for CreateUser {
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["email", "first_name", "last_name", "password"];

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_text("email", &self.email, EMAIL_MAX);
        if !self.email.trim().is_empty() && !looks_like_email(&self.email) {
            errors.add("email", "Enter a valid email address.");
        }
        errors.check_text("first_name", &self.first_name, NAME_MAX);
        errors.check_text("last_name", &self.last_name, NAME_MAX);
        if self.password.is_empty() {
            errors.add("password", BLANK_MESSAGE);
        }
        errors.into_result()
    }
}

impl Validate for CreateProject {
    const REQUIRED_FIELDS: &'static [&'static str] = &["title", "description", "type"];

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_text("title", &self.title, PROJECT_TITLE_MAX);
        errors.check_text("description", &self.description, PROJECT_DESCRIPTION_MAX);
        errors.check_text("type", &self.kind, PROJECT_TYPE_MAX);
        errors.into_result()
    }
}

impl Validate for UpdateProject {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_optional_text("title", self.title.as_deref(), PROJECT_TITLE_MAX);
        errors.check_optional_text(
            "description",
            self.description.as_deref(),
            PROJECT_DESCRIPTION_MAX,
        );
        errors.check_optional_text("type", self.kind.as_deref(), PROJECT_TYPE_MAX);
        errors.into_result()
    }
}

impl Validate for CreateContributor {
    const REQUIRED_FIELDS: &'static [&'static str] = &["user_id", "role"];

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_text("role", &self.role, CONTRIBUTOR_ROLE_MAX);
        errors.into_result()
    }
}

impl Validate for CreateIssue {
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "tag",
        "priority",
        "assignee_user_id",
    ];

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_text("title", &self.title, ISSUE_TITLE_MAX);
        errors.check_text("description", &self.description, ISSUE_DESCRIPTION_MAX);
        errors.into_result()
    }
}

impl Validate for UpdateIssue {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_optional_text("title", self.title.as_deref(), ISSUE_TITLE_MAX);
        errors.check_optional_text(
            "description",
            self.description.as_deref(),
            ISSUE_DESCRIPTION_MAX,
        );
        errors.into_result()
    }
}

impl Validate for CreateComment {
    const REQUIRED_FIELDS: &'static [&'static str] = &["description"];

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_text("description", &self.description, COMMENT_DESCRIPTION_MAX);
        errors.into_result()
    }
}

impl Validate for UpdateComment {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_optional_text(
            "description",
            self.description.as_deref(),
            COMMENT_DESCRIPTION_MAX,
        );
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use db::types::{IssuePriority, IssueStatus, IssueTag};
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors = parse_payload::<CreateIssue>(json!({ "description": "d", "tag": null }))
            .unwrap_err();
        for field in ["title", "tag", "priority", "assignee_user_id"] {
            assert_eq!(errors.get(field), Some(&[REQUIRED_MESSAGE.to_string()][..]));
        }
        assert!(!errors.contains("description"));
    }

    #[test]
    fn unknown_enum_value_is_reported_on_its_field() {
        let errors = parse_payload::<CreateIssue>(json!({
            "title": "t",
            "description": "d",
            "tag": "epic",
            "priority": "high",
            "assignee_user_id": 1
        }))
        .unwrap_err();
        assert!(errors.contains("tag"));
        assert!(errors.get("tag").unwrap()[0].contains("epic"));
    }

    #[test]
    fn wrong_type_is_reported_on_its_field() {
        let errors = parse_payload::<CreateContributor>(json!({
            "user_id": "two",
            "role": "dev"
        }))
        .unwrap_err();
        assert!(errors.contains("user_id"));
    }

    #[test]
    fn valid_issue_parses_and_ignores_server_owned_fields() {
        let issue = parse_payload::<CreateIssue>(json!({
            "title": "Crash on start",
            "description": "Stack trace attached",
            "tag": "bug",
            "priority": "medium",
            "status": "inprogress",
            "assignee_user_id": 3,
            "author_user_id": 99,
            "created_time": "2020-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(issue.tag, IssueTag::Bug);
        assert_eq!(issue.priority, IssuePriority::Medium);
        assert_eq!(issue.status, Some(IssueStatus::InProgress));
        assert_eq!(issue.assignee_user_id, 3);
    }

    #[test]
    fn length_and_blank_checks() {
        let errors = parse_payload::<CreateProject>(json!({
            "title": "x".repeat(PROJECT_TITLE_MAX + 1),
            "description": "   ",
            "type": "back-end"
        }))
        .unwrap_err();
        assert!(errors.contains("title"));
        assert_eq!(
            errors.get("description"),
            Some(&[BLANK_MESSAGE.to_string()][..])
        );
        assert!(!errors.contains("type"));
    }

    #[test]
    fn partial_update_accepts_subset() {
        let update = parse_payload::<UpdateProject>(json!({ "title": "Renamed" })).unwrap();
        assert_eq!(update.title.as_deref(), Some("Renamed"));
        assert!(update.description.is_none());

        let errors = parse_payload::<UpdateProject>(json!({ "type": "" })).unwrap_err();
        assert!(errors.contains("type"));
    }

    #[test]
    fn non_object_payload_is_a_non_field_error() {
        let errors = parse_payload::<CreateComment>(json!(["nope"])).unwrap_err();
        assert!(errors.contains(NON_FIELD_ERRORS));
    }

    #[test]
    fn signup_rejects_malformed_email() {
        let errors = parse_payload::<CreateUser>(json!({
            "email": "not-an-address",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "password": "secret"
        }))
        .unwrap_err();
        assert!(errors.contains("email"));

        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("@example.com"));
    }
}
