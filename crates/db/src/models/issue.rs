use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};

use crate::{
    entities::{comment, issue},
    types::{IssuePriority, IssueStatus, IssueTag},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tag: IssueTag,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub project_id: i64,
    pub author_user_id: i64,
    pub assignee_user_id: i64,
    pub created_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssue {
    pub title: String,
    pub description: String,
    pub tag: IssueTag,
    pub priority: IssuePriority,
    pub status: Option<IssueStatus>,
    pub assignee_user_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIssue {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<IssueTag>,
    pub priority: Option<IssuePriority>,
    pub status: Option<IssueStatus>,
    pub assignee_user_id: Option<i64>,
}

impl Issue {
    fn from_model(model: issue::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            tag: model.tag,
            priority: model.priority,
            status: model.status,
            project_id: model.project_id,
            author_user_id: model.author_user_id,
            assignee_user_id: model.assignee_user_id,
            created_time: model.created_time,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = issue::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Looks the issue up only if it belongs to `project_id`.
    pub async fn find_in_project<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
        id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = issue::Entity::find_by_id(id)
            .filter(issue::Column::ProjectId.eq(project_id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let records = issue::Entity::find()
            .filter(issue::Column::ProjectId.eq(project_id))
            .order_by_asc(issue::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
        author_user_id: i64,
        data: &CreateIssue,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = issue::ActiveModel {
            title: Set(data.title.trim().to_string()),
            description: Set(data.description.trim().to_string()),
            tag: Set(data.tag),
            priority: Set(data.priority),
            status: Set(data.status.unwrap_or_default()),
            project_id: Set(project_id),
            author_user_id: Set(author_user_id),
            assignee_user_id: Set(data.assignee_user_id),
            created_time: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Applies the fields present in `payload`; project and author never change.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: i64,
        payload: &UpdateIssue,
    ) -> Result<Self, DbErr> {
        let record = issue::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Issue not found".to_string()))?;

        let mut active: issue::ActiveModel = record.into();
        if let Some(title) = &payload.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = &payload.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(tag) = payload.tag {
            active.tag = Set(tag);
        }
        if let Some(priority) = payload.priority {
            active.priority = Set(priority);
        }
        if let Some(status) = payload.status {
            active.status = Set(status);
        }
        if let Some(assignee_user_id) = payload.assignee_user_id {
            active.assignee_user_id = Set(assignee_user_id);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Deletes the issue and its comments. Run it inside a transaction.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        comment::Entity::delete_many()
            .filter(comment::Column::IssueId.eq(id))
            .exec(db)
            .await?;
        let result = issue::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}


#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::{
        models::{
            comment::{Comment, CreateComment},
            project::fixtures as projects,
            user::fixtures as users,
        },
        test_db::setup_db,
    };

    #[tokio::test]
    async fn create_defaults_status_to_todo() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;

        let issue = fixtures::issue(&db, project.id, alice.id, "First").await;
        assert_eq!(issue.status, IssueStatus::Todo);
        assert_eq!(issue.project_id, project.id);
        assert_eq!(issue.author_user_id, alice.id);
    }

    #[tokio::test]
    async fn find_in_project_rejects_foreign_issue() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let first = projects::project(&db, alice.id, "First").await;
        let second = projects::project(&db, alice.id, "Second").await;
        let issue = fixtures::issue(&db, first.id, alice.id, "Belongs to first").await;

        assert!(
            Issue::find_in_project(&db, first.id, issue.id)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            Issue::find_in_project(&db, second.id, issue.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let bob = users::user(&db, "bob@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;
        let issue = fixtures::issue(&db, project.id, alice.id, "Original").await;

        let updated = Issue::update(
            &db,
            issue.id,
            &UpdateIssue {
                status: Some(IssueStatus::InProgress),
                assignee_user_id: Some(bob.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, IssueStatus::InProgress);
        assert_eq!(updated.assignee_user_id, bob.id);
        assert_eq!(updated.title, "Original");
        assert_eq!(updated.author_user_id, alice.id);
        assert_eq!(updated.project_id, project.id);
    }

    #[tokio::test]
    async fn delete_removes_comments() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;
        let issue = fixtures::issue(&db, project.id, alice.id, "Doomed").await;
        Comment::create(
            &db,
            issue.id,
            alice.id,
            &CreateComment {
                description: "note".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(Issue::delete(&db, issue.id).await.unwrap(), 1);
        assert!(Issue::find_by_id(&db, issue.id).await.unwrap().is_none());
        assert_eq!(comment::Entity::find().count(&db).await.unwrap(), 0);
    }
}
