use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::comment;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub description: String,
    pub author_user_id: i64,
    pub issue_id: i64,
    pub created_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateComment {
    pub description: Option<String>,
}

impl Comment {
    fn from_model(model: comment::Model) -> Self {
        Self {
            id: model.id,
            description: model.description,
            author_user_id: model.author_user_id,
            issue_id: model.issue_id,
            created_time: model.created_time,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = comment::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Looks the comment up only if it belongs to `issue_id`.
    pub async fn find_in_issue<C: ConnectionTrait>(
        db: &C,
        issue_id: i64,
        id: i64,
    ) -> Result<Option<Self>, DbErr> {
        let record = comment::Entity::find_by_id(id)
            .filter(comment::Column::IssueId.eq(issue_id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_issue_id<C: ConnectionTrait>(
        db: &C,
        issue_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let records = comment::Entity::find()
            .filter(comment::Column::IssueId.eq(issue_id))
            .order_by_asc(comment::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        issue_id: i64,
        author_user_id: i64,
        data: &CreateComment,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = comment::ActiveModel {
            description: Set(data.description.trim().to_string()),
            author_user_id: Set(author_user_id),
            issue_id: Set(issue_id),
            created_time: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: i64,
        payload: &UpdateComment,
    ) -> Result<Self, DbErr> {
        let record = comment::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Comment not found".to_string()))?;

        let mut active: comment::ActiveModel = record.into();
        if let Some(description) = &payload.description {
            active.description = Set(description.trim().to_string());
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let result = comment::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{issue::fixtures as issues, project::fixtures as projects, user::fixtures as users},
        test_db::setup_db,
    };

    fn payload(description: &str) -> CreateComment {
        CreateComment {
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_issue() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;
        let first = issues::issue(&db, project.id, alice.id, "First").await;
        let second = issues::issue(&db, project.id, alice.id, "Second").await;

        let on_first = Comment::create(&db, first.id, alice.id, &payload("one"))
            .await
            .unwrap();
        Comment::create(&db, second.id, alice.id, &payload("two"))
            .await
            .unwrap();

        let listed = Comment::find_by_issue_id(&db, first.id).await.unwrap();
        assert_eq!(listed, vec![on_first.clone()]);
        assert!(
            Comment::find_in_issue(&db, second.id, on_first.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_and_delete() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;
        let issue = issues::issue(&db, project.id, alice.id, "Issue").await;
        let comment = Comment::create(&db, issue.id, alice.id, &payload("draft"))
            .await
            .unwrap();

        let updated = Comment::update(
            &db,
            comment.id,
            &UpdateComment {
                description: Some(" final ".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.description, "final");
        assert_eq!(updated.author_user_id, alice.id);
        assert_eq!(updated.issue_id, issue.id);

        assert_eq!(Comment::delete(&db, comment.id).await.unwrap(), 1);
        assert!(Comment::find_by_id(&db, comment.id).await.unwrap().is_none());
    }
}
