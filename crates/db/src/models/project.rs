use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{comment, contributor, issue, project};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub author_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Project {
    fn from_model(model: project::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            kind: model.kind,
            author_user_id: model.author_user_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    /// Projects the user authored or contributes to, oldest first.
    pub async fn find_accessible_by_user<C: ConnectionTrait>(
        db: &C,
        user_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let contributed: Vec<i64> = contributor::Entity::find()
            .select_only()
            .column(contributor::Column::ProjectId)
            .filter(contributor::Column::UserId.eq(user_id))
            .into_tuple()
            .all(db)
            .await?;

        let mut condition = Condition::any().add(project::Column::AuthorUserId.eq(user_id));
        if !contributed.is_empty() {
            condition = condition.add(project::Column::Id.is_in(contributed));
        }

        let records = project::Entity::find()
            .filter(condition)
            .order_by_asc(project::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProject,
        author_user_id: i64,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = project::ActiveModel {
            title: Set(data.title.trim().to_string()),
            description: Set(data.description.trim().to_string()),
            kind: Set(data.kind.trim().to_string()),
            author_user_id: Set(author_user_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: i64,
        payload: &UpdateProject,
    ) -> Result<Self, DbErr> {
        let record = project::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let mut active: project::ActiveModel = record.into();
        if let Some(title) = &payload.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = &payload.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(kind) = &payload.kind {
            active.kind = Set(kind.trim().to_string());
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Deletes the project together with its contributors, issues and their
    /// comments. Run it inside a transaction.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<u64, DbErr> {
        let issue_ids: Vec<i64> = issue::Entity::find()
            .select_only()
            .column(issue::Column::Id)
            .filter(issue::Column::ProjectId.eq(id))
            .into_tuple()
            .all(db)
            .await?;

        if !issue_ids.is_empty() {
            comment::Entity::delete_many()
                .filter(comment::Column::IssueId.is_in(issue_ids))
                .exec(db)
                .await?;
        }
        issue::Entity::delete_many()
            .filter(issue::Column::ProjectId.eq(id))
            .exec(db)
            .await?;
        contributor::Entity::delete_many()
            .filter(contributor::Column::ProjectId.eq(id))
            .exec(db)
            .await?;

        let result = project::Entity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}


#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait, TransactionTrait};

    use super::*;
    use crate::{
        models::{
            comment::{Comment, CreateComment},
            contributor::{Contributor, CreateContributor},
            issue::{CreateIssue, Issue},
            user::fixtures as users,
        },
        test_db::setup_db,
        types::{IssuePriority, IssueTag},
    };

    #[tokio::test]
    async fn accessible_projects_include_authored_and_contributed() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let bob = users::user(&db, "bob@example.com").await;

        let own = fixtures::project(&db, alice.id, "Alice's").await;
        let shared = fixtures::project(&db, bob.id, "Bob's shared").await;
        let _private = fixtures::project(&db, bob.id, "Bob's private").await;

        Contributor::create(
            &db,
            shared.id,
            &CreateContributor {
                user_id: alice.id,
                permission: None,
                role: "dev".to_string(),
            },
        )
        .await
        .unwrap();

        let visible = Project::find_accessible_by_user(&db, alice.id).await.unwrap();
        let ids: Vec<i64> = visible.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![own.id, shared.id]);
    }

    #[tokio::test]
    async fn update_keeps_author_and_omitted_fields() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let project = fixtures::project(&db, alice.id, "Before").await;

        let updated = Project::update(
            &db,
            project.id,
            &UpdateProject {
                title: Some("After".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.title, "After");
        assert_eq!(updated.description, project.description);
        assert_eq!(updated.kind, project.kind);
        assert_eq!(updated.author_user_id, alice.id);
        assert_eq!(updated.created_at, project.created_at);
    }

    #[tokio::test]
    async fn delete_removes_owned_rows() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let bob = users::user(&db, "bob@example.com").await;
        let project = fixtures::project(&db, alice.id, "Doomed").await;
        let survivor = fixtures::project(&db, alice.id, "Survivor").await;

        Contributor::create(
            &db,
            project.id,
            &CreateContributor {
                user_id: bob.id,
                permission: None,
                role: "qa".to_string(),
            },
        )
        .await
        .unwrap();
        let issue = Issue::create(
            &db,
            project.id,
            alice.id,
            &CreateIssue {
                title: "Crash".to_string(),
                description: "It crashes".to_string(),
                tag: IssueTag::Bug,
                priority: IssuePriority::High,
                status: None,
                assignee_user_id: bob.id,
            },
        )
        .await
        .unwrap();
        Comment::create(
            &db,
            issue.id,
            bob.id,
            &CreateComment {
                description: "Reproduced".to_string(),
            },
        )
        .await
        .unwrap();

        let tx = db.begin().await.unwrap();
        assert_eq!(Project::delete(&tx, project.id).await.unwrap(), 1);
        tx.commit().await.unwrap();

        assert!(Project::find_by_id(&db, project.id).await.unwrap().is_none());
        assert!(Project::find_by_id(&db, survivor.id).await.unwrap().is_some());
        assert_eq!(
            crate::entities::contributor::Entity::find().count(&db).await.unwrap(),
            0
        );
        assert_eq!(
            crate::entities::issue::Entity::find().count(&db).await.unwrap(),
            0
        );
        assert_eq!(
            crate::entities::comment::Entity::find().count(&db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn delete_missing_project_affects_nothing() {
        let db = setup_db().await;
        assert_eq!(Project::delete(&db, 999).await.unwrap(), 0);
    }
}
