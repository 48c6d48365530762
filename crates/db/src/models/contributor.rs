use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{entities::contributor, types::ContributorPermission};

#[derive(Debug, Error)]
pub enum ContributorError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("User is already a contributor of this project")]
    AlreadyExists,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contributor {
    pub id: i64,
    pub user_id: i64,
    pub project_id: i64,
    pub permission: ContributorPermission,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContributor {
    pub user_id: i64,
    pub permission: Option<ContributorPermission>,
    pub role: String,
}

impl Contributor {
    fn from_model(model: contributor::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            project_id: model.project_id,
            permission: model.permission,
            role: model.role,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
    ) -> Result<Vec<Self>, DbErr> {
        let records = contributor::Entity::find()
            .filter(contributor::Column::ProjectId.eq(project_id))
            .order_by_asc(contributor::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn user_ids_for_project<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
    ) -> Result<Vec<i64>, DbErr> {
        contributor::Entity::find()
            .select_only()
            .column(contributor::Column::UserId)
            .filter(contributor::Column::ProjectId.eq(project_id))
            .into_tuple()
            .all(db)
            .await
    }

    /// Inserts the contributor row; the unique `(project_id, user_id)` index
    /// turns a lost race into `AlreadyExists`.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
        data: &CreateContributor,
    ) -> Result<Self, ContributorError> {
        let active = contributor::ActiveModel {
            user_id: Set(data.user_id),
            project_id: Set(project_id),
            permission: Set(data.permission.unwrap_or_default()),
            role: Set(data.role.trim().to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match active.insert(db).await {
            Ok(model) => Ok(Self::from_model(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ContributorError::AlreadyExists)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete_by_project_and_user<C: ConnectionTrait>(
        db: &C,
        project_id: i64,
        user_id: i64,
    ) -> Result<u64, DbErr> {
        let result = contributor::Entity::delete_many()
            .filter(contributor::Column::ProjectId.eq(project_id))
            .filter(contributor::Column::UserId.eq(user_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{project::fixtures as projects, user::fixtures as users},
        test_db::setup_db,
    };

    fn payload(user_id: i64) -> CreateContributor {
        CreateContributor {
            user_id,
            permission: None,
            role: " developer ".to_string(),
        }
    }

    #[tokio::test]
    async fn create_defaults_permission_and_trims_role() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let bob = users::user(&db, "bob@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;

        let contributor = Contributor::create(&db, project.id, &payload(bob.id))
            .await
            .unwrap();
        assert_eq!(contributor.permission, ContributorPermission::Contributor);
        assert_eq!(contributor.role, "developer");
        assert_eq!(
            Contributor::user_ids_for_project(&db, project.id).await.unwrap(),
            vec![bob.id]
        );
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected_by_the_store() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let bob = users::user(&db, "bob@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;

        Contributor::create(&db, project.id, &payload(bob.id))
            .await
            .unwrap();
        let second = Contributor::create(&db, project.id, &payload(bob.id)).await;

        assert!(matches!(second, Err(ContributorError::AlreadyExists)));
        assert_eq!(
            Contributor::find_by_project_id(&db, project.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn delete_only_touches_the_given_pair() {
        let db = setup_db().await;
        let alice = users::user(&db, "alice@example.com").await;
        let bob = users::user(&db, "bob@example.com").await;
        let carol = users::user(&db, "carol@example.com").await;
        let project = projects::project(&db, alice.id, "P").await;

        Contributor::create(&db, project.id, &payload(bob.id))
            .await
            .unwrap();
        Contributor::create(&db, project.id, &payload(carol.id))
            .await
            .unwrap();

        assert_eq!(
            Contributor::delete_by_project_and_user(&db, project.id, bob.id)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            Contributor::delete_by_project_and_user(&db, project.id, bob.id)
                .await
                .unwrap(),
            0
        );
        let remaining: Vec<i64> = Contributor::find_by_project_id(&db, project.id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.user_id)
            .collect();
        assert_eq!(remaining, vec![carol.id]);
    }
}
