use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::user;

/// Public view of a user; the password hash never leaves this module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find_by_id(id).one(db).await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_credentials_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Credentials>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?;
        Ok(record.map(|model| {
            let password_hash = model.password_hash.clone();
            Credentials {
                user: Self::from_model(model),
                password_hash,
            }
        }))
    }

    pub async fn exists<C: ConnectionTrait>(db: &C, id: i64) -> Result<bool, DbErr> {
        Ok(Self::find_by_id(db, id).await?.is_some())
    }

    /// Inserts a user whose password has already been hashed by the caller.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUser,
        password_hash: &str,
    ) -> Result<Self, DbErr> {
        let active = user::ActiveModel {
            email: Set(normalize_email(&data.email)),
            first_name: Set(data.first_name.trim().to_string()),
            last_name: Set(data.last_name.trim().to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db::setup_db;

    #[tokio::test]
    async fn emails_are_normalized_and_unique() {
        let db = setup_db().await;
        let created = fixtures::user(&db, "  Alice@Example.COM ").await;
        assert_eq!(created.email, "alice@example.com");

        let found = User::find_by_email(&db, "ALICE@example.com")
            .await
            .unwrap()
            .expect("user by email");
        assert_eq!(found.id, created.id);

        let duplicate = User::create(
            &db,
            &CreateUser {
                email: "alice@example.com".to_string(),
                first_name: "A".to_string(),
                last_name: "B".to_string(),
                password: String::new(),
            },
            "hash",
        )
        .await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn credentials_expose_stored_hash() {
        let db = setup_db().await;
        fixtures::user(&db, "bob@example.com").await;

        let credentials = User::find_credentials_by_email(&db, "bob@example.com")
            .await
            .unwrap()
            .expect("credentials");
        assert_eq!(credentials.password_hash, "not-a-real-hash");
        assert!(
            User::find_credentials_by_email(&db, "nobody@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }
}
