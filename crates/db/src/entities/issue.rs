use sea_orm::entity::prelude::*;

use crate::types::{IssuePriority, IssueStatus, IssueTag};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "issues")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tag: IssueTag,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub project_id: i64,
    pub author_user_id: i64,
    pub assignee_user_id: i64,
    pub created_time: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
