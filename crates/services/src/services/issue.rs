use db::{
    DbErr, DbPool, TransactionTrait,
    models::{
        comment::{Comment, CreateComment, UpdateComment},
        issue::{CreateIssue, Issue, UpdateIssue},
        project::Project,
        user::User,
    },
};
use thiserror::Error;

use super::{
    access::{
        AccessDenied, Actor, OwnedResource, ProjectRole, require_authorship, require_project_role,
    },
    project::{UNKNOWN_USER_MESSAGE, project_membership},
    validation::FieldErrors,
};

#[derive(Debug, Error)]
pub enum IssueServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error(transparent)]
    Validation(#[from] FieldErrors),
}

pub type Result<T> = std::result::Result<T, IssueServiceError>;

#[derive(Clone, Default)]
pub struct IssueService;

impl IssueService {
    pub fn new() -> Self {
        Self
    }

    async fn require_member(&self, pool: &DbPool, actor: &Actor, project: &Project) -> Result<()> {
        let membership = project_membership(pool, project).await?;
        require_project_role(actor, &membership, ProjectRole::Member).map_err(|denied| {
            tracing::debug!(
                user_id = actor.user_id,
                project_id = project.id,
                reason = %denied,
                "Issue access denied"
            );
            denied
        })?;
        Ok(())
    }

    fn require_author(actor: &Actor, author_user_id: i64, resource: OwnedResource) -> Result<()> {
        require_authorship(actor, author_user_id, resource).map_err(|denied| {
            tracing::debug!(
                user_id = actor.user_id,
                author_user_id,
                reason = %denied,
                "Modification denied"
            );
            denied
        })?;
        Ok(())
    }

    async fn require_assignee(pool: &DbPool, assignee_user_id: i64) -> Result<()> {
        if !User::exists(pool, assignee_user_id).await? {
            return Err(FieldErrors::single("assignee_user_id", UNKNOWN_USER_MESSAGE).into());
        }
        Ok(())
    }

    pub async fn list_issues(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
    ) -> Result<Vec<Issue>> {
        self.require_member(pool, actor, project).await?;
        Ok(Issue::find_by_project_id(pool, project.id).await?)
    }

    pub async fn create_issue(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        payload: CreateIssue,
    ) -> Result<Issue> {
        self.require_member(pool, actor, project).await?;
        Self::require_assignee(pool, payload.assignee_user_id).await?;

        let issue = Issue::create(pool, project.id, actor.user_id, &payload).await?;
        tracing::info!(
            issue_id = issue.id,
            project_id = project.id,
            user_id = actor.user_id,
            "Created issue"
        );
        Ok(issue)
    }

    pub async fn update_issue(
        &self,
        pool: &DbPool,
        actor: &Actor,
        existing: &Issue,
        payload: UpdateIssue,
    ) -> Result<Issue> {
        Self::require_author(actor, existing.author_user_id, OwnedResource::Issue)?;
        if let Some(assignee_user_id) = payload.assignee_user_id {
            Self::require_assignee(pool, assignee_user_id).await?;
        }
        Ok(Issue::update(pool, existing.id, &payload).await?)
    }

    pub async fn delete_issue(
        &self,
        pool: &DbPool,
        actor: &Actor,
        existing: &Issue,
    ) -> Result<u64> {
        Self::require_author(actor, existing.author_user_id, OwnedResource::Issue)?;

        let tx = pool.begin().await?;
        let rows_affected = Issue::delete(&tx, existing.id).await?;
        tx.commit().await?;

        tracing::info!(issue_id = existing.id, "Deleted issue");
        Ok(rows_affected)
    }

    pub async fn list_comments(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        issue: &Issue,
    ) -> Result<Vec<Comment>> {
        self.require_member(pool, actor, project).await?;
        Ok(Comment::find_by_issue_id(pool, issue.id).await?)
    }

    /// Read access to a single comment follows project membership.
    pub async fn ensure_can_read_comment(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
    ) -> Result<()> {
        self.require_member(pool, actor, project).await
    }

    pub async fn create_comment(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        issue: &Issue,
        payload: CreateComment,
    ) -> Result<Comment> {
        self.require_member(pool, actor, project).await?;

        let comment = Comment::create(pool, issue.id, actor.user_id, &payload).await?;
        tracing::info!(
            comment_id = comment.id,
            issue_id = issue.id,
            user_id = actor.user_id,
            "Created comment"
        );
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        pool: &DbPool,
        actor: &Actor,
        existing: &Comment,
        payload: UpdateComment,
    ) -> Result<Comment> {
        Self::require_author(actor, existing.author_user_id, OwnedResource::Comment)?;
        Ok(Comment::update(pool, existing.id, &payload).await?)
    }

    pub async fn delete_comment(
        &self,
        pool: &DbPool,
        actor: &Actor,
        existing: &Comment,
    ) -> Result<u64> {
        Self::require_author(actor, existing.author_user_id, OwnedResource::Comment)?;
        let rows_affected = Comment::delete(pool, existing.id).await?;
        tracing::info!(comment_id = existing.id, "Deleted comment");
        Ok(rows_affected)
    }
}
