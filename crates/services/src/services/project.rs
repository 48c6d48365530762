use db::{
    DbErr, DbPool, TransactionTrait,
    models::{
        contributor::{Contributor, ContributorError, CreateContributor},
        project::{CreateProject, Project, UpdateProject},
        user::User,
    },
};
use thiserror::Error;

use super::{
    access::{
        AccessDenied, Actor, ProjectMembership, ProjectRole, require_contributor_addable,
        require_project_role,
    },
    validation::FieldErrors,
};

pub const UNKNOWN_USER_MESSAGE: &str = "Invalid user id - object does not exist.";

#[derive(Debug, Error)]
pub enum ProjectServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("Contributor not found")]
    ContributorNotFound,
}

pub type Result<T> = std::result::Result<T, ProjectServiceError>;

/// Snapshot of who belongs to `project` right now.
pub async fn project_membership(
    pool: &DbPool,
    project: &Project,
) -> std::result::Result<ProjectMembership, DbErr> {
    let contributor_ids = Contributor::user_ids_for_project(pool, project.id).await?;
    Ok(ProjectMembership::new(project.author_user_id, contributor_ids))
}

fn log_denied(actor: &Actor, project_id: i64, denied: AccessDenied) -> AccessDenied {
    tracing::debug!(
        user_id = actor.user_id,
        project_id,
        reason = %denied,
        "Project access denied"
    );
    denied
}

#[derive(Clone, Default)]
pub struct ProjectService;

impl ProjectService {
    pub fn new() -> Self {
        Self
    }

    async fn require_role(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        role: ProjectRole,
    ) -> Result<ProjectMembership> {
        let membership = project_membership(pool, project).await?;
        require_project_role(actor, &membership, role)
            .map_err(|denied| log_denied(actor, project.id, denied))?;
        Ok(membership)
    }

    pub async fn list_projects(&self, pool: &DbPool, actor: &Actor) -> Result<Vec<Project>> {
        Ok(Project::find_accessible_by_user(pool, actor.user_id).await?)
    }

    /// Succeeds when the actor may read `project` and anything inside it.
    pub async fn ensure_member(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
    ) -> Result<()> {
        self.require_role(pool, actor, project, ProjectRole::Member)
            .await
            .map(|_| ())
    }

    pub async fn create_project(
        &self,
        pool: &DbPool,
        actor: &Actor,
        payload: CreateProject,
    ) -> Result<Project> {
        let project = Project::create(pool, &payload, actor.user_id).await?;
        tracing::info!(
            project_id = project.id,
            user_id = actor.user_id,
            "Created project"
        );
        Ok(project)
    }

    pub async fn update_project(
        &self,
        pool: &DbPool,
        actor: &Actor,
        existing: &Project,
        payload: UpdateProject,
    ) -> Result<Project> {
        self.require_role(pool, actor, existing, ProjectRole::Author)
            .await?;
        Ok(Project::update(pool, existing.id, &payload).await?)
    }

    /// Removes the project with its contributors, issues and comments in one
    /// transaction.
    pub async fn delete_project(
        &self,
        pool: &DbPool,
        actor: &Actor,
        existing: &Project,
    ) -> Result<u64> {
        self.require_role(pool, actor, existing, ProjectRole::Author)
            .await?;

        let tx = pool.begin().await?;
        let rows_affected = Project::delete(&tx, existing.id).await?;
        tx.commit().await?;

        tracing::info!(project_id = existing.id, "Deleted project");
        Ok(rows_affected)
    }

    pub async fn list_contributors(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
    ) -> Result<Vec<Contributor>> {
        self.require_role(pool, actor, project, ProjectRole::Member)
            .await?;
        Ok(Contributor::find_by_project_id(pool, project.id).await?)
    }

    pub async fn add_contributor(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        payload: CreateContributor,
    ) -> Result<Contributor> {
        let membership = project_membership(pool, project).await?;
        self.insert_contributor(pool, actor, project, &membership, payload)
            .await
    }

    /// Checks `membership` and inserts the row. A concurrent insert of the same
    /// pair is reported the same way as a pre-existing contributor.
    async fn insert_contributor(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        membership: &ProjectMembership,
        payload: CreateContributor,
    ) -> Result<Contributor> {
        require_contributor_addable(actor, membership, payload.user_id)
            .map_err(|denied| log_denied(actor, project.id, denied))?;

        if !User::exists(pool, payload.user_id).await? {
            return Err(FieldErrors::single("user_id", UNKNOWN_USER_MESSAGE).into());
        }

        let contributor = Contributor::create(pool, project.id, &payload)
            .await
            .map_err(|e| match e {
                ContributorError::AlreadyExists => ProjectServiceError::Forbidden(log_denied(
                    actor,
                    project.id,
                    AccessDenied::ContributorAddNotAllowed,
                )),
                ContributorError::Database(e) => ProjectServiceError::Database(e),
            })?;

        tracing::info!(
            project_id = project.id,
            user_id = contributor.user_id,
            "Added contributor"
        );
        Ok(contributor)
    }

    pub async fn remove_contributor(
        &self,
        pool: &DbPool,
        actor: &Actor,
        project: &Project,
        user_id: i64,
    ) -> Result<()> {
        self.require_role(pool, actor, project, ProjectRole::Author)
            .await?;

        let rows_affected =
            Contributor::delete_by_project_and_user(pool, project.id, user_id).await?;
        if rows_affected == 0 {
            return Err(ProjectServiceError::ContributorNotFound);
        }

        tracing::info!(project_id = project.id, user_id, "Removed contributor");
        Ok(())
    }
}
