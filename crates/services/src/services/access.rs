//! Who may do what to a project and the issues and comments inside it.
//!
//! Every check is a pure function over an [`Actor`] and a snapshot of the
//! project's membership. Callers load the snapshot once per request and log
//! denials themselves.

use std::collections::HashSet;

use thiserror::Error;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub email: String,
}

/// Author and contributor ids of one project at the time of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMembership {
    pub author_user_id: i64,
    pub contributor_ids: HashSet<i64>,
}

impl ProjectMembership {
    pub fn new(author_user_id: i64, contributor_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            author_user_id,
            contributor_ids: contributor_ids.into_iter().collect(),
        }
    }

    pub fn is_author(&self, user_id: i64) -> bool {
        self.author_user_id == user_id
    }

    pub fn is_contributor(&self, user_id: i64) -> bool {
        self.contributor_ids.contains(&user_id)
    }

    pub fn is_member(&self, user_id: i64) -> bool {
        self.is_author(user_id) || self.is_contributor(user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRole {
    /// Author or contributor.
    Member,
    Author,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedResource {
    Issue,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("You do not have access to this project")]
    NoAccess,
    #[error("Only the project author can perform this action")]
    NotProjectAuthor,
    #[error("Only the project author can add a contributor, and only once per user")]
    ContributorAddNotAllowed,
    #[error("Only the issue author can perform this action")]
    NotIssueAuthor,
    #[error("Only the comment author can perform this action")]
    NotCommentAuthor,
}

pub fn require_project_role(
    actor: &Actor,
    membership: &ProjectMembership,
    role: ProjectRole,
) -> Result<(), AccessDenied> {
    match role {
        ProjectRole::Member if membership.is_member(actor.user_id) => Ok(()),
        ProjectRole::Member => Err(AccessDenied::NoAccess),
        ProjectRole::Author if membership.is_author(actor.user_id) => Ok(()),
        ProjectRole::Author => Err(AccessDenied::NotProjectAuthor),
    }
}

/// Only the author may add, and never a user who already has a contributor row.
pub fn require_contributor_addable(
    actor: &Actor,
    membership: &ProjectMembership,
    candidate_user_id: i64,
) -> Result<(), AccessDenied> {
    if !membership.is_author(actor.user_id) || membership.is_contributor(candidate_user_id) {
        return Err(AccessDenied::ContributorAddNotAllowed);
    }
    Ok(())
}

/// Issues and comments can only be changed by whoever created them; being the
/// project author is not enough.
pub fn require_authorship(
    actor: &Actor,
    author_user_id: i64,
    resource: OwnedResource,
) -> Result<(), AccessDenied> {
    if actor.user_id == author_user_id {
        return Ok(());
    }
    Err(match resource {
        OwnedResource::Issue => AccessDenied::NotIssueAuthor,
        OwnedResource::Comment => AccessDenied::NotCommentAuthor,
    })
}
