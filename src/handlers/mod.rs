//! HTTP handlers, grouped by resource.
//!
//! Every handler follows the same order: resolve the actor's scope, load the
//! target through a scoped lookup (missing and invisible are both 404),
//! authorize the mutation, validate, write, then emit an audit event.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Initiative, Task, User},
    policy::{self, Actor, EntityKind},
    repository::RepositoryState,
};

pub mod dashboard;
pub mod districts;
pub mod documents;
pub mod initiatives;
pub mod notes;
pub mod reports;
pub mod tasks;
pub mod users;

/// Structured audit event for a completed mutation.
pub(crate) fn audit(actor: &Actor, action: &str, kind: EntityKind, id: Uuid) {
    tracing::info!(
        actor = %actor.id,
        role = actor.role.as_str(),
        action,
        entity = kind.as_str(),
        entity_id = %id,
        "audit"
    );
}

/// Refuses creation for read-only accounts.
pub(crate) fn require_author(actor: &Actor, kind: EntityKind) -> AppResult<()> {
    policy::authorize(actor, policy::can_author(actor), "create", kind, None)
}

/// Refuses user and district management for non-admins.
pub(crate) fn require_admin(actor: &Actor, action: &str, kind: EntityKind, id: Option<Uuid>) -> AppResult<()> {
    policy::authorize(actor, policy::can_administer(actor), action, kind, id)
}

/// An initiative the actor can see, for use as the parent of a new record.
/// An invisible parent is an input error, not a 404 on the request path.
pub(crate) async fn parent_initiative(repo: &RepositoryState, actor: &Actor, id: Uuid) -> AppResult<Initiative> {
    repo.get_initiative(&policy::scope(actor), id)
        .await?
        .ok_or_else(|| AppError::invalid("the selected initiative does not exist"))
}

/// A task the actor can see that belongs to `initiative_id`.
pub(crate) async fn parent_task(repo: &RepositoryState, actor: &Actor, id: Uuid, initiative_id: Uuid) -> AppResult<Task> {
    let task = repo
        .get_task(&policy::scope(actor), id)
        .await?
        .ok_or_else(|| AppError::invalid("the selected task does not exist"))?;
    if task.initiative_id != initiative_id {
        return Err(AppError::invalid("the selected task belongs to a different initiative"));
    }
    Ok(task)
}

/// Resolves and checks a task assignee.
pub(crate) async fn assignee(repo: &RepositoryState, actor: &Actor, id: Uuid) -> AppResult<User> {
    let user = repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::invalid("the selected assignee does not exist"))?;
    policy::authorize(actor, policy::can_assign(actor, &user), "assign", EntityKind::Task, None)?;
    Ok(user)
}
