/// Authorization policy for tasks, assignments, and comments
///
/// This module is the single place where access decisions are made. The
/// decision functions are pure: they consult only the snapshot passed in,
/// never the database, so every rule is unit-testable and the call sites
/// stay thin.
///
/// # Permission Model
///
/// - **Owner**: the user recorded at task creation. Sole holder of
///   update/delete rights and of the right to assign/unassign users.
///   Ownership is never transferred.
/// - **Assignee**: a user named in a task assignment. Gains read access
///   to the task, nothing more.
/// - **Author**: the user who wrote a comment. Sole holder of the right
///   to delete it; the task owner has no power over other people's
///   comments.
/// - Any authenticated user may create tasks and comments, and may read
///   any task's comment list.
///
/// Existence is a separate question from permission: callers must check
/// that the target resource exists (and report "not found") *before*
/// asking for a decision, so probing a nonexistent id never reveals
/// whether an id would have been forbidden.
///
/// # Example
///
/// ```
/// use taskhub_shared::auth::authorization::{authorize_task, TaskAccess, TaskAction};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let assignee = Uuid::new_v4();
/// let access = TaskAccess::new(owner, vec![assignee]);
///
/// assert!(authorize_task(assignee, TaskAction::Read, &access).is_ok());
/// assert!(authorize_task(assignee, TaskAction::Update, &access).is_err());
/// ```

use uuid::Uuid;

use crate::models::task::Task;

/// Error type for authorization denials
///
/// Every variant maps to HTTP 403 at the API boundary; the distinction
/// exists for precise messages and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Actor is neither the owner nor an assignee of the task
    #[error("You do not have permission to view this task")]
    NotVisible,

    /// Actor is not the task owner
    #[error("Only the task owner can perform this action")]
    NotOwner,

    /// Actor is not the comment author
    #[error("Only the comment author can delete this comment")]
    NotAuthor,
}

/// Operations on a task that require a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// View the task and its details
    Read,

    /// Change title, description, status, or priority
    Update,

    /// Delete the task
    Delete,

    /// Assign a user to the task
    Assign,

    /// Remove a user's assignment
    Unassign,

    /// Attach a comment to the task
    Comment,
}

/// Authorization snapshot of a task
///
/// Owner and assignee set as loaded from the repository immediately
/// before the decision. Decisions never re-read state; a record that
/// changes between snapshot and mutation surfaces as "not found" on the
/// mutation itself.
#[derive(Debug, Clone)]
pub struct TaskAccess {
    owner_id: Uuid,
    assignee_ids: Vec<Uuid>,
}

impl TaskAccess {
    /// Creates a snapshot from an owner and assignee set
    pub fn new(owner_id: Uuid, assignee_ids: Vec<Uuid>) -> Self {
        Self {
            owner_id,
            assignee_ids,
        }
    }

    /// Creates a snapshot from a loaded task and its assignee IDs
    pub fn from_task(task: &Task, assignee_ids: Vec<Uuid>) -> Self {
        Self::new(task.user_id, assignee_ids)
    }

    /// Creates a snapshot for decisions that don't depend on assignments
    /// (update, delete, assign, unassign, comment)
    pub fn owner_only(task: &Task) -> Self {
        Self::new(task.user_id, Vec::new())
    }

    /// The task owner
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Whether the user appears in the assignment set
    pub fn is_assigned(&self, user_id: Uuid) -> bool {
        self.assignee_ids.contains(&user_id)
    }
}

/// Decides whether `actor` may perform `action` on the task snapshot
///
/// Policy:
///
/// | Action | Rule |
/// |---|---|
/// | Read | owner or assignee |
/// | Update / Delete | owner only |
/// | Assign / Unassign | owner only |
/// | Comment | any authenticated actor |
///
/// # Errors
///
/// Returns the denial reason; callers map it to a 403 response.
pub fn authorize_task(
    actor: Uuid,
    action: TaskAction,
    access: &TaskAccess,
) -> Result<(), AuthzError> {
    match action {
        TaskAction::Read => {
            if actor == access.owner_id || access.is_assigned(actor) {
                Ok(())
            } else {
                Err(AuthzError::NotVisible)
            }
        }
        TaskAction::Update | TaskAction::Delete | TaskAction::Assign | TaskAction::Unassign => {
            if actor == access.owner_id {
                Ok(())
            } else {
                Err(AuthzError::NotOwner)
            }
        }
        // Commenting requires authentication only; reaching this function
        // already implies an authenticated actor.
        TaskAction::Comment => Ok(()),
    }
}

/// Decides whether `actor` may delete a comment written by `author_id`
///
/// Author only. Owning the task the comment sits on grants nothing here.
pub fn authorize_comment_delete(actor: Uuid, author_id: Uuid) -> Result<(), AuthzError> {
    if actor == author_id {
        Ok(())
    } else {
        Err(AuthzError::NotAuthor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(owner: Uuid, assignees: &[Uuid]) -> TaskAccess {
        TaskAccess::new(owner, assignees.to_vec())
    }

    #[test]
    fn test_owner_can_do_everything() {
        let owner = Uuid::new_v4();
        let access = snapshot(owner, &[]);

        for action in [
            TaskAction::Read,
            TaskAction::Update,
            TaskAction::Delete,
            TaskAction::Assign,
            TaskAction::Unassign,
            TaskAction::Comment,
        ] {
            assert!(
                authorize_task(owner, action, &access).is_ok(),
                "owner should be allowed: {:?}",
                action
            );
        }
    }

    #[test]
    fn test_assignee_can_read_but_not_write() {
        let owner = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let access = snapshot(owner, &[assignee]);

        assert!(authorize_task(assignee, TaskAction::Read, &access).is_ok());

        for action in [
            TaskAction::Update,
            TaskAction::Delete,
            TaskAction::Assign,
            TaskAction::Unassign,
        ] {
            assert_eq!(
                authorize_task(assignee, action, &access),
                Err(AuthzError::NotOwner),
                "assignee must not be allowed: {:?}",
                action
            );
        }
    }

    #[test]
    fn test_stranger_cannot_read_or_write() {
        let owner = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let access = snapshot(owner, &[assignee]);

        assert_eq!(
            authorize_task(stranger, TaskAction::Read, &access),
            Err(AuthzError::NotVisible)
        );
        assert_eq!(
            authorize_task(stranger, TaskAction::Update, &access),
            Err(AuthzError::NotOwner)
        );
        assert_eq!(
            authorize_task(stranger, TaskAction::Delete, &access),
            Err(AuthzError::NotOwner)
        );
    }

    #[test]
    fn test_anyone_authenticated_can_comment() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let access = snapshot(owner, &[]);

        assert!(authorize_task(stranger, TaskAction::Comment, &access).is_ok());
    }

    #[test]
    fn test_owner_may_also_be_assignee() {
        // Not prevented; the read rule is satisfied either way
        let owner = Uuid::new_v4();
        let access = snapshot(owner, &[owner]);

        assert!(authorize_task(owner, TaskAction::Read, &access).is_ok());
        assert!(authorize_task(owner, TaskAction::Update, &access).is_ok());
    }

    #[test]
    fn test_author_can_delete_own_comment() {
        let author = Uuid::new_v4();
        assert!(authorize_comment_delete(author, author).is_ok());
    }

    #[test]
    fn test_task_owner_cannot_delete_others_comment() {
        // The task owner has no special rights over comments
        let owner = Uuid::new_v4();
        let author = Uuid::new_v4();

        assert_eq!(
            authorize_comment_delete(owner, author),
            Err(AuthzError::NotAuthor)
        );
    }
}
