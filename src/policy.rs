//! Visibility scoping and mutation authorization.
//!
//! Every entry point asks this module two questions: which rows may the actor see
//! (`scope`), and may the actor change this particular row (`can_modify` and
//! friends). The decision functions are pure; `authorize` is the enforcement
//! wrapper handlers use, which also writes the audit event for a denial.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    choices::Role,
    error::{AppError, AppResult},
    models::{Document, Initiative, Note, Task, User},
};

/// Actor
///
/// An authenticated user reduced to what policy decisions need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    /// Home district. Ignored for admins.
    pub district_id: Option<Uuid>,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            id: user.id,
            role: user.role,
            district_id: user.district_id,
        }
    }
}

/// Scope
///
/// The mandatory row filter for one actor. Optional list filters are always
/// applied on top of it, never instead of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Admins: every row.
    Unrestricted,
    /// Rows whose owning district is this one.
    District(Uuid),
    /// A non-admin without a home district sees nothing.
    Nothing,
}

impl Scope {
    /// Row-level form of the scope predicate.
    pub fn admits(&self, district_id: Uuid) -> bool {
        match self {
            Scope::Unrestricted => true,
            Scope::District(own) => *own == district_id,
            Scope::Nothing => false,
        }
    }

    pub fn admits_row<T: Scoped + ?Sized>(&self, row: &T) -> bool {
        self.admits(row.owning_district())
    }

    /// Narrows an in-memory collection.
    pub fn filter<T: Scoped>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        rows.into_iter().filter(|row| self.admits_row(row)).collect()
    }
}

pub fn scope(actor: &Actor) -> Scope {
    if actor.is_admin() {
        return Scope::Unrestricted;
    }
    match actor.district_id {
        Some(district_id) => Scope::District(district_id),
        None => Scope::Nothing,
    }
}

/// EntityKind
///
/// Names each entity and the SQL expression that resolves its owning district.
/// Queries alias districts as `d`, initiatives as `i` and profiles as `p`; every
/// kind below Initiative reaches its district through the `i` join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    District,
    Initiative,
    Task,
    Note,
    Document,
    Sheet,
    Event,
}

impl EntityKind {
    pub fn district_column(self) -> &'static str {
        match self {
            // A user's home district, not a parent record.
            EntityKind::User => "p.district_id",
            // District rows are scoped by identity.
            EntityKind::District => "d.id",
            EntityKind::Initiative
            | EntityKind::Task
            | EntityKind::Note
            | EntityKind::Document
            | EntityKind::Sheet
            | EntityKind::Event => "i.district_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::District => "district",
            EntityKind::Initiative => "initiative",
            EntityKind::Task => "task",
            EntityKind::Note => "note",
            EntityKind::Document => "document",
            EntityKind::Sheet => "sheet",
            EntityKind::Event => "event",
        }
    }
}

/// A row that belongs to exactly one district.
pub trait Scoped {
    fn owning_district(&self) -> Uuid;
}

/// A row with a single designated owner.
pub trait Owned {
    const KIND: EntityKind;
    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Uuid;
}

macro_rules! scoped_through_initiative {
    ($($ty:ty),+) => {
        $(impl Scoped for $ty {
            fn owning_district(&self) -> Uuid {
                self.district_id
            }
        })+
    };
}

scoped_through_initiative!(
    Initiative,
    Task,
    Note,
    Document,
    crate::models::InitiativeSheet,
    crate::models::Event
);

impl Scoped for crate::models::District {
    fn owning_district(&self) -> Uuid {
        self.id
    }
}

impl Owned for Initiative {
    const KIND: EntityKind = EntityKind::Initiative;
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.coordinator_id
    }
}

impl Owned for Task {
    const KIND: EntityKind = EntityKind::Task;
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.assigned_to
    }
}

impl Owned for Note {
    const KIND: EntityKind = EntityKind::Note;
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Document {
    const KIND: EntityKind = EntityKind::Document;
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Uuid {
        self.uploaded_by
    }
}

// --- Decisions ---

/// Admins may modify anything; everyone else only what they own.
pub fn can_modify<T: Owned>(actor: &Actor, entity: &T) -> bool {
    actor.is_admin() || entity.owner_id() == actor.id
}

/// Admins may delete any account except their own.
pub fn can_delete_user(actor: &Actor, target_id: Uuid) -> bool {
    actor.is_admin() && target_id != actor.id
}

/// User and district management.
pub fn can_administer(actor: &Actor) -> bool {
    actor.is_admin()
}

/// Read-only accounts never create records.
pub fn can_author(actor: &Actor) -> bool {
    actor.role != Role::Readonly
}

/// Non-admins may only place initiatives in their own district.
pub fn can_place_in_district(actor: &Actor, district_id: Uuid) -> bool {
    actor.is_admin() || actor.district_id == Some(district_id)
}

/// Tasks go to active coordinators; a non-admin may only pick one from its own district.
pub fn can_assign(actor: &Actor, assignee: &User) -> bool {
    if assignee.role != Role::Coordinator || !assignee.is_active {
        return false;
    }
    actor.is_admin() || (actor.district_id.is_some() && assignee.district_id == actor.district_id)
}

// --- Enforcement ---

/// authorize
///
/// Turns a decision into `AccessDenied` and records the denial. Must run before
/// any write.
pub fn authorize(actor: &Actor, allowed: bool, action: &str, kind: EntityKind, id: Option<Uuid>) -> AppResult<()> {
    if allowed {
        return Ok(());
    }
    tracing::warn!(
        actor = %actor.id,
        role = actor.role.as_str(),
        action,
        entity = kind.as_str(),
        entity_id = ?id,
        "permission denied"
    );
    Err(AppError::denied(format!(
        "You do not have permission to {action} this {}.",
        kind.as_str()
    )))
}

/// Shorthand for the ownership check on a concrete row.
pub fn authorize_modify<T: Owned>(actor: &Actor, entity: &T, action: &str) -> AppResult<()> {
    authorize(actor, can_modify(actor, entity), action, T::KIND, Some(entity.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role, district: Option<Uuid>) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            role,
            district_id: district,
        }
    }

    #[test]
    fn admin_scope_is_unrestricted_even_with_a_district() {
        let d = Uuid::new_v4();
        assert_eq!(scope(&actor(Role::Admin, Some(d))), Scope::Unrestricted);
    }

    #[test]
    fn coordinator_without_district_sees_nothing() {
        let s = scope(&actor(Role::Coordinator, None));
        assert_eq!(s, Scope::Nothing);
        assert!(!s.admits(Uuid::new_v4()));
    }

    #[test]
    fn readonly_is_scoped_like_a_coordinator() {
        let d = Uuid::new_v4();
        let s = scope(&actor(Role::Readonly, Some(d)));
        assert!(s.admits(d));
        assert!(!s.admits(Uuid::new_v4()));
    }

    #[test]
    fn only_admin_or_owner_may_modify() {
        let owner = actor(Role::Coordinator, Some(Uuid::new_v4()));
        let other = actor(Role::Coordinator, owner.district_id);
        let admin = actor(Role::Admin, None);
        let task = Task {
            assigned_to: owner.id,
            ..Task::default()
        };
        assert!(can_modify(&owner, &task));
        assert!(!can_modify(&other, &task));
        assert!(can_modify(&admin, &task));
    }

    #[test]
    fn admins_cannot_delete_themselves() {
        let admin = actor(Role::Admin, None);
        assert!(!can_delete_user(&admin, admin.id));
        assert!(can_delete_user(&admin, Uuid::new_v4()));
        let coord = actor(Role::Coordinator, None);
        assert!(!can_delete_user(&coord, Uuid::new_v4()));
    }

    #[test]
    fn denial_is_access_denied() {
        let coord = actor(Role::Coordinator, None);
        let note = Note::default();
        let err = authorize_modify(&coord, &note, "edit").unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }
}
