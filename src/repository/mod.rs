use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        CreateDistrictRequest, CreateEventRequest, CreateInitiativeRequest, CreateNoteRequest,
        CreateSheetRequest, CreateTaskRequest, DateRange, District, Document, DocumentFilter,
        Event, Initiative, InitiativeFilter, InitiativeSheet, NewDocument, Note, NoteFilter, Task,
        TaskFilter, User,
    },
    policy::Scope,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The persistence contract. Every read of a district-owned entity takes the
/// caller's `Scope` and must apply it before any optional filter, so a scoped
/// lookup returns `None` both for a missing row and for a row the caller may not
/// see. Writes take already-authorized input; the policy check happens in the
/// handler before any of them is called.
///
/// Statements are individually atomic; multi-step sequences are not wrapped in
/// a transaction and concurrent saves are last-write-wins.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn list_users(&self) -> AppResult<Vec<User>>;
    /// Coordinators whose home district falls inside `scope`.
    async fn list_coordinators(&self, scope: &Scope) -> AppResult<Vec<User>>;
    async fn create_user(&self, user: User) -> AppResult<User>;
    async fn save_user(&self, user: &User) -> AppResult<User>;
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    // --- Districts ---
    async fn list_districts(&self, scope: &Scope) -> AppResult<Vec<District>>;
    async fn get_district(&self, scope: &Scope, id: Uuid) -> AppResult<Option<District>>;
    async fn create_district(&self, req: CreateDistrictRequest) -> AppResult<District>;
    async fn save_district(&self, district: &District) -> AppResult<District>;
    async fn delete_district(&self, id: Uuid) -> AppResult<bool>;

    // --- Initiatives ---
    async fn list_initiatives(&self, scope: &Scope, filter: &InitiativeFilter) -> AppResult<Vec<Initiative>>;
    async fn get_initiative(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Initiative>>;
    async fn create_initiative(&self, req: CreateInitiativeRequest, coordinator_id: Uuid) -> AppResult<Initiative>;
    async fn save_initiative(&self, initiative: &Initiative) -> AppResult<Initiative>;
    async fn delete_initiative(&self, id: Uuid) -> AppResult<bool>;

    // --- Tasks ---
    async fn list_tasks(&self, scope: &Scope, filter: &TaskFilter) -> AppResult<Vec<Task>>;
    async fn get_task(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Task>>;
    async fn create_task(&self, req: CreateTaskRequest, created_by: Uuid) -> AppResult<Task>;
    /// Persists every mutable column, including `status`, `progress` and `completed_at`.
    async fn save_task(&self, task: &Task) -> AppResult<Task>;
    async fn delete_task(&self, id: Uuid) -> AppResult<bool>;

    // --- Notes ---
    async fn list_notes(&self, scope: &Scope, filter: &NoteFilter) -> AppResult<Vec<Note>>;
    async fn get_note(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Note>>;
    async fn create_note(&self, req: CreateNoteRequest, author_id: Uuid) -> AppResult<Note>;
    async fn save_note(&self, note: &Note) -> AppResult<Note>;
    async fn delete_note(&self, id: Uuid) -> AppResult<bool>;

    // --- Documents ---
    async fn list_documents(&self, scope: &Scope, filter: &DocumentFilter) -> AppResult<Vec<Document>>;
    async fn get_document(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Document>>;
    async fn create_document(&self, doc: NewDocument, uploaded_by: Uuid) -> AppResult<Document>;
    async fn delete_document(&self, id: Uuid) -> AppResult<bool>;

    // --- Sheets & Events ---
    async fn list_sheets(&self, scope: &Scope, initiative_id: Uuid) -> AppResult<Vec<InitiativeSheet>>;
    async fn create_sheet(&self, initiative_id: Uuid, req: CreateSheetRequest, added_by: Uuid) -> AppResult<InitiativeSheet>;
    /// Events starting inside `range`, optionally restricted to one initiative.
    async fn list_events(&self, scope: &Scope, range: &DateRange, initiative_id: Option<Uuid>) -> AppResult<Vec<Event>>;
    async fn create_event(&self, initiative_id: Uuid, req: CreateEventRequest, created_by: Uuid) -> AppResult<Event>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
