use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::Repository;
use crate::{
    choices::{Role, TaskStatus},
    error::{AppError, AppResult},
    models::{
        CreateDistrictRequest, CreateEventRequest, CreateInitiativeRequest, CreateNoteRequest,
        CreateSheetRequest, CreateTaskRequest, DateRange, District, Document, DocumentFilter,
        Event, Initiative, InitiativeFilter, InitiativeSheet, NewDocument, Note, NoteFilter, Task,
        TaskFilter, User,
    },
    policy::Scope,
};

#[derive(Default)]
struct Store {
    users: Vec<User>,
    districts: Vec<District>,
    initiatives: Vec<Initiative>,
    tasks: Vec<Task>,
    notes: Vec<Note>,
    documents: Vec<Document>,
    sheets: Vec<InitiativeSheet>,
    events: Vec<Event>,
}

fn display_name(user: &User) -> String {
    if user.full_name.trim().is_empty() {
        user.email.clone()
    } else {
        user.full_name.clone()
    }
}

fn missing_reference() -> AppError {
    AppError::invalid("a referenced record does not exist")
}

impl Store {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn district(&self, id: Uuid) -> Option<&District> {
        self.districts.iter().find(|d| d.id == id)
    }

    fn initiative(&self, id: Uuid) -> Option<&Initiative> {
        self.initiatives.iter().find(|i| i.id == id)
    }

    fn district_name(&self, id: Option<Uuid>) -> Option<String> {
        id.and_then(|id| self.district(id)).map(|d| d.name.clone())
    }

    fn user_name(&self, id: Uuid) -> String {
        self.user(id).map(display_name).unwrap_or_default()
    }

    // Join columns are recomputed on every read, the same way the SQL selects do.

    fn hydrate_user(&self, mut user: User) -> User {
        user.district_name = self.district_name(user.district_id);
        user
    }

    fn hydrate_initiative(&self, mut initiative: Initiative) -> Initiative {
        initiative.district_name = self.district_name(Some(initiative.district_id)).unwrap_or_default();
        initiative.coordinator_name = self.user_name(initiative.coordinator_id);
        initiative
    }

    /// Resolves `(initiative_title, district_id, district_name)` through the parent initiative.
    fn parent(&self, initiative_id: Uuid) -> (String, Uuid, String) {
        match self.initiative(initiative_id) {
            Some(i) => (
                i.title.clone(),
                i.district_id,
                self.district_name(Some(i.district_id)).unwrap_or_default(),
            ),
            None => (String::new(), Uuid::nil(), String::new()),
        }
    }

    fn hydrate_task(&self, mut task: Task, now: DateTime<Utc>) -> Task {
        let (title, district_id, district_name) = self.parent(task.initiative_id);
        task.initiative_title = title;
        task.district_id = district_id;
        task.district_name = district_name;
        task.assignee_name = self.user_name(task.assigned_to);
        task.is_overdue = task.is_overdue(now);
        task
    }

    fn hydrate_note(&self, mut note: Note) -> Note {
        let (title, district_id, district_name) = self.parent(note.initiative_id);
        note.initiative_title = title;
        note.district_id = district_id;
        note.district_name = district_name;
        note.author_name = self.user_name(note.author_id);
        note
    }

    fn hydrate_document(&self, mut document: Document) -> Document {
        let (title, district_id, district_name) = self.parent(document.initiative_id);
        document.initiative_title = title;
        document.district_id = district_id;
        document.district_name = district_name;
        document
    }

    fn hydrate_sheet(&self, mut sheet: InitiativeSheet) -> InitiativeSheet {
        sheet.district_id = self.parent(sheet.initiative_id).1;
        sheet
    }

    fn hydrate_event(&self, mut event: Event) -> Event {
        let (title, district_id, _) = self.parent(event.initiative_id);
        event.initiative_title = title;
        event.district_id = district_id;
        event
    }

    fn check_district_name(&self, name: &str, except: Option<Uuid>) -> AppResult<()> {
        let taken = self
            .districts
            .iter()
            .any(|d| d.name == name && Some(d.id) != except);
        if taken {
            return Err(AppError::invalid("a record with this value already exists"));
        }
        Ok(())
    }

    fn require_user(&self, id: Uuid) -> AppResult<()> {
        self.user(id).map(|_| ()).ok_or_else(missing_reference)
    }

    fn require_initiative(&self, id: Uuid) -> AppResult<()> {
        self.initiative(id).map(|_| ()).ok_or_else(missing_reference)
    }

    fn require_task(&self, id: Option<Uuid>) -> AppResult<()> {
        match id {
            Some(id) if !self.tasks.iter().any(|t| t.id == id) => Err(missing_reference()),
            _ => Ok(()),
        }
    }

    // Deletes follow the ON DELETE rules of the schema.

    fn remove_task(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.notes.retain(|n| n.task_id != Some(id));
        self.documents.retain(|d| d.task_id != Some(id));
        self.tasks.len() != before
    }

    fn remove_initiative(&mut self, id: Uuid) -> bool {
        let before = self.initiatives.len();
        self.initiatives.retain(|i| i.id != id);
        let task_ids: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|t| t.initiative_id == id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            self.remove_task(task_id);
        }
        self.notes.retain(|n| n.initiative_id != id);
        self.documents.retain(|d| d.initiative_id != id);
        self.sheets.retain(|s| s.initiative_id != id);
        self.events.retain(|e| e.initiative_id != id);
        self.initiatives.len() != before
    }
}

/// InMemoryRepository
///
/// A process-local implementation of `Repository` with the same scoping,
/// filtering, ordering and cascade rules as the Postgres one. Used by the test
/// suite and for running the API without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a fully-formed task as-is, bypassing request validation. Lets
    /// fixtures control timestamps such as `created_at` and `completed_at`.
    pub fn insert_task(&self, task: Task) -> Task {
        let mut store = self.write();
        store.tasks.push(task.clone());
        store.hydrate_task(task, Utc::now())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- Users ---

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let store = self.read();
        Ok(store.user(id).cloned().map(|u| store.hydrate_user(u)))
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let store = self.read();
        let mut users: Vec<User> = store.users.iter().cloned().map(|u| store.hydrate_user(u)).collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn list_coordinators(&self, scope: &Scope) -> AppResult<Vec<User>> {
        let store = self.read();
        let mut users: Vec<User> = store
            .users
            .iter()
            .filter(|u| u.role == Role::Coordinator && u.is_active)
            .filter(|u| u.district_id.is_some_and(|d| scope.admits(d)))
            .cloned()
            .map(|u| store.hydrate_user(u))
            .collect();
        users.sort_by(|a, b| (&a.full_name, &a.email).cmp(&(&b.full_name, &b.email)));
        Ok(users)
    }

    async fn create_user(&self, mut user: User) -> AppResult<User> {
        let mut store = self.write();
        if store.users.iter().any(|u| u.id == user.id || u.email == user.email) {
            return Err(AppError::invalid("a record with this value already exists"));
        }
        if let Some(district_id) = user.district_id {
            store.district(district_id).ok_or_else(missing_reference)?;
        }
        let now = Utc::now();
        user.created_at = now;
        user.updated_at = now;
        store.users.push(user.clone());
        Ok(store.hydrate_user(user))
    }

    async fn save_user(&self, user: &User) -> AppResult<User> {
        let mut store = self.write();
        if let Some(district_id) = user.district_id {
            store.district(district_id).ok_or_else(missing_reference)?;
        }
        let slot = store
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AppError::NotFound)?;
        let email = slot.email.clone();
        let created_at = slot.created_at;
        *slot = User {
            email,
            created_at,
            updated_at: Utc::now(),
            ..user.clone()
        };
        let saved = slot.clone();
        Ok(store.hydrate_user(saved))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.write();
        let before = store.users.len();
        store.users.retain(|u| u.id != id);
        if store.users.len() == before {
            return Ok(false);
        }
        let initiative_ids: Vec<Uuid> = store
            .initiatives
            .iter()
            .filter(|i| i.coordinator_id == id)
            .map(|i| i.id)
            .collect();
        for initiative_id in initiative_ids {
            store.remove_initiative(initiative_id);
        }
        let task_ids: Vec<Uuid> = store
            .tasks
            .iter()
            .filter(|t| t.assigned_to == id || t.created_by == id)
            .map(|t| t.id)
            .collect();
        for task_id in task_ids {
            store.remove_task(task_id);
        }
        store.notes.retain(|n| n.author_id != id);
        store.documents.retain(|d| d.uploaded_by != id);
        store.sheets.retain(|s| s.added_by != id);
        store.events.retain(|e| e.created_by != id);
        Ok(true)
    }

    // --- Districts ---

    async fn list_districts(&self, scope: &Scope) -> AppResult<Vec<District>> {
        let store = self.read();
        let mut districts = scope.filter(store.districts.iter().cloned());
        districts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(districts)
    }

    async fn get_district(&self, scope: &Scope, id: Uuid) -> AppResult<Option<District>> {
        let store = self.read();
        Ok(store.district(id).filter(|d| scope.admits_row(*d)).cloned())
    }

    async fn create_district(&self, req: CreateDistrictRequest) -> AppResult<District> {
        let mut store = self.write();
        let name = req.name.trim().to_string();
        store.check_district_name(&name, None)?;
        let now = Utc::now();
        let district = District {
            id: Uuid::new_v4(),
            name,
            description: req.description,
            created_at: now,
            updated_at: now,
        };
        store.districts.push(district.clone());
        Ok(district)
    }

    async fn save_district(&self, district: &District) -> AppResult<District> {
        let mut store = self.write();
        let name = district.name.trim().to_string();
        store.check_district_name(&name, Some(district.id))?;
        let slot = store
            .districts
            .iter_mut()
            .find(|d| d.id == district.id)
            .ok_or(AppError::NotFound)?;
        slot.name = name;
        slot.description = district.description.clone();
        slot.updated_at = Utc::now();
        Ok(slot.clone())
    }

    async fn delete_district(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.write();
        let before = store.districts.len();
        store.districts.retain(|d| d.id != id);
        if store.districts.len() == before {
            return Ok(false);
        }
        let initiative_ids: Vec<Uuid> = store
            .initiatives
            .iter()
            .filter(|i| i.district_id == id)
            .map(|i| i.id)
            .collect();
        for initiative_id in initiative_ids {
            store.remove_initiative(initiative_id);
        }
        for user in store.users.iter_mut().filter(|u| u.district_id == Some(id)) {
            user.district_id = None;
        }
        Ok(true)
    }

    // --- Initiatives ---

    async fn list_initiatives(&self, scope: &Scope, filter: &InitiativeFilter) -> AppResult<Vec<Initiative>> {
        let store = self.read();
        let mut initiatives: Vec<Initiative> = store
            .initiatives
            .iter()
            .filter(|i| scope.admits_row(*i))
            .cloned()
            .map(|i| store.hydrate_initiative(i))
            .filter(|i| filter.matches(i))
            .collect();
        initiatives.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(initiatives)
    }

    async fn get_initiative(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Initiative>> {
        let store = self.read();
        Ok(store
            .initiative(id)
            .filter(|i| scope.admits_row(*i))
            .cloned()
            .map(|i| store.hydrate_initiative(i)))
    }

    async fn create_initiative(&self, req: CreateInitiativeRequest, coordinator_id: Uuid) -> AppResult<Initiative> {
        let mut store = self.write();
        store.district(req.district_id).ok_or_else(missing_reference)?;
        store.require_user(coordinator_id)?;
        let now = Utc::now();
        let initiative = Initiative {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description,
            initiative_type: req.initiative_type,
            status: req.status,
            district_id: req.district_id,
            coordinator_id,
            start_date: req.start_date,
            end_date: req.end_date,
            budget: req.budget,
            kpi_target: req.kpi_target,
            created_at: now,
            updated_at: now,
            ..Initiative::default()
        };
        store.initiatives.push(initiative.clone());
        Ok(store.hydrate_initiative(initiative))
    }

    async fn save_initiative(&self, initiative: &Initiative) -> AppResult<Initiative> {
        let mut store = self.write();
        store.district(initiative.district_id).ok_or_else(missing_reference)?;
        let slot = store
            .initiatives
            .iter_mut()
            .find(|i| i.id == initiative.id)
            .ok_or(AppError::NotFound)?;
        *slot = Initiative {
            title: initiative.title.trim().to_string(),
            coordinator_id: slot.coordinator_id,
            created_at: slot.created_at,
            updated_at: Utc::now(),
            ..initiative.clone()
        };
        let saved = slot.clone();
        Ok(store.hydrate_initiative(saved))
    }

    async fn delete_initiative(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.write().remove_initiative(id))
    }

    // --- Tasks ---

    async fn list_tasks(&self, scope: &Scope, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let store = self.read();
        let now = Utc::now();
        let mut tasks: Vec<Task> = store
            .tasks
            .iter()
            .cloned()
            .map(|t| store.hydrate_task(t, now))
            .filter(|t| scope.admits_row(t))
            .filter(|t| filter.matches(t))
            .collect();
        tasks.sort_by(|a, b| b.due_date.cmp(&a.due_date).then(b.priority.cmp(&a.priority)));
        Ok(tasks)
    }

    async fn get_task(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Task>> {
        let store = self.read();
        Ok(store
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .map(|t| store.hydrate_task(t, Utc::now()))
            .filter(|t| scope.admits_row(t)))
    }

    async fn create_task(&self, req: CreateTaskRequest, created_by: Uuid) -> AppResult<Task> {
        let mut store = self.write();
        store.require_initiative(req.initiative_id)?;
        store.require_user(req.assigned_to)?;
        store.require_user(created_by)?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description,
            initiative_id: req.initiative_id,
            assigned_to: req.assigned_to,
            created_by,
            priority: req.priority,
            status: req.status,
            due_date: req.due_date,
            completed_at: (req.status == TaskStatus::Completed).then_some(now),
            progress: req.progress,
            created_at: now,
            updated_at: now,
            ..Task::default()
        };
        store.tasks.push(task.clone());
        Ok(store.hydrate_task(task, now))
    }

    async fn save_task(&self, task: &Task) -> AppResult<Task> {
        let mut store = self.write();
        store.require_initiative(task.initiative_id)?;
        store.require_user(task.assigned_to)?;
        let now = Utc::now();
        let slot = store
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(AppError::NotFound)?;
        *slot = Task {
            title: task.title.trim().to_string(),
            created_by: slot.created_by,
            created_at: slot.created_at,
            updated_at: now,
            ..task.clone()
        };
        let saved = slot.clone();
        Ok(store.hydrate_task(saved, now))
    }

    async fn delete_task(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.write().remove_task(id))
    }

    // --- Notes ---

    async fn list_notes(&self, scope: &Scope, filter: &NoteFilter) -> AppResult<Vec<Note>> {
        let store = self.read();
        let mut notes: Vec<Note> = store
            .notes
            .iter()
            .cloned()
            .map(|n| store.hydrate_note(n))
            .filter(|n| scope.admits_row(n))
            .filter(|n| filter.matches(n))
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn get_note(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Note>> {
        let store = self.read();
        Ok(store
            .notes
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .map(|n| store.hydrate_note(n))
            .filter(|n| scope.admits_row(n)))
    }

    async fn create_note(&self, req: CreateNoteRequest, author_id: Uuid) -> AppResult<Note> {
        let mut store = self.write();
        store.require_initiative(req.initiative_id)?;
        store.require_task(req.task_id)?;
        store.require_user(author_id)?;
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            content: req.content,
            note_type: req.note_type,
            initiative_id: req.initiative_id,
            task_id: req.task_id,
            author_id,
            is_public: req.is_public,
            created_at: now,
            updated_at: now,
            ..Note::default()
        };
        store.notes.push(note.clone());
        Ok(store.hydrate_note(note))
    }

    async fn save_note(&self, note: &Note) -> AppResult<Note> {
        let mut store = self.write();
        let slot = store
            .notes
            .iter_mut()
            .find(|n| n.id == note.id)
            .ok_or(AppError::NotFound)?;
        slot.title = note.title.trim().to_string();
        slot.content = note.content.clone();
        slot.note_type = note.note_type;
        slot.is_public = note.is_public;
        slot.updated_at = Utc::now();
        let saved = slot.clone();
        Ok(store.hydrate_note(saved))
    }

    async fn delete_note(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.write();
        let before = store.notes.len();
        store.notes.retain(|n| n.id != id);
        Ok(store.notes.len() != before)
    }

    // --- Documents ---

    async fn list_documents(&self, scope: &Scope, filter: &DocumentFilter) -> AppResult<Vec<Document>> {
        let store = self.read();
        let mut documents: Vec<Document> = store
            .documents
            .iter()
            .cloned()
            .map(|d| store.hydrate_document(d))
            .filter(|d| scope.admits_row(d))
            .filter(|d| filter.matches(d))
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(documents)
    }

    async fn get_document(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Document>> {
        let store = self.read();
        Ok(store
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .map(|d| store.hydrate_document(d))
            .filter(|d| scope.admits_row(d)))
    }

    async fn create_document(&self, doc: NewDocument, uploaded_by: Uuid) -> AppResult<Document> {
        let mut store = self.write();
        store.require_initiative(doc.initiative_id)?;
        store.require_task(doc.task_id)?;
        store.require_user(uploaded_by)?;
        let document = Document {
            id: Uuid::new_v4(),
            title: doc.title.trim().to_string(),
            description: doc.description,
            file_key: doc.file_key,
            file_size: doc.file_size,
            initiative_id: doc.initiative_id,
            task_id: doc.task_id,
            uploaded_by,
            created_at: Utc::now(),
            ..Document::default()
        };
        store.documents.push(document.clone());
        Ok(store.hydrate_document(document))
    }

    async fn delete_document(&self, id: Uuid) -> AppResult<bool> {
        let mut store = self.write();
        let before = store.documents.len();
        store.documents.retain(|d| d.id != id);
        Ok(store.documents.len() != before)
    }

    // --- Sheets & Events ---

    async fn list_sheets(&self, scope: &Scope, initiative_id: Uuid) -> AppResult<Vec<InitiativeSheet>> {
        let store = self.read();
        let mut sheets: Vec<InitiativeSheet> = store
            .sheets
            .iter()
            .filter(|s| s.initiative_id == initiative_id)
            .cloned()
            .map(|s| store.hydrate_sheet(s))
            .filter(|s| scope.admits_row(s))
            .collect();
        sheets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sheets)
    }

    async fn create_sheet(&self, initiative_id: Uuid, req: CreateSheetRequest, added_by: Uuid) -> AppResult<InitiativeSheet> {
        let mut store = self.write();
        store.require_initiative(initiative_id)?;
        store.require_user(added_by)?;
        let sheet = InitiativeSheet {
            id: Uuid::new_v4(),
            initiative_id,
            sheet_url: req.sheet_url.trim().to_string(),
            added_by,
            created_at: Utc::now(),
            ..InitiativeSheet::default()
        };
        store.sheets.push(sheet.clone());
        Ok(store.hydrate_sheet(sheet))
    }

    async fn list_events(&self, scope: &Scope, range: &DateRange, initiative_id: Option<Uuid>) -> AppResult<Vec<Event>> {
        let store = self.read();
        let mut events: Vec<Event> = store
            .events
            .iter()
            .filter(|e| initiative_id.is_none_or(|id| e.initiative_id == id))
            .filter(|e| range.contains(e.start_at))
            .cloned()
            .map(|e| store.hydrate_event(e))
            .filter(|e| scope.admits_row(e))
            .collect();
        events.sort_by(|a, b| a.start_at.cmp(&b.start_at));
        Ok(events)
    }

    async fn create_event(&self, initiative_id: Uuid, req: CreateEventRequest, created_by: Uuid) -> AppResult<Event> {
        let mut store = self.write();
        store.require_initiative(initiative_id)?;
        store.require_user(created_by)?;
        let event = Event {
            id: Uuid::new_v4(),
            initiative_id,
            title: req.title.trim().to_string(),
            description: req.description,
            start_at: req.start_at,
            end_at: req.end_at,
            meet_link: req.meet_link,
            location: req.location,
            created_by,
            created_at: Utc::now(),
            ..Event::default()
        };
        store.events.push(event.clone());
        Ok(store.hydrate_event(event))
    }
}
