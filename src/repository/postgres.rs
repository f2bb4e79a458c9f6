use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        CreateDistrictRequest, CreateEventRequest, CreateInitiativeRequest, CreateNoteRequest,
        CreateSheetRequest, CreateTaskRequest, DateRange, District, Document, DocumentFilter,
        Event, Initiative, InitiativeFilter, InitiativeSheet, NewDocument, Note, NoteFilter, Task,
        TaskFilter, User,
    },
    policy::{EntityKind, Scope},
};

// Base selects. Every one ends in `WHERE TRUE` so scope and filter fragments can
// be appended uniformly with ` AND ...`. Aliases match `EntityKind::district_column`.

const USER_SELECT: &str = r#"
    SELECT p.id, p.email, p.full_name, p.role, p.district_id, d.name AS district_name,
           p.phone, p.bio, p.profile_picture, p.is_active, p.created_at, p.updated_at
    FROM profiles p
    LEFT JOIN districts d ON d.id = p.district_id
    WHERE TRUE"#;

const DISTRICT_SELECT: &str = r#"
    SELECT d.id, d.name, d.description, d.created_at, d.updated_at
    FROM districts d
    WHERE TRUE"#;

const INITIATIVE_SELECT: &str = r#"
    SELECT i.id, i.title, i.description, i.initiative_type, i.status,
           i.district_id, d.name AS district_name,
           i.coordinator_id, COALESCE(NULLIF(p.full_name, ''), p.email) AS coordinator_name,
           i.start_date, i.end_date, i.budget, i.kpi_target, i.created_at, i.updated_at
    FROM initiatives i
    JOIN districts d ON d.id = i.district_id
    JOIN profiles p ON p.id = i.coordinator_id
    WHERE TRUE"#;

const TASK_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.initiative_id, i.title AS initiative_title,
           i.district_id, d.name AS district_name,
           t.assigned_to, COALESCE(NULLIF(p.full_name, ''), p.email) AS assignee_name,
           t.created_by, t.priority, t.status, t.due_date, t.completed_at, t.progress,
           (t.due_date < NOW() AND t.status <> 'completed') AS is_overdue,
           t.created_at, t.updated_at
    FROM tasks t
    JOIN initiatives i ON i.id = t.initiative_id
    JOIN districts d ON d.id = i.district_id
    JOIN profiles p ON p.id = t.assigned_to
    WHERE TRUE"#;

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.title, n.content, n.note_type, n.initiative_id, i.title AS initiative_title,
           n.task_id, i.district_id, d.name AS district_name,
           n.author_id, COALESCE(NULLIF(p.full_name, ''), p.email) AS author_name,
           n.is_public, n.created_at, n.updated_at
    FROM notes n
    JOIN initiatives i ON i.id = n.initiative_id
    JOIN districts d ON d.id = i.district_id
    JOIN profiles p ON p.id = n.author_id
    WHERE TRUE"#;

const DOCUMENT_SELECT: &str = r#"
    SELECT doc.id, doc.title, doc.description, doc.file_key, doc.file_size,
           doc.initiative_id, i.title AS initiative_title, doc.task_id,
           i.district_id, d.name AS district_name, doc.uploaded_by, doc.created_at
    FROM documents doc
    JOIN initiatives i ON i.id = doc.initiative_id
    JOIN districts d ON d.id = i.district_id
    WHERE TRUE"#;

const SHEET_SELECT: &str = r#"
    SELECT s.id, s.initiative_id, i.district_id, s.sheet_url, s.added_by, s.created_at
    FROM initiative_sheets s
    JOIN initiatives i ON i.id = s.initiative_id
    WHERE TRUE"#;

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.initiative_id, i.title AS initiative_title, i.district_id,
           e.title, e.description, e.start_at, e.end_at, e.meet_link, e.location,
           e.created_by, e.created_at
    FROM events e
    JOIN initiatives i ON i.id = e.initiative_id
    WHERE TRUE"#;

/// Appends the mandatory visibility predicate on `column`.
fn push_scope_on(builder: &mut QueryBuilder<'_, Postgres>, scope: &Scope, column: &str) {
    match scope {
        Scope::Unrestricted => {}
        Scope::District(district_id) => {
            builder.push(format!(" AND {column} = "));
            builder.push_bind(*district_id);
        }
        Scope::Nothing => {
            builder.push(" AND FALSE");
        }
    }
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &Scope, kind: EntityKind) {
    push_scope_on(builder, scope, kind.district_column());
}

/// `%term%` with the term's own LIKE wildcards escaped, so it matches literally.
fn contains_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

/// Case-insensitive substring match over the given columns, OR-ed together.
fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>, columns: &[&str]) {
    let Some(term) = search else {
        return;
    };
    let pattern = contains_pattern(term);
    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder.push(format!("{column} ILIKE "));
        builder.push_bind(pattern.clone());
    }
    builder.push(")");
}

fn push_district_name(builder: &mut QueryBuilder<'_, Postgres>, district: Option<&str>) {
    if let Some(name) = district {
        builder.push(" AND d.name = ");
        builder.push_bind(name.to_string());
    }
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// All filtered reads go through `QueryBuilder` with bound parameters; the scope
/// predicate is pushed before any optional filter.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_scoped<T>(&self, base: &str, scope: &Scope, kind: EntityKind, id_column: &str, id: Uuid) -> AppResult<Option<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(base);
        push_scope(&mut builder, scope, kind);
        builder.push(format!(" AND {id_column} = "));
        builder.push_bind(id);
        Ok(builder.build_query_as::<T>().fetch_optional(&self.pool).await?)
    }

    async fn delete_by_id(&self, table: &str, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Users ---

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(USER_SELECT);
        builder.push(" AND p.id = ");
        builder.push_bind(id);
        Ok(builder.build_query_as::<User>().fetch_optional(&self.pool).await?)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(USER_SELECT);
        builder.push(" ORDER BY p.email");
        Ok(builder.build_query_as::<User>().fetch_all(&self.pool).await?)
    }

    /// list_coordinators
    ///
    /// Active coordinators only. Users have no initiative parent, so the scope is
    /// applied to their home district column directly.
    async fn list_coordinators(&self, scope: &Scope) -> AppResult<Vec<User>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(USER_SELECT);
        push_scope(&mut builder, scope, EntityKind::User);
        builder.push(" AND p.role = 'coordinator' AND p.is_active ORDER BY p.full_name, p.email");
        Ok(builder.build_query_as::<User>().fetch_all(&self.pool).await?)
    }

    async fn create_user(&self, user: User) -> AppResult<User> {
        sqlx::query(
            r#"INSERT INTO profiles (id, email, full_name, role, district_id, phone, bio, profile_picture, is_active, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())"#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.district_id)
        .bind(&user.phone)
        .bind(&user.bio)
        .bind(&user.profile_picture)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;
        self.get_user(user.id).await?.ok_or(AppError::NotFound)
    }

    async fn save_user(&self, user: &User) -> AppResult<User> {
        let result = sqlx::query(
            r#"UPDATE profiles
               SET full_name = $2, role = $3, district_id = $4, phone = $5, bio = $6,
                   profile_picture = $7, is_active = $8, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.district_id)
        .bind(&user.phone)
        .bind(&user.bio)
        .bind(&user.profile_picture)
        .bind(user.is_active)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        self.get_user(user.id).await?.ok_or(AppError::NotFound)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        self.delete_by_id("profiles", id).await
    }

    // --- Districts ---

    async fn list_districts(&self, scope: &Scope) -> AppResult<Vec<District>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(DISTRICT_SELECT);
        push_scope(&mut builder, scope, EntityKind::District);
        builder.push(" ORDER BY d.name");
        Ok(builder.build_query_as::<District>().fetch_all(&self.pool).await?)
    }

    async fn get_district(&self, scope: &Scope, id: Uuid) -> AppResult<Option<District>> {
        self.fetch_one_scoped(DISTRICT_SELECT, scope, EntityKind::District, "d.id", id).await
    }

    async fn create_district(&self, req: CreateDistrictRequest) -> AppResult<District> {
        let district = sqlx::query_as::<_, District>(
            r#"INSERT INTO districts (id, name, description, created_at, updated_at)
               VALUES ($1, $2, $3, NOW(), NOW())
               RETURNING id, name, description, created_at, updated_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(district)
    }

    async fn save_district(&self, district: &District) -> AppResult<District> {
        sqlx::query_as::<_, District>(
            r#"UPDATE districts SET name = $2, description = $3, updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, description, created_at, updated_at"#,
        )
        .bind(district.id)
        .bind(district.name.trim())
        .bind(&district.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound)
    }

    async fn delete_district(&self, id: Uuid) -> AppResult<bool> {
        self.delete_by_id("districts", id).await
    }

    // --- Initiatives ---

    async fn list_initiatives(&self, scope: &Scope, filter: &InitiativeFilter) -> AppResult<Vec<Initiative>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INITIATIVE_SELECT);
        push_scope(&mut builder, scope, EntityKind::Initiative);

        if let Some(status) = filter.status {
            builder.push(" AND i.status = ");
            builder.push_bind(status);
        }
        if let Some(kind) = filter.initiative_type {
            builder.push(" AND i.initiative_type = ");
            builder.push_bind(kind);
        }
        push_district_name(&mut builder, filter.district.as_deref());
        push_search(&mut builder, filter.search.as_deref(), &["i.title", "i.description"]);

        builder.push(" ORDER BY i.created_at DESC");
        Ok(builder.build_query_as::<Initiative>().fetch_all(&self.pool).await?)
    }

    async fn get_initiative(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Initiative>> {
        self.fetch_one_scoped(INITIATIVE_SELECT, scope, EntityKind::Initiative, "i.id", id).await
    }

    async fn create_initiative(&self, req: CreateInitiativeRequest, coordinator_id: Uuid) -> AppResult<Initiative> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO initiatives
                   (id, title, description, initiative_type, status, district_id, coordinator_id,
                    start_date, end_date, budget, kpi_target, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())"#,
        )
        .bind(id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.initiative_type)
        .bind(req.status)
        .bind(req.district_id)
        .bind(coordinator_id)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.budget)
        .bind(&req.kpi_target)
        .execute(&self.pool)
        .await?;
        self.get_initiative(&Scope::Unrestricted, id).await?.ok_or(AppError::NotFound)
    }

    async fn save_initiative(&self, initiative: &Initiative) -> AppResult<Initiative> {
        let result = sqlx::query(
            r#"UPDATE initiatives
               SET title = $2, description = $3, initiative_type = $4, status = $5, district_id = $6,
                   start_date = $7, end_date = $8, budget = $9, kpi_target = $10, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(initiative.id)
        .bind(initiative.title.trim())
        .bind(&initiative.description)
        .bind(initiative.initiative_type)
        .bind(initiative.status)
        .bind(initiative.district_id)
        .bind(initiative.start_date)
        .bind(initiative.end_date)
        .bind(initiative.budget)
        .bind(&initiative.kpi_target)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        self.get_initiative(&Scope::Unrestricted, initiative.id).await?.ok_or(AppError::NotFound)
    }

    async fn delete_initiative(&self, id: Uuid) -> AppResult<bool> {
        self.delete_by_id("initiatives", id).await
    }

    // --- Tasks ---

    /// list_tasks
    ///
    /// Ordered by due date (latest first), then by urgency. `is_overdue` is
    /// computed in the select against the database clock.
    async fn list_tasks(&self, scope: &Scope, filter: &TaskFilter) -> AppResult<Vec<Task>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(TASK_SELECT);
        push_scope(&mut builder, scope, EntityKind::Task);

        if let Some(status) = filter.status {
            builder.push(" AND t.status = ");
            builder.push_bind(status);
        }
        if let Some(priority) = filter.priority {
            builder.push(" AND t.priority = ");
            builder.push_bind(priority);
        }
        if let Some(initiative_id) = filter.initiative_id {
            builder.push(" AND t.initiative_id = ");
            builder.push_bind(initiative_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            builder.push(" AND t.assigned_to = ");
            builder.push_bind(assigned_to);
        }
        push_district_name(&mut builder, filter.district.as_deref());
        push_search(&mut builder, filter.search.as_deref(), &["t.title", "t.description"]);

        builder.push(" ORDER BY t.due_date DESC, t.priority DESC");
        Ok(builder.build_query_as::<Task>().fetch_all(&self.pool).await?)
    }

    async fn get_task(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Task>> {
        self.fetch_one_scoped(TASK_SELECT, scope, EntityKind::Task, "t.id", id).await
    }

    async fn create_task(&self, req: CreateTaskRequest, created_by: Uuid) -> AppResult<Task> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO tasks
                   (id, title, description, initiative_id, assigned_to, created_by, priority, status,
                    due_date, completed_at, progress, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9,
                       CASE WHEN $8 = 'completed'::task_status THEN NOW() ELSE NULL END,
                       $10, NOW(), NOW())"#,
        )
        .bind(id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.initiative_id)
        .bind(req.assigned_to)
        .bind(created_by)
        .bind(req.priority)
        .bind(req.status)
        .bind(req.due_date)
        .bind(req.progress)
        .execute(&self.pool)
        .await?;
        self.get_task(&Scope::Unrestricted, id).await?.ok_or(AppError::NotFound)
    }

    async fn save_task(&self, task: &Task) -> AppResult<Task> {
        let result = sqlx::query(
            r#"UPDATE tasks
               SET title = $2, description = $3, initiative_id = $4, assigned_to = $5, priority = $6,
                   status = $7, due_date = $8, completed_at = $9, progress = $10, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(task.id)
        .bind(task.title.trim())
        .bind(&task.description)
        .bind(task.initiative_id)
        .bind(task.assigned_to)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.progress)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        self.get_task(&Scope::Unrestricted, task.id).await?.ok_or(AppError::NotFound)
    }

    async fn delete_task(&self, id: Uuid) -> AppResult<bool> {
        self.delete_by_id("tasks", id).await
    }

    // --- Notes ---

    async fn list_notes(&self, scope: &Scope, filter: &NoteFilter) -> AppResult<Vec<Note>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(NOTE_SELECT);
        push_scope(&mut builder, scope, EntityKind::Note);

        if let Some(note_type) = filter.note_type {
            builder.push(" AND n.note_type = ");
            builder.push_bind(note_type);
        }
        if let Some(initiative_id) = filter.initiative_id {
            builder.push(" AND n.initiative_id = ");
            builder.push_bind(initiative_id);
        }
        if let Some(task_id) = filter.task_id {
            builder.push(" AND n.task_id = ");
            builder.push_bind(task_id);
        }
        push_district_name(&mut builder, filter.district.as_deref());
        push_search(&mut builder, filter.search.as_deref(), &["n.title", "n.content"]);

        builder.push(" ORDER BY n.created_at DESC");
        Ok(builder.build_query_as::<Note>().fetch_all(&self.pool).await?)
    }

    async fn get_note(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Note>> {
        self.fetch_one_scoped(NOTE_SELECT, scope, EntityKind::Note, "n.id", id).await
    }

    async fn create_note(&self, req: CreateNoteRequest, author_id: Uuid) -> AppResult<Note> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO notes
                   (id, title, content, note_type, initiative_id, task_id, author_id, is_public, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())"#,
        )
        .bind(id)
        .bind(req.title.trim())
        .bind(&req.content)
        .bind(req.note_type)
        .bind(req.initiative_id)
        .bind(req.task_id)
        .bind(author_id)
        .bind(req.is_public)
        .execute(&self.pool)
        .await?;
        self.get_note(&Scope::Unrestricted, id).await?.ok_or(AppError::NotFound)
    }

    async fn save_note(&self, note: &Note) -> AppResult<Note> {
        let result = sqlx::query(
            r#"UPDATE notes
               SET title = $2, content = $3, note_type = $4, is_public = $5, updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(note.id)
        .bind(note.title.trim())
        .bind(&note.content)
        .bind(note.note_type)
        .bind(note.is_public)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        self.get_note(&Scope::Unrestricted, note.id).await?.ok_or(AppError::NotFound)
    }

    async fn delete_note(&self, id: Uuid) -> AppResult<bool> {
        self.delete_by_id("notes", id).await
    }

    // --- Documents ---

    async fn list_documents(&self, scope: &Scope, filter: &DocumentFilter) -> AppResult<Vec<Document>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(DOCUMENT_SELECT);
        push_scope(&mut builder, scope, EntityKind::Document);

        if let Some(initiative_id) = filter.initiative_id {
            builder.push(" AND doc.initiative_id = ");
            builder.push_bind(initiative_id);
        }
        if let Some(task_id) = filter.task_id {
            builder.push(" AND doc.task_id = ");
            builder.push_bind(task_id);
        }
        push_district_name(&mut builder, filter.district.as_deref());
        push_search(&mut builder, filter.search.as_deref(), &["doc.title", "doc.description"]);

        builder.push(" ORDER BY doc.created_at DESC");
        Ok(builder.build_query_as::<Document>().fetch_all(&self.pool).await?)
    }

    async fn get_document(&self, scope: &Scope, id: Uuid) -> AppResult<Option<Document>> {
        self.fetch_one_scoped(DOCUMENT_SELECT, scope, EntityKind::Document, "doc.id", id).await
    }

    async fn create_document(&self, doc: NewDocument, uploaded_by: Uuid) -> AppResult<Document> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO documents
                   (id, title, description, file_key, file_size, initiative_id, task_id, uploaded_by, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())"#,
        )
        .bind(id)
        .bind(doc.title.trim())
        .bind(&doc.description)
        .bind(&doc.file_key)
        .bind(doc.file_size)
        .bind(doc.initiative_id)
        .bind(doc.task_id)
        .bind(uploaded_by)
        .execute(&self.pool)
        .await?;
        self.get_document(&Scope::Unrestricted, id).await?.ok_or(AppError::NotFound)
    }

    async fn delete_document(&self, id: Uuid) -> AppResult<bool> {
        self.delete_by_id("documents", id).await
    }

    // --- Sheets & Events ---

    async fn list_sheets(&self, scope: &Scope, initiative_id: Uuid) -> AppResult<Vec<InitiativeSheet>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SHEET_SELECT);
        push_scope(&mut builder, scope, EntityKind::Sheet);
        builder.push(" AND s.initiative_id = ");
        builder.push_bind(initiative_id);
        builder.push(" ORDER BY s.created_at DESC");
        Ok(builder.build_query_as::<InitiativeSheet>().fetch_all(&self.pool).await?)
    }

    async fn create_sheet(&self, initiative_id: Uuid, req: CreateSheetRequest, added_by: Uuid) -> AppResult<InitiativeSheet> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO initiative_sheets (id, initiative_id, sheet_url, added_by, created_at)
               VALUES ($1, $2, $3, $4, NOW())"#,
        )
        .bind(id)
        .bind(initiative_id)
        .bind(req.sheet_url.trim())
        .bind(added_by)
        .execute(&self.pool)
        .await?;
        self.fetch_one_scoped(SHEET_SELECT, &Scope::Unrestricted, EntityKind::Sheet, "s.id", id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn list_events(&self, scope: &Scope, range: &DateRange, initiative_id: Option<Uuid>) -> AppResult<Vec<Event>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(EVENT_SELECT);
        push_scope(&mut builder, scope, EntityKind::Event);

        if let Some(initiative_id) = initiative_id {
            builder.push(" AND e.initiative_id = ");
            builder.push_bind(initiative_id);
        }
        // Day-granular, inclusive on both ends, evaluated in UTC.
        if let Some(from) = range.from {
            builder.push(" AND (e.start_at AT TIME ZONE 'UTC')::date >= ");
            builder.push_bind(from);
        }
        if let Some(to) = range.to {
            builder.push(" AND (e.start_at AT TIME ZONE 'UTC')::date <= ");
            builder.push_bind(to);
        }

        builder.push(" ORDER BY e.start_at ASC");
        Ok(builder.build_query_as::<Event>().fetch_all(&self.pool).await?)
    }

    async fn create_event(&self, initiative_id: Uuid, req: CreateEventRequest, created_by: Uuid) -> AppResult<Event> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO events
                   (id, initiative_id, title, description, start_at, end_at, meet_link, location, created_by, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())"#,
        )
        .bind(id)
        .bind(initiative_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(req.start_at)
        .bind(req.end_at)
        .bind(&req.meet_link)
        .bind(&req.location)
        .bind(created_by)
        .execute(&self.pool)
        .await?;
        self.fetch_one_scoped(EVENT_SELECT, &Scope::Unrestricted, EntityKind::Event, "e.id", id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::contains_pattern;

    #[test]
    fn search_wildcards_are_literal() {
        assert_eq!(contains_pattern("solar"), "%solar%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
