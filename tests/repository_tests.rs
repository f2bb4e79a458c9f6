use chrono::{Duration, NaiveDate, Utc};
use district_dashboard::{
    InMemoryRepository, PostgresRepository,
    choices::{Role, TaskPriority, TaskStatus},
    models::{
        CreateDistrictRequest, CreateEventRequest, CreateInitiativeRequest, CreateNoteRequest,
        CreateSheetRequest, CreateTaskRequest, DateRange, District, DocumentFilter, Initiative,
        InitiativeFilter, NewDocument, NoteFilter, TaskFilter, User,
    },
    policy::Scope,
    repository::Repository,
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Fixture ---

struct Fixture {
    east: District,
    west: District,
    coordinator: User,
    initiative: Initiative,
}

async fn district(repo: &dyn Repository, name: &str) -> District {
    repo.create_district(CreateDistrictRequest {
        name: name.to_string(),
        description: String::new(),
    })
    .await
    .unwrap()
}

async fn coordinator(repo: &dyn Repository, email: &str, district_id: Uuid) -> User {
    repo.create_user(User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: "Test Coordinator".to_string(),
        role: Role::Coordinator,
        district_id: Some(district_id),
        is_active: true,
        ..User::default()
    })
    .await
    .unwrap()
}

/// Builds the same small graph against any repository. `tag` keeps names
/// unique on a shared database.
async fn seed(repo: &dyn Repository, tag: &str) -> Fixture {
    let east = district(repo, &format!("East {tag}")).await;
    let west = district(repo, &format!("West {tag}")).await;
    let coordinator = coordinator(repo, &format!("east-{tag}@example.org"), east.id).await;
    let initiative = repo
        .create_initiative(
            CreateInitiativeRequest {
                title: "Solar Lab".to_string(),
                district_id: east.id,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                ..CreateInitiativeRequest::default()
            },
            coordinator.id,
        )
        .await
        .unwrap();
    Fixture {
        east,
        west,
        coordinator,
        initiative,
    }
}

async fn task(repo: &dyn Repository, fx: &Fixture, title: &str, priority: TaskPriority, due_in_days: i64) -> Uuid {
    repo.create_task(
        CreateTaskRequest {
            title: title.to_string(),
            initiative_id: fx.initiative.id,
            assigned_to: fx.coordinator.id,
            priority,
            due_date: Utc::now() + Duration::days(due_in_days),
            ..CreateTaskRequest::default()
        },
        fx.coordinator.id,
    )
    .await
    .unwrap()
    .id
}

// --- Shared assertions ---

async fn check_scoping(repo: &dyn Repository, fx: &Fixture) {
    let task_id = task(repo, fx, "Wiring", TaskPriority::Medium, 5).await;
    let east = Scope::District(fx.east.id);
    let west = Scope::District(fx.west.id);

    assert!(repo.get_initiative(&east, fx.initiative.id).await.unwrap().is_some());
    assert!(repo.get_initiative(&west, fx.initiative.id).await.unwrap().is_none());
    assert!(repo.get_initiative(&Scope::Nothing, fx.initiative.id).await.unwrap().is_none());
    assert!(repo.get_task(&west, task_id).await.unwrap().is_none());

    let visible = repo.get_task(&east, task_id).await.unwrap().unwrap();
    assert_eq!(visible.district_id, fx.east.id);
    assert_eq!(visible.initiative_title, "Solar Lab");
    assert_eq!(visible.assignee_name, "Test Coordinator");

    // A filter naming another district cannot widen the scope.
    let filter = InitiativeFilter {
        district: Some(fx.west.name.clone()),
        ..InitiativeFilter::default()
    };
    assert!(repo.list_initiatives(&east, &filter).await.unwrap().is_empty());

    // LIKE wildcards in a search term are matched literally.
    let filter = InitiativeFilter {
        search: Some("Solar_Lab".to_string()),
        ..InitiativeFilter::default()
    };
    assert!(repo.list_initiatives(&east, &filter).await.unwrap().is_empty());
    let filter = InitiativeFilter {
        search: Some("lar l".to_string()),
        ..InitiativeFilter::default()
    };
    assert_eq!(repo.list_initiatives(&east, &filter).await.unwrap().len(), 1);

    let filter = TaskFilter {
        initiative_id: Some(fx.initiative.id),
        ..TaskFilter::default()
    };
    assert!(repo.list_tasks(&west, &filter).await.unwrap().is_empty());
    assert_eq!(repo.list_tasks(&east, &filter).await.unwrap().len(), 1);

    let coordinators = repo.list_coordinators(&west).await.unwrap();
    assert!(coordinators.iter().all(|u| u.id != fx.coordinator.id));
}

async fn check_cascade(repo: &dyn Repository, fx: &Fixture) {
    let task_id = task(repo, fx, "Inverter", TaskPriority::High, 3).await;
    let note = repo
        .create_note(
            CreateNoteRequest {
                title: "Site visit".to_string(),
                content: "Roof is ready.".to_string(),
                initiative_id: fx.initiative.id,
                task_id: Some(task_id),
                is_public: true,
                ..CreateNoteRequest::default()
            },
            fx.coordinator.id,
        )
        .await
        .unwrap();
    repo.create_document(
        NewDocument {
            title: "Wiring diagram".to_string(),
            description: String::new(),
            file_key: "documents/diagram.pdf".to_string(),
            file_size: 1024,
            initiative_id: fx.initiative.id,
            task_id: Some(task_id),
        },
        fx.coordinator.id,
    )
    .await
    .unwrap();

    assert!(repo.delete_task(task_id).await.unwrap());
    assert!(repo.get_note(&Scope::Unrestricted, note.id).await.unwrap().is_none());
    let documents = repo
        .list_documents(&Scope::Unrestricted, &DocumentFilter::for_initiative(fx.initiative.id))
        .await
        .unwrap();
    assert!(documents.is_empty());
    assert!(!repo.delete_task(task_id).await.unwrap());
}

// --- In-memory ---

#[tokio::test]
async fn memory_scoping() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;
    check_scoping(&repo, &fx).await;
}

#[tokio::test]
async fn memory_task_cascade() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;
    check_cascade(&repo, &fx).await;
}

#[tokio::test]
async fn tasks_sort_by_due_date_then_priority() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;
    let due = Utc::now() + Duration::days(4);

    for (title, priority) in [("Low", TaskPriority::Low), ("Urgent", TaskPriority::Urgent)] {
        repo.create_task(
            CreateTaskRequest {
                title: title.to_string(),
                initiative_id: fx.initiative.id,
                assigned_to: fx.coordinator.id,
                priority,
                due_date: due,
                ..CreateTaskRequest::default()
            },
            fx.coordinator.id,
        )
        .await
        .unwrap();
    }
    task(&repo, &fx, "Later", TaskPriority::Low, 20).await;

    let titles: Vec<String> = repo
        .list_tasks(&Scope::Unrestricted, &TaskFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["Later", "Urgent", "Low"]);
}

#[tokio::test]
async fn task_created_completed_is_stamped() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;
    let done = repo
        .create_task(
            CreateTaskRequest {
                title: "Done already".to_string(),
                initiative_id: fx.initiative.id,
                assigned_to: fx.coordinator.id,
                status: TaskStatus::Completed,
                progress: 100,
                due_date: Utc::now() - Duration::days(1),
                ..CreateTaskRequest::default()
            },
            fx.coordinator.id,
        )
        .await
        .unwrap();
    assert!(done.completed_at.is_some());
    assert!(!done.is_overdue);
}

#[tokio::test]
async fn unknown_references_are_rejected() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;

    let result = repo
        .create_task(
            CreateTaskRequest {
                title: "Orphan".to_string(),
                initiative_id: Uuid::new_v4(),
                assigned_to: fx.coordinator.id,
                ..CreateTaskRequest::default()
            },
            fx.coordinator.id,
        )
        .await;
    assert!(result.is_err());

    let duplicate = repo
        .create_district(CreateDistrictRequest {
            name: format!("  {}  ", fx.east.name),
            description: String::new(),
        })
        .await;
    assert!(duplicate.is_err());
}

#[tokio::test]
async fn deleting_a_user_removes_their_work() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;
    task(&repo, &fx, "Mine", TaskPriority::Medium, 2).await;

    assert!(repo.delete_user(fx.coordinator.id).await.unwrap());
    assert!(repo.list_initiatives(&Scope::Unrestricted, &InitiativeFilter::default()).await.unwrap().is_empty());
    assert!(repo.list_tasks(&Scope::Unrestricted, &TaskFilter::default()).await.unwrap().is_empty());
    assert!(!repo.delete_user(fx.coordinator.id).await.unwrap());
}

#[tokio::test]
async fn sheets_and_events_follow_their_initiative() {
    let repo = InMemoryRepository::new();
    let fx = seed(&repo, "mem").await;
    let start = Utc::now() + Duration::days(2);

    repo.create_sheet(
        fx.initiative.id,
        CreateSheetRequest {
            sheet_url: "https://docs.google.com/spreadsheets/d/abc".to_string(),
        },
        fx.coordinator.id,
    )
    .await
    .unwrap();
    repo.create_event(
        fx.initiative.id,
        CreateEventRequest {
            title: "Launch".to_string(),
            start_at: start,
            ..CreateEventRequest::default()
        },
        fx.coordinator.id,
    )
    .await
    .unwrap();

    let west = Scope::District(fx.west.id);
    assert!(repo.list_sheets(&west, fx.initiative.id).await.unwrap().is_empty());
    assert_eq!(repo.list_sheets(&Scope::Unrestricted, fx.initiative.id).await.unwrap().len(), 1);

    let window = DateRange {
        from: Some(start.date_naive()),
        to: Some(start.date_naive()),
    };
    let events = repo.list_events(&Scope::District(fx.east.id), &window, None).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].initiative_title, "Solar Lab");

    let earlier = DateRange {
        from: None,
        to: Some(start.date_naive() - Duration::days(1)),
    };
    assert!(repo.list_events(&Scope::Unrestricted, &earlier, None).await.unwrap().is_empty());

    let notes = repo.list_notes(&west, &NoteFilter::for_initiative(fx.initiative.id)).await.unwrap();
    assert!(notes.is_empty());
}

// --- Postgres ---

async fn postgres() -> PostgresRepository {
    dotenv::dotenv().ok();
    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set to run integration tests");
    let pool = PgPool::connect(&db_url)
        .await
        .expect("Failed to connect to database for integration tests.");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations.");
    PostgresRepository::new(pool)
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a disposable Postgres"]
async fn postgres_scoping_and_cascade() {
    let repo = postgres().await;
    let tag = Uuid::new_v4().simple().to_string();
    let fx = seed(&repo, &tag).await;

    check_scoping(&repo, &fx).await;
    check_cascade(&repo, &fx).await;

    assert!(repo.delete_district(fx.east.id).await.unwrap());
    assert!(repo.delete_district(fx.west.id).await.unwrap());
    let orphan = repo.get_user(fx.coordinator.id).await.unwrap().unwrap();
    assert_eq!(orphan.district_id, None);
    assert!(repo.delete_user(fx.coordinator.id).await.unwrap());
}
