#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use chrono::{Duration, NaiveDate, Utc};
use district_dashboard::{
    AppConfig, AppState, InMemoryRepository, MockIdentity, MockStorageService, create_router,
    choices::{Role, TaskPriority, TaskStatus},
    models::{CreateDistrictRequest, CreateInitiativeRequest, CreateTaskRequest, District, Initiative, Task, User},
    repository::Repository,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

/// World
///
/// Two districts, one coordinator in each, an admin and a read-only viewer.
/// C1 coordinates "Makerspace" in Batticaloa and owns the "Kickoff" task under it.
pub struct World {
    pub repo: Arc<InMemoryRepository>,
    pub batticaloa: District,
    pub ampara: District,
    pub admin: User,
    pub c1: User,
    pub c2: User,
    pub viewer: User,
    pub makerspace: Initiative,
    pub kickoff: Task,
}

pub fn user(email: &str, role: Role, district_id: Option<Uuid>) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        full_name: email.split('@').next().unwrap_or_default().to_string(),
        role,
        district_id,
        is_active: true,
        ..User::default()
    }
}

impl World {
    pub async fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::new());

        let batticaloa = repo
            .create_district(CreateDistrictRequest {
                name: "Batticaloa".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let ampara = repo
            .create_district(CreateDistrictRequest {
                name: "Ampara".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();

        let admin = repo.create_user(user("admin@example.org", Role::Admin, None)).await.unwrap();
        let c1 = repo
            .create_user(user("c1@example.org", Role::Coordinator, Some(batticaloa.id)))
            .await
            .unwrap();
        let c2 = repo
            .create_user(user("c2@example.org", Role::Coordinator, Some(ampara.id)))
            .await
            .unwrap();
        let viewer = repo
            .create_user(user("viewer@example.org", Role::Readonly, Some(batticaloa.id)))
            .await
            .unwrap();

        let makerspace = repo
            .create_initiative(
                CreateInitiativeRequest {
                    title: "Makerspace".to_string(),
                    district_id: batticaloa.id,
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    ..CreateInitiativeRequest::default()
                },
                c1.id,
            )
            .await
            .unwrap();
        let kickoff = repo
            .create_task(
                CreateTaskRequest {
                    title: "Kickoff".to_string(),
                    initiative_id: makerspace.id,
                    assigned_to: c1.id,
                    priority: TaskPriority::High,
                    status: TaskStatus::InProgress,
                    due_date: Utc::now() + Duration::days(10),
                    ..CreateTaskRequest::default()
                },
                c1.id,
            )
            .await
            .unwrap();

        World {
            repo,
            batticaloa,
            ampara,
            admin,
            c1,
            c2,
            viewer,
            makerspace,
            kickoff,
        }
    }

    pub fn app(&self) -> Router {
        self.app_with(MockStorageService::new(), MockIdentity::new())
    }

    pub fn app_with(&self, storage: MockStorageService, identity: MockIdentity) -> Router {
        create_router(AppState {
            repo: self.repo.clone(),
            storage: Arc::new(storage),
            identity: Arc::new(identity),
            config: AppConfig::default(),
        })
    }
}

// --- Request helpers (local x-user-id bypass) ---

pub fn get(uri: &str, as_user: &User) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-user-id", as_user.id.to_string())
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, as_user: &User) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("x-user-id", as_user.id.to_string())
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, as_user: &User, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("x-user-id", as_user.id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form(uri: &str, as_user: &User, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("x-user-id", as_user.id.to_string())
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn expect_status(app: Router, request: Request<Body>, status: StatusCode) -> Response<Body> {
    let response = send(app, request).await;
    assert_eq!(response.status(), status);
    response
}
