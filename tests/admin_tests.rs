mod common;

use axum::http::StatusCode;
use common::*;
use district_dashboard::{
    MockIdentity, MockStorageService,
    choices::Role,
    models::{District, User},
    policy::Scope,
    repository::Repository,
};
use serde_json::json;

#[tokio::test]
async fn user_management_is_admin_only() {
    let world = World::new().await;
    expect_status(world.app(), get("/admin/users", &world.c1), StatusCode::FORBIDDEN).await;

    let response = expect_status(world.app(), get("/admin/users", &world.admin), StatusCode::OK).await;
    let users: Vec<User> = body_json(response).await;
    assert_eq!(users.len(), 4);
    // Ordered by email.
    assert_eq!(users[0].email, "admin@example.org");
}

#[tokio::test]
async fn admin_creates_account_through_identity_provider() {
    let world = World::new().await;
    let payload = json!({
        "email": "new.coordinator@example.org",
        "password": "correct horse battery",
        "full_name": "New Coordinator",
        "role": "coordinator",
        "district_id": world.ampara.id
    });

    let response = expect_status(
        world.app(),
        json("POST", "/admin/users", &world.admin, payload.clone()),
        StatusCode::CREATED,
    )
    .await;
    let created: User = body_json(response).await;
    assert_eq!(created.role, Role::Coordinator);
    assert_eq!(created.district_name.as_deref(), Some("Ampara"));
    assert!(created.is_active);

    // The new coordinator can sign in immediately and is scoped to Ampara.
    let response = expect_status(world.app(), get("/me", &created), StatusCode::OK).await;
    let me: User = body_json(response).await;
    assert_eq!(me.id, created.id);
}

#[tokio::test]
async fn identity_provider_failures_surface() {
    let world = World::new().await;
    let payload = json!({ "email": "x@example.org", "password": "long enough pw" });

    let app = world.app_with(MockStorageService::new(), MockIdentity::new_failing());
    expect_status(
        app,
        json("POST", "/admin/users", &world.admin, payload),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await;

    expect_status(
        world.app(),
        json("POST", "/admin/users", &world.admin, json!({ "email": "bad", "password": "long enough pw" })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    expect_status(
        world.app(),
        json("POST", "/admin/users", &world.admin, json!({ "email": "ok@example.org", "password": "short" })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
}

#[tokio::test]
async fn admin_edits_profile() {
    let world = World::new().await;
    let uri = format!("/admin/users/{}", world.c2.id);

    let response = expect_status(
        world.app(),
        json(
            "PUT",
            &uri,
            &world.admin,
            json!({ "district_id": world.batticaloa.id, "profile_picture_key": "profile_pics/abc.png" }),
        ),
        StatusCode::OK,
    )
    .await;
    let moved: User = body_json(response).await;
    assert_eq!(moved.district_id, Some(world.batticaloa.id));
    assert_eq!(moved.profile_picture.as_deref(), Some("profile_pics/abc.png"));

    // The move takes effect on the next request.
    let response = expect_status(world.app(), get("/initiatives", &world.c2), StatusCode::OK).await;
    let visible: Vec<serde_json::Value> = body_json(response).await;
    assert_eq!(visible.len(), 1);

    expect_status(
        world.app(),
        json("PUT", &uri, &world.admin, json!({ "profile_picture_key": "documents/report.pdf" })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
}

#[tokio::test]
async fn admin_cannot_delete_self() {
    let world = World::new().await;

    let own = format!("/admin/users/{}", world.admin.id);
    expect_status(world.app(), delete(&own, &world.admin), StatusCode::FORBIDDEN).await;

    let other = format!("/admin/users/{}", world.c2.id);
    expect_status(world.app(), delete(&other, &world.c1), StatusCode::FORBIDDEN).await;
    expect_status(world.app(), delete(&other, &world.admin), StatusCode::NO_CONTENT).await;
    expect_status(world.app(), delete(&other, &world.admin), StatusCode::NOT_FOUND).await;
}

#[tokio::test]
async fn district_management() {
    let world = World::new().await;

    expect_status(
        world.app(),
        json("POST", "/admin/districts", &world.c1, json!({ "name": "Trincomalee" })),
        StatusCode::FORBIDDEN,
    )
    .await;

    let response = expect_status(
        world.app(),
        json("POST", "/admin/districts", &world.admin, json!({ "name": "Trincomalee" })),
        StatusCode::CREATED,
    )
    .await;
    let created: District = body_json(response).await;

    expect_status(
        world.app(),
        json("POST", "/admin/districts", &world.admin, json!({ "name": "Trincomalee" })),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    let uri = format!("/admin/districts/{}", created.id);
    let response = expect_status(
        world.app(),
        json("PUT", &uri, &world.admin, json!({ "description": "Eastern Province" })),
        StatusCode::OK,
    )
    .await;
    let updated: District = body_json(response).await;
    assert_eq!(updated.name, "Trincomalee");
    assert_eq!(updated.description, "Eastern Province");
}

#[tokio::test]
async fn deleting_a_district_cascades_and_orphans_members() {
    let world = World::new().await;
    let uri = format!("/admin/districts/{}", world.batticaloa.id);

    expect_status(world.app(), delete(&uri, &world.admin), StatusCode::NO_CONTENT).await;

    let initiative = world
        .repo
        .get_initiative(&Scope::Unrestricted, world.makerspace.id)
        .await
        .unwrap();
    assert!(initiative.is_none());
    let c1 = world.repo.get_user(world.c1.id).await.unwrap().unwrap();
    assert_eq!(c1.district_id, None);

    // Without a district the coordinator now sees nothing.
    let response = expect_status(world.app(), get("/tasks", &world.c1), StatusCode::OK).await;
    let tasks: Vec<serde_json::Value> = body_json(response).await;
    assert!(tasks.is_empty());
}
