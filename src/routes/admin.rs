use crate::{
    AppState,
    handlers::{districts, users},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Mounted under `/admin` behind the authentication layer. Every handler also
/// checks `can_administer` itself, so a non-admin session gets 403 rather than 401.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /admin/users
        // Creation registers the account with the identity provider first.
        .route("/users", get(users::list_users).post(users::create_user))
        // GET/PUT/DELETE /admin/users/{id}
        // An admin may not delete their own account.
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        // POST /admin/districts
        .route("/districts", post(districts::create_district))
        // PUT/DELETE /admin/districts/{id}
        // Deletion cascades to the district's initiatives.
        .route(
            "/districts/{id}",
            put(districts::update_district).delete(districts::delete_district),
        )
}
