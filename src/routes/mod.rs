/// Router Module Index
///
/// Routes are split by the authentication they require. Role and ownership
/// checks happen inside handlers through the policy module, never here.

/// Unauthenticated routes (health only).
pub mod public;

/// Routes for any active, authenticated user. Results are district-scoped.
pub mod authenticated;

/// User and district management, nested under `/admin`. Admin-only.
pub mod admin;
