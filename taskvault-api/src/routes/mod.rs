/// API route handlers
///
/// Organized by resource:
///
/// - `health`: liveness endpoint
/// - `users`: registration, sessions, profile and avatar endpoints
/// - `tasks`: ownership-scoped task endpoints

pub mod health;
pub mod tasks;
pub mod users;
