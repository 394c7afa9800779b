/// Data models for TaskVault
///
/// This module contains the persisted record types and their validated
/// input structs.
///
/// # Models
///
/// - `user`: user accounts, session token set, public view
/// - `task`: per-user task records with ownership

pub mod task;
pub mod user;
