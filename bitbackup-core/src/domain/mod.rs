//! Core domain types
//!
//! These types are shared between the HTTP clients (which produce them from
//! provider responses) and the runner (which schedules and backs them up).

pub mod job;
pub mod repository;
