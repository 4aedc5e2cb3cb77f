//! planboard — project/task management with dependency-aware scheduling.
//!
//! This module exports the core components for testing and integration.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod schedule;
pub mod store;
pub mod types;
