//! Report analyzer server library.
//!
//! Stores aggregated test run results (test result containers) with their
//! scores, nested test classes and references to capture artifacts.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
