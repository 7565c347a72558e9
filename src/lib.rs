//! # Digital Eye Operations API Library
//!
//! This library provides the core functionality for the Digital Eye smart
//! highway dashboard backend: handlers, models, repositories, role
//! authorization, event export and a typed HTTP client.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod policy;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod validation;
pub use migration;
