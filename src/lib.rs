//! Library crate for chess-link-back, exposing modules for binaries and integration tests.

/// Tunables and deployment settings.
pub mod config;
/// Game records and the stores holding them.
pub mod dao;
/// Request and response bodies.
pub mod dto;
/// Service errors and their HTTP mapping.
pub mod error;
/// Axum routers.
pub mod routes;
/// Chess rules on top of the `chess` crate.
pub mod rules;
/// Operations behind the routes.
pub mod services;
/// Shared application state.
pub mod state;
