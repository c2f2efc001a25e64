//! API handlers for the login and session endpoints.

pub mod auth;
pub mod health;
