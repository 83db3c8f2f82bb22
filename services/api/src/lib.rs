//! services/api/src/lib.rs
//!
//! The web service around `eyecare_core`: configuration, Postgres and browser
//! adapters, and the REST and WebSocket surfaces.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
