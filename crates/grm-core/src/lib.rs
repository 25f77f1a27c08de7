//! Core types and trait definitions for the GRM portal.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! grievance status engine lives here as plain functions over values; the
//! store and API crates are thin collaborators around it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod content;
pub mod error;
pub mod grievance;
pub mod status;
pub mod store;
pub mod user;

pub use error::{Error, Result};
