//! Core types and trait definitions for the residence management backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ResidenceStore`]; the API layer depends
//! only on that abstraction.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod building;
pub mod cipher;
pub mod error;
pub mod query;
pub mod resident;
pub mod room;
pub mod store;
pub mod validation;

pub use error::{Error, Result};
pub use validation::ValidationErrors;
