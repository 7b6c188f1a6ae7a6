//! JSON REST API for the residence management backend.
//!
//! Exposes an axum [`Router`] backed by any
//! [`residence_core::store::ResidenceStore`]. Every route except `/`,
//! `/docs/` and `/api-token-auth/` requires `Authorization: Token <key>`;
//! writes additionally require an administrator. TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = residence_api::router(AppState::new(store, ListCache::default()));
//! ```

pub mod admin;
pub mod auth;
pub mod buildings;
pub mod cache;
pub mod docs;
pub mod error;
pub mod payload;
pub mod residents;
pub mod rooms;
pub mod tokens;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use residence_core::store::ResidenceStore;

pub use cache::ListCache;
pub use error::ApiError;

pub const WELCOME: &str = "Welcome to the Uni Residence Management API";

/// Shared handler state: the store and the list response cache.
pub struct AppState<S> {
  pub store: Arc<S>,
  pub cache: Arc<ListCache>,
}

impl<S> AppState<S> {
  pub fn new(store: S, cache: ListCache) -> Self {
    Self { store: Arc::new(store), cache: Arc::new(cache) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), cache: Arc::clone(&self.cache) }
  }
}

/// Build the full application router for `state`.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: ResidenceStore + 'static,
{
  Router::new()
    .route("/", get(welcome))
    // Buildings
    .route(
      "/api/buildings/",
      get(buildings::list::<S>).post(buildings::create::<S>),
    )
    .route(
      "/api/buildings/{id}/",
      get(buildings::retrieve::<S>)
        .put(buildings::update::<S>)
        .patch(buildings::partial_update::<S>)
        .delete(buildings::destroy::<S>),
    )
    // Rooms
    .route("/api/rooms/", get(rooms::list::<S>).post(rooms::create::<S>))
    .route(
      "/api/rooms/{id}/",
      get(rooms::retrieve::<S>)
        .put(rooms::update::<S>)
        .patch(rooms::partial_update::<S>)
        .delete(rooms::destroy::<S>),
    )
    // Residents
    .route(
      "/api/residents/",
      get(residents::list::<S>).post(residents::create::<S>),
    )
    .route(
      "/api/residents/{id}/",
      get(residents::retrieve::<S>)
        .put(residents::update::<S>)
        .patch(residents::partial_update::<S>)
        .delete(residents::destroy::<S>),
    )
    // Accounts and tooling
    .route("/api-token-auth/", post(tokens::obtain::<S>))
    .route("/admin/", get(admin::summary::<S>))
    .route("/docs/", get(docs::ui))
    .route("/docs/openapi.json", get(docs::openapi))
    .with_state(state)
}

async fn welcome() -> &'static str { WELCOME }
