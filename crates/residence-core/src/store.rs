//! The `ResidenceStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `residence-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  account::{NewUser, User},
  building::{Building, BuildingFields},
  query::ListQuery,
  resident::{Resident, ResidentFields},
  room::{Room, RoomFields},
  validation::ValidationErrors,
};

/// Backend errors must say whether they are the caller's fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// Field-level failures the caller can fix by changing the input.
  fn validation(&self) -> Option<&ValidationErrors>;
}

/// Row counts shown on the admin summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub buildings: u64,
  pub rooms:     u64,
  pub residents: u64,
  pub users:     u64,
}

/// Abstraction over a residence store backend.
///
/// Every write validates its input before touching storage (see the
/// `validate` methods on the `*Fields` types) and additionally enforces the
/// rules that need the stored data: referenced rows must exist and resident
/// emails are unique. Update methods return `None` and delete methods return
/// `false` when no row has the given id.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ResidenceStore: Send + Sync {
  type Error: StoreError;

  // ── Buildings ─────────────────────────────────────────────────────────

  fn list_buildings(
    &self,
    query: ListQuery,
  ) -> impl Future<Output = Result<Vec<Building>, Self::Error>> + Send + '_;

  fn get_building(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Building>, Self::Error>> + Send + '_;

  fn create_building(
    &self,
    fields: BuildingFields,
  ) -> impl Future<Output = Result<Building, Self::Error>> + Send + '_;

  fn update_building(
    &self,
    id: i64,
    fields: BuildingFields,
  ) -> impl Future<Output = Result<Option<Building>, Self::Error>> + Send + '_;

  /// Delete a building and, with it, all of its rooms.
  fn delete_building(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Rooms ─────────────────────────────────────────────────────────────

  fn list_rooms(
    &self,
    query: ListQuery,
  ) -> impl Future<Output = Result<Vec<Room>, Self::Error>> + Send + '_;

  fn get_room(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  fn create_room(
    &self,
    fields: RoomFields,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + '_;

  fn update_room(
    &self,
    id: i64,
    fields: RoomFields,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  /// Delete a room. Residents assigned to it keep existing with no room.
  fn delete_room(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Residents ─────────────────────────────────────────────────────────

  fn list_residents(
    &self,
    query: ListQuery,
  ) -> impl Future<Output = Result<Vec<Resident>, Self::Error>> + Send + '_;

  fn get_resident(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Resident>, Self::Error>> + Send + '_;

  fn create_resident(
    &self,
    fields: ResidentFields,
  ) -> impl Future<Output = Result<Resident, Self::Error>> + Send + '_;

  fn update_resident(
    &self,
    id: i64,
    fields: ResidentFields,
  ) -> impl Future<Output = Result<Option<Resident>, Self::Error>> + Send + '_;

  fn delete_resident(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Persist a new user. Usernames are unique.
  fn create_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user_by_username(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Return the user's token, creating one on first use.
  fn token_for_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Resolve a token key to its owner. Returns `None` for unknown keys.
  fn user_for_token(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Reporting ─────────────────────────────────────────────────────────

  fn summary(&self) -> impl Future<Output = Result<Summary, Self::Error>> + Send + '_;
}
