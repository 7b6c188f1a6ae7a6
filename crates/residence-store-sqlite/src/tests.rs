//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use residence_core::{
  account::{DUPLICATE_USERNAME, NewUser},
  building::{Building, BuildingFields},
  cipher::{FieldCipher, FieldKey},
  query::ListQuery,
  resident::{CHECK_OUT_BEFORE_CHECK_IN, DUPLICATE_EMAIL, Resident, ResidentFields},
  room::{Room, RoomFields},
  store::{ResidenceStore, StoreError as _},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory(FieldCipher::new(FieldKey::generate()))
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn params(raw: &[(&str, &str)]) -> Vec<(String, String)> {
  raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

async fn building(s: &SqliteStore, name: &str) -> Building {
  s.create_building(BuildingFields { name: name.into(), address: "123 Test St".into() })
    .await
    .unwrap()
}

async fn room(s: &SqliteStore, building: i64, number: &str, capacity: i32) -> Room {
  s.create_room(RoomFields { building, room_number: number.into(), capacity })
    .await
    .unwrap()
}

fn resident_fields(email: &str, room: Option<i64>) -> ResidentFields {
  ResidentFields {
    first_name: "Jane".into(),
    last_name: "Doe".into(),
    email: email.into(),
    room,
    check_in_date: date(2023, 1, 1),
    check_out_date: Some(date(2023, 12, 31)),
    notes: None,
  }
}

// ─── Buildings ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_building() {
  let s = store().await;
  let created = building(&s, "Existing Building").await;

  let fetched = s.get_building(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.address, "123 Test St");
}

#[tokio::test]
async fn get_building_missing_returns_none() {
  let s = store().await;
  assert!(s.get_building(42).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_building_is_not_saved() {
  let s = store().await;
  let err = s
    .create_building(BuildingFields { name: "".into(), address: "x".into() })
    .await
    .unwrap_err();
  assert!(err.validation().unwrap().get("name").is_some());
  assert!(s.list_buildings(ListQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_building_replaces_fields() {
  let s = store().await;
  let b = building(&s, "Old").await;

  let updated = s
    .update_building(b.id, BuildingFields { name: "New".into(), address: "9 Lane".into() })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "New");
  assert_eq!(s.get_building(b.id).await.unwrap().unwrap().address, "9 Lane");

  let missing = s
    .update_building(999, BuildingFields { name: "N".into(), address: "A".into() })
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn deleting_building_cascades_to_rooms() {
  let s = store().await;
  let keep = building(&s, "Keep").await;
  let drop = building(&s, "Drop").await;
  room(&s, drop.id, "101", 2).await;
  room(&s, drop.id, "102", 2).await;
  let kept_room = room(&s, keep.id, "201", 1).await;

  assert!(s.delete_building(drop.id).await.unwrap());
  assert!(!s.delete_building(drop.id).await.unwrap());

  let rooms = s.list_rooms(ListQuery::default()).await.unwrap();
  assert_eq!(rooms, vec![kept_room]);
}

// ─── Rooms ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn room_round_trips_exact_values() {
  let s = store().await;
  let b = building(&s, "Test Building").await;
  let r = room(&s, b.id, "103", 2).await;

  let fetched = s.get_room(r.id).await.unwrap().unwrap();
  assert_eq!(fetched.room_number, "103");
  assert_eq!(fetched.capacity, 2);
  assert_eq!(fetched.building, b.id);
}

#[tokio::test]
async fn room_requires_existing_building() {
  let s = store().await;
  let err = s
    .create_room(RoomFields { building: 77, room_number: "1".into(), capacity: 1 })
    .await
    .unwrap_err();
  assert_eq!(
    err.validation().unwrap().get("building").unwrap()[0],
    "Invalid pk \"77\" - object does not exist."
  );
}

#[tokio::test]
async fn update_room_checks_row_before_reference() {
  let s = store().await;
  let b = building(&s, "B").await;
  let r = room(&s, b.id, "1", 1).await;

  let missing = s
    .update_room(999, RoomFields { building: 12345, room_number: "1".into(), capacity: 1 })
    .await
    .unwrap();
  assert!(missing.is_none());

  let err = s
    .update_room(r.id, RoomFields { building: 12345, room_number: "1".into(), capacity: 1 })
    .await
    .unwrap_err();
  assert!(err.validation().unwrap().get("building").is_some());

  let moved = s
    .update_room(r.id, RoomFields { building: b.id, room_number: "1A".into(), capacity: 3 })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(moved.capacity, 3);
}

#[tokio::test]
async fn rooms_filter_by_capacity() {
  let s = store().await;
  let b = building(&s, "B").await;
  room(&s, b.id, "101", 1).await;
  room(&s, b.id, "102", 2).await;
  room(&s, b.id, "103", 2).await;

  let query = ListQuery::parse(&Room::LIST, &params(&[("capacity", "2")])).unwrap();
  let rooms = s.list_rooms(query).await.unwrap();
  assert_eq!(rooms.len(), 2);
  assert!(rooms.iter().all(|r| r.capacity == 2));
}

#[tokio::test]
async fn rooms_search_and_order() {
  let s = store().await;
  let b = building(&s, "B").await;
  room(&s, b.id, "A-101", 1).await;
  room(&s, b.id, "B-201", 4).await;
  room(&s, b.id, "a-102", 3).await;

  let query = ListQuery::parse(
    &Room::LIST,
    &params(&[("search", "a-1"), ("ordering", "-capacity")]),
  )
  .unwrap();
  let numbers: Vec<_> = s
    .list_rooms(query)
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.room_number)
    .collect();
  assert_eq!(numbers, vec!["a-102", "A-101"]);
}

#[tokio::test]
async fn search_wildcards_are_literal() {
  let s = store().await;
  let b = building(&s, "B").await;
  room(&s, b.id, "100%", 1).await;
  room(&s, b.id, "1000", 1).await;

  let query = ListQuery::parse(&Room::LIST, &params(&[("search", "0%")])).unwrap();
  let rooms = s.list_rooms(query).await.unwrap();
  assert_eq!(rooms.len(), 1);
  assert_eq!(rooms[0].room_number, "100%");
}

#[tokio::test]
async fn deleting_room_clears_resident_room() {
  let s = store().await;
  let b = building(&s, "B").await;
  let r = room(&s, b.id, "101", 2).await;
  let resident = s
    .create_resident(resident_fields("jane.doe@example.com", Some(r.id)))
    .await
    .unwrap();

  assert!(s.delete_room(r.id).await.unwrap());

  let fetched = s.get_resident(resident.id).await.unwrap().unwrap();
  assert_eq!(fetched.room, None);
  assert_eq!(fetched.email, "jane.doe@example.com");
}

// ─── Residents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn resident_round_trips_dates() {
  let s = store().await;
  let created = s.create_resident(resident_fields("jane@example.com", None)).await.unwrap();

  let fetched = s.get_resident(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.check_in_date, date(2023, 1, 1));
  assert_eq!(fetched.check_out_date, Some(date(2023, 12, 31)));
}

#[tokio::test]
async fn check_out_before_check_in_is_rejected() {
  let s = store().await;
  let mut fields = resident_fields("early@example.com", None);
  fields.check_out_date = Some(date(2022, 12, 31));

  let err = s.create_resident(fields).await.unwrap_err();
  assert_eq!(
    err.validation().unwrap().get("check_out_date").unwrap()[0],
    CHECK_OUT_BEFORE_CHECK_IN
  );
  assert_eq!(s.summary().await.unwrap().residents, 0);
}

#[tokio::test]
async fn check_out_rule_applies_on_update_too() {
  let s = store().await;
  let r = s.create_resident(resident_fields("u@example.com", None)).await.unwrap();

  let mut fields = r.fields();
  fields.check_in_date = date(2024, 1, 1);
  let err = s.update_resident(r.id, fields).await.unwrap_err();
  assert!(err.validation().unwrap().get("check_out_date").is_some());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_resident(resident_fields("dup@example.com", None)).await.unwrap();

  let err = s
    .create_resident(resident_fields("dup@example.com", None))
    .await
    .unwrap_err();
  assert_eq!(err.validation().unwrap().get("email").unwrap()[0], DUPLICATE_EMAIL);
}

#[tokio::test]
async fn resident_may_keep_own_email_on_update() {
  let s = store().await;
  let r = s.create_resident(resident_fields("me@example.com", None)).await.unwrap();
  let other = s.create_resident(resident_fields("other@example.com", None)).await.unwrap();

  let mut fields = r.fields();
  fields.first_name = "Janet".into();
  let updated = s.update_resident(r.id, fields).await.unwrap().unwrap();
  assert_eq!(updated.first_name, "Janet");

  let mut stolen = other.fields();
  stolen.email = "me@example.com".into();
  assert!(s.update_resident(other.id, stolen).await.is_err());
}

#[tokio::test]
async fn conflicts_are_reported_together() {
  let s = store().await;
  s.create_resident(resident_fields("dup@example.com", None)).await.unwrap();

  let err = s
    .create_resident(resident_fields("dup@example.com", Some(404)))
    .await
    .unwrap_err();
  let errors = err.validation().unwrap();
  assert!(errors.get("email").is_some());
  assert!(errors.get("room").is_some());
}

#[tokio::test]
async fn residents_filter_by_date_and_search_names() {
  let s = store().await;
  let mut a = resident_fields("ann@example.com", None);
  a.first_name = "Ann".into();
  a.last_name = "Smith".into();
  let mut b = resident_fields("bob@example.com", None);
  b.first_name = "Bob".into();
  b.last_name = "Smithson".into();
  b.check_in_date = date(2023, 2, 1);
  s.create_resident(a).await.unwrap();
  s.create_resident(b).await.unwrap();

  let by_date = ListQuery::parse(&Resident::LIST, &params(&[("check_in_date", "2023-02-01")]))
    .unwrap();
  let found = s.list_residents(by_date).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].first_name, "Bob");

  let by_name = ListQuery::parse(
    &Resident::LIST,
    &params(&[("search", "smith ann"), ("ordering", "-last_name")]),
  )
  .unwrap();
  let found = s.list_residents(by_name).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].first_name, "Ann");
}

#[tokio::test]
async fn notes_are_sealed_at_rest() {
  let s = store().await;
  let mut fields = resident_fields("notes@example.com", None);
  fields.notes = Some("requires ground floor room".into());
  let r = s.create_resident(fields).await.unwrap();

  let stored: String = s
    .conn
    .call(move |conn| {
      Ok(conn.query_row(
        "SELECT notes_sealed FROM residents WHERE id = ?1",
        rusqlite::params![r.id],
        |row| row.get(0),
      )?)
    })
    .await
    .unwrap();
  assert!(!stored.contains("ground floor"));

  let fetched = s.get_resident(r.id).await.unwrap().unwrap();
  assert_eq!(fetched.notes.as_deref(), Some("requires ground floor room"));
}

#[tokio::test]
async fn notes_survive_reopening_with_the_same_master_key() {
  let path = std::env::temp_dir().join(format!(
    "residence-store-test-{}-{}.sqlite3",
    std::process::id(),
    residence_core::account::generate_token_key(),
  ));
  let master = FieldKey::generate();

  let id = {
    let s = SqliteStore::open(&path, FieldCipher::new(master.clone())).await.unwrap();
    let mut fields = resident_fields("restart@example.com", None);
    fields.notes = Some("night porter".into());
    s.create_resident(fields).await.unwrap().id
  };

  let reopened = SqliteStore::open(&path, FieldCipher::new(master)).await.unwrap();
  let fetched = reopened.get_resident(id).await.unwrap().unwrap();
  assert_eq!(fetched.notes.as_deref(), Some("night porter"));

  let wrong = SqliteStore::open(&path, FieldCipher::new(FieldKey::generate())).await.unwrap();
  assert!(matches!(
    wrong.get_resident(id).await,
    Err(Error::Core(residence_core::Error::Decryption))
  ));

  drop((reopened, wrong));
  for suffix in ["", "-wal", "-shm"] {
    let mut file = path.clone().into_os_string();
    file.push(suffix);
    let _ = std::fs::remove_file(file);
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

fn new_user(username: &str, is_admin: bool) -> NewUser {
  NewUser { username: username.into(), password_hash: "$argon2id$fake".into(), is_admin }
}

#[tokio::test]
async fn usernames_are_unique() {
  let s = store().await;
  s.create_user(new_user("adminuser", true)).await.unwrap();
  let err = s.create_user(new_user("adminuser", false)).await.unwrap_err();
  assert_eq!(err.validation().unwrap().get("username").unwrap()[0], DUPLICATE_USERNAME);
}

#[tokio::test]
async fn token_is_created_once_and_resolves_to_user() {
  let s = store().await;
  let user = s.create_user(new_user("adminuser", true)).await.unwrap();

  let first = s.token_for_user(user.id).await.unwrap();
  let second = s.token_for_user(user.id).await.unwrap();
  assert_eq!(first, second);

  let owner = s.user_for_token(first).await.unwrap().unwrap();
  assert_eq!(owner.username, "adminuser");
  assert!(owner.is_admin);

  assert!(s.user_for_token("nope".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn get_user_by_username_returns_hash() {
  let s = store().await;
  s.create_user(new_user("warden", false)).await.unwrap();
  let user = s.get_user_by_username("warden".into()).await.unwrap().unwrap();
  assert_eq!(user.password_hash, "$argon2id$fake");
  assert!(!user.is_admin);
  assert!(s.get_user_by_username("ghost".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn summary_counts_rows() {
  let s = store().await;
  let b = building(&s, "B").await;
  room(&s, b.id, "1", 1).await;
  s.create_resident(resident_fields("a@example.com", None)).await.unwrap();
  s.create_user(new_user("admin", true)).await.unwrap();

  let summary = s.summary().await.unwrap();
  assert_eq!(
    (summary.buildings, summary.rooms, summary.residents, summary.users),
    (1, 1, 1, 1)
  );
}
