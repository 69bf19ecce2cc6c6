//! Router tests against an in-memory SQLite store, plus a fake store for
//! failure paths SQLite will not produce on demand.

use std::{collections::HashSet, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use chrono::FixedOffset;
use bytes::Bytes;
use roster_core::{
  MalformedRecord,
  blob::{BlobStore, ImageRole},
  date::MonthDay,
  person::{Candidate, CandidateRow, Person, PersonId},
  store::{PersonQuery, RecordStore},
};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, api_router};

fn md(s: &str) -> MonthDay { s.parse().unwrap() }

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();

  let mut anil = Person::member(1, "anil mohindru", md("03-14"));
  anil.anniversary = Some(md("06-10"));
  anil.partner_id = Some(PersonId(2));
  anil.role = Some("pdg".into());
  anil.phone = Some("NULL".into());
  anil.images.profile = true;

  let mut amita = Person::member(2, "amita mohindru", md("11-02"));
  amita.anniversary = Some(md("06-10"));
  amita.partner_id = Some(PersonId(1));

  let sunita = Person::spouse(3, "sunita kumar", md("03-14"), PersonId(4));

  for p in [anil, amita, sunita] {
    store.upsert_person(p).await.unwrap();
  }
  store
    .put_blob("1.jpg", Bytes::from_static(b"profile"))
    .await
    .unwrap();

  AppState::new(Arc::new(store), FixedOffset::east_opt(330 * 60).unwrap())
}

async fn oneshot<S>(state: AppState<S>, method: &str, uri: &str, body: Body) -> Response
where
  S: RecordStore + BlobStore + 'static,
{
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(body)
    .unwrap();
  api_router(state).oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ── Fake store ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum FakeError {
  #[error("connection refused")]
  Refused,
  #[error(transparent)]
  Malformed(#[from] MalformedRecord),
}

/// Serves `people` unless `down`; records in `unreadable` fail to decode.
#[derive(Default)]
struct FakeStore {
  people:     Vec<Person>,
  unreadable: HashSet<PersonId>,
  down:       bool,
}

impl FakeStore {
  fn check(&self) -> Result<(), FakeError> {
    if self.down { Err(FakeError::Refused) } else { Ok(()) }
  }
}

impl RecordStore for FakeStore {
  type Error = FakeError;

  async fn query_people(&self, _: &PersonQuery) -> Result<Vec<CandidateRow>, FakeError> {
    self.check()?;
    Ok(self.people.iter().cloned().map(|p| Ok(Candidate::alone(p))).collect())
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>, FakeError> {
    self.check()?;
    if self.unreadable.contains(&id) {
      return Err(MalformedRecord::new(Some(id), "unknown kind \"alien\"").into());
    }
    Ok(self.people.iter().find(|p| p.id == id).cloned())
  }

  async fn upsert_person(&self, person: Person) -> Result<Person, FakeError> {
    self.check()?;
    Ok(person)
  }

  async fn set_image_flag(&self, _: PersonId, _: ImageRole, _: bool) -> Result<bool, FakeError> {
    self.check()?;
    Ok(false)
  }

  async fn active_emails(&self) -> Result<Vec<String>, FakeError> {
    self.check()?;
    Ok(vec![])
  }
}

impl BlobStore for FakeStore {
  type Error = FakeError;

  async fn get_blob(&self, _: &str) -> Result<Option<Bytes>, FakeError> {
    self.check()?;
    Ok(None)
  }

  async fn put_blob(&self, _: &str, _: Bytes) -> Result<(), FakeError> { self.check() }

  async fn delete_blob(&self, _: &str) -> Result<bool, FakeError> {
    self.check()?;
    Ok(false)
  }
}

fn fake_state(store: FakeStore) -> AppState<FakeStore> {
  AppState::new(Arc::new(store), FixedOffset::east_opt(330 * 60).unwrap())
}

// ── Occasions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn anniversary_lists_the_couple_once() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/occasions?kind=anniversary&date=06-10", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["date"], "06-10");
  let occasions = body["occasions"].as_array().unwrap();
  assert_eq!(occasions.len(), 1);
  assert_eq!(occasions[0]["name"], "Anil Mohindru");
  assert_eq!(occasions[0]["partner_name"], "Amita Mohindru");
  assert_eq!(occasions[0]["role"], "pdg");
  assert_eq!(occasions[0]["phone"], Value::Null);
}

#[tokio::test]
async fn spouse_birthday_survives_missing_member() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/occasions?kind=spouse-birthday&date=03-14", Body::empty()).await;
  let body = json_body(resp).await;
  let occasions = body["occasions"].as_array().unwrap();
  assert_eq!(occasions.len(), 1);
  assert_eq!(occasions[0]["name"], "Sunita Kumar");
  assert_eq!(occasions[0]["partner_name"], Value::Null);
}

#[tokio::test]
async fn occasions_default_to_today() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/occasions?kind=member-birthday", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert!(body["date"].as_str().is_some_and(|d| d.len() == 5));
}

#[tokio::test]
async fn unknown_kind_is_rejected() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/occasions?kind=wedding", Body::empty()).await;
  assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn range_wraps_from_december_into_january() {
  let state = make_state().await;
  for p in [
    Person::member(20, "deepak shah", md("12-28")),
    Person::member(21, "farah khan", md("01-03")),
    Person::member(22, "gita rao", md("01-20")),
  ] {
    state.store.upsert_person(p).await.unwrap();
  }

  let resp = oneshot(
    state,
    "GET",
    "/occasions/range?kind=member-birthday&from=12-20&to=01-10",
    Body::empty(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["from"], "12-20");
  assert_eq!(body["to"], "01-10");
  let names: Vec<_> = body["occasions"]
    .as_array()
    .unwrap()
    .iter()
    .map(|o| o["name"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(names, ["Deepak Shah", "Farah Khan"]);
}

#[tokio::test]
async fn range_defaults_to_a_month_and_dedups_couples() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/occasions/range?kind=anniversary&from=06-01", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let body = json_body(resp).await;
  assert_eq!(body["to"], "07-01");
  let occasions = body["occasions"].as_array().unwrap();
  assert_eq!(occasions.len(), 1);
  assert_eq!(occasions[0]["date"], "06-10");
  assert_eq!(occasions[0]["partner_name"], "Amita Mohindru");
}

#[tokio::test]
async fn unreachable_store_is_503() {
  let state = fake_state(FakeStore { down: true, ..Default::default() });
  let resp = oneshot(state, "GET", "/occasions?kind=anniversary&date=06-10", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

  let body = json_body(resp).await;
  assert!(body["error"].as_str().unwrap().contains("connection refused"));

  let state = fake_state(FakeStore { down: true, ..Default::default() });
  let resp = oneshot(state, "GET", "/occasions/range?kind=member-birthday&from=01-01", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// ── People ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_people_pages_with_partner() {
  let state = make_state().await;

  let resp = oneshot(state.clone(), "GET", "/people?limit=2", Body::empty()).await;
  let body = json_body(resp).await;
  let people = body["people"].as_array().unwrap();
  assert_eq!(people.len(), 2);
  assert_eq!(people[0]["id"], 1);
  assert_eq!(people[0]["partner"]["id"], 2);

  let resp = oneshot(state.clone(), "GET", "/people?limit=2&page=2", Body::empty()).await;
  let body = json_body(resp).await;
  let people = body["people"].as_array().unwrap();
  assert_eq!(people.len(), 1);
  assert_eq!(people[0]["id"], 3);
  assert_eq!(people[0]["partner"], Value::Null);

  let resp = oneshot(state, "GET", "/people?page=0", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_page_number_is_bad_request() {
  let state = make_state().await;
  let resp = oneshot(state.clone(), "GET", "/people?page=18446744073709551615&limit=10", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert!(body["error"].as_str().unwrap().contains("out of range"));

  // Fits usize but not a SQL integer.
  let resp = oneshot(state, "GET", "/people?page=1000000000000000001&limit=10", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_people_filters_by_kind_and_name() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/people?kind=member&name=AMITA", Body::empty()).await;
  let body = json_body(resp).await;
  let people = body["people"].as_array().unwrap();
  assert_eq!(people.len(), 1);
  assert_eq!(people[0]["id"], 2);
}

#[tokio::test]
async fn get_missing_person_is_404() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/people/404", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let body = json_body(resp).await;
  assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn unreadable_partner_is_left_out() {
  let mut anil = Person::member(1, "anil mohindru", md("03-14"));
  anil.partner_id = Some(PersonId(2));
  let state = fake_state(FakeStore {
    people: vec![anil],
    unreadable: HashSet::from([PersonId(2)]),
    down: false,
  });

  let resp = oneshot(state, "GET", "/people/1", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["id"], 1);
  assert_eq!(body["partner_id"], 2);
  assert_eq!(body["partner"], Value::Null);
}

#[tokio::test]
async fn unreadable_person_is_still_an_error() {
  let state = fake_state(FakeStore {
    unreadable: HashSet::from([PersonId(5)]),
    ..Default::default()
  });
  let resp = oneshot(state, "GET", "/people/5", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn put_person_with_embedded_partner() {
  let state = make_state().await;
  let body = json!({
    "name": "ravi kumar",
    "kind": "member",
    "date_of_birth": "01-20",
    "anniversary": "12-01",
    "active": true,
    "partner": {
      "id": 11,
      "name": "lata kumar",
      "kind": "spouse",
      "date_of_birth": "02-02",
      "anniversary": "12-01",
      "active": true,
      "partner_id": 10
    }
  });

  let resp = oneshot(state.clone(), "PUT", "/people/10", Body::from(body.to_string())).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let saved = json_body(resp).await;
  assert_eq!(saved["id"], 10);
  assert_eq!(saved["partner_id"], 11);

  let lata = state.store.get_person(PersonId(11)).await.unwrap().unwrap();
  assert_eq!(lata.partner_id, Some(PersonId(10)));

  let resp = oneshot(state, "GET", "/people/10", Body::empty()).await;
  let fetched = json_body(resp).await;
  assert_eq!(fetched["partner"]["name"], "lata kumar");
}

#[tokio::test]
async fn put_cannot_change_id() {
  let state = make_state().await;
  let body = json!({
    "id": 99,
    "name": "anil mohindru",
    "kind": "member",
    "date_of_birth": "03-14",
    "active": true
  });

  let resp = oneshot(state.clone(), "PUT", "/people/1", Body::from(body.to_string())).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(state.store.get_person(PersonId(99)).await.unwrap().is_none());
}

// ── Images ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn flagged_image_is_served() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/people/1/images/profile", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/jpeg");
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  assert_eq!(&bytes[..], b"profile");
}

#[tokio::test]
async fn unflagged_image_is_404_even_if_blob_exists() {
  let state = make_state().await;
  state
    .store
    .put_blob("2.jpg", Bytes::from_static(b"stray"))
    .await
    .unwrap();

  let resp = oneshot(state, "GET", "/people/2/images/profile", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_and_delete_poster() {
  let state = make_state().await;

  let resp = oneshot(state.clone(), "PUT", "/people/2/images/anniversary-poster", Body::from("jpeg")).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  let amita = state.store.get_person(PersonId(2)).await.unwrap().unwrap();
  assert!(amita.images.anniversary_poster);
  assert!(state.store.get_blob("2_anniv.jpg").await.unwrap().is_some());

  let resp = oneshot(state.clone(), "DELETE", "/people/2/images/anniversary-poster", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);
  let amita = state.store.get_person(PersonId(2)).await.unwrap().unwrap();
  assert!(!amita.images.anniversary_poster);
  assert!(state.store.get_blob("2_anniv.jpg").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_role_is_bad_request() {
  let state = make_state().await;
  let resp = oneshot(state, "GET", "/people/1/images/selfie", Body::empty()).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
