//! Integration tests for `SqliteStore` against an in-memory database.

use bytes::Bytes;
use roster_core::{
  blob::{BlobStore, ImageRole},
  date::{MonthDay, MonthDayRange},
  matcher::{find_occasions, find_occasions_within},
  occasion::MatchKind,
  person::{Person, PersonId, PersonKind},
  store::{PersonQuery, RecordStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn md(s: &str) -> MonthDay { s.parse().unwrap() }

/// Members 1 and 2 married to each other on 06-10; member 3 single.
async fn seeded() -> SqliteStore {
  let s = store().await;

  let mut anil = Person::member(1, "anil mohindru", md("03-14"));
  anil.anniversary = Some(md("06-10"));
  anil.partner_id = Some(PersonId(2));
  anil.club = Some("rotary club of pune".into());
  anil.email = Some(" anil@example.com ".into());

  let mut amita = Person::member(2, "amita mohindru", md("11-02"));
  amita.anniversary = Some(md("06-10"));
  amita.partner_id = Some(PersonId(1));
  amita.email = Some("amita@example.com".into());

  let mut ravi = Person::member(3, "ravi kumar", md("03-14"));
  ravi.club = Some("Rotary Club of Nashik".into());
  ravi.email = Some("anil@example.com".into());

  for p in [anil, amita, ravi] {
    s.upsert_person(p).await.unwrap();
  }
  s
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_person() {
  let s = store().await;
  let mut p = Person::member(7, "Kiran Shah", md("02-29"));
  p.role = Some("PDG".into());
  p.images.poster = true;

  s.upsert_person(p.clone()).await.unwrap();
  let fetched = s.get_person(PersonId(7)).await.unwrap();
  assert_eq!(fetched, Some(p.clone()));

  p.active = false;
  s.upsert_person(p.clone()).await.unwrap();
  let fetched = s.get_person(PersonId(7)).await.unwrap().unwrap();
  assert!(!fetched.active);
}

#[tokio::test]
async fn get_person_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(PersonId(404)).await.unwrap().is_none());
}

#[tokio::test]
async fn get_person_malformed_is_an_error() {
  let s = store().await;
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth) VALUES (9, 'X', 'alien', '2000-01-01');",
  )
  .await
  .unwrap();

  let err = s.get_person(PersonId(9)).await.unwrap_err();
  assert!(matches!(err, crate::Error::Malformed(_)));
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn query_filters_by_date_and_kind() {
  let s = seeded().await;

  let rows = s
    .query_people(&PersonQuery {
      kind: Some(PersonKind::Member),
      date_of_birth: Some(md("03-14")),
      ..Default::default()
    })
    .await
    .unwrap();

  let ids: Vec<i64> = rows.into_iter().map(|r| r.unwrap().person.id.0).collect();
  assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn range_filters_wrap_past_new_year() {
  let s = seeded().await;
  s.upsert_person(Person::member(4, "deepak", md("12-30"))).await.unwrap();
  s.upsert_person(Person::member(5, "farah", md("01-02"))).await.unwrap();
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth, active)
     VALUES (6, 'placeholder', 'member', 'NULL', 1);",
  )
  .await
  .unwrap();

  let ids = |rows: Vec<roster_core::person::CandidateRow>| -> Vec<PersonId> {
    rows.into_iter().map(|r| r.unwrap().person.id).collect()
  };

  let wrapping = MonthDayRange::new(md("12-15"), md("01-10"));
  let rows = s
    .query_people(&PersonQuery { date_of_birth_within: Some(wrapping), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(ids(rows), [PersonId(4), PersonId(5)]);

  let spring = MonthDayRange::new(md("03-01"), md("03-31"));
  let rows = s
    .query_people(&PersonQuery { date_of_birth_within: Some(spring), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(ids(rows), [PersonId(1), PersonId(3)]);
}

#[tokio::test]
async fn query_text_filters_are_case_insensitive_substrings() {
  let s = seeded().await;

  let rows = s
    .query_people(&PersonQuery { club: Some("NASHIK".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].as_ref().unwrap().person.id, PersonId(3));

  let rows = s
    .query_people(&PersonQuery { name: Some("mohindru".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn query_pages_in_id_order() {
  let s = seeded().await;

  let rows = s
    .query_people(&PersonQuery { limit: Some(2), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  let ids: Vec<i64> = rows.into_iter().map(|r| r.unwrap().person.id.0).collect();
  assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn legacy_text_booleans_are_normalised() {
  let s = store().await;
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth, active, partner_id, has_poster_image)
     VALUES (20, 'old row', 'member', '2000-05-05', 'True', 'NULL', 'true'),
            (21, 'gone',    'member', '2000-05-05', 'False', NULL, 'False');",
  )
  .await
  .unwrap();

  let rows = s
    .query_people(&PersonQuery {
      date_of_birth: Some(md("05-05")),
      active: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(rows.len(), 1);
  let person = &rows[0].as_ref().unwrap().person;
  assert_eq!(person.id, PersonId(20));
  assert!(person.active);
  assert!(person.images.poster);
  assert_eq!(person.partner_id, None);
}

#[tokio::test]
async fn padded_boolean_text_filters_like_it_decodes() {
  let s = store().await;
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth, active)
     VALUES (30, 'newline', 'member', '2000-07-07', 'True' || char(10)),
            (31, 'tabbed',  'member', '2000-07-07', char(9) || 'yes' || char(13)),
            (32, 'off',     'member', '2000-07-07', ' false ');",
  )
  .await
  .unwrap();

  let rows = s
    .query_people(&PersonQuery {
      date_of_birth: Some(md("07-07")),
      active: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();
  let ids: Vec<_> = rows.iter().map(|r| r.as_ref().unwrap().person.id).collect();
  assert_eq!(ids, [PersonId(30), PersonId(31)]);
  assert!(rows.iter().all(|r| r.as_ref().unwrap().person.active));

  let off = s.get_person(PersonId(32)).await.unwrap().unwrap();
  assert!(!off.active);
}

#[tokio::test]
async fn paging_beyond_sql_integers_is_an_error() {
  let s = seeded().await;
  let err = s
    .query_people(&PersonQuery { offset: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::OutOfRange("offset", _)));

  let err = s
    .query_people(&PersonQuery { limit: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::OutOfRange("limit", _)));
}

#[tokio::test]
async fn partner_is_joined_only_when_requested() {
  let s = seeded().await;

  let query = PersonQuery { anniversary: Some(md("06-10")), ..Default::default() };
  let rows = s.query_people(&query).await.unwrap();
  assert!(rows.iter().all(|r| r.as_ref().unwrap().partner.is_none()));

  let rows = s
    .query_people(&PersonQuery { expand_partner: true, ..query })
    .await
    .unwrap();
  let first = rows[0].as_ref().unwrap();
  assert_eq!(first.partner.as_ref().map(|p| p.id), Some(PersonId(2)));
}

#[tokio::test]
async fn dangling_partner_is_absent() {
  let s = store().await;
  s.upsert_person(Person::spouse(5, "Meera", md("08-08"), PersonId(99)))
    .await
    .unwrap();

  let rows = s
    .query_people(&PersonQuery { expand_partner: true, ..Default::default() })
    .await
    .unwrap();
  let candidate = rows[0].as_ref().unwrap();
  assert_eq!(candidate.person.partner_id, Some(PersonId(99)));
  assert!(candidate.partner.is_none());
}

#[tokio::test]
async fn malformed_rows_are_reported_per_row() {
  let s = seeded().await;
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth) VALUES (50, 'bad', 'member', 'sometime');",
  )
  .await
  .unwrap();

  let rows = s.query_people(&PersonQuery::default()).await.unwrap();
  assert_eq!(rows.len(), 4);
  assert_eq!(rows.iter().filter(|r| r.is_err()).count(), 1);
  let bad = rows.into_iter().find_map(Result::err).unwrap();
  assert_eq!(bad.id, Some(PersonId(50)));
}

#[tokio::test]
async fn malformed_partner_is_treated_as_absent() {
  let s = store().await;
  s.upsert_person(Person::spouse(5, "Meera", md("08-08"), PersonId(6)))
    .await
    .unwrap();
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth) VALUES (6, 'bad', 'nobody', '2000-01-01');",
  )
  .await
  .unwrap();

  let rows = s
    .query_people(&PersonQuery {
      kind: Some(PersonKind::Spouse),
      expand_partner: true,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert!(rows[0].as_ref().unwrap().partner.is_none());
}

// ─── Image flags and recipients ──────────────────────────────────────────────

#[tokio::test]
async fn set_image_flag_updates_the_right_column() {
  let s = seeded().await;

  assert!(s.set_image_flag(PersonId(1), ImageRole::AnniversaryPoster, true).await.unwrap());
  let p = s.get_person(PersonId(1)).await.unwrap().unwrap();
  assert!(p.images.anniversary_poster);
  assert!(!p.images.poster);

  assert!(!s.set_image_flag(PersonId(404), ImageRole::Profile, true).await.unwrap());
}

#[tokio::test]
async fn active_emails_are_trimmed_and_deduplicated() {
  let s = seeded().await;
  s.execute_raw(
    "INSERT INTO people (id, name, kind, date_of_birth, email, active)
     VALUES (30, 'a', 'member', '2000-01-01', 'NULL', 1),
            (31, 'b', 'member', '2000-01-01', 'quiet@example.com', 'False');",
  )
  .await
  .unwrap();

  let emails = s.active_emails().await.unwrap();
  assert_eq!(emails, vec!["anil@example.com".to_owned(), "amita@example.com".to_owned()]);
}

// ─── Blobs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn blob_put_get_delete() {
  let s = store().await;
  let name = ImageRole::Poster.blob_name(PersonId(1));

  assert!(s.get_blob(&name).await.unwrap().is_none());

  s.put_blob(&name, Bytes::from_static(b"jpeg")).await.unwrap();
  assert_eq!(s.get_blob(&name).await.unwrap(), Some(Bytes::from_static(b"jpeg")));

  s.put_blob(&name, Bytes::from_static(b"newer")).await.unwrap();
  assert_eq!(s.get_blob(&name).await.unwrap(), Some(Bytes::from_static(b"newer")));

  assert!(s.delete_blob(&name).await.unwrap());
  assert!(!s.delete_blob(&name).await.unwrap());
  assert!(s.get_blob(&name).await.unwrap().is_none());
}

// ─── Matching end to end ─────────────────────────────────────────────────────

#[tokio::test]
async fn couple_is_celebrated_once() {
  let s = seeded().await;

  let found = find_occasions(&s, md("06-10"), MatchKind::Anniversary).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].subject_id, PersonId(1));
  assert_eq!(found[0].headline(), "Anil Mohindru & Amita Mohindru");
  assert_eq!(found[0].email.as_deref(), Some("anil@example.com"));
}

#[tokio::test]
async fn inactive_partner_cancels_anniversary() {
  let s = seeded().await;
  let mut amita = s.get_person(PersonId(2)).await.unwrap().unwrap();
  amita.active = false;
  s.upsert_person(amita).await.unwrap();

  let found = find_occasions(&s, md("06-10"), MatchKind::Anniversary).await.unwrap();
  assert!(found.is_empty());
}

#[tokio::test]
async fn anniversaries_over_a_month_list_the_couple_once() {
  let s = seeded().await;
  let range = MonthDayRange::month_from(md("06-01"));
  let found = find_occasions_within(&s, range, MatchKind::Anniversary).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].subject_id, PersonId(1));
  assert_eq!(found[0].date, md("06-10"));
}

#[tokio::test]
async fn spouse_birthday_names_the_member() {
  let s = seeded().await;
  s.upsert_person(Person::spouse(10, "sunita kumar", md("09-01"), PersonId(3)))
    .await
    .unwrap();

  let found = find_occasions(&s, md("09-01"), MatchKind::SpouseBirthday).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].name, "Sunita Kumar");
  assert_eq!(found[0].partner_name.as_deref(), Some("Ravi Kumar"));
}

// ─── Import ──────────────────────────────────────────────────────────────────

const LEGACY: &str = r#"[
  {"id": 1, "name": "ANIL MOHINDRU", "type": "member", "dob": "2000-03-14",
   "anniversary": "2000-06-10", "active": "True", "partner_id": 2,
   "profile": "True", "poster": false, "annposter": "False"},
  {"id": "2", "name": "amita mohindru", "type": "member", "dob": "2000-11-02",
   "anniversary": "2000-06-10", "active": true, "partner_id": "1"},
  {"id": 3, "name": "no dob", "type": "member", "active": true},
  {"name": "no id", "type": "member", "dob": "2000-01-01"},
  {"id": 4, "name": "widow", "type": "spouse", "dob": "2000-07-07",
   "anniversary": "NULL", "active": "False", "partner_id": "NULL"}
]"#;

#[tokio::test]
async fn legacy_import_normalises_and_skips() {
  let s = store().await;

  let report = s.import_legacy_json(LEGACY).await.unwrap();
  assert_eq!(report.imported, 3);
  assert_eq!(report.skipped, 2);

  let anil = s.get_person(PersonId(1)).await.unwrap().unwrap();
  assert!(anil.active);
  assert!(anil.images.profile);
  assert!(!anil.images.anniversary_poster);

  let widow = s.get_person(PersonId(4)).await.unwrap().unwrap();
  assert_eq!(widow.kind, PersonKind::Spouse);
  assert!(!widow.active);
  assert_eq!(widow.anniversary, None);
  assert_eq!(widow.partner_id, None);

  let found = find_occasions(&s, md("06-10"), MatchKind::Anniversary).await.unwrap();
  assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn legacy_import_reads_a_file() {
  let s = store().await;
  let path = std::env::temp_dir().join(format!("roster-import-{}.json", std::process::id()));
  tokio::fs::write(&path, LEGACY).await.unwrap();

  let report = s.import_legacy(&path).await.unwrap();
  let _ = tokio::fs::remove_file(&path).await;
  assert_eq!(report.imported, 3);
}
