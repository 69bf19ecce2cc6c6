//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`] and
//! [`BlobStore`].

use std::{collections::HashSet, path::Path};

use bytes::Bytes;
use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value};
use tracing::warn;

use roster_core::{
  blob::{BlobStore, ImageRole},
  date::SENTINEL_YEAR,
  display::is_placeholder,
  person::{Candidate, CandidateRow, Person, PersonId},
  store::{PersonQuery, RecordStore},
};

use crate::{
  Error, Result,
  encode::{
    RawPerson, encode_dt, encode_flag, encode_month_day, encode_person_kind,
  },
  schema::{PERSON_COLUMNS, SCHEMA, person_columns, truthy},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roster store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL against the underlying connection. Tests use this to
  /// plant rows the typed API would never write.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Insert or replace a person row. Shared by upserts and bulk import.
pub(crate) fn write_person(conn: &rusqlite::Connection, p: &Person) -> rusqlite::Result<()> {
  let placeholders = (1..=PERSON_COLUMNS.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "INSERT OR REPLACE INTO people ({}) VALUES ({placeholders})",
    PERSON_COLUMNS.join(", "),
  );

  conn.execute(
    &sql,
    rusqlite::params![
      p.id.0,
      p.name,
      p.role,
      p.club,
      p.phone,
      p.email,
      encode_person_kind(p.kind),
      encode_month_day(p.date_of_birth),
      p.anniversary.map(encode_month_day),
      encode_flag(p.active),
      p.partner_id.map(|id| id.0),
      encode_flag(p.images.profile),
      encode_flag(p.images.poster),
      encode_flag(p.images.anniversary_poster),
    ],
  )?;
  Ok(())
}

/// Build the `WHERE` clause and its positional parameters for `query`.
fn where_clause(query: &PersonQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<String> = vec![];
  let mut params: Vec<Value> = vec![];
  let mut bind = |value: Value| -> String {
    params.push(value);
    format!("?{}", params.len())
  };

  if let Some(kind) = query.kind {
    conds.push(format!("p.kind = {}", bind(Value::Text(encode_person_kind(kind).into()))));
  }
  if let Some(dob) = query.date_of_birth {
    conds.push(format!("p.date_of_birth = {}", bind(Value::Text(encode_month_day(dob)))));
  }
  if let Some(anniversary) = query.anniversary {
    conds.push(format!("p.anniversary = {}", bind(Value::Text(encode_month_day(anniversary)))));
  }
  for (column, range) in [
    ("date_of_birth", query.date_of_birth_within),
    ("anniversary", query.anniversary_within),
  ] {
    if let Some(range) = range {
      let from = bind(Value::Text(encode_month_day(range.from)));
      let to = bind(Value::Text(encode_month_day(range.to)));
      // Stored month-days sort as text; a wrapping range is two runs.
      let joiner = if range.wraps() { "OR" } else { "AND" };
      conds.push(format!(
        "(p.{column} BETWEEN '{SENTINEL_YEAR}-01-01' AND '{SENTINEL_YEAR}-12-31'
          AND (p.{column} >= {from} {joiner} p.{column} <= {to}))"
      ));
    }
  }
  if let Some(active) = query.active {
    conds.push(format!("{} = {}", truthy("p.active"), bind(Value::Integer(encode_flag(active)))));
  }
  for (column, needle) in [
    ("name", &query.name),
    ("club", &query.club),
    ("phone", &query.phone),
    ("email", &query.email),
  ] {
    if let Some(needle) = needle.as_deref().filter(|n| !n.is_empty()) {
      let pattern = bind(Value::Text(format!("%{}%", needle.to_lowercase())));
      conds.push(format!("lower(p.{column}) LIKE {pattern}"));
    }
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, params)
}

fn into_candidate_row(
  subject: RawPerson,
  partner: Option<RawPerson>,
  expand_partner: bool,
) -> CandidateRow {
  let person = subject.into_person()?;

  let partner = match partner.filter(|_| expand_partner) {
    Some(raw) => match raw.into_person() {
      Ok(partner) => Some(partner),
      Err(malformed) => {
        warn!(id = %person.id, reason = %malformed.reason, "partner record malformed; treating as absent");
        None
      }
    },
    None => None,
  };

  Ok(Candidate { person, partner })
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  async fn query_people(&self, query: &PersonQuery) -> Result<Vec<CandidateRow>> {
    let (where_sql, mut params) = where_clause(query);
    let expand_partner = query.expand_partner;

    // SQLite treats a negative LIMIT as "no limit".
    let limit = match query.limit {
      Some(l) => i64::try_from(l).map_err(|_| Error::OutOfRange("limit", l))?,
      None => -1,
    };
    let offset = query.offset.unwrap_or(0);
    let offset = i64::try_from(offset).map_err(|_| Error::OutOfRange("offset", offset))?;
    params.push(Value::Integer(limit));
    let limit_idx = params.len();
    params.push(Value::Integer(offset));
    let offset_idx = params.len();

    let sql = format!(
      "SELECT {}, {}
       FROM people p
       LEFT JOIN people q ON q.id = p.partner_id
       {where_sql}
       ORDER BY p.id
       LIMIT ?{limit_idx} OFFSET ?{offset_idx}",
      person_columns("p"),
      person_columns("q"),
    );

    let raws: Vec<(RawPerson, Option<RawPerson>)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| {
            let subject = RawPerson::from_row(row, 0)?;
            let partner_id: Option<i64> = row.get(PERSON_COLUMNS.len())?;
            let partner = match partner_id {
              Some(_) => Some(RawPerson::from_row(row, PERSON_COLUMNS.len())?),
              None => None,
            };
            Ok((subject, partner))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      raws
        .into_iter()
        .map(|(subject, partner)| into_candidate_row(subject, partner, expand_partner))
        .collect(),
    )
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let sql = format!("SELECT {} FROM people p WHERE p.id = ?1", person_columns("p"));

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id.0], |row| RawPerson::from_row(row, 0))
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawPerson::into_person).transpose()?)
  }

  async fn upsert_person(&self, person: Person) -> Result<Person> {
    let written = person.clone();
    self
      .conn
      .call(move |conn| {
        write_person(conn, &written)?;
        Ok(())
      })
      .await?;
    Ok(person)
  }

  async fn set_image_flag(&self, id: PersonId, role: ImageRole, present: bool) -> Result<bool> {
    let column = match role {
      ImageRole::Profile => "has_profile_image",
      ImageRole::Poster => "has_poster_image",
      ImageRole::AnniversaryPoster => "has_anniversary_poster_image",
    };
    let sql = format!("UPDATE people SET {column} = ?1 WHERE id = ?2");

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![encode_flag(present), id.0])?))
      .await?;
    Ok(changed > 0)
  }

  async fn active_emails(&self) -> Result<Vec<String>> {
    let sql = format!(
      "SELECT email FROM people
       WHERE {} = 1 AND email IS NOT NULL
       ORDER BY id",
      truthy("active"),
    );

    let raw: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut seen = HashSet::new();
    Ok(
      raw
        .into_iter()
        .map(|e| e.trim().to_owned())
        .filter(|e| !is_placeholder(e))
        .filter(|e| seen.insert(e.clone()))
        .collect(),
    )
  }
}

// ─── BlobStore impl ──────────────────────────────────────────────────────────

impl BlobStore for SqliteStore {
  type Error = crate::Error;

  async fn get_blob(&self, name: &str) -> Result<Option<Bytes>> {
    let name = name.to_owned();
    let bytes: Option<Vec<u8>> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT bytes FROM blobs WHERE name = ?1",
              rusqlite::params![name],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(bytes.map(Bytes::from))
  }

  async fn put_blob(&self, name: &str, bytes: Bytes) -> Result<()> {
    let name = name.to_owned();
    let at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO blobs (name, bytes, updated_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, bytes.as_ref(), at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_blob(&self, name: &str) -> Result<bool> {
    let name = name.to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM blobs WHERE name = ?1", rusqlite::params![name])?)
      })
      .await?;
    Ok(removed > 0)
  }
}
