//! Bulk import of a legacy roster export.
//!
//! The export is a JSON array of rows shaped like the old hosted table:
//! `type` instead of `kind`, `dob`, and boolean columns that are sometimes
//! JSON booleans and sometimes the strings `"True"` / `"False"`. Everything is
//! normalised here; rows that cannot be normalised are skipped and logged.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value as Json;
use tracing::{info, warn};

use roster_core::{
  MalformedRecord,
  date::MonthDay,
  display::is_placeholder,
  person::{ImageFlags, Person, PersonId, PersonKind},
};

use crate::{Result, SqliteStore, encode::parse_flag_text, store::write_person};

/// Outcome of [`SqliteStore::import_legacy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportReport {
  pub imported: usize,
  pub skipped:  usize,
}

#[derive(Debug, Deserialize)]
struct LegacyRow {
  id:          Option<Json>,
  name:        Option<String>,
  role:        Option<String>,
  club:        Option<String>,
  phone:       Option<String>,
  email:       Option<String>,
  #[serde(rename = "type")]
  kind:        Option<String>,
  dob:         Option<String>,
  anniversary: Option<String>,
  active:      Option<Json>,
  partner_id:  Option<Json>,
  profile:     Option<Json>,
  poster:      Option<Json>,
  annposter:   Option<Json>,
}

fn json_flag(v: Option<&Json>) -> Result<bool, String> {
  match v {
    None | Some(Json::Null) => Ok(false),
    Some(Json::Bool(b)) => Ok(*b),
    Some(Json::Number(n)) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
    Some(Json::String(s)) => parse_flag_text(s).ok_or_else(|| format!("not a boolean: {s:?}")),
    Some(other) => Err(format!("not a boolean: {other}")),
  }
}

fn json_id(v: Option<&Json>) -> Result<Option<PersonId>, String> {
  match v {
    None | Some(Json::Null) => Ok(None),
    Some(Json::Number(n)) => n
      .as_i64()
      .map(|n| Some(PersonId(n)))
      .ok_or_else(|| format!("not an id: {n}")),
    Some(Json::String(s)) if is_placeholder(s.trim()) => Ok(None),
    Some(Json::String(s)) => s.parse::<PersonId>().map(Some).map_err(|_| format!("not an id: {s:?}")),
    Some(other) => Err(format!("not an id: {other}")),
  }
}

fn optional_month_day(v: Option<&str>) -> Result<Option<MonthDay>, String> {
  v.map(str::trim)
    .filter(|s| !is_placeholder(s))
    .map(|s| s.parse::<MonthDay>().map_err(|e| e.to_string()))
    .transpose()
}

impl LegacyRow {
  fn into_person(self) -> Result<Person, MalformedRecord> {
    let id = json_id(self.id.as_ref())
      .map_err(|reason| MalformedRecord::new(None, reason))?
      .ok_or_else(|| MalformedRecord::new(None, "missing id"))?;
    let bad = |reason: String| MalformedRecord::new(Some(id), reason);

    let kind = self
      .kind
      .as_deref()
      .ok_or_else(|| bad("missing type".to_owned()))?
      .parse::<PersonKind>()
      .map_err(|e| bad(e.to_string()))?;
    let date_of_birth = optional_month_day(self.dob.as_deref())
      .map_err(bad)?
      .ok_or_else(|| bad("missing dob".to_owned()))?;

    Ok(Person {
      id,
      name: self.name.unwrap_or_default(),
      role: self.role,
      club: self.club,
      phone: self.phone,
      email: self.email,
      kind,
      date_of_birth,
      anniversary: optional_month_day(self.anniversary.as_deref()).map_err(bad)?,
      active: json_flag(self.active.as_ref()).map_err(bad)?,
      partner_id: json_id(self.partner_id.as_ref()).map_err(bad)?,
      images: ImageFlags {
        profile:            json_flag(self.profile.as_ref()).map_err(bad)?,
        poster:             json_flag(self.poster.as_ref()).map_err(bad)?,
        anniversary_poster: json_flag(self.annposter.as_ref()).map_err(bad)?,
      },
    })
  }
}

impl SqliteStore {
  /// Import a legacy export from a JSON file. See [`Self::import_legacy_json`].
  pub async fn import_legacy(&self, path: impl AsRef<Path>) -> Result<ImportReport> {
    let text = tokio::fs::read_to_string(path).await?;
    self.import_legacy_json(&text).await
  }

  /// Import a legacy export held in memory. Existing rows with the same id
  /// are replaced; the whole batch is written in one transaction.
  pub async fn import_legacy_json(&self, json: &str) -> Result<ImportReport> {
    let rows: Vec<LegacyRow> = serde_json::from_str(json)?;

    let mut people = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for row in rows {
      match row.into_person() {
        Ok(person) => people.push(person),
        Err(malformed) => {
          warn!(id = ?malformed.id, reason = %malformed.reason, "skipping legacy row");
          skipped += 1;
        }
      }
    }

    let imported = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for person in &people {
          write_person(&tx, person)?;
        }
        tx.commit()?;
        Ok(people.len())
      })
      .await?;

    info!(imported, skipped, "legacy roster imported");
    Ok(ImportReport { imported, skipped })
  }
}
