//! Encoding and decoding helpers between roster domain types and the plain
//! representations stored in SQLite columns.
//!
//! Month-days are stored as `2000-MM-DD`. Booleans are written as integers
//! but read leniently, because imported rows may carry `'True'`/`'False'`
//! text. Nothing above this module ever sees a string-typed boolean.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use roster_core::{
  MalformedRecord,
  date::MonthDay,
  person::{ImageFlags, Person, PersonId, PersonKind},
};

// ─── Booleans ────────────────────────────────────────────────────────────────

/// Padding stripped from legacy boolean text: ASCII space, tab, newline,
/// vertical tab, form feed and carriage return. `schema::truthy` strips the
/// same set with `char(32, 9, 10, 11, 12, 13)`.
pub const FLAG_PADDING: [char; 6] = [' ', '\t', '\n', '\x0B', '\x0C', '\r'];

/// Interpret legacy boolean text. Must agree with `schema::truthy`.
pub fn parse_flag_text(s: &str) -> Option<bool> {
  match s.trim_matches(&FLAG_PADDING[..]).to_ascii_lowercase().as_str() {
    "true" | "t" | "1" | "yes" | "y" => Some(true),
    "false" | "f" | "0" | "no" | "n" | "" => Some(false),
    _ => None,
  }
}

pub fn encode_flag(b: bool) -> i64 { i64::from(b) }

pub fn decode_flag(v: &Value) -> Result<bool, String> {
  match v {
    Value::Null => Ok(false),
    Value::Integer(n) => Ok(*n != 0),
    Value::Real(f) => Ok(*f != 0.0),
    Value::Text(s) => parse_flag_text(s).ok_or_else(|| format!("not a boolean: {s:?}")),
    Value::Blob(_) => Err("boolean column holds a blob".to_owned()),
  }
}

// ─── Ids ─────────────────────────────────────────────────────────────────────

/// Decode an optional id column; blank and `"NULL"` text mean absent.
pub fn decode_optional_id(v: &Value) -> Result<Option<PersonId>, String> {
  match v {
    Value::Null => Ok(None),
    Value::Integer(n) => Ok(Some(PersonId(*n))),
    Value::Text(s) if roster_core::display::is_placeholder(s.trim()) => Ok(None),
    Value::Text(s) => s
      .parse::<PersonId>()
      .map(Some)
      .map_err(|_| format!("not an id: {s:?}")),
    other => Err(format!("not an id: {other:?}")),
  }
}

// ─── MonthDay ────────────────────────────────────────────────────────────────

pub fn encode_month_day(md: MonthDay) -> String { md.to_sentinel_string() }

// ─── PersonKind ──────────────────────────────────────────────────────────────

pub fn encode_person_kind(k: PersonKind) -> &'static str { k.as_str() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `people` row (see
/// [`PERSON_COLUMNS`](crate::schema::PERSON_COLUMNS)).
pub struct RawPerson {
  pub id:                 Option<i64>,
  pub name:               Option<String>,
  pub role:               Option<String>,
  pub club:               Option<String>,
  pub phone:              Option<String>,
  pub email:              Option<String>,
  pub kind:               Option<String>,
  pub date_of_birth:      Option<String>,
  pub anniversary:        Option<String>,
  pub active:             Value,
  pub partner_id:         Value,
  pub has_profile:        Value,
  pub has_poster:         Value,
  pub has_anniv_poster:   Value,
}

impl RawPerson {
  /// Read the 14 person columns starting at `base`.
  pub fn from_row(row: &rusqlite::Row<'_>, base: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(base)?,
      name:             row.get(base + 1)?,
      role:             row.get(base + 2)?,
      club:             row.get(base + 3)?,
      phone:            row.get(base + 4)?,
      email:            row.get(base + 5)?,
      kind:             row.get(base + 6)?,
      date_of_birth:    row.get(base + 7)?,
      anniversary:      row.get(base + 8)?,
      active:           row.get(base + 9)?,
      partner_id:       row.get(base + 10)?,
      has_profile:      row.get(base + 11)?,
      has_poster:       row.get(base + 12)?,
      has_anniv_poster: row.get(base + 13)?,
    })
  }

  pub fn into_person(self) -> Result<Person, MalformedRecord> {
    let id = self
      .id
      .map(PersonId)
      .ok_or_else(|| MalformedRecord::new(None, "missing id"))?;
    let bad = |reason: String| MalformedRecord::new(Some(id), reason);

    let kind = self
      .kind
      .as_deref()
      .ok_or_else(|| bad("missing kind".to_owned()))?
      .parse::<PersonKind>()
      .map_err(|e: roster_core::Error| bad(e.to_string()))?;

    let date_of_birth = self
      .date_of_birth
      .as_deref()
      .ok_or_else(|| bad("missing date of birth".to_owned()))?
      .parse::<MonthDay>()
      .map_err(|e: roster_core::Error| bad(e.to_string()))?;

    let anniversary = self
      .anniversary
      .as_deref()
      .filter(|s| !roster_core::display::is_placeholder(s.trim()))
      .map(str::parse::<MonthDay>)
      .transpose()
      .map_err(|e| bad(e.to_string()))?;

    Ok(Person {
      id,
      name: self.name.unwrap_or_default(),
      role: self.role,
      club: self.club,
      phone: self.phone,
      email: self.email,
      kind,
      date_of_birth,
      anniversary,
      active: decode_flag(&self.active).map_err(bad)?,
      partner_id: decode_optional_id(&self.partner_id).map_err(bad)?,
      images: ImageFlags {
        profile:            decode_flag(&self.has_profile).map_err(bad)?,
        poster:             decode_flag(&self.has_poster).map_err(bad)?,
        anniversary_poster: decode_flag(&self.has_anniv_poster).map_err(bad)?,
      },
    })
  }
}
