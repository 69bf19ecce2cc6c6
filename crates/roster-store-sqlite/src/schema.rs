//! SQL schema for the roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- partner_id is not a foreign key; dangling and one-sided references are
-- resolved at read time.
CREATE TABLE IF NOT EXISTS people (
    id                            INTEGER PRIMARY KEY,
    name                          TEXT NOT NULL DEFAULT '',
    role                          TEXT,
    club                          TEXT,
    phone                         TEXT,
    email                         TEXT,
    kind                          TEXT,              -- 'member' | 'spouse'
    date_of_birth                 TEXT,              -- '2000-MM-DD'
    anniversary                   TEXT,              -- '2000-MM-DD' or NULL
    active                        BOOLEAN NOT NULL DEFAULT 1,
    partner_id                    INTEGER,
    has_profile_image             BOOLEAN NOT NULL DEFAULT 0,
    has_poster_image              BOOLEAN NOT NULL DEFAULT 0,
    has_anniversary_poster_image  BOOLEAN NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS blobs (
    name        TEXT PRIMARY KEY,
    bytes       BLOB NOT NULL,
    updated_at  TEXT NOT NULL     -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS people_birthday_idx    ON people(kind, date_of_birth);
CREATE INDEX IF NOT EXISTS people_anniversary_idx ON people(kind, anniversary);

PRAGMA user_version = 1;
";

/// Person columns in decode order; see `encode::RawPerson::from_row`.
pub const PERSON_COLUMNS: [&str; 14] = [
  "id",
  "name",
  "role",
  "club",
  "phone",
  "email",
  "kind",
  "date_of_birth",
  "anniversary",
  "active",
  "partner_id",
  "has_profile_image",
  "has_poster_image",
  "has_anniversary_poster_image",
];

/// `PERSON_COLUMNS` qualified with a table alias, comma separated.
pub fn person_columns(alias: &str) -> String {
  PERSON_COLUMNS
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// SQL expression evaluating a boolean column to 0/1.
///
/// Boolean columns hold integers for rows written by this crate, but rows
/// imported from older exports carry text such as `'True'` or `'false'`.
/// This must agree with `encode::parse_flag_text`.
pub fn truthy(column: &str) -> String {
  format!(
    "(CASE typeof({column})
        WHEN 'integer' THEN {column} <> 0
        WHEN 'real'    THEN {column} <> 0
        WHEN 'text'    THEN lower(trim({column}, char(32, 9, 10, 11, 12, 13))) IN ('true', 't', '1', 'yes', 'y')
        ELSE 0
      END)"
  )
}
