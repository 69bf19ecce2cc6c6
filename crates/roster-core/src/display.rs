//! Display normalisation: placeholder detection and name casing.
//!
//! These rules govern what is *shown*, never who is eligible. A person whose
//! phone is the literal `"NULL"` still matches; they just render without a
//! phone.

/// Stored values that mean "absent" even though the column is non-null.
pub const PLACEHOLDERS: [&str; 2] = ["", "NULL"];

/// Abbreviation tokens rendered in upper case rather than title case.
const UPPERCASE_TOKENS: [&str; 1] = ["pdg"];

pub fn is_placeholder(value: &str) -> bool { PLACEHOLDERS.contains(&value) }

/// `Some(value)` unless the value is missing or a placeholder.
pub fn present(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !is_placeholder(v))
}

/// Owned variant of [`present`].
pub fn present_owned(value: Option<&str>) -> Option<String> {
  present(value).map(str::to_owned)
}

/// Title-case a display name.
///
/// Splits on single spaces (runs of spaces produce empty tokens, which are
/// kept), upper-cases the first character of each token and lower-cases the
/// rest. `pdg` in any casing becomes `PDG`.
pub fn title_case(value: &str) -> String {
  value
    .split(' ')
    .map(title_case_token)
    .collect::<Vec<_>>()
    .join(" ")
}

fn title_case_token(token: &str) -> String {
  let lower = token.to_lowercase();
  if UPPERCASE_TOKENS.contains(&lower.as_str()) {
    return lower.to_uppercase();
  }

  let mut chars = token.chars();
  match chars.next() {
    Some(first) => {
      let mut out: String = first.to_uppercase().collect();
      out.push_str(&chars.as_str().to_lowercase());
      out
    }
    None => String::new(),
  }
}

/// A labelled value ready for display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DisplayField {
  pub label: &'static str,
  pub value: String,
}
