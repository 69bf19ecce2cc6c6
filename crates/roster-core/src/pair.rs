//! [`PairKey`]: the canonical, order-independent key of a couple.

use serde::Serialize;

use crate::person::PersonId;

/// An unordered pair of person ids.
///
/// Construction sorts the ids, so `PairKey::new(a, b) == PairKey::new(b, a)`
/// and the derived `Hash` agrees with that equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PairKey {
  low:  PersonId,
  high: PersonId,
}

impl PairKey {
  pub fn new(a: PersonId, b: PersonId) -> Self {
    if a <= b { Self { low: a, high: b } } else { Self { low: b, high: a } }
  }

  pub fn ids(&self) -> (PersonId, PersonId) { (self.low, self.high) }

  pub fn contains(&self, id: PersonId) -> bool { self.low == id || self.high == id }
}
