//! The visitor record: the single persisted `{count, lastUpdated}` document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Count reported when nothing has been recorded yet, or when the stored
/// record cannot be read.
pub const DEFAULT_COUNT: u64 = 1110;

/// Total recorded visits and the time of the last write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
  pub count:        u64,
  #[serde(with = "iso_millis")]
  pub last_updated: DateTime<Utc>,
}

impl VisitorRecord {
  pub fn new(count: u64) -> Self {
    Self {
      count,
      last_updated: Utc::now(),
    }
  }

  /// `{count: 1110, lastUpdated: now}`.
  pub fn baseline() -> Self {
    Self::new(DEFAULT_COUNT)
  }

  /// The record that follows this one after a single visit.
  pub fn incremented(&self) -> Self {
    Self::new(self.count.saturating_add(1))
  }
}

/// Render a count with comma thousands separators (`1234567` → `1,234,567`).
pub fn format_count(count: u64) -> String {
  let digits = count.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(ch);
  }
  out
}

/// RFC 3339 with millisecond precision and a `Z` suffix on write; any
/// RFC 3339 timestamp on read.
pub mod iso_millis {
  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
  }

  pub fn deserialize<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(d)?;
    DateTime::parse_from_rfc3339(&raw)
      .map(|dt| dt.with_timezone(&Utc))
      .map_err(serde::de::Error::custom)
  }

  /// Same format for optional timestamps.
  pub mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
      dt: &Option<DateTime<Utc>>,
      s: S,
    ) -> Result<S::Ok, S::Error>
    where
      S: Serializer,
    {
      match dt {
        Some(dt) => super::serialize(dt, s),
        None => s.serialize_none(),
      }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
      D: Deserializer<'de>,
    {
      Option::<String>::deserialize(d)?
        .map(|raw| {
          DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
  }
}
