//! Entry encoding and decoding
//!
//! A scoped entry is persisted as a JSON object with exactly three fields:
//! - `value`: the caller's value
//! - `context`: path prefix the entry is visible under, or null
//! - `validTime`: absolute expiry in ms since epoch, or null
//!
//! Anything else found in storage (foreign keys, hand-written values,
//! corrupted JSON) decodes as a plain entry that is always valid.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire field names
const FIELD_VALUE: &str = "value";
const FIELD_CONTEXT: &str = "context";
const FIELD_VALID_TIME: &str = "validTime";

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Move the instant by `delta` ms (negative moves into the past)
    pub fn offset_millis(self, delta: i64) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(since) => Self(i64::try_from(since.as_millis()).unwrap_or(i64::MAX)),
            Err(before) => Self(-i64::try_from(before.duration().as_millis()).unwrap_or(i64::MAX)),
        }
    }
}

impl From<Timestamp> for f64 {
    fn from(ts: Timestamp) -> Self {
        ts.0 as f64
    }
}

/// Expiry argument accepted by `store_entry`
///
/// Absolute timestamps and points in time are kept; anything else
/// (non-finite numbers, `None`) normalizes to "never expires". Fractional
/// milliseconds are floored so `expires_at >= now` holds exactly when the
/// unrounded instant does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpireAt(Option<Timestamp>);

impl ExpireAt {
    pub const NEVER: ExpireAt = ExpireAt(None);

    pub fn timestamp(self) -> Option<Timestamp> {
        self.0
    }
}

impl From<Timestamp> for ExpireAt {
    fn from(ts: Timestamp) -> Self {
        Self(Some(ts))
    }
}

impl From<SystemTime> for ExpireAt {
    fn from(time: SystemTime) -> Self {
        Self(Some(time.into()))
    }
}

impl From<i64> for ExpireAt {
    fn from(millis: i64) -> Self {
        Self(Some(Timestamp(millis)))
    }
}

impl From<f64> for ExpireAt {
    fn from(millis: f64) -> Self {
        if millis.is_finite() {
            Self(Some(Timestamp(millis.floor() as i64)))
        } else {
            Self::NEVER
        }
    }
}

impl<T: Into<ExpireAt>> From<Option<T>> for ExpireAt {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// A decoded storage entry
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Value not written by this crate; no context, no expiry
    Plain(Value),
    /// Value written by `store_entry`
    Scoped {
        value: Value,
        context: Option<String>,
        expires_at: Option<Timestamp>,
    },
}

/// Why a stored string fell back to a plain entry
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    pub reason: String,
    pub fallback: Entry,
}

/// Borrowed view used for writing
#[derive(Serialize)]
struct EncodedEntry<'a, V: ?Sized> {
    value: &'a V,
    context: Option<&'a str>,
    #[serde(rename = "validTime")]
    valid_time: Option<i64>,
}

/// Serialize a value with its scope into the stored string form
pub fn encode<V: Serialize + ?Sized>(
    value: &V,
    context: Option<&str>,
    expire_at: ExpireAt,
) -> serde_json::Result<String> {
    serde_json::to_string(&EncodedEntry {
        value,
        context,
        valid_time: expire_at.timestamp().map(Timestamp::as_millis),
    })
}

impl Entry {
    /// Decode a stored string, reporting why it fell back to plain
    ///
    /// JSON that simply is not shaped like a scoped entry is not an error;
    /// it is a plain entry.
    pub fn parse(raw: &str) -> Result<Entry, DecodeError> {
        let parsed: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                return Err(DecodeError {
                    reason: e.to_string(),
                    fallback: Entry::Plain(Value::String(raw.to_string())),
                });
            }
        };

        let Value::Object(map) = parsed else {
            return Ok(Entry::Plain(parsed));
        };
        if !has_scoped_fields(&map) {
            return Ok(Entry::Plain(Value::Object(map)));
        }

        let context = match &map[FIELD_CONTEXT] {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => {
                let reason = format!("context is not a string: {}", other);
                return Err(DecodeError {
                    reason,
                    fallback: Entry::Plain(Value::Object(map)),
                });
            }
        };

        let expires_at = match &map[FIELD_VALID_TIME] {
            Value::Null => None,
            Value::Number(n) => match n.as_i64() {
                Some(ms) => Some(Timestamp(ms)),
                None => n.as_f64().map(|ms| Timestamp(ms.floor() as i64)),
            },
            other => {
                let reason = format!("validTime is not a number: {}", other);
                return Err(DecodeError {
                    reason,
                    fallback: Entry::Plain(Value::Object(map)),
                });
            }
        };

        let mut map = map;
        let value = map.remove(FIELD_VALUE).unwrap_or(Value::Null);
        Ok(Entry::Scoped {
            value,
            context,
            expires_at,
        })
    }

    /// Decode a stored string, silently falling back to plain
    pub fn decode(raw: &str) -> Entry {
        Self::parse(raw).unwrap_or_else(|e| e.fallback)
    }

    pub fn value(&self) -> &Value {
        match self {
            Entry::Plain(value) => value,
            Entry::Scoped { value, .. } => value,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Entry::Plain(value) => value,
            Entry::Scoped { value, .. } => value,
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            Entry::Plain(_) => None,
            Entry::Scoped { context, .. } => context.as_deref(),
        }
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        match self {
            Entry::Plain(_) => None,
            Entry::Scoped { expires_at, .. } => *expires_at,
        }
    }
}

fn has_scoped_fields(map: &Map<String, Value>) -> bool {
    map.contains_key(FIELD_VALUE)
        && map.contains_key(FIELD_CONTEXT)
        && map.contains_key(FIELD_VALID_TIME)
}
