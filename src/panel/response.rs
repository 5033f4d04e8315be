//! panel::response
//!
//! Best-effort decoding of panel response bodies.
//!
//! The panel answers with loosely shaped JSON. Decoding here never fails:
//! malformed input yields an empty list or a default envelope, so callers
//! cannot tell "empty" from "malformed" by decoding alone.

use serde::Deserialize;
use serde_json::Value;

/// The `{status, msg}` wrapper many panel endpoints return.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub status: Value,
    pub msg: Value,
}

impl Envelope {
    /// Decode an envelope from a body. Non-object bodies give the default.
    pub fn decode(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Whether the envelope signals failure.
    ///
    /// A non-empty string status or a boolean `false` is a failure.
    /// Anything else, including an absent status, is success.
    pub fn is_error(&self) -> bool {
        match &self.status {
            Value::String(s) => !s.is_empty(),
            Value::Bool(b) => !b,
            _ => false,
        }
    }

    /// The message as text.
    pub fn message(&self) -> String {
        match &self.msg {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// One entry of a panel listing (site, database or crontab).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelItem {
    pub id: i64,
    pub name: String,
    pub kind: String,
}

impl PanelItem {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = match obj.get("id") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        };
        let text = |field: &str| {
            obj.get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            id,
            name: text("name"),
            kind: text("type"),
        })
    }
}

/// Decode a listing.
///
/// Accepts a top-level array or an object carrying a `data` array. Entries
/// that are not objects are skipped.
pub fn decode_items(body: &str) -> Vec<PanelItem> {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let array = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    array.iter().filter_map(PanelItem::from_value).collect()
}

/// Id of the first item named `name`. An id of 0 counts as absent.
pub fn find_id(items: &[PanelItem], name: &str) -> Option<i64> {
    items
        .iter()
        .find(|item| item.name == name)
        .map(|item| item.id)
        .filter(|id| *id != 0)
}
