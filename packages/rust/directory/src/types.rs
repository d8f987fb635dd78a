//! Response and request types for the asset directory API.

use checkio_shared::CategoryId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An upstream user. Only the fields CheckIO displays or acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub employee_num: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// An upstream asset category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_type: Option<String>,
}

/// Parameters for a category-filtered hardware listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareQuery {
    pub category_id: CategoryId,
    pub limit: u32,
    pub offset: Option<u32>,
    pub sort: Option<String>,
}

impl HardwareQuery {
    pub fn new(category_id: CategoryId, limit: u32) -> Self {
        Self {
            category_id,
            limit,
            offset: None,
            sort: None,
        }
    }
}

/// One page of a listing endpoint: `{"total": n, "rows": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HardwarePage {
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub total: u64,
}

/// Result of a checkout or checkin.
///
/// The upstream reports refusals (asset already assigned, validation errors)
/// inside a successful HTTP response, so callers must check [`is_success`](Self::is_success).
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub status: String,
    pub message: String,
    pub payload: Option<Value>,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    pub(crate) fn from_envelope(body: &Value) -> Self {
        Self {
            status: body
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("error")
                .to_string(),
            message: body.get("messages").map(messages_text).unwrap_or_default(),
            payload: body.get("payload").filter(|p| !p.is_null()).cloned(),
        }
    }
}

/// Flatten the upstream `messages` field, which is either a string or a
/// map of field name to a list of strings.
pub(crate) fn messages_text(messages: &Value) -> String {
    match messages {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(field, errors)| format!("{field}: {}", messages_text(errors)))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Array(items) => items
            .iter()
            .map(messages_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
