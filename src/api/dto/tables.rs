/*
 * Responsibility
 * - /joinTable の request DTO
 * - body の parse は hosting platform 相当 (JSON / form / それ以外は空扱い)
 * - table の validation はしない (欠落時は "undefined" のまま書き込む)
 */
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Table identifier as it appears in the collection path.
///
/// Rendered with string-template coercion: a missing field becomes `undefined`,
/// `null` becomes `null`, objects become `[object Object]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableId(String);

impl TableId {
    pub fn missing() -> Self {
        Self("undefined".to_string())
    }

    pub fn from_field(field: Option<&Value>) -> Self {
        match field {
            Some(value) => Self(coerce(value)),
            None => Self::missing(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TableId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Array#toString: elements joined by ",", null renders as empty
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body is not valid JSON")]
    InvalidJson(#[from] serde_json::Error),
    #[error("JSON body must be an object or an array")]
    NotObjectOrArray,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTableRequest {
    pub table: TableId,
}

impl JoinTableRequest {
    /// Parse the body according to its `Content-Type`.
    ///
    /// - JSON (`application/json`, `*+json`): `table` field of an object, empty body = `{}`,
    ///   a top-level primitive is an error
    /// - `application/x-www-form-urlencoded`: first `table` pair
    /// - anything else: no field
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self, BodyError> {
        let field = match content_type.map(media_type).as_deref() {
            Some(mt) if is_json(mt) => json_table(body)?,
            Some("application/x-www-form-urlencoded") => form_table(body),
            _ => None,
        };

        Ok(Self {
            table: TableId::from_field(field.as_ref()),
        })
    }
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json(media_type: &str) -> bool {
    media_type == "application/json" || media_type.ends_with("+json")
}

fn json_table(body: &[u8]) -> Result<Option<Value>, BodyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    // strict: only objects and arrays are accepted at the top level
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(mut map) => Ok(map.remove("table")),
        Value::Array(_) => Ok(None),
        _ => Err(BodyError::NotObjectOrArray),
    }
}

fn form_table(body: &[u8]) -> Option<Value> {
    url::form_urlencoded::parse(body)
        .find(|(k, _)| k == "table")
        .map(|(_, v)| Value::String(v.into_owned()))
}
