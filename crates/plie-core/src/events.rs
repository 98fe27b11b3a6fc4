//! Event listing wire format.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

pub const EVENTS_PATH: &str = "/events-listing";

/// A dance event as listed on the home screen.
///
/// Only `id` is required. Fields the client does not know about are kept in
/// `extra` so they pass through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub title: Option<String>,
    /// Older payloads carry the title here; some send both, with `name` as a slug.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub date_range: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub liked: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("Untitled event")
    }

    /// Range wins over a single date when both are present.
    pub fn display_date(&self) -> Option<&str> {
        self.date_range.as_deref().or(self.date.as_deref())
    }

    pub fn display_price(&self) -> Option<&str> {
        self.price_range.as_deref().or(self.price.as_deref())
    }
}

/// Shapes a `tags` field may arrive in.
enum TagsShape<'a> {
    Csv(&'a str),
    List(&'a [Value]),
    Absent,
}

impl<'a> TagsShape<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::String(s) => TagsShape::Csv(s),
            Value::Array(items) => TagsShape::List(items),
            _ => TagsShape::Absent,
        }
    }
}

/// Normalizes `tags` into an ordered list of strings.
///
/// - `"Party, Salsa"` → `["Party", "Salsa"]` (trimmed, empties dropped)
/// - `["Party", "Salsa"]` → unchanged; non-string entries are stringified
/// - anything else → `[]`
pub fn normalize_tags(value: &Value) -> Vec<String> {
    match TagsShape::of(value) {
        TagsShape::Csv(text) => text
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        TagsShape::List(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        TagsShape::Absent => Vec::new(),
    }
}

/// Accepted locations of the event array, in priority order.
#[derive(Debug, Clone, Copy)]
enum ListingShape {
    TopLevelArray,
    DataArray,
    DataEventsArray,
    EventsArray,
}

const LISTING_SHAPES: &[ListingShape] = &[
    ListingShape::TopLevelArray,
    ListingShape::DataArray,
    ListingShape::DataEventsArray,
    ListingShape::EventsArray,
];

impl ListingShape {
    fn items(self, body: &Value) -> Option<&Vec<Value>> {
        match self {
            ListingShape::TopLevelArray => body.as_array(),
            ListingShape::DataArray => body.get("data").and_then(Value::as_array),
            ListingShape::DataEventsArray => body
                .get("data")
                .and_then(|d| d.get("events"))
                .and_then(Value::as_array),
            ListingShape::EventsArray => body.get("events").and_then(Value::as_array),
        }
    }
}

/// Parses the events listing response.
///
/// Items with a duplicate `id` are dropped (first occurrence wins).
///
/// # Errors
/// Returns `MalformedResponse` if no accepted shape matches or an item has
/// no usable `id`.
pub fn parse_events(body: &Value) -> Result<Vec<Event>, AppError> {
    let items = LISTING_SHAPES
        .iter()
        .find_map(|shape| shape.items(body))
        .ok_or_else(|| AppError::malformed("Unexpected events response"))?;

    let mut seen = HashSet::new();
    let mut events = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let event: Event = serde_json::from_value(item.clone())
            .map_err(|e| AppError::malformed(format!("Invalid event at index {idx}: {e}")))?;
        if seen.insert(event.id.clone()) {
            events.push(event);
        } else {
            tracing::warn!(id = %event.id, "dropping duplicate event id");
        }
    }
    Ok(events)
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| normalize_tags(&v))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}
