//! Section content items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::ContentFields;

/// One stored item of a collection section.
///
/// Field values are flattened next to the id and timestamps when
/// serialized, so an item reads like a row of its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ContentFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Value of a field, empty if the field is unset
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// An editor form submission.
///
/// `editing_id` marks a pending edit of an existing item; every other key is
/// a field value, checked against the section schema by the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDraft {
    #[serde(default)]
    pub editing_id: Option<i64>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_flat() {
        let mut fields = ContentFields::new();
        fields.insert("title".to_string(), "Monsoon".to_string());
        fields.insert("type".to_string(), "poetry".to_string());
        let now = Utc::now();
        let item = ContentItem { id: 3, fields, created_at: now, updated_at: now };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["title"], "Monsoon");
        assert_eq!(value["type"], "poetry");
        assert!(value.get("fields").is_none());
        assert_eq!(item.field("author_name"), "");

        let back: ContentItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_draft_splits_editing_id() {
        let draft: ContentDraft = serde_json::from_str(
            r#"{"editing_id": 7, "title": "Monsoon", "type": "poetry"}"#,
        )
        .unwrap();
        assert_eq!(draft.editing_id, Some(7));
        assert_eq!(draft.fields.len(), 2);
        assert!(!draft.fields.contains_key("editing_id"));

        let fresh: ContentDraft = serde_json::from_str(r#"{"title": "Monsoon"}"#).unwrap();
        assert_eq!(fresh.editing_id, None);
    }
}
