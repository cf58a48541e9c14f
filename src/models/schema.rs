//! Record schemas for the magazine sections
//!
//! Every collection section is described by a static `CollectionSchema`:
//! the backing table, its editable fields with their kinds, the closed tag
//! sets, and the column the section is ordered by. The repository, the
//! editor service and the reader are all driven by these descriptors.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field values of a record, keyed by column name
pub type ContentFields = BTreeMap<String, String>;

/// Kind of an editable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text
    Text,
    /// Multi-line text
    LongText,
    /// Absolute http(s) URL
    Url,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// One value out of a closed set
    Tag,
}

/// Declaration of one editable field
#[derive(Debug, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "has_no_options")]
    pub options: &'static [&'static str],
}

fn has_no_options(options: &&'static [&'static str]) -> bool {
    options.is_empty()
}

impl FieldSpec {
    const fn text(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            required,
            options: &[],
        }
    }

    const fn long_text(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::LongText,
            required,
            options: &[],
        }
    }

    const fn url(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Url,
            required,
            options: &[],
        }
    }

    const fn date(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Date,
            required: true,
            options: &[],
        }
    }

    const fn tag(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Tag,
            required: true,
            options,
        }
    }

    /// Check a single value against this field's kind.
    ///
    /// Empty optional values are always accepted.
    pub fn check(&self, value: &str) -> Result<(), SchemaError> {
        if value.trim().is_empty() {
            return if self.required {
                Err(SchemaError::Missing(self.name.to_string()))
            } else {
                Ok(())
            };
        }

        match self.kind {
            FieldKind::Text | FieldKind::LongText => Ok(()),
            FieldKind::Url => {
                let v = value.trim();
                let rest = v
                    .strip_prefix("https://")
                    .or_else(|| v.strip_prefix("http://"));
                match rest {
                    Some(host) if !host.is_empty() && !v.contains(char::is_whitespace) => Ok(()),
                    _ => Err(SchemaError::InvalidUrl(self.name.to_string())),
                }
            }
            FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|_| ())
                .map_err(|_| SchemaError::InvalidDate(self.name.to_string())),
            FieldKind::Tag => {
                if self.options.contains(&value) {
                    Ok(())
                } else {
                    Err(SchemaError::InvalidOption {
                        field: self.name.to_string(),
                        value: value.to_string(),
                        allowed: self.options.join(", "),
                    })
                }
            }
        }
    }
}

/// Validation failures for record drafts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{0}' must be a string")]
    NotText(String),

    #[error("Field '{0}' is required")]
    Missing(String),

    #[error("Field '{field}' has invalid value '{value}' (allowed: {allowed})")]
    InvalidOption {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("Field '{0}' must be an http(s) URL")]
    InvalidUrl(String),

    #[error("Field '{0}' must be a date formatted YYYY-MM-DD")]
    InvalidDate(String),
}

/// Convert a raw JSON object into field values.
///
/// Only fields declared in `specs` are accepted; `null` is read as an empty
/// string. Absent fields stay absent so the result can serve as a patch.
pub fn parse_fields(
    specs: &[FieldSpec],
    raw: serde_json::Map<String, serde_json::Value>,
) -> Result<ContentFields, SchemaError> {
    let mut fields = ContentFields::new();
    for (name, value) in raw {
        if !specs.iter().any(|s| s.name == name) {
            return Err(SchemaError::UnknownField(name));
        }
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            _ => return Err(SchemaError::NotText(name)),
        };
        fields.insert(name, text);
    }
    Ok(fields)
}

/// Fill absent fields with empty strings and validate the full record.
pub fn complete_fields(
    specs: &[FieldSpec],
    mut fields: ContentFields,
) -> Result<ContentFields, SchemaError> {
    for spec in specs {
        let value = fields.entry(spec.name.to_string()).or_default();
        spec.check(value)?;
    }
    Ok(fields)
}

fn join_columns(fields: &[FieldSpec]) -> String {
    fields.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
}

/// Descriptor of one collection section
#[derive(Debug, Serialize)]
pub struct CollectionSchema {
    /// Stable key, also the backing table name
    pub key: &'static str,
    /// Name shown in the admin dashboard
    pub title: &'static str,
    /// Name shown in the reader
    pub page_title: &'static str,
    pub fields: &'static [FieldSpec],
    /// Column the section is listed by, newest first
    pub sort_by: &'static str,
    /// Tag field the reader groups items by
    pub group_by: &'static str,
}

impl CollectionSchema {
    pub fn table(&self) -> &'static str {
        self.key
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Options of the grouping tag, in declaration order
    pub fn groups(&self) -> &'static [&'static str] {
        self.fields
            .iter()
            .find(|f| f.name == self.group_by)
            .map(|f| f.options)
            .unwrap_or(&[])
    }

    /// Comma-separated list of the editable columns, in declaration order
    pub fn column_list(&self) -> String {
        join_columns(self.fields)
    }
}

pub static CREATIVE_WRITING: CollectionSchema = CollectionSchema {
    key: "creative_writing",
    title: "Creative Writing",
    page_title: "Creative Writing",
    fields: &[
        FieldSpec::tag("type", "Type", &["poetry", "story", "skit"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::text("author_name", "Author Name", true),
    ],
    sort_by: "created_at",
    group_by: "type",
};

pub static ARTICLES: CollectionSchema = CollectionSchema {
    key: "articles",
    title: "Articles",
    page_title: "Informative Articles",
    fields: &[
        FieldSpec::tag("category", "Category", &["tech", "health", "social", "reviews"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::text("author", "Author", true),
        FieldSpec::text("icon", "Icon", false),
    ],
    sort_by: "created_at",
    group_by: "category",
};

pub static ART_GALLERY: CollectionSchema = CollectionSchema {
    key: "art_gallery",
    title: "Art Gallery",
    page_title: "Art & Aesthetics",
    fields: &[
        FieldSpec::tag("type", "Type", &["drawing", "cartoon", "photo", "craft"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::url("image_url", "Image URL", true),
        FieldSpec::long_text("description", "Description", false),
        FieldSpec::text("artist_name", "Artist Name", true),
    ],
    sort_by: "created_at",
    group_by: "type",
};

pub static OPINIONS: CollectionSchema = CollectionSchema {
    key: "opinions",
    title: "Opinions",
    page_title: "Opinion & Expression",
    fields: &[
        FieldSpec::tag("type", "Type", &["opinion", "reflection", "debate"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::text("author_name", "Author Name", true),
    ],
    sort_by: "created_at",
    group_by: "type",
};

pub static CLASS_HIGHLIGHTS: CollectionSchema = CollectionSchema {
    key: "class_highlights",
    title: "Class Highlights",
    page_title: "Class Highlights",
    fields: &[
        FieldSpec::tag("type", "Type", &["achievement", "project", "event"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("description", "Description", true),
        FieldSpec::url("image_url", "Image URL", false),
        FieldSpec::date("event_date", "Date"),
    ],
    sort_by: "event_date",
    group_by: "type",
};

pub static FUN_ZONE: CollectionSchema = CollectionSchema {
    key: "fun_zone",
    title: "Fun Zone",
    page_title: "Fun Zone",
    fields: &[
        FieldSpec::tag("type", "Type", &["riddle", "joke", "quiz", "crossword"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::long_text("answer", "Answer", false),
    ],
    sort_by: "created_at",
    group_by: "type",
};

pub static LANGUAGE_CORNER: CollectionSchema = CollectionSchema {
    key: "language_corner",
    title: "Language Corner",
    page_title: "Language Corner",
    fields: &[
        FieldSpec::tag("language", "Language", &["malayalam", "hindi", "english"]),
        FieldSpec::tag("type", "Type", &["poem", "idiom", "proverb"]),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::long_text("translation", "Translation", false),
        FieldSpec::text("author_name", "Author Name", false),
    ],
    sort_by: "created_at",
    group_by: "language",
};

pub static INSPIRATIONAL: CollectionSchema = CollectionSchema {
    key: "inspirational",
    title: "Inspirational",
    page_title: "Inspirational",
    fields: &[
        FieldSpec::tag("type", "Type", &["quote", "story", "message"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::text("author_name", "Author Name", false),
    ],
    sort_by: "created_at",
    group_by: "type",
};

pub static SPECIAL_FEATURES: CollectionSchema = CollectionSchema {
    key: "special_features",
    title: "Special Features",
    page_title: "Special Features",
    fields: &[
        FieldSpec::tag("type", "Type", &["interview", "spotlight", "column"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::long_text("content", "Content", true),
        FieldSpec::text("featured_person", "Featured Person", false),
        FieldSpec::url("image_url", "Image URL", false),
    ],
    sort_by: "created_at",
    group_by: "type",
};

pub static MEDIA_GALLERY: CollectionSchema = CollectionSchema {
    key: "media_gallery",
    title: "Media Gallery",
    page_title: "Media Gallery",
    fields: &[
        FieldSpec::tag("type", "Type", &["photo", "video"]),
        FieldSpec::text("title", "Title", true),
        FieldSpec::url("url", "Media URL", true),
        FieldSpec::long_text("description", "Description", false),
        FieldSpec::text("category", "Category", false),
        FieldSpec::url("thumbnail_url", "Thumbnail URL", false),
    ],
    sort_by: "created_at",
    group_by: "type",
};

/// Descriptor of a single-record section
#[derive(Debug, Serialize)]
pub struct SingletonSchema {
    /// Stable key, also the backing table name
    pub key: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SingletonSchema {
    pub fn table(&self) -> &'static str {
        self.key
    }

    pub fn column_list(&self) -> String {
        join_columns(self.fields)
    }
}

pub static COVER_PAGE: SingletonSchema = SingletonSchema {
    key: "cover_page",
    title: "Cover Page",
    fields: &[
        FieldSpec::text("title", "Magazine Title", true),
        FieldSpec::text("subtitle", "Subtitle", true),
        FieldSpec::text("class_name", "Class Name", true),
        FieldSpec::long_text("theme_quote", "Theme Quote", true),
        FieldSpec::url("qr_code_url", "QR Code URL", false),
        FieldSpec::url("school_logo_url", "School Logo URL", false),
    ],
};

pub static EDITORIAL: SingletonSchema = SingletonSchema {
    key: "editorial",
    title: "Editorial",
    fields: &[
        FieldSpec::long_text("principal_message", "Principal's Message", false),
        FieldSpec::long_text("teacher_message", "Class Teacher's Message", false),
        FieldSpec::long_text("editorial_note", "Editorial Note", false),
        FieldSpec::long_text("theme_introduction", "Theme Introduction", false),
    ],
};

/// A collection section of the magazine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    CreativeWriting,
    Articles,
    ArtGallery,
    Opinions,
    ClassHighlights,
    FunZone,
    LanguageCorner,
    Inspirational,
    SpecialFeatures,
    MediaGallery,
}

impl Section {
    /// All sections, in magazine order
    pub const ALL: [Section; 10] = [
        Section::CreativeWriting,
        Section::Articles,
        Section::ArtGallery,
        Section::Opinions,
        Section::ClassHighlights,
        Section::FunZone,
        Section::LanguageCorner,
        Section::Inspirational,
        Section::SpecialFeatures,
        Section::MediaGallery,
    ];

    pub fn schema(self) -> &'static CollectionSchema {
        match self {
            Section::CreativeWriting => &CREATIVE_WRITING,
            Section::Articles => &ARTICLES,
            Section::ArtGallery => &ART_GALLERY,
            Section::Opinions => &OPINIONS,
            Section::ClassHighlights => &CLASS_HIGHLIGHTS,
            Section::FunZone => &FUN_ZONE,
            Section::LanguageCorner => &LANGUAGE_CORNER,
            Section::Inspirational => &INSPIRATIONAL,
            Section::SpecialFeatures => &SPECIAL_FEATURES,
            Section::MediaGallery => &MEDIA_GALLERY,
        }
    }

    pub fn key(self) -> &'static str {
        self.schema().key
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Section {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Section::ALL
            .into_iter()
            .find(|section| section.key() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Unknown section: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_section_keys_are_unique_table_names() {
        let mut keys: Vec<_> = Section::ALL.iter().map(|s| s.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Section::ALL.len());
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!("creative_writing".parse::<Section>().unwrap(), Section::CreativeWriting);
        assert_eq!("Media-Gallery".parse::<Section>().unwrap(), Section::MediaGallery);
        assert!("cover_page".parse::<Section>().is_err());
    }

    #[test]
    fn test_every_schema_groups_by_a_tag_field() {
        for section in Section::ALL {
            let schema = section.schema();
            let group = schema.field(schema.group_by).expect("group field declared");
            assert_eq!(group.kind, FieldKind::Tag, "{}", schema.key);
            assert!(!schema.groups().is_empty());
            assert!(schema.sort_by == "created_at" || schema.field(schema.sort_by).is_some());
        }
    }

    #[test]
    fn test_class_highlights_sort_by_event_date() {
        assert_eq!(Section::ClassHighlights.schema().sort_by, "event_date");
        assert_eq!(Section::Articles.schema().sort_by, "created_at");
    }

    #[test]
    fn test_parse_fields_rejects_unknown_and_non_text() {
        let schema = Section::CreativeWriting.schema();

        let err = parse_fields(schema.fields, raw(json!({"id": "5"}))).unwrap_err();
        assert_eq!(err, SchemaError::UnknownField("id".to_string()));

        let err = parse_fields(schema.fields, raw(json!({"title": 12}))).unwrap_err();
        assert_eq!(err, SchemaError::NotText("title".to_string()));

        let fields = parse_fields(schema.fields, raw(json!({"title": null}))).unwrap();
        assert_eq!(fields.get("title").map(String::as_str), Some(""));
    }

    #[test]
    fn test_complete_fields_fills_optional_and_checks_required() {
        let schema = Section::ArtGallery.schema();
        let fields = parse_fields(
            schema.fields,
            raw(json!({
                "type": "craft",
                "title": "Paper boats",
                "image_url": "https://example.com/boats.jpg",
                "artist_name": "Anu"
            })),
        )
        .unwrap();

        let complete = complete_fields(schema.fields, fields).unwrap();
        assert_eq!(complete.get("description").map(String::as_str), Some(""));

        let missing = parse_fields(schema.fields, raw(json!({"type": "craft"}))).unwrap();
        assert_eq!(
            complete_fields(schema.fields, missing).unwrap_err(),
            SchemaError::Missing("title".to_string())
        );
    }

    #[test]
    fn test_tag_outside_closed_set_is_rejected() {
        let spec = ART_GALLERY.field("type").unwrap();
        assert!(spec.check("photo").is_ok());
        assert!(matches!(spec.check("sculpture"), Err(SchemaError::InvalidOption { .. })));
        assert!(matches!(spec.check("Photo"), Err(SchemaError::InvalidOption { .. })));
    }

    #[test]
    fn test_url_and_date_kinds() {
        let url = MEDIA_GALLERY.field("thumbnail_url").unwrap();
        assert!(url.check("").is_ok());
        assert!(url.check("http://example.com/t.png").is_ok());
        assert!(url.check("ftp://example.com").is_err());
        assert!(url.check("https://").is_err());
        assert!(url.check("https://exa mple.com").is_err());

        let date = CLASS_HIGHLIGHTS.field("event_date").unwrap();
        assert!(date.check("2024-11-14").is_ok());
        assert!(date.check("14/11/2024").is_err());
        assert!(date.check("").is_err());
    }

    #[test]
    fn test_schema_serializes_options_only_for_tags() {
        let value = serde_json::to_value(&CREATIVE_WRITING).unwrap();
        let fields = value["fields"].as_array().unwrap();
        assert_eq!(fields[0]["options"], json!(["poetry", "story", "skit"]));
        assert!(fields[1].get("options").is_none());
        assert_eq!(fields[2]["kind"], "long_text");
    }

    proptest! {
        #[test]
        fn tag_check_accepts_exactly_declared_options(
            section_idx in 0usize..10,
            candidate in "[a-z]{1,12}",
        ) {
            let schema = Section::ALL[section_idx].schema();
            for spec in schema.fields.iter().filter(|f| f.kind == FieldKind::Tag) {
                let declared = spec.options.contains(&candidate.as_str());
                prop_assert_eq!(spec.check(&candidate).is_ok(), declared);
            }
        }
    }
}
