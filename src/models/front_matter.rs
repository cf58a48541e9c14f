//! Cover page and editorial
//!
//! Both are single-record sections: the magazine has at most one of each,
//! saved in place by the admin editor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::ContentFields;

fn take(fields: &mut ContentFields, name: &str) -> String {
    fields.remove(name).unwrap_or_default()
}

/// The magazine cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverPage {
    pub title: String,
    pub subtitle: String,
    pub class_name: String,
    pub theme_quote: String,
    pub qr_code_url: String,
    pub school_logo_url: String,
    pub updated_at: DateTime<Utc>,
}

impl CoverPage {
    pub fn from_fields(mut fields: ContentFields, updated_at: DateTime<Utc>) -> Self {
        Self {
            title: take(&mut fields, "title"),
            subtitle: take(&mut fields, "subtitle"),
            class_name: take(&mut fields, "class_name"),
            theme_quote: take(&mut fields, "theme_quote"),
            qr_code_url: take(&mut fields, "qr_code_url"),
            school_logo_url: take(&mut fields, "school_logo_url"),
            updated_at,
        }
    }
}

/// Cover page as submitted by the editor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverPageInput {
    pub title: String,
    pub subtitle: String,
    pub class_name: String,
    pub theme_quote: String,
    pub qr_code_url: String,
    pub school_logo_url: String,
}

impl CoverPageInput {
    pub fn into_fields(self) -> ContentFields {
        ContentFields::from([
            ("title".to_string(), self.title),
            ("subtitle".to_string(), self.subtitle),
            ("class_name".to_string(), self.class_name),
            ("theme_quote".to_string(), self.theme_quote),
            ("qr_code_url".to_string(), self.qr_code_url),
            ("school_logo_url".to_string(), self.school_logo_url),
        ])
    }
}

/// Messages printed ahead of the sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Editorial {
    pub principal_message: String,
    pub teacher_message: String,
    pub editorial_note: String,
    pub theme_introduction: String,
    pub updated_at: DateTime<Utc>,
}

impl Editorial {
    pub fn from_fields(mut fields: ContentFields, updated_at: DateTime<Utc>) -> Self {
        Self {
            principal_message: take(&mut fields, "principal_message"),
            teacher_message: take(&mut fields, "teacher_message"),
            editorial_note: take(&mut fields, "editorial_note"),
            theme_introduction: take(&mut fields, "theme_introduction"),
            updated_at,
        }
    }

    /// Whether any of the messages has text
    pub fn has_content(&self) -> bool {
        [
            &self.principal_message,
            &self.teacher_message,
            &self.editorial_note,
            &self.theme_introduction,
        ]
        .iter()
        .any(|m| !m.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorialInput {
    pub principal_message: String,
    pub teacher_message: String,
    pub editorial_note: String,
    pub theme_introduction: String,
}

impl EditorialInput {
    pub fn into_fields(self) -> ContentFields {
        ContentFields::from([
            ("principal_message".to_string(), self.principal_message),
            ("teacher_message".to_string(), self.teacher_message),
            ("editorial_note".to_string(), self.editorial_note),
            ("theme_introduction".to_string(), self.theme_introduction),
        ])
    }
}
