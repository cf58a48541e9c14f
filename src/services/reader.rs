//! Magazine reader
//!
//! Assembles reader pages: the editorial page, or a section's items grouped
//! by the section's primary tag in the order the tags are declared.

use crate::models::{
    CollectionSchema, ContentItem, Editorial, MagazinePage, PageCursor, PagePosition, Section,
};
use crate::services::content::{ContentService, ContentServiceError};
use crate::services::front_matter::FrontMatterService;
use serde::Serialize;
use std::sync::Arc;

/// Items of a section sharing one tag value
#[derive(Debug, Clone, Serialize)]
pub struct ItemGroup {
    pub tag: String,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageContent {
    Editorial {
        editorial: Option<Editorial>,
    },
    Section {
        section: Section,
        group_by: &'static str,
        groups: Vec<ItemGroup>,
    },
}

/// One rendered reader page
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub key: &'static str,
    pub title: &'static str,
    pub position: PagePosition,
    pub content: PageContent,
}

/// Group items by the schema's grouping tag.
///
/// Groups follow tag declaration order and empty groups are left out. With
/// `only` set, just that tag's group is kept.
pub fn group_items(
    schema: &CollectionSchema,
    items: Vec<ContentItem>,
    only: Option<&str>,
) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = schema
        .groups()
        .iter()
        .filter(|tag| only.map_or(true, |o| o == **tag))
        .map(|tag| ItemGroup {
            tag: tag.to_string(),
            items: Vec::new(),
        })
        .collect();

    for item in items {
        let tag = item.field(schema.group_by);
        if let Some(group) = groups.iter_mut().find(|g| g.tag == tag) {
            group.items.push(item);
        }
    }

    groups.retain(|g| !g.items.is_empty());
    groups
}

pub struct ReaderService {
    content: Arc<ContentService>,
    front_matter: Arc<FrontMatterService>,
}

impl ReaderService {
    pub fn new(content: Arc<ContentService>, front_matter: Arc<FrontMatterService>) -> Self {
        Self { content, front_matter }
    }

    /// Build the page at `index`, optionally filtered to one tag
    pub async fn page(
        &self,
        index: usize,
        tag: Option<&str>,
    ) -> Result<PageView, ContentServiceError> {
        let cursor = PageCursor::at(index)
            .ok_or_else(|| ContentServiceError::NotFound(format!("Page {}", index)))?;
        let page = cursor.page();

        let content = match page {
            // A saved but blank editorial reads the same as none
            MagazinePage::Editorial => PageContent::Editorial {
                editorial: self
                    .front_matter
                    .get_editorial()
                    .await?
                    .filter(Editorial::has_content),
            },
            MagazinePage::Section(section) => {
                let schema = section.schema();
                if let Some(tag) = tag {
                    if !schema.groups().contains(&tag) {
                        return Err(ContentServiceError::Validation(format!(
                            "Unknown {} '{}' (allowed: {})",
                            schema.group_by,
                            tag,
                            schema.groups().join(", ")
                        )));
                    }
                }

                let items = self.content.list(section).await?;
                PageContent::Section {
                    section,
                    group_by: schema.group_by,
                    groups: group_items(schema, items, tag),
                }
            }
        };

        Ok(PageView {
            key: page.key(),
            title: page.title(),
            position: PagePosition::from(cursor),
            content,
        })
    }
}
