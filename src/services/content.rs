//! Content service
//!
//! The schema-driven editor behind every collection section: listing,
//! create, patch-style update, confirmation-gated delete, and the form
//! `submit` that routes to create or update. Reader lists are cached per
//! section and every mutation drops that section's cache entries.

use crate::cache::{section_items_key, section_pattern, CacheLayer, SharedCache};
use crate::db::repositories::ContentRepository;
use crate::models::schema::{complete_fields, parse_fields};
use crate::models::{ContentDraft, ContentItem, SchemaError, Section};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Error types for content operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A delete was requested without accepting the confirmation
    #[error("Deletion must be confirmed")]
    ConfirmationRequired,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SchemaError> for ContentServiceError {
    fn from(err: SchemaError) -> Self {
        ContentServiceError::Validation(err.to_string())
    }
}

/// Answer to "are you sure you want to delete this?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(accepted: bool) -> Self {
        if accepted {
            Confirmation::Accepted
        } else {
            Confirmation::Declined
        }
    }
}

pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    cache: SharedCache,
    /// Bumped on every mutation of a section, indexed by `Section as usize`
    generations: [AtomicU64; Section::ALL.len()],
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepository>, cache: SharedCache) -> Self {
        Self {
            repo,
            cache,
            generations: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    fn generation(&self, section: Section) -> u64 {
        self.generations[section as usize].load(Ordering::SeqCst)
    }

    /// All items of a section in display order, newest first
    pub async fn list(&self, section: Section) -> Result<Vec<ContentItem>, ContentServiceError> {
        let key = section_items_key(section.key());

        match self.cache.get::<Vec<ContentItem>>(&key).await {
            Ok(Some(items)) => {
                tracing::debug!("Cache hit for {}", key);
                return Ok(items);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let generation = self.generation(section);
        let items = self.repo.list(section.schema()).await?;
        self.cache_list(section, generation, &items).await;

        Ok(items)
    }

    /// Cache a list read at `generation` unless the section changed since.
    ///
    /// The generation is checked again after the write: a mutation that
    /// slipped in between may already have run its invalidation.
    async fn cache_list(&self, section: Section, generation: u64, items: &[ContentItem]) {
        if self.generation(section) != generation {
            tracing::debug!("Skipping cache write for {}: list is stale", section);
            return;
        }

        let key = section_items_key(section.key());
        if let Err(e) = self.cache.set(&key, &items, self.cache.default_ttl()).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }

        if self.generation(section) != generation {
            self.invalidate_cache(section).await;
        }
    }

    pub async fn get(&self, section: Section, id: i64) -> Result<ContentItem, ContentServiceError> {
        self.repo
            .get_by_id(section.schema(), id)
            .await?
            .ok_or_else(|| not_found(section, id))
    }

    pub async fn count(&self, section: Section) -> Result<i64, ContentServiceError> {
        Ok(self.repo.count(section.schema()).await?)
    }

    /// Insert a new item. Every required field must be present.
    pub async fn create(
        &self,
        section: Section,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ContentItem, ContentServiceError> {
        let schema = section.schema();
        let fields = complete_fields(schema.fields, parse_fields(schema.fields, fields)?)?;

        let item = self.repo.create(schema, &fields).await?;
        self.invalidate(section).await;

        tracing::debug!("Created {} item {}", section, item.id);
        Ok(item)
    }

    /// Overwrite the given fields of an item; fields left out keep their value.
    pub async fn update(
        &self,
        section: Section,
        id: i64,
        patch: serde_json::Map<String, serde_json::Value>,
    ) -> Result<ContentItem, ContentServiceError> {
        let schema = section.schema();
        let patch = parse_fields(schema.fields, patch)?;

        let mut fields = self.get(section, id).await?.fields;
        fields.extend(patch);
        let fields = complete_fields(schema.fields, fields)?;

        let item = self
            .repo
            .update(schema, id, &fields)
            .await?
            .ok_or_else(|| not_found(section, id))?;
        self.invalidate(section).await;

        tracing::debug!("Updated {} item {}", section, id);
        Ok(item)
    }

    /// Remove an item once the deletion is confirmed.
    ///
    /// A declined confirmation leaves the section untouched.
    pub async fn delete(
        &self,
        section: Section,
        id: i64,
        confirmation: Confirmation,
    ) -> Result<(), ContentServiceError> {
        if confirmation == Confirmation::Declined {
            return Err(ContentServiceError::ConfirmationRequired);
        }

        if !self.repo.delete(section.schema(), id).await? {
            return Err(not_found(section, id));
        }
        self.invalidate(section).await;

        tracing::debug!("Deleted {} item {}", section, id);
        Ok(())
    }

    /// Save an editor form: update when it carries an editing id, else create.
    pub async fn submit(
        &self,
        section: Section,
        draft: ContentDraft,
    ) -> Result<ContentItem, ContentServiceError> {
        match draft.editing_id {
            Some(id) => self.update(section, id, draft.fields).await,
            None => self.create(section, draft.fields).await,
        }
    }

    async fn invalidate(&self, section: Section) {
        self.generations[section as usize].fetch_add(1, Ordering::SeqCst);
        self.invalidate_cache(section).await;
    }

    async fn invalidate_cache(&self, section: Section) {
        if let Err(e) = self.cache.delete_pattern(&section_pattern(section.key())).await {
            tracing::warn!("Failed to invalidate cache for {}: {}", section, e);
        }
    }
}

fn not_found(section: Section, id: i64) -> ContentServiceError {
    ContentServiceError::NotFound(format!("{} item {}", section.schema().title, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxContentRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::FieldKind;
    use serde_json::{json, Map, Value};

    async fn setup_service() -> ContentService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContentService::new(
            SqlxContentRepository::boxed(pool),
            Arc::new(MemoryCache::new()),
        )
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn story(title: &str) -> Map<String, Value> {
        object(json!({
            "type": "story",
            "title": title,
            "content": "Once upon a time",
            "author_name": "Arjun"
        }))
    }

    #[tokio::test]
    async fn test_create_then_list_contains_item_once() {
        let service = setup_service().await;

        let item = service
            .create(Section::CreativeWriting, story("The Lost Kite"))
            .await
            .expect("Failed to create");

        let items = service.list(Section::CreativeWriting).await.unwrap();
        assert_eq!(items.iter().filter(|i| i.id == item.id).count(), 1);
        assert_eq!(items[0].field("title"), "The Lost Kite");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_drafts() {
        let service = setup_service().await;

        let mut bad_tag = story("x");
        bad_tag.insert("type".to_string(), json!("novel"));
        assert!(matches!(
            service.create(Section::CreativeWriting, bad_tag).await,
            Err(ContentServiceError::Validation(_))
        ));

        let mut with_id = story("x");
        with_id.insert("id".to_string(), json!(4));
        assert!(matches!(
            service.create(Section::CreativeWriting, with_id).await,
            Err(ContentServiceError::Validation(_))
        ));

        let missing = object(json!({"type": "story"}));
        assert!(matches!(
            service.create(Section::CreativeWriting, missing).await,
            Err(ContentServiceError::Validation(_))
        ));

        assert!(service.list(Section::CreativeWriting).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_cache_is_invalidated_on_mutation() {
        let service = setup_service().await;

        // Prime the cache with an empty list
        assert!(service.list(Section::CreativeWriting).await.unwrap().is_empty());

        let item = service.create(Section::CreativeWriting, story("A")).await.unwrap();
        assert_eq!(service.list(Section::CreativeWriting).await.unwrap().len(), 1);

        service
            .update(Section::CreativeWriting, item.id, object(json!({"title": "B"})))
            .await
            .unwrap();
        assert_eq!(service.list(Section::CreativeWriting).await.unwrap()[0].field("title"), "B");

        service
            .delete(Section::CreativeWriting, item.id, Confirmation::Accepted)
            .await
            .unwrap();
        assert!(service.list(Section::CreativeWriting).await.unwrap().is_empty());
    }

    /// A complete, valid draft for any section, built from its field specs
    fn sample_draft(section: Section, label: &str) -> Map<String, Value> {
        section
            .schema()
            .fields
            .iter()
            .map(|spec| {
                let value = match spec.kind {
                    FieldKind::Tag => spec.options[0].to_string(),
                    FieldKind::Url => format!("https://magazine.example/{}", label),
                    FieldKind::Date => "2024-11-14".to_string(),
                    FieldKind::Text | FieldKind::LongText => format!("{} {}", spec.name, label),
                };
                (spec.name.to_string(), Value::String(value))
            })
            .collect()
    }

    fn first_text_field(section: Section) -> &'static str {
        section
            .schema()
            .fields
            .iter()
            .find(|spec| matches!(spec.kind, FieldKind::Text | FieldKind::LongText))
            .map(|spec| spec.name)
            .expect("every section has a text field")
    }

    #[tokio::test]
    async fn test_crud_on_every_section() {
        let service = setup_service().await;

        for section in Section::ALL {
            let first = service.create(section, sample_draft(section, "one")).await.unwrap();
            let second = service.create(section, sample_draft(section, "two")).await.unwrap();

            let items = service.list(section).await.unwrap();
            assert_eq!(items.len(), 2, "{}", section);
            assert_eq!(items.iter().filter(|i| i.id == first.id).count(), 1, "{}", section);

            // Patch one field of the first item; the second stays identical
            let field = first_text_field(section);
            let mut patch = Map::new();
            patch.insert(field.to_string(), json!("patched"));
            let patched = service.update(section, first.id, patch).await.unwrap();
            assert_eq!(patched.field(field), "patched", "{}", section);

            let items = service.list(section).await.unwrap();
            let sibling = items.iter().find(|i| i.id == second.id).unwrap();
            assert_eq!(sibling, &second, "{}", section);

            // Declined delete changes nothing
            let declined = service.delete(section, first.id, Confirmation::Declined).await;
            assert!(matches!(declined, Err(ContentServiceError::ConfirmationRequired)));
            assert_eq!(service.list(section).await.unwrap(), items, "{}", section);

            service.delete(section, first.id, Confirmation::Accepted).await.unwrap();
            assert_eq!(service.count(section).await.unwrap(), 1, "{}", section);
            let remaining = service.list(section).await.unwrap();
            assert_eq!(remaining.iter().map(|i| i.id).collect::<Vec<_>>(), vec![second.id]);
        }
    }

    #[tokio::test]
    async fn test_list_read_before_mutation_is_not_cached() {
        let service = setup_service().await;
        let section = Section::CreativeWriting;

        // A list that hit the store just before a concurrent create
        let generation = service.generation(section);
        let stale = service.repo.list(section.schema()).await.unwrap();

        service.create(section, story("Fresh")).await.unwrap();
        service.cache_list(section, generation, &stale).await;

        let items = service.list(section).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].field("title"), "Fresh");
    }

    #[tokio::test]
    async fn test_update_patches_only_given_fields() {
        let service = setup_service().await;
        let a = service.create(Section::CreativeWriting, story("A")).await.unwrap();
        let b = service.create(Section::CreativeWriting, story("B")).await.unwrap();

        let updated = service
            .update(Section::CreativeWriting, a.id, object(json!({"title": "A2"})))
            .await
            .unwrap();
        assert_eq!(updated.field("title"), "A2");
        assert_eq!(updated.field("content"), "Once upon a time");
        assert_eq!(updated.field("author_name"), "Arjun");

        let untouched = service.get(Section::CreativeWriting, b.id).await.unwrap();
        assert_eq!(untouched, b);
    }

    #[tokio::test]
    async fn test_update_cannot_blank_required_field() {
        let service = setup_service().await;
        let a = service.create(Section::CreativeWriting, story("A")).await.unwrap();

        let result = service
            .update(Section::CreativeWriting, a.id, object(json!({"title": "  "})))
            .await;
        assert!(matches!(result, Err(ContentServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let service = setup_service().await;
        let result = service
            .update(Section::CreativeWriting, 404, object(json!({"title": "x"})))
            .await;
        assert!(matches!(result, Err(ContentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_declined_delete_keeps_item() {
        let service = setup_service().await;
        let item = service.create(Section::CreativeWriting, story("Keep")).await.unwrap();

        let result = service
            .delete(Section::CreativeWriting, item.id, Confirmation::from(false))
            .await;
        assert!(matches!(result, Err(ContentServiceError::ConfirmationRequired)));
        assert_eq!(service.count(Section::CreativeWriting).await.unwrap(), 1);

        service
            .delete(Section::CreativeWriting, item.id, Confirmation::from(true))
            .await
            .unwrap();
        assert_eq!(service.count(Section::CreativeWriting).await.unwrap(), 0);

        let again = service
            .delete(Section::CreativeWriting, item.id, Confirmation::Accepted)
            .await;
        assert!(matches!(again, Err(ContentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_routes_on_editing_id() {
        let service = setup_service().await;

        let created = service
            .submit(
                Section::CreativeWriting,
                ContentDraft { editing_id: None, fields: story("Draft") },
            )
            .await
            .unwrap();

        let updated = service
            .submit(
                Section::CreativeWriting,
                ContentDraft {
                    editing_id: Some(created.id),
                    fields: object(json!({"title": "Final"})),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.field("title"), "Final");
        assert_eq!(service.count(Section::CreativeWriting).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_media_gallery_url_validation() {
        let service = setup_service().await;
        let draft = object(json!({
            "type": "video",
            "title": "Annual day",
            "url": "youtube.com/watch?v=1"
        }));
        assert!(matches!(
            service.create(Section::MediaGallery, draft).await,
            Err(ContentServiceError::Validation(_))
        ));

        let draft = object(json!({
            "type": "video",
            "title": "Annual day",
            "url": "https://youtube.com/watch?v=1",
            "thumbnail_url": null
        }));
        let item = service.create(Section::MediaGallery, draft).await.unwrap();
        assert_eq!(item.field("thumbnail_url"), "");
    }
}
