//! Cover page and editorial service
//!
//! Both records are read zero-or-one and saved by upsert. Saving validates
//! the whole record against its schema and refreshes `updated_at`.

use crate::cache::{singleton_key, CacheLayer, SharedCache};
use crate::db::repositories::{SingletonRecord, SingletonRepository};
use crate::models::schema::{complete_fields, COVER_PAGE, EDITORIAL};
use crate::models::{
    ContentFields, CoverPage, CoverPageInput, Editorial, EditorialInput, SingletonSchema,
};
use crate::services::content::ContentServiceError;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub struct FrontMatterService {
    repo: Arc<dyn SingletonRepository>,
    cache: SharedCache,
}

impl FrontMatterService {
    pub fn new(repo: Arc<dyn SingletonRepository>, cache: SharedCache) -> Self {
        Self { repo, cache }
    }

    /// The cover page, if one was ever saved
    pub async fn get_cover(&self) -> Result<Option<CoverPage>, ContentServiceError> {
        self.get(&COVER_PAGE, |r| CoverPage::from_fields(r.fields, r.updated_at))
            .await
    }

    pub async fn save_cover(
        &self,
        input: CoverPageInput,
    ) -> Result<CoverPage, ContentServiceError> {
        let record = self.save(&COVER_PAGE, input.into_fields()).await?;
        Ok(CoverPage::from_fields(record.fields, record.updated_at))
    }

    pub async fn get_editorial(&self) -> Result<Option<Editorial>, ContentServiceError> {
        self.get(&EDITORIAL, |r| Editorial::from_fields(r.fields, r.updated_at))
            .await
    }

    pub async fn save_editorial(
        &self,
        input: EditorialInput,
    ) -> Result<Editorial, ContentServiceError> {
        let record = self.save(&EDITORIAL, input.into_fields()).await?;
        Ok(Editorial::from_fields(record.fields, record.updated_at))
    }

    async fn get<T>(
        &self,
        schema: &'static SingletonSchema,
        build: impl FnOnce(SingletonRecord) -> T,
    ) -> Result<Option<T>, ContentServiceError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let key = singleton_key(schema.key);

        match self.cache.get::<T>(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!("Cache hit for {}", key);
                return Ok(Some(cached));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
        }

        let value = self.repo.get(schema).await?.map(build);

        // Absent records are not cached
        if let Some(ref value) = value {
            if let Err(e) = self.cache.set(&key, value, self.cache.default_ttl()).await {
                tracing::warn!("Cache write failed for {}: {}", key, e);
            }
        }

        Ok(value)
    }

    async fn save(
        &self,
        schema: &'static SingletonSchema,
        fields: ContentFields,
    ) -> Result<SingletonRecord, ContentServiceError> {
        let fields = complete_fields(schema.fields, fields)?;
        let record = self.repo.upsert(schema, &fields).await?;

        if let Err(e) = self.cache.delete(&singleton_key(schema.key)).await {
            tracing::warn!("Failed to invalidate cache for {}: {}", schema.key, e);
        }

        tracing::debug!("Saved {}", schema.title);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::db::repositories::SqlxSingletonRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_service() -> (FrontMatterService, Arc<dyn SingletonRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxSingletonRepository::boxed(pool);
        let service = FrontMatterService::new(repo.clone(), Arc::new(MemoryCache::new()));
        (service, repo)
    }

    fn cover_input() -> CoverPageInput {
        CoverPageInput {
            title: "Horizons".to_string(),
            subtitle: "Class Magazine 2024-25".to_string(),
            class_name: "7C".to_string(),
            theme_quote: "Every child is an artist".to_string(),
            qr_code_url: String::new(),
            school_logo_url: "https://school.example/logo.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_cover_absent_then_saved() {
        let (service, _) = setup_service().await;
        assert_eq!(service.get_cover().await.unwrap(), None);

        let saved = service.save_cover(cover_input()).await.unwrap();
        assert_eq!(saved.title, "Horizons");

        assert_eq!(service.get_cover().await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_saving_cover_twice_keeps_one_row() {
        let (service, repo) = setup_service().await;

        let first = service.save_cover(cover_input()).await.unwrap();
        let second = service.save_cover(cover_input()).await.unwrap();

        assert_eq!(repo.count(&COVER_PAGE).await.unwrap(), 1);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(service.get_cover().await.unwrap().unwrap().updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_cover_validation() {
        let (service, _) = setup_service().await;

        let mut missing_title = cover_input();
        missing_title.title = String::new();
        assert!(matches!(
            service.save_cover(missing_title).await,
            Err(ContentServiceError::Validation(_))
        ));

        let mut bad_logo = cover_input();
        bad_logo.school_logo_url = "logo.png".to_string();
        assert!(matches!(
            service.save_cover(bad_logo).await,
            Err(ContentServiceError::Validation(_))
        ));

        assert_eq!(service.get_cover().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_editorial_roundtrip() {
        let (service, _) = setup_service().await;
        assert_eq!(service.get_editorial().await.unwrap(), None);

        let saved = service
            .save_editorial(EditorialInput {
                principal_message: "Congratulations to 7C".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(saved.has_content());
        assert_eq!(saved.teacher_message, "");

        let fetched = service.get_editorial().await.unwrap().unwrap();
        assert_eq!(fetched, saved);
    }
}
