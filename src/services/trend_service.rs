use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::domain::search::Search;
use crate::domain::trend::TrendCollection;
use crate::repository::SearchStore;
use crate::services::error_handling::{ErrorContext, RadarError};
use crate::services::generator::{GeneratorSettings, TrendGenerator};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs searches against a generator and keeps the history in a store.
#[derive(Clone)]
pub struct TrendService {
    generator: Arc<dyn TrendGenerator>,
    store: Arc<dyn SearchStore>,
    history_limit: usize,
}

impl TrendService {
    pub fn new(generator: Arc<dyn TrendGenerator>, store: Arc<dyn SearchStore>) -> Self {
        Self {
            generator,
            store,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// How many searches [`TrendService::history`] lists.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Generate trends for `domain` and record the search.
    ///
    /// A failed generation leaves the search in history marked failed and
    /// returns the generation error unchanged.
    pub async fn run_search(
        &self,
        domain: &str,
        settings: &GeneratorSettings,
    ) -> Result<(Search, TrendCollection), RadarError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(RadarError::validation("domain", "cannot be empty"));
        }

        let mut search = Search::new(domain);
        ErrorContext::new("create_search")
            .with_detail("domain", domain)
            .wrap(self.store.create_search(&search).await)?;

        search.start();
        self.update(&search).await?;

        let collection = match self.generator.generate(domain, settings).await {
            Ok(collection) => collection,
            Err(e) => {
                search.fail();
                if let Err(store_err) = self.update(&search).await {
                    warn!(search_id = %search.id, error = %store_err, "Could not mark search as failed");
                }
                return Err(e.into());
            }
        };

        ErrorContext::new("save_trends")
            .with_detail("search_id", search.id)
            .with_detail("count", collection.len())
            .wrap(self.store.save_trends(search.id, collection.trends()).await)?;

        search.complete();
        self.update(&search).await?;

        info!(search_id = %search.id, domain = %domain, count = collection.len(), "Search completed");
        let collection = collection.with_search_id(search.id);
        Ok((search, collection))
    }

    /// Reopen a past search with the trends it produced.
    pub async fn load_search(&self, id: Uuid) -> Result<(Search, TrendCollection), RadarError> {
        let search = self.get_search(id).await?;
        let trends = ErrorContext::new("get_trends")
            .with_detail("search_id", id)
            .wrap(self.store.get_trends(id).await)?;

        let collection = TrendCollection::new(search.domain.clone(), trends).with_search_id(id);
        Ok((search, collection))
    }

    pub async fn recent_searches(&self, limit: usize) -> Result<Vec<Search>, RadarError> {
        ErrorContext::new("list_recent")
            .with_detail("limit", limit)
            .wrap(self.store.list_recent(limit).await)
    }

    /// The history panel: newest first, capped at the configured limit.
    pub async fn history(&self) -> Result<Vec<Search>, RadarError> {
        self.recent_searches(self.history_limit).await
    }

    pub async fn rename_search(&self, id: Uuid, title: &str) -> Result<Search, RadarError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RadarError::validation("title", "cannot be empty"));
        }

        let mut search = self.get_search(id).await?;
        search.rename(title);
        self.update(&search).await?;
        Ok(search)
    }

    pub async fn delete_search(&self, id: Uuid) -> Result<(), RadarError> {
        let deleted = ErrorContext::new("delete_search")
            .with_detail("search_id", id)
            .wrap(self.store.delete_search(id).await)?;
        if !deleted {
            return Err(RadarError::SearchNotFound { id });
        }
        info!(search_id = %id, "Search deleted");
        Ok(())
    }

    async fn get_search(&self, id: Uuid) -> Result<Search, RadarError> {
        ErrorContext::new("get_search")
            .with_detail("search_id", id)
            .wrap(self.store.get_search(id).await)?
            .ok_or(RadarError::SearchNotFound { id })
    }

    async fn update(&self, search: &Search) -> Result<(), RadarError> {
        ErrorContext::new("update_search")
            .with_detail("search_id", search.id)
            .wrap(self.store.update_search(search).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::SearchStatus;
    use crate::domain::trend::{Impact, Quadrant, Ring, Trend};
    use crate::repository::{MemorySearchStore, MockSearchStore};
    use crate::services::error_handling::GenerationError;
    use crate::services::generator::MockTrendGenerator;

    fn sample_batch(domain: &str) -> TrendCollection {
        TrendCollection::new(
            domain,
            vec![
                Trend::new("Heat Pumps", "Replacing gas boilers", Quadrant::Environment, Ring::NearTerm, Impact::High),
                Trend::new("Grid Tariffs", "Time of use pricing", Quadrant::Economy, Ring::MidTerm, Impact::Medium),
            ],
        )
    }

    fn service_with(generator: MockTrendGenerator) -> (TrendService, Arc<MemorySearchStore>) {
        let store = Arc::new(MemorySearchStore::new());
        let service = TrendService::new(Arc::new(generator), store.clone());
        (service, store)
    }

    #[tokio::test]
    async fn test_run_search_saves_history() {
        let mut generator = MockTrendGenerator::new();
        generator
            .expect_generate()
            .withf(|domain, settings| domain == "home energy" && settings.credential == "pplx-key")
            .times(1)
            .returning(|domain, _| Ok(sample_batch(domain)));
        let (service, store) = service_with(generator);

        let (search, collection) = service
            .run_search("  home energy ", &GeneratorSettings::new("pplx-key"))
            .await
            .unwrap();

        assert_eq!(search.status, SearchStatus::Completed);
        assert!(search.completed_at.is_some());
        assert_eq!(collection.search_id(), Some(search.id));
        assert_eq!(collection.len(), 2);
        assert_eq!(store.trend_count(), 2);

        let recent = service.recent_searches(50).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].display_title(), "home energy");
    }

    #[tokio::test]
    async fn test_failed_generation_marks_search_failed() {
        let mut generator = MockTrendGenerator::new();
        generator
            .expect_generate()
            .returning(|_, _| Err(GenerationError::RateLimited));
        let (service, store) = service_with(generator);

        let err = service
            .run_search("shipping", &GeneratorSettings::new("pplx-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, RadarError::Generation(GenerationError::RateLimited)));

        let recent = service.recent_searches(10).await.unwrap();
        assert_eq!(recent[0].status, SearchStatus::Failed);
        assert_eq!(store.trend_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_domain_is_rejected_before_generation() {
        let mut generator = MockTrendGenerator::new();
        generator.expect_generate().times(0);
        let (service, store) = service_with(generator);

        let err = service.run_search("   ", &GeneratorSettings::new("k")).await.unwrap_err();
        assert!(matches!(err, RadarError::Validation { .. }));
        assert_eq!(store.search_count(), 0);
    }

    #[tokio::test]
    async fn test_load_search_keeps_trend_ids() {
        let mut generator = MockTrendGenerator::new();
        generator
            .expect_generate()
            .returning(|domain, _| Ok(sample_batch(domain)));
        let (service, _store) = service_with(generator);

        let (search, generated) = service.run_search("heating", &GeneratorSettings::new("k")).await.unwrap();
        let (loaded_search, loaded) = service.load_search(search.id).await.unwrap();

        assert_eq!(loaded_search.id, search.id);
        assert_eq!(loaded.domain(), "heating");
        let generated_ids: Vec<_> = generated.iter().map(|t| t.id()).collect();
        let loaded_ids: Vec<_> = loaded.iter().map(|t| t.id()).collect();
        assert_eq!(generated_ids, loaded_ids);
        assert!(!loaded.same_batch(&generated));
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let mut generator = MockTrendGenerator::new();
        generator
            .expect_generate()
            .returning(|domain, _| Ok(sample_batch(domain)));
        let (service, store) = service_with(generator);
        let (search, _) = service.run_search("cities", &GeneratorSettings::new("k")).await.unwrap();

        let renamed = service.rename_search(search.id, "  Smart Cities  ").await.unwrap();
        assert_eq!(renamed.display_title(), "Smart Cities");
        assert!(matches!(
            service.rename_search(search.id, " ").await,
            Err(RadarError::Validation { .. })
        ));

        service.delete_search(search.id).await.unwrap();
        assert_eq!(store.trend_count(), 0);
        assert!(matches!(
            service.load_search(search.id).await,
            Err(RadarError::SearchNotFound { .. })
        ));
        assert!(matches!(
            service.delete_search(search.id).await,
            Err(RadarError::SearchNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_history_uses_configured_limit() {
        let mut generator = MockTrendGenerator::new();
        generator
            .expect_generate()
            .returning(|domain, _| Ok(sample_batch(domain)));
        let store = Arc::new(MemorySearchStore::new());
        let service = TrendService::new(Arc::new(generator), store).with_history_limit(2);

        for domain in ["ports", "rail", "aviation"] {
            service.run_search(domain, &GeneratorSettings::new("k")).await.unwrap();
        }

        let history = service.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].domain, "aviation");
        assert_eq!(service.recent_searches(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped() {
        let mut generator = MockTrendGenerator::new();
        generator.expect_generate().times(0);
        let mut store = MockSearchStore::new();
        store
            .expect_create_search()
            .returning(|_| Err(anyhow::anyhow!("disk full")));
        let service = TrendService::new(Arc::new(generator), Arc::new(store));

        let err = service.run_search("retail", &GeneratorSettings::new("k")).await.unwrap_err();
        match err {
            RadarError::Store { operation, .. } => assert_eq!(operation, "create_search"),
            other => panic!("Expected store error, got {:?}", other),
        }
    }
}
