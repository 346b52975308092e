use crate::domain::search::Search;
use crate::domain::trend::Trend;
use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

/// Where searches and their trends are kept between sessions.
///
/// Deleting a search removes its trends with it.
#[automock]
#[async_trait]
pub trait SearchStore: Send + Sync {
    async fn create_search(&self, search: &Search) -> Result<()>;

    async fn update_search(&self, search: &Search) -> Result<()>;

    async fn get_search(&self, id: Uuid) -> Result<Option<Search>>;

    /// Newest first, at most `limit` entries.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Search>>;

    /// Replace the trends stored under `search_id`.
    async fn save_trends(&self, search_id: Uuid, trends: &[Trend]) -> Result<()>;

    async fn get_trends(&self, search_id: Uuid) -> Result<Vec<Trend>>;

    /// Returns false when there was nothing to delete.
    async fn delete_search(&self, id: Uuid) -> Result<bool>;
}
