use super::search_store::SearchStore;
use crate::domain::search::Search;
use crate::domain::trend::Trend;
use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
struct State {
    // Insertion order, oldest first
    searches: Vec<Search>,
    trends: HashMap<Uuid, Vec<Trend>>,
}

/// Process-local [`SearchStore`]. History lasts as long as the value does.
#[derive(Default)]
pub struct MemorySearchStore {
    state: RwLock<State>,
}

impl MemorySearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_count(&self) -> usize {
        self.state.read().searches.len()
    }

    pub fn trend_count(&self) -> usize {
        self.state.read().trends.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl SearchStore for MemorySearchStore {
    async fn create_search(&self, search: &Search) -> Result<()> {
        let mut state = self.state.write();
        if state.searches.iter().any(|s| s.id == search.id) {
            bail!("Search already exists: {}", search.id);
        }
        state.searches.push(search.clone());
        Ok(())
    }

    async fn update_search(&self, search: &Search) -> Result<()> {
        let mut state = self.state.write();
        match state.searches.iter_mut().find(|s| s.id == search.id) {
            Some(existing) => {
                *existing = search.clone();
                Ok(())
            }
            None => bail!("Search not found: {}", search.id),
        }
    }

    async fn get_search(&self, id: Uuid) -> Result<Option<Search>> {
        Ok(self.state.read().searches.iter().find(|s| s.id == id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Search>> {
        let state = self.state.read();
        let mut searches: Vec<Search> = state.searches.iter().rev().cloned().collect();
        searches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        searches.truncate(limit);
        Ok(searches)
    }

    async fn save_trends(&self, search_id: Uuid, trends: &[Trend]) -> Result<()> {
        let mut state = self.state.write();
        if !state.searches.iter().any(|s| s.id == search_id) {
            bail!("Search not found: {}", search_id);
        }
        state.trends.insert(search_id, trends.to_vec());
        Ok(())
    }

    async fn get_trends(&self, search_id: Uuid) -> Result<Vec<Trend>> {
        Ok(self.state.read().trends.get(&search_id).cloned().unwrap_or_default())
    }

    async fn delete_search(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write();
        let before = state.searches.len();
        state.searches.retain(|s| s.id != id);
        state.trends.remove(&id);
        Ok(state.searches.len() < before)
    }
}
