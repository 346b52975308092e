use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved generation request, as listed in the history panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Search {
    pub id: Uuid,
    pub domain: String,
    pub title: Option<String>,
    pub status: SearchStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SearchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Search {
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            id: Uuid::new_v4(),
            title: Some(domain.clone()),
            domain,
            status: SearchStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Title shown in history; falls back to the domain.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.domain)
    }

    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn start(&mut self) {
        self.status = SearchStatus::Processing;
    }

    pub fn complete(&mut self) {
        self.status = SearchStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = SearchStatus::Failed;
        self.completed_at = None;
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, SearchStatus::Completed | SearchStatus::Failed)
    }
}
