use super::trend::{Trend, TrendCollection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The trend open in the detail view, if any. At most one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<Uuid>,
}

impl Selection {
    /// Open `id`, replacing whatever was open.
    pub fn select(&mut self, id: Uuid) {
        self.selected = Some(id);
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selected == Some(id)
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn resolve<'a>(&self, collection: &'a TrendCollection) -> Option<&'a Trend> {
        self.selected.and_then(|id| collection.get(id))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Radar,
    Grid,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Radar => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Radar,
        }
    }
}
