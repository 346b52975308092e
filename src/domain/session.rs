use super::filter::{FilterState, apply_filters};
use super::layout::{PositionedTrend, RadarGeometry, RadarLayout};
use super::selection::{Selection, ViewMode};
use super::trend::{Trend, TrendCollection};
use tracing::debug;
use uuid::Uuid;

/// Everything the radar screen shows, owned by the UI thread.
///
/// Positions are computed when a collection arrives (or the canvas changes)
/// and are left alone when filters, selection or view mode change.
#[derive(Default)]
pub struct RadarSession {
    collection: Option<TrendCollection>,
    layout: Option<RadarLayout>,
    geometry: RadarGeometry,
    filters: FilterState,
    selection: Selection,
    view_mode: ViewMode,
}

impl RadarSession {
    pub fn new(geometry: RadarGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    /// Swap in a whole new batch. The old batch, its layout and the open
    /// detail view go away together.
    pub fn replace_collection(&mut self, collection: TrendCollection) {
        let reuse = self
            .layout
            .as_ref()
            .is_some_and(|layout| layout.is_for(&collection, &self.geometry));
        if !reuse {
            debug!(
                collection_id = %collection.id(),
                count = collection.len(),
                "Computing radar layout"
            );
            self.layout = Some(RadarLayout::compute(&collection, self.geometry));
        }
        self.selection.close();
        self.collection = Some(collection);
    }

    pub fn clear(&mut self) {
        self.collection = None;
        self.layout = None;
        self.selection.close();
    }

    pub fn set_geometry(&mut self, geometry: RadarGeometry) {
        if geometry == self.geometry {
            return;
        }
        self.geometry = geometry;
        self.layout = self
            .collection
            .as_ref()
            .map(|collection| RadarLayout::compute(collection, geometry));
    }

    pub fn geometry(&self) -> &RadarGeometry {
        &self.geometry
    }

    pub fn collection(&self) -> Option<&TrendCollection> {
        self.collection.as_ref()
    }

    pub fn layout(&self) -> Option<&RadarLayout> {
        self.layout.as_ref()
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Trends for the grid view, in generation order.
    pub fn visible_trends(&self) -> Vec<&Trend> {
        match &self.collection {
            Some(collection) => apply_filters(collection.trends(), &self.filters),
            None => Vec::new(),
        }
    }

    /// Points for the radar view.
    pub fn visible_points(&self) -> Vec<&PositionedTrend> {
        match &self.layout {
            Some(layout) => layout.visible(&self.filters),
            None => Vec::new(),
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible_trends().len()
    }

    /// Pointer press on the radar canvas. Opens the trend under the pointer,
    /// if any, and returns its id. A miss leaves the selection as it was.
    pub fn click(&mut self, x: f64, y: f64) -> Option<Uuid> {
        let id = self.layout.as_ref()?.hit_test(x, y, &self.filters)?.id();
        self.selection.select(id);
        Some(id)
    }

    /// Open a trend from the grid. Ids outside the current batch are ignored.
    pub fn select(&mut self, id: Uuid) -> bool {
        let known = self.collection.as_ref().is_some_and(|c| c.contains(id));
        if known {
            self.selection.select(id);
        }
        known
    }

    pub fn close_detail(&mut self) {
        self.selection.close();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_trend(&self) -> Option<&Trend> {
        self.selection.resolve(self.collection.as_ref()?)
    }
}
