use super::trend::{Impact, Quadrant, Ring, Trend};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Which trends are displayed.
///
/// An axis only restricts when its allow-set is a strict, non-empty subset of
/// that axis' values. An empty set behaves exactly like a full one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterState {
    pub quadrants: HashSet<Quadrant>,
    pub rings: HashSet<Ring>,
    pub impacts: HashSet<Impact>,
    pub search_query: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            quadrants: Quadrant::ALL.into_iter().collect(),
            rings: Ring::ALL.into_iter().collect(),
            impacts: Impact::ALL.into_iter().collect(),
            search_query: String::new(),
        }
    }
}

impl FilterState {
    pub fn only_quadrants(quadrants: impl IntoIterator<Item = Quadrant>) -> Self {
        Self {
            quadrants: quadrants.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn toggle_quadrant(&mut self, quadrant: Quadrant) {
        toggle(&mut self.quadrants, quadrant);
    }

    pub fn toggle_ring(&mut self, ring: Ring) {
        toggle(&mut self.rings, ring);
    }

    pub fn toggle_impact(&mut self, impact: Impact) {
        toggle(&mut self.impacts, impact);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when at least one axis or the query would hide something.
    pub fn is_restrictive(&self) -> bool {
        restricts(&self.quadrants, Quadrant::ALL.len())
            || restricts(&self.rings, Ring::ALL.len())
            || restricts(&self.impacts, Impact::ALL.len())
            || !self.search_query.trim().is_empty()
    }

    pub fn matches(&self, trend: &Trend) -> bool {
        if restricts(&self.quadrants, Quadrant::ALL.len()) && !self.quadrants.contains(&trend.quadrant()) {
            return false;
        }
        if restricts(&self.rings, Ring::ALL.len()) && !self.rings.contains(&trend.ring()) {
            return false;
        }
        if restricts(&self.impacts, Impact::ALL.len()) && !self.impacts.contains(&trend.impact()) {
            return false;
        }
        if !self.search_query.trim().is_empty() {
            let query = self.search_query.to_lowercase();
            return trend.label().to_lowercase().contains(&query)
                || trend.summary().to_lowercase().contains(&query);
        }
        true
    }
}

/// Narrow `items` to those visible under `state`, keeping their order.
///
/// Works over anything that borrows as a [`Trend`], so the output of one call
/// can be fed straight back into another.
pub fn apply_filters<'a, T: AsRef<Trend>>(items: &'a [T], state: &FilterState) -> Vec<&'a T> {
    items.iter().filter(|item| state.matches(item.as_ref())).collect()
}

fn restricts<V>(allowed: &HashSet<V>, total: usize) -> bool {
    !allowed.is_empty() && allowed.len() < total
}

fn toggle<V: Eq + Hash>(set: &mut HashSet<V>, value: V) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Trend> {
        vec![
            Trend::new("AI Tutoring Systems", "Schools deploy AI for learning", Quadrant::Technology, Ring::NearTerm, Impact::High),
            Trend::new("Remote Work Culture", "Hybrid work becomes standard", Quadrant::Society, Ring::MidTerm, Impact::Medium),
            Trend::new("Carbon Markets", "Pricing emissions at scale", Quadrant::Economy, Ring::LongTerm, Impact::Low),
            Trend::new("Rewilding", "Land returned to nature", Quadrant::Environment, Ring::LongTerm, Impact::High),
        ]
    }

    fn labels<T: AsRef<Trend>>(items: &[&T]) -> Vec<String> {
        items
            .iter()
            .map(|t| {
                let trend: &Trend = (**t).as_ref();
                trend.label().to_string()
            })
            .collect()
    }

    #[test]
    fn test_default_state_is_noop() {
        let trends = sample();
        let state = FilterState::default();
        assert!(!state.is_restrictive());

        let result = apply_filters(&trends, &state);
        assert_eq!(result.len(), trends.len());
        for (kept, original) in result.iter().zip(trends.iter()) {
            assert_eq!(kept.id(), original.id());
        }
    }

    #[test]
    fn test_empty_axis_means_all() {
        let trends = sample();
        let state = FilterState {
            quadrants: HashSet::new(),
            rings: HashSet::new(),
            impacts: HashSet::new(),
            search_query: String::new(),
        };
        assert!(!state.is_restrictive());
        assert_eq!(apply_filters(&trends, &state).len(), 4);
    }

    #[test]
    fn test_partial_axis_restricts() {
        let trends = sample();
        let mut state = FilterState::default();
        state.toggle_ring(Ring::NearTerm);
        state.toggle_ring(Ring::MidTerm);

        let result = apply_filters(&trends, &state);
        assert_eq!(labels(&result), vec!["Carbon Markets", "Rewilding"]);
    }

    #[test]
    fn test_axes_and_query_intersect() {
        let trends = sample();
        let mut state = FilterState::default();
        state.impacts = [Impact::High].into_iter().collect();
        assert_eq!(apply_filters(&trends, &state).len(), 2);

        state.set_search_query("NATURE");
        let result = apply_filters(&trends, &state);
        assert_eq!(labels(&result), vec!["Rewilding"]);
    }

    #[test]
    fn test_query_matches_label_or_summary() {
        let trends = sample();
        let mut state = FilterState::default();

        state.set_search_query("hybrid");
        assert_eq!(labels(&apply_filters(&trends, &state)), vec!["Remote Work Culture"]);

        state.set_search_query("carbon");
        assert_eq!(labels(&apply_filters(&trends, &state)), vec!["Carbon Markets"]);

        state.set_search_query("   ");
        assert_eq!(apply_filters(&trends, &state).len(), 4);
    }

    #[test]
    fn test_filters_are_idempotent() {
        let trends = sample();
        let mut state = FilterState::only_quadrants([Quadrant::Technology, Quadrant::Environment]);
        state.set_search_query("a");

        let once = apply_filters(&trends, &state);
        let twice = apply_filters(&once, &state);
        assert_eq!(labels(&once), labels(&twice));
    }

    #[test]
    fn test_toggle_and_reset() {
        let mut state = FilterState::default();
        state.toggle_quadrant(Quadrant::Society);
        assert!(!state.quadrants.contains(&Quadrant::Society));
        assert!(state.is_restrictive());

        state.toggle_quadrant(Quadrant::Society);
        assert!(state.quadrants.contains(&Quadrant::Society));
        assert!(!state.is_restrictive());

        state.toggle_impact(Impact::Low);
        state.set_search_query("x");
        state.reset();
        assert_eq!(state, FilterState::default());
    }
}
