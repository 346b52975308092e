use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Top-level category. Each quadrant owns a 90 degree sector of the radar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Quadrant {
    #[default]
    Technology,
    Society,
    Economy,
    Environment,
}

/// Timeline band, nearest-term innermost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Ring {
    #[default]
    #[serde(rename = "0-2 Years")]
    NearTerm,
    #[serde(rename = "2-5 Years")]
    MidTerm,
    #[serde(rename = "5-10 Years")]
    LongTerm,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Impact {
    Low,
    #[default]
    Medium,
    High,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Technology,
        Quadrant::Society,
        Quadrant::Economy,
        Quadrant::Environment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quadrant::Technology => "Technology",
            Quadrant::Society => "Society",
            Quadrant::Economy => "Economy",
            Quadrant::Environment => "Environment",
        }
    }

    /// Exact match on the canonical name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == value)
    }

    /// Position in enumeration order, used for the angular sector.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Ring {
    pub const ALL: [Ring; 3] = [Ring::NearTerm, Ring::MidTerm, Ring::LongTerm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ring::NearTerm => "0-2 Years",
            Ring::MidTerm => "2-5 Years",
            Ring::LongTerm => "5-10 Years",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl Impact {
    pub const ALL: [Impact; 3] = [Impact::Low, Impact::Medium, Impact::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "Low",
            Impact::Medium => "Medium",
            Impact::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.as_str() == value)
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified trend. Classification is fixed at construction; only
/// presentation state derived from it (position, selection, visibility) varies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    id: Uuid,
    label: String,
    summary: String,
    quadrant: Quadrant,
    ring: Ring,
    impact: Impact,
    created_at: DateTime<Utc>,
}

impl Trend {
    pub fn new(
        label: impl Into<String>,
        summary: impl Into<String>,
        quadrant: Quadrant,
        ring: Ring,
        impact: Impact,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            summary: summary.into(),
            quadrant,
            ring,
            impact,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    pub fn ring(&self) -> Ring {
        self.ring
    }

    pub fn impact(&self) -> Impact {
        self.impact
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl AsRef<Trend> for Trend {
    fn as_ref(&self) -> &Trend {
        self
    }
}

/// One atomic batch of trends from a single generation or history load.
///
/// The batch has its own identity: clones share it, anything rebuilt gets a
/// fresh one. Layout caches key on this identity.
#[derive(Debug, Clone)]
pub struct TrendCollection {
    id: Uuid,
    domain: String,
    search_id: Option<Uuid>,
    trends: Arc<[Trend]>,
}

impl TrendCollection {
    pub fn new(domain: impl Into<String>, trends: Vec<Trend>) -> Self {
        Self {
            id: Uuid::new_v4(),
            domain: domain.into(),
            search_id: None,
            trends: trends.into(),
        }
    }

    /// Tag the batch with the history record it was saved under. This
    /// produces a new batch identity.
    pub fn with_search_id(self, search_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            search_id: Some(search_id),
            ..self
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn search_id(&self) -> Option<Uuid> {
        self.search_id
    }

    pub fn trends(&self) -> &[Trend] {
        &self.trends
    }

    pub fn len(&self) -> usize {
        self.trends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trend> {
        self.trends.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Trend> {
        self.trends.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn same_batch(&self, other: &TrendCollection) -> bool {
        self.id == other.id
    }
}

impl<'a> IntoIterator for &'a TrendCollection {
    type Item = &'a Trend;
    type IntoIter = std::slice::Iter<'a, Trend>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
