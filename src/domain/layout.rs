use super::filter::FilterState;
use super::trend::{Quadrant, Ring, Trend, TrendCollection};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree};
use thiserror::Error;
use uuid::Uuid;

/// Share of a ring band kept clear at the inner edge.
const BAND_INNER_MARGIN: f64 = 0.3;
/// Share of a ring band the jitter may cover.
const BAND_JITTER_SPAN: f64 = 0.6;
const SECTOR_DEGREES: f64 = 90.0;
/// Pointer tolerance around a point, in canvas units.
pub const HIT_RADIUS: f64 = 16.0;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("Radar size and padding must be finite (size: {size}, padding: {padding})")]
    NotFinite { size: f64, padding: f64 },

    #[error("Padding {padding} leaves no drawable radius on a canvas of {size}")]
    NoDrawableRadius { size: f64, padding: f64 },
}

/// Square canvas the radar is drawn on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarGeometry {
    size: f64,
    padding: f64,
}

impl Default for RadarGeometry {
    fn default() -> Self {
        Self {
            size: 800.0,
            padding: 100.0,
        }
    }
}

/// Half-open angular range in degrees, 0 along +x, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularSector {
    pub start_deg: f64,
    pub end_deg: f64,
}

/// Radius range of one ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialBand {
    pub inner: f64,
    pub outer: f64,
}

impl AngularSector {
    pub fn contains_degrees(&self, degrees: f64) -> bool {
        degrees >= self.start_deg && degrees < self.end_deg
    }
}

impl RadialBand {
    pub fn spread(&self) -> f64 {
        self.outer - self.inner
    }

    /// Where jittered radii may land: the middle 60% of the band.
    pub fn jitter_bounds(&self) -> (f64, f64) {
        let spread = self.spread();
        (
            self.inner + BAND_INNER_MARGIN * spread,
            self.inner + (BAND_INNER_MARGIN + BAND_JITTER_SPAN) * spread,
        )
    }
}

impl RadarGeometry {
    pub fn new(size: f64, padding: f64) -> Result<Self, GeometryError> {
        if !size.is_finite() || !padding.is_finite() {
            return Err(GeometryError::NotFinite { size, padding });
        }
        if size / 2.0 - padding <= 0.0 || padding < 0.0 {
            return Err(GeometryError::NoDrawableRadius { size, padding });
        }
        Ok(Self { size, padding })
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    pub fn center(&self) -> (f64, f64) {
        (self.size / 2.0, self.size / 2.0)
    }

    pub fn max_radius(&self) -> f64 {
        self.size / 2.0 - self.padding
    }

    pub fn sector(&self, quadrant: Quadrant) -> AngularSector {
        let start_deg = quadrant.index() as f64 * SECTOR_DEGREES;
        AngularSector {
            start_deg,
            end_deg: start_deg + SECTOR_DEGREES,
        }
    }

    pub fn band(&self, ring: Ring) -> RadialBand {
        let step = self.max_radius() / Ring::ALL.len() as f64;
        let index = ring.index() as f64;
        RadialBand {
            inner: step * index,
            outer: step * (index + 1.0),
        }
    }

    /// Outer radius of every ring, innermost first, for drawing guide circles.
    pub fn ring_guides(&self) -> Vec<(Ring, f64)> {
        Ring::ALL.iter().map(|&ring| (ring, self.band(ring).outer)).collect()
    }
}

/// A trend with the point it was placed at.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedTrend {
    pub trend: Trend,
    pub x: f64,
    pub y: f64,
    /// Radians, in the trend's quadrant sector.
    pub angle: f64,
    pub radius: f64,
}

impl AsRef<Trend> for PositionedTrend {
    fn as_ref(&self) -> &Trend {
        &self.trend
    }
}

impl PositionedTrend {
    pub fn id(&self) -> Uuid {
        self.trend.id()
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

/// Place a single trend inside its quadrant sector and ring band.
pub fn place<R: Rng + ?Sized>(trend: &Trend, geometry: &RadarGeometry, rng: &mut R) -> PositionedTrend {
    let sector = geometry.sector(trend.quadrant());
    // Sampled directly in the half-open range so the end edge is never hit.
    let angle = rng.gen_range(sector.start_deg.to_radians()..sector.end_deg.to_radians());

    let band = geometry.band(trend.ring());
    let spread = band.spread();
    let radius = band.inner + spread * BAND_INNER_MARGIN + rng.gen_range(0.0..1.0) * spread * BAND_JITTER_SPAN;
    debug_assert!(radius <= geometry.max_radius());

    let (cx, cy) = geometry.center();
    PositionedTrend {
        trend: trend.clone(),
        x: cx + radius * angle.cos(),
        y: cy + radius * angle.sin(),
        angle,
        radius,
    }
}

/// Place every trend, drawing jitter from `rng`. Output order matches input.
pub fn layout<R: Rng + ?Sized>(trends: &[Trend], geometry: &RadarGeometry, rng: &mut R) -> Vec<PositionedTrend> {
    trends.iter().map(|trend| place(trend, geometry, rng)).collect()
}

/// Like [`layout`], but each trend draws from a generator seeded by its id,
/// so the same trend lands on the same point on every redraw.
pub fn layout_seeded(trends: &[Trend], geometry: &RadarGeometry) -> Vec<PositionedTrend> {
    trends
        .iter()
        .map(|trend| {
            let mut rng = StdRng::seed_from_u64(seed_for(trend.id()));
            place(trend, geometry, &mut rng)
        })
        .collect()
}

fn seed_for(id: Uuid) -> u64 {
    let bits = id.as_u128();
    (bits >> 64) as u64 ^ bits as u64
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Positions computed once per collection, plus a spatial index for
/// pointer lookups. Filter and selection changes read from it without
/// moving anything.
pub struct RadarLayout {
    collection_id: Uuid,
    geometry: RadarGeometry,
    points: Vec<PositionedTrend>,
    index: RTree<IndexedPoint>,
}

impl RadarLayout {
    pub fn compute(collection: &TrendCollection, geometry: RadarGeometry) -> Self {
        let points = layout_seeded(collection.trends(), &geometry);
        let index = RTree::bulk_load(
            points
                .iter()
                .enumerate()
                .map(|(i, p)| GeomWithData::new([p.x, p.y], i))
                .collect(),
        );

        Self {
            collection_id: collection.id(),
            geometry,
            points,
            index,
        }
    }

    /// Whether this layout is still valid for `collection` on `geometry`.
    pub fn is_for(&self, collection: &TrendCollection, geometry: &RadarGeometry) -> bool {
        self.collection_id == collection.id() && self.geometry == *geometry
    }

    pub fn collection_id(&self) -> Uuid {
        self.collection_id
    }

    pub fn geometry(&self) -> &RadarGeometry {
        &self.geometry
    }

    pub fn points(&self) -> &[PositionedTrend] {
        &self.points
    }

    pub fn position_of(&self, id: Uuid) -> Option<&PositionedTrend> {
        self.points.iter().find(|p| p.id() == id)
    }

    pub fn visible(&self, filters: &FilterState) -> Vec<&PositionedTrend> {
        super::filter::apply_filters(&self.points, filters)
    }

    /// Nearest visible point within [`HIT_RADIUS`] of `(x, y)`.
    pub fn hit_test(&self, x: f64, y: f64, filters: &FilterState) -> Option<&PositionedTrend> {
        let query = [x, y];
        self.index
            .locate_within_distance(query, HIT_RADIUS * HIT_RADIUS)
            .filter(|entry| filters.matches(&self.points[entry.data].trend))
            .map(|entry| (entry.data, entry.distance_2(&query)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| &self.points[i])
    }
}
