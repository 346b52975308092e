#[cfg(test)]
mod tests {
    use super::super::filter::FilterState;
    use super::super::layout::*;
    use super::super::trend::{Impact, Quadrant, Ring, Trend, TrendCollection};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f64 = 1e-9;

    fn even_batch() -> Vec<Trend> {
        // 48 trends: 12 per quadrant, 16 per ring
        let mut trends = Vec::new();
        for (q, quadrant) in Quadrant::ALL.iter().enumerate() {
            for i in 0..12 {
                let ring = Ring::ALL[(q * 12 + i) % 3];
                let impact = Impact::ALL[i % 3];
                trends.push(Trend::new(
                    format!("{} trend {}", quadrant, i),
                    format!("Summary {}", i),
                    *quadrant,
                    ring,
                    impact,
                ));
            }
        }
        trends
    }

    fn assert_in_cell(point: &PositionedTrend, geometry: &RadarGeometry) {
        let sector = geometry.sector(point.trend.quadrant());
        let degrees = point.angle_degrees();
        assert!(
            degrees >= sector.start_deg - EPS && degrees < sector.end_deg + EPS,
            "{} at {} degrees outside {:?}",
            point.trend.label(),
            degrees,
            sector
        );

        let (low, high) = geometry.band(point.trend.ring()).jitter_bounds();
        assert!(
            point.radius >= low - EPS && point.radius <= high + EPS,
            "{} radius {} outside [{}, {}]",
            point.trend.label(),
            point.radius,
            low,
            high
        );

        let (cx, cy) = geometry.center();
        let dist = ((point.x - cx).powi(2) + (point.y - cy).powi(2)).sqrt();
        assert!((dist - point.radius).abs() < 1e-6);
    }

    #[test]
    fn test_default_geometry() {
        let geometry = RadarGeometry::default();
        assert_eq!(geometry.center(), (400.0, 400.0));
        assert_eq!(geometry.max_radius(), 300.0);

        let near = geometry.band(Ring::NearTerm);
        assert_eq!((near.inner, near.outer), (0.0, 100.0));
        let far = geometry.band(Ring::LongTerm);
        assert_eq!((far.inner, far.outer), (200.0, 300.0));

        let env = geometry.sector(Quadrant::Environment);
        assert_eq!((env.start_deg, env.end_deg), (270.0, 360.0));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(matches!(
            RadarGeometry::new(200.0, 100.0),
            Err(GeometryError::NoDrawableRadius { .. })
        ));
        assert!(matches!(
            RadarGeometry::new(f64::NAN, 10.0),
            Err(GeometryError::NotFinite { .. })
        ));
        assert!(RadarGeometry::new(400.0, 20.0).is_ok());
    }

    #[test]
    fn test_empty_layout() {
        let geometry = RadarGeometry::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(layout(&[], &geometry, &mut rng).is_empty());
        assert!(layout_seeded(&[], &geometry).is_empty());
    }

    #[test]
    fn test_layout_keeps_identity_and_cells() {
        let geometry = RadarGeometry::new(600.0, 50.0).unwrap();
        let trends = even_batch();
        let mut rng = StdRng::seed_from_u64(42);

        let points = layout(&trends, &geometry, &mut rng);
        assert_eq!(points.len(), trends.len());
        for (point, trend) in points.iter().zip(trends.iter()) {
            assert_eq!(point.id(), trend.id());
            assert_in_cell(point, &geometry);
        }
    }

    #[test]
    fn test_even_batch_distribution() {
        let geometry = RadarGeometry::default();
        let points = layout_seeded(&even_batch(), &geometry);
        let (cx, cy) = geometry.center();

        for quadrant in Quadrant::ALL {
            let sector = geometry.sector(quadrant);
            let count = points
                .iter()
                .filter(|p| {
                    let deg = (p.y - cy).atan2(p.x - cx).to_degrees().rem_euclid(360.0);
                    sector.contains_degrees(deg)
                })
                .count();
            assert_eq!(count, 12, "{} sector", quadrant);
        }

        for ring in Ring::ALL {
            let band = geometry.band(ring);
            let count = points
                .iter()
                .filter(|p| p.radius >= band.inner && p.radius < band.outer)
                .count();
            assert_eq!(count, 16, "{} band", ring);
        }
    }

    #[test]
    fn test_seeded_layout_is_stable() {
        let geometry = RadarGeometry::default();
        let trends = even_batch();
        let first = layout_seeded(&trends, &geometry);
        let second = layout_seeded(&trends, &geometry);
        assert_eq!(first, second);

        // Order of the input doesn't change where a trend lands.
        let mut reversed = trends.clone();
        reversed.reverse();
        let third = layout_seeded(&reversed, &geometry);
        for point in &third {
            let original = first.iter().find(|p| p.id() == point.id()).unwrap();
            assert_eq!((original.x, original.y), (point.x, point.y));
        }
    }

    #[test]
    fn test_jitter_bounds_at_extremes() {
        let geometry = RadarGeometry::default();
        let band = geometry.band(Ring::MidTerm);
        let (low, high) = band.jitter_bounds();
        assert!((low - 130.0).abs() < EPS);
        assert!((high - 190.0).abs() < EPS);
    }

    /// Always yields the largest possible value.
    struct SaturatedRng;

    impl rand::RngCore for SaturatedRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0xff);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_largest_draw_stays_inside_sector() {
        let geometry = RadarGeometry::default();
        let mut rng = SaturatedRng;

        for quadrant in Quadrant::ALL {
            let trend = Trend::new("Edge", "Last draw", quadrant, Ring::LongTerm, Impact::Low);
            let point = place(&trend, &geometry, &mut rng);
            let sector = geometry.sector(quadrant);

            assert!(point.angle >= sector.start_deg.to_radians(), "{}", quadrant);
            assert!(point.angle < sector.end_deg.to_radians(), "{} reached its end edge", quadrant);
            let (_, high) = geometry.band(Ring::LongTerm).jitter_bounds();
            assert!(point.radius <= high + EPS);
        }
    }

    #[test]
    fn test_radar_layout_hit_test() {
        let geometry = RadarGeometry::default();
        let collection = TrendCollection::new("health", even_batch());
        let radar = RadarLayout::compute(&collection, geometry);
        assert!(radar.is_for(&collection, &geometry));
        assert_eq!(radar.points().len(), 48);

        let target = &radar.points()[5];
        let filters = FilterState::default();
        let hit = radar.hit_test(target.x + 1.0, target.y - 1.0, &filters).unwrap();
        let hit_dist = ((hit.x - target.x - 1.0).powi(2) + (hit.y - target.y + 1.0).powi(2)).sqrt();
        assert!(hit_dist <= HIT_RADIUS);

        // Far outside the radar nothing is hit
        assert!(radar.hit_test(-500.0, -500.0, &filters).is_none());
    }

    #[test]
    fn test_hit_test_ignores_hidden_points() {
        let geometry = RadarGeometry::default();
        let only = Trend::new("Solo", "Only point", Quadrant::Society, Ring::NearTerm, Impact::Low);
        let collection = TrendCollection::new("solo", vec![only]);
        let radar = RadarLayout::compute(&collection, geometry);
        let point = radar.points()[0].clone();

        let visible = FilterState::default();
        assert_eq!(radar.hit_test(point.x, point.y, &visible).map(|p| p.id()), Some(point.id()));

        let hidden = FilterState::only_quadrants([Quadrant::Economy]);
        assert!(radar.hit_test(point.x, point.y, &hidden).is_none());
        assert!(radar.visible(&hidden).is_empty());
    }

    #[test]
    fn test_ring_guides() {
        let guides = RadarGeometry::default().ring_guides();
        assert_eq!(
            guides,
            vec![(Ring::NearTerm, 100.0), (Ring::MidTerm, 200.0), (Ring::LongTerm, 300.0)]
        );
    }
}
