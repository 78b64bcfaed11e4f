//! Unit tests for dx-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ResourceId, StationId};

    #[test]
    fn display_is_raw_code() {
        assert_eq!(ResourceId::from("T11").to_string(), "T11");
        assert_eq!(StationId::new("S1").as_str(), "S1");
    }

    #[test]
    fn ordering_follows_code() {
        assert!(ResourceId::from("M11") < ResourceId::from("S11"));
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(59.9139, 10.7522);
        assert!(p.distance_m(p) < 1e-9);
    }

    #[test]
    fn one_degree_latitude() {
        // ~1 degree of latitude ≈ 111.195 km on the mean sphere
        let a = GeoPoint::new(59.0, 10.0);
        let b = GeoPoint::new(60.0, 10.0);
        let d = a.distance_m(b);
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn symmetric() {
        let a = GeoPoint::new(59.9326, 10.9650);
        let b = GeoPoint::new(59.4370, 10.6570);
        assert!((a.distance_m(b) - b.distance_m(a)).abs() < 1e-6);
    }

    #[test]
    fn lerp_endpoints() {
        let a = GeoPoint::new(59.0, 10.0);
        let b = GeoPoint::new(60.0, 11.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), GeoPoint::new(59.5, 10.5));
    }
}

#[cfg(test)]
mod polyline {
    use crate::{GeoPoint, Polyline, cumulative_distances, position_at_distance};

    fn scenario_points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(59.70, 10.80),
            GeoPoint::new(59.71, 10.82),
            GeoPoint::new(59.72, 10.84),
        ]
    }

    #[test]
    fn cumulative_table_shape() {
        let pts = scenario_points();
        let cum = cumulative_distances(&pts);
        assert_eq!(cum.len(), pts.len());
        assert_eq!(cum[0], 0.0);
        assert!((cum[1] - pts[0].distance_m(pts[1])).abs() < 1e-9);
        assert!((cum[2] - cum[1] - pts[1].distance_m(pts[2])).abs() < 1e-9);
    }

    #[test]
    fn cumulative_of_empty_is_empty() {
        assert!(cumulative_distances(&[]).is_empty());
    }

    #[test]
    fn clamps_at_both_ends() {
        let pts = scenario_points();
        let cum = cumulative_distances(&pts);
        let total = cum[2];
        assert_eq!(position_at_distance(&pts, &cum, -10.0), Some(pts[0]));
        assert_eq!(position_at_distance(&pts, &cum, 0.0), Some(pts[0]));
        assert_eq!(position_at_distance(&pts, &cum, total), Some(pts[2]));
        assert_eq!(position_at_distance(&pts, &cum, total * 3.0), Some(pts[2]));
    }

    #[test]
    fn empty_polyline_has_no_position() {
        assert_eq!(position_at_distance(&[], &[], 5.0), None);
    }

    #[test]
    fn monotonic_progression() {
        // Both segments head north-east, so latitude must never decrease.
        let pts = scenario_points();
        let cum = cumulative_distances(&pts);
        let total = cum[2];
        let mut last_lat = f64::MIN;
        for step in 0..=200 {
            let d = total * step as f64 / 200.0;
            let p = position_at_distance(&pts, &cum, d).unwrap();
            assert!(p.lat >= last_lat, "lat went backwards at step {step}");
            last_lat = p.lat;
        }
    }

    #[test]
    fn half_length_uses_bracketing_segment() {
        let line = Polyline::new(scenario_points()).unwrap();
        let cum = line.cumulative();
        let half = line.total_m() / 2.0;

        // Find the bracketing segment exactly as the kernel does.
        let i = (1..cum.len()).find(|&i| cum[i] >= half).unwrap();
        let t = (half - cum[i - 1]) / (cum[i] - cum[i - 1]);
        let expected = line.points()[i - 1].lerp(line.points()[i], t);

        let got = line.position_at(half);
        assert!((got.lat - expected.lat).abs() < 1e-12);
        assert!((got.lng - expected.lng).abs() < 1e-12);
        // The two legs are almost equal, so the midpoint sits on the joint.
        assert!(got.distance_m(line.points()[1]) < 1.0);
    }

    #[test]
    fn three_quarters_lies_on_second_segment() {
        let line = Polyline::new(scenario_points()).unwrap();
        let cum = line.cumulative().to_vec();
        let d = line.total_m() * 0.75;
        let t = (d - cum[1]) / (cum[2] - cum[1]);
        assert!(t > 0.0 && t < 1.0);

        let expected = line.points()[1].lerp(line.points()[2], t);
        let got = line.position_at(d);
        assert!((got.lat - expected.lat).abs() < 1e-12);
        assert!((got.lng - expected.lng).abs() < 1e-12);
    }

    #[test]
    fn zero_length_segment_is_skipped() {
        let a = GeoPoint::new(59.0, 10.0);
        let b = GeoPoint::new(59.01, 10.0);
        let line = Polyline::new(vec![a, a, b]).unwrap();
        let p = line.position_at(line.total_m() / 2.0);
        assert!((p.lat - 59.005).abs() < 1e-9);
    }

    #[test]
    fn polyline_needs_two_finite_points() {
        assert!(Polyline::new(vec![]).is_none());
        assert!(Polyline::new(vec![GeoPoint::new(59.0, 10.0)]).is_none());
        assert!(Polyline::new(vec![GeoPoint::new(f64::NAN, 10.0), GeoPoint::new(59.0, 10.0)]).is_none());
    }

    #[test]
    fn straight_line_total() {
        let a = GeoPoint::new(59.0, 10.0);
        let b = GeoPoint::new(60.0, 10.0);
        let line = Polyline::straight(a, b);
        assert_eq!(line.points(), &[a, b]);
        assert!((line.total_m() - a.distance_m(b)).abs() < 1e-9);
    }
}

#[cfg(test)]
mod time {
    use crate::{Clock, Epoch, ManualClock};

    #[test]
    fn secs_since_clamps_negative() {
        assert_eq!(Epoch(1_000).secs_since(Epoch(3_000)), 0.0);
        assert_eq!(Epoch(3_500).secs_since(Epoch(1_000)), 2.5);
    }

    #[test]
    fn next_after_is_strictly_later() {
        assert_eq!(Epoch::next_after(Epoch(500), None), Epoch(500));
        assert_eq!(Epoch::next_after(Epoch(500), Some(Epoch(100))), Epoch(500));
        assert_eq!(Epoch::next_after(Epoch(500), Some(Epoch(500))), Epoch(501));
        assert_eq!(Epoch::next_after(Epoch(500), Some(Epoch(900))), Epoch(901));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Epoch(10));
        let other = clock.clone();
        clock.advance_ms(5);
        assert_eq!(other.now(), Epoch(15));
        other.set(Epoch(100));
        assert_eq!(clock.now(), Epoch(100));
    }

    #[test]
    fn display() {
        assert_eq!(Epoch(42).to_string(), "E42");
    }
}

#[cfg(test)]
mod config {
    use crate::{DEFAULT_ANCHOR, SyncConfig};

    #[test]
    fn defaults_are_valid() {
        let cfg = SyncConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_speed_mps, 20.0);
        assert_eq!(cfg.default_anchor, DEFAULT_ANCHOR);
    }

    #[test]
    fn rejects_non_positive_speed() {
        let cfg = SyncConfig { default_speed_mps: 0.0, ..SyncConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = SyncConfig { default_speed_mps: f64::NAN, ..SyncConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_frame_interval() {
        let cfg = SyncConfig { frame_interval_ms: 0, ..SyncConfig::default() };
        assert!(cfg.validate().is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::OperatorRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = OperatorRng::new(12345, 0);
        let mut r2 = OperatorRng::new(12345, 0);
        for _ in 0..100 {
            assert_eq!(r1.gen_range(0u32..1000), r2.gen_range(0u32..1000));
        }
    }

    #[test]
    fn different_operators_differ() {
        let mut r0 = OperatorRng::new(1, 0);
        let mut r1 = OperatorRng::new(1, 1);
        let a: Vec<u32> = (0..8).map(|_| r0.gen_range(0..u32::MAX)).collect();
        let b: Vec<u32> = (0..8).map(|_| r1.gen_range(0..u32::MAX)).collect();
        assert_ne!(a, b, "streams for adjacent operators should diverge");
    }

    #[test]
    fn choose_from_empty_is_none() {
        let mut rng = OperatorRng::new(0, 0);
        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[7]), Some(&7));
    }
}

#[cfg(test)]
mod kind {
    use crate::ResourceKind;

    #[test]
    fn parses_english_and_norwegian() {
        assert_eq!("engine".parse::<ResourceKind>().unwrap(), ResourceKind::Engine);
        assert_eq!("Mannskapsbil".parse::<ResourceKind>().unwrap(), ResourceKind::Engine);
        assert_eq!("Høyde".parse::<ResourceKind>().unwrap(), ResourceKind::Aerial);
        assert_eq!("tankbil".parse::<ResourceKind>().unwrap(), ResourceKind::Tanker);
        assert!("boat".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(ResourceKind::Tanker.to_string(), "tanker");
    }
}
