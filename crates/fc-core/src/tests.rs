//! Unit tests for fc-core primitives.

#[cfg(test)]
mod ids {
    use crate::{EdgeId, NodeId};

    #[test]
    fn ordering() {
        assert!(NodeId(0) < NodeId(1));
        assert!(EdgeId(100) > EdgeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert!(!NodeId::default().is_valid());
        assert!(NodeId(3).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
    }

    #[test]
    fn edge_id_indexes_csr_arrays() {
        assert_eq!(EdgeId(12).index(), 12);
    }
}

#[cfg(test)]
mod geo {
    use crate::Position;

    #[test]
    fn pythagorean_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn area_bounds_are_inclusive() {
        assert!(Position::new(0.0, 1000.0).within_area(1000.0));
        assert!(!Position::new(-0.1, 10.0).within_area(1000.0));
        assert!(!Position::new(10.0, 1000.5).within_area(1000.0));
    }
}

#[cfg(test)]
mod kind {
    use crate::{NodeKind, StationStatus};

    #[test]
    fn only_vehicles_are_unroutable() {
        assert!(NodeKind::Station.is_routable());
        assert!(NodeKind::Parking.is_routable());
        assert!(!NodeKind::Vehicle.is_routable());
    }

    #[test]
    fn station_defaults_to_ready() {
        assert_eq!(StationStatus::default(), StationStatus::Ready);
        assert_eq!(StationStatus::Charging.to_string(), "charging");
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::new(99);
        let mut b = SimRng::new(99);
        let xs: Vec<u32> = (0..16).map(|_| a.gen_range(0..1_000)).collect();
        let ys: Vec<u32> = (0..16).map(|_| b.gen_range(0..1_000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn children_diverge_by_offset() {
        let mut root_a = SimRng::new(5);
        let mut root_b = SimRng::new(5);
        let mut c1 = root_a.child(1);
        let mut c2 = root_b.child(2);
        let x: u64 = c1.random();
        let y: u64 = c2.random();
        assert_ne!(x, y);
    }

    #[test]
    fn index_of_empty_is_none() {
        let mut rng = SimRng::new(1);
        assert_eq!(rng.index(0), None);
        assert!(rng.index(4).is_some_and(|i| i < 4));
        assert!(rng.choose::<u8>(&[]).is_none());
    }
}

#[cfg(test)]
mod config {
    use crate::{FleetConfig, ShortfallMode};

    #[test]
    fn empty_document_yields_defaults() {
        let config = FleetConfig::from_toml_str("").unwrap();
        assert_eq!(config, FleetConfig::default());
        assert_eq!(config.dispatch.low_site_threshold, 80.0);
        assert_eq!(config.churn.relocate_weight, 45);
        assert_eq!(config.topology.parking_capacities, vec![5, 10, 15, 20]);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let config = FleetConfig::from_toml_str(
            r#"
            seed = 7

            [dispatch]
            target_charge  = 90.0
            shortfall_mode = "inventory_limited"

            [topology]
            area_size = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.dispatch.target_charge, 90.0);
        assert_eq!(config.dispatch.shortfall_mode, ShortfallMode::InventoryLimited);
        assert_eq!(config.dispatch.recharge_duration, 30);
        assert_eq!(config.topology.area_size, 250);
        assert_eq!(config.topology.station_count, 10);
    }

    #[test]
    fn zero_weights_rejected() {
        let result = FleetConfig::from_toml_str(
            "[churn]\nrelocate_weight = 0\nremove_weight = 0\nadd_weight = 0\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn stationless_topology_rejected() {
        assert!(FleetConfig::from_toml_str("[topology]\nstation_count = 0\n").is_err());
    }

    #[test]
    fn target_out_of_range_rejected() {
        assert!(FleetConfig::from_toml_str("[dispatch]\ntarget_charge = 120.0\n").is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = FleetConfig::from_toml_str("seed = [").unwrap_err();
        assert!(matches!(err, crate::CoreError::Toml(_)));
    }
}
