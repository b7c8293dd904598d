//! Unit tests for epi-population.

#[cfg(test)]
mod column_map {
    use crate::{ColumnMap, PopulationError};

    #[test]
    fn insert_and_get() {
        let mut map = ColumnMap::new();
        map.insert("health", vec![1.0f32, 0.5]).unwrap();
        assert_eq!(map.get::<f32>("health").unwrap(), &[1.0, 0.5]);
        assert!(map.contains_typed::<f32>("health"));
        assert!(!map.contains_typed::<f64>("health"));
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut map = ColumnMap::new();
        map.insert("x", vec![0u8]).unwrap();
        assert_eq!(
            map.insert("x", vec![1u8]),
            Err(PopulationError::DuplicateColumn("x".into()))
        );
        assert_eq!(map.get::<u8>("x").unwrap(), &[0]);
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut map = ColumnMap::new();
        map.insert("flag", vec![true]).unwrap();
        match map.get::<u32>("flag") {
            Err(PopulationError::TypeMismatch { name, stored, requested }) => {
                assert_eq!(name, "flag");
                assert_eq!(stored, "bool");
                assert_eq!(requested, "u32");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn pair_access_is_disjoint() {
        let mut map = ColumnMap::new();
        map.insert("a", vec![1u32, 2]).unwrap();
        map.insert("b", vec![false, false]).unwrap();
        let (a, b) = map.get_pair_mut::<u32, bool>("a", "b").unwrap();
        a[0] = 10;
        b[1] = true;
        assert_eq!(map.get::<u32>("a").unwrap(), &[10, 2]);
        assert_eq!(map.get::<bool>("b").unwrap(), &[false, true]);
    }

    #[test]
    fn pair_access_rejects_same_name() {
        let mut map = ColumnMap::new();
        map.insert("a", vec![1u32]).unwrap();
        assert!(matches!(
            map.get_pair_mut::<u32, u32>("a", "a"),
            Err(PopulationError::AliasedBorrow(_))
        ));
        assert!(matches!(
            map.get_pair_mut::<u32, u32>("a", "zzz"),
            Err(PopulationError::MissingColumn(n)) if n == "zzz"
        ));
    }
}

#[cfg(test)]
mod population {
    use epi_core::{AgentId, Tick};

    use crate::{Population, PopulationError};

    #[test]
    fn add_property_checks_length() {
        let mut pop = Population::new(3);
        let err = pop.add_property("age", vec![1u8, 2]).unwrap_err();
        assert_eq!(
            err,
            PopulationError::LengthMismatch { name: "age".into(), expected: 3, got: 2 }
        );
        assert!(!pop.has_property("age"));
    }

    #[test]
    fn missing_column_fails_loudly() {
        let pop = Population::new(2);
        assert_eq!(
            pop.get::<bool>("isolated"),
            Err(PopulationError::MissingColumn("isolated".into()))
        );
    }

    #[test]
    fn writes_are_visible_to_every_reader() {
        let mut pop = Population::new(4);
        pop.add_property("score", vec![0i32; 4]).unwrap();
        pop.get_mut::<i32>("score").unwrap()[AgentId(2).index()] = 7;
        assert_eq!(pop.get::<i32>("score").unwrap()[2], 7);
    }

    #[test]
    fn ensure_property_is_idempotent() {
        let mut pop = Population::new(2);
        pop.ensure_property("request", false).unwrap();
        pop.get_mut::<bool>("request").unwrap()[0] = true;
        pop.ensure_property("request", false).unwrap();
        assert_eq!(pop.get::<bool>("request").unwrap(), &[true, false]);
        assert!(pop.ensure_property("request", 0u8).is_err());
    }

    #[test]
    fn agent_ids_and_time() {
        let mut pop = Population::new(3);
        assert_eq!(pop.agent_ids().collect::<Vec<_>>(), vec![AgentId(0), AgentId(1), AgentId(2)]);
        pop.set_time(Tick(9));
        assert_eq!(pop.time(), Tick(9));
    }

    #[test]
    fn properties_sorted() {
        let mut pop = Population::new(1);
        pop.add_property("b", vec![0u8]).unwrap();
        pop.add_property("a", vec![0u8]).unwrap();
        assert_eq!(pop.properties(), vec!["a", "b"]);
    }
}
