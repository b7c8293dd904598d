//! Unit tests for epi-model.

#[cfg(test)]
mod capabilities {
    use epi_population::Population;

    use crate::Capabilities;

    #[test]
    fn resolves_presence_once() {
        let mut pop = Population::new(2);
        pop.add_property("isolation", vec![0u8; 2]).unwrap();
        let caps = Capabilities::resolve("test", &pop, &["isolation", "home"]);
        assert!(caps.has("isolation"));
        assert!(!caps.has("home"));
        assert!(!caps.has("undeclared"));
        assert_eq!(caps.missing().collect::<Vec<_>>(), vec!["home"]);

        // Later registrations do not change an already-resolved set.
        pop.add_property("home", vec![0u8; 2]).unwrap();
        assert!(!caps.has("home"));
    }
}

#[cfg(test)]
mod context {
    use epi_core::{SimClock, SimRng, Tick, TickCache};
    use epi_population::Population;

    use crate::{Metrics, Model, ModelError, ModelResult, StepContext};

    struct Doubler;

    impl Model for Doubler {
        fn name(&self) -> &'static str {
            "doubler"
        }

        fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Metrics> {
            let values = ctx.population.get_mut::<u32>("value")?;
            values.iter_mut().for_each(|v| *v *= 2);
            Ok(vec![("tick", ctx.tick.0 as f64)])
        }
    }

    #[test]
    fn model_writes_through_context() {
        let clock = SimClock::default();
        let mut pop = Population::new(2);
        pop.add_property("value", vec![1u32, 3]).unwrap();
        let mut cache = TickCache::new();
        let mut rng = SimRng::new(0);
        let mut ctx = StepContext::new(Tick(4), &clock, &mut pop, &mut cache, None, &mut rng);

        let metrics = Doubler.step(&mut ctx).unwrap();
        assert_eq!(metrics, vec![("tick", 4.0)]);
        assert_eq!(pop.get::<u32>("value").unwrap(), &[2, 6]);
    }

    #[test]
    fn missing_column_propagates() {
        let clock = SimClock::default();
        let mut pop = Population::new(1);
        let mut cache = TickCache::new();
        let mut rng = SimRng::new(0);
        let mut ctx = StepContext::new(Tick(0), &clock, &mut pop, &mut cache, None, &mut rng);
        assert!(matches!(Doubler.step(&mut ctx), Err(ModelError::Population(_))));
    }

    #[test]
    fn require_world_reports_model() {
        let clock = SimClock::default();
        let mut pop = Population::new(1);
        let mut cache = TickCache::new();
        let mut rng = SimRng::new(0);
        let mut ctx = StepContext::new(Tick(0), &clock, &mut pop, &mut cache, None, &mut rng);
        match ctx.require_world("isolation") {
            Err(ModelError::MissingCollaborator { model, collaborator }) => {
                assert_eq!((model, collaborator), ("isolation", "world"));
            }
            _ => panic!("expected MissingCollaborator"),
        }
    }
}

#[cfg(test)]
mod channels {
    use epi_core::{AgentId, RequesterId};
    use epi_population::Population;

    use crate::channels::{self, ISOLATION_REQUEST, ISOLATION_REQUESTED_BY, LEAVE_REQUEST};

    #[test]
    fn register_is_shared_between_writers() {
        let mut pop = Population::new(3);
        channels::register(&mut pop).unwrap();
        channels::request_isolation(&mut pop, &[AgentId(1)], RequesterId(2)).unwrap();
        // A second writer must not reset existing requests.
        channels::register(&mut pop).unwrap();
        assert_eq!(pop.get::<bool>(ISOLATION_REQUEST).unwrap(), &[false, true, false]);
    }

    #[test]
    fn first_requester_wins() {
        let mut pop = Population::new(2);
        channels::register(&mut pop).unwrap();
        let fresh = channels::request_isolation(&mut pop, &[AgentId(0)], RequesterId(1)).unwrap();
        assert_eq!(fresh, 1);
        let fresh = channels::request_isolation(&mut pop, &[AgentId(0), AgentId(1)], RequesterId(4)).unwrap();
        assert_eq!(fresh, 1);
        assert_eq!(
            pop.get::<RequesterId>(ISOLATION_REQUESTED_BY).unwrap(),
            &[RequesterId(1), RequesterId(4)]
        );
    }

    #[test]
    fn leave_without_channels_is_missing_column() {
        let mut pop = Population::new(1);
        assert!(channels::request_leave(&mut pop, &[AgentId(0)]).is_err());
        channels::register(&mut pop).unwrap();
        channels::request_leave(&mut pop, &[AgentId(0)]).unwrap();
        assert_eq!(pop.get::<bool>(LEAVE_REQUEST).unwrap(), &[true]);
    }
}
