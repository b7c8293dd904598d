//! Unit tests for epi-tracing.

#[cfg(test)]
mod support {
    use epi_contact::columns as contact_columns;
    use epi_core::{AgentId, SimClock, SimRng, Tick, TickCache};
    use epi_isolation::RequesterRegistry;
    use epi_model::{Metrics, Model, StepContext};
    use epi_population::Population;
    use epi_testing::{Testing, TestingConfig, columns as test_columns};

    /// A population with testing columns and a `household` code taken.
    pub fn population(n: usize) -> (Population, RequesterRegistry) {
        let mut pop = Population::new(n);
        let mut registry = RequesterRegistry::new();
        registry.register("household");
        Testing::new(TestingConfig::default(), &mut pop, &mut registry).unwrap();
        (pop, registry)
    }

    /// Mark `agent` as having received a positive result at `at`.
    pub fn positive(pop: &mut Population, agent: usize, at: u64) {
        pop.get_mut::<bool>(test_columns::TEST_RESULT).unwrap()[agent] = true;
        pop.get_mut::<bool>(test_columns::TEST_RESULTS_AVAILABLE).unwrap()[agent] = true;
        pop.get_mut::<Option<Tick>>(test_columns::TEST_RESULT_TIME).unwrap()[agent] = Some(Tick(at));
    }

    /// Agent 0 in contact with every other agent.
    pub fn star(pop: &mut Population) {
        let n = pop.len();
        let mut now = vec![Vec::new(); n];
        now[0] = (1..n as u32).map(AgentId).collect();
        now.iter_mut().skip(1).for_each(|peers| peers.push(AgentId(0)));
        pop.add_property(contact_columns::CONTACTS_NOW, now).unwrap();
    }

    /// Hourly ticks starting at midnight.
    pub fn step(model: &mut dyn Model, pop: &mut Population, t: u64) -> Metrics {
        let clock = SimClock::default();
        let mut rng = SimRng::new(t);
        let mut cache = TickCache::new();
        let mut ctx = StepContext::new(Tick(t), &clock, pop, &mut cache, None, &mut rng);
        model.step(&mut ctx).unwrap()
    }
}

#[cfg(test)]
mod recall {
    use crate::recall_probability;

    #[test]
    fn grows_with_duration_and_fades_with_age() {
        assert_eq!(recall_probability(10, 0, 20, 1.0), 1.0);
        assert_eq!(recall_probability(5, 0, 20, 1.0), 0.5);
        assert_eq!(recall_probability(5, 0, 20, 0.5), 0.25);
        assert_eq!(recall_probability(10, 10, 20, 1.0), 0.5);
        assert_eq!(recall_probability(10, 20, 20, 1.0), 0.0);
        assert_eq!(recall_probability(0, 0, 20, 1.0), 0.0);
        assert_eq!(recall_probability(400, 0, 20, 0.7), 0.7);
    }
}

#[cfg(test)]
mod manual {
    use epi_contact::columns as contact_columns;
    use epi_core::{AgentId, RegionId, RequesterId, Tick};
    use epi_model::{Model, channels};
    use epi_world::columns as world_columns;

    use super::support::{population, positive, star, step};
    use crate::{ManualTracing, ManualTracingConfig, TracingTotals};

    #[test]
    fn pairs_accumulate_and_forget() {
        let (mut pop, mut registry) = population(3);
        star(&mut pop);
        let config = ManualTracingConfig { track_time: 5, ..Default::default() };
        let mut tracer = ManualTracing::new(config, &mut pop, &mut registry).unwrap();
        tracer.setup(&pop).unwrap();
        for t in 0..3 {
            step(&mut tracer, &mut pop, t);
        }
        let record = tracer.pair(AgentId(1), AgentId(0)).unwrap();
        assert_eq!((record.duration, record.last_seen), (3, Tick(2)));
        assert!(tracer.pair(AgentId(1), AgentId(2)).is_none());

        pop.get_mut::<Vec<AgentId>>(contact_columns::CONTACTS_NOW).unwrap().iter_mut().for_each(Vec::clear);
        step(&mut tracer, &mut pop, 7);
        assert_eq!(tracer.pair(AgentId(0), AgentId(1)).unwrap().duration, 3);
        step(&mut tracer, &mut pop, 8);
        let forgotten = tracer.pair(AgentId(0), AgentId(1)).unwrap();
        assert_eq!((forgotten.duration, forgotten.last_seen), (0, Tick(2)));
    }

    fn traced_household(n: usize, config: ManualTracingConfig) -> (epi_population::Population, ManualTracing) {
        let (mut pop, mut registry) = population(n);
        star(&mut pop);
        pop.add_property(world_columns::HOME, vec![RegionId(0); n]).unwrap();
        let mut tracer = ManualTracing::new(config, &mut pop, &mut registry).unwrap();
        tracer.setup(&pop).unwrap();
        positive(&mut pop, 0, 10);
        (pop, tracer)
    }

    #[test]
    fn daily_cycle_reaches_or_abandons_every_partner() {
        let config = ManualTracingConfig { track_time: 20, processing_delay: 0, ..Default::default() };
        let (mut pop, mut tracer) = traced_household(201, config);
        assert_eq!(tracer.requester_code(), RequesterId(2));
        for t in 0..16 {
            step(&mut tracer, &mut pop, t);
            assert_eq!(tracer.totals().named, 0);
        }
        for t in 16..20 {
            step(&mut tracer, &mut pop, t);
        }
        let totals = tracer.totals();
        assert_eq!(totals.named, 200);
        assert_eq!(totals.reached + totals.abandoned, 200);
        assert!(totals.reached > 150);
        assert_eq!(tracer.queue_len(), 0);

        let requested = pop.get::<bool>(channels::ISOLATION_REQUEST).unwrap();
        let by = pop.get::<RequesterId>(channels::ISOLATION_REQUESTED_BY).unwrap();
        assert_eq!(requested.iter().filter(|&&r| r).count() as u64, totals.reached);
        assert!(!requested[0]);
        assert!((1..201).filter(|&i| requested[i]).all(|i| by[i] == RequesterId(2)));
        assert!((1..201).all(|i| requested[i] == tracer.is_contacted(AgentId(i as u32))));
    }

    #[test]
    fn reached_agents_are_traced_again_on_a_new_positive() {
        let config = ManualTracingConfig {
            track_time:        20,
            processing_delay:  0,
            reach_probability: 1.0,
            ..Default::default()
        };
        let (mut pop, mut tracer) = traced_household(2, config);
        for t in 0..=16 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!((tracer.totals().named, tracer.totals().reached), (1, 1));
        assert!(tracer.is_contacted(AgentId(1)));

        // Released from isolation, still meeting agent 0, who tests positive again.
        pop.get_mut::<bool>(channels::ISOLATION_REQUEST).unwrap().fill(false);
        positive(&mut pop, 0, 30);
        for t in 17..=40 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!((tracer.totals().named, tracer.totals().reached), (2, 2));
        assert_eq!(pop.get::<bool>(channels::ISOLATION_REQUEST).unwrap(), &[false, true]);
    }

    #[test]
    fn dropouts_are_counted_but_not_isolated() {
        let config = ManualTracingConfig {
            track_time:        20,
            processing_delay:  0,
            reach_probability: 1.0,
            dropout:           1.0,
            ..Default::default()
        };
        let (mut pop, mut tracer) = traced_household(6, config);
        for t in 0..=16 {
            step(&mut tracer, &mut pop, t);
        }
        let totals = tracer.totals();
        assert_eq!((totals.named, totals.reached, totals.dropouts), (5, 5, 5));
        assert!(pop.get::<bool>(channels::ISOLATION_REQUEST).unwrap().iter().all(|&r| !r));
        assert!((1..6).all(|i| tracer.is_contacted(AgentId(i))));
    }

    #[test]
    fn failed_calls_wait_the_full_delay_then_abandon() {
        let config = ManualTracingConfig {
            track_time:        20,
            processing_delay:  3,
            reach_probability: 0.0,
            ..Default::default()
        };
        let (mut pop, mut tracer) = traced_household(2, config);
        for t in 0..=18 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!(tracer.queue_len(), 1);

        // First attempt at 16 + 3 fails and restarts the wait.
        for t in 19..=21 {
            step(&mut tracer, &mut pop, t);
            assert_eq!((tracer.queue_len(), tracer.totals().abandoned), (1, 0));
        }

        // Second failure, three ticks later, abandons the contact.
        step(&mut tracer, &mut pop, 22);
        assert_eq!(tracer.queue_len(), 0);
        assert_eq!(tracer.totals(), TracingTotals { named: 1, reached: 0, dropouts: 0, abandoned: 1 });
        assert!(!tracer.is_pending(AgentId(1)));
        assert!(!pop.get::<bool>(channels::ISOLATION_REQUEST).unwrap()[1]);
    }

    #[test]
    fn pending_tracks_backlog_and_queue() {
        let config = ManualTracingConfig {
            track_time:       20,
            processing_delay: 100,
            queue_capacity:   Some(2),
            ..Default::default()
        };
        let (mut pop, mut tracer) = traced_household(6, config);
        for t in 0..=16 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!((tracer.queue_len(), tracer.backlog_len()), (2, 3));
        assert!((1..6).all(|i| tracer.is_pending(AgentId(i))));
        assert!(!tracer.is_pending(AgentId(0)));

        // Pending partners are not named twice by the next cycle.
        positive(&mut pop, 0, 30);
        for t in 17..=40 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!(tracer.totals().named, 5);
        assert_eq!((tracer.queue_len(), tracer.backlog_len()), (4, 1));
    }

    #[test]
    fn queue_capacity_defers_backlog() {
        let config = ManualTracingConfig {
            track_time:       20,
            processing_delay: 100,
            queue_capacity:   Some(5),
            ..Default::default()
        };
        let (mut pop, mut tracer) = traced_household(21, config);
        for t in 0..=16 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!((tracer.queue_len(), tracer.backlog_len()), (5, 15));

        // The next cycle finds no new positives but drains five more.
        for t in 17..=40 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!((tracer.queue_len(), tracer.backlog_len()), (10, 10));
        assert_eq!(tracer.totals().named, 20);
    }

    #[test]
    fn isolated_partners_are_skipped() {
        let config = ManualTracingConfig { track_time: 20, processing_delay: 100, ..Default::default() };
        let (mut pop, mut registry) = population(4);
        star(&mut pop);
        pop.add_property(world_columns::HOME, vec![RegionId(0); 4]).unwrap();
        pop.add_property(channels::ISOLATED, vec![false, true, false, false]).unwrap();
        let mut tracer = ManualTracing::new(config, &mut pop, &mut registry).unwrap();
        tracer.setup(&pop).unwrap();
        positive(&mut pop, 0, 10);
        for t in 0..=16 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!(tracer.totals().named, 2);
    }

    #[test]
    fn zero_recall_names_nobody() {
        let config = ManualTracingConfig {
            track_time:       20,
            household_recall: 0.0,
            ..Default::default()
        };
        let (mut pop, mut tracer) = traced_household(10, config);
        for t in 0..=16 {
            step(&mut tracer, &mut pop, t);
        }
        assert_eq!(tracer.totals().named, 0);
    }

    #[test]
    fn rejects_bad_config() {
        let (mut pop, mut registry) = population(1);
        let zero = ManualTracingConfig { track_time: 0, ..Default::default() };
        assert!(ManualTracing::new(zero, &mut pop, &mut registry).is_err());
        let dropout = ManualTracingConfig { dropout: 2.0, ..Default::default() };
        assert!(ManualTracing::new(dropout, &mut pop, &mut registry).is_err());
        let reach = ManualTracingConfig { reach_probability: -0.1, ..Default::default() };
        assert!(ManualTracing::new(reach, &mut pop, &mut registry).is_err());
    }
}

#[cfg(test)]
mod app {
    use epi_contact::{ContactList, columns as contact_columns};
    use epi_core::{AgentId, RequesterId, Tick};
    use epi_model::channels;

    use super::support::{population, positive, step};
    use crate::{AppTracing, AppTracingConfig};

    #[test]
    fn notifies_long_recent_peers_of_enabled_positives() {
        let (mut pop, mut registry) = population(6);
        let mut ledgers = vec![ContactList::new(true, None); 6];
        for t in 90..=93 {
            ledgers[0].update(&[AgentId(1)], Tick(t), None, false);
        }
        ledgers[0].update(&[AgentId(2)], Tick(95), None, false);
        for t in 0..=5 {
            ledgers[0].update(&[AgentId(3)], Tick(t), None, false);
        }
        ledgers[4] = ContactList::new(false, None);
        ledgers[4].update(&[AgentId(5)], Tick(95), None, false);
        pop.add_property(contact_columns::CONTACTS, ledgers).unwrap();

        let config = AppTracingConfig { min_duration: 2, track_time: 10, request_test: true };
        let mut app = AppTracing::new(config, &mut pop, &mut registry).unwrap();
        positive(&mut pop, 0, 100);
        positive(&mut pop, 4, 100);
        let m = step(&mut app, &mut pop, 100);

        let requested = pop.get::<bool>(channels::ISOLATION_REQUEST).unwrap();
        assert_eq!(requested, &[false, true, false, false, false, false]);
        assert_eq!(pop.get::<RequesterId>(channels::ISOLATION_REQUESTED_BY).unwrap()[1], app.requester_code());
        assert!(pop.get::<bool>(channels::TEST_REQUESTED).unwrap()[1]);
        assert!(m.contains(&("notified", 1.0)));

        // The same result is not processed twice.
        step(&mut app, &mut pop, 101);
        assert_eq!(app.notified(), 1);
    }
}
