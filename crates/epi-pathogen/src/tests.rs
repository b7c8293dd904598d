//! Unit tests for epi-pathogen.

#[cfg(test)]
mod support {
    use epi_core::{DurationDistribution, Position, SimClock, SimRng, Tick, TickCache};
    use epi_model::{Metrics, Model, StepContext};
    use epi_population::Population;
    use epi_world::columns;

    use crate::{Pathogen, PathogenConfig};

    /// Deterministic disease: certain infection, fixed durations, no deaths.
    pub fn certain(incubation: f64, duration: f64) -> PathogenConfig {
        PathogenConfig {
            radius:                2.0,
            exposure_time:         2,
            infection_probability: 1.0,
            asymptomatic_share:    0.0,
            symptom_weights:       [1.0, 0.0, 0.0],
            incubation:            DurationDistribution::Constant { value: incubation },
            infection_duration:    DurationDistribution::Constant { value: duration },
            death_rate:            0.0,
            ..Default::default()
        }
    }

    pub fn placed(points: &[(f64, f64)], config: PathogenConfig) -> (Population, Pathogen) {
        let mut pop = Population::new(points.len());
        let positions: Vec<Position> = points.iter().map(|&(x, y)| Position::new(x, y)).collect();
        pop.add_property(columns::POSITION, positions).unwrap();
        let pathogen = Pathogen::new(config, &mut pop).unwrap();
        (pop, pathogen)
    }

    pub fn step(pathogen: &mut Pathogen, pop: &mut Population, t: u64, rng: &mut SimRng) -> Metrics {
        let clock = SimClock::default();
        let mut cache = TickCache::new();
        cache.set_time(Tick(t));
        pop.set_time(Tick(t));
        let mut ctx = StepContext::new(Tick(t), &clock, pop, &mut cache, None, rng);
        pathogen.step(&mut ctx).unwrap()
    }

    pub fn metric(metrics: &Metrics, name: &str) -> f64 {
        metrics.iter().find(|(n, _)| *n == name).map(|(_, v)| *v).unwrap()
    }
}

// ── State graph ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod state {
    use crate::{InfectionState, SymptomLevel};

    #[test]
    fn deceased_is_terminal() {
        for next in InfectionState::ALL {
            assert!(!InfectionState::Deceased.can_become(next));
            assert!(!InfectionState::Immune.can_become(next));
        }
    }

    #[test]
    fn no_skipping_exposure() {
        use InfectionState::*;
        assert!(Susceptible.can_become(Exposed));
        assert!(!Susceptible.can_become(Infectious));
        assert!(!Susceptible.can_become(Infected));
        assert!(Exposed.can_become(Infected));
        assert!(!Exposed.can_become(Immune));
        assert!(Infectious.can_become(Deceased));
    }

    #[test]
    fn symptomatic_tiers() {
        assert!(!SymptomLevel::NotSick.is_symptomatic());
        assert!(!SymptomLevel::NoSymptoms.is_symptomatic());
        assert!(SymptomLevel::SYMPTOMATIC.iter().all(|l| l.is_symptomatic()));
    }
}

// ── Transmission ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod transmission {
    use epi_core::{AgentId, SimRng, Tick};

    use super::support::{certain, metric, placed, step};
    use crate::{AsymptomaticShare, InfectionState, columns, r, r_current};

    #[test]
    fn exposure_threshold_then_incubation() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0), (50.0, 0.0)], certain(3.0, 5.0));
        let mut rng = SimRng::new(1);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();
        assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[0], InfectionState::Infectious);

        step(&mut p, &mut pop, 0, &mut rng);
        step(&mut p, &mut pop, 1, &mut rng);
        {
            let states = pop.get::<InfectionState>(columns::STATE).unwrap();
            assert_eq!(states[1], InfectionState::Susceptible);
            assert_eq!(pop.get::<u64>(columns::EXPOSURE).unwrap()[1], 2);
        }

        let m = step(&mut p, &mut pop, 2, &mut rng);
        assert_eq!(metric(&m, "new_infections"), 1.0);
        let states = pop.get::<InfectionState>(columns::STATE).unwrap();
        assert_eq!(states[1], InfectionState::Exposed);
        assert_eq!(states[2], InfectionState::Susceptible);
        assert_eq!(pop.get::<f64>(columns::PARTICLES_INFECTED).unwrap()[0], 1.0);
        assert_eq!(pop.get::<Option<Tick>>(columns::TIME_OF_INFECTION).unwrap()[1], Some(Tick(2)));
        assert_eq!(pop.get::<Option<Tick>>(columns::DURATION_INFECTION).unwrap()[1], Some(Tick(5)));

        for t in 3..5 {
            step(&mut p, &mut pop, t, &mut rng);
            assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[1], InfectionState::Exposed);
        }
        step(&mut p, &mut pop, 5, &mut rng);
        let states = pop.get::<InfectionState>(columns::STATE).unwrap();
        assert_eq!(states[1], InfectionState::Infected);
        // The seed's infection started at 0 and lasted 5 ticks.
        assert_eq!(states[0], InfectionState::Immune);
        assert_eq!(r(&pop).unwrap(), 1.0);
        assert_eq!(r_current(&pop).unwrap(), 0.0);
    }

    #[test]
    fn blame_is_split_between_sources() {
        let mut config = certain(10.0, 10.0);
        config.exposure_time = 0;
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0)], config);
        let mut rng = SimRng::new(2);
        p.seed_infections(&mut pop, &[AgentId(0), AgentId(1)], AsymptomaticShare::Fraction(0.5), &mut rng)
            .unwrap();

        step(&mut p, &mut pop, 0, &mut rng);
        assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[2], InfectionState::Exposed);
        assert_eq!(pop.get::<f64>(columns::PARTICLES_INFECTED).unwrap(), &[0.5, 0.5, 0.0]);
        assert_eq!(r(&pop).unwrap(), 0.5);
        assert_eq!(r_current(&pop).unwrap(), 0.5);
        assert_eq!(p.total_infections(), 1);
    }

    #[test]
    fn exposed_agents_do_not_transmit() {
        let mut config = certain(100.0, 100.0);
        config.exposure_time = 0;
        // 0 seeds 1; 2 is only near 1.
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.5, 0.0), (3.0, 0.0)], config);
        let mut rng = SimRng::new(3);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(0), &mut rng).unwrap();
        for t in 0..5 {
            step(&mut p, &mut pop, t, &mut rng);
        }
        let states = pop.get::<InfectionState>(columns::STATE).unwrap();
        assert_eq!(states[1], InfectionState::Exposed);
        assert_eq!(states[2], InfectionState::Susceptible);
        assert_eq!(pop.get::<u64>(columns::EXPOSURE).unwrap()[2], 0);
    }

    #[test]
    fn isolated_agents_are_shielded() {
        let mut config = certain(1.0, 100.0);
        config.exposure_time = 0;
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0)], config);
        pop.add_property(epi_model::channels::ISOLATED, vec![true, false]).unwrap();
        epi_model::Model::setup(&mut p, &pop).unwrap();

        let mut rng = SimRng::new(4);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();
        for t in 0..5 {
            step(&mut p, &mut pop, t, &mut rng);
        }
        assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[1], InfectionState::Susceptible);
        assert_eq!(pop.get::<u64>(columns::EXPOSURE).unwrap()[1], 0);
    }

    #[test]
    fn state_counts_cover_population() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0), (9.0, 9.0)], certain(1.0, 1.0));
        let mut rng = SimRng::new(5);
        p.seed_infections(&mut pop, &[AgentId(2)], AsymptomaticShare::Count(0), &mut rng).unwrap();
        let m = step(&mut p, &mut pop, 0, &mut rng);
        let total: f64 = InfectionState::ALL.iter().map(|s| metric(&m, s.as_str())).sum();
        assert_eq!(total, 3.0);
        assert_eq!(metric(&m, "infected"), 1.0);
    }

    #[test]
    fn closure_samplers_are_accepted() {
        let mut config = certain(0.0, 0.0);
        config.exposure_time = 0;
        let (mut pop, p) = placed(&[(0.0, 0.0), (1.0, 0.0)], config);
        let mut p = p.with_samplers(
            |n: usize, _: &mut SimRng| vec![4.0; n],
            |n: usize, _: &mut SimRng| vec![7.0; n],
        );
        let mut rng = SimRng::new(6);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();
        assert_eq!(pop.get::<Option<Tick>>(columns::DURATION_INFECTION).unwrap()[0], Some(Tick(7)));
        step(&mut p, &mut pop, 0, &mut rng);
        assert_eq!(pop.get::<Option<Tick>>(columns::DURATION_INFECTION).unwrap()[1], Some(Tick(4)));
    }

    #[test]
    fn empty_sampler_fails_the_step() {
        let mut config = certain(0.0, 0.0);
        config.exposure_time = 0;
        let (mut pop, p) = placed(&[(0.0, 0.0), (1.0, 0.0)], config);
        let mut p = p.with_samplers(
            |_: usize, _: &mut SimRng| Vec::new(),
            |n: usize, _: &mut SimRng| vec![7.0; n],
        );
        let mut rng = SimRng::new(6);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();

        let clock = epi_core::SimClock::default();
        let mut cache = epi_core::TickCache::new();
        let mut ctx = epi_model::StepContext::new(Tick(0), &clock, &mut pop, &mut cache, None, &mut rng);
        let err = epi_model::Model::step(&mut p, &mut ctx).unwrap_err();
        assert!(matches!(err, epi_model::ModelError::Core(epi_core::EpiError::Distribution(_))));
    }

    #[test]
    fn far_future_incubation_saturates() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0)], certain(1e20, 10.0));
        let mut rng = SimRng::new(8);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();
        for t in 0..3 {
            step(&mut p, &mut pop, t, &mut rng);
        }
        assert_eq!(pop.get::<Option<Tick>>(columns::DURATION_INFECTION).unwrap()[1], Some(Tick(u64::MAX)));
        step(&mut p, &mut pop, 3, &mut rng);
        assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[1], InfectionState::Exposed);
    }
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod outcome {
    use epi_core::{AgentId, SimRng, Tick};
    use epi_model::Model;
    use epi_world::columns as world_columns;

    use super::support::{certain, placed, step};
    use crate::{AsymptomaticShare, InfectionState, Outcome, columns};

    #[test]
    fn deceased_stay_deceased_and_stop_moving() {
        let mut config = certain(1.0, 1.0);
        config.death_rate = 1.0;
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (50.0, 0.0)], config);
        pop.add_property(world_columns::MOVEMENT_ENABLED, vec![true, true]).unwrap();
        p.setup(&pop).unwrap();

        let mut rng = SimRng::new(7);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(0), &mut rng).unwrap();
        step(&mut p, &mut pop, 0, &mut rng);
        assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[0], InfectionState::Infected);
        for t in 1..6 {
            step(&mut p, &mut pop, t, &mut rng);
            assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[0], InfectionState::Deceased);
        }
        assert_eq!(pop.get::<bool>(world_columns::MOVEMENT_ENABLED).unwrap(), &[false, true]);
    }

    #[test]
    fn asymptomatic_cases_survive() {
        let mut config = certain(1.0, 1.0);
        config.death_rate = 1.0;
        let (mut pop, mut p) = placed(&[(0.0, 0.0)], config);
        let mut rng = SimRng::new(8);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Fraction(1.0), &mut rng).unwrap();
        assert_eq!(p.outcome(AgentId(0)), Outcome::Recover);
        step(&mut p, &mut pop, 1, &mut rng);
        assert_eq!(pop.get::<InfectionState>(columns::STATE).unwrap()[0], InfectionState::Immune);
    }

    #[test]
    fn icu_overflow_raises_death_rate() {
        for (beds, expected) in [(0, Outcome::Die), (1, Outcome::Recover)] {
            let mut config = certain(10.0, 10.0);
            config.exposure_time = 0;
            config.symptom_weights = [0.0, 0.0, 1.0];
            config.icu_beds = Some(beds);
            config.icu_death_rate = 1.0;
            let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0)], config);
            let mut rng = SimRng::new(9);
            p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(0), &mut rng).unwrap();
            step(&mut p, &mut pop, 0, &mut rng);
            assert_eq!(p.outcome(AgentId(1)), expected, "beds = {beds}");
        }
    }

    #[test]
    fn waves_open_and_close() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0)], certain(1.0, 3.0));
        let mut rng = SimRng::new(10);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();
        for t in 0..5 {
            step(&mut p, &mut pop, t, &mut rng);
        }
        assert_eq!(p.waves(), &[(Tick(0), Some(Tick(3)))]);
        assert!(!p.in_wave());
    }

    #[test]
    fn incubating_agents_keep_the_wave_open() {
        // The seed recovers at 4; its contact is exposed at 2 and incubates
        // until 12, so the wave only closes when that contact recovers.
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0)], certain(10.0, 4.0));
        let mut rng = SimRng::new(12);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(1), &mut rng).unwrap();
        for t in 0..10 {
            step(&mut p, &mut pop, t, &mut rng);
        }
        let states = pop.get::<InfectionState>(columns::STATE).unwrap();
        assert_eq!(states[0], InfectionState::Immune);
        assert_eq!(states[1], InfectionState::Exposed);
        assert!(p.in_wave());
        for t in 10..17 {
            step(&mut p, &mut pop, t, &mut rng);
        }
        assert_eq!(p.waves(), &[(Tick(0), Some(Tick(16)))]);
    }
}

// ── Seeding ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod seeding {
    use epi_core::{AgentId, SimRng};
    use epi_model::ModelError;

    use super::support::{certain, placed};
    use crate::{AsymptomaticShare, InfectionState, columns};

    #[test]
    fn invalid_seeds_fail_fast() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], certain(1.0, 1.0));
        let mut rng = SimRng::new(11);
        let cases: [(&[AgentId], AsymptomaticShare); 4] = [
            (&[AgentId(0)], AsymptomaticShare::Fraction(1.5)),
            (&[AgentId(0), AgentId(1)], AsymptomaticShare::Count(3)),
            (&[AgentId(0), AgentId(0)], AsymptomaticShare::Count(0)),
            (&[AgentId(9)], AsymptomaticShare::Count(0)),
        ];
        for (ids, share) in cases {
            let err = p.seed_infections(&mut pop, ids, share, &mut rng);
            assert!(matches!(err, Err(ModelError::Config { .. })), "{ids:?} {share:?}");
        }
        let states = pop.get::<InfectionState>(columns::STATE).unwrap();
        assert!(states.iter().all(|s| *s == InfectionState::Susceptible));
    }

    #[test]
    fn fraction_is_rounded() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0); 4], certain(1.0, 1.0));
        let mut rng = SimRng::new(12);
        let all: Vec<AgentId> = pop.agent_ids().collect();
        p.seed_infections(&mut pop, &all, AsymptomaticShare::Fraction(0.5), &mut rng).unwrap();
        let states = pop.get::<InfectionState>(columns::STATE).unwrap();
        assert_eq!(states.iter().filter(|s| **s == InfectionState::Infectious).count(), 2);
        assert_eq!(states.iter().filter(|s| **s == InfectionState::Infected).count(), 2);
    }

    #[test]
    fn cannot_reseed_infected_agent() {
        let (mut pop, mut p) = placed(&[(0.0, 0.0)], certain(1.0, 1.0));
        let mut rng = SimRng::new(13);
        p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(0), &mut rng).unwrap();
        assert!(p.seed_infections(&mut pop, &[AgentId(0)], AsymptomaticShare::Count(0), &mut rng).is_err());
    }
}
