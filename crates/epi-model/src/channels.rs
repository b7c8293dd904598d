//! Request channels shared between intervention models.
//!
//! Several models ask for the same thing (testing and both tracers request
//! isolation; tracing requests tests) and one model serves the request.
//! The channels are ordinary population columns.  Every writer calls
//! [`register`] in its constructor, so the first one constructed creates
//! them and the rest share them.
//!
//! | Column                     | Type          | Served by  |
//! |----------------------------|---------------|------------|
//! | [`ISOLATED`]               | `bool`        | (owned by isolation) |
//! | [`ISOLATION_REQUEST`]      | `bool`        | isolation  |
//! | [`ISOLATION_REQUESTED_BY`] | `RequesterId` | isolation  |
//! | [`LEAVE_REQUEST`]          | `bool`        | isolation  |
//! | [`TEST_REQUESTED`]         | `bool`        | testing    |

use epi_core::{AgentId, RequesterId};
use epi_population::{Population, PopulationResult};

/// Current isolation status.  Written only by the isolation model.
pub const ISOLATED: &str = "isolated";
pub const ISOLATION_REQUEST: &str = "isolation_request";
pub const ISOLATION_REQUESTED_BY: &str = "isolation_requested_by";
pub const LEAVE_REQUEST: &str = "leave_request";
pub const TEST_REQUESTED: &str = "test_requested";

/// Create every request channel that does not exist yet.
pub fn register(population: &mut Population) -> PopulationResult<()> {
    population.ensure_property(ISOLATION_REQUEST, false)?;
    population.ensure_property(ISOLATION_REQUESTED_BY, RequesterId::INVALID)?;
    population.ensure_property(LEAVE_REQUEST, false)?;
    population.ensure_property(TEST_REQUESTED, false)?;
    Ok(())
}

/// Ask for `agents` to be isolated on behalf of `by`.
///
/// An agent that already has a pending request keeps its first requester.
/// Returns the number of new requests.
pub fn request_isolation(
    population: &mut Population,
    agents:     &[AgentId],
    by:         RequesterId,
) -> PopulationResult<usize> {
    let (requested, requesters) =
        population.get_pair_mut::<bool, RequesterId>(ISOLATION_REQUEST, ISOLATION_REQUESTED_BY)?;
    let mut fresh = 0;
    for a in agents {
        let i = a.index();
        if !requested[i] {
            requested[i] = true;
            requesters[i] = by;
            fresh += 1;
        }
    }
    Ok(fresh)
}

/// Ask for `agents` to leave isolation.
pub fn request_leave(population: &mut Population, agents: &[AgentId]) -> PopulationResult<()> {
    let leave = population.get_mut::<bool>(LEAVE_REQUEST)?;
    agents.iter().for_each(|a| leave[a.index()] = true);
    Ok(())
}

/// Ask for `agents` to be tested.
pub fn request_test(population: &mut Population, agents: &[AgentId]) -> PopulationResult<()> {
    let tests = population.get_mut::<bool>(TEST_REQUESTED)?;
    agents.iter().for_each(|a| tests[a.index()] = true);
    Ok(())
}
