//! Infection states and symptom levels.

/// Where an agent is in the course of the disease.
///
/// Legal transitions:
///
/// ```text
/// Susceptible → Exposed → Infectious ─┬→ Immune
///                       ↘ Infected  ──┴→ Deceased
/// ```
///
/// `Infectious` is the asymptomatic infectious state and `Infected` the
/// symptomatic one.  `Deceased` is terminal.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InfectionState {
    #[default]
    Susceptible,
    Exposed,
    Infectious,
    Infected,
    Immune,
    Deceased,
}

impl InfectionState {
    pub const ALL: [InfectionState; 6] = [
        InfectionState::Susceptible,
        InfectionState::Exposed,
        InfectionState::Infectious,
        InfectionState::Infected,
        InfectionState::Immune,
        InfectionState::Deceased,
    ];

    /// Can pass the pathogen on.
    #[inline]
    pub fn is_transmitting(self) -> bool {
        matches!(self, InfectionState::Infectious | InfectionState::Infected)
    }

    /// Counts towards an ongoing wave.  Includes `Exposed`, so a wave only
    /// ends once nobody is incubating either.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            InfectionState::Exposed | InfectionState::Infectious | InfectionState::Infected
        )
    }

    /// `true` if `self → next` is an edge of the state graph.
    pub fn can_become(self, next: InfectionState) -> bool {
        use InfectionState::*;
        matches!(
            (self, next),
            (Susceptible, Exposed)
                | (Exposed, Infectious)
                | (Exposed, Infected)
                | (Infectious, Immune)
                | (Infectious, Deceased)
                | (Infected, Immune)
                | (Infected, Deceased)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InfectionState::Susceptible => "susceptible",
            InfectionState::Exposed => "exposed",
            InfectionState::Infectious => "infectious",
            InfectionState::Infected => "infected",
            InfectionState::Immune => "immune",
            InfectionState::Deceased => "deceased",
        }
    }
}

/// How sick an agent is.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SymptomLevel {
    #[default]
    NotSick,
    /// Infected but asymptomatic.
    NoSymptoms,
    Mild,
    Strong,
    Severe,
}

impl SymptomLevel {
    /// Symptomatic tiers, in the order of [`PathogenConfig::symptom_weights`].
    ///
    /// [`PathogenConfig::symptom_weights`]: crate::PathogenConfig::symptom_weights
    pub const SYMPTOMATIC: [SymptomLevel; 3] = [SymptomLevel::Mild, SymptomLevel::Strong, SymptomLevel::Severe];

    #[inline]
    pub fn is_symptomatic(self) -> bool {
        self >= SymptomLevel::Mild
    }
}

/// Pre-sampled end of an infection.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Outcome {
    #[default]
    Recover,
    Die,
}
