use crate::models::Archetype::{self, *};

/// Per-archetype score changes applied together by one rule
pub type Deltas = &'static [(Archetype, f64)];

/// Flow (L/min) and pressure (bar) cut-offs for the mains gates
#[derive(Debug, Clone, Copy)]
pub struct MainsThresholds {
    /// Deducted from flow-cup readings when judging combi performance
    pub flow_cup_offset_lpm: f64,
    pub combi_good_flow_lpm: f64,
    pub combi_good_working_bar: f64,
    pub combi_good_standing_bar: f64,
    pub combi_strong_flow_lpm: f64,
    pub combi_strong_working_bar: f64,
    pub combi_strong_standing_bar: f64,
    pub unvented_acceptable_flow_lpm: f64,
    pub unvented_acceptable_working_bar: f64,
    pub unvented_acceptable_standing_bar: f64,
    pub unvented_ideal_flow_lpm: f64,
    pub unvented_ideal_working_bar: f64,
    pub unvented_ideal_standing_bar: f64,
    pub poor_flow_lpm: f64,
    pub poor_working_bar: f64,
}

/// Uniform shift from how trustworthy the water test was
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceWeights {
    pub two_tap: f64,
    pub outside_tap: f64,
    pub single_tap: f64,
    /// Applied to the figures above before they reach the scores
    pub scale: f64,
}

/// A complete, versioned scorecard
///
/// The scorer applies these groups in a fixed order; see
/// [`crate::core::scoring::Scorer`].
#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub version: &'static str,
    pub base: Deltas,
    pub mains: MainsThresholds,

    pub unvented_ideal: Deltas,
    pub unvented_acceptable: Deltas,
    pub poor_flow: Deltas,
    pub poor_pressure: Deltas,

    pub combi_good: Deltas,
    pub combi_strong: Deltas,

    pub stored_demand: Deltas,
    pub small_household_combi: Deltas,

    /// Tight or no space
    pub constrained_space: Deltas,
    pub tight_space: Deltas,
    /// Transient penalty; the archetypes are also disqualified outright
    pub no_space: Deltas,

    pub low_disruption_vented: Deltas,
    pub low_disruption_unvented: Deltas,
    pub low_disruption_combi: Deltas,
    pub high_disruption: Deltas,

    pub retirement_regular: Deltas,
    pub retirement_other: Deltas,

    pub inertia_vented: Deltas,
    pub inertia_unvented: Deltas,
    pub inertia_combi: Deltas,

    pub with_16a: Deltas,
    pub without_16a: Deltas,

    pub combi_intent: Deltas,

    pub confidence: ConfidenceWeights,
}

impl RuleSet {
    /// Starting score for an archetype before any rule fires
    pub fn base_score(&self, archetype: Archetype) -> f64 {
        self.base
            .iter()
            .find(|(a, _)| *a == archetype)
            .map(|(_, s)| *s)
            .unwrap_or(0.0)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        CANONICAL_RULES
    }
}

/// The one supported rule set.
///
/// Replacing like-for-like is the prior: the vented regular starts highest
/// and the combi lowest.
pub const CANONICAL_RULES: RuleSet = RuleSet {
    version: "2024-10.1",
    base: &[
        (RegularVented, 60.0),
        (SystemUnvented, 50.0),
        (SystemMixergyUnvented, 55.0),
        (RegularMixergyVented, 55.0),
        (Combi, 40.0),
    ],
    mains: MainsThresholds {
        flow_cup_offset_lpm: 2.5,
        combi_good_flow_lpm: 10.0,
        combi_good_working_bar: 1.0,
        combi_good_standing_bar: 2.0,
        combi_strong_flow_lpm: 14.0,
        combi_strong_working_bar: 1.5,
        combi_strong_standing_bar: 2.5,
        unvented_acceptable_flow_lpm: 25.0,
        unvented_acceptable_working_bar: 1.5,
        unvented_acceptable_standing_bar: 2.0,
        unvented_ideal_flow_lpm: 30.0,
        unvented_ideal_working_bar: 2.0,
        unvented_ideal_standing_bar: 2.5,
        poor_flow_lpm: 13.0,
        poor_working_bar: 1.5,
    },

    unvented_ideal: &[
        (SystemUnvented, 22.0),
        (SystemMixergyUnvented, 22.0),
        (RegularVented, -3.0),
    ],
    unvented_acceptable: &[(SystemUnvented, 12.0), (SystemMixergyUnvented, 12.0)],
    poor_flow: &[(Combi, -12.0)],
    poor_pressure: &[(Combi, -8.0), (SystemUnvented, -16.0)],

    combi_good: &[(Combi, 10.0)],
    combi_strong: &[(Combi, 8.0)],

    stored_demand: &[
        (SystemUnvented, 12.0),
        (SystemMixergyUnvented, 14.0),
        (RegularMixergyVented, 10.0),
        (Combi, -10.0),
        (RegularVented, -4.0),
    ],
    small_household_combi: &[(Combi, 15.0)],

    constrained_space: &[(Combi, 8.0)],
    tight_space: &[(SystemUnvented, -10.0)],
    no_space: &[
        (SystemUnvented, -100.0),
        (SystemMixergyUnvented, -100.0),
        (RegularMixergyVented, -100.0),
    ],

    low_disruption_vented: &[
        (RegularVented, 20.0),
        (RegularMixergyVented, 12.0),
        (SystemUnvented, -8.0),
        (SystemMixergyUnvented, -8.0),
    ],
    low_disruption_unvented: &[
        (SystemUnvented, 18.0),
        (SystemMixergyUnvented, 14.0),
        (RegularVented, -6.0),
        (Combi, -8.0),
    ],
    low_disruption_combi: &[
        (Combi, 16.0),
        (SystemUnvented, -6.0),
        (RegularVented, -6.0),
    ],
    high_disruption: &[(SystemUnvented, 5.0), (SystemMixergyUnvented, 6.0)],

    retirement_regular: &[(RegularVented, 4.0), (RegularMixergyVented, 3.0)],
    retirement_other: &[(Combi, -3.0)],

    inertia_vented: &[(RegularVented, 8.0), (RegularMixergyVented, 6.0)],
    inertia_unvented: &[(SystemUnvented, 6.0), (SystemMixergyUnvented, 5.0)],
    inertia_combi: &[(Combi, 5.0)],

    with_16a: &[(SystemMixergyUnvented, 6.0), (RegularMixergyVented, 4.0)],
    without_16a: &[(SystemMixergyUnvented, -15.0), (RegularMixergyVented, -5.0)],

    combi_intent: &[(Combi, 6.0)],

    confidence: ConfidenceWeights {
        two_tap: 7.0,
        outside_tap: 5.0,
        single_tap: -4.0,
        scale: 0.5,
    },
};
