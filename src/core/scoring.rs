use std::collections::{BTreeMap, BTreeSet};
use crate::core::rules::{Deltas, MainsThresholds, RuleSet};
use crate::models::{
    Archetype, ArchetypeScores, CylinderSpace, DisruptionTolerance, ExistingSystem, Occupancy,
    Persona, PressureTestMethod, SurveyInput,
};

const SCORE_FLOOR: f64 = 0.0;
const SCORE_CEILING: f64 = 100.0;

/// What the water test says about each kind of system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainsAssessment {
    /// Flow used for combi judgements, after the flow-cup correction
    pub combi_flow_lpm: f64,
    pub good_for_combi: bool,
    pub strong_for_combi: bool,
    pub unvented_acceptable: bool,
    pub unvented_ideal: bool,
}

/// Judge the mains supply against the thresholds
///
/// An unknown working pressure never satisfies a pressure test on its own;
/// the standing pressure is used as the fallback.
pub fn assess_mains(input: &SurveyInput, thresholds: &MainsThresholds) -> MainsAssessment {
    let flow = input.flow_lpm;
    let standing = input.standing_pressure_bar;
    let working_at_least = |bar: f64| input.working_pressure_bar.is_some_and(|w| w >= bar);

    let cup_offset = if input.pressure_test_method == PressureTestMethod::SingleTap {
        thresholds.flow_cup_offset_lpm
    } else {
        0.0
    };
    let combi_flow_lpm = (flow - cup_offset).max(0.0);

    MainsAssessment {
        combi_flow_lpm,
        good_for_combi: combi_flow_lpm >= thresholds.combi_good_flow_lpm
            && (working_at_least(thresholds.combi_good_working_bar)
                || standing >= thresholds.combi_good_standing_bar),
        strong_for_combi: combi_flow_lpm >= thresholds.combi_strong_flow_lpm
            && (working_at_least(thresholds.combi_strong_working_bar)
                || standing >= thresholds.combi_strong_standing_bar),
        unvented_acceptable: flow >= thresholds.unvented_acceptable_flow_lpm
            && (working_at_least(thresholds.unvented_acceptable_working_bar)
                || standing >= thresholds.unvented_acceptable_standing_bar),
        unvented_ideal: flow >= thresholds.unvented_ideal_flow_lpm
            && (working_at_least(thresholds.unvented_ideal_working_bar)
                || standing >= thresholds.unvented_ideal_standing_bar),
    }
}

/// Running totals while the rules are applied
///
/// Values may leave `[0, 100]` until [`Tally::finish`] clamps them.
struct Tally {
    values: BTreeMap<Archetype, f64>,
    disqualified: BTreeSet<Archetype>,
}

impl Tally {
    fn from_base(rules: &RuleSet) -> Self {
        Self {
            values: Archetype::ALL
                .into_iter()
                .map(|a| (a, rules.base_score(a)))
                .collect(),
            disqualified: BTreeSet::new(),
        }
    }

    fn apply(&mut self, deltas: Deltas) {
        for (archetype, delta) in deltas {
            *self.values.entry(*archetype).or_insert(0.0) += delta;
        }
    }

    fn shift_all(&mut self, delta: f64) {
        for value in self.values.values_mut() {
            *value += delta;
        }
    }

    fn disqualify(&mut self, archetype: Archetype) {
        self.disqualified.insert(archetype);
    }

    fn finish(self) -> ArchetypeScores {
        let scores = self
            .values
            .into_iter()
            .map(|(archetype, value)| {
                let score = if self.disqualified.contains(&archetype) {
                    SCORE_FLOOR
                } else {
                    value.clamp(SCORE_FLOOR, SCORE_CEILING).round()
                };
                (archetype, score as u8)
            })
            .collect();

        ArchetypeScores::new(scores, self.disqualified)
    }
}

/// Rule-based suitability scorer
///
/// # Rule order
/// 1. Flow-cup correction (combi judgements only)
/// 2. Stored-system mains gate
/// 3. Combi mains gate
/// 4. Household demand
/// 5. Cylinder space
/// 6. Disruption tolerance (like-for-like)
/// 7. Persona nudge
/// 8. Existing-system inertia
/// 9. 16 A electrics for Mixergy
/// 10. Stated combi intent
/// 11. Test-method confidence
///
/// Clamping to `[0, 100]` happens once, after the last rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    rules: RuleSet,
}

impl Scorer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn assess(&self, input: &SurveyInput) -> MainsAssessment {
        assess_mains(input, &self.rules.mains)
    }

    /// Score every archetype for one survey. Pure and deterministic.
    pub fn score(&self, input: &SurveyInput) -> ArchetypeScores {
        let rules = &self.rules;
        let mains = self.assess(input);
        let mut tally = Tally::from_base(rules);

        // Stored systems
        if mains.unvented_ideal {
            tally.apply(rules.unvented_ideal);
        } else if mains.unvented_acceptable {
            tally.apply(rules.unvented_acceptable);
        } else {
            // Only measured figures count as poor
            if input.flow_lpm > 0.0 && input.flow_lpm < rules.mains.poor_flow_lpm {
                tally.apply(rules.poor_flow);
            }
            if input
                .working_pressure_bar
                .is_some_and(|w| w < rules.mains.poor_working_bar)
            {
                tally.apply(rules.poor_pressure);
            }
        }

        // Combi
        if mains.good_for_combi {
            tally.apply(rules.combi_good);
            if mains.strong_for_combi {
                tally.apply(rules.combi_strong);
            }
        }

        // Household demand
        let stored_demand = input.bathrooms >= 2 || input.occupancy == Occupancy::HighDemand;
        let small_household = input.bathrooms <= 1
            && matches!(input.occupancy, Occupancy::Single | Occupancy::TwoAlways);
        if stored_demand {
            tally.apply(rules.stored_demand);
        } else if small_household && mains.good_for_combi {
            tally.apply(rules.small_household_combi);
        }

        // Space
        match input.space_for_cylinder {
            CylinderSpace::Tight => {
                tally.apply(rules.constrained_space);
                tally.apply(rules.tight_space);
            }
            CylinderSpace::None => {
                tally.apply(rules.constrained_space);
                tally.apply(rules.no_space);
                for archetype in Archetype::ALL.into_iter().filter(|a| a.needs_cylinder()) {
                    tally.disqualify(archetype);
                }
            }
            CylinderSpace::Ample => {}
        }

        // Disruption tolerance
        match input.disruption_tolerance {
            DisruptionTolerance::Low => {
                if let Some(deltas) = like_for_like(input, [
                    rules.low_disruption_vented,
                    rules.low_disruption_unvented,
                    rules.low_disruption_combi,
                ]) {
                    tally.apply(deltas);
                }
            }
            DisruptionTolerance::High => tally.apply(rules.high_disruption),
            DisruptionTolerance::Medium => {}
        }

        // Persona
        if input.persona == Persona::PostRetirement {
            if matches!(
                input.existing_system,
                ExistingSystem::Regular | ExistingSystem::BackBoiler
            ) {
                tally.apply(rules.retirement_regular);
            } else {
                tally.apply(rules.retirement_other);
            }
        }

        // Switching cost
        if let Some(deltas) = like_for_like(input, [
            rules.inertia_vented,
            rules.inertia_unvented,
            rules.inertia_combi,
        ]) {
            tally.apply(deltas);
        }

        // Electrics
        if input.electrics_16a {
            tally.apply(rules.with_16a);
        } else {
            tally.apply(rules.without_16a);
        }

        // Customer intent
        if input.wants_combi {
            tally.apply(rules.combi_intent);
        }

        // Measurement confidence
        let confidence = match input.pressure_test_method {
            PressureTestMethod::TwoTap => rules.confidence.two_tap,
            PressureTestMethod::OutsideTap => rules.confidence.outside_tap,
            PressureTestMethod::SingleTap => rules.confidence.single_tap,
            PressureTestMethod::Unknown => 0.0,
        };
        tally.shift_all(confidence * rules.confidence.scale);

        tally.finish()
    }
}

/// Pick the group matching the current system: vented regular, then
/// unvented/system, then combi
fn like_for_like(input: &SurveyInput, [vented, unvented, combi]: [Deltas; 3]) -> Option<Deltas> {
    if input.is_vented_regular() {
        Some(vented)
    } else if input.is_unvented_system() {
        Some(unvented)
    } else if input.existing_system == ExistingSystem::Combi {
        Some(combi)
    } else {
        None
    }
}

/// Score a survey with the canonical rule set
pub fn score(input: &SurveyInput) -> ArchetypeScores {
    Scorer::default().score(input)
}
