use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Heating/hot-water system configurations the advisor may recommend.
///
/// This is a closed vocabulary: nothing outside these five titles is ever
/// returned to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    #[serde(rename = "Regular (open vented)")]
    RegularVented,
    #[serde(rename = "System + Unvented Cylinder")]
    SystemUnvented,
    #[serde(rename = "System + Mixergy (unvented)")]
    SystemMixergyUnvented,
    #[serde(rename = "Regular + Mixergy (vented)")]
    RegularMixergyVented,
    #[serde(rename = "Combi")]
    Combi,
}

impl Archetype {
    pub const ALL: [Archetype; 5] = [
        Archetype::RegularVented,
        Archetype::SystemUnvented,
        Archetype::SystemMixergyUnvented,
        Archetype::RegularMixergyVented,
        Archetype::Combi,
    ];

    /// Display title, identical to the wire representation
    pub fn title(self) -> &'static str {
        match self {
            Archetype::RegularVented => "Regular (open vented)",
            Archetype::SystemUnvented => "System + Unvented Cylinder",
            Archetype::SystemMixergyUnvented => "System + Mixergy (unvented)",
            Archetype::RegularMixergyVented => "Regular + Mixergy (vented)",
            Archetype::Combi => "Combi",
        }
    }

    /// Exact title lookup, no repair
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.title() == title)
    }

    pub fn titles() -> Vec<&'static str> {
        Self::ALL.iter().map(|a| a.title()).collect()
    }

    /// Mixergy cylinders need a dedicated 16 A circuit
    pub fn is_mixergy(self) -> bool {
        matches!(
            self,
            Archetype::SystemMixergyUnvented | Archetype::RegularMixergyVented
        )
    }

    /// Archetypes that cannot be installed without room for a cylinder
    pub fn needs_cylinder(self) -> bool {
        matches!(
            self,
            Archetype::SystemUnvented
                | Archetype::SystemMixergyUnvented
                | Archetype::RegularMixergyVented
        )
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How the flow/pressure figures were measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureTestMethod {
    SingleTap,
    TwoTap,
    OutsideTap,
    Unknown,
}

impl PressureTestMethod {
    pub fn from_token(token: &str) -> Self {
        match token {
            "single_tap" => Self::SingleTap,
            "two_tap" => Self::TwoTap,
            "outside_tap" => Self::OutsideTap,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingSystem {
    Regular,
    System,
    Combi,
    BackBoiler,
    Unknown,
}

impl ExistingSystem {
    pub fn from_token(token: &str) -> Self {
        match token {
            "regular" => Self::Regular,
            "system" => Self::System,
            "combi" => Self::Combi,
            "back_boiler" => Self::BackBoiler,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotWater {
    Vented,
    Unvented,
    None,
    Unknown,
}

impl HotWater {
    pub fn from_token(token: &str) -> Self {
        match token {
            "vented" => Self::Vented,
            "unvented" => Self::Unvented,
            "none" => Self::None,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionTolerance {
    Low,
    Medium,
    High,
}

impl DisruptionTolerance {
    /// Anything unrecognised is treated as "medium", which carries no adjustment
    pub fn from_token(token: &str) -> Self {
        match token {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CylinderSpace {
    None,
    Tight,
    Ample,
}

impl CylinderSpace {
    pub fn from_token(token: &str) -> Self {
        match token {
            "none" => Self::None,
            "tight" => Self::Tight,
            _ => Self::Ample,
        }
    }
}

/// Household make-up, reduced from the free-form occupancy token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Single,
    TwoAlways,
    /// Families, three or more adults, or regular guests
    HighDemand,
    Unspecified,
}

const HIGH_DEMAND_TOKENS: [&str; 5] = [
    "family",
    "guests",
    "two_to_three",
    "two_plus_guests",
    "family4plus",
];

impl Occupancy {
    pub fn from_token(token: &str) -> Self {
        match token {
            "single" => Self::Single,
            "two_always" => Self::TwoAlways,
            t if HIGH_DEMAND_TOKENS.iter().any(|needle| t.contains(needle)) => Self::HighDemand,
            _ => Self::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    PostRetirement,
    Other,
}

impl Persona {
    pub fn from_token(token: &str) -> Self {
        if token.contains("post_retirement") {
            Self::PostRetirement
        } else {
            Self::Other
        }
    }
}

/// Normalized survey answers for a single request
///
/// Built by [`crate::core::normalize_survey`]; every field always holds a
/// usable value. The free-text fields are kept alongside their derived
/// enumerations so they can be passed to the advisor verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyInput {
    pub flow_lpm: f64,
    pub standing_pressure_bar: f64,
    /// `None` when no figure was given or the figure was zero
    pub working_pressure_bar: Option<f64>,
    pub working_pressure_description: String,
    pub pressure_test_method: PressureTestMethod,
    pub existing_system: ExistingSystem,
    pub hot_water: HotWater,
    pub bathrooms: u32,
    pub occupancy: Occupancy,
    pub occupancy_text: String,
    pub disruption_tolerance: DisruptionTolerance,
    pub space_for_cylinder: CylinderSpace,
    pub electrics_16a: bool,
    /// The answer as given, e.g. "unsure"
    pub electrics_16a_text: String,
    pub persona: Persona,
    pub persona_text: String,
    pub wants_combi: bool,
    pub additional_info: String,
}

impl SurveyInput {
    /// Regular boiler on a vented cylinder, including vented back boilers
    pub fn is_vented_regular(&self) -> bool {
        self.existing_system == ExistingSystem::Regular
            || (self.existing_system == ExistingSystem::BackBoiler
                && self.hot_water == HotWater::Vented)
    }

    /// System boiler or any existing unvented cylinder
    pub fn is_unvented_system(&self) -> bool {
        self.existing_system == ExistingSystem::System || self.hot_water == HotWater::Unvented
    }
}

impl Default for SurveyInput {
    fn default() -> Self {
        Self {
            flow_lpm: 0.0,
            standing_pressure_bar: 0.0,
            working_pressure_bar: None,
            working_pressure_description: String::new(),
            pressure_test_method: PressureTestMethod::Unknown,
            existing_system: ExistingSystem::Unknown,
            hot_water: HotWater::Unknown,
            bathrooms: 1,
            occupancy: Occupancy::Unspecified,
            occupancy_text: String::new(),
            disruption_tolerance: DisruptionTolerance::Medium,
            space_for_cylinder: CylinderSpace::Ample,
            electrics_16a: false,
            electrics_16a_text: String::new(),
            persona: Persona::Other,
            persona_text: String::new(),
            wants_combi: false,
            additional_info: String::new(),
        }
    }
}

/// Deterministic baseline: one score in `[0, 100]` per archetype
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArchetypeScores {
    scores: BTreeMap<Archetype, u8>,
    #[serde(skip)]
    disqualified: BTreeSet<Archetype>,
}

impl ArchetypeScores {
    pub fn new(scores: BTreeMap<Archetype, u8>, disqualified: BTreeSet<Archetype>) -> Self {
        Self {
            scores,
            disqualified,
        }
    }

    pub fn get(&self, archetype: Archetype) -> u8 {
        self.scores.get(&archetype).copied().unwrap_or(0)
    }

    /// Ruled out by a hard physical constraint; pinned at zero
    pub fn is_disqualified(&self, archetype: Archetype) -> bool {
        self.disqualified.contains(&archetype)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Archetype, u8)> + '_ {
        self.scores.iter().map(|(a, s)| (*a, *s))
    }

    /// Archetypes by descending score; ties keep the vocabulary order
    pub fn ranked(&self) -> Vec<(Archetype, u8)> {
        let mut ranked: Vec<(Archetype, u8)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn leader(&self) -> Option<(Archetype, u8)> {
        self.ranked().into_iter().next()
    }
}

/// A single ranked suggestion returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "title")]
    pub archetype: Archetype,
    pub reason: String,
    #[serde(rename = "match")]
    pub match_score: u8,
}
