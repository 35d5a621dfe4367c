use serde::Serialize;
use serde_json::Value;
use crate::models::domain::{
    ArchetypeScores, CylinderSpace, DisruptionTolerance, ExistingSystem, HotWater,
    PressureTestMethod,
};

/// Everything the advisory service needs for one refinement call
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryRequest {
    /// Fixed instruction block: vocabulary, water-test rules, output schema
    pub instructions: String,
    /// Data block, sent as a JSON document
    pub payload: AdvisoryPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryPayload {
    pub inputs: AdvisoryInputs,
    pub initial_scores: ArchetypeScores,
    pub allowed_titles: Vec<&'static str>,
    /// Largest change the advisor may make to any single score
    pub adjust_limit: u8,
    pub result_count: usize,
}

/// Normalized inputs as presented to the advisor
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryInputs {
    pub flow_lpm: f64,
    pub flow_for_combi_eff_lpm: f64,
    pub standing_pressure_bar: f64,
    pub working_pressure_bar: Option<f64>,
    pub pressure_test_method: PressureTestMethod,
    pub bathrooms: u32,
    pub occupancy: String,
    pub disruption_tolerance: DisruptionTolerance,
    pub space_for_cylinder: CylinderSpace,
    pub existing_system: ExistingSystem,
    pub hot_water: HotWater,
    /// "yes", the surveyor's own answer, or "no" when unanswered
    pub electrics_16a: String,
    pub persona: String,
    pub additional_info: String,
}

/// One entry of the advisor's reply, before any repair
///
/// Built leniently from arbitrary JSON: wrong types collapse to "absent".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecommendation {
    pub title: String,
    pub reason: Option<String>,
    pub match_score: Option<f64>,
}

impl RawRecommendation {
    pub fn from_value(value: &Value) -> Self {
        let title = match value.get("title") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let reason = match value.get("reason") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };

        let match_score = match value.get("match") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|m| m.is_finite());

        Self {
            title,
            reason,
            match_score,
        }
    }
}

/// Parse the advisor's message content into raw entries
///
/// Anything that is not an object with a `recommendations` array yields an
/// empty list; the sanitizer backfills from the baseline.
pub fn parse_advisor_reply(content: &str) -> Option<Vec<RawRecommendation>> {
    let value: Value = serde_json::from_str(content.trim()).ok()?;
    let items = value.get("recommendations")?.as_array()?;
    Some(items.iter().map(RawRecommendation::from_value).collect())
}
