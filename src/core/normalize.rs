use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use crate::models::{
    CylinderSpace, DisruptionTolerance, ExistingSystem, HotWater, Occupancy, Persona,
    PressureTestMethod, SurveyInput,
};

/// A decimal figure directly before "bar", e.g. "12 L/min @ 1.2 bar"
static WORKING_BAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)@?\s*([0-9]+(?:\.[0-9]+)?)\s*bar").unwrap());

static NULL: Value = Value::Null;

/// "wants a combi", "want combi", ...
static WANTS_COMBI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwants?\s+a?\s*combi\b").unwrap());

/// Build a [`SurveyInput`] from an untyped form submission
///
/// Never fails: every missing, mistyped or non-finite field falls back to
/// its default, and a non-object body yields the all-default survey.
pub fn normalize_survey(raw: &Value) -> SurveyInput {
    let field = |name: &str| raw.get(name).unwrap_or(&NULL);

    let working_pressure_description = text(field("working_pressure_desc"));
    let occupancy_text = token(field("occupancy"));
    let persona_text = token(field("persona"));
    let electrics_16a_text = token(field("electrics_16a"));
    let additional_info = text(field("additional_info"));

    SurveyInput {
        flow_lpm: number(field("flow_lpm"), 0.0),
        standing_pressure_bar: number(field("standing_pressure_bar"), 0.0),
        working_pressure_bar: parse_working_bar(&working_pressure_description),
        pressure_test_method: PressureTestMethod::from_token(&token(
            field("pressure_test_method"),
        )),
        existing_system: ExistingSystem::from_token(&token(field("existing_system"))),
        hot_water: HotWater::from_token(&token(field("hot_water"))),
        bathrooms: number(field("bathrooms"), 1.0).max(0.0).floor() as u32,
        occupancy: Occupancy::from_token(&occupancy_text),
        disruption_tolerance: DisruptionTolerance::from_token(&token(
            field("disruption_tolerance"),
        )),
        space_for_cylinder: CylinderSpace::from_token(&token(field("space_for_cylinder"))),
        electrics_16a: electrics_16a_text == "yes",
        persona: Persona::from_token(&persona_text),
        wants_combi: WANTS_COMBI.is_match(&additional_info),
        working_pressure_description,
        electrics_16a_text,
        occupancy_text,
        persona_text,
        additional_info,
    }
}

/// Extract the working pressure from free text
///
/// A missing figure and a literal zero both mean "not measured".
pub fn parse_working_bar(description: &str) -> Option<f64> {
    WORKING_BAR
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|bar| bar.is_finite() && *bar != 0.0)
}

fn number(value: &Value, default: f64) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|n| n.is_finite()).unwrap_or(default)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

fn token(value: &Value) -> String {
    text(value).trim().to_lowercase()
}
