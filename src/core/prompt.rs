use crate::core::rules::MainsThresholds;
use crate::core::sanitizer::SanitizerPolicy;
use crate::core::scoring::assess_mains;
use crate::models::{
    AdvisoryInputs, AdvisoryPayload, AdvisoryRequest, Archetype, ArchetypeScores, SurveyInput,
};

/// Build the instruction block for the advisor
///
/// The vocabulary, result count and adjustment bound are interpolated so
/// the text always agrees with what the sanitizer enforces.
pub fn instructions(policy: &SanitizerPolicy, mains: &MainsThresholds) -> String {
    let vocabulary = Archetype::ALL
        .iter()
        .map(|a| format!("- {}", a.title()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an experienced UK heating adviser. Choose ONLY from:\n\
{vocabulary}\n\
Never propose heat pumps or electric-only systems.\n\
\n\
Water-test rules:\n\
- Flow cup only: deduct about {cup} L/min when judging combi performance.\n\
- Combi: acceptable >= {cg_flow} L/min @ >= {cg_bar} bar (better >= {cs_flow} @ {cs_bar} bar). \
If working pressure is unknown, treat standing pressure as context only.\n\
- Unvented: acceptable >= {ua_flow} L/min @ >= {ua_bar} bar; ideal >= {ui_flow} @ >= {ui_bar} bar. \
If the cold main size is unknown, do not assume 25 mm.\n\
- Mixergy (vented): works with any pressure or flow; performance varies, say so when chosen on weak mains.\n\
- Mixergy (unvented): as unvented, plus a dedicated 16 A RCD/MCB circuit (state this and the higher cost).\n\
\n\
Other rules:\n\
- disruption_tolerance = \"low\" means a strong bias to KEEP THE SAME SYSTEM TYPE (like-for-like).\n\
- A \"post_retirement\" persona suggests lower disruption but never overrides the like-for-like rule.\n\
- Tight or no cylinder space favours a combi over stored systems.\n\
\n\
You receive the inputs and transparent initial scores (0-100). Adjust any score by at most \
+/-{limit}, then return the TOP {count} with one concise, evidence-based sentence each. \
Return STRICT JSON ONLY:\n\
{{\n  \"recommendations\": [\n    {{\"title\": \"<allowed title>\", \"reason\": \"...\", \"match\": <0-100 integer>}}\n  ]\n}}\n",
        vocabulary = vocabulary,
        cup = mains.flow_cup_offset_lpm,
        cg_flow = mains.combi_good_flow_lpm,
        cg_bar = mains.combi_good_working_bar,
        cs_flow = mains.combi_strong_flow_lpm,
        cs_bar = mains.combi_strong_working_bar,
        ua_flow = mains.unvented_acceptable_flow_lpm,
        ua_bar = mains.unvented_acceptable_working_bar,
        ui_flow = mains.unvented_ideal_flow_lpm,
        ui_bar = mains.unvented_ideal_working_bar,
        limit = policy.adjust_limit,
        count = policy.result_count,
    )
}

/// Assemble the bounded advisory request for one survey
pub fn build_advisory_request(
    input: &SurveyInput,
    baseline: &ArchetypeScores,
    mains: &MainsThresholds,
    policy: &SanitizerPolicy,
) -> AdvisoryRequest {
    let assessment = assess_mains(input, mains);

    let inputs = AdvisoryInputs {
        flow_lpm: input.flow_lpm,
        flow_for_combi_eff_lpm: assessment.combi_flow_lpm,
        standing_pressure_bar: input.standing_pressure_bar,
        working_pressure_bar: input.working_pressure_bar,
        pressure_test_method: input.pressure_test_method,
        bathrooms: input.bathrooms,
        occupancy: input.occupancy_text.clone(),
        disruption_tolerance: input.disruption_tolerance,
        space_for_cylinder: input.space_for_cylinder,
        existing_system: input.existing_system,
        hot_water: input.hot_water,
        electrics_16a: match input.electrics_16a_text.as_str() {
            _ if input.electrics_16a => "yes".to_string(),
            "" => "no".to_string(),
            answer => answer.to_string(),
        },
        persona: input.persona_text.clone(),
        additional_info: input.additional_info.clone(),
    };

    AdvisoryRequest {
        instructions: instructions(policy, mains),
        payload: AdvisoryPayload {
            inputs,
            initial_scores: baseline.clone(),
            allowed_titles: Archetype::titles(),
            adjust_limit: policy.adjust_limit,
            result_count: policy.result_count,
        },
    }
}
