use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use crate::models::advisory::parse_advisor_reply;
use crate::models::{Archetype, ArchetypeScores, RawRecommendation, Recommendation, SurveyInput};

pub const RULE_SCORE_REASON: &str = "Included based on rule score.";
pub const DEFAULT_REASON: &str = "Evidence-based option.";
pub const SIXTEEN_AMP_DISCLOSURE: &str = "Requires dedicated 16 A RCD/MCB; higher install cost.";
pub const WEAK_MAINS_NOTE: &str =
    "Performance depends on available mains; vented setup remains reliable.";

/// Below this flow a vented Mixergy carries the performance caveat
const WEAK_MAINS_FLOW_LPM: f64 = 10.0;

static MENTIONS_CIRCUIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b16\s*a\b|\brcd\b|\bmcb\b").unwrap());

static MENTIONS_PERFORMANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)performance").unwrap());

/// Limits the sanitizer holds the advisor to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizerPolicy {
    /// Exactly this many recommendations are returned
    pub result_count: usize,
    /// Largest move away from the baseline score
    pub adjust_limit: u8,
    /// Deducted from Mixergy archetypes when the 16 A circuit is missing
    pub mixergy_penalty: u8,
}

impl Default for SanitizerPolicy {
    fn default() -> Self {
        Self {
            result_count: 4,
            adjust_limit: 10,
            mixergy_penalty: 10,
        }
    }
}

/// Sanitized recommendations plus counters for logging
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedReply {
    pub recommendations: Vec<Recommendation>,
    /// The reply was not a JSON object with a `recommendations` array
    pub unparseable: bool,
    pub advisor_items: usize,
    pub repaired_titles: usize,
    pub duplicates_dropped: usize,
    pub backfilled: usize,
}

/// Map any label onto the closed archetype vocabulary
///
/// Exact titles pass through; otherwise keywords decide, and anything
/// unrecognisable becomes the vented regular.
pub fn fix_title(title: &str) -> Archetype {
    if let Some(archetype) = Archetype::from_title(title) {
        return archetype;
    }

    let lower = title.to_lowercase();
    if lower.contains("mixergy") && lower.contains("regular") {
        Archetype::RegularMixergyVented
    } else if lower.contains("mixergy") {
        Archetype::SystemMixergyUnvented
    } else if lower.contains("unvented") || lower.contains("uv") {
        Archetype::SystemUnvented
    } else if lower.contains("regular") {
        Archetype::RegularVented
    } else if lower.contains("combi") {
        Archetype::Combi
    } else {
        Archetype::RegularVented
    }
}

/// Validates and repairs the advisor's output against the baseline
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
    policy: SanitizerPolicy,
}

impl Sanitizer {
    pub fn new(policy: SanitizerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SanitizerPolicy {
        &self.policy
    }

    /// Sanitize the advisor's raw message content
    pub fn sanitize_reply(
        &self,
        content: &str,
        input: &SurveyInput,
        baseline: &ArchetypeScores,
    ) -> SanitizedReply {
        match parse_advisor_reply(content) {
            Some(items) => self.sanitize(&items, input, baseline),
            None => SanitizedReply {
                unparseable: true,
                ..self.sanitize(&[], input, baseline)
            },
        }
    }

    /// Produce exactly `result_count` unique recommendations, best first
    pub fn sanitize(
        &self,
        items: &[RawRecommendation],
        input: &SurveyInput,
        baseline: &ArchetypeScores,
    ) -> SanitizedReply {
        let mut seen = HashSet::new();
        let mut recommendations = Vec::with_capacity(self.policy.result_count);
        let mut repaired_titles = 0;
        let mut duplicates_dropped = 0;

        for item in items {
            let archetype = fix_title(&item.title);
            if Archetype::from_title(&item.title).is_none() {
                repaired_titles += 1;
            }
            if !seen.insert(archetype) {
                duplicates_dropped += 1;
                continue;
            }

            let rec = Recommendation {
                archetype,
                reason: item
                    .reason
                    .clone()
                    .unwrap_or_else(|| DEFAULT_REASON.to_string()),
                match_score: self.bounded_match(archetype, item.match_score, baseline),
            };
            let rec = add_weak_mains_note(rec, input);
            recommendations.push(self.enforce_constraints(rec, input, baseline));
        }

        let mut backfilled = 0;
        for (archetype, score) in baseline.ranked() {
            if recommendations.len() >= self.policy.result_count {
                break;
            }
            if !seen.insert(archetype) {
                continue;
            }

            let rec = Recommendation {
                archetype,
                reason: RULE_SCORE_REASON.to_string(),
                match_score: score,
            };
            recommendations.push(self.enforce_constraints(rec, input, baseline));
            backfilled += 1;
        }

        // Stable: ties keep advisor entries ahead of backfill
        recommendations.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        recommendations.truncate(self.policy.result_count);

        SanitizedReply {
            recommendations,
            unparseable: false,
            advisor_items: items.len(),
            repaired_titles,
            duplicates_dropped,
            backfilled,
        }
    }

    /// The advisor's figure, held within `adjust_limit` of the baseline
    fn bounded_match(
        &self,
        archetype: Archetype,
        proposed: Option<f64>,
        baseline: &ArchetypeScores,
    ) -> u8 {
        if baseline.is_disqualified(archetype) {
            return 0;
        }

        let base = f64::from(baseline.get(archetype));
        let limit = f64::from(self.policy.adjust_limit);
        let proposed = proposed.map(f64::round).unwrap_or(base);
        let low = (base - limit).max(0.0);
        let high = (base + limit).min(100.0);

        proposed.clamp(low, high) as u8
    }

    /// Electrics rule the advisor cannot override; applies to backfill too
    fn enforce_constraints(
        &self,
        mut rec: Recommendation,
        input: &SurveyInput,
        baseline: &ArchetypeScores,
    ) -> Recommendation {
        if rec.archetype.is_mixergy() && !input.electrics_16a {
            if !MENTIONS_CIRCUIT.is_match(&rec.reason) {
                append_sentence(&mut rec.reason, SIXTEEN_AMP_DISCLOSURE);
            }
            rec.match_score = rec
                .match_score
                .saturating_sub(self.policy.mixergy_penalty)
                .min(baseline.get(rec.archetype));
        }

        rec
    }
}

/// Caveat on a vented Mixergy the advisor chose; backfilled entries keep
/// the plain rule-score reason
fn add_weak_mains_note(mut rec: Recommendation, input: &SurveyInput) -> Recommendation {
    let weak_mains =
        input.flow_lpm < WEAK_MAINS_FLOW_LPM || input.working_pressure_bar.is_none();
    if rec.archetype == Archetype::RegularMixergyVented
        && weak_mains
        && !MENTIONS_PERFORMANCE.is_match(&rec.reason)
    {
        append_sentence(&mut rec.reason, WEAK_MAINS_NOTE);
    }
    rec
}

fn append_sentence(reason: &mut String, sentence: &str) {
    if !reason.is_empty() {
        reason.push(' ');
    }
    reason.push_str(sentence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::score;

    fn raw(title: &str, reason: &str, match_score: Option<f64>) -> RawRecommendation {
        RawRecommendation {
            title: title.to_string(),
            reason: Some(reason.to_string()),
            match_score,
        }
    }

    fn wired_survey() -> SurveyInput {
        SurveyInput {
            flow_lpm: 28.0,
            working_pressure_bar: Some(2.0),
            electrics_16a: true,
            ..SurveyInput::default()
        }
    }

    #[test]
    fn test_fix_title_keywords() {
        assert_eq!(fix_title("Combi"), Archetype::Combi);
        assert_eq!(fix_title("Regular Mixergy"), Archetype::RegularMixergyVented);
        assert_eq!(fix_title("mixergy cylinder"), Archetype::SystemMixergyUnvented);
        assert_eq!(fix_title("Unvented cylinder"), Archetype::SystemUnvented);
        assert_eq!(fix_title("System + UV"), Archetype::SystemUnvented);
        assert_eq!(fix_title("regular boiler"), Archetype::RegularVented);
        assert_eq!(fix_title("COMBI boiler"), Archetype::Combi);
        assert_eq!(fix_title("Air source heat pump"), Archetype::RegularVented);
        assert_eq!(fix_title(""), Archetype::RegularVented);
    }

    #[test]
    fn test_advisor_adjustment_is_bounded() {
        let input = wired_survey();
        let baseline = score(&input);
        let sanitizer = Sanitizer::default();

        let reply = sanitizer.sanitize(
            &[
                raw("Combi", "Strong mains.", Some(100.0)),
                raw("Regular (open vented)", "Like for like.", Some(0.0)),
            ],
            &input,
            &baseline,
        );

        let combi = reply
            .recommendations
            .iter()
            .find(|r| r.archetype == Archetype::Combi)
            .unwrap();
        assert_eq!(combi.match_score, baseline.get(Archetype::Combi) + 10);

        let regular = reply
            .recommendations
            .iter()
            .find(|r| r.archetype == Archetype::RegularVented)
            .unwrap();
        assert_eq!(regular.match_score, baseline.get(Archetype::RegularVented) - 10);
    }

    #[test]
    fn test_missing_match_uses_baseline() {
        let input = wired_survey();
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize(
            &[RawRecommendation {
                title: "Combi".to_string(),
                reason: None,
                match_score: None,
            }],
            &input,
            &baseline,
        );

        let combi = reply
            .recommendations
            .iter()
            .find(|r| r.archetype == Archetype::Combi)
            .unwrap();
        assert_eq!(combi.match_score, baseline.get(Archetype::Combi));
        assert_eq!(combi.reason, DEFAULT_REASON);
    }

    #[test]
    fn test_duplicates_and_backfill() {
        let input = wired_survey();
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize(
            &[
                raw("Combi", "first", Some(50.0)),
                raw("combi boiler", "second", Some(60.0)),
            ],
            &input,
            &baseline,
        );

        assert_eq!(reply.recommendations.len(), 4);
        assert_eq!(reply.duplicates_dropped, 1);
        assert_eq!(reply.repaired_titles, 1);
        assert_eq!(reply.backfilled, 3);

        let titles: HashSet<_> = reply.recommendations.iter().map(|r| r.archetype).collect();
        assert_eq!(titles.len(), 4);
        assert!(reply
            .recommendations
            .windows(2)
            .all(|w| w[0].match_score >= w[1].match_score));
    }

    #[test]
    fn test_unparseable_reply_is_fully_backfilled() {
        let input = wired_survey();
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize_reply("{not json", &input, &baseline);

        assert!(reply.unparseable);
        assert_eq!(reply.recommendations.len(), 4);
        assert!(reply
            .recommendations
            .iter()
            .all(|r| r.reason == RULE_SCORE_REASON));
    }

    #[test]
    fn test_backfill_skips_weak_mains_note() {
        // No working-pressure figure: an advisor pick would get the caveat
        let input = SurveyInput {
            flow_lpm: 20.0,
            electrics_16a: true,
            ..SurveyInput::default()
        };
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize_reply("not json at all", &input, &baseline);

        assert!(reply
            .recommendations
            .iter()
            .any(|r| r.archetype == Archetype::RegularMixergyVented));
        for rec in &reply.recommendations {
            assert_eq!(rec.reason, RULE_SCORE_REASON);
        }
    }

    #[test]
    fn test_mixergy_disclosure_without_16a() {
        let input = SurveyInput {
            electrics_16a: false,
            ..wired_survey()
        };
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize(
            &[raw("System + Mixergy (unvented)", "Great fit.", Some(100.0))],
            &input,
            &baseline,
        );

        let mixergy = reply
            .recommendations
            .iter()
            .find(|r| r.archetype == Archetype::SystemMixergyUnvented)
            .unwrap();
        assert!(mixergy.reason.contains(SIXTEEN_AMP_DISCLOSURE));
        assert!(mixergy.match_score <= baseline.get(Archetype::SystemMixergyUnvented));
    }

    #[test]
    fn test_disclosure_not_duplicated() {
        let input = SurveyInput {
            electrics_16a: false,
            ..wired_survey()
        };
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize(
            &[raw(
                "System + Mixergy (unvented)",
                "Needs a new 16A MCB.",
                Some(50.0),
            )],
            &input,
            &baseline,
        );

        let mixergy = reply
            .recommendations
            .iter()
            .find(|r| r.archetype == Archetype::SystemMixergyUnvented)
            .unwrap();
        assert_eq!(mixergy.reason, "Needs a new 16A MCB.");
    }

    #[test]
    fn test_weak_mains_note_for_vented_mixergy() {
        let input = SurveyInput {
            flow_lpm: 8.0,
            electrics_16a: true,
            ..SurveyInput::default()
        };
        let baseline = score(&input);

        let reply = Sanitizer::default().sanitize(
            &[raw("Regular + Mixergy (vented)", "Keeps the loft tank.", None)],
            &input,
            &baseline,
        );

        let vented = reply
            .recommendations
            .iter()
            .find(|r| r.archetype == Archetype::RegularMixergyVented)
            .unwrap();
        assert_eq!(
            vented.reason,
            format!("Keeps the loft tank. {}", WEAK_MAINS_NOTE)
        );
    }

    #[test]
    fn test_simplified_variant_returns_two() {
        let input = wired_survey();
        let baseline = score(&input);
        let sanitizer = Sanitizer::new(SanitizerPolicy {
            result_count: 2,
            ..SanitizerPolicy::default()
        });

        let reply = sanitizer.sanitize_reply(r#"{"recommendations": []}"#, &input, &baseline);

        assert!(!reply.unparseable);
        assert_eq!(reply.recommendations.len(), 2);
        let ranked = baseline.ranked();
        assert_eq!(reply.recommendations[0].archetype, ranked[0].0);
        assert_eq!(reply.recommendations[1].archetype, ranked[1].0);
    }
}
