// Core algorithm exports
pub mod cards;
pub mod normalize;
pub mod prompt;
pub mod recommender;
pub mod rules;
pub mod sanitizer;
pub mod scoring;

pub use cards::render_cards;
pub use normalize::{normalize_survey, parse_working_bar};
pub use prompt::build_advisory_request;
pub use recommender::{RecommendError, RecommendOutcome, Recommender};
pub use rules::{RuleSet, CANONICAL_RULES};
pub use sanitizer::{fix_title, SanitizedReply, Sanitizer, SanitizerPolicy};
pub use scoring::{assess_mains, score, MainsAssessment, Scorer};
