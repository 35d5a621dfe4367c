use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use crate::core::{
    normalize::normalize_survey,
    prompt::build_advisory_request,
    sanitizer::{Sanitizer, SanitizerPolicy},
    scoring::Scorer,
};
use crate::models::{ArchetypeScores, Recommendation, SurveyInput};
use crate::services::{AdvisorError, AdvisoryService};

/// Errors surfaced to the caller of a recommendation request
///
/// Advisor data-shape problems never appear here; they are repaired.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Advisor(#[from] AdvisorError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result of one recommendation request
#[derive(Debug, Clone)]
pub struct RecommendOutcome {
    pub input: SurveyInput,
    pub baseline: ArchetypeScores,
    pub recommendations: Vec<Recommendation>,
}

/// Request orchestrator: normalize, score, consult the advisor, sanitize
pub struct Recommender {
    scorer: Scorer,
    sanitizer: Sanitizer,
    advisor: Arc<dyn AdvisoryService>,
}

impl Recommender {
    pub fn new(scorer: Scorer, policy: SanitizerPolicy, advisor: Arc<dyn AdvisoryService>) -> Self {
        Self {
            scorer,
            sanitizer: Sanitizer::new(policy),
            advisor,
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn policy(&self) -> &SanitizerPolicy {
        self.sanitizer.policy()
    }

    /// Deterministic baseline only; never touches the advisor
    pub fn baseline(&self, raw: &Value) -> (SurveyInput, ArchetypeScores) {
        let input = normalize_survey(raw);
        let scores = self.scorer.score(&input);
        (input, scores)
    }

    /// Full pipeline for one survey submission
    pub async fn recommend(&self, raw: &Value) -> Result<RecommendOutcome, RecommendError> {
        self.advisor.ensure_configured()?;

        let (input, baseline) = self.baseline(raw);
        if let Some((leader, score)) = baseline.leader() {
            tracing::debug!("Baseline leader: {} ({})", leader, score);
        }

        let request =
            build_advisory_request(&input, &baseline, &self.scorer.rules().mains, self.policy());
        let content = self.advisor.advise(&request).await?;

        let reply = self.sanitizer.sanitize_reply(&content, &input, &baseline);
        if reply.unparseable {
            tracing::warn!("Advisor reply was not usable, falling back to rule scores");
        }
        tracing::info!(
            "Sanitized advisor reply: {} items, {} titles repaired, {} duplicates dropped, {} backfilled",
            reply.advisor_items,
            reply.repaired_titles,
            reply.duplicates_dropped,
            reply.backfilled
        );

        Ok(RecommendOutcome {
            input,
            baseline,
            recommendations: reply.recommendations,
        })
    }

    /// Run [`Recommender::recommend`] on its own task so a panic inside the
    /// pipeline becomes an error response instead of taking the worker down
    pub async fn recommend_isolated(
        self: Arc<Self>,
        raw: Value,
    ) -> Result<RecommendOutcome, RecommendError> {
        let task = tokio::spawn(async move { self.recommend(&raw).await });

        match task.await {
            Ok(result) => result,
            Err(join_error) => Err(RecommendError::Internal(panic_message(join_error))),
        }
    }
}

fn panic_message(error: tokio::task::JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }

    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "recommendation task panicked".to_string()
    }
}
