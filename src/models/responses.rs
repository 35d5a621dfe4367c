use serde::{Deserialize, Serialize};
use crate::models::domain::{Archetype, ArchetypeScores, Recommendation};

/// Response for the recommend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

/// Response for the baseline score endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub rules_version: &'static str,
    pub scores: ArchetypeScores,
    pub ranked: Vec<RankedScore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedScore {
    pub title: Archetype,
    #[serde(rename = "match")]
    pub match_score: u8,
}

impl ScoreResponse {
    pub fn new(rules_version: &'static str, scores: ArchetypeScores) -> Self {
        let ranked = scores
            .ranked()
            .into_iter()
            .map(|(title, match_score)| RankedScore { title, match_score })
            .collect();

        Self {
            rules_version,
            scores,
            ranked,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
