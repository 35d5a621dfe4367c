// Model exports
pub mod advisory;
pub mod domain;
pub mod responses;

pub use advisory::{AdvisoryInputs, AdvisoryPayload, AdvisoryRequest, RawRecommendation};
pub use domain::{
    Archetype, ArchetypeScores, CylinderSpace, DisruptionTolerance, ExistingSystem, HotWater,
    Occupancy, Persona, PressureTestMethod, Recommendation, SurveyInput,
};
pub use responses::{ErrorResponse, HealthResponse, RankedScore, RecommendResponse, ScoreResponse};
