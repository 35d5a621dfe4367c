//! Survey Brain - heating and hot-water recommendations for household surveys
//!
//! A deterministic rule scorer ranks five system archetypes from a survey.
//! An external advisor may refine that ranking within fixed bounds; its reply
//! is always repaired and constrained before anything is returned.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{normalize_survey, render_cards, score, Recommender, Sanitizer, SanitizerPolicy, Scorer};
pub use crate::models::{Archetype, ArchetypeScores, Recommendation, SurveyInput};
