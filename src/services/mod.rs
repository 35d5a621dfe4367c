// Service exports
pub mod advisor;
pub mod openai;

pub use advisor::{AdvisorError, AdvisoryService};
pub use openai::OpenAiAdvisor;
