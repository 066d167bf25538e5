//! Generative image providers and the fan-out orchestrator that drives them.

pub mod error;
pub mod flux;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod orchestrator;
pub mod provider;
pub mod registry;

pub use error::ProviderError;
pub use orchestrator::Orchestrator;
pub use provider::{ImageProvider, Provider};
pub use registry::{ProviderRegistry, ProviderSettings};
