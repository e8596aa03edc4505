//! Dog health analysis: profile and assessment models, prompt construction,
//! provider access and reply normalization.
//!
//! The entry point is [`AnalysisRelay::analyze`], which works the same way
//! whether the provider credential is held locally or by an operator relay.

pub mod credential;
pub mod error;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod relay;
pub mod retry;

pub use credential::{Credential, CredentialSource, CredentialStore, StaticCredential};
pub use error::AnalysisError;
pub use models::{AssessmentResult, HealthProfile};
pub use relay::{AnalysisRelay, Backend};
pub use retry::RetryConfig;
