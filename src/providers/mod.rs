mod error;
mod openrouter;

pub use error::{FailureCategory, ProviderError, ProviderErrorKind};
pub use openrouter::OpenRouterProvider;
