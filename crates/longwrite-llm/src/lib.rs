//! Remote text generation for longwrite
//!
//! [`LlmBackend`] is a single-attempt call to a generation service.
//! [`GenerationClient`] wraps a backend with the retry policy and turns
//! failures into a [`Generation`] outcome the stages can branch on.

mod chat_backend;
mod generation;
pub(crate) mod http_client;
mod retry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use chat_backend::ChatCompletionsBackend;
pub use generation::{
    CONTENT_FILTERED_SENTINEL, EXHAUSTED_SENTINEL, Generation, GenerationClient,
    GenerationRequest,
};
pub use longwrite_utils::error::LlmError;
pub use retry::RetryPolicy;
pub use types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
