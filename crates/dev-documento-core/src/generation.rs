//! Generative model trait.
//!
//! Prompt formatting and model invocation are kept separate: callers render
//! a [`PromptTemplate`](crate::prompt::PromptTemplate) to plain text, then
//! hand the text to [`Generator::invoke`]. Timeouts are applied by the
//! caller, which owns the runtime.

use async_trait::async_trait;

use crate::error::RagError;

/// Prompt → completion text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier (e.g. `"phi3:mini"`).
    fn model_name(&self) -> &str;

    /// Run one blocking completion. The output is returned unmodified.
    async fn invoke(&self, prompt: &str) -> Result<String, RagError>;
}
