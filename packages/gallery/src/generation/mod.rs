//! The generative-model capability seen by the pipeline.
//!
//! Concrete model clients live outside this crate; they implement
//! [`ImageGenerator`] and are injected into the pipeline.

mod splitter;

use async_trait::async_trait;
use thiserror::Error;

pub use splitter::{PendingImage, SplitResponse, split_fragments};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model rejected the request: {0}")]
    Rejected(String),
}

/// An input image sent alongside the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Let the model ground its answer with web search.
    pub web_search: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub images: Vec<ReferenceImage>,
    pub options: GenerationOptions,
}

/// One ordered unit of model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub candidates: Vec<Candidate>,
}

impl GenerationOutput {
    /// Fragments of the first candidate, or `None` when there is nothing to
    /// persist.
    pub fn into_first_fragments(self) -> Option<Vec<Fragment>> {
        self.candidates
            .into_iter()
            .next()
            .map(|c| c.fragments)
            .filter(|fragments| !fragments.is_empty())
    }
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest)
    -> Result<GenerationOutput, GenerationError>;
}
