/// Candidate-producing provider abstraction
///
/// Both upstream providers (the generative text endpoint and the structured
/// insights API) are unreliable; each degrades internally to synthetic data
/// rather than failing a request. The trait hides that difference behind a
/// uniform candidate list plus a provenance marker, so orchestration order
/// is a wiring choice rather than a code path.
use crate::{
    error::AppResult,
    models::{Category, Mode, Recommendation},
};

pub mod generative;
pub mod insights;

/// Where a candidate list actually came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Live output of the generative text provider
    Generative,
    /// Synthetic records produced after a generative failure
    GenerativeFallback,
    /// Live output of the structured insights provider
    Insights,
    /// Curated static records produced after an insights failure
    Mock,
}

impl Origin {
    /// True only for live generative output; drives the fromLLM flag
    pub fn is_generative(self) -> bool {
        self == Origin::Generative
    }

    /// True only for curated static data; drives the fromMock flag
    pub fn is_mock(self) -> bool {
        self == Origin::Mock
    }
}

/// A provider's candidate list together with its provenance
#[derive(Debug, Clone)]
pub struct CandidateSet {
    pub recommendations: Vec<Recommendation>,
    pub origin: Origin,
}

/// Trait for recommendation candidate sources
///
/// Implementations own their fallback chains: a source that cannot reach
/// its upstream returns degraded candidates with an honest [`Origin`]
/// instead of an error. Errors are reserved for faults with no recovery.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    /// Produce candidates for the user's input in the given category
    async fn candidates(
        &self,
        input: &str,
        category: Category,
        mode: Mode,
    ) -> AppResult<CandidateSet>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}
