//! The boundary to whatever turns raw inputs into a coherence result.

mod gct;

pub use gct::{GctCoherenceSource, GctParams};

use anyhow::Result;

use crate::models::{CoherenceResult, CoherenceVariables};

/// Produces one [`CoherenceResult`] per sample.
///
/// An `Err` means the sample never reaches the engine; callers decide whether
/// to retry.
pub trait CoherenceSource {
    fn evaluate(&mut self, variables: &CoherenceVariables) -> Result<CoherenceResult>;
}

impl<F> CoherenceSource for F
where
    F: FnMut(&CoherenceVariables) -> Result<CoherenceResult>,
{
    fn evaluate(&mut self, variables: &CoherenceVariables) -> Result<CoherenceResult> {
        self(variables)
    }
}
