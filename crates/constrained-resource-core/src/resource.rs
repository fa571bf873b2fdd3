use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::condition::{Condition, EvaluationResult};
use crate::error::CoreError;
use crate::request::Request;
use crate::score::Score;

/// One candidate outcome of applying a Request to a Resource.
///
/// `apply_state` must be present iff `result.successful` is true; the engine
/// rejects a `Resource` that violates this (see `ContractViolation::MissingApplyState`).
#[derive(Debug, Clone)]
pub struct Evaluation<R: Resource> {
    /// The condition outcome this evaluation represents.
    pub result: EvaluationResult,
    /// The opaque token `Resource::apply` needs to produce the successor
    /// Resource, present for every successful evaluation.
    pub apply_state: Option<R::ApplyState>,
}

/// The domain-supplied contract the engine consumes.
///
/// A `Resource` evaluates Requests against itself and advances, under
/// `apply`, to a new Resource. The engine never inspects a Resource's
/// internals beyond this trait; everything else about the domain (what a
/// Resource actually represents, how it scores an Evaluation) is opaque.
pub trait Resource: Sized + fmt::Debug {
    /// The token carried by a successful `Evaluation`, consumed by `apply`.
    type ApplyState: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// The token signalling that more evaluations remain for the same Request.
    type ContinuationState: Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;
    /// The cumulative path score algebra used alongside this Resource.
    type Score: Score;

    /// Evaluates `request` against `self`, returning between 1 and `max_n`
    /// evaluations. `continuation`, when present, must be a value this same
    /// Resource instance previously returned from this method; passing it
    /// back resumes evaluation of the same Request rather than starting it
    /// over. A returned `ContinuationState` signals more evaluations remain.
    fn evaluate(
        &self,
        request: &Request<Self>,
        max_n: usize,
        continuation: Option<&Self::ContinuationState>,
    ) -> Result<(Vec<Evaluation<Self>>, Option<Self::ContinuationState>), CoreError>;

    /// Advances `self` to a successor Resource given an `apply_state`
    /// produced by one of `self`'s own evaluations.
    fn apply(&self, apply_state: &Self::ApplyState) -> Self;

    /// This Resource's own applicability conditions, evaluated by
    /// [`crate::condition::calculate_result`] after the Request's. Most
    /// Resources have none.
    fn applicability(&self) -> &[Arc<dyn Condition<Self>>] {
        &[]
    }

    /// This Resource's own requirement conditions.
    fn requirement(&self) -> &[Arc<dyn Condition<Self>>] {
        &[]
    }

    /// This Resource's own preference conditions.
    fn preference(&self) -> &[Arc<dyn Condition<Self>>] {
        &[]
    }
}
