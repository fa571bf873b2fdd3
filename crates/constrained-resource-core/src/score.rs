use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::condition::EvaluationResult;

/// A cumulative path score.
///
/// The engine treats `Score` as an opaque algebraic object: it never
/// inspects a score beyond combining and copying it. The combine algebra
/// (how an `EvaluationResult` folds into a running total) is entirely up
/// to the implementation; the engine only relies on [`Score::initial`] and
/// [`Score::combine`] being consistent and on `Score` being `Clone`.
pub trait Score:
    Clone + fmt::Debug + fmt::Display + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The score of a node with no evaluations applied yet (the root).
    fn initial() -> Self;

    /// Folds one evaluation's result into `previous`, producing the score of
    /// the child that evaluation produced. `at_last_request` is true when the
    /// evaluated request is the last one of its group, which some scoring
    /// algebras use to apply end-of-group weighting.
    fn combine(previous: &Self, result: &EvaluationResult, at_last_request: bool) -> Self;
}

/// A reference `Score` that counts successful requirements against failed
/// ones and sums preference condition counts as a tie-break weight.
///
/// This is not prescribed by the engine; it exists for tests and the demo
/// binary, where a concrete, inspectable algebra is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct LinearScore {
    /// Count of requests whose evaluation succeeded.
    pub successes: i64,
    /// Count of requests whose evaluation failed.
    pub failures: i64,
    /// Running total of satisfied preference conditions.
    pub preference_weight: i64,
}

impl Score for LinearScore {
    fn initial() -> Self {
        LinearScore {
            successes: 0,
            failures: 0,
            preference_weight: 0,
        }
    }

    fn combine(previous: &Self, result: &EvaluationResult, _at_last_request: bool) -> Self {
        let satisfied_preferences = result.preference.iter().filter(|c| c.successful).count() as i64;
        LinearScore {
            successes: previous.successes + i64::from(result.successful),
            failures: previous.failures + i64::from(!result.successful),
            preference_weight: previous.preference_weight + satisfied_preferences,
        }
    }
}

impl fmt::Display for LinearScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinearScore({}/{},pref={})",
            self.successes, self.failures, self.preference_weight
        )
    }
}
