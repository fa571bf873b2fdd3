use std::fmt;

use serde::{Deserialize, Serialize};

use crate::request::Request;
use crate::resource::Resource;

/// A predicate evaluated against a `Request` and the `Resource` it is being
/// matched against, producing a boolean outcome plus the metadata a `Score`
/// might want (its `name`).
///
/// Conditions are shared, reference-counted, immutable values; the same
/// `Condition` may be attached to many Requests or Resources at once.
pub trait Condition<R: Resource>: fmt::Debug + Send + Sync {
    /// A short, stable name identifying this condition in `ConditionResult`s.
    fn name(&self) -> &str;

    /// Evaluates this condition for `request` against `resource`.
    fn evaluate(&self, request: &Request<R>, resource: &R) -> bool;
}

/// The outcome of evaluating one `Condition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionResult {
    /// The name of the condition that produced this result.
    pub condition_name: String,
    /// Whether the condition was satisfied.
    pub successful: bool,
}

/// The full outcome of evaluating a Request against a Resource: the three
/// condition-result groups plus the overall success flag.
///
/// `successful` is true iff every applicability result and every
/// requirement result is successful; preference results never gate success,
/// they only feed into `Score`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Results of applicability conditions (gate whether the Request even applies).
    pub applicability: Vec<ConditionResult>,
    /// Results of requirement conditions (hard constraints).
    pub requirement: Vec<ConditionResult>,
    /// Results of preference conditions (soft, score-only).
    pub preference: Vec<ConditionResult>,
    /// Whether this evaluation counts as successful overall.
    pub successful: bool,
}

/// Default helper combining a Request's and a Resource's own condition
/// lists into one `EvaluationResult`.
///
/// Applicability is always computed, walking the Request's applicability
/// conditions then the Resource's. Requirement and preference are computed,
/// in the same Request-then-Resource order, only if every applicability
/// result was successful; otherwise they are left empty (the short-circuit
/// rule `Resource` implementations are expected to honor when they compute
/// results themselves instead of using this helper).
pub fn calculate_result<R: Resource>(request: &Request<R>, resource: &R) -> EvaluationResult {
    let applicability = evaluate_all(request.applicability(), request, resource)
        .chain(evaluate_all(resource.applicability(), request, resource))
        .collect::<Vec<_>>();

    let applicability_successful = applicability.iter().all(|c| c.successful);
    if !applicability_successful {
        return EvaluationResult {
            applicability,
            requirement: Vec::new(),
            preference: Vec::new(),
            successful: false,
        };
    }

    let requirement = evaluate_all(request.requirement(), request, resource)
        .chain(evaluate_all(resource.requirement(), request, resource))
        .collect::<Vec<_>>();
    let preference = evaluate_all(request.preference(), request, resource)
        .chain(evaluate_all(resource.preference(), request, resource))
        .collect::<Vec<_>>();
    let requirement_successful = requirement.iter().all(|c| c.successful);

    EvaluationResult {
        applicability,
        requirement,
        preference,
        successful: requirement_successful,
    }
}

fn evaluate_all<'a, R: Resource>(
    conditions: &'a [std::sync::Arc<dyn Condition<R>>],
    request: &'a Request<R>,
    resource: &'a R,
) -> impl Iterator<Item = ConditionResult> + 'a {
    conditions.iter().map(move |condition| ConditionResult {
        condition_name: condition.name().to_string(),
        successful: condition.evaluate(request, resource),
    })
}
