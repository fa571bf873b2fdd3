//! Minimal `Resource`/`Condition` pair shared by this crate's unit tests.

use std::sync::Arc;

use crate::condition::Condition;
use crate::error::CoreError;
use crate::request::Request;
use crate::resource::{Evaluation, Resource};
use crate::score::LinearScore;

/// A condition that always returns a fixed outcome, named for assertions.
#[derive(Debug)]
pub(crate) struct ConstantCondition {
    name: String,
    outcome: bool,
}

impl ConstantCondition {
    pub(crate) fn new(name: impl Into<String>, outcome: bool) -> Self {
        ConstantCondition {
            name: name.into(),
            outcome,
        }
    }
}

impl<R: Resource> Condition<R> for ConstantCondition {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, _request: &Request<R>, _resource: &R) -> bool {
        self.outcome
    }
}

/// A `Resource` that always accepts a Request with a single successful
/// evaluation and no continuation; `apply` is a no-op identity.
#[derive(Debug, Clone, Default)]
pub(crate) struct TestResource;

impl Resource for TestResource {
    type ApplyState = ();
    type ContinuationState = ();
    type Score = LinearScore;

    fn evaluate(
        &self,
        request: &Request<Self>,
        max_n: usize,
        _continuation: Option<&()>,
    ) -> Result<(Vec<Evaluation<Self>>, Option<()>), CoreError> {
        let _ = max_n;
        let result = crate::condition::calculate_result(request, self);
        Ok((
            vec![Evaluation {
                apply_state: Some(()),
                result,
            }],
            None,
        ))
    }

    fn apply(&self, _apply_state: &()) -> Self {
        TestResource
    }
}

#[allow(unused)]
pub(crate) fn condition(name: &str, outcome: bool) -> Arc<dyn Condition<TestResource>> {
    Arc::new(ConstantCondition::new(name, outcome))
}
