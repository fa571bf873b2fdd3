//! A small bin-packing `Resource`: a single bin of fixed capacity, Requests
//! are named items with a size looked up from the config-supplied catalog.

use std::collections::HashMap;
use std::sync::Arc;

use constrained_resource_core::{
    ConditionResult, ContractViolation, CoreError, Evaluation, EvaluationResult, LinearScore, Request, Resource,
};

/// A bin with a fixed capacity, tracking how much of it is already used.
///
/// `evaluate` computes its own `EvaluationResult` rather than going through
/// [`constrained_resource_core::calculate_result`], since the fit check
/// depends on the bin's remaining capacity rather than on attachable
/// `Condition`s.
#[derive(Debug, Clone)]
pub struct BinResource {
    capacity: u32,
    used: u32,
    item_sizes: Arc<HashMap<String, u32>>,
}

impl BinResource {
    /// Builds an empty bin with the given `capacity`, knowing the size of
    /// each named item it might be asked to evaluate.
    pub fn new(capacity: u32, item_sizes: HashMap<String, u32>) -> Self {
        BinResource {
            capacity,
            used: 0,
            item_sizes: Arc::new(item_sizes),
        }
    }

    /// Capacity not yet consumed by an accepted item.
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.used)
    }

    /// Capacity already consumed.
    pub fn used(&self) -> u32 {
        self.used
    }
}

impl Resource for BinResource {
    type ApplyState = u32;
    type ContinuationState = ();
    type Score = LinearScore;

    fn evaluate(
        &self,
        request: &Request<Self>,
        max_n: usize,
        _continuation: Option<&()>,
    ) -> Result<(Vec<Evaluation<Self>>, Option<()>), CoreError> {
        let _ = max_n;
        let size = *self.item_sizes.get(request.name()).ok_or_else(|| {
            CoreError::from(ContractViolation::Resource(format!(
                "no known size for item '{}'",
                request.name()
            )))
        })?;
        let fits = self.remaining() >= size;

        let result = EvaluationResult {
            applicability: Vec::new(),
            requirement: vec![ConditionResult {
                condition_name: "fits_capacity".to_string(),
                successful: fits,
            }],
            preference: Vec::new(),
            successful: fits,
        };

        // An item that doesn't fit is skipped (consumes no capacity) rather
        // than stalling the walk: `apply_state` is always present, so the
        // engine always advances past this item regardless of the fit
        // outcome, which only affects the resulting score.
        let apply_state = if fits { size } else { 0 };

        Ok((
            vec![Evaluation {
                result,
                apply_state: Some(apply_state),
            }],
            None,
        ))
    }

    fn apply(&self, apply_state: &u32) -> Self {
        BinResource {
            capacity: self.capacity,
            used: self.used + apply_state,
            item_sizes: self.item_sizes.clone(),
        }
    }
}
