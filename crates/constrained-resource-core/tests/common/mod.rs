//! A scripted `Resource` used to drive the end-to-end scenarios against a
//! known, deterministic sequence of evaluation outcomes.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use constrained_resource_core::{calculate_result, CoreError, Evaluation, Request, Resource, Score};

/// One call's worth of scripted outcomes: a batch of evaluations (each
/// either successful or not) plus whether a continuation follows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub outcomes: Vec<bool>,
    pub has_continuation: bool,
}

impl ScriptEntry {
    pub fn one_success() -> Self {
        ScriptEntry {
            outcomes: vec![true],
            has_continuation: false,
        }
    }
}

/// A `Resource` that consumes a fixed script of evaluation batches, one per
/// call to `evaluate` (continuation calls included), independent of which
/// Request is being evaluated. `apply` produces a new instance with an
/// incremented `generation`, so distinct successor Resources are
/// distinguishable by identity.
#[derive(Clone, Debug)]
pub struct ScriptedResource {
    script: Arc<Vec<ScriptEntry>>,
    cursor: Arc<AtomicUsize>,
    generation: u64,
}

impl PartialEq for ScriptedResource {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.cursor.load(Ordering::SeqCst) == other.cursor.load(Ordering::SeqCst)
            && *self.script == *other.script
    }
}

/// `AtomicUsize` has no serde impl, so `ScriptedResource` serializes through
/// a plain-field mirror rather than deriving directly.
#[derive(Serialize, Deserialize)]
struct ScriptedResourceRepr {
    script: Arc<Vec<ScriptEntry>>,
    cursor: usize,
    generation: u64,
}

impl Serialize for ScriptedResource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ScriptedResourceRepr {
            script: self.script.clone(),
            cursor: self.cursor.load(Ordering::SeqCst),
            generation: self.generation,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScriptedResource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ScriptedResourceRepr::deserialize(deserializer)?;
        Ok(ScriptedResource {
            script: repr.script,
            cursor: Arc::new(AtomicUsize::new(repr.cursor)),
            generation: repr.generation,
        })
    }
}

static NEXT_APPLY_STATE: AtomicU64 = AtomicU64::new(1);

impl ScriptedResource {
    pub fn new(script: Vec<ScriptEntry>) -> Self {
        ScriptedResource {
            script: Arc::new(script),
            cursor: Arc::new(AtomicUsize::new(0)),
            generation: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Resource for ScriptedResource {
    type ApplyState = u64;
    type ContinuationState = u64;
    type Score = constrained_resource_core::LinearScore;

    fn evaluate(
        &self,
        request: &Request<Self>,
        max_n: usize,
        _continuation: Option<&u64>,
    ) -> Result<(Vec<Evaluation<Self>>, Option<u64>), CoreError> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .script
            .get(index)
            .unwrap_or_else(|| panic!("scripted resource ran out of entries at call {index}"));
        assert!(
            entry.outcomes.len() <= max_n,
            "test script entry {index} exceeds max_n={max_n}"
        );

        let evaluations = entry
            .outcomes
            .iter()
            .map(|&successful| {
                let mut result = calculate_result(request, self);
                result.successful = successful;
                Evaluation {
                    apply_state: successful.then(|| NEXT_APPLY_STATE.fetch_add(1, Ordering::SeqCst)),
                    result,
                }
            })
            .collect();

        let continuation = entry.has_continuation.then_some(index as u64 + 1);
        Ok((evaluations, continuation))
    }

    fn apply(&self, _apply_state: &u64) -> Self {
        ScriptedResource {
            script: self.script.clone(),
            cursor: Arc::new(AtomicUsize::new(self.cursor.load(Ordering::SeqCst))),
            generation: self.generation + 1,
        }
    }
}

pub fn request(name: &str) -> Arc<Request<ScriptedResource>> {
    Arc::new(Request::new(name, None, None, None).unwrap())
}

pub fn initial_score() -> constrained_resource_core::LinearScore {
    constrained_resource_core::LinearScore::initial()
}
