use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ContractViolation, CoreError, InvalidArgument};
use crate::index::Index;
use crate::permutation::{Permutation, PermutationGenerator, PermutationGeneratorFactory};
use crate::request::{Request, RequestGroup, RequestGroups};
use crate::resource::Resource;
use crate::score::Score;

/// State shared, unmodified, across an entire search subtree: the input
/// Requests and the optional permutation factory used at every group that
/// has more than one Request.
struct Initial<R: Resource> {
    request_groups: Arc<RequestGroups<R>>,
    permutation_factory: Option<Arc<dyn PermutationGeneratorFactory<R>>>,
}

/// State shared between a node and any child that re-uses the same
/// Resource (a permutation transition that has not yet consumed a Request).
struct Current<R: Resource> {
    resource: Arc<R>,
    request_offset: usize,
}

/// The exclusive, per-node phase of expansion.
enum Phase<R: Resource> {
    Initialized,
    ActivePermutations {
        generator: Box<dyn PermutationGenerator<R>>,
        next_child_ordinal: u64,
    },
    InPermutation {
        permuted_requests: Permutation<R>,
    },
    Continuation {
        continuation_state: R::ContinuationState,
        next_child_ordinal: u64,
    },
    Completed,
}

impl<R: Resource> fmt::Debug for Phase<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initialized => write!(f, "Initialized"),
            Phase::ActivePermutations { next_child_ordinal, .. } => f
                .debug_struct("ActivePermutations")
                .field("next_child_ordinal", next_child_ordinal)
                .finish(),
            Phase::InPermutation { permuted_requests } => f
                .debug_struct("InPermutation")
                .field("permuted_requests", permuted_requests)
                .finish(),
            Phase::Continuation {
                continuation_state,
                next_child_ordinal,
            } => f
                .debug_struct("Continuation")
                .field("continuation_state", continuation_state)
                .field("next_child_ordinal", next_child_ordinal)
                .finish(),
            Phase::Completed => write!(f, "Completed"),
        }
    }
}

impl<R: Resource> PartialEq for Phase<R> {
    /// `ActivePermutations` compares only `next_child_ordinal`: the retained
    /// generator is a live, stateful trait object with no general notion of
    /// equality.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Phase::Initialized, Phase::Initialized) => true,
            (Phase::Completed, Phase::Completed) => true,
            (Phase::InPermutation { permuted_requests: a }, Phase::InPermutation { permuted_requests: b }) => a == b,
            (
                Phase::ActivePermutations { next_child_ordinal: a, .. },
                Phase::ActivePermutations { next_child_ordinal: b, .. },
            ) => a == b,
            (
                Phase::Continuation { continuation_state: a, next_child_ordinal: n1 },
                Phase::Continuation { continuation_state: b, next_child_ordinal: n2 },
            ) => a == b && n1 == n2,
            _ => false,
        }
    }
}

/// The minimal inputs required to materialize a `WorkingSystem` child:
/// which `current` it starts from, whether an evaluation advances the
/// Resource, and whether the child resumes inside a permutation.
struct Transition<R: Resource> {
    previous_current: Arc<Current<R>>,
    apply_state: Option<R::ApplyState>,
    permuted_requests: Option<Permutation<R>>,
}

impl<R: Resource> Clone for Transition<R> {
    fn clone(&self) -> Self {
        Transition {
            previous_current: self.previous_current.clone(),
            apply_state: self.apply_state.clone(),
            permuted_requests: self.permuted_requests.clone(),
        }
    }
}

/// A node in the search tree representing a partial assignment: some
/// Requests have been evaluated against the Resource, some remain.
pub struct WorkingSystem<R: Resource> {
    initial: Arc<Initial<R>>,
    current: Arc<Current<R>>,
    phase: Phase<R>,
    score: R::Score,
    index: Index,
    group_index: usize,
    request_index_in_group: usize,
    at_last_group: bool,
    at_last_request_in_group: bool,
}

/// A terminal node: every Request across every group has been evaluated.
pub struct ResultSystem<R: Resource> {
    /// The Resource resulting from the final accepted evaluation.
    pub resource: Arc<R>,
    /// The full input, carried through for inspection.
    pub requests: Arc<RequestGroups<R>>,
    /// This node's cumulative score.
    pub score: R::Score,
    /// This node's path identity.
    pub index: Index,
}

/// Deferred constructor for a `WorkingSystem` child; committing runs
/// `Resource::apply` and produces the materialized node.
pub struct CalculatedWorkingSystem<R: Resource> {
    initial: Arc<Initial<R>>,
    transition: Transition<R>,
    score: R::Score,
    index: Index,
}

/// Deferred constructor for a `ResultSystem`; committing runs
/// `Resource::apply` and produces the materialized terminal node.
pub struct CalculatedResultSystem<R: Resource> {
    resource: Arc<R>,
    apply_state: Option<R::ApplyState>,
    request_groups: Arc<RequestGroups<R>>,
    score: R::Score,
    index: Index,
}

/// Either kind of successor `generate_children` may emit.
pub enum SystemPtr<R: Resource> {
    /// An intermediate node, not yet materialized.
    Working(CalculatedWorkingSystem<R>),
    /// A terminal node, not yet materialized.
    Result(CalculatedResultSystem<R>),
}

impl<R: Resource> WorkingSystem<R> {
    /// Builds the root node of a search tree for `request_groups` against
    /// `resource`, optionally using `factory` to permute multi-Request
    /// groups. Without a factory, groups are always evaluated in their
    /// natural order.
    pub fn new(
        request_groups: RequestGroups<R>,
        resource: R,
        factory: Option<Arc<dyn PermutationGeneratorFactory<R>>>,
    ) -> Result<Self, CoreError> {
        let initial = Arc::new(Initial {
            request_groups: Arc::new(request_groups),
            permutation_factory: factory,
        });
        let current = Arc::new(Current {
            resource: Arc::new(resource),
            request_offset: 0,
        });
        Ok(Self::at(initial, current, Phase::Initialized))
    }

    /// Convenience constructor for a single `RequestGroup`.
    pub fn new_single_group(
        group: RequestGroup<R>,
        resource: R,
        factory: Option<Arc<dyn PermutationGeneratorFactory<R>>>,
    ) -> Result<Self, CoreError> {
        Self::new(RequestGroups::single(group), resource, factory)
    }

    fn at(initial: Arc<Initial<R>>, current: Arc<Current<R>>, phase: Phase<R>) -> Self {
        let (group_index, request_index_in_group, at_last_group, at_last_request_in_group) =
            locate(&initial.request_groups, current.request_offset);
        WorkingSystem {
            initial,
            current,
            phase,
            score: R::Score::initial(),
            index: Index::root(),
            group_index,
            request_index_in_group,
            at_last_group,
            at_last_request_in_group,
        }
    }

    fn materialize(initial: Arc<Initial<R>>, transition: Transition<R>, score: R::Score, index: Index) -> Self {
        let current = match &transition.apply_state {
            Some(apply_state) => Arc::new(Current {
                resource: Arc::new(transition.previous_current.resource.apply(apply_state)),
                request_offset: transition.previous_current.request_offset + 1,
            }),
            None => transition.previous_current.clone(),
        };
        let phase = match transition.permuted_requests {
            Some(permuted_requests) => Phase::InPermutation { permuted_requests },
            None => Phase::Initialized,
        };
        let (group_index, request_index_in_group, at_last_group, at_last_request_in_group) =
            locate(&initial.request_groups, current.request_offset);
        WorkingSystem {
            initial,
            current,
            phase,
            score,
            index,
            group_index,
            request_index_in_group,
            at_last_group,
            at_last_request_in_group,
        }
    }

    /// This node's cumulative score.
    pub fn score(&self) -> &R::Score {
        &self.score
    }

    /// This node's path identity.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// True iff this node's phase is `Completed`.
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Completed)
    }

    fn current_group(&self) -> &RequestGroup<R> {
        &self.initial.request_groups.groups()[self.group_index]
    }

    /// Emits at most `max_n` successors of this node, updating its phase.
    ///
    /// `max_n` must be strictly positive. Calling this on a node that is
    /// already `Completed` is a contract violation, reported as an error
    /// rather than silently returning no children.
    pub fn generate_children(&mut self, max_n: usize) -> Result<Vec<SystemPtr<R>>, CoreError> {
        if max_n == 0 {
            return Err(InvalidArgument::ZeroMaxN.into());
        }
        tracing::debug!(index = %self.index, phase = ?self.phase, max_n, "generating children");

        let phase = std::mem::replace(&mut self.phase, Phase::Completed);
        match phase {
            Phase::Completed => Err(ContractViolation::WorkingSystemAlreadyComplete.into()),
            Phase::Initialized => {
                let group = self.current_group();
                if group.len() == 1 || self.initial.permutation_factory.is_none() {
                    let request = group.requests()[self.request_index_in_group].clone();
                    self.evaluate_current(request, None, 0, max_n, None)
                } else {
                    let generator = self
                        .initial
                        .permutation_factory
                        .as_ref()
                        .expect("checked above")
                        .create();
                    self.emit_permutations(generator, 0, max_n)
                }
            }
            Phase::ActivePermutations {
                generator,
                next_child_ordinal,
            } => self.emit_permutations(generator, next_child_ordinal, max_n),
            Phase::InPermutation { permuted_requests } => {
                let request = permuted_requests[self.request_index_in_group].clone();
                self.evaluate_current(request, None, 0, max_n, Some(permuted_requests))
            }
            Phase::Continuation {
                continuation_state,
                next_child_ordinal,
            } => {
                let group = self.current_group();
                let request = group.requests()[self.request_index_in_group].clone();
                self.evaluate_current(request, Some(continuation_state), next_child_ordinal, max_n, None)
            }
        }
    }

    fn emit_permutations(
        &mut self,
        mut generator: Box<dyn PermutationGenerator<R>>,
        start_ordinal: u64,
        max_n: usize,
    ) -> Result<Vec<SystemPtr<R>>, CoreError> {
        let group_requests = self.current_group().requests().to_vec();
        let permutations = generator.generate(&group_requests, max_n)?;

        if permutations.is_empty() || permutations.len() > max_n {
            tracing::warn!(returned = permutations.len(), max_n, "permutation generator violated its count contract");
            return Err(ContractViolation::PermutationCountOutOfRange {
                returned: permutations.len(),
                max_n,
            }
            .into());
        }
        if permutations.iter().any(|p| p.is_empty()) {
            return Err(ContractViolation::EmptyPermutation.into());
        }

        let mut children = Vec::with_capacity(permutations.len());
        for (offset, permutation) in permutations.into_iter().enumerate() {
            let ordinal = start_ordinal + offset as u64;
            children.push(SystemPtr::Working(CalculatedWorkingSystem {
                initial: self.initial.clone(),
                transition: Transition {
                    previous_current: self.current.clone(),
                    apply_state: None,
                    permuted_requests: Some(permutation),
                },
                score: self.score.clone(),
                index: Index::extend(&self.index, ordinal),
            }));
        }

        let next_ordinal = start_ordinal + children.len() as u64;
        self.phase = if generator.is_complete() {
            Phase::Completed
        } else {
            Phase::ActivePermutations {
                generator,
                next_child_ordinal: next_ordinal,
            }
        };
        Ok(children)
    }

    fn evaluate_current(
        &mut self,
        request: Arc<Request<R>>,
        continuation: Option<R::ContinuationState>,
        start_ordinal: u64,
        max_n: usize,
        in_permutation: Option<Permutation<R>>,
    ) -> Result<Vec<SystemPtr<R>>, CoreError> {
        let (evaluations, next_continuation) =
            self.current.resource.evaluate(&request, max_n, continuation.as_ref())?;

        if evaluations.is_empty() || evaluations.len() > max_n {
            tracing::warn!(returned = evaluations.len(), max_n, "resource violated its evaluation count contract");
            return Err(ContractViolation::EvaluationCountOutOfRange {
                returned: evaluations.len(),
                max_n,
            }
            .into());
        }

        let evaluations_count = evaluations.len();
        let mut children = Vec::with_capacity(evaluations_count);
        for (offset, evaluation) in evaluations.into_iter().enumerate() {
            let ordinal = start_ordinal + offset as u64;
            if evaluation.result.successful && evaluation.apply_state.is_none() {
                return Err(ContractViolation::MissingApplyState.into());
            }

            let new_score = R::Score::combine(&self.score, &evaluation.result, self.at_last_request_in_group);
            let new_index = Index::extend(&self.index, ordinal);

            if self.at_last_request_in_group && self.at_last_group {
                children.push(SystemPtr::Result(CalculatedResultSystem {
                    resource: self.current.resource.clone(),
                    apply_state: evaluation.apply_state,
                    request_groups: self.initial.request_groups.clone(),
                    score: new_score,
                    index: new_index,
                }));
            } else if let Some(permuted) = &in_permutation {
                if !self.at_last_request_in_group {
                    children.push(SystemPtr::Working(CalculatedWorkingSystem {
                        initial: self.initial.clone(),
                        transition: Transition {
                            previous_current: self.current.clone(),
                            apply_state: evaluation.apply_state,
                            permuted_requests: Some(permuted.clone()),
                        },
                        score: new_score,
                        index: new_index,
                    }));
                }
                // Case B': permutation crosses a group boundary without being
                // the last group. No child is emitted; see SPEC_FULL.md §9.
            } else {
                children.push(SystemPtr::Working(CalculatedWorkingSystem {
                    initial: self.initial.clone(),
                    transition: Transition {
                        previous_current: self.current.clone(),
                        apply_state: evaluation.apply_state,
                        permuted_requests: None,
                    },
                    score: new_score,
                    index: new_index,
                }));
            }
        }

        // The ordinal counter advances once per evaluation even when Case B'
        // suppresses the child itself, so a resumed continuation never
        // reuses an ordinal already handed out.
        let next_ordinal = start_ordinal + evaluations_count as u64;
        self.phase = match next_continuation {
            Some(continuation_state) => Phase::Continuation {
                continuation_state,
                next_child_ordinal: next_ordinal,
            },
            None => Phase::Completed,
        };
        Ok(children)
    }
}

/// Walks `request_groups` left-to-right to locate the group and
/// within-group index of `request_offset`, along with whether that position
/// is the last group / last request of its group.
fn locate<R: Resource>(request_groups: &RequestGroups<R>, request_offset: usize) -> (usize, usize, bool, bool) {
    let groups = request_groups.groups();
    let mut remaining = request_offset;
    for (group_index, group) in groups.iter().enumerate() {
        if remaining < group.len() {
            let at_last_group = group_index == groups.len() - 1;
            let at_last_request_in_group = remaining == group.len() - 1;
            return (group_index, remaining, at_last_group, at_last_request_in_group);
        }
        remaining -= group.len();
    }
    unreachable!("request_offset {request_offset} is out of range for a well-formed WorkingSystem")
}

impl<R: Resource> CalculatedWorkingSystem<R> {
    /// Materializes this deferred child, running `Resource::apply` if the
    /// transition carries an `apply_state`.
    pub fn commit(&self) -> WorkingSystem<R> {
        WorkingSystem::materialize(self.initial.clone(), self.transition.clone(), self.score.clone(), self.index.clone())
    }

    /// This child's score, available before committing.
    pub fn score(&self) -> &R::Score {
        &self.score
    }

    /// This child's path identity, available before committing.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// The permutation this child resumes inside, if any, available before
    /// committing.
    pub fn permuted_requests(&self) -> Option<&Permutation<R>> {
        self.transition.permuted_requests.as_ref()
    }
}

impl<R: Resource> CalculatedResultSystem<R> {
    /// Materializes this deferred terminal child. Runs `Resource::apply` when
    /// the evaluation that produced this node carried an `apply_state`;
    /// an unsuccessful final evaluation carries none, so the Resource is
    /// passed through unchanged (the node is still reachable, scored as a
    /// failure for the driver to compare against other terminal paths).
    pub fn commit(&self) -> ResultSystem<R> {
        let resource = match &self.apply_state {
            Some(apply_state) => Arc::new(self.resource.apply(apply_state)),
            None => self.resource.clone(),
        };
        ResultSystem {
            resource,
            requests: self.request_groups.clone(),
            score: self.score.clone(),
            index: self.index.clone(),
        }
    }

    /// This child's score, available before committing.
    pub fn score(&self) -> &R::Score {
        &self.score
    }

    /// This child's path identity, available before committing.
    pub fn index(&self) -> &Index {
        &self.index
    }
}

impl<R: Resource + PartialEq> PartialEq for WorkingSystem<R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.initial, &other.initial)
            && self.current.resource == other.current.resource
            && self.current.request_offset == other.current.request_offset
            && self.phase == other.phase
            && self.score == other.score
            && self.index == other.index
    }
}

impl<R: Resource> fmt::Debug for WorkingSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkingSystem")
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("index", &self.index)
            .finish()
    }
}

impl<R: Resource + PartialEq> PartialEq for ResultSystem<R> {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource && self.requests == other.requests && self.score == other.score && self.index == other.index
    }
}

impl<R: Resource> fmt::Debug for ResultSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSystem")
            .field("score", &self.score)
            .field("index", &self.index)
            .finish()
    }
}

impl<R: Resource + PartialEq> PartialEq for CalculatedWorkingSystem<R> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.initial, &other.initial)
            && self.transition.previous_current.resource == other.transition.previous_current.resource
            && self.transition.previous_current.request_offset == other.transition.previous_current.request_offset
            && self.transition.apply_state == other.transition.apply_state
            && self.transition.permuted_requests == other.transition.permuted_requests
            && self.score == other.score
            && self.index == other.index
    }
}

impl<R: Resource> fmt::Debug for CalculatedWorkingSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatedWorkingSystem")
            .field("score", &self.score)
            .field("index", &self.index)
            .finish()
    }
}

impl<R: Resource + PartialEq> PartialEq for CalculatedResultSystem<R> {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.apply_state == other.apply_state
            && self.request_groups == other.request_groups
            && self.score == other.score
            && self.index == other.index
    }
}

impl<R: Resource> fmt::Debug for CalculatedResultSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculatedResultSystem")
            .field("score", &self.score)
            .field("index", &self.index)
            .finish()
    }
}

/// A serializable snapshot of a [`ResultSystem`]'s value-bearing fields.
///
/// `requests` is deliberately absent: a Request's condition lists are
/// embedding-supplied trait objects with no serializable form (see
/// SPEC_FULL.md §6), so a snapshot re-attaches to a caller-held
/// `Arc<RequestGroups<R>>` via [`ResultSystem::from_snapshot`] instead of
/// reconstructing it from bytes.
#[derive(Serialize, Deserialize)]
pub struct ResultSystemSnapshot<R: Resource> {
    /// The Resource resulting from the final accepted evaluation.
    pub resource: Arc<R>,
    /// This node's cumulative score.
    pub score: R::Score,
    /// This node's path identity.
    pub index: Index,
}

impl<R: Resource> ResultSystem<R> {
    /// Captures this node's value-bearing fields for serialization.
    pub fn to_snapshot(&self) -> ResultSystemSnapshot<R> {
        ResultSystemSnapshot {
            resource: self.resource.clone(),
            score: self.score.clone(),
            index: self.index.clone(),
        }
    }

    /// Reconstructs a `ResultSystem` from a snapshot and the `requests` it
    /// was originally produced against.
    pub fn from_snapshot(snapshot: ResultSystemSnapshot<R>, requests: Arc<RequestGroups<R>>) -> Self {
        ResultSystem {
            resource: snapshot.resource,
            requests,
            score: snapshot.score,
            index: snapshot.index,
        }
    }
}

/// A serializable snapshot of a [`CalculatedResultSystem`]'s value-bearing
/// fields. See [`ResultSystemSnapshot`] for why `request_groups` is absent.
#[derive(Serialize, Deserialize)]
pub struct CalculatedResultSystemSnapshot<R: Resource> {
    /// The Resource this node's evaluation ran against.
    pub resource: Arc<R>,
    /// The token `Resource::apply` needs to produce the final Resource,
    /// present iff the evaluation that produced this node succeeded.
    pub apply_state: Option<R::ApplyState>,
    /// This node's cumulative score.
    pub score: R::Score,
    /// This node's path identity.
    pub index: Index,
}

impl<R: Resource> CalculatedResultSystem<R> {
    /// Captures this node's value-bearing fields for serialization.
    pub fn to_snapshot(&self) -> CalculatedResultSystemSnapshot<R> {
        CalculatedResultSystemSnapshot {
            resource: self.resource.clone(),
            apply_state: self.apply_state.clone(),
            score: self.score.clone(),
            index: self.index.clone(),
        }
    }

    /// Reconstructs a `CalculatedResultSystem` from a snapshot and the
    /// `request_groups` it was originally produced against.
    pub fn from_snapshot(snapshot: CalculatedResultSystemSnapshot<R>, request_groups: Arc<RequestGroups<R>>) -> Self {
        CalculatedResultSystem {
            resource: snapshot.resource,
            apply_state: snapshot.apply_state,
            request_groups,
            score: snapshot.score,
            index: snapshot.index,
        }
    }
}

impl<R: Resource> fmt::Display for WorkingSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstrainedResource::WorkingSystem({},{})", self.score, self.index)
    }
}

impl<R: Resource> fmt::Display for ResultSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstrainedResource::ResultSystem({},{})", self.score, self.index)
    }
}

impl<R: Resource> fmt::Display for CalculatedWorkingSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConstrainedResource::CalculatedWorkingSystem({},{})",
            self.score, self.index
        )
    }
}

impl<R: Resource> fmt::Display for CalculatedResultSystem<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConstrainedResource::CalculatedResultSystem({},{})",
            self.score, self.index
        )
    }
}
