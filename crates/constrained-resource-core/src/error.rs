use thiserror::Error;

/// The error type surfaced by this crate.
///
/// Every variant here is a reported contract violation: either the caller
/// passed something that should never have been constructed (see
/// [`InvalidArgument`]), or a pluggable collaborator (a `Resource` or a
/// `PermutationGenerator`) broke a promise it made to the engine (see
/// [`ContractViolation`]). Neither kind is ever recovered from internally.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An argument supplied at construction time violates a documented
    /// precondition; the object is never constructed.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    /// A collaborator (Resource, PermutationGenerator) violated its contract.
    #[error("contract violation: {0}")]
    ContractViolation(#[from] ContractViolation),
}

/// Preconditions checked at construction time.
#[derive(Error, Debug)]
pub enum InvalidArgument {
    /// A `Request`'s name was empty.
    #[error("request name must not be empty")]
    EmptyRequestName,
    /// A condition list was supplied but empty.
    #[error("a condition list must be non-empty when present")]
    EmptyConditionList,
    /// A `RequestGroup` held no requests.
    #[error("a request group must contain at least one request")]
    EmptyRequestGroup,
    /// `RequestGroups` held no groups.
    #[error("request groups must contain at least one group")]
    EmptyRequestGroups,
    /// `max_n` was zero.
    #[error("max_n must be strictly positive")]
    ZeroMaxN,
    /// `max_total` was zero.
    #[error("max_total must be strictly positive")]
    ZeroMaxTotal,
}

/// Contract violations detected while driving a collaborator.
#[derive(Error, Debug)]
pub enum ContractViolation {
    /// `Resource::evaluate` returned a number of evaluations outside `[1, max_n]`.
    #[error("resource returned {returned} evaluations, expected between 1 and {max_n}")]
    EvaluationCountOutOfRange {
        /// The number of evaluations actually returned.
        returned: usize,
        /// The `max_n` bound passed to `evaluate`.
        max_n: usize,
    },
    /// A successful evaluation did not carry an `apply_state`.
    #[error("a successful evaluation is missing an apply_state")]
    MissingApplyState,
    /// `PermutationGenerator::generate` returned a number of permutations outside `[1, max_n]`.
    #[error("permutation generator returned {returned} permutations, expected between 1 and {max_n}")]
    PermutationCountOutOfRange {
        /// The number of permutations actually returned.
        returned: usize,
        /// The `max_n` bound passed to `generate`.
        max_n: usize,
    },
    /// A generated permutation was empty.
    #[error("permutation generator produced an empty permutation")]
    EmptyPermutation,
    /// `generate` was called on a generator that already reported `is_complete()`.
    #[error("generate called on a completed permutation generator")]
    GeneratorAlreadyComplete,
    /// `generate_children` was called on a node whose phase is already `Completed`.
    #[error("generate_children called on a completed working system")]
    WorkingSystemAlreadyComplete,
    /// A domain `Resource` reported a failure outside the taxonomy above.
    #[error("resource error: {0}")]
    Resource(String),
}
