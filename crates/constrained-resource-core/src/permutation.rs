use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{ContractViolation, CoreError, InvalidArgument};
use crate::request::Request;
use crate::resource::Resource;

/// One ordering of a Request group.
pub type Permutation<R> = Arc<Vec<Arc<Request<R>>>>;

/// A lazy, bounded, stateful producer of orderings for a Request group.
///
/// A generator is constructed with a strictly positive `max_total` budget.
/// Each `generate` call consumes some of that budget; once it reaches zero,
/// or the subclass's enumeration is otherwise exhausted, `is_complete`
/// reports true and further `generate` calls fail.
pub trait PermutationGenerator<R: Resource>: fmt::Debug {
    /// True once this generator will produce no more permutations.
    fn is_complete(&self) -> bool;

    /// Produces between 1 and `min(max_total_remaining, max_n)` permutations
    /// of `requests`, continuing the generator's natural order from where
    /// the previous call left off. Fails if `is_complete()` is already true.
    fn generate(&mut self, requests: &[Arc<Request<R>>], max_n: usize) -> Result<Vec<Permutation<R>>, CoreError>;
}

/// Produces a `PermutationGenerator` configured with a given `max_total`
/// budget. A concrete factory keyed by generator type is provided in
/// [`PermutationGeneratorKind`].
pub trait PermutationGeneratorFactory<R: Resource>: fmt::Debug {
    /// Creates a fresh generator.
    fn create(&self) -> Box<dyn PermutationGenerator<R>>;
}

/// Enumerates every ordering of a Request group in lexicographic order of
/// index tuples (identity first, then next-lexicographic), terminating once
/// all `k!` permutations have been emitted or `max_total` is exhausted.
///
/// This is the reference generator used when no domain-specific ordering is
/// needed.
pub struct StandardPermutationGenerator<R: Resource> {
    max_total_remaining: u64,
    indices: Option<Vec<usize>>,
    exhausted: bool,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> StandardPermutationGenerator<R> {
    /// Builds a generator with the given total permutation budget.
    pub fn new(max_total: u64) -> Result<Self, CoreError> {
        if max_total == 0 {
            return Err(InvalidArgument::ZeroMaxTotal.into());
        }
        Ok(StandardPermutationGenerator {
            max_total_remaining: max_total,
            indices: None,
            exhausted: false,
            _marker: PhantomData,
        })
    }
}

impl<R: Resource> fmt::Debug for StandardPermutationGenerator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardPermutationGenerator")
            .field("max_total_remaining", &self.max_total_remaining)
            .field("indices", &self.indices)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl<R: Resource> PermutationGenerator<R> for StandardPermutationGenerator<R> {
    fn is_complete(&self) -> bool {
        self.max_total_remaining == 0 || self.exhausted
    }

    fn generate(&mut self, requests: &[Arc<Request<R>>], max_n: usize) -> Result<Vec<Permutation<R>>, CoreError> {
        if self.is_complete() {
            return Err(ContractViolation::GeneratorAlreadyComplete.into());
        }
        if max_n == 0 {
            return Err(InvalidArgument::ZeroMaxN.into());
        }

        let indices = self.indices.get_or_insert_with(|| (0..requests.len()).collect());
        let budget = self.max_total_remaining.min(max_n as u64) as usize;
        let mut produced = Vec::with_capacity(budget);

        while produced.len() < budget {
            let permuted: Vec<Arc<Request<R>>> = indices.iter().map(|&i| requests[i].clone()).collect();
            produced.push(Arc::new(permuted));
            if !next_lexicographic_permutation(indices) {
                self.exhausted = true;
                break;
            }
        }

        self.max_total_remaining -= produced.len() as u64;
        Ok(produced)
    }
}

/// Advances `indices` to the next lexicographically greater permutation.
/// Returns false (leaving `indices` in descending order) once the last
/// permutation has been reached.
fn next_lexicographic_permutation(indices: &mut [usize]) -> bool {
    if indices.len() < 2 {
        return false;
    }
    let mut i = indices.len() - 1;
    while i > 0 && indices[i - 1] >= indices[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = indices.len() - 1;
    while indices[j] <= indices[i - 1] {
        j -= 1;
    }
    indices.swap(i - 1, j);
    indices[i..].reverse();
    true
}

/// A concrete factory keyed by generator type. Adding a new generator kind
/// means adding a variant here; the factory trait's shape never changes.
#[derive(Debug, Clone, Copy)]
pub enum PermutationGeneratorKind {
    /// Produces a [`StandardPermutationGenerator`] with the given budget.
    Standard {
        /// The total permutation budget passed to the generator.
        max_total: u64,
    },
}

impl<R: Resource + 'static> PermutationGeneratorFactory<R> for PermutationGeneratorKind {
    fn create(&self) -> Box<dyn PermutationGenerator<R>> {
        match self {
            PermutationGeneratorKind::Standard { max_total } => {
                Box::new(StandardPermutationGenerator::new(*max_total).expect("max_total validated by this enum's caller"))
            }
        }
    }
}
