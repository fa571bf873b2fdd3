pub mod condition;
pub mod error;
pub mod index;
pub mod permutation;
pub mod request;
pub mod resource;
pub mod score;

mod working_system;

#[cfg(test)]
mod tests_support;

pub use condition::{calculate_result, Condition, ConditionResult, EvaluationResult};
pub use error::{ContractViolation, CoreError, InvalidArgument};
pub use index::Index;
pub use permutation::{Permutation, PermutationGenerator, PermutationGeneratorFactory, PermutationGeneratorKind, StandardPermutationGenerator};
pub use request::{Request, RequestGroup, RequestGroups};
pub use resource::{Evaluation, Resource};
pub use score::{LinearScore, Score};
pub use working_system::{
    CalculatedResultSystem, CalculatedResultSystemSnapshot, CalculatedWorkingSystem, ResultSystem, ResultSystemSnapshot,
    SystemPtr, WorkingSystem,
};
