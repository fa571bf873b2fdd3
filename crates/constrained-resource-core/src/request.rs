use std::fmt;
use std::sync::Arc;

use crate::condition::Condition;
use crate::error::{CoreError, InvalidArgument};
use crate::resource::Resource;

/// An immutable, named unit of work carrying optional condition sets.
///
/// Requests are constructed once and then shared (via `Arc`) across every
/// node of the search tree that references them.
pub struct Request<R: Resource> {
    name: String,
    applicability: Option<Vec<Arc<dyn Condition<R>>>>,
    requirement: Option<Vec<Arc<dyn Condition<R>>>>,
    preference: Option<Vec<Arc<dyn Condition<R>>>>,
}

impl<R: Resource> Request<R> {
    /// Builds a new `Request`. `name` must be non-empty; each condition list,
    /// if supplied, must be non-empty (an empty list is rejected rather than
    /// silently treated as "no conditions" -- use `None` for that).
    pub fn new(
        name: impl Into<String>,
        applicability: Option<Vec<Arc<dyn Condition<R>>>>,
        requirement: Option<Vec<Arc<dyn Condition<R>>>>,
        preference: Option<Vec<Arc<dyn Condition<R>>>>,
    ) -> Result<Self, CoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidArgument::EmptyRequestName.into());
        }
        for list in [&applicability, &requirement, &preference].into_iter().flatten() {
            if list.is_empty() {
                return Err(InvalidArgument::EmptyConditionList.into());
            }
        }
        Ok(Request {
            name,
            applicability,
            requirement,
            preference,
        })
    }

    /// The request's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applicability conditions, or an empty slice if none were supplied.
    pub fn applicability(&self) -> &[Arc<dyn Condition<R>>] {
        self.applicability.as_deref().unwrap_or(&[])
    }

    /// Requirement conditions, or an empty slice if none were supplied.
    pub fn requirement(&self) -> &[Arc<dyn Condition<R>>] {
        self.requirement.as_deref().unwrap_or(&[])
    }

    /// Preference conditions, or an empty slice if none were supplied.
    pub fn preference(&self) -> &[Arc<dyn Condition<R>>] {
        self.preference.as_deref().unwrap_or(&[])
    }
}

impl<R: Resource> fmt::Debug for Request<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("name", &self.name)
            .field("applicability", &self.applicability)
            .field("requirement", &self.requirement)
            .field("preference", &self.preference)
            .finish()
    }
}

impl<R: Resource> PartialEq for Request<R> {
    /// Compares only `name`. Condition lists are embedding-supplied trait
    /// objects (`Arc<dyn Condition<R>>`) with no general notion of equality,
    /// so they are not part of this comparison.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// An ordered, non-empty sequence of Requests. Members may be permuted by a
/// `PermutationGenerator` before being evaluated.
pub struct RequestGroup<R: Resource>(Vec<Arc<Request<R>>>);

impl<R: Resource> RequestGroup<R> {
    /// Builds a `RequestGroup` from a non-empty vector of Requests.
    pub fn new(requests: Vec<Arc<Request<R>>>) -> Result<Self, CoreError> {
        if requests.is_empty() {
            return Err(InvalidArgument::EmptyRequestGroup.into());
        }
        Ok(RequestGroup(requests))
    }

    /// The requests in natural (unpermuted) order.
    pub fn requests(&self) -> &[Arc<Request<R>>] {
        &self.0
    }

    /// The number of requests in the group.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the group has no requests (never the case for a validly
    /// constructed `RequestGroup`, but useful for callers building one up).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R: Resource> fmt::Debug for RequestGroup<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestGroup").field(&self.0).finish()
    }
}

impl<R: Resource> PartialEq for RequestGroup<R> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

/// A non-empty, ordered sequence of `RequestGroup`s: the full input to the
/// engine. Groups are processed in order; within a group, Requests may be
/// permuted.
pub struct RequestGroups<R: Resource>(Vec<RequestGroup<R>>);

impl<R: Resource> RequestGroups<R> {
    /// Builds `RequestGroups` from a non-empty vector of groups.
    pub fn new(groups: Vec<RequestGroup<R>>) -> Result<Self, CoreError> {
        if groups.is_empty() {
            return Err(InvalidArgument::EmptyRequestGroups.into());
        }
        Ok(RequestGroups(groups))
    }

    /// Convenience constructor for a single group.
    pub fn single(group: RequestGroup<R>) -> Self {
        RequestGroups(vec![group])
    }

    /// The groups in input order.
    pub fn groups(&self) -> &[RequestGroup<R>] {
        &self.0
    }

    /// The total number of requests across all groups.
    pub fn total_requests(&self) -> usize {
        self.0.iter().map(RequestGroup::len).sum()
    }
}

impl<R: Resource> fmt::Debug for RequestGroups<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestGroups").field(&self.0).finish()
    }
}

impl<R: Resource> PartialEq for RequestGroups<R> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::{ConstantCondition, TestResource};

    #[test]
    fn rejects_empty_name() {
        let err = Request::<TestResource>::new("", None, None, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(InvalidArgument::EmptyRequestName)));
    }

    #[test]
    fn rejects_empty_condition_list() {
        let err = Request::<TestResource>::new("r1", Some(vec![]), None, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(InvalidArgument::EmptyConditionList)
        ));
    }

    #[test]
    fn accepts_well_formed_request() {
        let applicability: Vec<Arc<dyn Condition<TestResource>>> = vec![Arc::new(ConstantCondition::new("always", true))];
        let request = Request::<TestResource>::new("r1", Some(applicability), None, None).unwrap();
        assert_eq!(request.name(), "r1");
        assert_eq!(request.applicability().len(), 1);
        assert!(request.requirement().is_empty());
    }

    #[test]
    fn equality_compares_name_only() {
        let applicability: Vec<Arc<dyn Condition<TestResource>>> = vec![Arc::new(ConstantCondition::new("always", true))];
        let with_conditions = Request::<TestResource>::new("r1", Some(applicability), None, None).unwrap();
        let without_conditions = Request::<TestResource>::new("r1", None, None, None).unwrap();
        assert_eq!(with_conditions, without_conditions);

        let different_name = Request::<TestResource>::new("r2", None, None, None).unwrap();
        assert_ne!(with_conditions, different_name);
    }

    #[test]
    fn rejects_empty_group() {
        let err = RequestGroup::<TestResource>::new(vec![]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(InvalidArgument::EmptyRequestGroup)));
    }

    #[test]
    fn rejects_empty_groups() {
        let err = RequestGroups::<TestResource>::new(vec![]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(InvalidArgument::EmptyRequestGroups)
        ));
    }
}
