//! End-to-end scenarios exercising `WorkingSystem` against a scripted
//! `Resource`, covering single/multi Request groups, permutations,
//! evaluation continuations, multi-group traversal, and construction
//! rejections.

mod common;

use std::sync::Arc;

use constrained_resource_core::{
    PermutationGeneratorFactory, PermutationGeneratorKind, RequestGroup, RequestGroups, SystemPtr, WorkingSystem,
};

use common::{initial_score, request, ScriptEntry, ScriptedResource};

#[test]
fn single_request_reaches_a_result_in_one_step() {
    let group = RequestGroup::new(vec![request("only")]).unwrap();
    let resource = ScriptedResource::new(vec![ScriptEntry::one_success()]);
    let mut system = WorkingSystem::new_single_group(group, resource, None).unwrap();
    assert_eq!(
        system.to_string(),
        format!("ConstrainedResource::WorkingSystem({},Index())", initial_score())
    );

    let mut children = system.generate_children(10).unwrap();
    assert_eq!(children.len(), 1);
    assert!(system.is_complete());

    match children.remove(0) {
        SystemPtr::Result(calculated) => {
            let result = calculated.commit();
            assert_eq!(result.score.successes, 1);
            assert_eq!(result.index.to_string(), "Index(0)");
        }
        SystemPtr::Working(_) => panic!("expected a terminal result for a single-Request group"),
    }
}

#[test]
fn two_requests_in_natural_order_without_a_factory() {
    let group = RequestGroup::new(vec![request("first"), request("second")]).unwrap();
    let resource = ScriptedResource::new(vec![ScriptEntry::one_success(), ScriptEntry::one_success()]);
    let mut root = WorkingSystem::new_single_group(group, resource, None).unwrap();

    let mut first_children = root.generate_children(10).unwrap();
    assert_eq!(first_children.len(), 1);
    let intermediate = match first_children.remove(0) {
        SystemPtr::Working(calculated) => calculated.commit(),
        SystemPtr::Result(_) => panic!("expected an intermediate node after the first Request"),
    };
    assert!(!intermediate.is_complete());

    let mut second_children = intermediate_generate(intermediate);
    assert_eq!(second_children.len(), 1);
    match second_children.remove(0) {
        SystemPtr::Result(calculated) => {
            let result = calculated.commit();
            assert_eq!(result.score.successes, 2);
            assert_eq!(result.index.to_string(), "Index(0,0)");
        }
        SystemPtr::Working(_) => panic!("expected a terminal result after the second Request"),
    }
}

fn intermediate_generate(mut system: WorkingSystem<ScriptedResource>) -> Vec<SystemPtr<ScriptedResource>> {
    system.generate_children(10).unwrap()
}

#[test]
fn three_requests_emit_all_six_standard_permutations() {
    let group = RequestGroup::new(vec![request("1"), request("2"), request("3")]).unwrap();
    let resource = ScriptedResource::new(vec![]);
    let factory: Arc<dyn PermutationGeneratorFactory<ScriptedResource>> =
        Arc::new(PermutationGeneratorKind::Standard { max_total: 10_000 });
    let mut root = WorkingSystem::new_single_group(group, resource, Some(factory)).unwrap();

    let children = root.generate_children(10_000).unwrap();
    assert_eq!(children.len(), 6);
    assert!(root.is_complete());

    let orderings: Vec<Vec<String>> = children
        .iter()
        .map(|child| match child {
            SystemPtr::Working(calculated) => calculated
                .permuted_requests()
                .expect("every child of a permutation group resumes inside a permutation")
                .iter()
                .map(|request| request.name().to_string())
                .collect(),
            SystemPtr::Result(_) => panic!("a 3-Request permutation group is never terminal after one step"),
        })
        .collect();

    assert_eq!(
        orderings,
        vec![
            vec!["1", "2", "3"],
            vec!["1", "3", "2"],
            vec!["2", "1", "3"],
            vec!["2", "3", "1"],
            vec!["3", "1", "2"],
            vec!["3", "2", "1"],
        ]
    );
}

#[test]
fn evaluation_continuation_splits_across_two_calls() {
    let group = RequestGroup::new(vec![request("only")]).unwrap();
    let resource = ScriptedResource::new(vec![
        ScriptEntry {
            outcomes: vec![true, true],
            has_continuation: true,
        },
        ScriptEntry {
            outcomes: vec![true],
            has_continuation: false,
        },
    ]);
    let mut system = WorkingSystem::new_single_group(group, resource, None).unwrap();

    let first_batch = system.generate_children(10).unwrap();
    assert_eq!(first_batch.len(), 2);
    assert!(!system.is_complete());

    let second_batch = system.generate_children(10).unwrap();
    assert_eq!(second_batch.len(), 1);
    assert!(system.is_complete());

    let indices: Vec<String> = first_batch
        .iter()
        .chain(second_batch.iter())
        .map(|child| match child {
            SystemPtr::Result(calculated) => calculated.index().to_string(),
            SystemPtr::Working(calculated) => calculated.index().to_string(),
        })
        .collect();
    assert_eq!(indices, vec!["Index(0)", "Index(1)", "Index(2)"]);
}

#[test]
fn multi_group_traversal_advances_the_resource_between_groups() {
    let group_a = RequestGroup::new(vec![request("a")]).unwrap();
    let group_b = RequestGroup::new(vec![request("b")]).unwrap();
    let groups = RequestGroups::new(vec![group_a, group_b]).unwrap();
    let resource = ScriptedResource::new(vec![ScriptEntry::one_success(), ScriptEntry::one_success()]);
    let mut root = WorkingSystem::new(groups, resource, None).unwrap();

    let mut first = root.generate_children(10).unwrap();
    let after_group_a = match first.remove(0) {
        SystemPtr::Working(calculated) => calculated.commit(),
        SystemPtr::Result(_) => panic!("group a is not the last group"),
    };

    let mut second = intermediate_generate(after_group_a);
    match second.remove(0) {
        SystemPtr::Result(calculated) => {
            let result = calculated.commit();
            assert_eq!(result.resource.generation(), 2);
        }
        SystemPtr::Working(_) => panic!("group b is the last group"),
    }
}

#[test]
fn construction_rejects_empty_inputs() {
    assert!(RequestGroup::<ScriptedResource>::new(vec![]).is_err());
    assert!(RequestGroups::<ScriptedResource>::new(vec![]).is_err());

    let group = RequestGroup::new(vec![request("only")]).unwrap();
    let resource = ScriptedResource::new(vec![ScriptEntry::one_success()]);
    let mut system = WorkingSystem::new_single_group(group, resource, None).unwrap();
    assert!(system.generate_children(0).is_err());

    system.generate_children(10).unwrap();
    assert!(system.is_complete());
    assert!(system.generate_children(10).is_err());
}

#[test]
fn score_starts_at_initial() {
    assert_eq!(initial_score().successes, 0);
}
