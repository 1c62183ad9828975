mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use common::{failing_action, mock_action, mock_error, ok_action, MockAction, MockContext};
use flux_actions_core::actions::TaskResults;
use flux_actions_core::{
    execute_multiple, spawn_multiple, ActionDescriptor, ActionError, ActionMap, ActionRunner,
    ActionSpec, ExecutorError, TaskErrors,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn results(entries: &[(&str, Option<Value>)]) -> TaskResults {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect::<BTreeMap<_, _>>()
}

fn conversion_map() -> ActionMap<MockAction> {
    let params = json!({ "test": true });
    ActionMap::new()
        .task("foo", ActionDescriptor::spec(ActionSpec::new(ok_action("foo")).critical()))
        .task(
            "bar",
            ActionDescriptor::after(
                ["foo"],
                ActionSpec::new(ok_action("bar").with_params(params.clone())).with_params(params),
            ),
        )
        .task("baz", ActionDescriptor::action(ok_action("baz")))
        .task("fubar", ActionDescriptor::after_action(["bar"], ok_action("fubar")))
}

#[tokio::test]
async fn converts_descriptors_into_a_task_graph() {
    let ctx = MockContext::new();
    let execution = execute_multiple(ctx.clone(), &conversion_map()).await.unwrap();

    assert_eq!(execution.err, None);
    assert_eq!(
        execution.results,
        results(&[
            ("foo", Some(json!("foo"))),
            ("bar", Some(json!("bar"))),
            ("baz", Some(json!("baz"))),
            ("fubar", Some(json!("fubar"))),
        ])
    );
    assert_eq!(ctx.calls(), 4);
}

#[tokio::test]
async fn same_action_map_can_run_twice() {
    let ctx = MockContext::new();
    let actions = conversion_map();

    let first = execute_multiple(ctx.clone(), &actions).await.unwrap();
    let second = execute_multiple(ctx.clone(), &actions).await.unwrap();

    assert_eq!(first, second);
    assert!(second.is_ok());
    assert_eq!(ctx.calls(), 8);
}

#[tokio::test]
async fn critical_task_halts_the_graph() {
    let params = json!({ "test": true });
    let actions = ActionMap::new()
        .task(
            "foo",
            ActionDescriptor::after(["baz"], ActionSpec::new(failing_action(mock_error())).critical()),
        )
        .task(
            "bar",
            ActionDescriptor::after(
                ["foo"],
                ActionSpec::new(ok_action("bar").with_params(params.clone())).with_params(params),
            ),
        )
        .task("baz", ActionDescriptor::action(ok_action("baz")));

    let ctx = MockContext::new();
    let execution = execute_multiple(ctx.clone(), &actions).await.unwrap();

    assert_eq!(execution.err, Some(TaskErrors::single("foo", mock_error())));
    assert_eq!(execution.result("baz"), Some(&json!("baz")));
    assert_eq!(execution.result("foo"), None);
    assert_eq!(execution.result("bar"), None);
    assert_eq!(ctx.calls(), 2);
}

#[tokio::test]
async fn non_critical_errors_are_aggregated_by_task_name() {
    let params = json!({ "test": true });
    let actions = ActionMap::new()
        .task("foo", ActionDescriptor::after_action(["baz"], failing_action("foo")))
        .task(
            "bar",
            ActionDescriptor::after(
                ["foo"],
                ActionSpec::new(failing_action("bar").with_params(params.clone())).with_params(params),
            ),
        )
        .task("baz", ActionDescriptor::action(failing_action("baz")));

    let execution = execute_multiple(MockContext::new(), &actions).await.unwrap();

    assert_eq!(
        execution.err,
        Some(TaskErrors::from_iter([
            ("foo", ActionError::from("foo")),
            ("bar", ActionError::from("bar")),
            ("baz", ActionError::from("baz")),
        ]))
    );
    assert_eq!(
        execution.results,
        results(&[("foo", None), ("bar", None), ("baz", None)])
    );
}

#[tokio::test]
async fn single_soft_failure_leaves_independent_tasks_alone() {
    let actions = ActionMap::new()
        .task("foo", ActionDescriptor::action(failing_action(mock_error())))
        .task("bar", ActionDescriptor::after_action(["foo"], ok_action("bar")))
        .task("baz", ActionDescriptor::action(ok_action("baz")));

    let execution = execute_multiple(MockContext::new(), &actions).await.unwrap();

    assert_eq!(execution.err, Some(TaskErrors::single("foo", mock_error())));
    assert_eq!(execution.result("foo"), None);
    assert_eq!(execution.result("bar"), Some(&json!("bar")));
    assert_eq!(execution.result("baz"), Some(&json!("baz")));
}

#[tokio::test]
async fn falsy_data_is_reported_as_empty_object() {
    let actions = ActionMap::new().task(
        "foo",
        ActionDescriptor::action(mock_action(None, Value::Null, None)),
    );

    let execution = execute_multiple(MockContext::new(), &actions).await.unwrap();
    assert!(execution.is_ok());
    assert_eq!(execution.result("foo"), Some(&json!({})));
}

#[tokio::test(start_paused = true)]
async fn critical_failure_returns_before_slow_sibling_finishes() {
    let actions = ActionMap::new()
        .task(
            "slow",
            ActionDescriptor::action(ok_action("slow").after(Duration::from_millis(50))),
        )
        .task(
            "foo",
            ActionDescriptor::spec(ActionSpec::new(failing_action("E")).critical()),
        );

    let ctx = MockContext::new();
    let execution = execute_multiple(ctx.clone(), &actions).await.unwrap();

    assert_eq!(
        execution.err,
        Some(TaskErrors::single("foo", ActionError::from("E")))
    );
    assert_eq!(execution.result("slow"), None);
    assert_eq!(ctx.calls(), 2);
}

#[tokio::test]
async fn unknown_dependency_is_rejected_before_running() {
    let actions = ActionMap::new().task(
        "bar",
        ActionDescriptor::after_action(["missing"], ok_action("bar")),
    );

    let ctx = MockContext::new();
    let err = execute_multiple(ctx.clone(), &actions).await.unwrap_err();

    assert!(matches!(err, ExecutorError::DependencyNotFound { .. }));
    assert!(err.is_construction_error());
    assert_eq!(ctx.calls(), 0);
}

#[tokio::test]
async fn cycles_are_rejected_before_running() {
    let actions = ActionMap::new()
        .task("a", ActionDescriptor::after_action(["b"], ok_action("a")))
        .task("b", ActionDescriptor::after_action(["a"], ok_action("b")));

    let ctx = MockContext::new();
    let err = execute_multiple(ctx.clone(), &actions).await.unwrap_err();

    assert!(matches!(err, ExecutorError::CircularDependency(_)));
    assert_eq!(ctx.calls(), 0);
}

#[tokio::test]
async fn spawned_run_needs_no_caller() {
    let actions = ActionMap::new()
        .task("foo", ActionDescriptor::action(ok_action("foo")))
        .task(
            "bar",
            ActionDescriptor::spec(ActionSpec::new(ok_action("bar")).critical()),
        )
        .task(
            "baz",
            ActionDescriptor::after_action(["foo", "bar"], failing_action("baz")),
        );

    let ctx = MockContext::new();
    spawn_multiple(ctx.clone(), actions).await.unwrap();
    assert_eq!(ctx.calls(), 3);
}

#[tokio::test]
async fn runner_with_bounded_scheduler_gives_same_results() {
    let runner = ActionRunner::with_config(
        MockContext::new(),
        flux_actions_core::config::ExecutorConfig::with_max_concurrency(1),
    );
    let execution = runner.execute_multiple(&conversion_map()).await.unwrap();

    assert!(execution.is_ok());
    assert_eq!(execution.results.len(), 4);
    assert_eq!(runner.context().calls(), 4);
}
