use modforge_core::error::Error;
use modforge_core::executor::TaskExecutor;
use modforge_core::graph::TaskGraph;
use modforge_core::task::Task;

type Log = Vec<String>;

fn recording(name: &str) -> Task<Log> {
    let label = name.to_string();
    Task::new(name, move |log: &mut Log| {
        log.push(label.clone());
        Ok(())
    })
}

fn failing(name: &str) -> Task<Log> {
    let label = name.to_string();
    Task::new(name, move |log: &mut Log| {
        log.push(label.clone());
        Err(Error::InvalidConfig(format!("{} exploded", label)))
    })
}

fn diamond() -> Vec<Task<Log>> {
    vec![
        recording("A"),
        recording("B").depends_on(["A"]),
        recording("C").depends_on(["A"]),
        recording("D").depends_on(["B", "C"]),
    ]
}

#[test]
fn test_diamond_runs_shared_prerequisite_once() {
    let executor = TaskExecutor::new(TaskGraph::new(diamond()).unwrap());
    let mut log = Log::new();

    let summary = executor.run("D", &mut log).unwrap();

    assert_eq!(log, vec!["A", "B", "C", "D"]);
    assert_eq!(summary.executed_names(), vec!["A", "B", "C", "D"]);
    assert_eq!(summary.root, "D");
}

#[test]
fn test_execution_order_follows_declaration_order() {
    let graph = TaskGraph::new(vec![
        recording("x"),
        recording("y"),
        recording("z").depends_on(["y", "x"]),
    ])
    .unwrap();

    assert_eq!(graph.execution_order("z").unwrap(), vec!["y", "x", "z"]);
    assert_eq!(graph.execution_order("x").unwrap(), vec!["x"]);
}

#[test]
fn test_failure_stops_remaining_tasks() {
    let tasks = vec![
        recording("A"),
        failing("B").depends_on(["A"]),
        recording("C").depends_on(["A"]),
        recording("D").depends_on(["B", "C"]),
    ];
    let executor = TaskExecutor::new(TaskGraph::new(tasks).unwrap());
    let mut log = Log::new();

    let err = executor.run("D", &mut log).unwrap_err();

    assert_eq!(log, vec!["A", "B"]);
    assert_eq!(err.failed_task(), Some("B"));
    assert!(err.to_string().contains("B exploded"));
}

#[test]
fn test_unknown_root_runs_nothing() {
    let executor = TaskExecutor::new(TaskGraph::new(diamond()).unwrap());
    let mut log = Log::new();

    let err = executor.run("E", &mut log).unwrap_err();

    assert!(matches!(err, Error::TaskNotFound { ref name, .. } if name == "E"));
    assert!(log.is_empty());
}

#[test]
fn test_cycle_rejected_at_construction() {
    let err = TaskGraph::new(vec![
        recording("A").depends_on(["C"]),
        recording("B").depends_on(["A"]),
        recording("C").depends_on(["B"]),
    ])
    .unwrap_err();

    assert!(matches!(err, Error::CircularDependency(_)));
    assert!(err.is_configuration_error());
}

#[test]
fn test_self_dependency_rejected() {
    let err = TaskGraph::new(vec![recording("A").depends_on(["A"])]).unwrap_err();
    assert!(matches!(err, Error::CircularDependency(ref name) if name == "A"));
}

#[test]
fn test_missing_prerequisite_rejected() {
    let err = TaskGraph::new(vec![recording("A"), recording("B").depends_on(["Z"])]).unwrap_err();

    match err {
        Error::MissingPrerequisite {
            name, required_by, ..
        } => {
            assert_eq!(name, "Z");
            assert_eq!(required_by, "B");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_duplicate_task_rejected() {
    let err = TaskGraph::new(vec![recording("A"), recording("A")]).unwrap_err();
    assert!(matches!(err, Error::DuplicateTask(ref name) if name == "A"));
}

#[test]
fn test_prerequisites_and_dependents() {
    let graph = TaskGraph::new(diamond()).unwrap();

    assert_eq!(graph.prerequisites("D").unwrap(), ["B", "C"]);
    assert!(graph.prerequisites("A").unwrap().is_empty());
    assert_eq!(graph.dependents("A").unwrap(), vec!["B", "C"]);
    assert!(graph.dependents("D").unwrap().is_empty());
    assert!(graph.dependents("nope").is_err());
}

#[test]
fn test_each_run_starts_fresh() {
    let executor = TaskExecutor::new(TaskGraph::new(diamond()).unwrap());
    let mut log = Log::new();

    executor.run("B", &mut log).unwrap();
    executor.run("C", &mut log).unwrap();

    assert_eq!(log, vec!["A", "B", "A", "C"]);
}
