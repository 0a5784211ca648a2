// tests/engine_chain.rs

//! Dependency-ordering scenarios: linear chains and fan-in joins.

use std::error::Error;

use buildag::action::Tags;
use buildag::events::EventKind;
use buildag::scheduler::ActionStatus;
use buildag_test_utils::builders::{ManagerBuilder, produce_target};
use buildag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn linear_chain_runs_in_dependency_order() -> TestResult {
    init_tracing();

    let builder = ManagerBuilder::new().jobs(2);
    let fs = builder.fs();
    let recorder = builder.recorder();
    let mut manager = builder.build();

    fs.add_file_at("s1.c", 100);

    manager.submit("a".into(), vec!["s1.c".into()], produce_target(&fs), Tags::new())?;
    manager.submit("b".into(), vec!["a".into()], produce_target(&fs), Tags::new())?;

    let summary = with_timeout(manager.run()).await?;

    assert_eq!(summary.executed, 2);
    assert_eq!(summary.skipped, 0);
    assert!(summary.all_succeeded());

    // Exactly the order a-START, a-FINISH, b-START, b-FINISH.
    let kinds: Vec<(EventKind, String)> = recorder
        .events()
        .into_iter()
        .map(|e| (e.kind, e.target))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (EventKind::Start, "a".to_string()),
            (EventKind::Finish, "a".to_string()),
            (EventKind::Start, "b".to_string()),
            (EventKind::Finish, "b".to_string()),
        ]
    );

    assert_eq!(manager.status_of("a"), Some(ActionStatus::Finished));
    assert_eq!(manager.status_of("b"), Some(ActionStatus::Finished));
    Ok(())
}

#[tokio::test]
async fn fan_in_waits_for_all_predecessors() -> TestResult {
    init_tracing();

    let builder = ManagerBuilder::new().jobs(4);
    let fs = builder.fs();
    let recorder = builder.recorder();
    let mut manager = builder.build();

    fs.add_file_at("s1", 100);
    fs.add_file_at("s2", 100);

    manager.submit("a".into(), vec!["s1".into()], produce_target(&fs), Tags::new())?;
    manager.submit("b".into(), vec!["s2".into()], produce_target(&fs), Tags::new())?;
    manager.submit(
        "c".into(),
        vec!["a".into(), "b".into()],
        produce_target(&fs),
        Tags::new(),
    )?;

    let summary = with_timeout(manager.run()).await?;
    assert_eq!(summary.executed, 3);

    // c's START strictly follows both a's and b's FINISH.
    let c_start = recorder.start_index("c").expect("c never started");
    let a_finish = recorder.finish_index("a").expect("a never finished");
    let b_finish = recorder.finish_index("b").expect("b never finished");
    assert!(c_start > a_finish);
    assert!(c_start > b_finish);
    Ok(())
}

#[tokio::test]
async fn submit_order_does_not_affect_scheduling() -> TestResult {
    init_tracing();

    // The dependent is submitted before the action that provides its
    // source; the chain must still run bottom-up.
    let builder = ManagerBuilder::new().jobs(2);
    let fs = builder.fs();
    let recorder = builder.recorder();
    let mut manager = builder.build();

    fs.add_file_at("s1.c", 100);

    manager.submit("b".into(), vec!["a".into()], produce_target(&fs), Tags::new())?;
    manager.submit("a".into(), vec!["s1.c".into()], produce_target(&fs), Tags::new())?;

    let summary = with_timeout(manager.run()).await?;
    assert_eq!(summary.executed, 2);

    let a_finish = recorder.finish_index("a").expect("a never finished");
    let b_start = recorder.start_index("b").expect("b never started");
    assert!(b_start > a_finish);
    Ok(())
}

#[tokio::test]
async fn independent_actions_may_run_concurrently() -> TestResult {
    init_tracing();

    let builder = ManagerBuilder::new().jobs(4);
    let fs = builder.fs();
    let recorder = builder.recorder();
    let mut manager = builder.build();

    for i in 0..4 {
        manager.submit(
            format!("t{i}"),
            vec![format!("s{i}")],
            produce_target(&fs),
            Tags::new(),
        )?;
    }

    let summary = with_timeout(manager.run()).await?;
    assert_eq!(summary.executed, 4);
    assert_eq!(recorder.starts().len(), 4);
    assert_eq!(recorder.finishes().len(), 4);

    // Worker ids on START events come from the pool, never the driver.
    for event in recorder.events() {
        if event.kind == EventKind::Start {
            assert!(event.worker >= 1);
        }
    }
    Ok(())
}
