// tests/bridge_fake_transit.rs
#![cfg(unix)]
mod common;
use crate::common::builders::{records_json, DiffRecordBuilder};
use crate::common::fake_transit::{fake_transit_executable, process_exists, Scenario};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

use transit_bridge::config::ToolSettings;
use transit_bridge::exec::{ExecutionOutcome, FailureKind, TransitBridge};
use transit_bridge::types::ExecutionRequest;
use transit_bridge::{execute_transit, DiffRecord};

type TestResult = Result<(), Box<dyn Error>>;

const SCENARIO_A: &str = r#"[{"old_commit":"a1","new_commit":"b2","old_filename":"x.c","new_filename":"x.c","origin_line":10,"destination_line":12,"num_lines":3}]"#;

fn bridge() -> TransitBridge {
    TransitBridge::new(ToolSettings::new(fake_transit_executable()))
}

#[tokio::test]
async fn scenario_a_success_decodes_records() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().stdout(SCENARIO_A).build()?;

    let outcome = with_timeout(execute_transit(&bridge(), &scenario.repo_path(), None, None)).await?;

    assert_eq!(
        outcome,
        ExecutionOutcome::Success(vec![DiffRecord {
            old_commit: "a1".to_string(),
            new_commit: "b2".to_string(),
            old_filename: "x.c".to_string(),
            new_filename: "x.c".to_string(),
            origin_line: 10,
            destination_line: 12,
            num_lines: 3,
        }])
    );
    assert_eq!(scenario.recorded_args()?, vec!["--json".to_string(), scenario.repo_path()]);
    Ok(())
}

#[tokio::test]
async fn scenario_b_non_zero_exit_reports_code_and_stderr() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder()
        .stderr("fatal: not a repository\n")
        .exit_code(1)
        .build()?;

    let outcome = with_timeout(execute_transit(&bridge(), &scenario.repo_path(), None, None)).await?;

    let failure = outcome.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::NonZeroExit);
    assert_eq!(failure.exit_code, Some(1));
    assert_eq!(failure.message, "fatal: not a repository");
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_never_decodes_stdout() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder()
        .stdout(SCENARIO_A)
        .stderr("partial failure")
        .exit_code(3)
        .build()?;

    let outcome = with_timeout(execute_transit(&bridge(), &scenario.repo_path(), None, None)).await?;

    let failure = outcome.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::NonZeroExit);
    assert_eq!(failure.exit_code, Some(3));
    assert_eq!(failure.message, "partial failure");
    Ok(())
}

#[tokio::test]
async fn scenario_c_missing_executable_is_spawn_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let bridge = TransitBridge::new(ToolSettings::new(dir.path().join("no-such-transit")));

    let outcome = with_timeout(execute_transit(&bridge, "/repo", None, None)).await?;

    let failure = outcome.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::SpawnError);
    assert_eq!(failure.exit_code, None);
    assert!(failure.message.contains("no-such-transit"), "message: {}", failure.message);
    Ok(())
}

#[tokio::test]
async fn non_executable_file_is_spawn_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("transit");
    fs::write(&path, "#!/bin/sh\necho '[]'\n")?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;

    let outcome = with_timeout(bridge_for(&path).execute(ExecutionRequest::new("/repo", None, None)?)).await;

    assert_eq!(
        outcome.failure().map(|f| f.kind),
        Some(FailureKind::SpawnError)
    );
    Ok(())
}

fn bridge_for(path: &std::path::Path) -> TransitBridge {
    TransitBridge::new(ToolSettings::new(path))
}

#[tokio::test]
async fn malformed_stdout_with_exit_zero_is_parse_error() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().stdout("{not valid json").build()?;

    let outcome = with_timeout(execute_transit(&bridge(), &scenario.repo_path(), None, None)).await?;

    let failure = outcome.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::ParseError);
    assert!(outcome.records().is_none());
    Ok(())
}

#[tokio::test]
async fn revision_pair_is_passed_after_repo() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().stdout("[]").build()?;
    let repo = scenario.repo_path();

    let outcome = with_timeout(execute_transit(&bridge(), &repo, Some("a1"), Some("b2"))).await?;

    assert_eq!(outcome, ExecutionOutcome::Success(vec![]));
    assert_eq!(
        scenario.recorded_args()?,
        vec!["--json".to_string(), repo, "a1".to_string(), "b2".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn lone_revision_matches_no_revision_invocation() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().stdout("[]").build()?;
    let repo = scenario.repo_path();

    with_timeout(execute_transit(&bridge(), &repo, Some("a1"), None)).await?;
    let from_only = scenario.recorded_args()?;
    with_timeout(execute_transit(&bridge(), &repo, None, Some("b2"))).await?;
    let to_only = scenario.recorded_args()?;
    with_timeout(execute_transit(&bridge(), &repo, None, None)).await?;
    let neither = scenario.recorded_args()?;

    assert_eq!(from_only, neither);
    assert_eq!(to_only, neither);
    Ok(())
}

#[tokio::test]
async fn output_larger_than_pipe_buffer_is_fully_captured() -> TestResult {
    init_tracing();
    let records: Vec<DiffRecord> = (0..3000)
        .map(|i| {
            DiffRecordBuilder::new(&format!("src/module_{i}/file.rs"))
                .lines(i, i + 1, i % 7)
                .build()
        })
        .collect();
    let json = records_json(&records);
    assert!(json.len() > 128 * 1024);
    let scenario = Scenario::builder()
        .stdout(json)
        .stderr("warning: shallow clone\n".repeat(2000))
        .build()?;

    let outcome = with_timeout(execute_transit(&bridge(), &scenario.repo_path(), None, None)).await?;

    assert_eq!(outcome.records(), Some(records.as_slice()));
    Ok(())
}

#[tokio::test]
async fn stderr_before_stdout_does_not_affect_success() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder()
        .stderr("note: walking history\n")
        .stdout(SCENARIO_A)
        .stderr_first()
        .build()?;

    let outcome = with_timeout(execute_transit(&bridge(), &scenario.repo_path(), None, None)).await?;

    assert_eq!(outcome.records().map(|r| r.len()), Some(1));
    Ok(())
}

async fn wait_for_pid(scenario: &Scenario) -> u32 {
    with_timeout(async {
        loop {
            if let Some(pid) = scenario.recorded_pid() {
                return pid;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}

#[tokio::test]
async fn cancelling_a_hung_invocation_reaps_the_process() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().hang().build()?;
    let request = ExecutionRequest::new(&scenario.repo_path(), None, None)?;

    let mut handle = bridge().spawn(request);
    let pid = wait_for_pid(&scenario).await;
    assert!(process_exists(pid), "fake transit should be running");
    assert!(handle.cancel(), "cancel should be delivered to a running invocation");
    assert!(!handle.cancel(), "second cancel has nothing to deliver");

    let outcome = with_timeout(handle.outcome()).await;

    let failure = outcome.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::Cancelled);
    // A killed but unreaped child would still answer `kill -0` as a zombie.
    assert!(!process_exists(pid), "process {pid} still exists after cancel");
    Ok(())
}

#[tokio::test]
async fn timeout_cancels_a_hung_invocation() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().hang().build()?;
    let bridge = TransitBridge::new(
        ToolSettings::new(fake_transit_executable()).with_timeout(Duration::from_millis(300)),
    );

    let outcome = with_timeout(execute_transit(&bridge, &scenario.repo_path(), None, None)).await?;

    let failure = outcome.failure().expect("expected a failure");
    assert_eq!(failure.kind, FailureKind::Cancelled);
    assert!(failure.message.contains("timed out"), "message: {}", failure.message);
    let pid = scenario.recorded_pid().expect("fake transit recorded its pid");
    assert!(!process_exists(pid), "process {pid} still exists after timeout");
    Ok(())
}

#[tokio::test]
async fn timeout_does_not_affect_a_fast_invocation() -> TestResult {
    init_tracing();
    let scenario = Scenario::builder().stdout(SCENARIO_A).build()?;
    let bridge = TransitBridge::new(
        ToolSettings::new(fake_transit_executable()).with_timeout(Duration::from_secs(4)),
    );

    let outcome = with_timeout(execute_transit(&bridge, &scenario.repo_path(), None, None)).await?;

    assert!(outcome.is_success());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invocations_keep_their_own_buffers() -> TestResult {
    init_tracing();
    let bridge = bridge();

    let mut scenarios = Vec::new();
    for i in 0..8u32 {
        let scenario = if i % 3 == 2 {
            Scenario::builder()
                .stderr(format!("failure {i}"))
                .exit_code(i as i32)
                .build()?
        } else {
            let records = vec![DiffRecordBuilder::new(&format!("file_{i}.c")).lines(i, i, i).build()];
            Scenario::builder().stdout(records_json(&records)).build()?
        };
        scenarios.push(scenario);
    }

    let handles: Vec<_> = scenarios
        .iter()
        .map(|s| ExecutionRequest::new(&s.repo_path(), None, None).map(|r| bridge.spawn(r)))
        .collect::<Result<_, _>>()?;

    for (i, handle) in handles.into_iter().enumerate() {
        let i = i as u32;
        let outcome = with_timeout(handle.outcome()).await;
        if i % 3 == 2 {
            let failure = outcome.failure().expect("expected a failure");
            assert_eq!(failure.kind, FailureKind::NonZeroExit);
            assert_eq!(failure.exit_code, Some(i as i32));
            assert_eq!(failure.message, format!("failure {i}"));
        } else {
            let records = outcome.records().expect("expected records");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].old_filename, format!("file_{i}.c"));
            assert_eq!(records[0].num_lines, i);
        }
    }
    Ok(())
}

#[tokio::test]
async fn empty_repo_path_is_rejected_before_spawning() {
    init_tracing();

    let result = execute_transit(&bridge(), "", Some("a1"), Some("b2")).await;

    assert!(result.is_err());
}
