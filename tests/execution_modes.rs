mod common;
use crate::common::{
    FailingHook, HookRecorder, capture, init_tracing, pid_slot, process_alive, with_timeout,
};

use std::error::Error;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use hookcmd::listeners::RedirectTo;
use hookcmd::{Cmd, CmdError, Phase, ProcessExecutor, Result, RunningProcess, StoppedProcess};

type TestResult = std::result::Result<(), Box<dyn Error>>;

#[tokio::test]
async fn echo_returns_the_same_output_in_every_mode() -> TestResult {
    init_tracing();

    let command = Cmd::new().configuring(capture).command(["echo", "Hello"]);

    let bounded = command.execute(Duration::from_secs(5)).await?;
    let unbounded = command.execute_no_timeout().await?;
    let background = with_timeout(command.start()?.wait()).await?;

    for result in [&bounded, &unbounded, &background] {
        assert_eq!(result.exit_value(), 0);
        assert_eq!(result.output_utf8(), "Hello\n");
    }
    Ok(())
}

#[tokio::test]
async fn interpreter_runs_a_shell_snippet() -> TestResult {
    init_tracing();

    let result = Cmd::new()
        .configuring(capture)
        .interpreter("sh")
        .command(["-c", "echo Hello;"])
        .execute(Duration::from_secs(5))
        .await?;

    assert_eq!(result.output_utf8(), "Hello\n");
    Ok(())
}

#[tokio::test]
async fn output_is_not_captured_unless_asked() -> TestResult {
    init_tracing();

    let result = Cmd::new()
        .command(["echo", "Hello"])
        .execute_no_timeout()
        .await?;

    assert!(result.success());
    assert!(!result.has_output());
    assert!(result.output().is_empty());
    Ok(())
}

#[tokio::test]
async fn stderr_is_captured_separately() -> TestResult {
    init_tracing();

    let result = Cmd::new()
        .configuring(capture)
        .interpreter("sh")
        .command(["-c", "echo out; echo err >&2"])
        .execute_no_timeout()
        .await?;

    assert_eq!(result.output_utf8(), "out\n");
    assert_eq!(result.error_output_utf8(), "err\n");
    Ok(())
}

#[tokio::test]
async fn environment_reaches_the_process() -> TestResult {
    init_tracing();

    let result = Cmd::new()
        .configuring(capture)
        .configuring(|e: &mut ProcessExecutor| -> Result<()> {
            e.environment("GREETING", "hi there");
            Ok(())
        })
        .interpreter("sh")
        .command(["-c", "echo \"$GREETING\""])
        .execute_no_timeout()
        .await?;

    assert_eq!(result.output_utf8(), "hi there\n");
    Ok(())
}

#[tokio::test]
async fn hooks_fire_in_lifecycle_order() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    Cmd::new()
        .configuring(log.labelled("cfg"))
        .listening_before_start(log.labelled("pre"))
        .listening_after_start(log.clone())
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["true"])
        .execute_no_timeout()
        .await?;

    assert_eq!(
        log.events(),
        [
            "cfg:before-start",
            "pre:before-start",
            "after-start",
            "after-finish exit=0",
            "after-stop started=true",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn timeout_kills_the_process_and_still_stops() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();
    let (pid, remember_pid) = pid_slot();

    let command = Cmd::new()
        .listening_after_start(remember_pid)
        .listening_after_start(log.clone())
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["sleep", "10"]);

    let started = Instant::now();
    let err = command
        .execute(Duration::from_millis(200))
        .await
        .expect_err("sleep should time out");

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(log.phases(), ["after-start", "after-stop"]);

    let pid = (*pid.lock().unwrap()).expect("pid recorded after start");
    assert!(!process_alive(pid), "process {pid} left running after timeout");
    Ok(())
}

#[tokio::test]
async fn timeout_also_bounds_output_held_open_by_a_background_child() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let started = Instant::now();
    let err = Cmd::new()
        .configuring(capture)
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .interpreter("sh")
        .command(["-c", "sleep 4 & echo hi"])
        .execute(Duration::from_millis(500))
        .await
        .expect_err("draining stdout should hit the deadline");

    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(log.phases(), ["after-stop"]);
    Ok(())
}

#[tokio::test]
async fn dropped_execution_kills_the_process_before_after_stop() -> TestResult {
    init_tracing();
    let alive_at_stop = Arc::new(Mutex::new(None));

    let observer = {
        let alive_at_stop = Arc::clone(&alive_at_stop);
        move |p: &StoppedProcess| -> Result<()> {
            *alive_at_stop.lock().unwrap() = p.id().map(process_alive);
            Ok(())
        }
    };
    let command = Cmd::new()
        .listening_after_stop(observer)
        .command(["sleep", "10"]);

    let outer = tokio::time::timeout(Duration::from_millis(300), command.execute_no_timeout()).await;
    assert!(outer.is_err(), "sleep should outlive the outer timeout");

    assert_eq!(*alive_at_stop.lock().unwrap(), Some(false));
    Ok(())
}

#[tokio::test]
async fn missing_program_fails_to_start_but_stops_once() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .listening_after_start(log.clone())
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["hookcmd-no-such-program-on-path"])
        .execute_no_timeout()
        .await
        .expect_err("spawn should fail");

    assert!(matches!(err, CmdError::Start { .. }), "unexpected error: {err}");
    assert_eq!(log.events(), ["after-stop started=false"]);
    Ok(())
}

#[tokio::test]
async fn before_start_failure_prevents_the_spawn() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .listening_before_start(FailingHook::new(Phase::BeforeStart))
        .listening_before_start(log.labelled("later"))
        .listening_after_start(log.clone())
        .listening_after_stop(log.clone())
        .command(["true"])
        .execute_no_timeout()
        .await
        .expect_err("listener should abort");

    assert_eq!(err.phase(), Some(Phase::BeforeStart));
    assert!(matches!(err.root(), CmdError::Aborted(_)));
    assert_eq!(log.events(), ["after-stop started=false"]);
    Ok(())
}

#[tokio::test]
async fn configuring_failure_is_tagged_as_configuring() -> TestResult {
    init_tracing();

    let err = Cmd::new()
        .configuring(FailingHook::new(Phase::Configuring))
        .command(["true"])
        .execute_no_timeout()
        .await
        .expect_err("configuring action should abort");

    assert_eq!(err.phase(), Some(Phase::Configuring));
    Ok(())
}

#[tokio::test]
async fn every_after_finish_listener_runs_and_the_first_error_wins() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .listening_after_finish(FailingHook::new(Phase::AfterFinish))
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["true"])
        .execute_no_timeout()
        .await
        .expect_err("after-finish listener should fail");

    assert_eq!(err.phase(), Some(Phase::AfterFinish));
    assert_eq!(log.phases(), ["after-finish", "after-stop"]);
    Ok(())
}

#[tokio::test]
async fn after_stop_failure_is_reported_after_a_clean_run() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .listening_after_stop(FailingHook::new(Phase::AfterStop))
        .listening_after_stop(log.clone())
        .command(["true"])
        .execute_no_timeout()
        .await
        .expect_err("after-stop listener should fail");

    assert_eq!(err.phase(), Some(Phase::AfterStop));
    assert_eq!(log.count(Phase::AfterStop), 1);
    Ok(())
}

#[tokio::test]
async fn exit_codes_are_only_checked_when_configured() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();
    let cmd = Cmd::new()
        .listening_after_finish(log.clone())
        .interpreter("sh");

    let lenient = cmd.command(["-c", "exit 3"]).execute_no_timeout().await?;
    assert_eq!(lenient.exit_value(), 3);
    assert!(!lenient.success());

    let err = cmd
        .configuring(|e: &mut ProcessExecutor| -> Result<()> {
            e.exit_values([0]);
            Ok(())
        })
        .command(["-c", "exit 3"])
        .execute_no_timeout()
        .await
        .expect_err("exit code 3 is not accepted");

    match err {
        CmdError::InvalidExitValue { result, .. } => assert_eq!(result.exit_value(), 3),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(log.events(), ["after-finish exit=3", "after-finish exit=3"]);
    Ok(())
}

#[tokio::test]
async fn after_start_listener_can_kill_the_process() -> TestResult {
    init_tracing();

    let started = Instant::now();
    let result = Cmd::new()
        .listening_after_start(|p: &RunningProcess| -> Result<()> {
            p.kill();
            Ok(())
        })
        .command(["sleep", "10"])
        .execute(Duration::from_secs(5))
        .await?;

    assert_eq!(result.exit_value(), -1);
    assert!(started.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test]
async fn after_start_failure_kills_and_stops() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .listening_after_start(FailingHook::new(Phase::AfterStart))
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["sleep", "10"])
        .execute(Duration::from_secs(5))
        .await
        .expect_err("after-start listener should fail");

    assert_eq!(err.phase(), Some(Phase::AfterStart));
    assert_eq!(log.events(), ["after-stop started=true"]);
    Ok(())
}

#[tokio::test]
async fn a_command_can_be_executed_repeatedly_and_concurrently() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let command = Cmd::new()
        .configuring(capture)
        .listening_after_stop(log.clone())
        .command(["echo", "again"]);

    command.execute_no_timeout().await?;
    command.execute_no_timeout().await?;

    let other = command.clone();
    let (a, b) = tokio::join!(command.execute_no_timeout(), other.execute_no_timeout());
    assert_eq!(a?.output_utf8(), "again\n");
    assert_eq!(b?.output_utf8(), "again\n");

    assert_eq!(log.count(Phase::AfterStop), 4);
    Ok(())
}

#[tokio::test]
async fn started_process_can_be_cancelled() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let handle = Cmd::new()
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["sleep", "10"])
        .start()?;
    let pid = handle.pid().expect("started process has a pid");

    let err = with_timeout(handle.cancel())
        .await
        .expect_err("cancelled process has no result");

    assert!(matches!(err, CmdError::Cancelled { .. }), "unexpected error: {err}");
    assert_eq!(log.events(), ["after-stop started=true"]);
    assert!(!process_alive(pid), "process {pid} left running after cancel");
    Ok(())
}

#[tokio::test]
async fn dropping_the_handle_still_runs_after_stop() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let handle = Cmd::new()
        .listening_after_stop(log.clone())
        .command(["sleep", "10"])
        .start()?;
    drop(handle);

    with_timeout(async {
        while log.count(Phase::AfterStop) == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert_eq!(log.count(Phase::AfterStop), 1);
    Ok(())
}

#[tokio::test]
async fn start_honors_a_configured_timeout() -> TestResult {
    init_tracing();

    let err = Cmd::new()
        .configuring(|e: &mut ProcessExecutor| -> Result<()> {
            e.timeout(Duration::from_millis(200));
            Ok(())
        })
        .command(["sleep", "10"])
        .start()?
        .wait();
    let err = with_timeout(err).await.expect_err("sleep should time out");

    assert!(err.is_timeout(), "unexpected error: {err}");
    Ok(())
}

#[tokio::test]
async fn start_reports_early_failures_synchronously() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .listening_after_stop(log.clone())
        .command(["hookcmd-no-such-program-on-path"])
        .start()
        .expect_err("spawn should fail");

    assert!(matches!(err, CmdError::Start { .. }));
    assert_eq!(log.events(), ["after-stop started=false"]);
    Ok(())
}

struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("sink refused the bytes"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn failing_redirect_sink_is_reported_after_after_finish() -> TestResult {
    init_tracing();
    let log = HookRecorder::new();

    let err = Cmd::new()
        .configuring(capture)
        .configuring(RedirectTo::new(BrokenSink))
        .listening_after_finish(log.clone())
        .listening_after_stop(log.clone())
        .command(["echo", "Hello"])
        .execute_no_timeout()
        .await
        .expect_err("the sink error should surface");

    match err {
        CmdError::Redirect { stream, .. } => assert_eq!(stream.to_string(), "stdout"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(log.phases(), ["after-finish", "after-stop"]);
    Ok(())
}
