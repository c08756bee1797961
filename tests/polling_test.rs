//! Polling engine behavior against a scripted in-memory adapter.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meshforge::adapter::ProviderAdapter;
use meshforge::client::{PollOptions, TaskClient};
use meshforge::error::Error;
use meshforge::params::TaskParams;
use meshforge::types::{
    ErrorCode, Provider, Task, TaskCapabilities, TaskError, TaskKind, TaskStatus,
};
use meshforge::utils::cancel::CancelHandle;

/// Replays a fixed sequence of status-fetch outcomes; the final entry repeats
/// once the script is exhausted. Fetch instants are recorded so tests can
/// assert the scheduling gaps under paused time.
struct ScriptedAdapter {
    capabilities: TaskCapabilities,
    script: Vec<Result<Task, Error>>,
    fetches: AtomicUsize,
    fetch_times: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedAdapter {
    fn new(script: Vec<Result<Task, Error>>) -> Self {
        Self {
            capabilities: TaskCapabilities::new().with_kind(TaskKind::TextToModel),
            script,
            fetches: AtomicUsize::new(0),
            fetch_times: Mutex::new(Vec::new()),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Gaps between consecutive fetches.
    fn fetch_gaps(&self) -> Vec<Duration> {
        let times = self.fetch_times.lock().unwrap();
        times.windows(2).map(|pair| pair[1] - pair[0]).collect()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> Provider {
        Provider::Tripo
    }

    fn capabilities(&self) -> &TaskCapabilities {
        &self.capabilities
    }

    async fn create_task(&self, _params: TaskParams) -> Result<String, Error> {
        Ok("scripted-1".to_string())
    }

    async fn get_task_status(&self, _task_id: &str) -> Result<Task, Error> {
        self.fetch_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        let index = self.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .cloned();
        match step {
            Some(step) => step,
            None => Err(Error::Json("empty script".to_string())),
        }
    }
}

fn snapshot(status: TaskStatus, progress: u8) -> Task {
    Task {
        id: "scripted-1".to_string(),
        provider: Provider::Tripo,
        kind: Some(TaskKind::TextToModel),
        status,
        progress,
        artifacts: None,
        error: None,
        created_at: None,
        finished_at: None,
        raw_status: None,
    }
}

fn failed_snapshot(code: ErrorCode, message: &str) -> Task {
    let mut task = snapshot(TaskStatus::Failed, 0);
    task.error = Some(TaskError {
        code,
        message: message.to_string(),
        raw: None,
    });
    task
}

fn transient() -> Error {
    Error::Http("connection reset".to_string())
}

#[tokio::test(start_paused = true)]
async fn resolves_after_the_scripted_fetches() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![
        Ok(snapshot(TaskStatus::Processing, 30)),
        Ok(snapshot(TaskStatus::Processing, 60)),
        Ok(snapshot(TaskStatus::Succeeded, 100)),
    ]));
    let client = TaskClient::new(adapter.clone());

    let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = PollOptions::default().with_on_progress(Arc::new(move |task: &Task| {
        sink.lock().unwrap().push(task.progress);
    }));

    let task = client.poll_until_done("scripted-1", options).await.unwrap();
    assert_eq!(task.status, TaskStatus::Succeeded);
    assert_eq!(task.progress, 100);
    assert_eq!(adapter.fetch_count(), 3);
    assert_eq!(*seen.lock().unwrap(), vec![30, 60, 100]);
}

#[tokio::test(start_paused = true)]
async fn first_fetch_is_immediate_and_timeout_checks_at_loop_top() {
    // Budget smaller than one interval: the engine still gets one fetch in
    // before the deadline is re-checked.
    let adapter = Arc::new(ScriptedAdapter::new(vec![Ok(snapshot(
        TaskStatus::Processing,
        10,
    ))]));
    let client = TaskClient::new(adapter.clone());

    let options = PollOptions::default()
        .with_interval(Duration::from_millis(3_000))
        .with_timeout(Duration::from_millis(1_000));
    let err = client
        .poll_until_done("scripted-1", options)
        .await
        .unwrap_err();

    assert_eq!(adapter.fetch_count(), 1);
    match err {
        Error::Timeout {
            timeout_ms,
            elapsed_ms,
            ..
        } => {
            assert_eq!(timeout_ms, 1_000);
            assert!(elapsed_ms >= 1_000);
        }
        other => panic!("expected Timeout, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn consecutive_transient_errors_exhaust_the_retry_budget() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![Err(transient())]));
    let client = TaskClient::new(adapter.clone());

    let started = tokio::time::Instant::now();
    let options = PollOptions::default()
        .with_interval(Duration::from_millis(3_000))
        .with_max_retries(3);
    let err = client
        .poll_until_done("scripted-1", options)
        .await
        .unwrap_err();

    assert_eq!(adapter.fetch_count(), 3);
    match err {
        Error::MaxRetriesExceeded { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected MaxRetriesExceeded, got {other}"),
    }
    // Backoff grows 3s -> 4.5s -> 6.75s; two sleeps happen before the third
    // failure gives up.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(11_250), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(12_000), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn error_backoff_grows_and_plateaus_at_the_ceiling() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![Err(transient())]));
    let client = TaskClient::new(adapter.clone());

    let options = PollOptions::default()
        .with_interval(Duration::from_millis(3_000))
        .with_max_retries(6);
    let err = client
        .poll_until_done("scripted-1", options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MaxRetriesExceeded { attempts: 6, .. }));
    assert_eq!(adapter.fetch_count(), 6);

    // 3s base grows by x1.5 per failure and pins at the 15s ceiling.
    let expected: Vec<Duration> = [4_500, 6_750, 10_125, 15_000, 15_000]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    let gaps = adapter.fetch_gaps();
    assert_eq!(gaps, expected);
    assert!(gaps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test(start_paused = true)]
async fn a_successful_fetch_resets_the_error_budget() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![
        Err(transient()),
        Err(transient()),
        Ok(snapshot(TaskStatus::Processing, 20)),
        Err(transient()),
        Err(transient()),
        Err(transient()),
    ]));
    let client = TaskClient::new(adapter.clone());

    let options = PollOptions::default().with_max_retries(3);
    let err = client
        .poll_until_done("scripted-1", options)
        .await
        .unwrap_err();

    // Two failures, a success that resets the counter, then three more
    // failures to exhaust the budget.
    assert_eq!(adapter.fetch_count(), 6);
    assert!(matches!(err, Error::MaxRetriesExceeded { attempts: 3, .. }));
}

#[tokio::test(start_paused = true)]
async fn non_transient_errors_propagate_immediately() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![Err(Error::InvalidInput(
        "bad image".to_string(),
    ))]));
    let client = TaskClient::new(adapter.clone());

    let err = client
        .poll_until_done("scripted-1", PollOptions::default())
        .await
        .unwrap_err();

    assert_eq!(adapter.fetch_count(), 1);
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test(start_paused = true)]
async fn terminal_failure_carries_the_normalized_code() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![
        Ok(snapshot(TaskStatus::Processing, 40)),
        Ok(failed_snapshot(
            ErrorCode::ContentPolicyViolation,
            "prompt rejected",
        )),
    ]));
    let client = TaskClient::new(adapter);

    let err = client
        .poll_until_done("scripted-1", PollOptions::default())
        .await
        .unwrap_err();

    match err {
        Error::TaskFailed { code, message, task } => {
            assert_eq!(code, ErrorCode::ContentPolicyViolation);
            assert_eq!(message, "prompt rejected");
            assert_eq!(task.status, TaskStatus::Failed);
        }
        other => panic!("expected TaskFailed, got {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn canceled_tasks_surface_as_task_canceled() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![Ok(snapshot(
        TaskStatus::Canceled,
        0,
    ))]));
    let client = TaskClient::new(adapter);

    let err = client
        .poll_until_done("scripted-1", PollOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskCanceled { .. }));
}

#[tokio::test(start_paused = true)]
async fn cancel_handle_aborts_a_waiting_poll() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![Ok(snapshot(
        TaskStatus::Processing,
        10,
    ))]));
    let client = TaskClient::new(adapter.clone());

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4_000)).await;
        trigger.cancel();
    });

    let options = PollOptions::default().with_cancel(cancel);
    let err = client
        .poll_until_done("scripted-1", options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PollAborted { .. }));
    // Cancellation landed mid-sleep, after the second fetch was scheduled but
    // before it ran.
    assert_eq!(adapter.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn broadcast_subscribers_observe_every_snapshot() {
    let adapter = Arc::new(ScriptedAdapter::new(vec![
        Ok(snapshot(TaskStatus::Pending, 0)),
        Ok(snapshot(TaskStatus::Processing, 50)),
        Ok(snapshot(TaskStatus::Succeeded, 100)),
    ]));
    let client = TaskClient::new(adapter);

    let mut updates = client.subscribe();
    client
        .poll_until_done("scripted-1", PollOptions::default())
        .await
        .unwrap();

    let mut progresses = Vec::new();
    while let Ok(task) = updates.try_recv() {
        progresses.push(task.progress);
    }
    assert_eq!(progresses, vec![0, 50, 100]);
}
