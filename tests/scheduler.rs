//! 队列调度场景测试：用可控的内存传输实现驱动 `TransferQueueActor`

use actix::prelude::*;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use lanzou_transfer::core::error::{TransferError, TransferResult};
use lanzou_transfer::core::finish::{CompletionLogActor, ListCompleted};
use lanzou_transfer::core::queue::*;
use lanzou_transfer::core::store::QueueStore;
use lanzou_transfer::core::task::*;

macro_rules! eventually {
    ($cond:expr) => {{
        let mut ok = false;
        for _ in 0..300 {
            if $cond {
                ok = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(ok, "超时未满足: {}", stringify!($cond));
    }};
}

/// 按文件名控制的传输实现：每次执行都等待 `release`
#[derive(Default)]
struct GatedIo {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    results: Mutex<HashMap<String, VecDeque<TransferResult<TransferOutcome>>>>,
    always_fail: Mutex<HashMap<String, TransferError>>,
    report: Mutex<HashMap<String, Progress>>,
    started: Mutex<Vec<(String, u64)>>,
}

impl GatedIo {
    fn gate(&self, name: &str) -> Arc<Notify> {
        self.gates.lock().unwrap().entry(name.to_string()).or_default().clone()
    }

    fn release(&self, name: &str, result: TransferResult<TransferOutcome>) {
        self.results.lock().unwrap().entry(name.to_string()).or_default().push_back(result);
        self.gate(name).notify_one();
    }

    fn succeed(&self, name: &str) {
        self.release(name, Ok(TransferOutcome { bytes: 100, ..TransferOutcome::default() }));
    }

    fn fail_always(&self, name: &str, error: TransferError) {
        self.always_fail.lock().unwrap().insert(name.to_string(), error);
    }

    /// 开始执行时先上报一次进度
    fn report_on_start(&self, name: &str, transferred: u64, total: u64) {
        self.report.lock().unwrap().insert(name.to_string(), Progress { transferred, total });
    }

    /// 每次执行的 `resume_from`
    fn starts(&self, name: &str) -> Vec<u64> {
        self.started.lock().unwrap().iter().filter(|(n, _)| n == name).map(|(_, from)| *from).collect()
    }

    fn started_names(&self) -> Vec<String> {
        self.started.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    async fn run(&self, name: &str, cx: &ExecContext) -> TransferResult<TransferOutcome> {
        self.started.lock().unwrap().push((name.to_string(), cx.resume_from));
        let failure = self.always_fail.lock().unwrap().get(name).cloned();
        if let Some(error) = failure {
            return Err(error);
        }
        let report = self.report.lock().unwrap().get(name).copied();
        if let Some(progress) = report {
            cx.progress.report(progress.transferred.max(cx.resume_from), progress.total);
        }

        let gate = self.gate(name);
        gate.notified().await;
        if cx.cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let result = self.results.lock().unwrap().get_mut(name).and_then(|queue| queue.pop_front());
        result.unwrap_or_else(|| Ok(TransferOutcome::default()))
    }
}

#[async_trait(?Send)]
impl TransferIo for GatedIo {
    async fn upload(&self, payload: &UploadPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
        self.run(&payload.name, cx).await
    }

    async fn download(&self, payload: &DownloadPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
        self.run(&payload.name, cx).await
    }

    async fn download_link(&self, payload: &DownloadLinkPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
        self.run(&payload.name, cx).await
    }
}

struct ScriptedFiles {
    trash: TransferResult<()>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFiles {
    fn new(trash: TransferResult<()>) -> Self {
        Self { trash, calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait(?Send)]
impl RemoteFiles for ScriptedFiles {
    async fn move_to_trash(&self, _outcome: &TransferOutcome) -> TransferResult<()> {
        self.calls.lock().unwrap().push("trash".to_string());
        self.trash.clone()
    }

    async fn move_to_folder(&self, _outcome: &TransferOutcome, folder_id: &str) -> TransferResult<()> {
        self.calls.lock().unwrap().push(format!("move:{}", folder_id));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<QueueEvent>>>);

impl EventLog {
    fn snapshot(&self) -> Vec<QueueEvent> {
        self.0.lock().unwrap().clone()
    }
}

struct EventRecorder(EventLog);

impl Actor for EventRecorder {
    type Context = Context<Self>;
}

impl Handler<QueueEvent> for EventRecorder {
    type Result = ();
    fn handle(&mut self, msg: QueueEvent, _ctx: &mut Self::Context) {
        (self.0).0.lock().unwrap().push(msg);
    }
}

struct Harness {
    queue: Addr<TransferQueueActor>,
    finish: Addr<CompletionLogActor>,
    io: Arc<GatedIo>,
    events: EventLog,
    dir: PathBuf,
}

fn temp_state_dir() -> PathBuf {
    std::env::temp_dir().join(format!("lzt-scheduler-{}", Uuid::new_v4()))
}

fn no_retry() -> RetryStrategy {
    RetryStrategy::none()
}

impl Harness {
    fn start(category: Category, limit: usize, retry: RetryStrategy, files: Arc<dyn RemoteFiles>) -> Self {
        Self::start_in(&temp_state_dir(), category, limit, retry, files)
    }

    fn start_in(
        dir: &Path,
        category: Category,
        limit: usize,
        retry: RetryStrategy,
        files: Arc<dyn RemoteFiles>,
    ) -> Self {
        let io = Arc::new(GatedIo::default());
        let finish = CompletionLogActor::new(dir).start();
        let options = QueueOptions { concurrency_limit: limit, retry, progress_interval: Duration::ZERO };
        let executor = TaskExecutor::new(io.clone(), files);
        let queue = TransferQueueActor::new(category, options, QueueStore::new(dir, category), executor)
            .with_completion_log(finish.clone().recipient())
            .start();

        let events = EventLog::default();
        let recorder = EventRecorder(events.clone()).start();
        queue.do_send(Subscribe(recorder.recipient()));

        Self { queue, finish, io, events, dir: dir.to_path_buf() }
    }

    async fn add(&self, tasks: Vec<Task>) -> Vec<Uuid> {
        let ids: Vec<Uuid> = tasks.iter().map(|task| task.id).collect();
        let accepted = self.queue.send(AddTasks(tasks)).await.unwrap();
        assert_eq!(accepted, ids.len());
        ids
    }

    async fn task(&self, id: Uuid) -> Option<Task> {
        self.queue.send(GetTask(id)).await.unwrap()
    }

    async fn status(&self, id: Uuid) -> Option<TaskStatus> {
        self.task(id).await.map(|task| task.status)
    }

    async fn stats(&self) -> QueueStats {
        self.queue.send(GetStats).await.unwrap()
    }

    async fn completed(&self, category: Category) -> Vec<CompletedTask> {
        self.finish.send(ListCompleted(category)).await.unwrap()
    }

    fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn link_task(name: &str) -> Task {
    Task::new(TaskPayload::DownloadLink(DownloadLinkPayload {
        url: format!("https://example.com/{}", name),
        dir: PathBuf::from("./downloads"),
        name: name.to_string(),
    }))
}

fn sync_task(name: &str, trash_on_finish: bool) -> Task {
    Task::new(TaskPayload::Sync(SyncPayload {
        folder_id: "42".to_string(),
        trash_on_finish,
        source: SyncSource::DownloadLink(DownloadLinkPayload {
            url: format!("https://example.com/{}", name),
            dir: PathBuf::from("./downloads"),
            name: name.to_string(),
        }),
    }))
}

#[actix::test]
async fn concurrency_cap_admits_in_insertion_order() {
    let h = Harness::start(Category::Download, 2, no_retry(), Arc::new(NoRemoteFiles));
    let names = ["t0", "t1", "t2", "t3", "t4"];
    let ids = h.add(names.iter().map(|n| link_task(n)).collect()).await;

    let stats = h.stats().await;
    assert_eq!(stats.running, 2);
    assert_eq!(stats.pending, 3);
    assert_eq!(h.status(ids[0]).await, Some(TaskStatus::Running));
    assert_eq!(h.status(ids[1]).await, Some(TaskStatus::Running));
    for id in &ids[2..] {
        assert_eq!(h.status(*id).await, Some(TaskStatus::Pending));
    }
    eventually!(h.io.started_names().len() == 2);

    h.io.succeed("t0");
    eventually!(h.status(ids[0]).await.is_none());
    assert_eq!(h.status(ids[2]).await, Some(TaskStatus::Running));
    let stats = h.stats().await;
    assert_eq!(stats.running, 2);
    assert_eq!(stats.pending, 2);
    eventually!(h.io.started_names() == vec!["t0", "t1", "t2"]);

    eventually!(h.completed(Category::Download).await.len() == 1);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[0].task.id, ids[0]);
    assert_eq!(done[0].task.status, TaskStatus::Success);
    h.cleanup();
}

#[actix::test]
async fn failure_is_isolated_after_retries() {
    let retry = RetryStrategy { max_retries: 2, base_delay: Duration::ZERO, ..RetryStrategy::default() };
    let h = Harness::start(Category::Download, 2, retry, Arc::new(NoRemoteFiles));
    h.io.fail_always("bad", TransferError::network("connection reset"));
    let ids = h.add(vec![link_task("bad"), link_task("good")]).await;

    eventually!(h.completed(Category::Download).await.len() == 1);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[0].task.id, ids[0]);
    assert_eq!(done[0].task.status, TaskStatus::Error);
    assert_eq!(done[0].task.retries, 2);
    assert!(done[0].task.error.as_deref().unwrap_or("").contains("connection reset"));
    // 首次执行加两次重试，重试都从 0 开始
    assert_eq!(h.io.starts("bad"), vec![0, 0, 0]);

    assert_eq!(h.status(ids[1]).await, Some(TaskStatus::Running));
    h.io.succeed("good");
    eventually!(h.completed(Category::Download).await.len() == 2);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[1].task.status, TaskStatus::Success);
    assert_eq!(h.stats().await.total, 0);
    h.cleanup();
}

#[actix::test]
async fn auth_expired_is_surfaced_not_retried() {
    let retry = RetryStrategy { base_delay: Duration::ZERO, ..RetryStrategy::default() };
    let h = Harness::start(Category::Download, 1, retry, Arc::new(NoRemoteFiles));
    h.io.fail_always("secret", TransferError::AuthExpired("cookie".into()));
    let ids = h.add(vec![link_task("secret")]).await;

    eventually!(h.completed(Category::Download).await.len() == 1);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[0].task.status, TaskStatus::Error);
    assert_eq!(done[0].task.error.as_deref(), Some("登录已过期，请重新登录"));
    assert_eq!(h.io.starts("secret").len(), 1);

    eventually!(h
        .events
        .snapshot()
        .iter()
        .any(|e| matches!(e, QueueEvent::AuthExpired { task_id, .. } if *task_id == ids[0])));
    h.cleanup();
}

#[actix::test]
async fn retry_waits_for_backoff_before_readmission() {
    let retry = RetryStrategy {
        max_retries: 1,
        base_delay: Duration::from_millis(300),
        max_delay: Duration::from_secs(1),
        ..RetryStrategy::default()
    };
    let h = Harness::start(Category::Download, 1, retry, Arc::new(NoRemoteFiles));
    let ids = h.add(vec![link_task("flaky")]).await;
    eventually!(h.io.starts("flaky").len() == 1);

    let failed_at = std::time::Instant::now();
    h.io.release("flaky", Err(TransferError::network("connection reset")));
    eventually!(h.status(ids[0]).await == Some(TaskStatus::Pending));

    // 退避期间不占槽位，也不会被重新准入
    let task = h.task(ids[0]).await.unwrap();
    assert_eq!(task.retries, 1);
    let stats = h.stats().await;
    assert_eq!(stats.running, 0);
    assert_eq!(stats.pending, 1);
    assert_eq!(h.io.starts("flaky").len(), 1);

    eventually!(h.io.starts("flaky").len() == 2);
    assert!(failed_at.elapsed() >= Duration::from_millis(250));
    assert_eq!(h.io.starts("flaky"), vec![0, 0]);
    assert_eq!(h.status(ids[0]).await, Some(TaskStatus::Running));

    h.io.succeed("flaky");
    eventually!(h.completed(Category::Download).await.len() == 1);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[0].task.status, TaskStatus::Success);
    assert_eq!(done[0].task.retries, 1);
    h.cleanup();
}

#[actix::test]
async fn late_progress_from_previous_attempt_is_dropped() {
    let h = Harness::start(Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    h.io.report_on_start("a", 40, 100);
    let ids = h.add(vec![link_task("a")]).await;
    let id = ids[0];
    eventually!(h.task(id).await.map(|t| t.progress.transferred) == Some(40));
    let transferred = |task: Option<Task>| task.map(|t| t.progress.transferred);
    let report = |attempt: u64, transferred: u64| TaskProgress {
        task_id: id,
        attempt,
        progress: Progress { transferred, total: 100 },
    };

    // 暂停之后同一次执行的进度不再生效
    h.queue.send(PauseTask(id)).await.unwrap();
    h.queue.send(report(1, 90)).await.unwrap();
    assert_eq!(transferred(h.task(id).await), Some(40));

    h.queue.send(ResumeTask(id)).await.unwrap();
    eventually!(h.io.starts("a").len() == 2);
    assert_eq!(h.io.starts("a"), vec![0, 40]);

    // 旧执行的消息被丢弃，新执行的进度只增不减
    h.queue.send(report(1, 95)).await.unwrap();
    assert_eq!(transferred(h.task(id).await), Some(40));
    h.queue.send(report(2, 70)).await.unwrap();
    assert_eq!(transferred(h.task(id).await), Some(70));
    h.queue.send(report(2, 50)).await.unwrap();
    assert_eq!(transferred(h.task(id).await), Some(70));

    // 取消之后同样丢弃
    assert!(h.queue.send(CancelTask(id)).await.unwrap());
    h.queue.send(report(2, 99)).await.unwrap();
    eventually!(h.completed(Category::Download).await.len() == 1);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[0].task.status, TaskStatus::Cancelled);
    assert_eq!(done[0].task.progress.transferred, 70);
    h.cleanup();
}

#[actix::test]
async fn sync_post_step_failure_marks_error() {
    let files = Arc::new(ScriptedFiles::new(Err(TransferError::unknown("回收站不可用"))));
    let h = Harness::start(Category::Sync, 1, no_retry(), files.clone());
    let ids = h.add(vec![sync_task("s", true)]).await;

    eventually!(h.io.started_names().len() == 1);
    h.io.succeed("s");

    eventually!(h.completed(Category::Sync).await.len() == 1);
    let done = h.completed(Category::Sync).await;
    assert_eq!(done[0].task.id, ids[0]);
    assert_eq!(done[0].task.status, TaskStatus::Error);
    assert!(done[0].task.error.as_deref().unwrap_or("").contains("回收站不可用"));
    assert_eq!(*files.calls.lock().unwrap(), vec!["trash".to_string()]);
    assert_eq!(h.stats().await.running, 0);
    h.cleanup();
}

#[actix::test]
async fn sync_success_moves_to_folder() {
    let files = Arc::new(ScriptedFiles::new(Ok(())));
    let h = Harness::start(Category::Sync, 1, no_retry(), files.clone());
    h.add(vec![sync_task("s", false)]).await;

    eventually!(h.io.started_names().len() == 1);
    h.io.succeed("s");

    eventually!(h.completed(Category::Sync).await.len() == 1);
    let done = h.completed(Category::Sync).await;
    assert_eq!(done[0].task.status, TaskStatus::Success);
    assert_eq!(done[0].task.error, None);
    assert_eq!(*files.calls.lock().unwrap(), vec!["move:42".to_string()]);
    h.cleanup();
}

#[actix::test]
async fn cancel_during_flight_frees_slot() {
    let h = Harness::start(Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    let ids = h.add(vec![link_task("a"), link_task("b")]).await;
    eventually!(h.io.started_names().len() == 1);

    assert!(h.queue.send(CancelTask(ids[0])).await.unwrap());
    // 已在取消中，重复请求无效
    assert!(!h.queue.send(CancelTask(ids[0])).await.unwrap());

    eventually!(h.status(ids[1]).await == Some(TaskStatus::Running));
    let done = h.completed(Category::Download).await;
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].task.status, TaskStatus::Cancelled);
    assert_eq!(done[0].task.error, None);

    // 取消后迟到的结果不会改变状态
    h.io.succeed("a");
    h.io.succeed("b");
    eventually!(h.completed(Category::Download).await.len() == 2);
    let done = h.completed(Category::Download).await;
    assert_eq!(done[0].task.status, TaskStatus::Cancelled);
    assert_eq!(done[1].task.status, TaskStatus::Success);
    h.cleanup();
}

#[actix::test]
async fn remove_pending_task_skips_completion_log() {
    let h = Harness::start(Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    let ids = h.add(vec![link_task("a"), link_task("b")]).await;

    assert!(h.queue.send(RemoveTask(ids[1])).await.unwrap());
    assert!(!h.queue.send(RemoveTask(ids[1])).await.unwrap());
    assert_eq!(h.stats().await.total, 1);
    eventually!(h
        .events
        .snapshot()
        .iter()
        .any(|e| matches!(e, QueueEvent::Removed { task_id, .. } if *task_id == ids[1])));

    // 运行中的任务被移除时按取消处理
    assert!(h.queue.send(RemoveTask(ids[0])).await.unwrap());
    eventually!(h.completed(Category::Download).await.len() == 1);
    assert_eq!(h.completed(Category::Download).await[0].task.status, TaskStatus::Cancelled);
    assert_eq!(h.stats().await.total, 0);
    h.cleanup();
}

#[actix::test]
async fn pause_and_resume_are_idempotent() {
    let h = Harness::start(Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    h.io.report_on_start("a", 40, 100);
    let ids = h.add(vec![link_task("a"), link_task("b")]).await;
    eventually!(h.task(ids[0]).await.map(|t| t.progress.transferred) == Some(40));

    h.queue.send(PauseTask(ids[0])).await.unwrap();
    h.queue.send(PauseTask(ids[0])).await.unwrap();
    assert_eq!(h.status(ids[0]).await, Some(TaskStatus::Paused));

    // 暂停的执行结束后才释放槽位
    eventually!(h.status(ids[1]).await == Some(TaskStatus::Running));
    let stats = h.stats().await;
    assert_eq!(stats.running, 1);
    assert_eq!(stats.paused, 1);

    // 对等待中的任务 resume、对暂停的任务 pause 都不改变任何东西
    let before = h.queue.send(ListTasks).await.unwrap();
    h.queue.send(ResumeTask(ids[1])).await.unwrap();
    h.queue.send(PauseTask(ids[0])).await.unwrap();
    assert_eq!(h.queue.send(ListTasks).await.unwrap(), before);

    h.queue.send(ResumeTask(ids[0])).await.unwrap();
    h.queue.send(ResumeTask(ids[0])).await.unwrap();
    let tasks = h.queue.send(ListTasks).await.unwrap();
    assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
    assert_eq!(tasks[0].status, TaskStatus::Pending);
    assert_eq!(tasks[0].progress.transferred, 40);

    h.io.succeed("b");
    eventually!(h.io.starts("a").len() == 2);
    // 断点续传：从已传输的字节继续
    assert_eq!(h.io.starts("a"), vec![0, 40]);
    h.cleanup();
}

#[actix::test]
async fn concurrency_limit_changes_apply_to_future_admission() {
    let h = Harness::start(Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    let ids = h.add(vec![link_task("a"), link_task("b"), link_task("c"), link_task("d")]).await;
    assert_eq!(h.stats().await.running, 1);

    assert_ok!(h.queue.send(SetConcurrencyLimit(2)).await.unwrap());
    let stats = h.stats().await;
    assert_eq!(stats.running, 2);
    assert_eq!(stats.concurrency_limit, 2);

    assert_err!(h.queue.send(SetConcurrencyLimit(0)).await.unwrap());

    // 调小不抢占运行中的任务
    assert_ok!(h.queue.send(SetConcurrencyLimit(1)).await.unwrap());
    assert_eq!(h.stats().await.running, 2);

    eventually!(h.io.started_names().len() == 2);
    h.io.succeed("a");
    eventually!(h.status(ids[0]).await.is_none());
    let stats = h.stats().await;
    assert_eq!(stats.running, 1);
    assert_eq!(stats.pending, 2);

    h.io.succeed("b");
    eventually!(h.status(ids[2]).await == Some(TaskStatus::Running));
    assert_eq!(h.stats().await.running, 1);
    h.cleanup();
}

#[actix::test]
async fn restore_forces_pause_and_keeps_progress() {
    let dir = temp_state_dir();
    let first = Harness::start_in(&dir, Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    first.io.report_on_start("a", 30, 100);
    let ids = first.add(vec![link_task("a"), link_task("b")]).await;
    eventually!(first.task(ids[0]).await.map(|t| t.progress.transferred) == Some(30));
    let original = first.queue.send(ListTasks).await.unwrap();

    let second = Harness::start_in(&dir, Category::Download, 1, no_retry(), Arc::new(NoRemoteFiles));
    let restored = second.queue.send(ListTasks).await.unwrap();
    assert_eq!(restored.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
    assert!(restored.iter().all(|t| t.status == TaskStatus::Paused));
    for (before, after) in original.iter().zip(&restored) {
        assert_eq!(before.payload, after.payload);
    }
    assert_eq!(restored[0].progress.transferred, 30);
    assert_eq!(second.stats().await.running, 0);

    // 恢复后不会自动开始，需要手动继续
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(second.io.started_names().is_empty());

    assert_eq!(second.queue.send(ResumeAll).await.unwrap(), 2);
    eventually!(second.io.starts("a") == vec![30]);
    second.cleanup();
}

#[actix::test]
async fn idle_is_emitted_once_when_queue_drains() {
    let h = Harness::start(Category::Upload, 2, no_retry(), Arc::new(NoRemoteFiles));
    let task = Task::new(TaskPayload::Upload(UploadPayload {
        file: PathBuf::from("/tmp/u.bin"),
        folder_id: "-1".into(),
        name: "u.bin".into(),
        size: 100,
    }));
    let ids = h.add(vec![task]).await;
    eventually!(h.io.started_names().len() == 1);
    h.io.succeed("u.bin");

    eventually!(h.events.snapshot().iter().any(|e| matches!(e, QueueEvent::Idle { .. })));
    // 空闲之后的查询不会再次触发
    h.stats().await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    let events = h.events.snapshot();
    let idle = events.iter().filter(|e| matches!(e, QueueEvent::Idle { category: Category::Upload })).count();
    let finished = events
        .iter()
        .filter(|e| matches!(e, QueueEvent::Finished(entry) if entry.task.id == ids[0]))
        .count();
    assert_eq!(idle, 1);
    assert_eq!(finished, 1);
    h.cleanup();
}
