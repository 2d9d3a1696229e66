use actix::{Message, Recipient};
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::model::Progress;

/// 运行中的任务向所属队列上报进度
#[derive(Debug, Clone)]
pub struct TaskProgress {
    pub task_id: Uuid,
    pub attempt: u64,
    pub progress: Progress,
}
impl Message for TaskProgress { type Result = (); }

/// 限速的进度上报器，避免 UI 被大量进度消息淹没
pub struct ProgressReporter {
    task_id: Uuid,
    attempt: u64,
    interval: Duration,
    sink: Option<Recipient<TaskProgress>>,
    last_sent: Cell<Option<Instant>>,
    latest: Cell<Progress>,
}

impl ProgressReporter {
    pub fn new(task_id: Uuid, attempt: u64, interval: Duration, sink: Recipient<TaskProgress>) -> Self {
        Self {
            task_id,
            attempt,
            interval,
            sink: Some(sink),
            last_sent: Cell::new(None),
            latest: Cell::new(Progress::default()),
        }
    }

    /// 不连接任何队列，只记录最新进度
    pub fn detached(task_id: Uuid) -> Self {
        Self {
            task_id,
            attempt: 0,
            interval: Duration::ZERO,
            sink: None,
            last_sent: Cell::new(None),
            latest: Cell::new(Progress::default()),
        }
    }

    pub fn latest(&self) -> Progress {
        self.latest.get()
    }

    /// 上报绝对进度，按时间间隔节流；传输完成时总会发送
    pub fn report(&self, transferred: u64, total: u64) {
        let progress = Progress { transferred, total };
        self.latest.set(progress);

        let now = Instant::now();
        let due = match self.last_sent.get() {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        };
        let finished = total > 0 && transferred >= total;
        if due || finished {
            self.send(progress, now);
        }
    }

    /// 立即发送最新进度，不受节流限制
    pub fn flush(&self) {
        self.send(self.latest.get(), Instant::now());
    }

    fn send(&self, progress: Progress, now: Instant) {
        self.last_sent.set(Some(now));
        if let Some(sink) = &self.sink {
            sink.do_send(TaskProgress {
                task_id: self.task_id,
                attempt: self.attempt,
                progress,
            });
        }
    }
}

/// 协作式取消标记，传输实现可以在分块之间检查
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// `execute()` 的执行上下文
pub struct ExecContext {
    pub progress: ProgressReporter,
    pub cancel: CancelFlag,
    /// 断点续传的起始字节；自动重试时为 0
    pub resume_from: u64,
}

impl ExecContext {
    pub fn detached(task_id: Uuid) -> Self {
        Self {
            progress: ProgressReporter::detached(task_id),
            cancel: CancelFlag::new(),
            resume_from: 0,
        }
    }
}
