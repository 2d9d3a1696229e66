use actix::prelude::*;
use futures::future::{abortable, AbortHandle, Aborted};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::core::error::{TransferError, TransferResult};
use crate::core::finish::RecordCompletion;
use crate::core::store::QueueStore;
use crate::core::task::{
    CancelFlag, Category, CompletedTask, ExecContext, ProgressReporter, RetryStrategy, Task,
    TaskExecutor, TaskStatus, TransferOutcome,
};
use super::messages::{QueueEvent, QueueStats};

/// 运行中的任务被打断的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Intent {
    Run,
    Pause,
    Cancel,
}

/// 已准入、尚未结束的一次执行
pub(crate) struct InFlight {
    pub attempt: u64,
    pub abort: AbortHandle,
    pub cancel: CancelFlag,
    pub intent: Intent,
}

impl InFlight {
    /// 通知传输实现停止，并中止执行中的 future
    fn interrupt(&mut self, intent: Intent) {
        self.intent = intent;
        self.cancel.cancel();
        self.abort.abort();
    }
}

#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub concurrency_limit: usize,
    pub retry: RetryStrategy,
    pub progress_interval: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 1,
            retry: RetryStrategy::default(),
            progress_interval: Duration::from_millis(500),
        }
    }
}

/// 单个类别的传输队列 Actor
///
/// 任务状态只在本 Actor 内修改；所有调度都在消息处理中串行完成，
/// 同一队列不会出现两个并发的调度过程。
pub struct TransferQueueActor {
    pub(crate) category: Category,
    pub(crate) tasks: Vec<Task>,
    pub(crate) in_flight: HashMap<Uuid, InFlight>,
    /// 自动重试的任务在此时间之前不会被准入
    pub(crate) backoff: HashMap<Uuid, Instant>,
    pub(crate) concurrency_limit: usize,
    retry: RetryStrategy,
    progress_interval: Duration,
    store: QueueStore,
    executor: TaskExecutor,
    completion_log: Option<Recipient<RecordCompletion>>,
    listeners: Vec<Recipient<QueueEvent>>,
    next_attempt: u64,
    busy: bool,
}

impl Actor for TransferQueueActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        log::info!(
            "{} 队列已启动: 恢复 {} 个任务, 并发上限 {}",
            self.category, self.tasks.len(), self.concurrency_limit
        );
    }
}

impl TransferQueueActor {
    /// 创建队列并从持久化状态恢复
    pub fn new(category: Category, options: QueueOptions, store: QueueStore, executor: TaskExecutor) -> Self {
        let tasks = store.load();
        Self {
            category,
            tasks,
            in_flight: HashMap::new(),
            backoff: HashMap::new(),
            concurrency_limit: options.concurrency_limit.max(1),
            retry: options.retry,
            progress_interval: options.progress_interval,
            store,
            executor,
            completion_log: None,
            listeners: Vec::new(),
            next_attempt: 0,
            busy: false,
        }
    }

    pub fn with_completion_log(mut self, log: Recipient<RecordCompletion>) -> Self {
        self.completion_log = Some(log);
        self
    }

    pub(crate) fn position(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub(crate) fn persist(&self) {
        self.store.save(&self.tasks);
    }

    pub(crate) fn subscribe(&mut self, listener: Recipient<QueueEvent>) {
        self.listeners.push(listener);
    }

    pub(crate) fn emit(&mut self, event: QueueEvent) {
        self.listeners.retain(|listener| listener.connected());
        for listener in &self.listeners {
            listener.do_send(event.clone());
        }
    }

    fn emit_status(&mut self, task_id: Uuid, status: TaskStatus) {
        let category = self.category;
        self.emit(QueueEvent::StatusChanged { category, task_id, status });
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total: self.tasks.len(),
            running: self.in_flight.len(),
            concurrency_limit: self.concurrency_limit,
            ..QueueStats::default()
        };
        for task in &self.tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Paused => stats.paused += 1,
                _ => {}
            }
            stats.transferred_bytes += task.progress.transferred;
            stats.total_bytes += task.progress.total;
        }
        stats
    }

    /// 追加任务：统一从 pending 开始，准入由调度决定
    pub(crate) fn enqueue(&mut self, tasks: Vec<Task>) -> usize {
        let count = tasks.len();
        for mut task in tasks {
            task.status = TaskStatus::Pending;
            task.error = None;
            let id = task.id;
            log::info!("{} 队列新增任务: {} ({})", self.category, task.name(), id);
            self.tasks.push(task);
            self.emit_status(id, TaskStatus::Pending);
        }
        self.persist();
        count
    }

    pub(crate) fn set_limit(&mut self, limit: usize) -> TransferResult<()> {
        if limit == 0 {
            return Err(TransferError::invalid_config("并发上限必须大于0"));
        }
        log::info!("{} 队列并发上限: {} -> {}", self.category, self.concurrency_limit, limit);
        self.concurrency_limit = limit;
        Ok(())
    }

    /// 调度：在有空闲并发槽位时，按插入顺序准入最早的等待任务
    ///
    /// 只启动执行、不等待结束；执行结束后由 `settle` 再次调用本方法。
    pub(crate) fn schedule(&mut self, ctx: &mut Context<Self>) {
        let now = Instant::now();
        let mut admitted = false;
        while self.in_flight.len() < self.concurrency_limit {
            let next = self.tasks.iter().position(|task| {
                task.status == TaskStatus::Pending
                    && !self.in_flight.contains_key(&task.id)
                    && self.backoff.get(&task.id).map_or(true, |at| *at <= now)
            });
            let Some(idx) = next else { break };
            self.admit(idx, ctx);
            admitted = true;
        }
        if admitted {
            self.persist();
        }
        self.check_idle();
    }

    fn admit(&mut self, idx: usize, ctx: &mut Context<Self>) {
        self.next_attempt += 1;
        let attempt = self.next_attempt;

        let task = &mut self.tasks[idx];
        task.status = TaskStatus::Running;
        task.error = None;
        let id = task.id;
        let payload = task.payload.clone();
        let resume_from = task.progress.transferred;
        log::info!("{} 队列开始任务: {} (从 {} 字节继续)", self.category, task.name(), resume_from);

        self.backoff.remove(&id);
        self.busy = true;

        let cancel = CancelFlag::new();
        let cx = ExecContext {
            progress: ProgressReporter::new(id, attempt, self.progress_interval, ctx.address().recipient()),
            cancel: cancel.clone(),
            resume_from,
        };
        let executor = self.executor.clone();
        let (fut, abort) = abortable(async move { executor.execute(&payload, &cx).await });

        self.in_flight.insert(id, InFlight { attempt, abort, cancel, intent: Intent::Run });
        self.emit_status(id, TaskStatus::Running);

        ctx.spawn(fut.into_actor(self).map(move |result, act, ctx| {
            act.settle(id, attempt, result, ctx);
        }));
    }

    /// 执行结束：应用状态转换，然后重新调度
    fn settle(
        &mut self,
        id: Uuid,
        attempt: u64,
        result: Result<TransferResult<TransferOutcome>, Aborted>,
        ctx: &mut Context<Self>,
    ) {
        let intent = match self.in_flight.remove(&id) {
            Some(flight) if flight.attempt == attempt => flight.intent,
            Some(flight) => {
                self.in_flight.insert(id, flight);
                return;
            }
            None => return,
        };
        let result = result.unwrap_or(Err(TransferError::Cancelled));

        if let Some(idx) = self.position(id) {
            match (intent, result) {
                (Intent::Cancel, _) => self.finish(idx, TaskStatus::Cancelled, None),
                (_, Ok(outcome)) => {
                    log::info!(
                        "{} 队列任务完成: {} ({} 字节)",
                        self.category,
                        self.tasks[idx].name(),
                        outcome.bytes
                    );
                    self.finish(idx, TaskStatus::Success, None);
                }
                (Intent::Pause, Err(_)) => {
                    log::info!("{} 队列任务已暂停: {}", self.category, self.tasks[idx].name());
                    self.persist();
                }
                (Intent::Run, Err(e)) => self.fail(idx, e, ctx),
            }
        }
        self.schedule(ctx);
    }

    fn fail(&mut self, idx: usize, error: TransferError, ctx: &mut Context<Self>) {
        let id = self.tasks[idx].id;
        if error.is_cancelled() {
            self.finish(idx, TaskStatus::Cancelled, None);
            return;
        }

        let retries = self.tasks[idx].retries;
        if self.retry.should_retry(&error, retries) {
            let delay = self.retry.get_delay(retries);
            log::warn!(
                "{} 队列任务失败，{:?} 后重试 ({}/{}): {} - {}",
                self.category, delay, retries + 1, self.retry.max_retries, self.tasks[idx].name(), error
            );
            self.tasks[idx].reset_for_retry();
            if !delay.is_zero() {
                self.backoff.insert(id, Instant::now() + delay);
                ctx.run_later(delay, |act, ctx| act.schedule(ctx));
            }
            self.emit_status(id, TaskStatus::Pending);
            self.persist();
            return;
        }

        log::error!("{} 队列任务失败: {} - {}", self.category, self.tasks[idx].name(), error);
        if error.is_auth_expired() {
            let category = self.category;
            self.emit(QueueEvent::AuthExpired { category, task_id: id, message: error.to_string() });
        }
        self.finish(idx, TaskStatus::Error, Some(error.user_message()));
    }

    /// 终态：移出队列，写入完成列表并通知
    pub(crate) fn finish(&mut self, idx: usize, status: TaskStatus, error: Option<String>) {
        let mut task = self.tasks.remove(idx);
        task.status = status;
        task.error = error;
        self.backoff.remove(&task.id);

        self.emit_status(task.id, status);
        let entry = CompletedTask::from_task(task);
        if let Some(log) = &self.completion_log {
            log.do_send(RecordCompletion(entry.clone()));
        }
        self.emit(QueueEvent::Finished(entry));
        self.persist();
    }

    /// pending|running -> paused；其余状态忽略
    pub(crate) fn pause_task(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.position(id) else { return false };
        let status = self.tasks[idx].status;
        if !status.can_pause() {
            return false;
        }
        if status == TaskStatus::Running {
            // 槽位在执行真正结束后才释放
            match self.in_flight.get_mut(&id) {
                Some(flight) if flight.intent == Intent::Run => flight.interrupt(Intent::Pause),
                _ => return false,
            }
        } else {
            self.backoff.remove(&id);
        }
        self.tasks[idx].status = TaskStatus::Paused;
        self.emit_status(id, TaskStatus::Paused);
        true
    }

    /// paused -> pending；其余状态忽略
    pub(crate) fn resume_task(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.position(id) else { return false };
        if !self.tasks[idx].status.can_resume() {
            return false;
        }
        self.tasks[idx].status = TaskStatus::Pending;
        self.emit_status(id, TaskStatus::Pending);
        true
    }

    /// 取消运行中的任务；已经在取消中的返回 false
    pub(crate) fn cancel_in_flight(&mut self, id: Uuid) -> bool {
        match self.in_flight.get_mut(&id) {
            Some(flight) if flight.intent != Intent::Cancel => {
                log::info!("{} 队列取消运行中的任务: {}", self.category, id);
                flight.interrupt(Intent::Cancel);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_in_flight(&self, id: Uuid) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// 移除非运行中的任务，不进入完成列表
    pub(crate) fn discard(&mut self, idx: usize) {
        let task = self.tasks.remove(idx);
        self.backoff.remove(&task.id);
        log::info!("{} 队列移除任务: {}", self.category, task.name());
        let category = self.category;
        self.emit(QueueEvent::Removed { category, task_id: task.id });
        self.persist();
    }

    /// 队列从忙碌变为空闲时通知一次
    fn check_idle(&mut self) {
        let idle = self.in_flight.is_empty()
            && !self.tasks.iter().any(|task| task.status == TaskStatus::Pending);
        if idle && self.busy {
            self.busy = false;
            let category = self.category;
            log::debug!("{} 队列已空闲", category);
            self.emit(QueueEvent::Idle { category });
        }
    }
}
