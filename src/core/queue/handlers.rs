use actix::prelude::*;

use crate::core::error::TransferResult;
use crate::core::task::{Task, TaskProgress, TaskStatus};
use super::actor::{Intent, TransferQueueActor};
use super::messages::*;

impl Handler<AddTasks> for TransferQueueActor {
    type Result = usize;
    fn handle(&mut self, msg: AddTasks, ctx: &mut Self::Context) -> usize {
        let count = self.enqueue(msg.0);
        self.schedule(ctx);
        count
    }
}

impl Handler<RemoveTask> for TransferQueueActor {
    type Result = bool;
    fn handle(&mut self, msg: RemoveTask, ctx: &mut Self::Context) -> bool {
        let id = msg.0;
        let removed = if self.is_in_flight(id) {
            // 结束后以 cancelled 进入完成列表；重复移除无效
            self.cancel_in_flight(id)
        } else if let Some(idx) = self.position(id) {
            self.discard(idx);
            true
        } else {
            false
        };
        self.schedule(ctx);
        removed
    }
}

impl Handler<CancelTask> for TransferQueueActor {
    type Result = bool;
    fn handle(&mut self, msg: CancelTask, ctx: &mut Self::Context) -> bool {
        let id = msg.0;
        let cancelled = if self.is_in_flight(id) {
            self.cancel_in_flight(id)
        } else {
            match self.position(id) {
                Some(idx) if self.tasks[idx].status.can_cancel() => {
                    self.finish(idx, TaskStatus::Cancelled, None);
                    true
                }
                _ => false,
            }
        };
        self.schedule(ctx);
        cancelled
    }
}

impl Handler<PauseTask> for TransferQueueActor {
    type Result = ();
    fn handle(&mut self, msg: PauseTask, ctx: &mut Self::Context) {
        if self.pause_task(msg.0) {
            self.persist();
        }
        self.schedule(ctx);
    }
}

impl Handler<ResumeTask> for TransferQueueActor {
    type Result = ();
    fn handle(&mut self, msg: ResumeTask, ctx: &mut Self::Context) {
        if self.resume_task(msg.0) {
            self.persist();
        }
        self.schedule(ctx);
    }
}

impl Handler<PauseAll> for TransferQueueActor {
    type Result = usize;
    fn handle(&mut self, _msg: PauseAll, ctx: &mut Self::Context) -> usize {
        let ids: Vec<_> = self.tasks.iter().map(|task| task.id).collect();
        let paused = ids.into_iter().filter(|id| self.pause_task(*id)).count();
        if paused > 0 {
            self.persist();
        }
        self.schedule(ctx);
        paused
    }
}

impl Handler<ResumeAll> for TransferQueueActor {
    type Result = usize;
    fn handle(&mut self, _msg: ResumeAll, ctx: &mut Self::Context) -> usize {
        let ids: Vec<_> = self.tasks.iter().map(|task| task.id).collect();
        let resumed = ids.into_iter().filter(|id| self.resume_task(*id)).count();
        if resumed > 0 {
            self.persist();
        }
        self.schedule(ctx);
        resumed
    }
}

impl Handler<SetConcurrencyLimit> for TransferQueueActor {
    type Result = TransferResult<()>;
    fn handle(&mut self, msg: SetConcurrencyLimit, ctx: &mut Self::Context) -> Self::Result {
        self.set_limit(msg.0)?;
        // 调小只影响之后的准入，运行中的任务不会被抢占
        self.schedule(ctx);
        Ok(())
    }
}

impl Handler<ListTasks> for TransferQueueActor {
    type Result = MessageResult<ListTasks>;
    fn handle(&mut self, _msg: ListTasks, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.tasks.clone())
    }
}

impl Handler<GetTask> for TransferQueueActor {
    type Result = Option<Task>;
    fn handle(&mut self, msg: GetTask, _ctx: &mut Self::Context) -> Option<Task> {
        self.position(msg.0).map(|idx| self.tasks[idx].clone())
    }
}

impl Handler<GetStats> for TransferQueueActor {
    type Result = MessageResult<GetStats>;
    fn handle(&mut self, _msg: GetStats, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.stats())
    }
}

impl Handler<Subscribe> for TransferQueueActor {
    type Result = ();
    fn handle(&mut self, msg: Subscribe, _ctx: &mut Self::Context) {
        self.subscribe(msg.0);
    }
}

impl Handler<TaskProgress> for TransferQueueActor {
    type Result = ();
    fn handle(&mut self, msg: TaskProgress, _ctx: &mut Self::Context) {
        // 只接受当前这次执行的进度，暂停/取消/重试之后的迟到消息丢弃
        match self.in_flight.get(&msg.task_id) {
            Some(flight) if flight.attempt == msg.attempt && flight.intent == Intent::Run => {}
            _ => return,
        }
        let Some(idx) = self.position(msg.task_id) else { return };
        let task = &mut self.tasks[idx];
        if task.status != TaskStatus::Running {
            return;
        }
        task.advance_progress(msg.progress);
        let progress = task.progress;
        let category = self.category;
        self.emit(QueueEvent::Progress { category, task_id: msg.task_id, progress });
        self.persist();
    }
}
