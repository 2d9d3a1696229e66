use actix::{Message, Recipient};
use serde::Serialize;
use uuid::Uuid;

use crate::core::error::TransferResult;
use crate::core::task::{Category, CompletedTask, Progress, Task, TaskStatus};

/// 队列向订阅者发出的通知
#[derive(Debug, Clone)]
pub enum QueueEvent {
    StatusChanged {
        category: Category,
        task_id: Uuid,
        status: TaskStatus,
    },
    Progress {
        category: Category,
        task_id: Uuid,
        progress: Progress,
    },
    /// 每个任务到达终态时发送一次
    Finished(CompletedTask),
    /// 非运行中的任务被用户移除（不进入完成列表）
    Removed {
        category: Category,
        task_id: Uuid,
    },
    /// 队列从忙碌变为完全空闲（无运行、无等待）
    Idle {
        category: Category,
    },
    /// 登录过期，需要应用层提示重新登录
    AuthExpired {
        category: Category,
        task_id: Uuid,
        message: String,
    },
}
impl Message for QueueEvent { type Result = (); }

/// 追加任务，返回接受的数量
pub struct AddTasks(pub Vec<Task>);
impl Message for AddTasks { type Result = usize; }

/// 移除任务；运行中的任务先取消，结束后才真正移除
pub struct RemoveTask(pub Uuid);
impl Message for RemoveTask { type Result = bool; }

/// 取消任务，结果进入完成列表
pub struct CancelTask(pub Uuid);
impl Message for CancelTask { type Result = bool; }

pub struct PauseTask(pub Uuid);
impl Message for PauseTask { type Result = (); }

pub struct ResumeTask(pub Uuid);
impl Message for ResumeTask { type Result = (); }

pub struct PauseAll;
impl Message for PauseAll { type Result = usize; }

pub struct ResumeAll;
impl Message for ResumeAll { type Result = usize; }

pub struct SetConcurrencyLimit(pub usize);
impl Message for SetConcurrencyLimit { type Result = TransferResult<()>; }

/// 按调度顺序返回任务快照
pub struct ListTasks;
impl Message for ListTasks { type Result = Vec<Task>; }

pub struct GetTask(pub Uuid);
impl Message for GetTask { type Result = Option<Task>; }

pub struct GetStats;
impl Message for GetStats { type Result = QueueStats; }

pub struct Subscribe(pub Recipient<QueueEvent>);
impl Message for Subscribe { type Result = (); }

/// 队列统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub paused: usize,
    /// 已准入且尚未结束的执行数
    pub running: usize,
    pub concurrency_limit: usize,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
}
