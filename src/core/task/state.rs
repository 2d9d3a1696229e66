use serde::{Serialize, Deserialize};
use std::fmt;

/// 传输任务状态
///
/// 初始状态为 `Pending`，终态为 `Success`、`Error`、`Cancelled`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Paused,
    Success,
    Error,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Error | TaskStatus::Cancelled)
    }

    /// pending|running -> paused
    pub fn can_pause(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// paused -> pending
    pub fn can_resume(self) -> bool {
        self == TaskStatus::Paused
    }

    /// pending|paused|running -> cancelled
    pub fn can_cancel(self) -> bool {
        !self.is_terminal()
    }

    /// 重启后恢复：运行中和等待中的任务一律转为暂停，其余保持不变
    pub fn restored(self) -> Self {
        match self {
            TaskStatus::Running | TaskStatus::Pending => TaskStatus::Paused,
            other => other,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "等待中",
            TaskStatus::Running => "传输中",
            TaskStatus::Paused => "已暂停",
            TaskStatus::Success => "已完成",
            TaskStatus::Error => "失败",
            TaskStatus::Cancelled => "已取消",
        };
        f.pad(s)
    }
}
