use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::TransferError;
use super::payload::TaskPayload;
use super::state::TaskStatus;

/// 队列类别，每个类别一个独立的队列和并发上限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Upload,
    Download,
    Sync,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Upload, Category::Download, Category::Sync];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Upload => "upload",
            Category::Download => "download",
            Category::Sync => "sync",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upload" => Ok(Category::Upload),
            "download" => Ok(Category::Download),
            "sync" => Ok(Category::Sync),
            other => Err(TransferError::invalid_config(format!("未知的队列类别: {}", other))),
        }
    }
}

/// 传输进度（字节）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub transferred: u64,
    pub total: u64,
}

impl Progress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.transferred as f32 / self.total as f32 * 100.0).min(100.0)
        }
    }
}

/// 一个传输任务（单个文件/文件夹）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// 已消耗的自动重试次数
    #[serde(default)]
    pub retries: u32,
    pub payload: TaskPayload,
}

impl Task {
    pub fn new(payload: TaskPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: TaskStatus::Pending,
            progress: Progress::default(),
            error: None,
            created_at: Utc::now(),
            retries: 0,
            payload,
        }
    }

    pub fn category(&self) -> Category {
        match self.payload {
            TaskPayload::Upload(_) => Category::Upload,
            TaskPayload::Download(_) | TaskPayload::DownloadLink(_) => Category::Download,
            TaskPayload::Sync(_) => Category::Sync,
        }
    }

    pub fn name(&self) -> &str {
        self.payload.name()
    }

    /// 运行中只允许进度前进；总大小以最新上报为准
    pub fn advance_progress(&mut self, progress: Progress) {
        self.progress.transferred = self.progress.transferred.max(progress.transferred);
        if progress.total > 0 {
            self.progress.total = progress.total;
        }
    }

    /// 自动重试：回到等待状态，进度清零
    pub fn reset_for_retry(&mut self) {
        self.status = TaskStatus::Pending;
        self.progress.transferred = 0;
        self.retries += 1;
    }
}

/// 完成列表中的条目：任务到达终态时的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTask {
    pub task: Task,
    pub finished_at: DateTime<Utc>,
}

impl CompletedTask {
    pub fn from_task(task: Task) -> Self {
        Self { task, finished_at: Utc::now() }
    }

    pub fn category(&self) -> Category {
        self.task.category()
    }
}
