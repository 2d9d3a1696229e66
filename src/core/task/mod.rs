//! `task` 模块包含与单个传输任务相关的所有逻辑
//!
//! 主要包括：
//! - `state`: 任务状态 `TaskStatus` 与合法转换
//! - `model`: 任务记录 `Task`、进度、队列类别、完成条目
//! - `payload`: 各任务变体的负载（上传、下载、直链下载、同步）
//! - `progress`: 限速进度上报与取消标记
//! - `executor`: 外部传输接口与任务执行分发
//! - `sync`: 同步任务的组合执行
//! - `retry`: 重试策略

pub mod state;
pub mod model;
pub mod payload;
pub mod progress;
pub mod executor;
pub mod sync;
pub mod retry;

pub use state::TaskStatus;
pub use model::{Category, CompletedTask, Progress, Task};
pub use payload::*;
pub use progress::{CancelFlag, ExecContext, ProgressReporter, TaskProgress};
pub use executor::{NoRemoteFiles, RemoteFiles, TaskExecutor, TransferIo, TransferOutcome};
pub use retry::RetryStrategy;
