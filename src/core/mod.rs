//! Core: 传输任务的状态机、按类别的队列调度、持久化与完成列表

pub mod error;
pub mod task;
pub mod queue;
pub mod store;
pub mod finish;
pub mod manager;

pub use error::{TransferError, TransferResult};
pub use manager::TransferManager;
pub use queue::{QueueEvent, QueueStats, TransferQueueActor};
pub use task::{Category, CompletedTask, Task, TaskPayload, TaskStatus};
