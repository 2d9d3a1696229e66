//! `queue` 模块：按类别（上传/下载/同步）划分的任务队列与调度
//!
//! - `actor`: `TransferQueueActor`，持有有序任务列表、并发上限与调度逻辑
//! - `messages`: 队列对外的消息与事件
//! - `handlers`: 消息处理器

pub mod actor;
pub mod messages;
mod handlers;

pub use actor::{QueueOptions, TransferQueueActor};
pub use messages::*;
