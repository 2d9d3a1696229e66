//! lanzou-transfer: 网盘客户端的传输任务调度器
//!
//! 上传、下载、同步三个队列各自限制并发，任务状态持久化到磁盘，
//! 重启后未完成的任务以暂停状态恢复。

pub mod cli;
pub mod config;
pub mod core;
pub mod downloader;
pub mod ui;
pub mod utils;
