use chrono::Local;
use log::LevelFilter;
use std::io::{Write, BufWriter};
use std::fs::{File, OpenOptions};
use std::path::Path;
use actix::prelude::*;

use crate::core::queue::QueueEvent;

/// 日志消息
pub struct LogMsg {
    pub level: LevelFilter,
    pub message: String,
}
impl Message for LogMsg { type Result = (); }

/// 传输日志 Actor：写入文件并按大小轮转，同时订阅队列事件
pub struct LoggerActor {
    pub writer: BufWriter<File>,
    pub level: LevelFilter,
    pub file_path: String,
    pub max_size: u64, // 最大文件大小 (bytes)
    pub current_size: u64,
}

impl LoggerActor {
    pub fn new(file_path: &str, level: LevelFilter, max_size: u64) -> Result<Self, std::io::Error> {
        if let Some(parent) = Path::new(file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            writer: BufWriter::new(file),
            level,
            file_path: file_path.to_string(),
            max_size,
            current_size,
        })
    }

    /// 超过大小上限时把当前文件改名为 `.backup` 并重新开始
    fn check_rotation(&mut self) -> Result<(), std::io::Error> {
        if self.current_size > self.max_size {
            self.writer.flush()?;

            let backup_path = format!("{}.backup", self.file_path);
            if Path::new(&backup_path).exists() {
                std::fs::remove_file(&backup_path)?;
            }
            std::fs::rename(&self.file_path, &backup_path)?;

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)?;

            self.writer = BufWriter::new(file);
            self.current_size = 0;
        }
        Ok(())
    }

    fn write_log(&mut self, level: LevelFilter, message: &str) -> Result<(), std::io::Error> {
        if level <= self.level {
            let log_entry = format!(
                "{} [{}] - {}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level,
                message
            );

            self.check_rotation()?;
            self.writer.write_all(log_entry.as_bytes())?;
            self.current_size += log_entry.len() as u64;
            self.writer.flush()?;
        }
        Ok(())
    }
}

impl Actor for LoggerActor {
    type Context = Context<Self>;
}

impl Handler<LogMsg> for LoggerActor {
    type Result = ();
    fn handle(&mut self, msg: LogMsg, _ctx: &mut Self::Context) {
        if let Err(e) = self.write_log(msg.level, &msg.message) {
            eprintln!("日志写入失败: {}", e);
        }
    }
}

impl Handler<QueueEvent> for LoggerActor {
    type Result = ();
    fn handle(&mut self, msg: QueueEvent, _ctx: &mut Self::Context) {
        let (level, message) = match msg {
            QueueEvent::StatusChanged { category, task_id, status } => {
                (LevelFilter::Debug, format!("[{}] {} -> {}", category, task_id, status))
            }
            QueueEvent::Finished(entry) => {
                let task = &entry.task;
                let level = if task.error.is_some() { LevelFilter::Warn } else { LevelFilter::Info };
                let detail = task.error.as_deref().unwrap_or("");
                (level, format!("[{}] {} {} {}", task.category(), task.name(), task.status, detail))
            }
            QueueEvent::Removed { category, task_id } => {
                (LevelFilter::Info, format!("[{}] 移除任务 {}", category, task_id))
            }
            QueueEvent::Idle { category } => (LevelFilter::Info, format!("[{}] 队列空闲", category)),
            QueueEvent::AuthExpired { category, task_id, message } => {
                (LevelFilter::Error, format!("[{}] {} {}", category, task_id, message))
            }
            QueueEvent::Progress { .. } => return,
        };
        if let Err(e) = self.write_log(level, message.trim_end()) {
            eprintln!("日志写入失败: {}", e);
        }
    }
}

// 便捷的日志方法 - 为Addr<LoggerActor>提供扩展方法
pub trait LoggerExt {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
}

impl LoggerExt for Addr<LoggerActor> {
    fn info(&self, message: &str) {
        self.do_send(LogMsg { level: LevelFilter::Info, message: message.to_string() });
    }

    fn error(&self, message: &str) {
        self.do_send(LogMsg { level: LevelFilter::Error, message: message.to_string() });
    }

    fn warn(&self, message: &str) {
        self.do_send(LogMsg { level: LevelFilter::Warn, message: message.to_string() });
    }
}
