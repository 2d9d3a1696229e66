mod progress;

use std::fmt;
pub use progress::ProgressManager;

use crate::core::queue::QueueStats;
use crate::core::task::{Category, CompletedTask, Task};

pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

pub fn print_error(message: &str) {
    println!("✗ {}", message);
}

/// 一次运行结束后的摘要
pub struct TransferSummary {
    pub stats: Vec<(Category, QueueStats)>,
    pub elapsed_time: std::time::Duration,
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n传输摘要 (耗时 {:.2}秒):", self.elapsed_time.as_secs_f64())?;
        for (category, stats) in &self.stats {
            writeln!(
                f,
                "  {:<8} 剩余 {} (等待 {} / 暂停 {} / 运行 {}) 已传输 {}",
                category,
                stats.total,
                stats.pending,
                stats.paused,
                stats.running,
                format_size(stats.transferred_bytes),
            )?;
        }
        Ok(())
    }
}

pub fn print_tasks(category: Category, tasks: &[Task]) {
    println!("[{}] {} 个任务", category, tasks.len());
    for task in tasks {
        println!(
            "  {} {:<6} {:>6.1}% {} / {}  {}",
            task.id,
            task.status,
            task.progress.percent(),
            format_size(task.progress.transferred),
            format_size(task.progress.total),
            task.name(),
        );
    }
}

pub fn print_completed(category: Category, entries: &[CompletedTask]) {
    println!("[{}] 完成列表 {} 条", category, entries.len());
    for entry in entries {
        let task = &entry.task;
        match &task.error {
            Some(err) => print_error(&format!(
                "{} {} {} ({})",
                entry.finished_at.format("%Y-%m-%d %H:%M:%S"),
                task.name(),
                task.status,
                err
            )),
            None => print_success(&format!(
                "{} {} {} {}",
                entry.finished_at.format("%Y-%m-%d %H:%M:%S"),
                task.name(),
                task.status,
                format_size(task.progress.transferred)
            )),
        }
    }
}

pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

pub fn format_speed(speed: u64) -> String {
    if speed > 1024 * 1024 {
        format!("{:.2} MB/s", speed as f64 / (1024.0 * 1024.0))
    } else if speed > 1024 {
        format!("{:.2} KB/s", speed as f64 / 1024.0)
    } else {
        format!("{} B/s", speed)
    }
}

pub fn format_eta(remaining: u64, speed: u64) -> String {
    if speed == 0 || remaining == 0 {
        return "未知".to_string();
    }
    let seconds = remaining / speed;
    if seconds > 3600 {
        format!("{}h{}m", seconds / 3600, (seconds % 3600) / 60)
    } else if seconds > 60 {
        format!("{}m{}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
