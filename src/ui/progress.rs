use std::collections::HashMap;
use std::time::Instant;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use uuid::Uuid;

use crate::core::task::{Task, TaskStatus};
use super::{format_eta, format_size, format_speed};

struct TaskBar {
    bar: ProgressBar,
    last_bytes: u64,
    last_tick: Instant,
}

// 结构体：ProgressManager
// 每个任务一个进度条，根据队列快照刷新
pub struct ProgressManager {
    multi: MultiProgress,
    bars: HashMap<Uuid, TaskBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    pub fn new() -> Self {
        ProgressManager {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    /// 用最新的任务快照刷新进度条；不在快照里的任务视为已结束
    pub fn update(&mut self, tasks: &[Task]) {
        for task in tasks {
            let entry = self.bars.entry(task.id).or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new(task.progress.total));
                bar.set_style(Self::style());
                bar.set_prefix(task.name().to_string());
                TaskBar { bar, last_bytes: task.progress.transferred, last_tick: Instant::now() }
            });

            if task.progress.total > 0 {
                entry.bar.set_length(task.progress.total);
            }
            entry.bar.set_position(task.progress.transferred);

            let elapsed = entry.last_tick.elapsed().as_secs_f64();
            let speed = if elapsed > 0.0 {
                (task.progress.transferred.saturating_sub(entry.last_bytes) as f64 / elapsed) as u64
            } else {
                0
            };
            entry.last_bytes = task.progress.transferred;
            entry.last_tick = Instant::now();

            let message = match task.status {
                TaskStatus::Running => format!(
                    "{:.0}% | {} | ETA:{}",
                    task.progress.percent(),
                    format_speed(speed),
                    format_eta(task.progress.total.saturating_sub(task.progress.transferred), speed)
                ),
                status => status.to_string(),
            };
            entry.bar.set_message(message);
        }

        let live: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        self.bars.retain(|id, entry| {
            if live.contains(id) {
                true
            } else {
                entry.bar.finish_with_message(format!("结束 {}", format_size(entry.last_bytes)));
                false
            }
        });
    }

    pub fn finish(&mut self) {
        for (_, entry) in self.bars.drain() {
            entry.bar.abandon();
        }
    }
}
