use actix::prelude::*;
use std::collections::HashMap;

use crate::config::Config;
use crate::core::error::TransferResult;
use crate::core::finish::{ClearCompleted, CompletionLogActor, ListCompleted};
use crate::core::queue::{
    AddTasks, GetStats, QueueEvent, QueueStats, SetConcurrencyLimit, Subscribe, TransferQueueActor,
};
use crate::core::store::QueueStore;
use crate::core::task::{Category, CompletedTask, Task, TaskExecutor};

/// 进程内唯一的传输管理器：三个队列与完成列表
///
/// 启动时构造一次，克隆后交给界面、命令行或测试使用。
#[derive(Clone)]
pub struct TransferManager {
    pub upload: Addr<TransferQueueActor>,
    pub download: Addr<TransferQueueActor>,
    pub sync: Addr<TransferQueueActor>,
    pub finish: Addr<CompletionLogActor>,
}

impl TransferManager {
    /// 在当前 System 上启动所有队列，并从 `state_dir` 恢复状态
    pub fn start(config: &Config, executor: TaskExecutor) -> Self {
        let finish = CompletionLogActor::new(&config.state_dir).start();
        let start_queue = |category: Category| {
            TransferQueueActor::new(
                category,
                config.queue_options(category),
                QueueStore::new(&config.state_dir, category),
                executor.clone(),
            )
            .with_completion_log(finish.clone().recipient())
            .start()
        };
        Self {
            upload: start_queue(Category::Upload),
            download: start_queue(Category::Download),
            sync: start_queue(Category::Sync),
            finish,
        }
    }

    pub fn queue(&self, category: Category) -> &Addr<TransferQueueActor> {
        match category {
            Category::Upload => &self.upload,
            Category::Download => &self.download,
            Category::Sync => &self.sync,
        }
    }

    /// 按类别分发到对应队列，返回接受的总数
    pub async fn add_tasks(&self, tasks: Vec<Task>) -> TransferResult<usize> {
        let mut grouped: HashMap<Category, Vec<Task>> = HashMap::new();
        for task in tasks {
            grouped.entry(task.category()).or_default().push(task);
        }
        let mut accepted = 0;
        for category in Category::ALL {
            if let Some(tasks) = grouped.remove(&category) {
                accepted += self.queue(category).send(AddTasks(tasks)).await?;
            }
        }
        Ok(accepted)
    }

    /// 配置变更实时生效
    pub async fn set_concurrency_limit(&self, category: Category, limit: usize) -> TransferResult<()> {
        self.queue(category).send(SetConcurrencyLimit(limit)).await?
    }

    pub fn subscribe(&self, listener: Recipient<QueueEvent>) {
        for category in Category::ALL {
            self.queue(category).do_send(Subscribe(listener.clone()));
        }
    }

    pub async fn stats(&self) -> TransferResult<Vec<(Category, QueueStats)>> {
        let mut all = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            all.push((category, self.queue(category).send(GetStats).await?));
        }
        Ok(all)
    }

    pub async fn completed(&self, category: Category) -> TransferResult<Vec<CompletedTask>> {
        Ok(self.finish.send(ListCompleted(category)).await?)
    }

    pub async fn clear_completed(&self, category: Category) -> TransferResult<usize> {
        Ok(self.finish.send(ClearCompleted(category)).await?)
    }
}
