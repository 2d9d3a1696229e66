//! 完成列表：下载、上传、同步三个只追加的列表，与活动队列相互独立

use actix::prelude::*;
use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::core::store::JsonFile;
use crate::core::task::{Category, CompletedTask};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishLists {
    #[serde(default)]
    pub download_list: Vec<CompletedTask>,
    #[serde(default)]
    pub upload_list: Vec<CompletedTask>,
    #[serde(default)]
    pub sync_list: Vec<CompletedTask>,
}

impl FinishLists {
    pub fn list(&self, category: Category) -> &Vec<CompletedTask> {
        match category {
            Category::Download => &self.download_list,
            Category::Upload => &self.upload_list,
            Category::Sync => &self.sync_list,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<CompletedTask> {
        match category {
            Category::Download => &mut self.download_list,
            Category::Upload => &mut self.upload_list,
            Category::Sync => &mut self.sync_list,
        }
    }
}

/// 完成列表 Actor
pub struct CompletionLogActor {
    lists: FinishLists,
    file: JsonFile,
}

impl CompletionLogActor {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        let file = JsonFile::new(state_dir.as_ref().join("finish.json"));
        let lists = file.read().unwrap_or_default();
        Self { lists, file }
    }

    fn save(&self) {
        if let Err(e) = self.file.write(&self.lists) {
            log::error!("保存完成列表失败: {}", e);
        }
    }
}

impl Actor for CompletionLogActor {
    type Context = Context<Self>;
}

/// 记录一个到达终态的任务
pub struct RecordCompletion(pub CompletedTask);
impl Message for RecordCompletion { type Result = (); }
impl Handler<RecordCompletion> for CompletionLogActor {
    type Result = ();
    fn handle(&mut self, msg: RecordCompletion, _ctx: &mut Self::Context) {
        let entry = msg.0;
        log::debug!("完成列表记录: {} [{}]", entry.task.name(), entry.task.status);
        self.lists.list_mut(entry.category()).push(entry);
        self.save();
    }
}

/// 按完成时间顺序列出某一类
pub struct ListCompleted(pub Category);
impl Message for ListCompleted { type Result = Vec<CompletedTask>; }
impl Handler<ListCompleted> for CompletionLogActor {
    type Result = MessageResult<ListCompleted>;
    fn handle(&mut self, msg: ListCompleted, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.lists.list(msg.0).clone())
    }
}

/// 清空某一类，返回清除的条数
pub struct ClearCompleted(pub Category);
impl Message for ClearCompleted { type Result = usize; }
impl Handler<ClearCompleted> for CompletionLogActor {
    type Result = usize;
    fn handle(&mut self, msg: ClearCompleted, _ctx: &mut Self::Context) -> usize {
        let list = self.lists.list_mut(msg.0);
        let cleared = list.len();
        list.clear();
        self.save();
        cleared
    }
}
