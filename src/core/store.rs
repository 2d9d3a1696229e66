//! 持久化：每个队列一个 JSON 快照文件，完成列表单独一个文件

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::TransferResult;
use crate::core::task::{Category, Task};

/// 单个 JSON 文件，整份写入，写临时文件后原子替换
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件不存在或内容损坏时返回 `None`，由调用方决定默认值
    pub fn read<T: DeserializeOwned>(&self) -> Option<T> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("读取状态文件失败 {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("状态文件已损坏 {}: {}，将使用空状态", self.path.display(), e);
                None
            }
        }
    }

    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> TransferResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// 删除文件，不存在时不算错误
    pub fn remove(&self) -> TransferResult<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// 队列快照
#[derive(Debug, Clone)]
pub struct QueueStore {
    file: JsonFile,
}

impl QueueStore {
    pub fn new(state_dir: impl AsRef<Path>, category: Category) -> Self {
        let path = state_dir.as_ref().join(format!("{}.json", category.as_str()));
        Self { file: JsonFile::new(path) }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// 恢复队列：运行中/等待中的任务一律转为暂停，需要用户手动继续
    pub fn load(&self) -> Vec<Task> {
        let tasks: Vec<Task> = self.file.read().unwrap_or_default();
        tasks
            .into_iter()
            .filter(|task| !task.status.is_terminal())
            .map(|mut task| {
                task.status = task.status.restored();
                task
            })
            .collect()
    }

    /// 写入失败只记录日志，内存中的队列仍然有效
    pub fn save(&self, tasks: &[Task]) {
        if let Err(e) = self.file.write(tasks) {
            log::error!("保存队列失败 {}: {}", self.file.path().display(), e);
        }
    }
}
