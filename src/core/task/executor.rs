//! 任务执行：把任务负载分发给外部传输实现

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::error::{TransferError, TransferResult};
use super::payload::{DownloadLinkPayload, DownloadPayload, TaskPayload, UploadPayload};
use super::progress::ExecContext;
use super::sync::run_sync;

/// 一次传输的结果，同步任务的后续步骤会用到
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// 网盘上的文件 id（上传结果，或下载源在网盘中的文件）
    pub remote_id: Option<String>,
    /// 本地文件路径（下载结果）
    pub local_path: Option<PathBuf>,
    pub bytes: u64,
}

/// 字节传输实现：分段下载、分片上传
///
/// 实现方必须尽力响应 `cx.cancel`，并通过 `cx.progress` 上报绝对字节数
/// （从 `cx.resume_from` 开始计）。
#[async_trait(?Send)]
pub trait TransferIo {
    async fn upload(&self, payload: &UploadPayload, cx: &ExecContext) -> TransferResult<TransferOutcome>;

    async fn download(&self, payload: &DownloadPayload, cx: &ExecContext) -> TransferResult<TransferOutcome>;

    async fn download_link(&self, payload: &DownloadLinkPayload, cx: &ExecContext) -> TransferResult<TransferOutcome>;
}

/// 网盘文件操作：移动、删除到回收站。调度器不会重试这些调用
#[async_trait(?Send)]
pub trait RemoteFiles {
    async fn move_to_trash(&self, outcome: &TransferOutcome) -> TransferResult<()>;

    async fn move_to_folder(&self, outcome: &TransferOutcome, folder_id: &str) -> TransferResult<()>;
}

/// 不支持任何网盘文件操作，直链下载场景使用
pub struct NoRemoteFiles;

#[async_trait(?Send)]
impl RemoteFiles for NoRemoteFiles {
    async fn move_to_trash(&self, _outcome: &TransferOutcome) -> TransferResult<()> {
        Err(TransferError::Unsupported("移动到回收站".to_string()))
    }

    async fn move_to_folder(&self, _outcome: &TransferOutcome, folder_id: &str) -> TransferResult<()> {
        Err(TransferError::Unsupported(format!("移动到目录 {}", folder_id)))
    }
}

#[derive(Clone)]
pub struct TaskExecutor {
    pub io: Arc<dyn TransferIo>,
    pub files: Arc<dyn RemoteFiles>,
}

impl TaskExecutor {
    pub fn new(io: Arc<dyn TransferIo>, files: Arc<dyn RemoteFiles>) -> Self {
        Self { io, files }
    }

    pub async fn execute(&self, payload: &TaskPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
        if cx.cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let outcome = match payload {
            TaskPayload::Upload(p) => self.io.upload(p, cx).await,
            TaskPayload::Download(p) => self.io.download(p, cx).await,
            TaskPayload::DownloadLink(p) => self.io.download_link(p, cx).await,
            TaskPayload::Sync(p) => run_sync(self, p, cx).await,
        };
        // 取消请求之后的任何失败都按取消处理
        match outcome {
            Err(_) if cx.cancel.is_cancelled() => Err(TransferError::Cancelled),
            other => other,
        }
    }
}
