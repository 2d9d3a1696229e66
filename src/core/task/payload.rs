use serde::{Serialize, Deserialize};
use std::path::PathBuf;

/// 分享链接指向的资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UrlType {
    #[default]
    File,
    Folder,
}

/// 上传本地文件到网盘目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    pub file: PathBuf,
    pub folder_id: String,
    pub name: String,
    pub size: u64,
}

/// 通过分享链接下载（需要解析分享页，可能带提取码）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPayload {
    pub url: String,
    pub pwd: Option<String>,
    #[serde(default)]
    pub url_type: UrlType,
    pub name: String,
    pub dir: PathBuf,
    /// 文件夹下载完成后是否合并分卷
    #[serde(default)]
    pub merge: bool,
}

/// 直链下载，不经过分享页解析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLinkPayload {
    pub url: String,
    pub dir: PathBuf,
    pub name: String,
}

/// 同步任务内部的下载部分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncSource {
    Download(DownloadPayload),
    DownloadLink(DownloadLinkPayload),
}

/// 同步任务：先下载，再把结果移入回收站或目标目录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub folder_id: String,
    #[serde(default)]
    pub trash_on_finish: bool,
    pub source: SyncSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskPayload {
    Upload(UploadPayload),
    Download(DownloadPayload),
    DownloadLink(DownloadLinkPayload),
    Sync(SyncPayload),
}

impl TaskPayload {
    pub fn name(&self) -> &str {
        match self {
            TaskPayload::Upload(p) => &p.name,
            TaskPayload::Download(p) => &p.name,
            TaskPayload::DownloadLink(p) => &p.name,
            TaskPayload::Sync(p) => match &p.source {
                SyncSource::Download(d) => &d.name,
                SyncSource::DownloadLink(d) => &d.name,
            },
        }
    }
}
