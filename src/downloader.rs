//! 直链下载实现：基于 awc 的分段（Range）下载，支持断点续传
//!
//! 分享页解析、上传等需要网盘协议的操作不在这里实现。

use async_trait::async_trait;
use awc::http::header::HeaderMap;
use awc::http::StatusCode;
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::config::Config;
use crate::core::error::{TransferError, TransferResult};
use crate::core::store::JsonFile;
use crate::core::task::{
    DownloadLinkPayload, DownloadPayload, ExecContext, TransferIo, TransferOutcome, UploadPayload,
};

pub struct HttpTransfer {
    client: awc::Client,
}

impl HttpTransfer {
    pub fn new(config: &Config) -> Self {
        let client = awc::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .add_default_header(("User-Agent", config.user_agent.clone()))
            .finish();
        Self { client }
    }
}

/// 续传信息，和下载文件放在同一目录
///
/// 只有记录了同一个链接时才会续传；`etag` / `last_modified` 通过 `If-Range`
/// 交给服务器校验，远端文件变化时服务器返回 200，从头下载。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeInfo {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub total_size: u64,
}

impl ResumeInfo {
    /// ETag 优先，其次 Last-Modified
    pub fn validator(&self) -> Option<&str> {
        self.etag.as_deref().or(self.last_modified.as_deref())
    }
}

pub fn resume_info_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".resume.json");
    destination.with_file_name(name)
}

/// 按 HTTP 状态码归类错误；成功状态返回 `None`
pub fn classify_status(status: StatusCode) -> Option<TransferError> {
    if status.is_success() {
        return None;
    }
    let code = status.as_u16();
    let err = match code {
        401 | 403 => TransferError::AuthExpired(format!("服务器拒绝访问: {}", status)),
        413 | 507 => TransferError::QuotaExceeded(format!("服务器空间不足: {}", status)),
        408 | 429 => TransferError::network(format!("服务器繁忙: {}", status)),
        _ if status.is_server_error() => TransferError::network(format!("服务器错误: {}", status)),
        _ => TransferError::unknown(format!("请求失败: {}", status)),
    };
    Some(err)
}

/// 解析 `Content-Range`：`bytes 60-99/100` 或 `bytes */100`，返回 (起始位置, 总大小)
pub fn parse_content_range(value: &str) -> Option<(Option<u64>, Option<u64>)> {
    let spec = value.trim().strip_prefix("bytes")?.trim();
    let (range, total) = spec.split_once('/')?;
    let total = total.trim().parse::<u64>().ok();
    let start = match range.trim() {
        "*" => None,
        range => Some(range.split_once('-')?.0.trim().parse::<u64>().ok()?),
    };
    Some((start, total))
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// 丢弃本地的部分文件和续传信息，下次从 0 开始
async fn discard_partial(destination: &Path, marker: &JsonFile) {
    let _ = tokio::fs::remove_file(destination).await;
    let _ = marker.remove();
}

#[async_trait(?Send)]
impl TransferIo for HttpTransfer {
    async fn upload(&self, payload: &UploadPayload, _cx: &ExecContext) -> TransferResult<TransferOutcome> {
        Err(TransferError::Unsupported(format!("上传 {}", payload.name)))
    }

    async fn download(&self, payload: &DownloadPayload, _cx: &ExecContext) -> TransferResult<TransferOutcome> {
        Err(TransferError::Unsupported(format!("分享链接解析 {}", payload.url)))
    }

    async fn download_link(&self, payload: &DownloadLinkPayload, cx: &ExecContext) -> TransferResult<TransferOutcome> {
        let destination = payload.dir.join(&payload.name);
        let marker = JsonFile::new(resume_info_path(&destination));

        // 续传位置以磁盘上的实际长度为准，不超过记录的进度
        let on_disk = match tokio::fs::metadata(&destination).await {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        let stored = marker.read::<ResumeInfo>().filter(|info| info.url == payload.url);
        let resume_from = match &stored {
            Some(_) => cx.resume_from.min(on_disk),
            None => 0,
        };

        let mut request = self.client.get(&payload.url);
        if resume_from > 0 {
            request = request.insert_header(("Range", format!("bytes={}-", resume_from)));
            if let Some(validator) = stored.as_ref().and_then(ResumeInfo::validator) {
                request = request.insert_header(("If-Range", validator.to_string()));
            }
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| TransferError::network(format!("请求失败: {}", e)))?;
        let status = response.status();

        if resume_from > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
            let total = header(response.headers(), "content-range")
                .and_then(|v| parse_content_range(&v))
                .and_then(|(_, total)| total);
            // 本地文件已经完整
            if total == Some(resume_from) {
                let _ = marker.remove();
                cx.progress.report(resume_from, resume_from);
                return Ok(local_outcome(destination, resume_from));
            }
            discard_partial(&destination, &marker).await;
            return Err(TransferError::network(format!("续传位置 {} 无效，将重新下载", resume_from)));
        }
        if let Some(err) = classify_status(status) {
            return Err(err);
        }

        let content_length = header(response.headers(), "content-length")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);
        let (offset, total) = if status == StatusCode::PARTIAL_CONTENT {
            let range = header(response.headers(), "content-range").and_then(|v| parse_content_range(&v));
            match range {
                Some((Some(start), total)) if start == resume_from => {
                    let fallback = if content_length > 0 { content_length + start } else { 0 };
                    (start, total.unwrap_or(fallback))
                }
                _ => {
                    discard_partial(&destination, &marker).await;
                    return Err(TransferError::network("服务器返回的续传范围与本地文件不一致"));
                }
            }
        } else {
            // 不支持 Range 或远端文件已变化：从头下载，并记录新的校验信息
            let info = ResumeInfo {
                url: payload.url.clone(),
                etag: header(response.headers(), "etag"),
                last_modified: header(response.headers(), "last-modified"),
                total_size: content_length,
            };
            if let Err(e) = marker.write(&info) {
                log::warn!("保存续传信息失败 {}: {}", destination.display(), e);
            }
            (0, content_length)
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = if offset > 0 {
            let mut file = tokio::fs::OpenOptions::new().write(true).open(&destination).await?;
            // 截掉续传位置之后的内容，避免重复写入
            file.set_len(offset).await?;
            file.seek(SeekFrom::Start(offset)).await?;
            file
        } else {
            tokio::fs::File::create(&destination).await?
        };

        let mut written = offset;
        cx.progress.report(written, total);
        while let Some(chunk) = response.next().await {
            if cx.cancel.is_cancelled() {
                file.flush().await?;
                return Err(TransferError::Cancelled);
            }
            let chunk: Bytes = chunk.map_err(|e| TransferError::network(format!("网络流错误: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            cx.progress.report(written, total);
        }
        file.flush().await?;

        if total > 0 && written < total {
            return Err(TransferError::network(format!(
                "连接提前断开: 预期 {} 字节, 实际 {} 字节",
                total, written
            )));
        }
        let _ = marker.remove();
        cx.progress.flush();
        log::debug!("直链下载完成: {} ({} 字节)", destination.display(), written);
        Ok(local_outcome(destination, written))
    }
}

fn local_outcome(path: PathBuf, bytes: u64) -> TransferOutcome {
    TransferOutcome { remote_id: None, local_path: Some(path), bytes }
}
