//! CLI: 命令行接口和参数解析模块
//!
//! ## 支持的命令
//!
//! - 添加分享链接：`lzt add "资料.zip https://wwn.lanzouf.com/iAbc123 密码:ab12"`
//! - 直链下载：`lzt fetch https://example.com/a.zip`
//! - 查看队列：`lzt list`
//! - 查看完成列表：`lzt finished download`
//! - 清空完成列表：`lzt clear-finished download`
//! - 编辑配置：`lzt -e`
//!
//! ## 平台支持
//!
//! - Windows: `%APPDATA%/lzt/lzt.toml`
//! - macOS: `~/Library/Application Support/lzt/lzt.toml`
//! - Linux: `~/.config/lzt/lzt.toml`

use clap::{Parser, Subcommand};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::error::TransferError;
use crate::core::task::{
    Category, DownloadLinkPayload, DownloadPayload, SyncPayload, SyncSource, Task, TaskPayload, UrlType,
};
use crate::utils::validator::{file_name_from_url, is_valid_url, parse_share_text, ShareLink};

/// 获取平台默认配置文件路径
pub fn default_config_path() -> String {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        format!("{}/lzt/lzt.toml", appdata)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/Library/Application Support/lzt/lzt.toml", home)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{}/.config/lzt/lzt.toml", home)
    }
}

/// 打开配置文件编辑器
pub fn open_config_in_editor(config_path: &str) {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("notepad").arg(config_path).status().ok();
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg("-e").arg(config_path).status().ok();
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // 优先 xdg-open，否则 nano
        if std::process::Command::new("xdg-open").arg(config_path).status().is_err() {
            let _ = std::process::Command::new("nano").arg(config_path).status();
        }
    }
}

/// lzt 命令行参数
///
/// 示例用法：
///   lzt fetch https://example.com/file.zip
///   lzt add -f share.txt --sync --folder 1234 --trash
///   lzt -c /path/to/lzt.toml list
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lzt",
    author = "panzhifu",
    version = env!("CARGO_PKG_VERSION"),
    about = "蓝奏云传输队列：上传、下载、同步任务的调度与断点续传",
)]
pub struct Args {
    /// 配置文件路径，默认为平台推荐路径
    #[arg(short = 'c', long, global = true, default_value_t = default_config_path())]
    pub config: String,

    /// 用系统默认编辑器打开配置文件并退出
    #[arg(short = 'e', long = "edit")]
    pub edit_config: bool,

    /// 下载目录，覆盖配置文件中的设置
    #[arg(short = 'd', long, global = true)]
    pub download_dir: Option<String>,

    /// 状态目录（队列快照与完成列表）
    #[arg(long, global = true)]
    pub state_dir: Option<String>,

    /// 同时下载数量
    #[arg(long, global = true)]
    pub download_limit: Option<usize>,

    /// 同时上传数量
    #[arg(long, global = true)]
    pub upload_limit: Option<usize>,

    /// 打印构建信息
    #[arg(long)]
    pub build_info: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// 添加分享链接下载（每行 `[文件名] 链接 [密码:xxxx]`）
    Add {
        /// 分享文本或链接
        text: Vec<String>,
        /// 从文件读取分享文本
        #[arg(short, long)]
        file: Option<String>,
        /// 提取码，覆盖分享文本中的密码
        #[arg(long)]
        pwd: Option<String>,
        /// 链接指向文件夹
        #[arg(long)]
        folder_link: bool,
        /// 作为同步任务添加：下载后整理网盘中的源文件
        #[arg(long)]
        sync: bool,
        /// 同步完成后移动到的网盘目录 id
        #[arg(long, default_value = "-1")]
        folder: String,
        /// 同步完成后把源文件移入回收站
        #[arg(long)]
        trash: bool,
    },
    /// 直链下载，按队列并发执行并显示进度
    Fetch {
        urls: Vec<String>,
        /// 指定文件名（只对单个链接有效）
        #[arg(short = 'n', long)]
        name: Option<String>,
    },
    /// 继续执行已保存的队列
    Resume,
    /// 列出队列中的任务
    List,
    /// 查看完成列表
    Finished {
        category: Option<Category>,
    },
    /// 清空某一类完成列表
    ClearFinished {
        category: Category,
    },
}

impl Args {
    pub fn parse_args() -> Result<(Self, Config), TransferError> {
        Self::from_args(Args::parse())
    }

    /// 加载（或创建）配置文件，合并命令行参数并校验
    pub fn from_args(args: Args) -> Result<(Self, Config), TransferError> {
        if args.edit_config {
            if !Path::new(&args.config).exists() {
                Config::default().save_with_tutorial(&args.config)?;
            }
            open_config_in_editor(&args.config);
            std::process::exit(0);
        }

        let mut config = Config::load(&args.config)?;
        config.merge_from_args(&args);
        config.validate()?;

        Ok((args, config))
    }
}

/// 把 `add` 的参数转换成任务
pub fn share_tasks(command: &Command, download_dir: &Path) -> Result<Vec<Task>, TransferError> {
    let Command::Add { text, file, pwd, folder_link, sync, folder, trash } = command else {
        return Ok(Vec::new());
    };

    let mut content = text.join("\n");
    if let Some(file_path) = file {
        let from_file = fs::read_to_string(file_path)
            .map_err(|e| TransferError::invalid_config(format!("无法读取分享文件 {}: {}", file_path, e)))?;
        content.push('\n');
        content.push_str(&from_file);
    }

    let links = parse_share_text(&content);
    if links.is_empty() {
        return Err(TransferError::invalid_config("未找到有效的分享链接"));
    }

    let tasks = links
        .into_iter()
        .map(|link| {
            let download = share_payload(link, pwd.clone(), *folder_link, download_dir);
            let payload = if *sync {
                TaskPayload::Sync(SyncPayload {
                    folder_id: folder.clone(),
                    trash_on_finish: *trash,
                    source: SyncSource::Download(download),
                })
            } else {
                TaskPayload::Download(download)
            };
            Task::new(payload)
        })
        .collect();
    Ok(tasks)
}

fn share_payload(link: ShareLink, pwd: Option<String>, folder_link: bool, dir: &Path) -> DownloadPayload {
    let name = link
        .name
        .or_else(|| file_name_from_url(&link.url))
        .unwrap_or_else(|| "unnamed".to_string());
    DownloadPayload {
        url: link.url,
        pwd: pwd.or(link.pwd),
        url_type: if folder_link { UrlType::Folder } else { UrlType::File },
        name,
        dir: dir.to_path_buf(),
        merge: false,
    }
}

/// 把 `fetch` 的链接转换成直链下载任务
pub fn link_tasks(urls: &[String], name: Option<&str>, download_dir: &Path) -> Result<Vec<Task>, TransferError> {
    if urls.is_empty() {
        return Err(TransferError::invalid_config("未提供任何URL"));
    }
    let mut tasks = Vec::with_capacity(urls.len());
    for url in urls {
        if !is_valid_url(url) {
            return Err(TransferError::invalid_config(format!("无效的URL: {}", url)));
        }
        let name = match name {
            Some(name) if urls.len() == 1 => name.to_string(),
            _ => file_name_from_url(url)
                .unwrap_or_else(|| format!("download_{}", chrono::Utc::now().timestamp())),
        };
        tasks.push(Task::new(TaskPayload::DownloadLink(DownloadLinkPayload {
            url: url.clone(),
            dir: PathBuf::from(download_dir),
            name,
        })));
    }
    Ok(tasks)
}
