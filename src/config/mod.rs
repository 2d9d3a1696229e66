use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use crate::core::error::TransferError;
use crate::core::queue::QueueOptions;
use crate::core::task::{Category, RetryStrategy};

/// 配置结构体
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 同时上传数量
    pub upload_concurrency_limit: usize,
    /// 同时下载数量
    pub download_concurrency_limit: usize,
    /// 同时同步数量
    pub sync_concurrency_limit: usize,
    /// 默认下载目录
    pub download_dir: String,
    /// 队列状态与完成列表的保存目录
    pub state_dir: String,
    /// 网络错误的自动重试次数
    pub retry_count: u32,
    /// 重试基础延迟（毫秒）
    pub retry_delay_ms: u64,
    /// 最大重试延迟（毫秒）
    pub retry_max_delay_ms: u64,
    /// 进度上报最小间隔（毫秒）
    pub progress_interval_ms: u64,
    /// 网络超时时间（秒）
    pub timeout: u64,
    /// User-Agent，需要与登录时的 cookie 匹配
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_concurrency_limit: 1,
            download_concurrency_limit: 2,
            sync_concurrency_limit: 1,
            download_dir: "./downloads".to_string(),
            state_dir: "./state".to_string(),
            retry_count: 3,
            retry_delay_ms: 2000,
            retry_max_delay_ms: 60_000,
            progress_interval_ms: 500,
            timeout: 30,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.5615.204 Safari/537.36".to_string(),
        }
    }
}

impl Config {
    /// 加载配置文件；不存在时写入默认配置，格式错误时使用默认配置
    pub fn load(path: &str) -> Result<Self, TransferError> {
        if Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            match toml::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    log::warn!("配置文件格式错误: {}，将使用默认配置", e);
                    Ok(Config::default())
                }
            }
        } else {
            let config = Config::default();
            config.save_with_tutorial(path)?;
            Ok(config)
        }
    }

    /// 保存带教程的配置文件（唯一写入方法）
    pub fn save_with_tutorial(&self, path: &str) -> Result<(), TransferError> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let config_content = toml::to_string_pretty(self)
            .map_err(|e| TransferError::unknown(format!("无法序列化配置: {}", e)))?;
        let full_content = format!("{}\n{}", Config::generate_tutorial_content(), config_content);
        fs::write(path, full_content)?;
        Ok(())
    }

    fn generate_tutorial_content() -> &'static str {
        r#"# lzt 配置文件
# ====================
#
# TOML 格式。命令行参数会覆盖这里的设置，优先级：命令行 > 配置文件 > 默认值
#
# upload_concurrency_limit / download_concurrency_limit / sync_concurrency_limit
#   每个队列同时传输的任务数，必须 >= 1。运行中修改只影响之后的准入。
#
# state_dir
#   队列快照（upload.json / download.json / sync.json）和完成列表（finish.json）
#   的保存目录。程序重启后，未完成的任务会以“已暂停”状态恢复，需要手动继续。
#
# retry_count / retry_delay_ms / retry_max_delay_ms
#   只有网络错误会自动重试，延迟按指数退避增长，不超过最大值。
#
# progress_interval_ms
#   每个任务上报进度的最小间隔，避免界面刷新过于频繁。
"#
    }

    /// 校验配置合法性
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.upload_concurrency_limit == 0 {
            return Err(TransferError::invalid_config("上传并发数必须大于0"));
        }
        if self.download_concurrency_limit == 0 {
            return Err(TransferError::invalid_config("下载并发数必须大于0"));
        }
        if self.sync_concurrency_limit == 0 {
            return Err(TransferError::invalid_config("同步并发数必须大于0"));
        }
        if self.progress_interval_ms == 0 {
            return Err(TransferError::invalid_config("进度上报间隔必须大于0"));
        }
        if self.timeout == 0 {
            return Err(TransferError::invalid_config("超时时间必须大于0"));
        }
        if self.state_dir.is_empty() {
            return Err(TransferError::invalid_config("状态目录不能为空"));
        }
        if self.download_dir.is_empty() {
            return Err(TransferError::invalid_config("下载目录不能为空"));
        }
        Ok(())
    }

    /// 合并命令行参数到配置
    pub fn merge_from_args(&mut self, args: &crate::cli::Args) {
        if let Some(dir) = &args.download_dir {
            self.download_dir = dir.clone();
        }
        if let Some(dir) = &args.state_dir {
            self.state_dir = dir.clone();
        }
        if let Some(limit) = args.download_limit {
            self.download_concurrency_limit = limit;
        }
        if let Some(limit) = args.upload_limit {
            self.upload_concurrency_limit = limit;
        }
    }

    pub fn concurrency_limit(&self, category: Category) -> usize {
        match category {
            Category::Upload => self.upload_concurrency_limit,
            Category::Download => self.download_concurrency_limit,
            Category::Sync => self.sync_concurrency_limit,
        }
    }

    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy {
            max_retries: self.retry_count,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            ..RetryStrategy::default()
        }
    }

    pub fn queue_options(&self, category: Category) -> QueueOptions {
        QueueOptions {
            concurrency_limit: self.concurrency_limit(category),
            retry: self.retry_strategy(),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
        }
    }

    /// 获取配置摘要信息
    pub fn get_summary(&self) -> String {
        format!(
            "配置摘要:\n\
            - 下载目录: {}\n\
            - 状态目录: {}\n\
            - 并发数: 上传 {} / 下载 {} / 同步 {}\n\
            - 重试次数: {}\n\
            - 超时时间: {} 秒",
            self.download_dir,
            self.state_dir,
            self.upload_concurrency_limit,
            self.download_concurrency_limit,
            self.sync_concurrency_limit,
            self.retry_count,
            self.timeout,
        )
    }
}
