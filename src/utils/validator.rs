use regex::Regex;
use std::sync::OnceLock;
use url::Url;

pub fn is_valid_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// 从 URL 路径推断文件名
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
}

/// 分享文本中解析出的链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub name: Option<String>,
    pub url: String,
    pub pwd: Option<String>,
}

fn share_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?P<name>.+?)\s+)?(?P<url>https?://\S+?)(?:\s+密码[:：]\s*(?P<pwd>\S+))?\s*$")
            .expect("share regex")
    })
}

/// 解析分享文本：`[文件名] <链接> [密码:xxxx]`，每行一条
pub fn parse_share_text(text: &str) -> Vec<ShareLink> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let caps = share_regex().captures(line)?;
            let url = caps.name("url")?.as_str().to_string();
            if !is_valid_url(&url) {
                return None;
            }
            Some(ShareLink {
                name: caps.name("name").map(|m| m.as_str().to_string()),
                url,
                pwd: caps.name("pwd").map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}
