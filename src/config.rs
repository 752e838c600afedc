use ehs_learn_shared::protocol::PATH_REFRESH_TOKEN;

// =========================================================
// 运行时配置 (Runtime Configuration)
// =========================================================

/// 默认值，未提供覆盖项时使用
pub const DEFAULT_API_BASE_URL: &str = "/api";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 30_000;

pub const VAR_API_BASE_URL: &str = "EHS_API_BASE_URL";
pub const VAR_REFRESH_PATH: &str = "EHS_REFRESH_PATH";
pub const VAR_REQUEST_TIMEOUT_MS: &str = "EHS_REQUEST_TIMEOUT_MS";

/// 客户端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API 根地址（已去除末尾斜杠）
    pub api_base_url: String,
    /// 刷新令牌接口路径
    pub refresh_path: String,
    /// 单次请求超时（毫秒），由传输层实现
    pub request_timeout_ms: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            refresh_path: PATH_REFRESH_TOKEN.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// 通过名称查找覆盖项，查不到（或为空）就用默认值
    ///
    /// 前端从编译期环境变量读取，测试中可直接传入闭包。
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let request_timeout_ms = match var(VAR_REQUEST_TIMEOUT_MS) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid request timeout, using default");
                defaults.request_timeout_ms
            }),
            None => defaults.request_timeout_ms,
        };

        Self {
            api_base_url: var(VAR_API_BASE_URL).unwrap_or(defaults.api_base_url),
            refresh_path: var(VAR_REFRESH_PATH).unwrap_or(defaults.refresh_path),
            request_timeout_ms,
        }
        .normalized()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        if !self.refresh_path.starts_with('/') {
            self.refresh_path = format!("/{}", self.refresh_path);
        }
        self
    }

    /// 拼接完整 URL
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_base_url, path)
        } else {
            format!("{}/{}", self.api_base_url, path)
        }
    }
}
