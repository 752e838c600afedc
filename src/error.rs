use std::fmt;

use serde::{Deserialize, Serialize};

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误状态枚举
/// 包含错误对应的语义（HTTP 状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorStatus {
    /// 请求未能完成（断网、超时、fetch 失败）
    Network,
    /// 401: 鉴权失败（刷新令牌后仍失败）
    Unauthorized,
    /// 404: 资源未找到
    NotFound,
    /// 400 / 422: 请求参数校验失败
    InvalidInput,
    /// JSON 解析或序列化错误
    Serialization,
    /// 5xx 或其它非预期状态码
    Server,
    /// 本地存储读写失败
    Storage,
}

impl ApiErrorStatus {
    /// 根据 HTTP 响应码映射错误状态
    pub fn from_http(status: u16) -> Self {
        match status {
            401 | 403 => ApiErrorStatus::Unauthorized,
            404 => ApiErrorStatus::NotFound,
            400 | 409 | 422 => ApiErrorStatus::InvalidInput,
            _ => ApiErrorStatus::Server,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiErrorStatus::Network => "NETWORK_ERROR",
            ApiErrorStatus::Unauthorized => "UNAUTHORIZED",
            ApiErrorStatus::NotFound => "RESOURCE_NOT_FOUND",
            ApiErrorStatus::InvalidInput => "INVALID_INPUT",
            ApiErrorStatus::Serialization => "JSON_PARSE_ERROR",
            ApiErrorStatus::Server => "SERVER_ERROR",
            ApiErrorStatus::Storage => "LOCAL_STORAGE_ERROR",
        }
    }

    /// 是否值得提示用户重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiErrorStatus::Network | ApiErrorStatus::Server)
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
/// 记录错误发生时的操作和相关细节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSpan {
    /// 操作名称，如 "api.get_training", "auth.refresh"
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端请求错误
///
/// - status: 错误类型/语义
/// - message: 错误消息
/// - source: 原始错误（可选，用于错误链）
/// - spans: 结构化的调用追踪栈
#[derive(Debug)]
pub struct ApiError {
    pub status: ApiErrorStatus,
    pub message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ApiError {
    pub fn new(status: ApiErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::InvalidInput, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Serialization, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Storage, message)
    }

    /// 由非 2xx 响应构造错误，响应体作为消息（截断）
    pub fn from_response(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            let snippet: String = body.chars().take(200).collect();
            format!("HTTP {}: {}", status, snippet)
        };
        Self::new(ApiErrorStatus::from_http(status), message)
    }

    // --- Context builders ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == ApiErrorStatus::Unauthorized
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::serialization(e.to_string()).with_source(e)
    }
}
