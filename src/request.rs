use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};

pub use ehs_learn_shared::protocol::HttpMethod;

#[cfg(test)]
use std::{cell::RefCell, collections::VecDeque};

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
///
/// 实现 Clone 以支持 401 后的重放。
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body.to_string());
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub content_type: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        // 204 等空响应按 JSON null 处理，兼容 `()` / `Option<T>` 之类的响应类型
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body).map_err(ApiError::from)
    }
}

/// HTTP 客户端特性 (Trait)
/// (?Send) 是因为浏览器环境下 fetch 相关类型不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    /// 发送请求。只有请求未完成（网络层失败）才返回 Err，
    /// 任何 HTTP 状态码都作为 Ok(HttpResponse) 返回。
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse>;
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

/// 记录下来的请求
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

#[cfg(test)]
pub enum MockReply {
    Respond(u16, String),
    NetworkFailure,
}

#[cfg(test)]
pub struct MockHttpClient {
    // URL -> 按顺序消费的响应队列，队列只剩一项时重复使用
    responses: RefCell<HashMap<String, VecDeque<MockReply>>>,
    pub requests: RefCell<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(MockReply::Respond(status, body.to_string()));
    }

    pub fn mock_network_failure(&self, url: &str) {
        self.responses
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(MockReply::NetworkFailure);
    }

    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            url: req.url.clone(),
            method: req.method,
            headers: req.headers.clone(),
            body: req.body.clone(),
        });

        // 让出一次执行权，便于测试并发请求的交错
        tokio::task::yield_now().await;

        let mut responses = self.responses.borrow_mut();
        let Some(queue) = responses.get_mut(&req.url) else {
            return Ok(HttpResponse::new(404, "Not Found"));
        };

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|r| match r {
                MockReply::Respond(status, body) => MockReply::Respond(*status, body.clone()),
                MockReply::NetworkFailure => MockReply::NetworkFailure,
            })
        };

        match reply {
            Some(MockReply::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(MockReply::NetworkFailure) => Err(ApiError::network("connection reset")),
            None => Ok(HttpResponse::new(404, "Not Found")),
        }
    }
}
