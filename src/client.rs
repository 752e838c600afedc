//! 认证 HTTP 客户端
//!
//! 请求管线：附加 Bearer 令牌 -> 发送 -> 遇到 401 刷新一次令牌 -> 重放一次。
//! 刷新失败时清除本地凭据并通知会话过期（由外部负责跳转登录页）。

use std::cell::{Cell, RefCell};

use ehs_learn_shared::protocol::{ApiRequest, HttpMethod, RefreshTokenRequest, RefreshTokenResponse};
use ehs_learn_shared::{BEARER_PREFIX, HEADER_AUTHORIZATION};
use futures::lock::Mutex;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::request::{HttpClient, HttpRequest, HttpResponse};
use crate::storage::KeyValueStore;
use crate::token::TokenStore;

/// 令牌刷新状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Normal,
    /// 正在刷新，其它遇到 401 的请求等待这次刷新的结果
    Refreshing,
}

pub struct AuthClient<C, S> {
    http: C,
    tokens: TokenStore<S>,
    config: ClientConfig,
    /// 同一时刻只允许一个刷新请求在途
    refresh_lock: Mutex<()>,
    refresh_state: Cell<RefreshState>,
    refresh_attempts: Cell<u32>,
    /// 每完成一次刷新（无论成败）加一
    refresh_generation: Cell<u64>,
    /// 会话过期通知只触发一次，重新登录后复位
    expiry_notified: Cell<bool>,
    on_session_expired: RefCell<Option<Box<dyn Fn()>>>,
}

impl<C: HttpClient, S: KeyValueStore> AuthClient<C, S> {
    pub fn new(http: C, tokens: TokenStore<S>, config: ClientConfig) -> Self {
        Self {
            http,
            tokens,
            config,
            refresh_lock: Mutex::new(()),
            refresh_state: Cell::new(RefreshState::Normal),
            refresh_attempts: Cell::new(0),
            refresh_generation: Cell::new(0),
            expiry_notified: Cell::new(false),
            on_session_expired: RefCell::new(None),
        }
    }

    pub fn http(&self) -> &C {
        &self.http
    }

    pub fn tokens(&self) -> &TokenStore<S> {
        &self.tokens
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.refresh_state.get()
    }

    /// 已发起的刷新请求次数
    pub fn refresh_attempts(&self) -> u32 {
        self.refresh_attempts.get()
    }

    /// 注册会话过期回调（通常是清空认证状态并跳转登录页）
    pub fn set_session_expired_handler(&self, handler: impl Fn() + 'static) {
        *self.on_session_expired.borrow_mut() = Some(Box::new(handler));
    }

    /// 登录成功后调用，允许下一次会话过期再次通知
    pub fn rearm_session_guard(&self) {
        self.expiry_notified.set(false);
    }

    /// 发送类型化请求并解析响应
    pub async fn execute<R: ApiRequest>(&self, request: &R) -> ApiResult<R::Response> {
        let path = request.path();
        let mut req = HttpRequest::new(&self.config.url(&path), R::METHOD);
        if R::METHOD.has_body() {
            req = req.with_body(serde_json::to_value(request)?);
        }

        let sent = if R::AUTHENTICATED {
            self.send_authenticated(req).await
        } else {
            self.http.send(req).await
        };
        let resp = sent.map_err(|e| e.in_op_with("api.request", path.clone()))?;

        if !resp.ok() {
            return Err(ApiError::from_response(resp.status, &resp.body)
                .in_op_with("api.request", path));
        }
        resp.json()
            .map_err(|e| e.in_op_with("api.decode", path))
    }

    /// 认证请求管线，401 时最多刷新一次、重放一次
    pub async fn send_authenticated(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let generation = self.refresh_generation.get();
        let sent_token = self.tokens.token();
        let resp = self
            .http
            .send(Self::authorize(req.clone(), sent_token.as_deref()))
            .await?;

        if resp.status != 401 {
            return Ok(resp);
        }

        tracing::debug!(url = %req.url, "received 401, attempting token refresh");
        let fresh = self.refresh_after(generation).await?;
        self.http.send(Self::authorize(req, Some(&fresh))).await
    }

    fn authorize(req: HttpRequest, token: Option<&str>) -> HttpRequest {
        match token {
            Some(token) => {
                req.with_header(HEADER_AUTHORIZATION, &format!("{}{}", BEARER_PREFIX, token))
            }
            None => req,
        }
    }

    /// 刷新令牌。`generation` 是失败请求发出前的刷新代数：
    /// 拿到锁时代数已经变化，说明别的请求在此期间刷新过，直接复用其结果。
    async fn refresh_after(&self, generation: u64) -> ApiResult<String> {
        let _guard = self.refresh_lock.lock().await;

        if self.refresh_generation.get() != generation {
            return self
                .tokens
                .token()
                .ok_or_else(|| ApiError::unauthorized("session expired").in_op("auth.refresh"));
        }

        self.refresh_state.set(RefreshState::Refreshing);
        let outcome = self.request_new_token().await;
        self.refresh_state.set(RefreshState::Normal);
        self.refresh_generation.set(generation + 1);

        match outcome {
            Ok(token) => {
                if !self.tokens.set_token(&token) {
                    tracing::warn!("refreshed token could not be persisted");
                    return Err(ApiError::storage("failed to persist refreshed token")
                        .in_op("auth.refresh"));
                }
                tracing::info!("access token refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, clearing session");
                self.expire_session();
                Err(ApiError::unauthorized("session expired")
                    .with_source(e)
                    .in_op("auth.refresh"))
            }
        }
    }

    async fn request_new_token(&self) -> ApiResult<String> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .ok_or_else(|| ApiError::unauthorized("no refresh token stored"))?;

        self.refresh_attempts.set(self.refresh_attempts.get() + 1);

        let body = serde_json::to_value(RefreshTokenRequest { refresh_token })?;
        let req = HttpRequest::new(&self.config.url(&self.config.refresh_path), HttpMethod::Post)
            .with_body(body);
        let resp = self.http.send(req).await?;

        if !resp.ok() {
            return Err(ApiError::unauthorized(format!(
                "refresh rejected with status {}",
                resp.status
            )));
        }

        let parsed: RefreshTokenResponse = resp.json()?;
        if parsed.token.trim().is_empty() {
            return Err(ApiError::unauthorized("refresh returned an empty token"));
        }
        Ok(parsed.token)
    }

    fn expire_session(&self) {
        self.tokens.clear();
        if self.expiry_notified.replace(true) {
            return;
        }
        if let Some(handler) = self.on_session_expired.borrow().as_ref() {
            handler();
        }
    }
}
