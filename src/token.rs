//! 令牌存储模块
//!
//! 封装持久化键值存储中的认证令牌、刷新令牌与用户记录。
//! JWT 只做载荷解码用于显示/调试，不校验签名，也不做过期判断之外的逻辑。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ehs_learn_shared::{
    BEARER_PREFIX, STORAGE_KEY_REFRESH_TOKEN, STORAGE_KEY_TOKEN, STORAGE_KEY_USER, Timestamp, User,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::storage::KeyValueStore;

/// JWT 载荷中关心的字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// 过期时间（秒）
    #[serde(default)]
    pub exp: Option<i64>,
    /// 签发时间（秒）
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.exp.map(Timestamp::from_secs)
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

/// 解码 JWT 的载荷段（不校验签名）
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// 去掉可能带入的 `Bearer ` 前缀
fn strip_bearer(token: &str) -> &str {
    token
        .trim()
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(token.trim())
        .trim()
}

/// 认证凭据存储
pub struct TokenStore<S> {
    store: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|v| !v.trim().is_empty())
    }

    /// 当前访问令牌（不带前缀）
    pub fn token(&self) -> Option<String> {
        self.non_empty(STORAGE_KEY_TOKEN)
    }

    /// 保存访问令牌，统一去掉前缀后存储
    pub fn set_token(&self, token: &str) -> bool {
        self.store.set(STORAGE_KEY_TOKEN, strip_bearer(token))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.non_empty(STORAGE_KEY_REFRESH_TOKEN)
    }

    pub fn set_refresh_token(&self, token: &str) -> bool {
        self.store.set(STORAGE_KEY_REFRESH_TOKEN, token.trim())
    }

    /// 读取用户记录；记录损坏时视为不存在
    pub fn user(&self) -> Option<User> {
        let raw = self.non_empty(STORAGE_KEY_USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "stored user record is corrupt, ignoring");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) -> ApiResult<()> {
        let raw = serde_json::to_string(user)?;
        if self.store.set(STORAGE_KEY_USER, &raw) {
            Ok(())
        } else {
            Err(ApiError::storage("failed to persist user record").in_op("token.set_user"))
        }
    }

    /// 登录成功后一次性保存所有凭据
    pub fn save_credentials(
        &self,
        token: &str,
        refresh_token: Option<&str>,
        user: &User,
    ) -> ApiResult<()> {
        if !self.set_token(token) {
            return Err(ApiError::storage("failed to persist token").in_op("token.save_credentials"));
        }
        match refresh_token {
            Some(refresh) => {
                if !self.set_refresh_token(refresh) {
                    return Err(ApiError::storage("failed to persist refresh token")
                        .in_op("token.save_credentials"));
                }
            }
            None => {
                self.store.delete(STORAGE_KEY_REFRESH_TOKEN);
            }
        }
        self.set_user(user)
    }

    /// 清除全部凭据（注销或刷新失败）
    pub fn clear(&self) {
        self.store.delete(STORAGE_KEY_TOKEN);
        self.store.delete(STORAGE_KEY_REFRESH_TOKEN);
        self.store.delete(STORAGE_KEY_USER);
    }

    pub fn has_credentials(&self) -> bool {
        self.token().is_some() && self.user().is_some()
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        decode_claims(&self.token()?)
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.claims()?.expires_at()
    }
}
